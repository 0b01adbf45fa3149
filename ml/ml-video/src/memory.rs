//! In-memory video backend.
//!
//! Videos are frame vectors keyed by path. Every open and release is
//! recorded as a [`MemoryEvent`], so callers can check acquisition order.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::backend::{SinkSpec, VideoBackend, VideoSink, VideoSource};
use crate::error::{Result, VideoError};
use crate::frame::Frame;
use crate::properties::VideoProperties;

/// Open/release record of a [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryEvent {
    /// A source was opened.
    SourceOpened(PathBuf),
    /// A sink was opened.
    SinkOpened(PathBuf),
    /// A sink was released.
    SinkReleased(PathBuf),
    /// A source was released.
    SourceReleased(PathBuf),
}

#[derive(Debug, Clone)]
struct MemoryVideo {
    properties: VideoProperties,
    frames: Vec<Frame>,
    sink_spec: Option<SinkSpec>,
    fail_after: Option<usize>,
}

#[derive(Debug, Default)]
struct Store {
    videos: HashMap<PathBuf, MemoryVideo>,
    events: Vec<MemoryEvent>,
    failing_releases: HashSet<PathBuf>,
}

/// Video backend keeping every stream in memory.
///
/// Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    store: Arc<Mutex<Store>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_store<R>(&self, f: impl FnOnce(&mut Store) -> R) -> R {
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut store)
    }

    /// Stores a readable video at `path`, replacing any existing one.
    pub fn insert(&self, path: impl Into<PathBuf>, properties: VideoProperties, frames: Vec<Frame>) {
        let video = MemoryVideo {
            properties,
            frames,
            sink_spec: None,
            fail_after: None,
        };
        self.with_store(|store| {
            store.videos.insert(path.into(), video);
        });
    }

    /// Makes reads of `path` fail once `frames` frames have been read.
    pub fn fail_reads_after(&self, path: impl AsRef<Path>, frames: usize) {
        self.with_store(|store| {
            if let Some(video) = store.videos.get_mut(path.as_ref()) {
                video.fail_after = Some(frames);
            }
        });
    }

    /// Makes the next release of a source or sink on `path` fail.
    ///
    /// The release is still recorded and written frames are kept.
    pub fn fail_release(&self, path: impl Into<PathBuf>) {
        self.with_store(|store| {
            store.failing_releases.insert(path.into());
        });
    }

    /// Returns the frames stored at `path`.
    #[must_use]
    pub fn frames(&self, path: impl AsRef<Path>) -> Option<Vec<Frame>> {
        self.with_store(|store| store.videos.get(path.as_ref()).map(|v| v.frames.clone()))
    }

    /// Returns the properties of the video at `path`.
    #[must_use]
    pub fn properties(&self, path: impl AsRef<Path>) -> Option<VideoProperties> {
        self.with_store(|store| store.videos.get(path.as_ref()).map(|v| v.properties))
    }

    /// Returns the parameters `path` was last opened for writing with.
    #[must_use]
    pub fn sink_spec(&self, path: impl AsRef<Path>) -> Option<SinkSpec> {
        self.with_store(|store| store.videos.get(path.as_ref()).and_then(|v| v.sink_spec))
    }

    /// Returns every open and release, in order.
    #[must_use]
    pub fn events(&self) -> Vec<MemoryEvent> {
        self.with_store(|store| store.events.clone())
    }

    fn record(&self, event: MemoryEvent) {
        self.with_store(|store| store.events.push(event));
    }

    /// Records a release of `path`, failing if it was marked with
    /// [`fail_release`](Self::fail_release).
    fn release(&self, path: &Path, event: MemoryEvent) -> Result<()> {
        let failed = self.with_store(|store| {
            store.events.push(event);
            store.failing_releases.remove(path)
        });
        if failed {
            return Err(VideoError::codec(format!("cannot finalize {}", path.display())));
        }
        Ok(())
    }
}

impl VideoBackend for MemoryBackend {
    type Source = MemorySource;
    type Sink = MemorySink;

    fn open_source(&self, path: &Path) -> Result<MemorySource> {
        let video = self
            .with_store(|store| store.videos.get(path).cloned())
            .ok_or_else(|| VideoError::source_unavailable(path, "no such video"))?;
        self.record(MemoryEvent::SourceOpened(path.to_path_buf()));
        Ok(MemorySource {
            path: path.to_path_buf(),
            video,
            position: 0,
            backend: self.clone(),
        })
    }

    fn open_sink(&self, path: &Path, spec: &SinkSpec) -> Result<MemorySink> {
        let properties = VideoProperties::new(f64::from(spec.width), f64::from(spec.height), spec.fps);
        let video = MemoryVideo {
            properties,
            frames: Vec::new(),
            sink_spec: Some(*spec),
            fail_after: None,
        };
        self.with_store(|store| {
            store.videos.insert(path.to_path_buf(), video);
            store.events.push(MemoryEvent::SinkOpened(path.to_path_buf()));
        });
        Ok(MemorySink {
            path: path.to_path_buf(),
            spec: *spec,
            backend: self.clone(),
        })
    }
}

/// Reader over a [`MemoryBackend`] video.
#[derive(Debug)]
pub struct MemorySource {
    path: PathBuf,
    video: MemoryVideo,
    position: usize,
    backend: MemoryBackend,
}

impl VideoSource for MemorySource {
    fn properties(&self) -> VideoProperties {
        self.video.properties
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        if self.video.fail_after.is_some_and(|n| self.position >= n) {
            return Err(VideoError::codec(format!(
                "cannot decode frame {} of {}",
                self.position,
                self.path.display()
            )));
        }
        let frame = self.video.frames.get(self.position).cloned();
        if frame.is_some() {
            self.position += 1;
        }
        Ok(frame)
    }

    fn release(self) -> Result<()> {
        self.backend
            .release(&self.path, MemoryEvent::SourceReleased(self.path.clone()))
    }
}

/// Writer into a [`MemoryBackend`] video.
#[derive(Debug)]
pub struct MemorySink {
    path: PathBuf,
    spec: SinkSpec,
    backend: MemoryBackend,
}

impl VideoSink for MemorySink {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if frame.size() != (self.spec.width, self.spec.height) {
            return Err(VideoError::invalid_frame(format!(
                "expected {}x{}, got {}x{}",
                self.spec.width,
                self.spec.height,
                frame.width(),
                frame.height()
            )));
        }
        self.backend.with_store(|store| {
            if let Some(video) = store.videos.get_mut(&self.path) {
                video.frames.push(frame.clone());
            }
        });
        Ok(())
    }

    fn release(self) -> Result<()> {
        self.backend
            .release(&self.path, MemoryEvent::SinkReleased(self.path.clone()))
    }
}
