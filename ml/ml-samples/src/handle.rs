//! Handle-backed sample sets.
//!
//! A [`HandleSamples`] pairs a container path with a backend able to open
//! it. Groups inside the container are materialized into [`Samples`] on
//! request, and only while the handle is open.
//!
//! ```text
//! new() ──► Closed ──open()──► Open(handle) ──close()/drop──► Closed
//!                                  │
//!                                  └── group(name) ──► Samples
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::array::ArrayData;
use crate::envelope::{FEATURES, TARGETS};
use crate::error::{Result, SamplesError};
use crate::samples::Samples;

/// Group path naming the container root.
pub const ROOT_GROUP: &str = "/";

/// An open hierarchical container.
pub trait ContainerHandle {
    /// Reads a floating-point dataset from `group`.
    ///
    /// # Errors
    ///
    /// Returns [`SamplesError::GroupNotFound`] or
    /// [`SamplesError::MissingKey`] if the group or dataset is absent.
    fn read_f32(&self, group: &str, name: &str) -> Result<ArrayData<f32>>;

    /// Reads an integer dataset from `group`.
    ///
    /// # Errors
    ///
    /// Returns [`SamplesError::GroupNotFound`] or
    /// [`SamplesError::MissingKey`] if the group or dataset is absent.
    fn read_i64(&self, group: &str, name: &str) -> Result<ArrayData<i64>>;

    /// Lists the groups below the root.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the listing fails.
    fn group_names(&self) -> Result<Vec<String>>;

    /// Releases the handle.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the release fails.
    fn close(self) -> Result<()>;
}

/// Opens containers of one kind.
pub trait ContainerBackend {
    /// Handle type produced by [`open`](Self::open).
    type Handle: ContainerHandle;

    /// Opens the container at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be opened.
    fn open(&self, path: &Path) -> Result<Self::Handle>;
}

/// Open/closed state of a [`HandleSamples`].
#[derive(Debug, Default)]
pub enum HandleState<H> {
    /// No handle held.
    #[default]
    Closed,

    /// Handle acquired and exclusively owned.
    Open(H),
}

impl<H> HandleState<H> {
    /// Returns `true` if a handle is held.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }
}

/// A lazily materialized sample set backed by an open container.
///
/// # Example
///
/// ```
/// use ml_samples::{HandleSamples, MemoryBackend, Samples};
///
/// let backend = MemoryBackend::new();
/// let train = Samples::from_rows(vec![vec![1.0], vec![2.0]], vec![0, 1]).unwrap();
/// backend.insert("data.h5", "train", train.clone());
///
/// let loaded = HandleSamples::scoped("data.h5", backend, |set| set.group("train")).unwrap();
/// assert_eq!(loaded, train);
/// ```
pub struct HandleSamples<B: ContainerBackend> {
    path: PathBuf,
    backend: B,
    state: HandleState<B::Handle>,
}

impl<B: ContainerBackend> HandleSamples<B> {
    /// Creates a closed set; call [`open`](Self::open) before reading.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, backend: B) -> Self {
        Self {
            path: path.into(),
            backend,
            state: HandleState::Closed,
        }
    }

    /// Creates a set and opens it immediately.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the container cannot be opened.
    pub fn open_with(path: impl Into<PathBuf>, backend: B) -> Result<Self> {
        let mut set = Self::new(path, backend);
        set.open()?;
        Ok(set)
    }

    /// Opens `path`, runs `body`, then closes the handle.
    ///
    /// The handle is released whether or not `body` succeeds. If both the
    /// body and the release fail, the body's error is returned.
    ///
    /// # Errors
    ///
    /// Returns an open, body or close error.
    pub fn scoped<T>(
        path: impl Into<PathBuf>,
        backend: B,
        body: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let mut set = Self::open_with(path, backend)?;
        let result = body(&mut set);
        let closed = set.close();
        match (result, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), closed) => {
                if let Err(close_err) = closed {
                    warn!(path = %set.path.display(), error = %close_err, "close failed after error");
                }
                Err(err)
            }
        }
    }

    /// Acquires the handle. Does nothing if already open.
    ///
    /// # Errors
    ///
    /// Returns the backend's error; the set stays closed.
    pub fn open(&mut self) -> Result<()> {
        if self.state.is_open() {
            return Ok(());
        }
        let handle = self.backend.open(&self.path)?;
        debug!(path = %self.path.display(), "opened container");
        self.state = HandleState::Open(handle);
        Ok(())
    }

    /// Releases the handle. Does nothing if already closed.
    ///
    /// The set is closed afterwards even if the release fails.
    ///
    /// # Errors
    ///
    /// Returns the backend's release error.
    pub fn close(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, HandleState::Closed) {
            HandleState::Closed => Ok(()),
            HandleState::Open(handle) => {
                debug!(path = %self.path.display(), "closing container");
                handle.close()
            }
        }
    }

    /// Returns `true` while the handle is held.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.state.is_open()
    }

    /// Returns the container path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    fn handle(&self) -> Result<&B::Handle> {
        match &self.state {
            HandleState::Open(handle) => Ok(handle),
            HandleState::Closed => Err(SamplesError::closed(&self.path)),
        }
    }

    /// Reads `name`'s `features` and `targets` into a sample set.
    ///
    /// # Errors
    ///
    /// Returns [`SamplesError::Closed`] if the handle is not open, or a
    /// lookup error if the group or either dataset is missing.
    pub fn group(&self, name: &str) -> Result<Samples> {
        self.group_with(name, Ok, Ok)
    }

    /// Like [`group`](Self::group), passing each array through a transform
    /// before the set is built.
    ///
    /// # Errors
    ///
    /// Returns everything [`group`](Self::group) can, plus transform errors.
    pub fn group_with<F, T>(&self, name: &str, features_fn: F, targets_fn: T) -> Result<Samples>
    where
        F: FnOnce(ArrayData<f32>) -> Result<ArrayData<f32>>,
        T: FnOnce(ArrayData<i64>) -> Result<ArrayData<i64>>,
    {
        let handle = self.handle()?;
        let features = features_fn(handle.read_f32(name, FEATURES)?)?;
        let targets = targets_fn(handle.read_i64(name, TARGETS)?)?;
        let samples = Samples::from_arrays(features, targets)?;
        debug!(
            path = %self.path.display(),
            group = name,
            samples = samples.len(),
            "materialized group"
        );
        Ok(samples)
    }

    /// Lists the container's groups.
    ///
    /// # Errors
    ///
    /// Returns [`SamplesError::Closed`] if the handle is not open.
    pub fn group_names(&self) -> Result<Vec<String>> {
        self.handle()?.group_names()
    }
}

impl<B: ContainerBackend> fmt::Debug for HandleSamples<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleSamples")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

impl<B: ContainerBackend> Drop for HandleSamples<B> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(path = %self.path.display(), error = %err, "failed to release container on drop");
        }
    }
}

/// Groups of one in-memory container, keyed without surrounding `/`.
type MemoryContainer = BTreeMap<String, Samples>;

/// Maps a group path to its container key; [`ROOT_GROUP`] becomes `""`.
fn group_key(group: &str) -> &str {
    group.trim_matches('/')
}

#[derive(Debug, Default)]
struct MemoryStore {
    containers: BTreeMap<PathBuf, MemoryContainer>,
    opened: usize,
    closed: usize,
}

/// In-memory container backend.
///
/// Clones share storage, so a test can keep one clone to inspect open and
/// close counts after handing another to a [`HandleSamples`].
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    store: Arc<Mutex<MemoryStore>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_store<R>(&self, f: impl FnOnce(&mut MemoryStore) -> R) -> R {
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut store)
    }

    /// Stores `samples` as group `group` of container `path`.
    ///
    /// `"train"` and `"/train"` name the same group; [`ROOT_GROUP`] stores
    /// the set at the container root.
    pub fn insert(&self, path: impl Into<PathBuf>, group: impl Into<String>, samples: Samples) {
        let group: String = group.into();
        self.with_store(|store| {
            store
                .containers
                .entry(path.into())
                .or_default()
                .insert(group_key(&group).to_string(), samples);
        });
    }

    /// Returns how many handles have been opened.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.with_store(|store| store.opened)
    }

    /// Returns how many handles have been closed.
    #[must_use]
    pub fn close_count(&self) -> usize {
        self.with_store(|store| store.closed)
    }
}

impl ContainerBackend for MemoryBackend {
    type Handle = MemoryHandle;

    fn open(&self, path: &Path) -> Result<MemoryHandle> {
        let container = self.with_store(|store| {
            let container = store.containers.get(path).cloned();
            if container.is_some() {
                store.opened += 1;
            }
            container
        });
        let container = container.ok_or_else(|| {
            SamplesError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such container: {}", path.display()),
            ))
        })?;
        Ok(MemoryHandle {
            container,
            backend: self.clone(),
        })
    }
}

/// Open handle of a [`MemoryBackend`] container.
#[derive(Debug)]
pub struct MemoryHandle {
    container: MemoryContainer,
    backend: MemoryBackend,
}

impl MemoryHandle {
    fn lookup(&self, group: &str) -> Result<&Samples> {
        self.container
            .get(group_key(group))
            .ok_or_else(|| SamplesError::group_not_found(group))
    }
}

impl ContainerHandle for MemoryHandle {
    fn read_f32(&self, group: &str, name: &str) -> Result<ArrayData<f32>> {
        let samples = self.lookup(group)?;
        match name {
            FEATURES => Ok(samples.features_array()),
            _ => Err(SamplesError::missing_key(name)),
        }
    }

    fn read_i64(&self, group: &str, name: &str) -> Result<ArrayData<i64>> {
        let samples = self.lookup(group)?;
        match name {
            TARGETS => Ok(samples.targets_array()),
            _ => Err(SamplesError::missing_key(name)),
        }
    }

    fn group_names(&self) -> Result<Vec<String>> {
        Ok(self
            .container
            .keys()
            .filter(|key| !key.is_empty())
            .cloned()
            .collect())
    }

    fn close(self) -> Result<()> {
        self.backend.with_store(|store| store.closed += 1);
        Ok(())
    }
}
