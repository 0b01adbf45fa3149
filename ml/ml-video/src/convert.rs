//! Frame-by-frame transcoding.

use std::fmt::Display;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::{SinkSpec, VideoBackend, VideoSink, VideoSource};
use crate::config::VideoConfig;
use crate::error::{Result, VideoError};
use crate::fourcc::FourCc;
use crate::frame::Frame;
use crate::properties::VideoProperties;

/// Summary of a finished conversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvertStats {
    /// Frames written to the output.
    pub frames_written: u64,

    /// Properties of the input stream.
    pub properties: VideoProperties,

    /// Codec the output was written with.
    pub fourcc: FourCc,

    /// `true` if the stream ended on a read failure rather than end of file.
    pub read_failed: bool,
}

/// Reads `input`, applies `transform` to every frame, and writes `output`.
///
/// The output uses the `XVID` codec with the source frame rate and the
/// source frame size truncated to integers. Reading stops at end of stream
/// or at the first frame that fails to decode; the failure is logged, not
/// returned. The sink is released before the source on every path.
///
/// # Errors
///
/// Returns [`VideoError::SourceUnavailable`] before any output is created
/// if `input` cannot be opened, [`VideoError::Transform`] if `transform`
/// fails (after releasing both ends), or a sink error.
///
/// # Example
///
/// ```
/// use ml_video::{Frame, MemoryBackend, VideoProperties, convert};
///
/// let backend = MemoryBackend::new();
/// let props = VideoProperties::new(4.0, 2.0, 30.0);
/// backend.insert("in.avi", props, vec![Frame::black(4, 2); 3]);
///
/// let stats = convert(&backend, "in.avi", |f| Ok::<_, String>(f.swap_red_blue()), "out.avi").unwrap();
/// assert_eq!(stats.frames_written, 3);
/// assert_eq!(backend.frames("out.avi").map(|f| f.len()), Some(3));
/// ```
pub fn convert<B, F, E>(
    backend: &B,
    input: impl AsRef<Path>,
    transform: F,
    output: impl AsRef<Path>,
) -> Result<ConvertStats>
where
    B: VideoBackend,
    F: FnMut(Frame) -> std::result::Result<Frame, E>,
    E: Display,
{
    convert_with_config(backend, input, transform, output, &VideoConfig::default())
}

/// Like [`convert`], with the output codec from `config`.
///
/// # Errors
///
/// Returns [`VideoError::InvalidFourCc`] for an unprintable codec, plus
/// everything [`convert`] can return.
pub fn convert_with_config<B, F, E>(
    backend: &B,
    input: impl AsRef<Path>,
    transform: F,
    output: impl AsRef<Path>,
    config: &VideoConfig,
) -> Result<ConvertStats>
where
    B: VideoBackend,
    F: FnMut(Frame) -> std::result::Result<Frame, E>,
    E: Display,
{
    let input = input.as_ref();
    let output = output.as_ref();
    if !config.is_valid() {
        return Err(VideoError::InvalidFourCc(config.fourcc.to_string()));
    }

    let mut source = backend.open_source(input)?;
    let properties = source.properties();
    let spec = match sink_spec(&properties, config.fourcc) {
        Ok(spec) => spec,
        Err(err) => {
            release_source(source, input);
            return Err(err);
        }
    };

    info!(
        input = %input.display(),
        output = %output.display(),
        width = spec.width,
        height = spec.height,
        fps = spec.fps,
        fourcc = %spec.fourcc,
        "converting video"
    );

    let mut sink = match backend.open_sink(output, &spec) {
        Ok(sink) => sink,
        Err(err) => {
            release_source(source, input);
            return Err(err);
        }
    };

    let pumped = pump(&mut source, &mut sink, transform);

    // Sink first, so everything written so far is flushed.
    let sink_released = sink.release();
    let source_released = source.release();

    let (frames_written, read_failed) = match pumped {
        Ok(counts) => counts,
        Err(err) => {
            if let Err(release_err) = sink_released {
                warn!(output = %output.display(), error = %release_err, "failed to release sink after error");
            }
            if let Err(release_err) = source_released {
                warn!(input = %input.display(), error = %release_err, "failed to release source after error");
            }
            return Err(err);
        }
    };
    if let Err(err) = sink_released {
        if let Err(release_err) = source_released {
            warn!(input = %input.display(), error = %release_err, "failed to release source after error");
        }
        return Err(err);
    }
    source_released?;

    info!(output = %output.display(), frames = frames_written, "conversion finished");
    Ok(ConvertStats {
        frames_written,
        properties,
        fourcc: spec.fourcc,
        read_failed,
    })
}

fn sink_spec(properties: &VideoProperties, fourcc: FourCc) -> Result<SinkSpec> {
    properties.validate()?;
    let (width, height) = properties.frame_size()?;
    Ok(SinkSpec {
        fourcc,
        fps: properties.fps,
        width,
        height,
    })
}

fn release_source<S: VideoSource>(source: S, input: &Path) {
    if let Err(err) = source.release() {
        warn!(input = %input.display(), error = %err, "failed to release source");
    }
}

/// Copies frames until the source ends; returns `(frames, read_failed)`.
fn pump<S, K, F, E>(
    source: &mut S,
    sink: &mut K,
    mut transform: F,
) -> Result<(u64, bool)>
where
    S: VideoSource,
    K: VideoSink,
    F: FnMut(Frame) -> std::result::Result<Frame, E>,
    E: Display,
{
    let mut frames = 0u64;
    loop {
        let frame = match source.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                debug!(frames, "end of stream");
                return Ok((frames, false));
            }
            Err(err) => {
                warn!(frame = frames, error = %err, "frame read failed, ending stream");
                return Ok((frames, true));
            }
        };

        let converted = transform(frame).map_err(|e| VideoError::transform(frames, e.to_string()))?;
        sink.write_frame(&converted)?;
        frames += 1;
    }
}
