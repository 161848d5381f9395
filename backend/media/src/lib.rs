//! ffmpeg-backed media transforms for ffbot.

pub mod cleanup;
pub mod ffmpeg;
pub mod media_kind;
pub mod pool;
pub mod probe;
pub mod runner;
pub mod thumbnail;
pub mod toolkit;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use cleanup::remove_files;
pub use ffmpeg::FfmpegCommands;
pub use media_kind::{default_extension, kind_from_mime, kind_from_path};
pub use pool::{WorkerPool, DEFAULT_WORKERS};
pub use probe::{cleaned_video_caption, parse_probe_output, MediaDetails};
pub use runner::{ProcessRunner, ToolInvocation, ToolOutput, ToolRunner};
pub use thumbnail::{fix_thumbnail, FixedThumbnail};
pub use toolkit::{MediaToolkit, MergeOutcome};
