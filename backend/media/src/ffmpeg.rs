//! Argument lists for every ffmpeg/ffprobe call the bot makes.

use std::path::Path;

use crate::runner::ToolInvocation;

/// Builds tool invocations against configurable program names.
#[derive(Debug, Clone)]
pub struct FfmpegCommands {
    pub ffmpeg: String,
    pub ffprobe: String,
}

impl Default for FfmpegCommands {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

fn p(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl FfmpegCommands {
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    fn ffmpeg(&self) -> ToolInvocation {
        ToolInvocation::new(&self.ffmpeg).arg("-y")
    }

    /// Copy the video stream, drop audio, keep container metadata.
    pub fn remove_audio(&self, input: &Path, output: &Path) -> ToolInvocation {
        self.ffmpeg()
            .arg("-i")
            .arg(p(input))
            .args(["-c:v", "copy", "-an", "-map_metadata", "0"])
            .args(["-movflags", "use_metadata_tags"])
            .arg(p(output))
    }

    /// Grab a single frame `offset_secs` into the input.
    pub fn screenshot(&self, input: &Path, offset_secs: f64, output: &Path) -> ToolInvocation {
        self.ffmpeg()
            .arg("-ss")
            .arg(offset_secs.to_string())
            .arg("-i")
            .arg(p(input))
            .args(["-vframes", "1"])
            .arg(p(output))
    }

    /// Attach `thumbnail` as a cover picture stream. Written to `output`
    /// because ffmpeg cannot rewrite its own input.
    pub fn attach_thumbnail(&self, target: &Path, thumbnail: &Path, output: &Path) -> ToolInvocation {
        self.ffmpeg()
            .arg("-i")
            .arg(p(target))
            .arg("-i")
            .arg(p(thumbnail))
            .args(["-map", "0", "-map", "1", "-c", "copy"])
            .args(["-disposition:1", "attached_pic"])
            .arg(p(output))
    }

    /// Container duration and size as `key=value` lines.
    pub fn probe_format(&self, input: &Path) -> ToolInvocation {
        ToolInvocation::new(&self.ffprobe)
            .args(["-v", "error"])
            .args(["-show_entries", "format=duration,size"])
            .args(["-of", "default=noprint_wrappers=1"])
            .arg(p(input))
    }

    /// Play `first` then `second` as one audio stream.
    pub fn concat_audio(&self, first: &Path, second: &Path, output: &Path) -> ToolInvocation {
        self.ffmpeg()
            .arg("-i")
            .arg(p(first))
            .arg("-i")
            .arg(p(second))
            .args(["-filter_complex", "[0:0][1:0]concat=n=2:v=0:a=1[out]"])
            .args(["-map", "[out]"])
            .arg(p(output))
    }

    /// Copy the video stream and encode the audio track to AAC alongside it.
    pub fn mux_video_audio(&self, video: &Path, audio: &Path, output: &Path) -> ToolInvocation {
        self.ffmpeg()
            .arg("-i")
            .arg(p(video))
            .arg("-i")
            .arg(p(audio))
            .args(["-c:v", "copy", "-c:a", "aac", "-strict", "experimental"])
            .arg(p(output))
    }

    /// `-version` probe for both tools.
    pub fn version_checks(&self) -> [ToolInvocation; 2] {
        [
            ToolInvocation::new(&self.ffmpeg).arg("-version"),
            ToolInvocation::new(&self.ffprobe).arg("-version"),
        ]
    }
}
