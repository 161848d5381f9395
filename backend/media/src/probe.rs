//! ffprobe output parsing and caption text.

use std::collections::HashMap;

/// Container-level facts reported by ffprobe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaDetails {
    pub duration_secs: f64,
    pub size_bytes: u64,
}

impl MediaDetails {
    pub fn rounded_secs(&self) -> u64 {
        self.duration_secs.round().max(0.0) as u64
    }

    pub fn size_mb(&self) -> f64 {
        (self.size_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
    }
}

/// Parse `key=value` lines from `ffprobe -of default=noprint_wrappers=1`.
///
/// Returns `None` unless both `duration` and `size` are present and numeric
/// (ffprobe prints `N/A` for streams it cannot measure).
pub fn parse_probe_output(output: &str) -> Option<MediaDetails> {
    let fields: HashMap<&str, &str> = output
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
        .collect();

    let duration_secs = fields.get("duration")?.parse::<f64>().ok()?;
    let size_bytes = fields.get("size")?.parse::<u64>().ok()?;
    if !duration_secs.is_finite() {
        return None;
    }
    Some(MediaDetails {
        duration_secs,
        size_bytes,
    })
}

/// A rounded size without trailing zeros, keeping one decimal: `5.0`, `1.5`, `1.23`.
fn short_decimal(value: f64) -> String {
    let text = value.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}

/// Caption for a video with its audio track removed.
pub fn cleaned_video_caption(details: Option<&MediaDetails>) -> String {
    match details {
        Some(d) => format!(
            "Here's your cleaned video file. Duration: {} seconds. Size: {} MB",
            d.rounded_secs(),
            short_decimal(d.size_mb())
        ),
        None => "Here's your cleaned video file.".to_string(),
    }
}
