//! Thumbnail normalization.
//!
//! Screenshots go through here before being attached as cover art: decoded,
//! flattened to RGB, resized to the dimensions read from the image header,
//! and written back as baseline JPEG. Any failure means "no thumbnail".

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::ImageFormat;
use image::imageops::FilterType;
use tracing::{debug, warn};

/// Outcome of a successful normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedThumbnail {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Normalize `candidate` in place. Returns `None` when there is no candidate
/// or when it cannot be processed.
pub async fn fix_thumbnail(candidate: Option<PathBuf>) -> Option<FixedThumbnail> {
    let path = candidate?;
    let job_path = path.clone();
    match tokio::task::spawn_blocking(move || normalize(&job_path)).await {
        Ok(Ok(fixed)) => Some(fixed),
        Ok(Err(e)) => {
            warn!(path = %path.display(), error = %e, "Error fixing thumbnail");
            None
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Thumbnail task panicked");
            None
        }
    }
}

fn normalize(path: &Path) -> Result<FixedThumbnail> {
    let (width, height) = image::image_dimensions(path)
        .with_context(|| format!("Failed to read dimensions of {}", path.display()))?;

    let img = image::open(path)
        .with_context(|| format!("Failed to decode {}", path.display()))?;
    let mut rgb = img.to_rgb8();
    if width > 0 && height > 0 && (rgb.width(), rgb.height()) != (width, height) {
        rgb = image::imageops::resize(&rgb, width, height, FilterType::Triangle);
    }

    rgb.save_with_format(path, ImageFormat::Jpeg)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    debug!(path = %path.display(), width, height, "Thumbnail normalized");

    Ok(FixedThumbnail {
        path: path.to_path_buf(),
        width,
        height,
    })
}
