//! Temporary file removal.

use std::io::ErrorKind;
use std::path::Path;

use ffbot_logging::{EventLogger, MediaEvent};
use tracing::{debug, error};

/// Delete every path, each independently. Failures are logged and counted;
/// one failed deletion never stops the rest. Already-missing files count as
/// removed.
pub async fn remove_files<P: AsRef<Path>>(paths: &[P]) -> usize {
    let mut failures = 0;
    for path in paths {
        let path = path.as_ref();
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!(path = %path.display(), "Removed temporary file"),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "Temporary file already gone")
            }
            Err(e) => {
                failures += 1;
                error!(path = %path.display(), error = %e, "Failed to remove file");
                EventLogger::log_event(
                    "cleanup",
                    MediaEvent::CleanupFailed {
                        path: path.display().to_string(),
                        error_msg: e.to_string(),
                    },
                );
            }
        }
    }
    failures
}
