pub mod error;
pub mod session;
pub mod traits;
pub mod types;

pub use error::BotError;
pub use session::{MergeJob, MergeSession, Reservation, SessionError, SessionState, SessionStore};
pub use traits::ProgressObserver;
pub use types::{MediaKind, MergeMode, ReceivedFile, UserId};

/// Largest file a user may submit for merging (2 GiB).
pub const MAX_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024;
