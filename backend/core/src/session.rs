//! Per-user merge sessions.
//!
//! A session lives between `/merge_audio` (or `/merge_video`) and the merge it
//! eventually triggers. Inputs take their slot when the message arrives
//! (`reserve`) and are filled once downloaded (`fill`), so the merge order is
//! the order the user sent the files in even when a later, smaller download
//! finishes first. All mutations go through one async mutex: when two
//! downloads for the same user finish together, exactly one caller sees the
//! session become `Ready`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::types::{MediaKind, MergeMode, ReceivedFile, UserId};

/// Number of inputs every merge needs.
pub const FILES_PER_MERGE: usize = 2;

/// Where a session stands, counting downloaded files only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingFirst,
    AwaitingSecond,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no merge in progress; use /merge_audio or /merge_video first")]
    NoSession,

    #[error("this {mode} merge expects a {expected} file, got {got}")]
    UnexpectedKind {
        mode: MergeMode,
        expected: MediaKind,
        got: MediaKind,
    },

    #[error("both files were already received; the merge is in progress")]
    AlreadyComplete,

    #[error("the merge was restarted while this file was downloading")]
    Superseded,
}

/// A slot held for a file that is still downloading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub user: UserId,
    pub kind: MediaKind,
    id: u64,
}

#[derive(Debug, Clone)]
struct Slot {
    id: u64,
    kind: MediaKind,
    path: Option<PathBuf>,
}

/// In-progress merge request for one user.
#[derive(Debug, Clone)]
pub struct MergeSession {
    pub mode: MergeMode,
    pub last_activity: Instant,
    slots: Vec<Slot>,
}

impl MergeSession {
    fn new(mode: MergeMode) -> Self {
        Self {
            mode,
            last_activity: Instant::now(),
            slots: Vec::with_capacity(FILES_PER_MERGE),
        }
    }

    pub fn state(&self) -> SessionState {
        match self.slots.iter().filter(|s| s.path.is_some()).count() {
            0 => SessionState::AwaitingFirst,
            1 => SessionState::AwaitingSecond,
            _ => SessionState::Ready,
        }
    }

    /// Downloaded files in the order their messages arrived.
    pub fn files(&self) -> Vec<ReceivedFile> {
        self.slots
            .iter()
            .filter_map(|s| s.path.as_ref().map(|p| ReceivedFile::new(p.clone(), s.kind)))
            .collect()
    }

    /// Slots reserved for files still downloading.
    pub fn pending(&self) -> usize {
        self.slots.iter().filter(|s| s.path.is_none()).count()
    }

    /// Kind the next file must have, if the mode constrains it.
    pub fn expected_kind(&self) -> Option<MediaKind> {
        match (self.mode, self.slots.first()) {
            (MergeMode::Audio, _) => Some(MediaKind::Audio),
            (MergeMode::Video, None) => None,
            (MergeMode::Video, Some(first)) => Some(first.kind.other()),
        }
    }

    fn admits(&self, kind: MediaKind) -> Result<(), SessionError> {
        if self.slots.len() >= FILES_PER_MERGE {
            return Err(SessionError::AlreadyComplete);
        }
        match self.expected_kind() {
            Some(expected) if expected != kind => Err(SessionError::UnexpectedKind {
                mode: self.mode,
                expected,
                got: kind,
            }),
            _ => Ok(()),
        }
    }

    fn push(&mut self, id: u64, kind: MediaKind, path: Option<PathBuf>) {
        self.slots.push(Slot { id, kind, path });
        self.last_activity = Instant::now();
    }
}

/// A complete pair of inputs handed to the merge step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeJob {
    pub user: UserId,
    pub mode: MergeMode,
    /// Ordered inputs. For video merges the video stream always comes first.
    pub inputs: Vec<ReceivedFile>,
}

/// Process-wide store of merge sessions, keyed by user.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<UserId, MergeSession>>,
    next_slot: AtomicU64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh session. Returns the session it replaced, if any, so the
    /// caller can delete files that will never be merged.
    pub async fn begin(&self, user: UserId, mode: MergeMode) -> Option<MergeSession> {
        debug!(%user, %mode, "Beginning merge session");
        self.sessions.lock().await.insert(user, MergeSession::new(mode))
    }

    /// Hold the next slot for a file of `kind` before it is downloaded.
    pub async fn reserve(&self, user: UserId, kind: MediaKind) -> Result<Reservation, SessionError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&user).ok_or(SessionError::NoSession)?;
        session.admits(kind)?;

        let id = self.next_slot.fetch_add(1, Ordering::Relaxed);
        session.push(id, kind, None);
        debug!(%user, %kind, slot = session.slots.len(), "Reserved merge slot");
        Ok(Reservation { user, kind, id })
    }

    /// Attach the downloaded file to its reserved slot.
    pub async fn fill(
        &self,
        reservation: &Reservation,
        path: impl Into<PathBuf>,
    ) -> Result<SessionState, SessionError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(&reservation.user)
            .ok_or(SessionError::NoSession)?;
        let slot = session
            .slots
            .iter_mut()
            .find(|s| s.id == reservation.id)
            .ok_or(SessionError::Superseded)?;

        slot.path = Some(path.into());
        session.last_activity = Instant::now();
        let state = session.state();
        debug!(user = %reservation.user, pending = session.pending(), ?state, "Filled merge slot");
        Ok(state)
    }

    /// Give up a reserved slot, e.g. after a failed download. Later slots move
    /// up so the session can still complete.
    pub async fn release(&self, reservation: &Reservation) {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get_mut(&reservation.user) {
            session.slots.retain(|s| s.id != reservation.id);
            session.last_activity = Instant::now();
        }
    }

    /// Record an already downloaded file for the user's session.
    pub async fn append(
        &self,
        user: UserId,
        file: ReceivedFile,
    ) -> Result<SessionState, SessionError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&user).ok_or(SessionError::NoSession)?;
        session.admits(file.kind)?;

        let id = self.next_slot.fetch_add(1, Ordering::Relaxed);
        session.push(id, file.kind, Some(file.path));
        let state = session.state();
        debug!(%user, slots = session.slots.len(), ?state, "Appended file to merge session");
        Ok(state)
    }

    /// Take a ready session out of the store. Sessions without two downloaded
    /// files are left untouched and `None` is returned.
    pub async fn consume(&self, user: UserId) -> Option<MergeJob> {
        let mut sessions = self.sessions.lock().await;
        if sessions.get(&user)?.state() != SessionState::Ready {
            return None;
        }
        let session = sessions.remove(&user)?;

        let mut inputs = session.files();
        if session.mode == MergeMode::Video {
            inputs.sort_by_key(|f| match f.kind {
                MediaKind::Video => 0,
                MediaKind::Audio => 1,
            });
        }
        Some(MergeJob {
            user,
            mode: session.mode,
            inputs,
        })
    }

    /// Drop the user's session without merging.
    pub async fn abandon(&self, user: UserId) -> Option<MergeSession> {
        self.sessions.lock().await.remove(&user)
    }

    pub async fn state(&self, user: UserId) -> Option<SessionState> {
        self.sessions.lock().await.get(&user).map(MergeSession::state)
    }

    pub async fn mode(&self, user: UserId) -> Option<MergeMode> {
        self.sessions.lock().await.get(&user).map(|s| s.mode)
    }

    /// Remove sessions with no activity for `max_age` and return them.
    pub async fn purge_older_than(&self, max_age: Duration) -> Vec<MergeSession> {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;
        let stale: Vec<UserId> = sessions
            .iter()
            .filter(|(_, s)| now.duration_since(s.last_activity) >= max_age)
            .map(|(user, _)| *user)
            .collect();
        stale.iter().filter_map(|user| sessions.remove(user)).collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}
