use async_trait::async_trait;

/// Receives progress from long-running operations (transfers, transforms).
///
/// Implementations decide how (and how often) to surface it; the media and
/// handler layers only ever talk to this trait.
#[async_trait]
pub trait ProgressObserver: Send + Sync {
    /// Replace the visible status with `text`.
    async fn status(&self, text: &str);

    /// Byte-level transfer progress. `total` is 0 when unknown.
    async fn transfer(&self, _label: &str, _done: u64, _total: u64) {}
}
