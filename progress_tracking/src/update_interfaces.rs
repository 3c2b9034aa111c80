use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use more_asserts::debug_assert_le;

/// Byte progress of one named range transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub item_name: Arc<str>,
    pub total_count: u64,
    pub completed_count: u64,
    pub update_increment: u64,
}

impl ProgressUpdate {
    pub fn is_complete(&self) -> bool {
        self.total_count != 0 && self.completed_count >= self.total_count
    }
}

/// Receives progress for range transfers, possibly several at once.
#[async_trait]
pub trait TrackingProgressUpdater: Debug + Send + Sync {
    async fn register_updates(&self, updates: &[ProgressUpdate]);
}

/// Accumulates received bytes for a single range and forwards each step to a
/// [`TrackingProgressUpdater`].
#[derive(Debug)]
pub struct RangeProgress {
    item_name: Arc<str>,
    total_bytes: u64,
    received: AtomicU64,
    inner: Arc<dyn TrackingProgressUpdater>,
}

impl RangeProgress {
    pub fn new(inner: Arc<dyn TrackingProgressUpdater>, item_name: Arc<str>, total_bytes: u64) -> Self {
        Self {
            item_name,
            total_bytes,
            received: AtomicU64::new(0),
            inner,
        }
    }

    /// Records `n` more bytes received.
    pub async fn record(&self, n: u64) {
        let received = self.received.fetch_add(n, Ordering::Relaxed) + n;
        debug_assert_le!(received, self.total_bytes);

        let update = ProgressUpdate {
            item_name: self.item_name.clone(),
            total_count: self.total_bytes,
            completed_count: received,
            update_increment: n,
        };
        self.inner.register_updates(&[update]).await;
    }

    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Default)]
    struct RecordingUpdater {
        updates: Mutex<Vec<ProgressUpdate>>,
    }

    #[async_trait]
    impl TrackingProgressUpdater for RecordingUpdater {
        async fn register_updates(&self, updates: &[ProgressUpdate]) {
            self.updates.lock().unwrap().extend_from_slice(updates);
        }
    }

    #[tokio::test]
    async fn test_range_progress_accumulates() {
        let recorder = Arc::new(RecordingUpdater::default());
        let progress = RangeProgress::new(recorder.clone(), "bytes=0-99".into(), 100);

        progress.record(40).await;
        progress.record(60).await;

        let updates = recorder.updates.lock().unwrap().clone();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].completed_count, 40);
        assert!(!updates[0].is_complete());
        assert_eq!(updates[1].completed_count, 100);
        assert_eq!(updates[1].update_increment, 60);
        assert!(updates[1].is_complete());
        assert_eq!(progress.received(), 100);
    }

    #[test]
    fn test_unknown_total_never_complete() {
        let update = ProgressUpdate {
            item_name: "probe".into(),
            total_count: 0,
            completed_count: 10,
            update_increment: 10,
        };
        assert!(!update.is_complete());
    }
}
