use async_trait::async_trait;
use tracing::info;

use crate::{ProgressUpdate, TrackingProgressUpdater};

/// Reports progress through tracing at info level; this is what the `verbose` option installs.
///
/// Intermediate updates are only reported once the item has advanced by at least
/// `report_every` units since the previous report; completion is always reported.
#[derive(Debug)]
pub struct LoggingProgressUpdater {
    report_every: u64,
}

impl LoggingProgressUpdater {
    pub fn new(report_every: u64) -> Self {
        Self { report_every }
    }

    fn should_report(&self, update: &ProgressUpdate) -> bool {
        if update.is_complete() || self.report_every == 0 {
            return true;
        }
        let before = update.completed_count - update.update_increment;
        before / self.report_every != update.completed_count / self.report_every
    }
}

impl Default for LoggingProgressUpdater {
    fn default() -> Self {
        Self::new(256 * 1024)
    }
}

#[async_trait]
impl TrackingProgressUpdater for LoggingProgressUpdater {
    async fn register_updates(&self, updates: &[ProgressUpdate]) {
        for update in updates.iter().filter(|u| self.should_report(u)) {
            if update.total_count == 0 {
                info!(item = %update.item_name, completed = update.completed_count, "fetching");
            } else {
                let pct = update.completed_count as f64 * 100.0 / update.total_count as f64;
                info!(
                    item = %update.item_name,
                    completed = update.completed_count,
                    total = update.total_count,
                    "fetching: {pct:.1}%"
                );
            }
        }
    }
}
