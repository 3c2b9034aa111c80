mod logging_updater;
mod update_interfaces;

pub use logging_updater::LoggingProgressUpdater;
pub use update_interfaces::{ProgressUpdate, RangeProgress, TrackingProgressUpdater};
