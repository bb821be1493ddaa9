//! Downtime bookkeeping: entries, the registry that owns them, and reporting.

mod clock;
mod entry;
mod registry;
mod report;

pub use clock::{ManualClock, SystemTimeSource, TimeSource};
pub use entry::DowntimeEntry;
pub use registry::{DowntimeRegistry, OpenOutcome};
pub use report::{Report, ReportFormat};
