//! Backfill and daily jobs: fetch missing days and append them to the store.

pub mod backfill;
pub mod daily;

pub use backfill::{BackfillSummary, FailedDate};
pub use daily::DailyOutcome;
