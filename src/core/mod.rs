//! Core domain types and application plumbing

pub mod config;
pub mod error;
pub mod log;
pub mod rates;

// Re-export main types for cleaner imports
pub use error::{RatesError, Result};
pub use rates::{DateRange, RateRecord, RateSource};
