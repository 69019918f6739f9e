//! Error taxonomy shared by the source client, the store and the renderer

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RatesError {
    #[error("Rate source unavailable for {window}: {reason}")]
    SourceUnavailable { window: String, reason: String },

    #[error("Malformed response for {window}: {reason}")]
    MalformedResponse { window: String, reason: String },

    #[error("A record for {0} already exists")]
    DuplicateDate(NaiveDate),

    #[error("Corrupt store {} at line {line}: {reason}", .path.display())]
    CorruptStore {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Store has no records to render")]
    EmptyStore,

    #[error("Invalid rate for {currency} on {date}: {reason}")]
    InvalidRate {
        date: NaiveDate,
        currency: String,
        reason: String,
    },

    #[error("Currency set mismatch on {date}: expected [{expected}], found [{found}]")]
    CurrencyMismatch {
        date: NaiveDate,
        expected: String,
        found: String,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render dashboard: {0}")]
    Render(String),
}

impl RatesError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RatesError::Io {
            path: path.into(),
            source,
        }
    }

    /// Kind name used in user-facing summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            RatesError::SourceUnavailable { .. } => "SourceUnavailable",
            RatesError::MalformedResponse { .. } => "MalformedResponse",
            RatesError::DuplicateDate(_) => "DuplicateDate",
            RatesError::CorruptStore { .. } => "CorruptStore",
            RatesError::EmptyStore => "EmptyStore",
            RatesError::InvalidRate { .. } => "InvalidRate",
            RatesError::CurrencyMismatch { .. } => "CurrencyMismatch",
            RatesError::Io { .. } => "Io",
            RatesError::Render(_) => "Render",
        }
    }
}

pub type Result<T> = std::result::Result<T, RatesError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_date_and_kind() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let err = RatesError::DuplicateDate(date);
        assert_eq!(err.to_string(), "A record for 2024-03-01 already exists");
        assert_eq!(err.kind(), "DuplicateDate");

        let err = RatesError::CorruptStore {
            path: PathBuf::from("data/history_pln.csv"),
            line: 3,
            reason: "expected 5 fields, found 4".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Corrupt store data/history_pln.csv at line 3: expected 5 fields, found 4"
        );
    }
}
