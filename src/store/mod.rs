//! Append-only, date-ordered record of daily rates persisted as CSV.

pub mod atomic;
mod format;

use crate::core::{RateRecord, RatesError, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::debug;

pub use atomic::write_atomically;

pub struct HistoricalStore {
    path: PathBuf,
    currencies: Vec<String>,
    records: Vec<RateRecord>,
}

impl HistoricalStore {
    /// Loads the store persisted at `path`. A missing file is an empty store.
    ///
    /// Fails with [`RatesError::CorruptStore`] if any row cannot be turned into
    /// a valid record; nothing is loaded in that case.
    pub fn open(path: impl Into<PathBuf>, currencies: &[String]) -> Result<Self> {
        let path = path.into();
        let records = if path.exists() {
            let bytes = std::fs::read(&path).map_err(|e| RatesError::io(&path, e))?;
            format::decode(&path, &bytes, currencies)?
        } else {
            debug!("No store at {}, starting empty", path.display());
            Vec::new()
        };
        debug!("Loaded {} records from {}", records.len(), path.display());
        Ok(Self {
            path,
            currencies: currencies.to_vec(),
            records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn currencies(&self) -> &[String] {
        &self.currencies
    }

    pub fn has(&self, date: NaiveDate) -> bool {
        self.position(date).is_ok()
    }

    /// Inserts `record` keeping date order.
    pub fn append(&mut self, record: RateRecord) -> Result<()> {
        if !record.covers_exactly(&self.currencies) {
            return Err(RatesError::CurrencyMismatch {
                date: record.date(),
                expected: self.currencies.join(","),
                found: record.rates().keys().cloned().collect::<Vec<_>>().join(","),
            });
        }
        match self.position(record.date()) {
            Ok(_) => Err(RatesError::DuplicateDate(record.date())),
            Err(index) => {
                debug!("Appending record for {}", record.date());
                self.records.insert(index, record);
                Ok(())
            }
        }
    }

    /// All records, ascending by date.
    pub fn records(&self) -> &[RateRecord] {
        &self.records
    }

    pub fn latest(&self) -> Option<&RateRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Persists the whole store, replacing the previous file in one step.
    pub fn save(&self) -> Result<()> {
        let bytes = format::encode(&self.path, &self.currencies, &self.records)?;
        write_atomically(&self.path, &bytes)?;
        debug!("Saved {} records to {}", self.records.len(), self.path.display());
        Ok(())
    }

    fn position(&self, date: NaiveDate) -> std::result::Result<usize, usize> {
        self.records.binary_search_by_key(&date, RateRecord::date)
    }
}
