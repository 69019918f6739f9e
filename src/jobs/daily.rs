use crate::core::{DateRange, RateSource, Result};
use crate::store::HistoricalStore;
use chrono::{Days, NaiveDate};
use tracing::{info, instrument};

/// Days before today searched for a published rate when today has none yet.
pub const CATCH_UP_DAYS: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyOutcome {
    /// Today was stored by an earlier run; nothing was fetched
    AlreadyPresent,
    Inserted,
    /// Today has no rate yet, but the latest published day was missing and
    /// got stored
    CaughtUp(NaiveDate),
    /// The source answered but has no rate for today (weekend, holiday, or
    /// not yet published) and the latest published day is already stored
    NotPublished,
}

impl DailyOutcome {
    pub fn store_changed(&self) -> bool {
        matches!(self, DailyOutcome::Inserted | DailyOutcome::CaughtUp(_))
    }
}

/// Makes sure today's rate is in the store.
///
/// When today has no rate yet (the run happened before publication, or on a
/// weekend) the latest rate published during the previous [`CATCH_UP_DAYS`]
/// days is stored instead, if it is missing.
///
/// A fetch error is returned as is and leaves the store untouched.
#[instrument(name = "Daily", skip(source, store))]
pub async fn run(
    source: &dyn RateSource,
    store: &mut HistoricalStore,
    today: NaiveDate,
) -> Result<DailyOutcome> {
    if store.has(today) {
        info!("Rate for {} already stored", today);
        return Ok(DailyOutcome::AlreadyPresent);
    }

    let records = source.fetch(DateRange::day(today)).await?;
    if let Some(record) = records.into_iter().find(|r| r.date() == today) {
        store.append(record)?;
        info!("Stored rate for {}", today);
        return Ok(DailyOutcome::Inserted);
    }
    info!("No rate published for {}", today);

    let Some(lookback) = today
        .checked_sub_days(Days::new(1))
        .map(|end| DateRange::ending_at(end, CATCH_UP_DAYS))
    else {
        return Ok(DailyOutcome::NotPublished);
    };
    let latest = source.fetch(lookback).await?.into_iter().max_by_key(|r| r.date());
    match latest {
        Some(record) if !store.has(record.date()) => {
            let date = record.date();
            store.append(record)?;
            info!("Stored latest published rate for {}", date);
            Ok(DailyOutcome::CaughtUp(date))
        }
        _ => Ok(DailyOutcome::NotPublished),
    }
}
