use crate::core::{DateRange, RateRecord, RateSource, RatesError};
use crate::store::HistoricalStore;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDate {
    pub date: NaiveDate,
    pub kind: &'static str,
    pub reason: String,
}

impl FailedDate {
    fn new(date: NaiveDate, err: &RatesError) -> Self {
        Self {
            date,
            kind: err.kind(),
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillSummary {
    pub window: DateRange,
    pub inserted: Vec<NaiveDate>,
    pub already_present: usize,
    /// Days the source published no rate for (weekends, holidays)
    pub skipped: Vec<NaiveDate>,
    pub failed: Vec<FailedDate>,
}

impl BackfillSummary {
    fn new(window: DateRange) -> Self {
        Self {
            window,
            inserted: Vec::new(),
            already_present: 0,
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn store_changed(&self) -> bool {
        !self.inserted.is_empty()
    }

    /// True if some days failed and nothing was stored.
    pub fn nothing_stored(&self) -> bool {
        self.inserted.is_empty() && !self.failed.is_empty()
    }
}

/// Fills every missing day of the `days`-long window ending at `today`.
///
/// Missing days are requested in a single range call. If the source answered
/// that call with something unreadable, each missing day is requested on its
/// own so one bad day only costs that day. An unreachable source fails every
/// remaining day at once instead of being retried per day.
#[instrument(name = "Backfill", skip(source, store))]
pub async fn run(
    source: &dyn RateSource,
    store: &mut HistoricalStore,
    today: NaiveDate,
    days: u32,
) -> BackfillSummary {
    let window = DateRange::ending_at(today, days);
    let mut summary = BackfillSummary::new(window);

    let missing: Vec<NaiveDate> = window.days().filter(|day| !store.has(*day)).collect();
    summary.already_present = window.days().count() - missing.len();

    let (Some(first), Some(last)) = (missing.first(), missing.last()) else {
        info!("All {} days of {} already stored", summary.already_present, window);
        return summary;
    };
    info!(
        "{} of {} days missing in {}",
        missing.len(),
        missing.len() + summary.already_present,
        window
    );

    let span = DateRange::new(*first, *last).unwrap_or(window);
    let mut prefetched: Option<BTreeMap<NaiveDate, RateRecord>> = match source.fetch(span).await {
        Ok(records) => Some(records.into_iter().map(|r| (r.date(), r)).collect()),
        Err(e @ RatesError::MalformedResponse { .. }) => {
            warn!(error = %e, "Range request failed, requesting days one by one");
            None
        }
        Err(e) => {
            warn!(error = %e, "Rate source unreachable, giving up on {}", span);
            summary.failed = missing.iter().map(|date| FailedDate::new(*date, &e)).collect();
            return summary;
        }
    };

    let mut remaining = missing.into_iter();
    while let Some(date) = remaining.next() {
        let fetched = match prefetched.as_mut() {
            Some(records) => Ok(records.remove(&date)),
            None => source
                .fetch(DateRange::day(date))
                .await
                .map(|records| records.into_iter().find(|r| r.date() == date)),
        };

        match fetched {
            Ok(Some(record)) => match store.append(record) {
                Ok(()) => summary.inserted.push(date),
                Err(e) => {
                    warn!(%date, error = %e, "Could not store rate");
                    summary.failed.push(FailedDate::new(date, &e));
                }
            },
            Ok(None) => {
                debug!(%date, "No rate published");
                summary.skipped.push(date);
            }
            Err(e @ RatesError::SourceUnavailable { .. }) => {
                warn!(%date, error = %e, "Rate source unreachable, giving up on remaining days");
                summary.failed.push(FailedDate::new(date, &e));
                summary
                    .failed
                    .extend(remaining.by_ref().map(|day| FailedDate::new(day, &e)));
            }
            Err(e) => {
                warn!(%date, error = %e, "Could not fetch rate");
                summary.failed.push(FailedDate::new(date, &e));
            }
        }
    }

    info!(
        inserted = summary.inserted.len(),
        skipped = summary.skipped.len(),
        failed = summary.failed.len(),
        "Backfill finished"
    );
    summary
}
