//! Static HTML dashboard rendered from the historical store.
//!
//! The page is a pure function of the store contents: no clock, no random
//! ordering, fixed number formatting. Rendering the same store twice yields
//! byte-identical output.

pub mod chart;

use crate::core::rates::rate_scale;
use crate::core::{RateRecord, RatesError, Result};
use crate::store::{HistoricalStore, write_atomically};
use askama::Template;
use chrono::Days;
use rust_decimal::Decimal;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub home_currency: String,
    /// Days before the latest record drawn in charts; `None` draws everything
    pub chart_days: Option<u32>,
}

/// Change of one currency between the two most recent records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateChange {
    pub currency: String,
    pub rate: Decimal,
    pub change: Option<Decimal>,
    pub change_pct: Option<Decimal>,
}

impl RateChange {
    fn trend(&self) -> &'static str {
        match self.change {
            Some(c) if c > Decimal::ZERO => "up",
            Some(c) if c < Decimal::ZERO => "down",
            _ => "flat",
        }
    }
}

/// Latest rate per currency with the change against the previous record.
pub fn current_rates(store: &HistoricalStore) -> Result<(&RateRecord, Vec<RateChange>)> {
    let records = store.records();
    let latest = records.last().ok_or(RatesError::EmptyStore)?;
    let previous = records.len().checked_sub(2).map(|i| &records[i]);

    let changes = store
        .currencies()
        .iter()
        .filter_map(|currency| {
            let rate = latest.rate(currency)?;
            let before = previous.and_then(|p| p.rate(currency));
            let change = before.map(|b| rate - b);
            let change_pct = before
                .zip(change)
                .and_then(|(b, c)| (c * Decimal::ONE_HUNDRED).checked_div(b))
                .map(|pct| pct.round_dp(2));
            Some(RateChange {
                currency: currency.clone(),
                rate,
                change,
                change_pct,
            })
        })
        .collect();
    Ok((latest, changes))
}

struct CurrentRow {
    currency: String,
    rate: String,
    change: String,
    change_pct: String,
    trend: &'static str,
}

struct ChartView {
    currency: String,
    points: String,
    low: String,
    high: String,
    width: u32,
    height: u32,
}

struct HistoryRow {
    date: String,
    values: Vec<String>,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardPage {
    home_currency: String,
    latest_date: String,
    previous_date: String,
    first_date: String,
    chart_from: String,
    record_count: usize,
    currencies: Vec<String>,
    current: Vec<CurrentRow>,
    charts: Vec<ChartView>,
    history: Vec<HistoryRow>,
}

fn na() -> String {
    "n/a".to_string()
}

fn fixed(value: Decimal, dp: usize) -> String {
    let value = value.round_dp(dp as u32);
    let value = if value.is_zero() { Decimal::ZERO } else { value };
    format!("{value:.dp$}")
}

fn signed(value: Option<Decimal>, dp: usize) -> String {
    match value {
        Some(v) if v.round_dp(dp as u32) > Decimal::ZERO => format!("+{}", fixed(v, dp)),
        Some(v) => fixed(v, dp),
        None => na(),
    }
}

/// Renders the dashboard for the whole store.
pub fn render(store: &HistoricalStore, options: &DashboardOptions) -> Result<String> {
    let (latest, changes) = current_rates(store)?;
    let records = store.records();
    let currencies = store.currencies().to_vec();

    let chart_from = match options.chart_days {
        Some(days) => latest
            .date()
            .checked_sub_days(Days::new(u64::from(days)))
            .unwrap_or(records[0].date()),
        None => records[0].date(),
    };
    let charted: Vec<&RateRecord> = records
        .iter()
        .filter(|r| r.date() >= chart_from)
        .collect();

    let current = changes
        .iter()
        .map(|c| {
            let dp = rate_scale(c.rate) as usize;
            CurrentRow {
                currency: c.currency.clone(),
                rate: fixed(c.rate, dp),
                change: signed(c.change, dp),
                change_pct: c
                    .change_pct
                    .map_or_else(na, |p| format!("{}%", signed(Some(p), 2))),
                trend: c.trend(),
            }
        })
        .collect();

    let charts = currencies
        .iter()
        .map(|currency| {
            let series: Vec<Decimal> = charted.iter().filter_map(|r| r.rate(currency)).collect();
            let low = series.iter().copied().min().unwrap_or_default();
            let high = series.iter().copied().max().unwrap_or_default();
            ChartView {
                currency: currency.clone(),
                points: chart::polyline_points(&series),
                low: fixed(low, rate_scale(low) as usize),
                high: fixed(high, rate_scale(high) as usize),
                width: chart::WIDTH,
                height: chart::HEIGHT,
            }
        })
        .collect();

    let history = records
        .iter()
        .rev()
        .map(|r| HistoryRow {
            date: r.date().to_string(),
            values: currencies
                .iter()
                .map(|c| r.rate(c).map_or_else(na, |v| fixed(v, rate_scale(v) as usize)))
                .collect(),
        })
        .collect();

    let page = DashboardPage {
        home_currency: options.home_currency.clone(),
        latest_date: latest.date().to_string(),
        previous_date: records
            .len()
            .checked_sub(2)
            .map_or_else(na, |i| records[i].date().to_string()),
        first_date: records[0].date().to_string(),
        chart_from: charted
            .first()
            .map_or_else(|| latest.date().to_string(), |r| r.date().to_string()),
        record_count: records.len(),
        currencies,
        current,
        charts,
        history,
    };

    let html = page.render().map_err(|e| RatesError::Render(e.to_string()))?;
    debug!("Rendered dashboard for {} records", records.len());
    Ok(html)
}

/// Renders the dashboard and replaces the page at `path`.
pub fn write(store: &HistoricalStore, options: &DashboardOptions, path: &Path) -> Result<()> {
    let html = render(store, options)?;
    write_atomically(path, html.as_bytes())?;
    debug!("Wrote dashboard to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::testing::{currencies, sample_record};
    use chrono::NaiveDate;
    use std::str::FromStr;
    use tempfile::TempDir;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::from_str(s).unwrap()
    }

    fn options() -> DashboardOptions {
        DashboardOptions {
            home_currency: "PLN".to_string(),
            chart_days: Some(365),
        }
    }

    fn store_with(dir: &TempDir, days: &[(&str, i64)]) -> HistoricalStore {
        let mut store = HistoricalStore::open(dir.path().join("h.csv"), &currencies()).unwrap();
        for (day, seed) in days {
            store.append(sample_record(d(day), *seed)).unwrap();
        }
        store
    }

    #[test]
    fn test_empty_store_cannot_render() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &[]);
        assert!(matches!(render(&store, &options()), Err(RatesError::EmptyStore)));
    }

    #[test]
    fn test_render_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &[("2024-03-01", 0), ("2024-03-04", 25), ("2024-03-05", 10)]);

        let first = render(&store, &options()).unwrap();
        let second = render(&store, &options()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_current_rates_reflect_latest_record() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &[("2024-03-01", 0), ("2024-03-04", 25), ("2024-03-05", 10)]);

        let (latest, changes) = current_rates(&store).unwrap();
        assert_eq!(latest.date(), d("2024-03-05"));
        let eur = &changes[0];
        assert_eq!(eur.currency, "EUR");
        assert_eq!(eur.rate, Decimal::new(43010, 4));
        assert_eq!(eur.change, Some(Decimal::new(-15, 4)));
        // -0.0015 / 4.3025 * 100 = -0.0348..
        assert_eq!(eur.change_pct, Some(Decimal::new(-3, 2)));
        assert_eq!(eur.trend(), "down");

        let html = render(&store, &options()).unwrap();
        assert!(html.contains("2024-03-05"));
        assert!(html.contains("4.3010"));
        assert!(html.contains("-0.0015"));
        assert!(html.contains("-0.03%"));
    }

    #[test]
    fn test_single_record_has_no_change() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &[("2024-03-01", 0)]);

        let (_, changes) = current_rates(&store).unwrap();
        assert!(changes.iter().all(|c| c.change.is_none() && c.trend() == "flat"));
        let html = render(&store, &options()).unwrap();
        assert!(html.contains("n/a"));
    }

    #[test]
    fn test_history_lists_every_record_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &[("2023-01-02", 0), ("2024-03-01", 5), ("2024-03-04", 9)]);

        let html = render(&store, &options()).unwrap();
        let newest = html.find("<td>2024-03-04</td>").unwrap();
        let oldest = html.find("<td>2023-01-02</td>").unwrap();
        assert!(newest < oldest);
        // Charts start within the last year before the latest record
        assert!(html.contains("from 2024-03-01"));
    }

    #[test]
    fn test_low_value_rates_keep_their_digits() {
        let dir = TempDir::new().unwrap();
        let idr = vec!["IDR".to_string()];
        let mut store = HistoricalStore::open(dir.path().join("h.csv"), &idr).unwrap();
        for (day, value) in [("2024-03-01", 48571), ("2024-03-04", 48602)] {
            let rate = Decimal::new(value, 9);
            store
                .append(RateRecord::new(d(day), vec![("IDR".to_string(), rate)]).unwrap())
                .unwrap();
        }

        let html = render(&store, &options()).unwrap();
        assert!(html.contains("<td>0.000048602</td>"));
        assert!(html.contains("+0.000000031"));
    }

    #[test]
    fn test_write_replaces_page() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &[("2024-03-01", 0)]);
        let path = dir.path().join("site").join("dashboard.html");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "stale").unwrap();

        write(&store, &options(), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("<!DOCTYPE html>"));
        assert_eq!(content, render(&store, &options()).unwrap());
    }
}
