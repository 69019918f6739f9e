//! CSV layout of the store: `date,<ccy1>,<ccy2>,..` then one row per day,
//! ascending, values with four decimals (more for rates below one, see
//! [`rate_scale`]).

use crate::core::rates::rate_scale;
use crate::core::{RateRecord, RatesError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

const DATE_COLUMN: &str = "date";
const DATE_FORMAT: &str = "%Y-%m-%d";

pub(super) fn decode(path: &Path, bytes: &[u8], currencies: &[String]) -> Result<Vec<RateRecord>> {
    let corrupt = |line: usize, reason: String| RatesError::CorruptStore {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    let mut rows = reader.records();

    let header = match rows.next() {
        None => return Ok(Vec::new()),
        Some(row) => row.map_err(|e| corrupt(1, e.to_string()))?,
    };
    let expected: Vec<&str> = std::iter::once(DATE_COLUMN)
        .chain(currencies.iter().map(String::as_str))
        .collect();
    if header.iter().map(str::trim).ne(expected.iter().copied()) {
        return Err(corrupt(
            1,
            format!(
                "unexpected header '{}', expected '{}'",
                header.iter().collect::<Vec<_>>().join(","),
                expected.join(",")
            ),
        ));
    }

    let mut records: Vec<RateRecord> = Vec::new();
    for (index, row) in rows.enumerate() {
        let line = index + 2;
        let row = row.map_err(|e| corrupt(line, e.to_string()))?;
        if row.len() != expected.len() {
            return Err(corrupt(
                line,
                format!("expected {} fields, found {}", expected.len(), row.len()),
            ));
        }

        let raw_date = row[0].trim();
        let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT)
            .map_err(|e| corrupt(line, format!("invalid date '{raw_date}': {e}")))?;
        if let Some(previous) = records.last()
            && previous.date() >= date
        {
            return Err(corrupt(
                line,
                format!("date {date} does not follow {}", previous.date()),
            ));
        }

        let mut rates = Vec::with_capacity(currencies.len());
        for (currency, raw) in currencies.iter().zip(row.iter().skip(1)) {
            let value = Decimal::from_str(raw.trim())
                .map_err(|e| corrupt(line, format!("invalid value '{raw}' for {currency}: {e}")))?;
            let scale = rate_scale(value);
            if value.round_dp(scale) != value {
                return Err(corrupt(
                    line,
                    format!("value '{raw}' for {currency} has more than {scale} decimals"),
                ));
            }
            rates.push((currency.clone(), value));
        }
        let record = RateRecord::new(date, rates).map_err(|e| corrupt(line, e.to_string()))?;
        records.push(record);
    }
    Ok(records)
}

pub(super) fn encode(path: &Path, currencies: &[String], records: &[RateRecord]) -> Result<Vec<u8>> {
    let to_io = |e: csv::Error| RatesError::io(path, std::io::Error::other(e));

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let header = std::iter::once(DATE_COLUMN).chain(currencies.iter().map(String::as_str));
    writer.write_record(header).map_err(to_io)?;

    for record in records {
        let mut row = Vec::with_capacity(currencies.len() + 1);
        row.push(record.date().format(DATE_FORMAT).to_string());
        for currency in currencies {
            let value = record
                .rate(currency)
                .ok_or_else(|| RatesError::CurrencyMismatch {
                    date: record.date(),
                    expected: currencies.join(","),
                    found: record.rates().keys().cloned().collect::<Vec<_>>().join(","),
                })?;
            let precision = rate_scale(value) as usize;
            row.push(format!("{value:.precision$}"));
        }
        writer.write_record(&row).map_err(to_io)?;
    }

    writer
        .into_inner()
        .map_err(|e| RatesError::io(path, std::io::Error::other(e.to_string())))
}
