//! Rate records, date windows and the rate source abstraction

use crate::core::error::{RatesError, Result};
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;

/// Minimum number of decimal places kept for a home-currency rate.
pub const RATE_SCALE: u32 = 4;

/// Significant digits kept for rates below one, which get extra decimals.
pub const RATE_SIGNIFICANT_DIGITS: u32 = 5;

const MAX_RATE_SCALE: u32 = 20;

/// Decimal places kept for `value`: [`RATE_SCALE`], or more when the value is
/// small enough that [`RATE_SIGNIFICANT_DIGITS`] digits need them.
///
/// Rates of 1 and above always get [`RATE_SCALE`] places.
pub fn rate_scale(value: Decimal) -> u32 {
    let mut scale = RATE_SCALE;
    // 10^(digits - 1 - scale) is the smallest value with enough digits at `scale`
    while scale < MAX_RATE_SCALE
        && value < Decimal::new(1, scale + 1 - RATE_SIGNIFICANT_DIGITS)
    {
        scale += 1;
    }
    scale
}

/// Base currency of the reference rates published by the ECB.
pub const EUR: &str = "EUR";

/// Daily rates for the tracked currencies, expressed as units of home
/// currency per one unit of foreign currency.
///
/// Fields are private: a record is validated once in [`RateRecord::new`] and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateRecord {
    date: NaiveDate,
    rates: BTreeMap<String, Decimal>,
}

impl RateRecord {
    pub fn new<I>(date: NaiveDate, rates: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, Decimal)>,
    {
        let mut validated = BTreeMap::new();
        for (currency, value) in rates {
            let value = value.round_dp(rate_scale(value));
            if value <= Decimal::ZERO {
                return Err(RatesError::InvalidRate {
                    date,
                    currency,
                    reason: format!("{value} is not a positive rate"),
                });
            }
            validated.insert(currency, value);
        }
        Ok(Self {
            date,
            rates: validated,
        })
    }

    /// Derives home-currency rates from ECB quotes of the form `1 EUR = X ccy`.
    ///
    /// `value(ccy) = eur(home) / eur(ccy)` with `eur(EUR) = 1`.
    pub fn from_eur_quotes(
        date: NaiveDate,
        quotes: &HashMap<String, Decimal>,
        home: &str,
        currencies: &[String],
    ) -> Result<Self> {
        let quote = |currency: &str| -> Result<Decimal> {
            if currency == EUR {
                return Ok(Decimal::ONE);
            }
            match quotes.get(currency) {
                Some(q) if *q > Decimal::ZERO => Ok(*q),
                Some(q) => Err(RatesError::InvalidRate {
                    date,
                    currency: currency.to_string(),
                    reason: format!("quote {q} is not positive"),
                }),
                None => Err(RatesError::InvalidRate {
                    date,
                    currency: currency.to_string(),
                    reason: "quote is missing".to_string(),
                }),
            }
        };

        let home_quote = quote(home)?;
        let mut rates = Vec::with_capacity(currencies.len());
        for currency in currencies {
            let value = home_quote.checked_div(quote(currency)?).ok_or_else(|| {
                RatesError::InvalidRate {
                    date,
                    currency: currency.clone(),
                    reason: "conversion overflowed".to_string(),
                }
            })?;
            rates.push((currency.clone(), value));
        }
        Self::new(date, rates)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn rate(&self, currency: &str) -> Option<Decimal> {
        self.rates.get(currency).copied()
    }

    pub fn rates(&self) -> &BTreeMap<String, Decimal> {
        &self.rates
    }

    /// True if the record carries exactly the given currency set.
    pub fn covers_exactly(&self, currencies: &[String]) -> bool {
        self.rates.len() == currencies.len() && currencies.iter().all(|c| self.rates.contains_key(c))
    }
}

/// Inclusive calendar date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// The `days` calendar days ending at (and including) `end`.
    pub fn ending_at(end: NaiveDate, days: u32) -> Self {
        let back = u64::from(days.max(1) - 1);
        let start = end.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn is_single_day(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_single_day() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}..{}", self.start, self.end)
        }
    }
}

/// A provider of published daily rates.
///
/// Returns one record per business day inside `range`, ascending by date.
/// Days without a published rate are absent from the result.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch(&self, range: DateRange) -> Result<Vec<RateRecord>>;
}
