//! ECB reference rates served as JSON by the Frankfurter API.

use crate::core::rates::EUR;
use crate::core::{DateRange, RateRecord, RateSource, RatesError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, instrument};

pub struct FrankfurterProvider {
    base_url: String,
    home_currency: String,
    currencies: Vec<String>,
    client: reqwest::Client,
}

impl FrankfurterProvider {
    pub fn new(
        base_url: &str,
        home_currency: &str,
        currencies: &[String],
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("fxdash/0.1")
            .timeout(timeout)
            .build()?;
        Ok(FrankfurterProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            home_currency: home_currency.to_string(),
            currencies: currencies.to_vec(),
            client,
        })
    }

    /// Quote symbols requested against the EUR base, sorted.
    fn symbols(&self) -> String {
        let mut symbols: Vec<&str> = self
            .currencies
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.home_currency.as_str()))
            .filter(|c| *c != EUR)
            .collect();
        symbols.sort_unstable();
        symbols.dedup();
        symbols.join(",")
    }

    fn url(&self, range: &DateRange) -> String {
        format!(
            "{}/{}?from={}&to={}",
            self.base_url,
            range,
            EUR,
            self.symbols()
        )
    }

    async fn get_text(&self, range: &DateRange) -> Result<String> {
        let url = self.url(range);
        debug!("Requesting rates from {}", url);

        let unavailable = |reason: String| RatesError::SourceUnavailable {
            window: range.to_string(),
            reason,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| unavailable(format!("request error: {e}")))?;

        if !response.status().is_success() {
            return Err(unavailable(format!("HTTP error: {}", response.status())));
        }

        response
            .text()
            .await
            .map_err(|e| unavailable(format!("failed to read body: {e}")))
    }

    fn to_record(
        &self,
        range: &DateRange,
        date: NaiveDate,
        quotes: HashMap<String, serde_json::Number>,
    ) -> Result<RateRecord> {
        let mut parsed = HashMap::with_capacity(quotes.len());
        for (currency, number) in quotes {
            let value = Decimal::from_str(&number.to_string())
                .or_else(|_| Decimal::from_scientific(&number.to_string()))
                .map_err(|e| malformed(range, format!("rate for {currency} on {date}: {e}")))?;
            parsed.insert(currency.to_uppercase(), value);
        }
        RateRecord::from_eur_quotes(date, &parsed, &self.home_currency, &self.currencies)
            .map_err(|e| malformed(range, e.to_string()))
    }
}

fn malformed(range: &DateRange, reason: String) -> RatesError {
    RatesError::MalformedResponse {
        window: range.to_string(),
        reason,
    }
}

#[derive(Debug, Deserialize)]
struct DayResponse {
    base: String,
    date: NaiveDate,
    rates: HashMap<String, serde_json::Number>,
}

#[derive(Debug, Deserialize)]
struct RangeResponse {
    base: String,
    rates: BTreeMap<NaiveDate, HashMap<String, serde_json::Number>>,
}

#[async_trait]
impl RateSource for FrankfurterProvider {
    #[instrument(name = "FrankfurterFetch", skip(self), fields(window = %range))]
    async fn fetch(&self, range: DateRange) -> Result<Vec<RateRecord>> {
        let text = self.get_text(&range).await?;

        if range.is_single_day() {
            let data: DayResponse = serde_json::from_str(&text)
                .map_err(|e| malformed(&range, format!("failed to parse JSON: {e}")))?;
            if data.base != EUR {
                return Err(malformed(&range, format!("unexpected base {}", data.base)));
            }
            // A non-business day is answered with the preceding business day
            if data.date != range.start() {
                debug!(
                    "No rate published for {}, source answered with {}",
                    range.start(),
                    data.date
                );
                return Ok(Vec::new());
            }
            return Ok(vec![self.to_record(&range, data.date, data.rates)?]);
        }

        let data: RangeResponse = serde_json::from_str(&text)
            .map_err(|e| malformed(&range, format!("failed to parse JSON: {e}")))?;
        if data.base != EUR {
            return Err(malformed(&range, format!("unexpected base {}", data.base)));
        }

        let mut records = Vec::with_capacity(data.rates.len());
        for (date, quotes) in data.rates {
            if !range.contains(date) {
                continue;
            }
            records.push(self.to_record(&range, date, quotes)?);
        }
        debug!("Received {} daily records", records.len());
        Ok(records)
    }
}
