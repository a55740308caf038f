//! NAV provider speaking a plain JSON-over-HTTP protocol.
//!
//! Endpoint: `GET {base_url}/funds/{fund_code}/history?start=&end=`
//! returning `{"fund_name": "...", "quotes": [{"date": "YYYY-MM-DD",
//! "unit_nav": ..., "cumulative_nav": ..., "daily_growth_rate": ...}]}`.

use crate::core::nav::{NavProvider, NavQuote};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const SOURCE: &str = "http";
const RETRIES: usize = 3;
const RETRY_DELAY_MS: u64 = 500;

pub struct HttpNavProvider {
    base_url: String,
}

impl HttpNavProvider {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    fund_name: Option<String>,
    #[serde(default)]
    quotes: Vec<QuoteEntry>,
}

#[derive(Debug, Deserialize)]
struct QuoteEntry {
    date: String,
    unit_nav: Decimal,
    cumulative_nav: Option<Decimal>,
    daily_growth_rate: Option<Decimal>,
}

#[async_trait]
impl NavProvider for HttpNavProvider {
    async fn fetch_history(
        &self,
        fund_code: &str,
        fund_name: &str,
        start: Option<NaiveDate>,
        end: NaiveDate,
    ) -> Result<Vec<NavQuote>> {
        let url = format!("{}/funds/{}/history", self.base_url, fund_code);
        debug!("Requesting NAV history from {}", url);

        let client = reqwest::Client::builder().user_agent("mft/1.0").build()?;
        let mut query = vec![("end", end.to_string())];
        if let Some(start) = start {
            query.push(("start", start.to_string()));
        }

        let mut attempt = 1;
        let response = loop {
            match client.get(&url).query(&query).send().await {
                Ok(response) => break response,
                Err(error) => {
                    if attempt > RETRIES {
                        return Err(anyhow::Error::from(error)).with_context(|| {
                            format!("Failed to send request for fund: {fund_code}")
                        });
                    }
                    debug!(
                        "Attempt {}/{} failed: {}. Retrying...",
                        attempt, RETRIES, error
                    );
                    attempt += 1;
                    tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS)).await;
                }
            }
        };

        let response_text = response
            .text()
            .await
            .with_context(|| format!("Failed to get response text for fund: {fund_code}"))?;

        if response_text.trim().is_empty() {
            return Err(anyhow!("Received empty response for fund: {}", fund_code));
        }

        let history: HistoryResponse =
            serde_json::from_str(&response_text).with_context(|| {
                format!(
                    "Failed to parse NAV history for fund: {fund_code}. Response: '{response_text}'",
                )
            })?;

        let resolved_name = history.fund_name.unwrap_or_else(|| fund_name.to_string());
        let fetched_at = Utc::now();

        let mut quotes = Vec::new();
        for entry in history.quotes {
            let Ok(price_date) = NaiveDate::parse_from_str(&entry.date, "%Y-%m-%d") else {
                warn!(
                    "Skipping quote with unparseable date '{}' for fund {}",
                    entry.date, fund_code
                );
                continue;
            };
            quotes.push(NavQuote {
                fund_code: fund_code.to_string(),
                fund_name: resolved_name.clone(),
                price_date,
                unit_nav: entry.unit_nav,
                cumulative_nav: entry.cumulative_nav,
                daily_growth_rate: entry.daily_growth_rate,
                source: SOURCE.to_string(),
                fetched_at,
            });
        }

        debug!(
            "Fetched {} quotes for fund {} ({})",
            quotes.len(),
            fund_code,
            resolved_name
        );
        Ok(quotes)
    }
}
