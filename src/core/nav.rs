//! NAV quote records and the provider abstraction.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One fund's published net asset value for one calendar date. Unique per
/// (fund code, price date, source); a later fetch for the same key
/// overwrites the value fields and refreshes `fetched_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavQuote {
    pub fund_code: String,
    pub fund_name: String,
    pub price_date: NaiveDate,
    pub unit_nav: Decimal,
    pub cumulative_nav: Option<Decimal>,
    pub daily_growth_rate: Option<Decimal>,
    pub source: String,
    pub fetched_at: DateTime<Utc>,
}

/// Source of historical NAV series. The concrete wire protocol is the
/// provider's business; the core only consumes the returned quotes.
#[async_trait]
pub trait NavProvider: Send + Sync {
    /// Fetches the NAV series for a fund. `start == None` requests the
    /// full history from the fund's inception.
    async fn fetch_history(
        &self,
        fund_code: &str,
        fund_name: &str,
        start: Option<NaiveDate>,
        end: NaiveDate,
    ) -> Result<Vec<NavQuote>>;
}
