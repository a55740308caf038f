//! Storage interfaces consumed by the reconciler and importer.
//!
//! All transaction and plan queries are scoped by the owning user; NAV
//! quotes are shared across users.

pub mod disk;
pub mod memory;

use crate::core::nav::NavQuote;
use crate::core::plan::Plan;
use crate::core::transaction::{NewTransaction, Transaction};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

pub use disk::FjallStore;
pub use memory::MemoryStore;

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn insert(&self, transaction: NewTransaction) -> Result<i64>;

    async fn get(&self, user_id: i64, id: i64) -> Result<Option<Transaction>>;

    async fn list(&self, user_id: i64) -> Result<Vec<Transaction>>;

    /// Unpriced transactions, ordered by transaction date then id.
    async fn list_pending(&self, user_id: i64) -> Result<Vec<Transaction>>;

    /// Promotes a pending transaction to priced. Returns `Ok(false)` when
    /// the transaction does not exist (a skip for the caller); `Err` is
    /// reserved for store failures.
    #[allow(clippy::too_many_arguments)]
    async fn update_priced(
        &self,
        user_id: i64,
        id: i64,
        fund_name: &str,
        shares: Decimal,
        unit_nav: Decimal,
        amount: Decimal,
        note: &str,
    ) -> Result<bool>;

    async fn delete(&self, user_id: i64, id: i64) -> Result<bool>;

    /// Whether a transaction already exists for (fund, date) with a note
    /// containing `note_tag`. Drives import idempotence.
    async fn exists_tagged(
        &self,
        user_id: i64,
        fund_code: &str,
        transaction_date: NaiveDate,
        note_tag: &str,
    ) -> Result<bool>;
}

#[async_trait]
pub trait NavStore: Send + Sync {
    /// Inserts or overwrites the quote for (fund, date, source).
    async fn upsert(&self, quote: NavQuote) -> Result<()>;

    /// Quote for a fund on a date; the most recently fetched one wins
    /// when several sources cover the same date.
    async fn get(&self, fund_code: &str, date: NaiveDate) -> Result<Option<NavQuote>>;

    /// Latest date with a stored quote for the fund.
    async fn latest_date(&self, fund_code: &str) -> Result<Option<NaiveDate>>;
}

#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn list_enabled(&self, user_id: i64) -> Result<Vec<Plan>>;
}

/// Plans sourced from the user's config file. The core treats plans as
/// read-only; editing happens in the config.
pub struct ConfigPlanStore {
    plans: Vec<Plan>,
}

impl ConfigPlanStore {
    pub fn new(plans: Vec<Plan>) -> Self {
        Self { plans }
    }
}

#[async_trait]
impl PlanStore for ConfigPlanStore {
    async fn list_enabled(&self, _user_id: i64) -> Result<Vec<Plan>> {
        Ok(self.plans.iter().filter(|p| p.enabled).cloned().collect())
    }
}
