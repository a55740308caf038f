//! In-memory store used by tests and ephemeral runs.

use crate::core::nav::NavQuote;
use crate::core::plan::Plan;
use crate::core::transaction::{NewTransaction, Pricing, Transaction};
use crate::store::{NavStore, PlanStore, TransactionStore};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

pub struct MemoryStore {
    transactions: RwLock<Vec<Transaction>>,
    quotes: RwLock<HashMap<(String, NaiveDate, String), NavQuote>>,
    plans: RwLock<Vec<Plan>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            transactions: RwLock::new(Vec::new()),
            quotes: RwLock::new(HashMap::new()),
            plans: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    pub async fn set_plans(&self, plans: Vec<Plan>) {
        *self.plans.write().await = plans;
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn insert(&self, transaction: NewTransaction) -> Result<i64> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut transactions = self.transactions.write().await;
        transactions.push(Transaction {
            id,
            user_id: transaction.user_id,
            fund_code: transaction.fund_code,
            fund_name: transaction.fund_name,
            transaction_date: transaction.transaction_date,
            nav_date: transaction.nav_date,
            transaction_type: transaction.transaction_type,
            target_amount: transaction.target_amount,
            pricing: transaction.pricing,
            note: transaction.note,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn get(&self, user_id: i64, id: i64) -> Result<Option<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .iter()
            .find(|t| t.user_id == user_id && t.id == id)
            .cloned())
    }

    async fn list(&self, user_id: i64) -> Result<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        let mut result: Vec<_> = transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        result.sort_by_key(|t| (t.transaction_date, t.id));
        Ok(result)
    }

    async fn list_pending(&self, user_id: i64) -> Result<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        let mut result: Vec<_> = transactions
            .iter()
            .filter(|t| t.user_id == user_id && t.is_pending())
            .cloned()
            .collect();
        result.sort_by_key(|t| (t.transaction_date, t.id));
        Ok(result)
    }

    async fn update_priced(
        &self,
        user_id: i64,
        id: i64,
        fund_name: &str,
        shares: Decimal,
        unit_nav: Decimal,
        amount: Decimal,
        note: &str,
    ) -> Result<bool> {
        let mut transactions = self.transactions.write().await;
        let Some(transaction) = transactions
            .iter_mut()
            .find(|t| t.user_id == user_id && t.id == id)
        else {
            return Ok(false);
        };
        transaction.fund_name = fund_name.to_string();
        transaction.pricing = Pricing::Priced {
            shares,
            unit_nav,
            amount,
        };
        transaction.note = note.to_string();
        Ok(true)
    }

    async fn delete(&self, user_id: i64, id: i64) -> Result<bool> {
        let mut transactions = self.transactions.write().await;
        let before = transactions.len();
        transactions.retain(|t| !(t.user_id == user_id && t.id == id));
        Ok(transactions.len() < before)
    }

    async fn exists_tagged(
        &self,
        user_id: i64,
        fund_code: &str,
        transaction_date: NaiveDate,
        note_tag: &str,
    ) -> Result<bool> {
        let transactions = self.transactions.read().await;
        Ok(transactions.iter().any(|t| {
            t.user_id == user_id
                && t.fund_code == fund_code
                && t.transaction_date == transaction_date
                && t.note.contains(note_tag)
        }))
    }
}

#[async_trait]
impl NavStore for MemoryStore {
    async fn upsert(&self, quote: NavQuote) -> Result<()> {
        let key = (
            quote.fund_code.clone(),
            quote.price_date,
            quote.source.clone(),
        );
        self.quotes.write().await.insert(key, quote);
        Ok(())
    }

    async fn get(&self, fund_code: &str, date: NaiveDate) -> Result<Option<NavQuote>> {
        let quotes = self.quotes.read().await;
        Ok(quotes
            .values()
            .filter(|q| q.fund_code == fund_code && q.price_date == date)
            .max_by_key(|q| q.fetched_at)
            .cloned())
    }

    async fn latest_date(&self, fund_code: &str) -> Result<Option<NaiveDate>> {
        let quotes = self.quotes.read().await;
        Ok(quotes
            .values()
            .filter(|q| q.fund_code == fund_code)
            .map(|q| q.price_date)
            .max())
    }
}

#[async_trait]
impl PlanStore for MemoryStore {
    async fn list_enabled(&self, _user_id: i64) -> Result<Vec<Plan>> {
        let plans = self.plans.read().await;
        Ok(plans.iter().filter(|p| p.enabled).cloned().collect())
    }
}
