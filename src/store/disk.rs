//! Persistent store backed by a fjall keyspace.
//!
//! Partitions: `transactions` (key `user_id/id`), `nav` (key
//! `fund_code/price_date/source`). Values are serde_json documents. ISO
//! date segments keep the key order chronological within a prefix.

use crate::core::nav::NavQuote;
use crate::core::transaction::{NewTransaction, Pricing, Transaction};
use crate::store::{NavStore, TransactionStore};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

pub struct FjallStore {
    _keyspace: Keyspace,
    transactions: PartitionHandle,
    nav: PartitionHandle,
    next_id: AtomicI64,
}

impl FjallStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;

        let keyspace = fjall::Config::new(path.join("store"))
            .open()
            .with_context(|| format!("Failed to open store at {}", path.display()))?;
        let transactions =
            keyspace.open_partition("transactions", PartitionCreateOptions::default())?;
        let nav = keyspace.open_partition("nav", PartitionCreateOptions::default())?;

        // The id sequence resumes from the highest stored id.
        let mut max_id = 0;
        for entry in transactions.iter() {
            let (_, value) = entry?;
            let transaction: Transaction = serde_json::from_slice(&value)?;
            max_id = max_id.max(transaction.id);
        }

        Ok(Self {
            _keyspace: keyspace,
            transactions,
            nav,
            next_id: AtomicI64::new(max_id + 1),
        })
    }

    fn transaction_key(user_id: i64, id: i64) -> String {
        format!("{user_id}/{id:020}")
    }

    fn nav_key(quote: &NavQuote) -> String {
        format!(
            "{}/{}/{}",
            quote.fund_code, quote.price_date, quote.source
        )
    }

    fn scan_user(&self, user_id: i64) -> Result<Vec<Transaction>> {
        let mut result = Vec::new();
        for entry in self.transactions.prefix(format!("{user_id}/")) {
            let (_, value) = entry?;
            result.push(serde_json::from_slice(&value)?);
        }
        Ok(result)
    }
}

#[async_trait]
impl TransactionStore for FjallStore {
    async fn insert(&self, transaction: NewTransaction) -> Result<i64> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = Transaction {
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
        };
        self.transactions.insert(
            Self::transaction_key(record.user_id, id),
            serde_json::to_vec(&record)?,
        )?;
        Ok(id)
    }

    async fn get(&self, user_id: i64, id: i64) -> Result<Option<Transaction>> {
        match self.transactions.get(Self::transaction_key(user_id, id))? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, user_id: i64) -> Result<Vec<Transaction>> {
        let mut result = self.scan_user(user_id)?;
        result.sort_by_key(|t| (t.transaction_date, t.id));
        Ok(result)
    }

    async fn list_pending(&self, user_id: i64) -> Result<Vec<Transaction>> {
        let mut result = self.scan_user(user_id)?;
        result.retain(|t| t.is_pending());
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
        let key = Self::transaction_key(user_id, id);
        let Some(value) = self.transactions.get(&key)? else {
            return Ok(false);
        };
        let mut transaction: Transaction = serde_json::from_slice(&value)?;
        transaction.fund_name = fund_name.to_string();
        transaction.pricing = Pricing::Priced {
            shares,
            unit_nav,
            amount,
        };
        transaction.note = note.to_string();
        self.transactions
            .insert(&key, serde_json::to_vec(&transaction)?)?;
        Ok(true)
    }

    async fn delete(&self, user_id: i64, id: i64) -> Result<bool> {
        let key = Self::transaction_key(user_id, id);
        if self.transactions.get(&key)?.is_none() {
            return Ok(false);
        }
        self.transactions.remove(&key)?;
        Ok(true)
    }

    async fn exists_tagged(
        &self,
        user_id: i64,
        fund_code: &str,
        transaction_date: NaiveDate,
        note_tag: &str,
    ) -> Result<bool> {
        for transaction in self.scan_user(user_id)? {
            if transaction.fund_code == fund_code
                && transaction.transaction_date == transaction_date
                && transaction.note.contains(note_tag)
            {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[async_trait]
impl NavStore for FjallStore {
    async fn upsert(&self, quote: NavQuote) -> Result<()> {
        self.nav
            .insert(Self::nav_key(&quote), serde_json::to_vec(&quote)?)?;
        Ok(())
    }

    async fn get(&self, fund_code: &str, date: NaiveDate) -> Result<Option<NavQuote>> {
        let mut latest: Option<NavQuote> = None;
        for entry in self.nav.prefix(format!("{fund_code}/{date}/")) {
            let (_, value) = entry?;
            let quote: NavQuote = serde_json::from_slice(&value)?;
            if latest
                .as_ref()
                .is_none_or(|current| quote.fetched_at > current.fetched_at)
            {
                latest = Some(quote);
            }
        }
        Ok(latest)
    }

    async fn latest_date(&self, fund_code: &str) -> Result<Option<NaiveDate>> {
        let mut latest = None;
        for entry in self.nav.prefix(format!("{fund_code}/")) {
            let (_, value) = entry?;
            let quote: NavQuote = serde_json::from_slice(&value)?;
            latest = latest.max(Some(quote.price_date));
        }
        Ok(latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::TransactionType;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn pending(user_id: i64, fund_code: &str, day: &str) -> NewTransaction {
        NewTransaction::pending(
            user_id,
            fund_code,
            "CSI 300 ETF",
            date(day),
            date(day),
            TransactionType::Buy,
            dec!(500),
            "auto-invest-test",
        )
        .unwrap()
    }

    fn quote(fund_code: &str, day: &str, nav: Decimal, source: &str) -> NavQuote {
        NavQuote {
            fund_code: fund_code.to_string(),
            fund_name: "CSI 300 ETF".to_string(),
            price_date: date(day),
            unit_nav: nav,
            cumulative_nav: None,
            daily_growth_rate: None,
            source: source.to_string(),
            fetched_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_transactions_roundtrip() {
        let dir = tempdir().unwrap();
        let store = FjallStore::open(dir.path()).unwrap();

        let id = store.insert(pending(1, "510300", "2024-03-12")).await.unwrap();
        store.insert(pending(2, "518880", "2024-03-12")).await.unwrap();

        let loaded = TransactionStore::get(&store, 1, id).await.unwrap().unwrap();
        assert_eq!(loaded.fund_code, "510300");
        assert!(loaded.is_pending());

        // User scoping holds on scans
        assert_eq!(store.list(1).await.unwrap().len(), 1);
        assert_eq!(store.list_pending(2).await.unwrap().len(), 1);

        assert!(
            store
                .update_priced(1, id, "CSI 300 ETF", dec!(140.06), dec!(3.57), dec!(500.01), "done")
                .await
                .unwrap()
        );
        assert!(store.list_pending(1).await.unwrap().is_empty());

        assert!(store.delete(1, id).await.unwrap());
        assert!(!store.delete(1, id).await.unwrap());
    }

    #[tokio::test]
    async fn test_id_sequence_survives_reopen() {
        let dir = tempdir().unwrap();
        let first_id;
        {
            let store = FjallStore::open(dir.path()).unwrap();
            first_id = store.insert(pending(1, "510300", "2024-03-12")).await.unwrap();
        }
        let store = FjallStore::open(dir.path()).unwrap();
        let second_id = store.insert(pending(1, "510300", "2024-03-13")).await.unwrap();
        assert!(second_id > first_id);
        assert_eq!(store.list(1).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_nav_upsert_and_lookups() {
        let dir = tempdir().unwrap();
        let store = FjallStore::open(dir.path()).unwrap();

        store
            .upsert(quote("510300", "2024-03-12", dec!(3.5), "eastmoney"))
            .await
            .unwrap();
        store
            .upsert(quote("510300", "2024-03-12", dec!(3.55), "eastmoney"))
            .await
            .unwrap();
        store
            .upsert(quote("510300", "2024-03-13", dec!(3.6), "eastmoney"))
            .await
            .unwrap();

        let stored = NavStore::get(&store, "510300", date("2024-03-12"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.unit_nav, dec!(3.55));

        assert_eq!(
            store.latest_date("510300").await.unwrap(),
            Some(date("2024-03-13"))
        );
        assert!(
            NavStore::get(&store, "518880", date("2024-03-12"))
                .await
                .unwrap()
                .is_none()
        );
    }
}
