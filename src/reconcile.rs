//! Resolves pending transactions once their settlement NAV is available.

use crate::core::transaction::{PENDING_MARKER, Transaction};
use crate::store::{NavStore, PlanStore, TransactionStore};
use anyhow::Result;
use chrono::Duration;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Prefer the transaction's own recorded target amount; when false the
    /// amount is looked up in the enabled-plan map by fund code.
    pub use_target_amount: bool,
    /// Run the NAV-driven non-trading-day cleanup before confirming.
    pub auto_remove_non_trading: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            use_target_amount: true,
            auto_remove_non_trading: true,
        }
    }
}

/// Outcome counts for one reconcile pass. Expected conditions (NAV not
/// yet published, nothing pending) land here instead of erroring.
#[derive(Debug, Default)]
pub struct ReconcileSummary {
    pub pending_count: usize,
    pub confirmed_count: usize,
    pub skipped_count: usize,
    pub removed_count: usize,
    pub messages: Vec<String>,
}

pub struct PendingReconciler {
    transactions: Arc<dyn TransactionStore>,
    navs: Arc<dyn NavStore>,
    plans: Arc<dyn PlanStore>,
    user_id: i64,
}

impl PendingReconciler {
    pub fn new(
        transactions: Arc<dyn TransactionStore>,
        navs: Arc<dyn NavStore>,
        plans: Arc<dyn PlanStore>,
        user_id: i64,
    ) -> Self {
        Self {
            transactions,
            navs,
            plans,
            user_id,
        }
    }

    /// One reconcile pass: optional cleanup, then confirmation of every
    /// pending transaction whose settlement NAV is now stored. Safe to run
    /// repeatedly; confirmed transactions never re-enter the pending set.
    pub async fn reconcile(&self, options: &ReconcileOptions) -> Result<ReconcileSummary> {
        let mut summary = ReconcileSummary::default();

        let mut pending = self.transactions.list_pending(self.user_id).await?;
        summary.pending_count = pending.len();
        if pending.is_empty() {
            summary.messages.push("No pending transactions".to_string());
            return Ok(summary);
        }
        info!("Found {} pending transactions", pending.len());

        if options.auto_remove_non_trading {
            summary.removed_count = self.clean_non_trading_days(&pending).await?;
            pending = self.transactions.list_pending(self.user_id).await?;
            if pending.is_empty() {
                summary.messages.push(format!(
                    "Removed {} non-trading-day entries; nothing left to confirm",
                    summary.removed_count
                ));
                return Ok(summary);
            }
        }

        let plan_amounts = if options.use_target_amount {
            HashMap::new()
        } else {
            self.plan_amounts().await?
        };

        for transaction in &pending {
            debug!(
                "Transaction {}: {} trade={} nav={}",
                transaction.id,
                transaction.fund_code,
                transaction.transaction_date,
                transaction.nav_date
            );

            let amount = if options.use_target_amount {
                transaction.target_amount
            } else {
                plan_amounts.get(&transaction.fund_code).copied()
            };
            let Some(amount) = amount else {
                summary.skipped_count += 1;
                summary.messages.push(format!(
                    "Transaction {}: no amount recorded for {}, skipped",
                    transaction.id, transaction.fund_code
                ));
                continue;
            };

            let Some(quote) = self
                .navs
                .get(&transaction.fund_code, transaction.nav_date)
                .await?
            else {
                summary.skipped_count += 1;
                summary.messages.push(format!(
                    "Transaction {}: NAV for {} on {} not fetched yet",
                    transaction.id, transaction.fund_code, transaction.nav_date
                ));
                continue;
            };
            if quote.unit_nav <= Decimal::ZERO {
                summary.skipped_count += 1;
                summary.messages.push(format!(
                    "Transaction {}: NAV {} on {} is not positive",
                    transaction.id, quote.unit_nav, transaction.nav_date
                ));
                continue;
            }

            let shares = (amount / quote.unit_nav).round_dp(2);
            let confirmed_amount = (shares * quote.unit_nav).round_dp(2);
            let note = transaction.note.replace(PENDING_MARKER, "");
            let note = note.trim();

            let updated = self
                .transactions
                .update_priced(
                    self.user_id,
                    transaction.id,
                    &quote.fund_name,
                    shares,
                    quote.unit_nav,
                    confirmed_amount,
                    note,
                )
                .await?;
            if updated {
                info!(
                    "Confirmed transaction {}: {} shares @ {}",
                    transaction.id, shares, quote.unit_nav
                );
                summary.confirmed_count += 1;
            } else {
                warn!("Transaction {} disappeared before update", transaction.id);
                summary.skipped_count += 1;
            }
        }

        Ok(summary)
    }

    /// Deletes pending transactions scheduled on dates the market turned
    /// out to be closed: a date with no stored quote whose next calendar
    /// day has one is treated as a non-trading day for that fund. The
    /// check relies on published NAVs only, never the holiday table, so it
    /// also catches unscheduled closures. A feed that is merely one day
    /// late looks identical to a closure and gets its entries removed too;
    /// the importer recreates them on its next run.
    async fn clean_non_trading_days(&self, pending: &[Transaction]) -> Result<usize> {
        let nav_dates: BTreeSet<_> = pending.iter().map(|t| t.nav_date).collect();
        debug!("Checking {} distinct settlement dates", nav_dates.len());

        let mut removed = 0;
        for nav_date in nav_dates {
            let next_day = nav_date + Duration::days(1);
            let funds: BTreeSet<_> = pending
                .iter()
                .filter(|t| t.nav_date == nav_date)
                .map(|t| t.fund_code.clone())
                .collect();

            for fund_code in funds {
                let has_quote = self.navs.get(&fund_code, nav_date).await?.is_some();
                let has_next = self.navs.get(&fund_code, next_day).await?.is_some();
                if has_quote || !has_next {
                    continue;
                }

                info!("{nav_date} is a non-trading day for {fund_code}");
                for transaction in pending
                    .iter()
                    .filter(|t| t.fund_code == fund_code && t.nav_date == nav_date)
                {
                    if self
                        .transactions
                        .delete(self.user_id, transaction.id)
                        .await?
                    {
                        info!(
                            "Removed transaction {} ({} traded {})",
                            transaction.id, fund_code, transaction.transaction_date
                        );
                        removed += 1;
                    }
                }
            }
        }

        if removed > 0 {
            info!("Removed {} non-trading-day entries", removed);
        }
        Ok(removed)
    }

    /// Fund code to contribution amount, from currently enabled plans.
    async fn plan_amounts(&self) -> Result<HashMap<String, Decimal>> {
        let plans = self.plans.list_enabled(self.user_id).await?;
        Ok(plans
            .into_iter()
            .map(|p| (p.fund_code, p.amount))
            .collect())
    }
}
