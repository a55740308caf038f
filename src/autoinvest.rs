//! Creates transactions from auto-invest plan schedules.

use crate::core::calendar::TradingCalendar;
use crate::core::schedule::{ScheduledBuy, merge_schedules};
use crate::core::transaction::{NewTransaction, TransactionType, plan_note_tag};
use crate::store::{NavStore, PlanStore, TransactionStore};
use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome counts for one import run.
#[derive(Debug, Default)]
pub struct ImportSummary {
    /// Entries the plan schedules produced for the range.
    pub scheduled: usize,
    /// Inserted with a known settlement NAV.
    pub confirmed: usize,
    /// Inserted unpriced, waiting for the NAV fetch.
    pub pending: usize,
    /// Already recorded from an earlier run.
    pub skipped: usize,
    pub errors: usize,
    pub messages: Vec<String>,
}

pub struct AutoInvestImporter {
    transactions: Arc<dyn TransactionStore>,
    navs: Arc<dyn NavStore>,
    plans: Arc<dyn PlanStore>,
    calendar: Arc<TradingCalendar>,
    user_id: i64,
}

impl AutoInvestImporter {
    pub fn new(
        transactions: Arc<dyn TransactionStore>,
        navs: Arc<dyn NavStore>,
        plans: Arc<dyn PlanStore>,
        calendar: Arc<TradingCalendar>,
        user_id: i64,
    ) -> Self {
        Self {
            transactions,
            navs,
            plans,
            calendar,
            user_id,
        }
    }

    /// Imports every scheduled contribution in `[start, end]`. `start`
    /// defaults to the earliest enabled-plan start date, `end` to today.
    /// Re-running over the same range inserts nothing new: entries are
    /// keyed by (fund, transaction date, plan tag).
    pub async fn import_range(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();

        let plans = self.plans.list_enabled(self.user_id).await?;
        if plans.is_empty() {
            summary.messages.push("No enabled plans".to_string());
            return Ok(summary);
        }

        let start = match start {
            Some(date) => date,
            None => plans
                .iter()
                .map(|p| p.start_date)
                .min()
                .context("No plan start date available")?,
        };
        let end = end.unwrap_or_else(|| Utc::now().date_naive());
        if start > end {
            summary
                .messages
                .push(format!("Nothing to import: {start} is after {end}"));
            return Ok(summary);
        }
        info!("Importing auto-invest transactions {} to {}", start, end);

        let entries = merge_schedules(&plans, &self.calendar, start, end)?;
        summary.scheduled = entries.len();

        let mut by_date: BTreeMap<NaiveDate, Vec<ScheduledBuy>> = BTreeMap::new();
        for entry in entries {
            by_date.entry(entry.transaction_date).or_default().push(entry);
        }

        for (date, entries) in by_date {
            debug!("Processing {} entries for {}", entries.len(), date);
            for entry in entries {
                match self.import_entry(&entry).await {
                    Ok(outcome) => match outcome {
                        EntryOutcome::Confirmed => summary.confirmed += 1,
                        EntryOutcome::Pending => summary.pending += 1,
                        EntryOutcome::AlreadyRecorded => summary.skipped += 1,
                    },
                    Err(error) => {
                        warn!(
                            "Failed to import {} on {}: {:#}",
                            entry.fund_code, entry.transaction_date, error
                        );
                        summary.errors += 1;
                        summary.messages.push(format!(
                            "{} on {}: {:#}",
                            entry.fund_code, entry.transaction_date, error
                        ));
                    }
                }
            }
        }

        Ok(summary)
    }

    async fn import_entry(&self, entry: &ScheduledBuy) -> Result<EntryOutcome> {
        let tag = plan_note_tag(&entry.plan_name);
        if self
            .transactions
            .exists_tagged(self.user_id, &entry.fund_code, entry.transaction_date, &tag)
            .await?
        {
            debug!(
                "{} already recorded for {} on {}",
                tag, entry.fund_code, entry.transaction_date
            );
            return Ok(EntryOutcome::AlreadyRecorded);
        }

        // Settlement date: same day when the order lands on a trading day,
        // the next trading day otherwise. Schedule entries always anchor
        // on trading days, so this is normally the transaction date itself.
        let nav_date = if self.calendar.is_trading_day(entry.transaction_date) {
            entry.transaction_date
        } else {
            self.calendar.next_trading_day(entry.transaction_date, 1)?
        };

        let quote = self.navs.get(&entry.fund_code, nav_date).await?;
        match quote {
            Some(quote) => {
                if quote.unit_nav <= Decimal::ZERO {
                    bail!(
                        "stored NAV {} for {} on {} is not positive",
                        quote.unit_nav,
                        entry.fund_code,
                        nav_date
                    );
                }
                let shares = entry.amount / quote.unit_nav;
                let transaction = NewTransaction::priced(
                    self.user_id,
                    &entry.fund_code,
                    &quote.fund_name,
                    entry.transaction_date,
                    nav_date,
                    TransactionType::Buy,
                    shares,
                    quote.unit_nav,
                    Some(entry.amount),
                    &tag,
                )?;
                let id = self.transactions.insert(transaction).await?;
                info!(
                    "Imported transaction {}: {} {} @ {}",
                    id, entry.fund_code, entry.transaction_date, quote.unit_nav
                );
                Ok(EntryOutcome::Confirmed)
            }
            None => {
                let transaction = NewTransaction::pending(
                    self.user_id,
                    &entry.fund_code,
                    &entry.fund_name,
                    entry.transaction_date,
                    nav_date,
                    TransactionType::Buy,
                    entry.amount,
                    &tag,
                )?;
                let id = self.transactions.insert(transaction).await?;
                info!(
                    "Imported pending transaction {}: {} {} awaiting NAV for {}",
                    id, entry.fund_code, entry.transaction_date, nav_date
                );
                Ok(EntryOutcome::Pending)
            }
        }
    }
}

enum EntryOutcome {
    Confirmed,
    Pending,
    AlreadyRecorded,
}
