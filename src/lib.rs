pub mod autoinvest;
pub mod cli;
pub mod core;
pub mod navsync;
pub mod providers;
pub mod reconcile;
pub mod store;

use crate::autoinvest::AutoInvestImporter;
use crate::core::calendar::TradingCalendar;
use crate::core::config::AppConfig;
use crate::navsync::NavSyncService;
use crate::providers::HttpNavProvider;
use crate::reconcile::{PendingReconciler, ReconcileOptions};
use crate::store::{ConfigPlanStore, FjallStore, NavStore, PlanStore, TransactionStore};
use anyhow::{Result, bail};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Create transactions from plan schedules over a date range.
    Import {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    /// Resolve pending transactions against stored NAVs.
    Reconcile {
        from_plan_amounts: bool,
        keep_non_trading: bool,
    },
    /// Preview the schedule implied by enabled plans.
    Schedule {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    /// Fetch NAV history for all plan funds into the store.
    Sync {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    /// List recorded transactions.
    Transactions { pending_only: bool },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Fund tracker starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let calendar = Arc::new(TradingCalendar::cn_market_with_extra(&config.extra_holidays));
    let store = Arc::new(FjallStore::open(&config.default_data_path()?)?);
    let transactions: Arc<dyn TransactionStore> = store.clone();
    let navs: Arc<dyn NavStore> = store.clone();
    let plans: Arc<dyn PlanStore> = Arc::new(ConfigPlanStore::new(config.plans.clone()));
    let user_id = config.user_id;

    match command {
        AppCommand::Import { start, end } => {
            let importer =
                AutoInvestImporter::new(transactions, navs, plans, calendar, user_id);
            cli::import::run(&importer, start, end).await
        }
        AppCommand::Reconcile {
            from_plan_amounts,
            keep_non_trading,
        } => {
            let reconciler = PendingReconciler::new(transactions, navs, plans, user_id);
            let options = ReconcileOptions {
                use_target_amount: !from_plan_amounts,
                auto_remove_non_trading: !keep_non_trading,
            };
            cli::reconcile::run(&reconciler, &options).await
        }
        AppCommand::Schedule { start, end } => {
            let enabled = plans.list_enabled(user_id).await?;
            cli::schedule::run(&enabled, &calendar, start, end)
        }
        AppCommand::Sync { start, end } => {
            let Some(provider_config) = &config.providers.nav else {
                bail!("No NAV provider configured; set providers.nav.base_url in the config");
            };
            let provider = Arc::new(HttpNavProvider::new(&provider_config.base_url));
            let service = NavSyncService::new(navs, plans, provider, user_id);
            cli::sync::run(&service, start, end).await
        }
        AppCommand::Transactions { pending_only } => {
            cli::transactions::run(transactions.as_ref(), user_id, pending_only).await
        }
    }
}
