//! Pulls historical NAV series from a provider into the NAV store.

use crate::core::nav::NavProvider;
use crate::store::{NavStore, PlanStore};
use anyhow::Result;
use chrono::{Duration, NaiveDate, Utc};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
pub struct NavSyncSummary {
    pub funds: usize,
    pub fetched: usize,
    pub upserted: usize,
    pub errors: usize,
    pub messages: Vec<String>,
}

pub struct NavSyncService {
    navs: Arc<dyn NavStore>,
    plans: Arc<dyn PlanStore>,
    provider: Arc<dyn NavProvider>,
    user_id: i64,
}

impl NavSyncService {
    pub fn new(
        navs: Arc<dyn NavStore>,
        plans: Arc<dyn PlanStore>,
        provider: Arc<dyn NavProvider>,
        user_id: i64,
    ) -> Self {
        Self {
            navs,
            plans,
            provider,
            user_id,
        }
    }

    /// Fetches and stores NAV history for every fund referenced by an
    /// enabled plan. Without an explicit `start` each fund resumes from
    /// the day after its latest stored quote (full history when none is
    /// stored). A failing fund is reported and does not stop the sweep.
    pub async fn sync(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<NavSyncSummary> {
        let mut summary = NavSyncSummary::default();

        let plans = self.plans.list_enabled(self.user_id).await?;
        // One fetch per fund even when several plans share it
        let funds: BTreeMap<String, String> = plans
            .into_iter()
            .map(|p| (p.fund_code, p.fund_name))
            .collect();
        summary.funds = funds.len();
        if funds.is_empty() {
            summary.messages.push("No enabled plans".to_string());
            return Ok(summary);
        }

        let end = end.unwrap_or_else(|| Utc::now().date_naive());

        let fetches = funds.iter().map(|(fund_code, fund_name)| async move {
            let window_start = match start {
                Some(date) => Some(date),
                None => self
                    .navs
                    .latest_date(fund_code)
                    .await?
                    .map(|date| date + Duration::days(1)),
            };
            debug!(
                "Fetching NAV history for {} from {:?} to {}",
                fund_code, window_start, end
            );
            let quotes = self
                .provider
                .fetch_history(fund_code, fund_name, window_start, end)
                .await?;
            Ok::<_, anyhow::Error>((fund_code.clone(), quotes))
        });

        for result in join_all(fetches).await {
            match result {
                Ok((fund_code, quotes)) => {
                    summary.fetched += quotes.len();
                    for quote in quotes {
                        self.navs.upsert(quote).await?;
                        summary.upserted += 1;
                    }
                    info!("Synced NAV history for {}", fund_code);
                }
                Err(error) => {
                    warn!("NAV sync failed: {:#}", error);
                    summary.errors += 1;
                    summary.messages.push(format!("{error:#}"));
                }
            }
        }

        Ok(summary)
    }
}
