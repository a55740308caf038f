//! Transaction records and their pricing state.

use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Note marker carried by transactions whose settlement NAV is not yet
/// published.
pub const PENDING_MARKER: &str = "[pending]";

/// Note tag prefix for transactions created from auto-invest plans.
pub const AUTO_INVEST_TAG: &str = "auto-invest";

/// Builds the note tag identifying entries generated from a plan.
pub fn plan_note_tag(plan_name: &str) -> String {
    format!("{AUTO_INVEST_TAG}-{plan_name}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Buy,
    Sell,
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TransactionType::Buy => "buy",
                TransactionType::Sell => "sell",
            }
        )
    }
}

impl FromStr for TransactionType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "buy" => Ok(TransactionType::Buy),
            "sell" => Ok(TransactionType::Sell),
            _ => Err(anyhow::anyhow!("Invalid transaction type: {}", s)),
        }
    }
}

/// Pricing state of a transaction. Shares and unit NAV only ever exist as
/// a pair, and `amount` is always derived from them; once priced, a
/// transaction never returns to pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Pricing {
    Pending,
    Priced {
        shares: Decimal,
        unit_nav: Decimal,
        amount: Decimal,
    },
}

impl Pricing {
    /// Normalizes to the store precision: shares and unit NAV at 6 decimal
    /// places, amount derived at 2.
    pub fn priced(shares: Decimal, unit_nav: Decimal) -> Self {
        let shares = shares.round_dp(6);
        let unit_nav = unit_nav.round_dp(6);
        Pricing::Priced {
            shares,
            unit_nav,
            amount: (shares * unit_nav).round_dp(2),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Pricing::Pending)
    }
}

/// One economic event against a fund holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub fund_code: String,
    pub fund_name: String,
    /// Date the order is placed.
    pub transaction_date: NaiveDate,
    /// Settlement date whose NAV prices the order: same day when the
    /// transaction date is a trading day, the next trading day otherwise.
    pub nav_date: NaiveDate,
    pub transaction_type: TransactionType,
    /// Money committed at creation; the reconciler prefers this over the
    /// plan-configured amount.
    pub target_amount: Option<Decimal>,
    pub pricing: Pricing,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_pending(&self) -> bool {
        self.pricing.is_pending()
    }
}

/// Insert record for a transaction. Use the constructors so the pricing
/// pair invariant holds from the start.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: i64,
    pub fund_code: String,
    pub fund_name: String,
    pub transaction_date: NaiveDate,
    pub nav_date: NaiveDate,
    pub transaction_type: TransactionType,
    pub target_amount: Option<Decimal>,
    pub pricing: Pricing,
    pub note: String,
}

impl NewTransaction {
    /// A transaction priced immediately from a known NAV.
    #[allow(clippy::too_many_arguments)]
    pub fn priced(
        user_id: i64,
        fund_code: &str,
        fund_name: &str,
        transaction_date: NaiveDate,
        nav_date: NaiveDate,
        transaction_type: TransactionType,
        shares: Decimal,
        unit_nav: Decimal,
        target_amount: Option<Decimal>,
        note: &str,
    ) -> Result<Self> {
        if unit_nav <= Decimal::ZERO {
            bail!("Unit NAV must be positive, got {}", unit_nav);
        }
        if shares <= Decimal::ZERO {
            bail!("Shares must be positive, got {}", shares);
        }
        Ok(Self {
            user_id,
            fund_code: fund_code.to_string(),
            fund_name: fund_name.to_string(),
            transaction_date,
            nav_date,
            transaction_type,
            target_amount: target_amount.map(|a| a.round_dp(2)),
            pricing: Pricing::priced(shares, unit_nav),
            note: note.to_string(),
        })
    }

    /// An unpriced transaction waiting for its settlement NAV. The note
    /// carries the pending marker so the state is visible to the user.
    pub fn pending(
        user_id: i64,
        fund_code: &str,
        fund_name: &str,
        transaction_date: NaiveDate,
        nav_date: NaiveDate,
        transaction_type: TransactionType,
        target_amount: Decimal,
        note: &str,
    ) -> Result<Self> {
        if target_amount <= Decimal::ZERO {
            bail!("Target amount must be positive, got {}", target_amount);
        }
        let note = if note.contains(PENDING_MARKER) {
            note.to_string()
        } else {
            format!("{note}{PENDING_MARKER}")
        };
        Ok(Self {
            user_id,
            fund_code: fund_code.to_string(),
            fund_name: fund_name.to_string(),
            transaction_date,
            nav_date,
            transaction_type,
            target_amount: Some(target_amount.round_dp(2)),
            pricing: Pricing::Pending,
            note,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_priced_normalizes_precision() {
        // 1000 / 3 = 333.333333... shares
        let pricing = Pricing::priced(dec!(1000) / dec!(3), dec!(3));
        match pricing {
            Pricing::Priced {
                shares,
                unit_nav,
                amount,
            } => {
                assert_eq!(shares, dec!(333.333333));
                assert_eq!(unit_nav, dec!(3));
                assert_eq!(amount, dec!(1000.00));
            }
            Pricing::Pending => panic!("expected priced"),
        }
    }

    #[test]
    fn test_priced_rejects_non_positive_inputs() {
        let result = NewTransaction::priced(
            1,
            "510300",
            "CSI 300 ETF",
            date("2024-03-12"),
            date("2024-03-12"),
            TransactionType::Buy,
            dec!(100),
            Decimal::ZERO,
            None,
            "",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_pending_tags_note_once() {
        let tx = NewTransaction::pending(
            1,
            "510300",
            "CSI 300 ETF",
            date("2024-03-12"),
            date("2024-03-12"),
            TransactionType::Buy,
            dec!(500),
            &plan_note_tag("CSI 300 weekly"),
        )
        .unwrap();
        assert_eq!(tx.note, "auto-invest-CSI 300 weekly[pending]");
        assert!(tx.pricing.is_pending());

        let again = NewTransaction::pending(
            1,
            "510300",
            "CSI 300 ETF",
            date("2024-03-12"),
            date("2024-03-12"),
            TransactionType::Buy,
            dec!(500),
            &tx.note,
        )
        .unwrap();
        assert_eq!(again.note.matches(PENDING_MARKER).count(), 1);
    }
}
