//! Auto-invest plan definitions.

use anyhow::{Result, bail};
use chrono::{Duration, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Stand-in end date for open-ended plans.
const OPEN_END_DATE: NaiveDate = NaiveDate::from_ymd_opt(2099, 12, 31).unwrap();

/// Contribution cadence of an auto-invest plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
}

impl Frequency {
    /// Moves `date` forward by one full period. Month arithmetic keeps the
    /// day-of-month where possible, clamping to the end of shorter months.
    pub fn advance(&self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Frequency::Daily => date.checked_add_signed(Duration::days(1)),
            Frequency::Weekly => date.checked_add_signed(Duration::weeks(1)),
            Frequency::Monthly => date.checked_add_months(Months::new(1)),
            Frequency::Quarterly => date.checked_add_months(Months::new(3)),
        }
    }
}

impl Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Frequency::Daily => "daily",
                Frequency::Weekly => "weekly",
                Frequency::Monthly => "monthly",
                Frequency::Quarterly => "quarterly",
            }
        )
    }
}

impl FromStr for Frequency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "quarterly" => Ok(Frequency::Quarterly),
            _ => Err(anyhow::anyhow!("Invalid plan frequency: {}", s)),
        }
    }
}

/// A recurring purchase directive. Plans are created and edited by the
/// user (config file or an outer API); the core only reads enabled ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub id: i64,
    pub plan_name: String,
    pub fund_code: String,
    pub fund_name: String,
    pub amount: Decimal,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    /// Missing end date means the plan runs until cancelled.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Plan {
    pub fn effective_end(&self) -> NaiveDate {
        self.end_date.unwrap_or(OPEN_END_DATE)
    }

    /// Boundary validation, run when plans are loaded from config.
    pub fn validate(&self) -> Result<()> {
        if self.plan_name.trim().is_empty() {
            bail!("Plan name cannot be empty");
        }
        if self.fund_code.trim().is_empty() {
            bail!("Plan '{}': fund code cannot be empty", self.plan_name);
        }
        if self.amount <= Decimal::ZERO {
            bail!(
                "Plan '{}': amount must be positive, got {}",
                self.plan_name,
                self.amount
            );
        }
        if self.start_date > self.effective_end() {
            bail!(
                "Plan '{}': start date {} is after end date {}",
                self.plan_name,
                self.start_date,
                self.effective_end()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn plan() -> Plan {
        Plan {
            id: 1,
            plan_name: "CSI 300 weekly".to_string(),
            fund_code: "510300".to_string(),
            fund_name: "CSI 300 ETF".to_string(),
            amount: dec!(500),
            frequency: Frequency::Weekly,
            start_date: date("2024-01-02"),
            end_date: Some(date("2024-12-31")),
            enabled: true,
        }
    }

    #[test]
    fn test_frequency_advance() {
        assert_eq!(
            Frequency::Daily.advance(date("2024-01-31")),
            Some(date("2024-02-01"))
        );
        assert_eq!(
            Frequency::Weekly.advance(date("2024-01-02")),
            Some(date("2024-01-09"))
        );
        // Day-of-month clamps to the end of February
        assert_eq!(
            Frequency::Monthly.advance(date("2024-01-31")),
            Some(date("2024-02-29"))
        );
        assert_eq!(
            Frequency::Quarterly.advance(date("2024-02-10")),
            Some(date("2024-05-10"))
        );
    }

    #[test]
    fn test_frequency_parse_roundtrip() {
        for s in ["daily", "weekly", "monthly", "quarterly"] {
            let frequency: Frequency = s.parse().unwrap();
            assert_eq!(frequency.to_string(), s);
        }
        assert!("fortnightly".parse::<Frequency>().is_err());
    }

    #[test]
    fn test_plan_validation() {
        assert!(plan().validate().is_ok());

        let mut bad = plan();
        bad.amount = Decimal::ZERO;
        assert!(bad.validate().is_err());

        let mut bad = plan();
        bad.start_date = date("2025-01-01");
        assert!(bad.validate().is_err());

        let mut open_ended = plan();
        open_ended.end_date = None;
        assert!(open_ended.validate().is_ok());
        assert_eq!(open_ended.effective_end(), date("2099-12-31"));
    }

    #[test]
    fn test_plan_deserialization_defaults() {
        let yaml = r#"
plan_name: "Gold monthly"
fund_code: "518880"
fund_name: "Gold ETF"
amount: 1000
frequency: monthly
start_date: 2024-03-01
"#;
        let plan: Plan = serde_yaml::from_str(yaml).unwrap();
        assert!(plan.enabled);
        assert!(plan.end_date.is_none());
        assert_eq!(plan.frequency, Frequency::Monthly);
        assert_eq!(plan.amount, dec!(1000));
    }
}
