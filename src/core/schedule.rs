//! Generates the expected buy schedule implied by auto-invest plans.

use crate::core::calendar::TradingCalendar;
use crate::core::plan::{Frequency, Plan};
use anyhow::Result;
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;

/// One scheduled contribution. `confirm_date` is the T+1 trading day on
/// which the fund house confirms the order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledBuy {
    pub plan_name: String,
    pub fund_code: String,
    pub fund_name: String,
    pub transaction_date: NaiveDate,
    pub confirm_date: NaiveDate,
    pub amount: Decimal,
}

/// Walks the plan's anchor dates over `[range_start, range_end]`.
///
/// Daily plans slide a non-trading anchor forward one calendar day at a
/// time without emitting, so a single holiday costs no contribution.
/// Weekly/monthly/quarterly plans skip the whole period instead, keeping
/// the anchor weekday/day-of-month from drifting.
pub fn generate_schedule(
    plan: &Plan,
    calendar: &TradingCalendar,
    range_start: NaiveDate,
    range_end: NaiveDate,
) -> Result<Vec<ScheduledBuy>> {
    let mut entries = Vec::new();
    let mut anchor = plan.start_date.max(range_start);
    let end = plan.effective_end().min(range_end);

    while anchor <= end {
        if !calendar.is_trading_day(anchor) {
            let next = if plan.frequency == Frequency::Daily {
                anchor.checked_add_signed(Duration::days(1))
            } else {
                plan.frequency.advance(anchor)
            };
            match next {
                Some(date) => anchor = date,
                None => break,
            }
            continue;
        }

        entries.push(ScheduledBuy {
            plan_name: plan.plan_name.clone(),
            fund_code: plan.fund_code.clone(),
            fund_name: plan.fund_name.clone(),
            transaction_date: anchor,
            confirm_date: calendar.next_trading_day(anchor, 1)?,
            amount: plan.amount,
        });

        match plan.frequency.advance(anchor) {
            Some(date) => anchor = date,
            None => break,
        }
    }

    Ok(entries)
}

/// Schedules for several plans merged into one sequence, ascending by
/// transaction date. The sort is stable so same-date entries keep the
/// plan order.
pub fn merge_schedules(
    plans: &[Plan],
    calendar: &TradingCalendar,
    range_start: NaiveDate,
    range_end: NaiveDate,
) -> Result<Vec<ScheduledBuy>> {
    let mut merged = Vec::new();
    for plan in plans {
        merged.extend(generate_schedule(plan, calendar, range_start, range_end)?);
    }
    merged.sort_by_key(|entry| entry.transaction_date);
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn plan(name: &str, frequency: Frequency, start: &str, end: &str) -> Plan {
        Plan {
            id: 0,
            plan_name: name.to_string(),
            fund_code: "510300".to_string(),
            fund_name: "CSI 300 ETF".to_string(),
            amount: dec!(500),
            frequency,
            start_date: date(start),
            end_date: Some(date(end)),
            enabled: true,
        }
    }

    #[test]
    fn test_daily_plan_slides_over_holiday_without_duplicating() {
        // 2024-01-01 is a Monday and a market holiday
        let calendar = TradingCalendar::cn_market();
        let plan = plan("daily", Frequency::Daily, "2024-01-01", "2024-01-05");
        let entries =
            generate_schedule(&plan, &calendar, date("2024-01-01"), date("2024-01-05")).unwrap();

        let dates: Vec<_> = entries.iter().map(|e| e.transaction_date).collect();
        assert_eq!(
            dates,
            vec![
                date("2024-01-02"),
                date("2024-01-03"),
                date("2024-01-04"),
                date("2024-01-05"),
            ]
        );
        // Friday's order confirms on the following Monday
        assert_eq!(entries[3].confirm_date, date("2024-01-08"));
    }

    #[test]
    fn test_monthly_plan_skips_whole_period_on_non_trading_anchor() {
        // 2024-02-10 is a Saturday (and a Spring Festival holiday);
        // 2024-03-10 is a Sunday and 2024-06-10 the Dragon Boat holiday,
        // so only April and May emit within the range.
        let calendar = TradingCalendar::cn_market();
        let plan = plan("monthly", Frequency::Monthly, "2024-02-10", "2024-12-31");
        let entries =
            generate_schedule(&plan, &calendar, date("2024-02-01"), date("2024-06-30")).unwrap();

        let dates: Vec<_> = entries.iter().map(|e| e.transaction_date).collect();
        assert_eq!(dates, vec![date("2024-04-10"), date("2024-05-10")]);
    }

    #[test]
    fn test_schedule_clipped_to_plan_and_range() {
        let calendar = TradingCalendar::cn_market();
        let plan = plan("weekly", Frequency::Weekly, "2024-03-05", "2024-03-19");
        // Range wider than the plan on both sides
        let entries =
            generate_schedule(&plan, &calendar, date("2024-02-01"), date("2024-04-30")).unwrap();

        let dates: Vec<_> = entries.iter().map(|e| e.transaction_date).collect();
        assert_eq!(
            dates,
            vec![date("2024-03-05"), date("2024-03-12"), date("2024-03-19")]
        );

        // Range narrower than the plan
        let entries =
            generate_schedule(&plan, &calendar, date("2024-03-11"), date("2024-03-13")).unwrap();
        let dates: Vec<_> = entries.iter().map(|e| e.transaction_date).collect();
        assert_eq!(dates, vec![date("2024-03-12")]);
    }

    #[test]
    fn test_merge_sorts_across_plans_by_date() {
        let calendar = TradingCalendar::cn_market();
        let first = plan("weekly", Frequency::Weekly, "2024-03-05", "2024-03-31");
        let mut second = plan("daily", Frequency::Daily, "2024-03-06", "2024-03-08");
        second.fund_code = "518880".to_string();

        let merged =
            merge_schedules(&[first, second], &calendar, date("2024-03-01"), date("2024-03-31"))
                .unwrap();
        let dates: Vec<_> = merged.iter().map(|e| e.transaction_date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
        assert_eq!(merged.first().unwrap().transaction_date, date("2024-03-05"));
    }

    #[test]
    fn test_empty_when_plan_outside_range() {
        let calendar = TradingCalendar::cn_market();
        let plan = plan("monthly", Frequency::Monthly, "2024-06-03", "2024-12-31");
        let entries =
            generate_schedule(&plan, &calendar, date("2024-01-01"), date("2024-05-31")).unwrap();
        assert!(entries.is_empty());
    }
}
