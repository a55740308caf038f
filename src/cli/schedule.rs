use super::ui;
use crate::core::calendar::TradingCalendar;
use crate::core::plan::Plan;
use crate::core::schedule::merge_schedules;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::Cell;

pub fn run(
    plans: &[Plan],
    calendar: &TradingCalendar,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<()> {
    if plans.is_empty() {
        println!("No enabled plans");
        return Ok(());
    }

    let start = match start {
        Some(date) => date,
        None => plans
            .iter()
            .map(|p| p.start_date)
            .min()
            .context("No plan start date available")?,
    };
    let end = end.unwrap_or_else(|| chrono::Utc::now().date_naive());

    let entries = merge_schedules(plans, calendar, start, end)?;

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Confirms"),
        ui::header_cell("Fund"),
        ui::header_cell("Plan"),
        ui::header_cell("Amount"),
    ]);
    for entry in &entries {
        table.add_row(vec![
            Cell::new(entry.transaction_date.to_string()),
            Cell::new(entry.confirm_date.to_string()),
            Cell::new(format!("{} ({})", entry.fund_name, entry.fund_code)),
            Cell::new(&entry.plan_name),
            Cell::new(format!("{:.2}", entry.amount)),
        ]);
    }

    println!(
        "{}\n\n{}",
        ui::style_text(
            &format!("Schedule {start} to {end}: {} entries", entries.len()),
            ui::StyleType::Title
        ),
        table
    );

    Ok(())
}
