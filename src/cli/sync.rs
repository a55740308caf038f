use super::ui;
use crate::navsync::NavSyncService;
use anyhow::Result;
use chrono::NaiveDate;

pub async fn run(
    service: &NavSyncService,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<()> {
    let pb = ui::new_spinner("Fetching NAV history...");
    let summary = service.sync(start, end).await;
    pb.finish_and_clear();
    let summary = summary?;

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Funds"),
        ui::header_cell("Fetched"),
        ui::header_cell("Stored"),
        ui::header_cell("Errors"),
    ]);
    table.add_row(vec![
        ui::count_cell(summary.funds),
        ui::count_cell(summary.fetched),
        ui::count_cell(summary.upserted),
        ui::alert_count_cell(summary.errors),
    ]);

    println!(
        "{}\n\n{}",
        ui::style_text("NAV sync", ui::StyleType::Title),
        table
    );
    ui::print_messages(&summary.messages);

    Ok(())
}
