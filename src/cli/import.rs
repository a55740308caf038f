use super::ui;
use crate::autoinvest::AutoInvestImporter;
use anyhow::Result;
use chrono::NaiveDate;

pub async fn run(
    importer: &AutoInvestImporter,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<()> {
    let pb = ui::new_spinner("Importing auto-invest transactions...");
    let summary = importer.import_range(start, end).await;
    pb.finish_and_clear();
    let summary = summary?;

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Scheduled"),
        ui::header_cell("Confirmed"),
        ui::header_cell("Pending"),
        ui::header_cell("Skipped"),
        ui::header_cell("Errors"),
    ]);
    table.add_row(vec![
        ui::count_cell(summary.scheduled),
        ui::count_cell(summary.confirmed),
        ui::count_cell(summary.pending),
        ui::count_cell(summary.skipped),
        ui::alert_count_cell(summary.errors),
    ]);

    println!(
        "{}\n\n{}",
        ui::style_text("Auto-invest import", ui::StyleType::Title),
        table
    );
    ui::print_messages(&summary.messages);

    if summary.pending > 0 {
        println!(
            "\n{}",
            ui::style_text(
                &format!(
                    "{} transactions await NAV data; run `mft sync` then `mft reconcile`",
                    summary.pending
                ),
                ui::StyleType::Subtle
            )
        );
    }

    Ok(())
}
