use super::ui;
use crate::reconcile::{PendingReconciler, ReconcileOptions};
use anyhow::Result;

pub async fn run(reconciler: &PendingReconciler, options: &ReconcileOptions) -> Result<()> {
    let pb = ui::new_spinner("Reconciling pending transactions...");
    let summary = reconciler.reconcile(options).await;
    pb.finish_and_clear();
    let summary = summary?;

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Pending"),
        ui::header_cell("Confirmed"),
        ui::header_cell("Skipped"),
        ui::header_cell("Removed"),
    ]);
    table.add_row(vec![
        ui::count_cell(summary.pending_count),
        ui::count_cell(summary.confirmed_count),
        ui::count_cell(summary.skipped_count),
        ui::alert_count_cell(summary.removed_count),
    ]);

    println!(
        "{}\n\n{}",
        ui::style_text("Reconcile", ui::StyleType::Title),
        table
    );
    ui::print_messages(&summary.messages);

    if summary.skipped_count > 0 {
        println!(
            "\n{}",
            ui::style_text(
                "Skipped entries retry on the next reconcile once their NAV is fetched",
                ui::StyleType::Subtle
            )
        );
    }

    Ok(())
}
