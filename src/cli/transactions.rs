use super::ui;
use crate::core::transaction::{Pricing, Transaction};
use crate::store::TransactionStore;
use anyhow::Result;
use comfy_table::{Cell, CellAlignment, Color};
use rust_decimal::Decimal;

pub async fn run(
    store: &dyn TransactionStore,
    user_id: i64,
    pending_only: bool,
) -> Result<()> {
    let transactions = if pending_only {
        store.list_pending(user_id).await?
    } else {
        store.list(user_id).await?
    };

    if transactions.is_empty() {
        println!("No transactions recorded");
        return Ok(());
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Id"),
        ui::header_cell("Date"),
        ui::header_cell("Settles"),
        ui::header_cell("Fund"),
        ui::header_cell("Type"),
        ui::header_cell("Shares"),
        ui::header_cell("NAV"),
        ui::header_cell("Amount"),
        ui::header_cell("Note"),
    ]);

    let mut total = Decimal::ZERO;
    let mut pending = 0;
    for transaction in &transactions {
        table.add_row(row(transaction));
        if let Pricing::Priced { amount, .. } = transaction.pricing {
            total += amount;
        } else {
            pending += 1;
        }
    }

    println!(
        "{}\n\n{}",
        ui::style_text(
            &format!("Transactions ({})", transactions.len()),
            ui::StyleType::Title
        ),
        table
    );
    println!(
        "\nTotal confirmed amount: {}",
        ui::style_text(&format!("{total:.2}"), ui::StyleType::TotalValue)
    );
    if pending > 0 {
        println!(
            "{}",
            ui::style_text(&format!("{pending} pending"), ui::StyleType::Error)
        );
    }

    Ok(())
}

fn row(transaction: &Transaction) -> Vec<Cell> {
    let (shares, nav, amount) = match &transaction.pricing {
        Pricing::Priced {
            shares,
            unit_nav,
            amount,
        } => (
            Cell::new(format!("{shares:.2}")).set_alignment(CellAlignment::Right),
            Cell::new(format!("{unit_nav:.4}")).set_alignment(CellAlignment::Right),
            Cell::new(format!("{amount:.2}")).set_alignment(CellAlignment::Right),
        ),
        Pricing::Pending => (
            Cell::new("-").fg(Color::DarkGrey),
            Cell::new("-").fg(Color::DarkGrey),
            Cell::new(
                transaction
                    .target_amount
                    .map_or("-".to_string(), |a| format!("({a:.2})")),
            )
            .fg(Color::DarkGrey),
        ),
    };

    vec![
        Cell::new(transaction.id.to_string()),
        Cell::new(transaction.transaction_date.to_string()),
        Cell::new(transaction.nav_date.to_string()),
        Cell::new(format!(
            "{} ({})",
            transaction.fund_name, transaction.fund_code
        )),
        Cell::new(transaction.transaction_type.to_string()),
        shares,
        nav,
        amount,
        Cell::new(&transaction.note),
    ]
}
