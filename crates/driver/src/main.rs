use anyhow::Context;

use ordercap_core::AtomicOrderNumbers;
use ordercap_infra::{ProcessOrder, StoreConfig};
use ordercap_sales::{LineItem, Order};

fn main() -> anyhow::Result<()> {
    ordercap_observability::init();

    let config = StoreConfig::from_env();
    let selector = config
        .selector()
        .context("invalid storage configuration")?;

    let last = selector
        .last_order_number()
        .context("failed to read stored order numbers")?;
    let sequence = AtomicOrderNumbers::resume_after(last);

    let mut order = Order::new(&sequence, "Billy Smith", "6780923750")
        .context("failed to create order")?;
    let tv = LineItem::new("ELECT001", "42 Inch TV", 300.00).context("invalid catalog item")?;
    let mower = LineItem::new("GARD003", "Lawn Mower", 500.00).context("invalid catalog item")?;
    order.add_line_item(&tv, 1).context("failed to add TV")?;
    order.add_line_item(&mower, 1).context("failed to add lawn mower")?;

    let receipt = order
        .process_order(&selector)
        .with_context(|| format!("failed to process order {}", order.order_number()))?;

    println!("{order}");
    println!(
        "{}",
        serde_json::to_string_pretty(&receipt).context("failed to encode receipt")?
    );

    Ok(())
}
