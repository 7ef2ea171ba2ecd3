//! Order receipt rendering for the demo shell.

use decal::{
    cart::Cart,
    pricing::{self, PricingError},
};
use tabled::{builder::Builder, settings::Style};

/// Render an order summary table for a cart, with the included-VAT line
/// and the digital-delivery note the storefront shows at checkout.
///
/// # Errors
///
/// Returns an error when the VAT breakdown cannot be computed.
pub fn render(cart: &Cart, order_id: Option<&str>) -> Result<String, PricingError> {
    let mut builder = Builder::default();

    builder.push_record(["Item", "Qty", "Unit", "Total"]);

    for item in cart.items() {
        builder.push_record([
            truncate(&item.sticker.prompt, 32),
            item.quantity.to_string(),
            pricing::format_eur(item.sticker.unit_price.minor_units()),
            pricing::format_eur(item.line_total()),
        ]);
    }

    let total = cart.total();
    let vat = pricing::vat_included_portion(total, pricing::vat_rate())?;

    builder.push_record([
        "Subtotal".to_owned(),
        String::new(),
        String::new(),
        pricing::format_eur(total),
    ]);
    builder.push_record([
        "VAT (24%)".to_owned(),
        String::new(),
        String::new(),
        format!("included ({})", pricing::format_eur(vat)),
    ]);
    builder.push_record([
        "Shipping (digital)".to_owned(),
        String::new(),
        String::new(),
        "FREE".to_owned(),
    ]);
    builder.push_record([
        "Total".to_owned(),
        String::new(),
        String::new(),
        pricing::format_eur(total),
    ]);

    if let Some(order_id) = order_id {
        builder.push_record([
            "Order".to_owned(),
            String::new(),
            String::new(),
            format!("#{order_id}"),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::rounded());

    Ok(table.to_string())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }

    let head: String = text.chars().take(max_chars.saturating_sub(1)).collect();

    format!("{head}…")
}
