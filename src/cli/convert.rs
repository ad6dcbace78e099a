use super::ui;
use crate::core::currency::CurrencyCode;
use crate::core::format::{format_amount, format_amount_short};
use crate::service::CurrencyService;
use anyhow::{Result, bail};

/// Renders `amount_idr` in the target currency, full or abbreviated.
pub fn convert_line(
    service: &CurrencyService,
    amount_idr: f64,
    to: Option<CurrencyCode>,
    short: bool,
) -> String {
    let code = to.unwrap_or_else(|| service.currency());
    let converted = service.convert_to(amount_idr, code);
    let (from, into) = if short {
        (
            format_amount_short(amount_idr, CurrencyCode::Idr),
            format_amount_short(converted, code),
        )
    } else {
        (
            format_amount(amount_idr, CurrencyCode::Idr),
            format_amount(converted, code),
        )
    };
    format!("{from} = {}", ui::style_text(&into, ui::StyleType::Value))
}

pub fn run(
    service: &CurrencyService,
    amount_idr: f64,
    to: Option<CurrencyCode>,
    short: bool,
) -> Result<()> {
    if !amount_idr.is_finite() {
        bail!("Amount must be a finite number, got {amount_idr}");
    }
    println!("{}", convert_line(service, amount_idr, to, short));
    Ok(())
}
