use super::ui;
use crate::core::currency::CurrencyCode;
use crate::core::format::format_amount;
use crate::core::rates::ExchangeRates;
use crate::service::CurrencyService;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use comfy_table::{Attribute, Cell};
use std::time::Duration;

const WATCH_POLL: Duration = Duration::from_secs(30);

/// Fetches live rates behind a spinner. Never fails; on error the service
/// keeps whatever rates it already had.
pub async fn refresh_with_spinner(service: &CurrencyService) {
    let pb = ui::new_spinner("Fetching exchange rates...");
    service.fetch_live_rates().await;
    pb.finish_and_clear();
}

pub fn display_rates(
    rates: &ExchangeRates,
    selected: CurrencyCode,
    fetched_at: Option<DateTime<Utc>>,
) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Per Rp 1.000.000"),
        ui::header_cell("Rate"),
        ui::header_cell("1 unit in IDR"),
    ]);

    for (code, rate) in rates.iter() {
        let mut name = Cell::new(code.code());
        if code == selected {
            name = Cell::new(format!("{} *", code.code())).add_attribute(Attribute::Bold);
        }
        table.add_row(vec![
            name,
            ui::number_cell(format_amount(1_000_000.0 * rate, code)),
            ui::number_cell(format!("{rate}")),
            ui::number_cell(format_amount(1.0 / rate, CurrencyCode::Idr)),
        ]);
    }

    let source = fetched_at.map_or_else(
        || ui::style_text("built-in defaults", ui::StyleType::Warning),
        |at| {
            ui::style_text(
                &at.format("%Y-%m-%d %H:%M UTC").to_string(),
                ui::StyleType::Subtle,
            )
        },
    );

    format!(
        "{}\n\n{table}\n\n{} {source}",
        ui::style_text("Exchange rates (IDR base)", ui::StyleType::Title),
        ui::style_text("Fetched:", ui::StyleType::Label),
    )
}

fn print_snapshot(service: &CurrencyService) -> Option<DateTime<Utc>> {
    let (rates, fetched_at) = service.snapshot();
    println!("{}", display_rates(&rates, service.currency(), fetched_at));
    fetched_at
}

pub async fn run(service: &CurrencyService) -> Result<()> {
    refresh_with_spinner(service).await;
    print_snapshot(service);
    Ok(())
}

/// Keeps refreshing every `every` and reprints the table whenever new rates
/// land, until Ctrl-C.
pub async fn watch(service: &CurrencyService, every: Duration) -> Result<()> {
    refresh_with_spinner(service).await;
    let mut shown = print_snapshot(service);

    service.spawn_refresher(every);
    let mut poll = tokio::time::interval(WATCH_POLL);
    let result = loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                break signal.context("Failed to listen for Ctrl-C");
            }
            _ = poll.tick() => {
                if service.fetched_at() != shown {
                    ui::print_separator();
                    shown = print_snapshot(service);
                }
            }
        }
    };
    service.dispose().await;
    result
}
