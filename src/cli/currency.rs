use super::ui;
use crate::core::currency::{CurrencyCode, CurrencySelection};
use crate::service::CurrencyService;
use anyhow::Result;
use tracing::info;

/// What the `currency` command was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencyChoice {
    Show,
    Auto,
    Manual(CurrencyCode),
}

impl CurrencyChoice {
    /// `None` shows the selection, `auto` clears it, anything else must be a
    /// supported code.
    pub fn parse(arg: Option<&str>) -> Result<Self> {
        match arg.map(str::trim) {
            None => Ok(Self::Show),
            Some(a) if a.eq_ignore_ascii_case("auto") => Ok(Self::Auto),
            Some(code) => Ok(Self::Manual(code.parse()?)),
        }
    }
}

pub fn describe(selection: CurrencySelection) -> String {
    let mode = if selection.manual {
        "manual"
    } else {
        "automatic"
    };
    format!(
        "Display currency: {} {}",
        ui::style_text(selection.code.code(), ui::StyleType::Value),
        ui::style_text(&format!("({mode})"), ui::StyleType::Subtle)
    )
}

pub async fn run(service: &CurrencyService, choice: CurrencyChoice, language: &str) -> Result<()> {
    match choice {
        CurrencyChoice::Show => {}
        CurrencyChoice::Auto => {
            let code = service.reset_to_automatic(language).await;
            info!(%code, "Cleared manual currency selection");
        }
        CurrencyChoice::Manual(code) => {
            service.set_currency(code).await;
            info!(%code, "Saved manual currency selection");
        }
    }
    println!("{}", describe(service.selection()));
    Ok(())
}
