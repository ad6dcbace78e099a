//! Supported currencies and how a visitor ends up with one of them.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    Idr,
    Usd,
    Sgd,
    Aud,
}

impl CurrencyCode {
    pub const ALL: [CurrencyCode; 4] = [
        CurrencyCode::Idr,
        CurrencyCode::Usd,
        CurrencyCode::Sgd,
        CurrencyCode::Aud,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            CurrencyCode::Idr => "IDR",
            CurrencyCode::Usd => "USD",
            CurrencyCode::Sgd => "SGD",
            CurrencyCode::Aud => "AUD",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CurrencyCode::Idr => "Rp",
            CurrencyCode::Usd => "$",
            CurrencyCode::Sgd => "S$",
            CurrencyCode::Aud => "A$",
        }
    }

    /// Number of fraction digits shown in the full price format.
    pub fn decimals(&self) -> u32 {
        match self {
            CurrencyCode::Idr => 0,
            _ => 2,
        }
    }

    /// Returns `(thousands, decimal)` separators for the currency's home locale.
    pub fn separators(&self) -> (char, char) {
        match self {
            CurrencyCode::Idr => ('.', ','),
            _ => (',', '.'),
        }
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for CurrencyCode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "IDR" => Ok(CurrencyCode::Idr),
            "USD" => Ok(CurrencyCode::Usd),
            "SGD" => Ok(CurrencyCode::Sgd),
            "AUD" => Ok(CurrencyCode::Aud),
            _ => Err(anyhow!("Unsupported currency: {}", s)),
        }
    }
}

/// Picks the currency a visitor sees by default for a UI language tag.
///
/// Region-qualified tags win over the bare language, so `en-AU` maps to AUD
/// while plain `en` maps to USD. Unknown languages fall back to IDR.
pub fn currency_for_language(lang: &str) -> CurrencyCode {
    let tag = lang.trim().to_lowercase().replace('_', "-");
    match tag.as_str() {
        "en-sg" => return CurrencyCode::Sgd,
        "en-au" => return CurrencyCode::Aud,
        "id-id" => return CurrencyCode::Idr,
        _ => {}
    }

    match tag.split('-').next().unwrap_or_default() {
        "id" => CurrencyCode::Idr,
        "en" => CurrencyCode::Usd,
        "ms" | "zh" => CurrencyCode::Sgd,
        _ => CurrencyCode::Idr,
    }
}

/// The currency currently in effect and whether the user picked it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencySelection {
    pub code: CurrencyCode,
    pub manual: bool,
}

impl CurrencySelection {
    pub fn automatic(code: CurrencyCode) -> Self {
        Self {
            code,
            manual: false,
        }
    }

    pub fn manual(code: CurrencyCode) -> Self {
        Self { code, manual: true }
    }
}

impl Default for CurrencySelection {
    fn default() -> Self {
        Self::automatic(CurrencyCode::Idr)
    }
}
