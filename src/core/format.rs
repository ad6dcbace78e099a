//! Locale-aware price rendering for converted amounts.
//!
//! Full formats follow each currency's home locale: `Rp 1.500.000` for IDR
//! and `$97,500.00` for the dollar currencies. Short formats abbreviate large
//! values with fixed thresholds: miliar/juta (`M`/`Jt`) for IDR and
//! millions/thousands (`M`/`K`) for foreign currencies.

use crate::core::currency::CurrencyCode;
use rust_decimal::prelude::*;

const IDR_SHORT_TIERS: [(f64, &str); 2] = [(1e9, " M"), (1e6, " Jt")];
const FOREIGN_SHORT_TIERS: [(f64, &str); 2] = [(1e6, "M"), (1e3, "K")];

fn short_tiers(code: CurrencyCode) -> &'static [(f64, &'static str)] {
    match code {
        CurrencyCode::Idr => &IDR_SHORT_TIERS,
        _ => &FOREIGN_SHORT_TIERS,
    }
}

fn prefix(code: CurrencyCode) -> String {
    match code {
        CurrencyCode::Idr => format!("{} ", code.symbol()),
        _ => code.symbol().to_string(),
    }
}

fn round_half_away(value: f64, dp: u32) -> Option<Decimal> {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
}

/// Sign and unsigned digits of `value` at `dp` places. Values outside the
/// range of `Decimal` go through plain `f64` formatting instead.
fn fixed_digits(value: f64, dp: u32) -> (bool, String) {
    match round_half_away(value, dp) {
        Some(mut rounded) => {
            let negative = rounded.is_sign_negative() && !rounded.is_zero();
            rounded.set_sign_positive(true);
            rounded.rescale(dp);
            (negative, rounded.to_string())
        }
        None => (value < 0.0, format!("{:.*}", dp as usize, value.abs())),
    }
}

/// One decimal at most, with a trailing `.0` dropped.
fn one_decimal(value: f64) -> String {
    match round_half_away(value, 1) {
        Some(rounded) => rounded.normalize().to_string(),
        None => {
            let text = format!("{value:.1}");
            match text.strip_suffix(".0") {
                Some(whole) => whole.to_string(),
                None => text,
            }
        }
    }
}

fn group_thousands(digits: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}

/// Formats `value` (already in `code`) with the currency's full precision.
pub fn format_amount(value: f64, code: CurrencyCode) -> String {
    let (thousands, decimal) = code.separators();
    let (negative, text) = fixed_digits(value, code.decimals());

    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (text.as_str(), None),
    };

    let mut body = group_thousands(int_part, thousands);
    if let Some(frac) = frac_part {
        body.push(decimal);
        body.push_str(frac);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}{}{body}", prefix(code))
}

/// Formats `value` (already in `code`) in abbreviated form when it crosses one
/// of the fixed thresholds, otherwise falls back to [`format_amount`].
pub fn format_amount_short(value: f64, code: CurrencyCode) -> String {
    let (_, decimal) = code.separators();
    let tiers = short_tiers(code);
    let magnitude = value.abs();

    let Some(mut tier) = tiers.iter().position(|(t, _)| magnitude >= *t) else {
        return format_amount(value, code);
    };
    // Rounding may carry into the next tier: 999.95K is 1M
    if tier > 0 && one_decimal(magnitude / tiers[tier].0) == "1000" {
        tier -= 1;
    }

    let (threshold, suffix) = tiers[tier];
    let scaled = one_decimal(magnitude / threshold).replace('.', &decimal.to_string());
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{}{scaled}{suffix}", prefix(code))
}

/// Parses text produced by [`format_amount`] or [`format_amount_short`] back
/// into a number in `code`.
pub fn parse_amount(text: &str, code: CurrencyCode) -> Option<f64> {
    let (thousands, decimal) = code.separators();
    let mut rest = text.trim();

    let negative = rest.starts_with('-');
    if negative {
        rest = rest[1..].trim_start();
    }
    rest = rest.strip_prefix(code.symbol())?.trim();

    let mut multiplier = 1.0;
    for (threshold, suffix) in short_tiers(code) {
        if let Some(stripped) = rest.strip_suffix(suffix.trim()) {
            multiplier = *threshold;
            rest = stripped.trim_end();
            break;
        }
    }

    let normalized: String = rest
        .chars()
        .filter(|c| *c != thousands)
        .map(|c| if c == decimal { '.' } else { c })
        .collect();
    if normalized.is_empty() {
        return None;
    }

    let number = normalized.parse::<f64>().ok()? * multiplier;
    Some(if negative { -number } else { number })
}
