use super::ui;
use crate::core::leads::{Lead, ScoreBand, ScoredLead, rank_leads, summarize_leads};
use crate::service::CurrencyService;
use anyhow::Result;
use chrono::Utc;
use comfy_table::{Attribute, Cell, Color};

fn band_color(band: ScoreBand) -> Color {
    match band {
        ScoreBand::Excellent => Color::Green,
        ScoreBand::Good => Color::Blue,
        ScoreBand::Fair => Color::Yellow,
        ScoreBand::Low => Color::DarkGrey,
    }
}

fn score_cell(scored: &ScoredLead<'_>) -> Cell {
    let cell = ui::number_cell(scored.score.to_string()).fg(band_color(scored.band));
    if scored.hot {
        cell.add_attribute(Attribute::Bold)
    } else {
        cell
    }
}

pub fn display_leads(ranked: &[ScoredLead<'_>], service: &CurrencyService) -> String {
    let summary = summarize_leads(ranked);

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Lead"),
        ui::header_cell("Source"),
        ui::header_cell("Status"),
        ui::header_cell("Score"),
        ui::header_cell("Band"),
        ui::header_cell("Hot"),
        ui::header_cell(&format!("Budget ({})", service.currency())),
    ]);

    for (position, scored) in ranked.iter().enumerate() {
        let lead = scored.lead;
        let hot = if scored.hot {
            Cell::new("HOT")
                .fg(Color::Red)
                .add_attribute(Attribute::Bold)
        } else {
            Cell::new("")
        };
        let budget = ui::format_optional_cell(lead.budget_idr, |b| service.format_price_short(b));
        table.add_row(vec![
            ui::number_cell((position + 1).to_string()),
            Cell::new(&lead.name),
            Cell::new(lead.source.to_string()),
            Cell::new(lead.status.to_string()),
            score_cell(scored),
            Cell::new(scored.band.to_string()).fg(band_color(scored.band)),
            hot,
            budget,
        ]);
    }

    format!(
        "{}\n\n{table}\n\n{} {} total, {} hot, average score {:.1}\n\
         {} {} excellent, {} good, {} fair, {} low",
        ui::style_text("Leads by priority", ui::StyleType::Title),
        ui::style_text("Leads:", ui::StyleType::Label),
        summary.total,
        summary.hot,
        summary.average_score,
        ui::style_text("Bands:", ui::StyleType::Label),
        summary.excellent,
        summary.good,
        summary.fair,
        summary.low,
    )
}

pub fn run(leads: &[Lead], service: &CurrencyService) -> Result<()> {
    let ranked = rank_leads(leads, Utc::now());
    println!("{}", display_leads(&ranked, service));
    Ok(())
}
