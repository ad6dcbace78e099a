use super::ui;
use crate::core::tips::{ListingTip, Property, TipPriority, collect_tips, summarize_tips};
use anyhow::Result;
use comfy_table::{Cell, Color};

fn priority_cell(priority: TipPriority) -> Cell {
    let color = match priority {
        TipPriority::High => Color::Red,
        TipPriority::Medium => Color::Yellow,
        TipPriority::Low => Color::DarkGrey,
    };
    Cell::new(priority.to_string().to_uppercase()).fg(color)
}

pub fn display_tips(properties: &[Property], tips: &[ListingTip]) -> String {
    let summary = summarize_tips(properties, tips);

    let mut output = format!(
        "{}\n\n",
        ui::style_text("Listing tips", ui::StyleType::Title)
    );

    if tips.is_empty() {
        output.push_str(&ui::style_text(
            "Every listing is complete. Nothing to improve.",
            ui::StyleType::Value,
        ));
    } else {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Priority"),
            ui::header_cell("Listing"),
            ui::header_cell("Tip"),
            ui::header_cell("Details"),
        ]);
        for tip in tips {
            table.add_row(vec![
                priority_cell(tip.priority),
                Cell::new(&tip.property_title),
                Cell::new(&tip.title),
                Cell::new(&tip.message),
            ]);
        }
        output.push_str(&table.to_string());
    }

    output.push_str(&format!(
        "\n\n{} {} high, {} medium, {} low across {} listing(s)\n{} {}%",
        ui::style_text("Tips:", ui::StyleType::Label),
        summary.high,
        summary.medium,
        summary.low,
        properties.len(),
        ui::style_text("Completeness:", ui::StyleType::Label),
        ui::style_text(&summary.completeness.to_string(), ui::StyleType::Value),
    ));
    output
}

pub fn run(properties: &[Property]) -> Result<()> {
    let tips = collect_tips(properties);
    println!("{}", display_tips(properties, &tips));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_tips_lists_high_first() {
        let properties = vec![Property {
            id: "p1".to_string(),
            title: "Small flat".to_string(),
            price: Some(0.0),
            ..Default::default()
        }];
        let tips = collect_tips(&properties);
        let output = display_tips(&properties, &tips);

        let high = output.find("HIGH").unwrap();
        let low = output.find("LOW").unwrap();
        assert!(high < low);
        assert!(output.contains("Small flat"));
        assert!(output.contains("across 1 listing(s)"));
    }

    #[test]
    fn test_display_tips_when_nothing_to_do() {
        let output = display_tips(&[], &[]);
        assert!(output.contains("Nothing to improve"));
        assert!(output.contains("0 high, 0 medium, 0 low"));
    }
}
