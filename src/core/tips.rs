//! Rule-based suggestions for improving a property listing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

const DESCRIPTION_SHORT: usize = 50;
const DESCRIPTION_FULL: usize = 200;
const PHOTOS_RECOMMENDED: usize = 5;
const TITLE_MIN: usize = 15;
const FEATURES_MIN: usize = 3;

/// Number of independent checks run against each listing.
const CHECK_COUNT: usize = 6;

/// The stored fields of a listing that the tip rules look at.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Property {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Asking price in IDR.
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub images: Vec<String>,
    /// Amenity flags such as `pool` or `garage`. Only `true` entries count.
    #[serde(default)]
    pub features: BTreeMap<String, bool>,
    #[serde(default)]
    pub virtual_tour_url: Option<String>,
    #[serde(default)]
    pub model_3d_url: Option<String>,
}

impl Property {
    fn feature_count(&self) -> usize {
        self.features.values().filter(|enabled| **enabled).count()
    }

    fn has_tour(&self) -> bool {
        let set = |url: &Option<String>| url.as_deref().is_some_and(|u| !u.trim().is_empty());
        set(&self.virtual_tour_url) || set(&self.model_3d_url)
    }
}

/// Ordered so that sorting puts the most urgent tips first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipPriority {
    High,
    Medium,
    Low,
}

impl Display for TipPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TipPriority::High => "high",
                TipPriority::Medium => "medium",
                TipPriority::Low => "low",
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipKind {
    Description,
    Photos,
    Price,
    Title,
    Features,
    VirtualTour,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingTip {
    pub property_id: String,
    pub property_title: String,
    pub kind: TipKind,
    pub priority: TipPriority,
    pub title: String,
    pub message: String,
}

/// Runs every rule against a single listing. Tips come back in rule order;
/// use [`collect_tips`] to rank them.
pub fn generate_tips_for_property(property: &Property) -> Vec<ListingTip> {
    let mut tips = Vec::new();
    let mut push = |kind, priority, title: &str, message: String| {
        tips.push(ListingTip {
            property_id: property.id.clone(),
            property_title: property.title.clone(),
            kind,
            priority,
            title: title.to_string(),
            message,
        });
    };

    let description_len = property
        .description
        .as_deref()
        .map_or(0, |d| d.trim().chars().count());
    if description_len < DESCRIPTION_SHORT {
        push(
            TipKind::Description,
            TipPriority::High,
            "Write a description",
            format!(
                "The description has only {description_len} characters. \
                 Describe the layout, condition and neighbourhood."
            ),
        );
    } else if description_len < DESCRIPTION_FULL {
        push(
            TipKind::Description,
            TipPriority::Medium,
            "Expand the description",
            format!(
                "Listings with at least {DESCRIPTION_FULL} characters of description \
                 get more inquiries."
            ),
        );
    }

    let photo_count = property.images.len();
    if photo_count == 0 {
        push(
            TipKind::Photos,
            TipPriority::High,
            "Add photos",
            "Listings without photos are rarely opened. Upload at least one exterior shot."
                .to_string(),
        );
    } else if photo_count < PHOTOS_RECOMMENDED {
        push(
            TipKind::Photos,
            TipPriority::Medium,
            "Add more photos",
            format!(
                "Only {photo_count} photo(s). Aim for {PHOTOS_RECOMMENDED} or more, \
                 covering every room."
            ),
        );
    }

    if property.price.is_none_or(|price| price <= 0.0) {
        push(
            TipKind::Price,
            TipPriority::High,
            "Set a price",
            "Buyers filter by price; a listing without one is hidden from most searches."
                .to_string(),
        );
    }

    if property.title.trim().chars().count() < TITLE_MIN {
        push(
            TipKind::Title,
            TipPriority::Medium,
            "Use a more descriptive title",
            "Mention the property type, size or location in the title.".to_string(),
        );
    }

    let feature_count = property.feature_count();
    if feature_count < FEATURES_MIN {
        push(
            TipKind::Features,
            TipPriority::Medium,
            "List more features",
            format!(
                "{feature_count} feature(s) listed. \
                 Tick amenities such as parking, pool or furnishing."
            ),
        );
    }

    if !property.has_tour() {
        push(
            TipKind::VirtualTour,
            TipPriority::Low,
            "Add a virtual tour",
            "A 360 tour or 3D model lets remote buyers view the property.".to_string(),
        );
    }

    tips
}

/// Tips across all listings, most urgent first. Listings keep their relative
/// order within each priority and no tip is deduplicated.
pub fn collect_tips(properties: &[Property]) -> Vec<ListingTip> {
    let mut tips: Vec<ListingTip> = properties
        .iter()
        .flat_map(generate_tips_for_property)
        .collect();
    tips.sort_by_key(|tip| tip.priority);
    tips
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TipSummary {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    /// Share of passed checks across all listings, 0-100.
    pub completeness: u8,
}

pub fn summarize_tips(properties: &[Property], tips: &[ListingTip]) -> TipSummary {
    let mut summary = TipSummary::default();
    for tip in tips {
        match tip.priority {
            TipPriority::High => summary.high += 1,
            TipPriority::Medium => summary.medium += 1,
            TipPriority::Low => summary.low += 1,
        }
    }

    let total_checks = properties.len() * CHECK_COUNT;
    summary.completeness = if total_checks == 0 {
        100
    } else {
        let passed = total_checks.saturating_sub(tips.len());
        ((passed * 100) / total_checks) as u8
    };
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_property() -> Property {
        Property {
            id: "p-1".to_string(),
            title: "Modern villa with rice field view".to_string(),
            description: Some("x".repeat(250)),
            price: Some(3_500_000_000.0),
            images: (0..6).map(|i| format!("img-{i}.jpg")).collect(),
            features: [("pool", true), ("garage", true), ("garden", true)]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            virtual_tour_url: Some("https://tour.example/p-1".to_string()),
            model_3d_url: None,
        }
    }

    fn kinds(tips: &[ListingTip]) -> Vec<(TipKind, TipPriority)> {
        tips.iter().map(|t| (t.kind, t.priority)).collect()
    }

    #[test]
    fn test_complete_listing_has_no_tips() {
        assert!(generate_tips_for_property(&complete_property()).is_empty());
    }

    #[test]
    fn test_description_thresholds() {
        let mut property = complete_property();

        property.description = Some("a".repeat(49));
        assert_eq!(
            kinds(&generate_tips_for_property(&property)),
            vec![(TipKind::Description, TipPriority::High)]
        );

        property.description = Some("a".repeat(50));
        assert_eq!(
            kinds(&generate_tips_for_property(&property)),
            vec![(TipKind::Description, TipPriority::Medium)]
        );

        property.description = Some("a".repeat(199));
        assert_eq!(
            kinds(&generate_tips_for_property(&property)),
            vec![(TipKind::Description, TipPriority::Medium)]
        );

        property.description = Some("a".repeat(200));
        assert!(generate_tips_for_property(&property).is_empty());

        property.description = None;
        assert_eq!(
            kinds(&generate_tips_for_property(&property)),
            vec![(TipKind::Description, TipPriority::High)]
        );
    }

    #[test]
    fn test_photo_thresholds() {
        let mut property = complete_property();

        property.images.clear();
        assert_eq!(
            kinds(&generate_tips_for_property(&property)),
            vec![(TipKind::Photos, TipPriority::High)]
        );

        property.images = vec!["a.jpg".to_string(); 4];
        assert_eq!(
            kinds(&generate_tips_for_property(&property)),
            vec![(TipKind::Photos, TipPriority::Medium)]
        );

        property.images = vec!["a.jpg".to_string(); 5];
        assert!(generate_tips_for_property(&property).is_empty());
    }

    #[test]
    fn test_features_only_count_enabled_flags() {
        let mut property = complete_property();
        property.features.insert("garden".to_string(), false);
        property.features.insert("sauna".to_string(), false);

        assert_eq!(
            kinds(&generate_tips_for_property(&property)),
            vec![(TipKind::Features, TipPriority::Medium)]
        );
    }

    #[test]
    fn test_blank_tour_urls_count_as_missing() {
        let mut property = complete_property();
        property.virtual_tour_url = Some("  ".to_string());
        assert_eq!(
            kinds(&generate_tips_for_property(&property)),
            vec![(TipKind::VirtualTour, TipPriority::Low)]
        );

        property.model_3d_url = Some("https://models.example/p-1.glb".to_string());
        assert!(generate_tips_for_property(&property).is_empty());
    }

    #[test]
    fn test_bare_listing_tips_sorted_by_priority() {
        let property = Property {
            id: "p-2".to_string(),
            title: "Small flat".to_string(),
            description: Some("d".repeat(240)),
            price: Some(0.0),
            ..Default::default()
        };
        assert_eq!(property.title.len(), 10);

        let tips = collect_tips(&[property]);
        assert_eq!(
            kinds(&tips),
            vec![
                (TipKind::Photos, TipPriority::High),
                (TipKind::Price, TipPriority::High),
                (TipKind::Title, TipPriority::Medium),
                (TipKind::Features, TipPriority::Medium),
                (TipKind::VirtualTour, TipPriority::Low),
            ]
        );
    }

    #[test]
    fn test_collect_tips_keeps_duplicates_across_properties() {
        let mut first = complete_property();
        first.images.clear();
        let mut second = complete_property();
        second.id = "p-2".to_string();
        second.images.clear();
        second.virtual_tour_url = None;

        let tips = collect_tips(&[second, first]);
        assert_eq!(tips.len(), 3);
        assert_eq!(tips[0].property_id, "p-2");
        assert_eq!(tips[0].kind, TipKind::Photos);
        assert_eq!(tips[1].property_id, "p-1");
        assert_eq!(tips[1].kind, TipKind::Photos);
        assert_eq!(tips[2].priority, TipPriority::Low);
    }

    #[test]
    fn test_summarize_tips() {
        let mut incomplete = complete_property();
        incomplete.price = None;
        incomplete.virtual_tour_url = None;
        let properties = vec![complete_property(), incomplete];
        let tips = collect_tips(&properties);

        let summary = summarize_tips(&properties, &tips);
        assert_eq!(summary.high, 1);
        assert_eq!(summary.medium, 0);
        assert_eq!(summary.low, 1);
        assert_eq!(summary.completeness, 83);

        assert_eq!(summarize_tips(&[], &[]).completeness, 100);
    }
}
