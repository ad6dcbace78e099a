//! Priority scoring for sales leads.
//!
//! A score is an integer in `0..=100` built from four heuristics: how recently
//! the lead was active, where it came from, how far along the pipeline it is,
//! and how reachable it is. Scores are banded at 80/60/40 for display, and a
//! lead scoring 70 or more is considered hot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;

pub const HOT_THRESHOLD: u8 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    Referral,
    Whatsapp,
    Website,
    PropertyInquiry,
    Social,
    WalkIn,
    #[serde(other)]
    Other,
}

impl LeadSource {
    fn weight(&self) -> u8 {
        match self {
            LeadSource::Referral => 25,
            LeadSource::PropertyInquiry => 22,
            LeadSource::Whatsapp => 20,
            LeadSource::Website => 18,
            LeadSource::WalkIn => 15,
            LeadSource::Social => 12,
            LeadSource::Other => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Negotiating,
    Converted,
    Lost,
}

impl LeadStatus {
    fn weight(&self) -> u8 {
        match self {
            LeadStatus::Negotiating => 30,
            LeadStatus::Qualified => 25,
            LeadStatus::Contacted => 15,
            LeadStatus::New => 10,
            LeadStatus::Converted => 5,
            LeadStatus::Lost => 0,
        }
    }
}

impl Display for LeadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LeadSource::Referral => "Referral",
            LeadSource::Whatsapp => "WhatsApp",
            LeadSource::Website => "Website",
            LeadSource::PropertyInquiry => "Property inquiry",
            LeadSource::Social => "Social",
            LeadSource::WalkIn => "Walk-in",
            LeadSource::Other => "Other",
        };
        f.write_str(label)
    }
}

impl Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LeadStatus::New => "New",
            LeadStatus::Contacted => "Contacted",
            LeadStatus::Qualified => "Qualified",
            LeadStatus::Negotiating => "Negotiating",
            LeadStatus::Converted => "Converted",
            LeadStatus::Lost => "Lost",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub source: LeadSource,
    pub status: LeadStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_contacted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub budget_idr: Option<f64>,
    /// Score already stored with the lead row, if any.
    #[serde(default, deserialize_with = "deserialize_score")]
    pub score: Option<u8>,
}

/// Accepts any stored number: it is rounded and clamped into `0..=100`.
/// Non-finite values count as no score.
fn deserialize_score<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw
        .filter(|score| score.is_finite())
        .map(|score| score.round().clamp(0.0, 100.0) as u8))
}

impl Lead {
    fn last_activity(&self) -> DateTime<Utc> {
        self.last_contacted_at
            .map_or(self.created_at, |contacted| contacted.max(self.created_at))
    }

    /// The stored score when present, otherwise a freshly computed one.
    pub fn effective_score(&self, now: DateTime<Utc>) -> u8 {
        self.score
            .map_or_else(|| score_lead(self, now), |score| score.min(100))
    }
}

fn recency_points(lead: &Lead, now: DateTime<Utc>) -> u8 {
    let hours = (now - lead.last_activity()).num_hours().max(0);
    match hours {
        h if h < 24 => 30,
        h if h < 24 * 3 => 25,
        h if h < 24 * 7 => 20,
        h if h < 24 * 14 => 12,
        h if h < 24 * 30 => 6,
        _ => 0,
    }
}

fn contact_points(lead: &Lead) -> u8 {
    let present = |field: &Option<String>| field.as_deref().is_some_and(|v| !v.trim().is_empty());
    let mut points = 0;
    if present(&lead.phone) {
        points += 8;
    }
    if present(&lead.email) {
        points += 7;
    }
    points
}

pub fn score_lead(lead: &Lead, now: DateTime<Utc>) -> u8 {
    if lead.status == LeadStatus::Lost {
        return 0;
    }
    let total = recency_points(lead, now)
        + lead.source.weight()
        + lead.status.weight()
        + contact_points(lead);
    total.min(100)
}

pub fn is_hot(score: u8) -> bool {
    score >= HOT_THRESHOLD
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum ScoreBand {
    Excellent,
    Good,
    Fair,
    Low,
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s >= 80 => ScoreBand::Excellent,
            s if s >= 60 => ScoreBand::Good,
            s if s >= 40 => ScoreBand::Fair,
            _ => ScoreBand::Low,
        }
    }
}

impl Display for ScoreBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ScoreBand::Excellent => "Excellent",
                ScoreBand::Good => "Good",
                ScoreBand::Fair => "Fair",
                ScoreBand::Low => "Low",
            }
        )
    }
}

#[derive(Debug, Clone)]
pub struct ScoredLead<'a> {
    pub lead: &'a Lead,
    pub score: u8,
    pub band: ScoreBand,
    pub hot: bool,
}

/// Scores every lead and orders them from highest to lowest score.
pub fn rank_leads(leads: &[Lead], now: DateTime<Utc>) -> Vec<ScoredLead<'_>> {
    let mut ranked: Vec<ScoredLead<'_>> = leads
        .iter()
        .map(|lead| {
            let score = lead.effective_score(now);
            ScoredLead {
                lead,
                score,
                band: ScoreBand::from_score(score),
                hot: is_hot(score),
            }
        })
        .collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadSummary {
    pub total: usize,
    pub hot: usize,
    pub average_score: f64,
    pub excellent: usize,
    pub good: usize,
    pub fair: usize,
    pub low: usize,
}

pub fn summarize_leads(ranked: &[ScoredLead<'_>]) -> LeadSummary {
    let mut summary = LeadSummary {
        total: ranked.len(),
        ..Default::default()
    };
    let mut score_sum = 0u32;
    for scored in ranked {
        score_sum += u32::from(scored.score);
        if scored.hot {
            summary.hot += 1;
        }
        match scored.band {
            ScoreBand::Excellent => summary.excellent += 1,
            ScoreBand::Good => summary.good += 1,
            ScoreBand::Fair => summary.fair += 1,
            ScoreBand::Low => summary.low += 1,
        }
    }
    if !ranked.is_empty() {
        summary.average_score = f64::from(score_sum) / ranked.len() as f64;
    }
    summary
}
