//! Market mood scoring
//!
//! Combines advance/decline breadth with the average daily capital flow
//! into one 0-100 score, then maps it onto a coarse regime label. The
//! computation is pure so the threshold behavior is directly testable.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::types::BreadthSnapshot;

/// Regime label derived from the mood score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodLabel {
    /// Score >= 70: broad advance with supportive flows
    BullishChase,
    /// 40 <= score < 70
    Neutral,
    /// Score < 40
    Bearish,
}

impl MoodLabel {
    /// Threshold mapping. Exactly 70 is bullish-chase, exactly 40 is
    /// neutral.
    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            MoodLabel::BullishChase
        } else if score >= 40.0 {
            MoodLabel::Neutral
        } else {
            MoodLabel::Bearish
        }
    }
}

impl std::fmt::Display for MoodLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoodLabel::BullishChase => write!(f, "bullish_chase"),
            MoodLabel::Neutral => write!(f, "neutral"),
            MoodLabel::Bearish => write!(f, "bearish"),
        }
    }
}

/// Aggregate market mood for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodScore {
    /// Score in [0, 100]
    pub value: f64,
    pub label: MoodLabel,
    pub advancers: u32,
    pub decliners: u32,
}

/// Score the market from breadth and average daily net flow (in 亿元).
///
/// Breadth contributes up to 60 points (share of movers that advanced);
/// flow contributes 20 +/- 20, saturating at +/-100亿 average daily flow.
/// A flat market with zero flow therefore lands at exactly 50, neutral.
pub fn score_mood(breadth: &BreadthSnapshot, avg_flow: Decimal) -> MoodScore {
    let breadth_points = breadth.advance_ratio() * 60.0;

    let flow = avg_flow.to_f64().unwrap_or(0.0);
    let flow_points = 20.0 + 20.0 * (flow / 100.0).clamp(-1.0, 1.0);

    let value = (breadth_points + flow_points).clamp(0.0, 100.0);

    MoodScore {
        value,
        label: MoodLabel::from_score(value),
        advancers: breadth.advancers,
        decliners: breadth.decliners,
    }
}
