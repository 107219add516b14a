//! Scoring seam
//!
//! The batch engine only knows the [`Scorer`] trait; what actually decides
//! is pluggable. The shipped [`MomentumScorer`] is the fast technical
//! path — pure price momentum with a mood-aware rationale. Heavier
//! reasoning backends implement the same trait externally.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::common::errors::EngineError;
use crate::common::types::{Action, Instrument, Quote, Strength};
use crate::market::MarketContext;

/// What a scorer produces for one instrument. The engine attaches the
/// instrument identity and quote to form the committed `Decision`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreOutcome {
    pub action: Action,
    pub strength: Strength,
    pub rationale: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
}

/// Per-instrument decision maker
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn score(
        &self,
        instrument: &Instrument,
        quote: &Quote,
        context: &MarketContext,
    ) -> Result<ScoreOutcome, EngineError>;
}

/// Threshold-based momentum scorer.
///
/// A move beyond +5% is a strong BUY, beyond -5% a strong SELL,
/// anything in between a HOLD. Confidence comes straight from the
/// strength tier.
#[derive(Debug, Clone, Copy, Default)]
pub struct MomentumScorer;

const BUY_THRESHOLD: Decimal = dec!(5);
const SELL_THRESHOLD: Decimal = dec!(-5);

#[async_trait]
impl Scorer for MomentumScorer {
    async fn score(
        &self,
        instrument: &Instrument,
        quote: &Quote,
        context: &MarketContext,
    ) -> Result<ScoreOutcome, EngineError> {
        let change = quote.change_pct;

        let (action, strength) = if change > BUY_THRESHOLD {
            (Action::Buy, Strength::Strong)
        } else if change < SELL_THRESHOLD {
            (Action::Sell, Strength::Strong)
        } else if change.abs() <= dec!(2) {
            (Action::Hold, Strength::Moderate)
        } else {
            // Moving, but not decisively
            (Action::Hold, Strength::Weak)
        };

        let sign = if change.is_sign_positive() { "+" } else { "" };
        let rationale = format!(
            "{} ({}) moved {sign}{:.2}% in a {} market (mood {:.1})",
            instrument.name, instrument.symbol, change, context.mood.label, context.mood.value
        );

        Ok(ScoreOutcome {
            action,
            strength,
            rationale,
            confidence: strength.base_confidence(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::BreadthSnapshot;
    use crate::market::{score_mood, FlowSummary, MarketContext};
    use chrono::Utc;

    fn context() -> MarketContext {
        let breadth = BreadthSnapshot {
            advancers: 2400,
            decliners: 2200,
            unchanged: 200,
        };
        MarketContext {
            mood: score_mood(&breadth, Decimal::ZERO),
            breadth,
            flow: FlowSummary {
                total: Decimal::ZERO,
                average: Decimal::ZERO,
                window_days: 28,
                requested_days: 28,
                partial: false,
            },
            stale: false,
            as_of: Utc::now(),
        }
    }

    fn quote(change_pct: Decimal) -> Quote {
        Quote {
            symbol: "600519".to_string(),
            price: dec!(1700.00),
            change_pct,
            volume: Some(32_000),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn surge_is_a_strong_buy() {
        let instrument = Instrument::new("600519", "贵州茅台");
        let outcome = MomentumScorer
            .score(&instrument, &quote(dec!(6.2)), &context())
            .await
            .unwrap();
        assert_eq!(outcome.action, Action::Buy);
        assert_eq!(outcome.strength, Strength::Strong);
        assert_eq!(outcome.confidence, 0.8);
    }

    #[tokio::test]
    async fn slump_is_a_sell() {
        let instrument = Instrument::new("000001", "平安银行");
        let outcome = MomentumScorer
            .score(&instrument, &quote(dec!(-8.0)), &context())
            .await
            .unwrap();
        assert_eq!(outcome.action, Action::Sell);
        assert_eq!(outcome.confidence, 0.8);
    }

    #[tokio::test]
    async fn thresholds_are_exclusive() {
        let instrument = Instrument::new("300750", "宁德时代");
        // Exactly +5% and -5% are still holds
        for change in [dec!(5), dec!(-5), dec!(0.5)] {
            let outcome = MomentumScorer
                .score(&instrument, &quote(change), &context())
                .await
                .unwrap();
            assert_eq!(outcome.action, Action::Hold, "change {change}");
        }
    }

    #[tokio::test]
    async fn hold_strength_reflects_drift() {
        let instrument = Instrument::new("300750", "宁德时代");
        let calm = MomentumScorer
            .score(&instrument, &quote(dec!(0.3)), &context())
            .await
            .unwrap();
        assert_eq!(calm.strength, Strength::Moderate);

        let edgy = MomentumScorer
            .score(&instrument, &quote(dec!(4.1)), &context())
            .await
            .unwrap();
        assert_eq!(edgy.strength, Strength::Weak);
        assert!(edgy.confidence < calm.confidence);
    }

    #[tokio::test]
    async fn rationale_mentions_mood() {
        let instrument = Instrument::new("600519", "贵州茅台");
        let outcome = MomentumScorer
            .score(&instrument, &quote(dec!(1.0)), &context())
            .await
            .unwrap();
        assert!(outcome.rationale.contains("neutral"));
        assert!(outcome.rationale.contains("600519"));
    }
}
