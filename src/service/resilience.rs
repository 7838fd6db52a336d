//! Multi-turn resilience scorer
//!
//! Reduces one conversation chain (initial turn plus follow-ups) to a single
//! adjusted score. The adjustment is asymmetric: improvement across follow-ups
//! is rewarded at half weight, while a brand that disappears mid-conversation
//! is penalized harder than one that merely weakens.

use crate::model::{ResilienceScore, Turn, TurnMetrics};

/// Weight on a positive follow-up score delta
const IMPROVEMENT_WEIGHT: f64 = 0.5;
/// Weight on a negative delta when the brand vanished in a follow-up
const DISAPPEARANCE_WEIGHT: f64 = 0.4;
/// Weight on a negative delta while the brand stays visible
const DECLINE_WEIGHT: f64 = 0.2;
/// Flat bonus/penalty bound for brand persistence
const PERSISTENCE_POINTS: f64 = 5.0;

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn metrics_of(turn: &Turn) -> TurnMetrics {
    turn.metrics.clone().unwrap_or_else(TurnMetrics::zero)
}

/// Score one chain. Returns None when the chain has no level-0 turn; a chain
/// of orphaned follow-ups is not scorable.
pub fn score_chain(chain: &[Turn], follow_up_enabled: bool) -> Option<ResilienceScore> {
    let initial = chain.iter().find(|t| t.level == 0)?;
    let initial_metrics = metrics_of(initial);
    let initial_score = initial_metrics.recommendation;
    let initially_visible = initial_metrics.visibility > 0.0;

    let mut follow_ups: Vec<&Turn> = chain.iter().filter(|t| t.level > 0).collect();
    follow_ups.sort_by_key(|t| t.level);

    if !follow_up_enabled || follow_ups.is_empty() {
        return Some(ResilienceScore {
            final_score: round1(initial_score),
            initial_score,
            conversational_bonus: 0.0,
            brand_persistence: if initially_visible { 100.0 } else { 0.0 },
            sentiment_stability: 100.0,
            follow_up_active: false,
        });
    }

    let all_metrics: Vec<TurnMetrics> = std::iter::once(initial_metrics.clone())
        .chain(follow_ups.iter().map(|t| metrics_of(t)))
        .collect();

    let visible_levels = all_metrics.iter().filter(|m| m.visibility > 0.0).count();
    let brand_persistence = visible_levels as f64 / all_metrics.len() as f64 * 100.0;

    let sentiment_stability = stability(&all_metrics);

    let follow_up_metrics: Vec<TurnMetrics> = follow_ups.iter().map(|t| metrics_of(t)).collect();
    let avg_follow_up_score = follow_up_metrics
        .iter()
        .map(|m| m.recommendation)
        .sum::<f64>()
        / follow_up_metrics.len() as f64;

    let diff = avg_follow_up_score - initial_score;
    let disappeared =
        initially_visible && follow_up_metrics.iter().any(|m| m.visibility == 0.0);

    let score_adjustment = if diff > 0.0 {
        diff * IMPROVEMENT_WEIGHT
    } else if disappeared {
        diff * DISAPPEARANCE_WEIGHT
    } else {
        diff * DECLINE_WEIGHT
    };

    let persistence_adjustment = if initially_visible {
        if brand_persistence >= 100.0 {
            PERSISTENCE_POINTS
        } else if follow_up_metrics.iter().all(|m| m.visibility == 0.0) {
            -PERSISTENCE_POINTS
        } else {
            -((100.0 - brand_persistence) / 100.0) * PERSISTENCE_POINTS
        }
    } else {
        0.0
    };

    let final_score =
        (initial_score + score_adjustment + persistence_adjustment).clamp(0.0, 100.0);

    Some(ResilienceScore {
        final_score: round1(final_score),
        initial_score,
        conversational_bonus: round1(score_adjustment + persistence_adjustment),
        brand_persistence,
        sentiment_stability,
        follow_up_active: true,
    })
}

/// 100 minus the mean absolute deviation of in-context sentiment values.
/// With at most one value there is nothing to deviate from.
fn stability(all_metrics: &[TurnMetrics]) -> f64 {
    let sentiments: Vec<f64> = all_metrics.iter().filter_map(|m| m.sentiment).collect();
    if sentiments.len() <= 1 {
        return 100.0;
    }
    let mean = sentiments.iter().sum::<f64>() / sentiments.len() as f64;
    let mean_deviation =
        sentiments.iter().map(|s| (s - mean).abs()).sum::<f64>() / sentiments.len() as f64;
    100.0 - mean_deviation
}

/// Scan-level aggregation: field-wise arithmetic mean across all chains.
/// `follow_up_active` is true only if follow-ups were enabled and at least
/// one chain actually had them.
pub fn aggregate(scores: &[ResilienceScore], follow_up_enabled: bool) -> Option<ResilienceScore> {
    if scores.is_empty() {
        return None;
    }
    let n = scores.len() as f64;
    let mean = |f: fn(&ResilienceScore) -> f64| scores.iter().map(f).sum::<f64>() / n;

    Some(ResilienceScore {
        final_score: round1(mean(|s| s.final_score)),
        initial_score: round1(mean(|s| s.initial_score)),
        conversational_bonus: round1(mean(|s| s.conversational_bonus)),
        brand_persistence: round1(mean(|s| s.brand_persistence)),
        sentiment_stability: round1(mean(|s| s.sentiment_stability)),
        follow_up_active: follow_up_enabled && scores.iter().any(|s| s.follow_up_active),
    })
}
