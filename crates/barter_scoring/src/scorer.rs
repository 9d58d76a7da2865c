//! # Scorer
//!
//! Computes the 18-dimensional score vector and aggregate for a candidate
//! loop (§4.7). Every dimension is deterministic given the same
//! `LoopCandidate` and `max_depth`; aggregation sums in `ScoreDimension`
//! discriminant order using `f64`, matching the spec's numeric-stability
//! requirement.

use std::collections::{HashMap, HashSet};

use barter_core::SCORE_DIMENSIONS;
use barter_shared::WalletId;

use crate::dimension::ScoreDimension;
use crate::model::LoopCandidate;

/// One day in milliseconds, the half-life used to decay wall-clock-based
/// liveness signals.
const ACTIVITY_HALF_LIFE_MS: f64 = 24.0 * 60.0 * 60.0 * 1000.0;
/// Valuations are assumed to go stale more slowly than wallet activity.
const VALUATION_HALF_LIFE_MS: f64 = 7.0 * ACTIVITY_HALF_LIFE_MS;
/// Threshold below which a valuation counts as "confidently fresh" for
/// [`ScoreDimension::ValuationConfidenceAlignment`].
const FRESH_VALUATION_THRESHOLD_MS: u64 = 24 * 60 * 60 * 1000;
/// Alternative-NFT counts are capped here before normalizing to `[0, 1]`.
const EDGE_REDUNDANCY_CAP: f64 = 10.0;

/// An 18-dimensional score vector, one entry per [`ScoreDimension`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScoreVector(pub [f64; SCORE_DIMENSIONS]);

impl ScoreVector {
    /// The value at `dimension`.
    #[must_use]
    pub fn get(&self, dimension: ScoreDimension) -> f64 {
        self.0[dimension.index()]
    }

    /// The weighted aggregate in `[0.0, 1.0]`, summed in dimension order
    /// (discriminant, i.e. weight-vector, order) for reproducibility across
    /// hardware and build.
    #[must_use]
    pub fn aggregate(&self, weights: &[f64; SCORE_DIMENSIONS]) -> f64 {
        let mut total = 0.0;
        for dimension in ScoreDimension::ALL {
            total += self.0[dimension.index()] * weights[dimension.index()];
        }
        total.clamp(0.0, 1.0)
    }
}

fn decay(age_ms: f64, half_life_ms: f64) -> f64 {
    1.0 / (1.0 + age_ms / half_life_ms)
}

fn normalize_spread(spread: f64, scale: f64) -> f64 {
    (1.0 - spread / scale.max(1.0)).clamp(0.0, 1.0)
}

/// Computes the score vector for `candidate` (§4.7).
///
/// # Panics
///
/// Panics if `candidate.steps` is empty; the Cycle Enumerator never
/// produces a zero-length candidate.
#[must_use]
pub fn score(candidate: &LoopCandidate, max_depth: usize) -> ScoreVector {
    assert!(!candidate.steps.is_empty(), "cannot score an empty loop");

    let length = candidate.length() as f64;
    let participants: Vec<&WalletId> = candidate.participants();

    let net_deltas: Vec<f64> = (0..candidate.steps.len())
        .map(|i| {
            let given = candidate.steps[i].valuation.as_ref().map_or(0.0, |v| v.amount.to_f64());
            let prev = (i + candidate.steps.len() - 1) % candidate.steps.len();
            let received = candidate.steps[prev].valuation.as_ref().map_or(0.0, |v| v.amount.to_f64());
            received - given
        })
        .collect();

    let mean_abs_value = {
        let sum: f64 = candidate
            .steps
            .iter()
            .filter_map(|s| s.valuation.as_ref())
            .map(|v| v.amount.to_f64().abs())
            .sum();
        let count = candidate.steps.iter().filter(|s| s.valuation.is_some()).count();
        if count == 0 { 0.0 } else { sum / count as f64 }
    };
    let value_scale = mean_abs_value.max(1.0);

    let mean_abs_delta = net_deltas.iter().map(|d| d.abs()).sum::<f64>() / length;
    let mean_delta = net_deltas.iter().sum::<f64>() / length;
    let variance = net_deltas.iter().map(|d| (d - mean_delta).powi(2)).sum::<f64>() / length;
    let max_min_gap = net_deltas.iter().cloned().fold(f64::MIN, f64::max)
        - net_deltas.iter().cloned().fold(f64::MAX, f64::min);

    let valuation_confidence_ratio =
        candidate.steps.iter().filter(|s| s.valuation.is_some()).count() as f64 / length;

    let distinct_currencies: HashSet<&str> = candidate
        .steps
        .iter()
        .filter_map(|s| s.valuation.as_ref())
        .map(|v| v.currency.as_str())
        .collect();
    let currency_normalized_total = if distinct_currencies.len() <= 1 {
        1.0
    } else {
        1.0 / distinct_currencies.len() as f64
    };

    let loop_length_preference = if max_depth <= 2 {
        1.0
    } else {
        (1.0 - (length - 2.0) / (max_depth as f64 - 2.0)).clamp(0.0, 1.0)
    };

    let distinct_wallets: HashSet<&WalletId> = participants.iter().copied().collect();
    let participant_diversity = (distinct_wallets.len() as f64 / length).clamp(0.0, 1.0);

    let edge_redundancy = (candidate.steps.iter().map(|s| s.alternative_count as f64).sum::<f64>()
        / length
        / EDGE_REDUNDANCY_CAP)
        .clamp(0.0, 1.0);

    let community_cohesion = candidate.community_cohesion.clamp(0.0, 1.0);

    let participant_activity_recency = candidate
        .steps
        .iter()
        .map(|s| decay(s.from_activity_age_ms as f64, ACTIVITY_HALF_LIFE_MS))
        .sum::<f64>()
        / length;

    let valuation_freshness = candidate
        .steps
        .iter()
        .map(|s| s.valuation_age_ms.map_or(0.5, |age| decay(age as f64, VALUATION_HALF_LIFE_MS)))
        .sum::<f64>()
        / length;

    let ownership_staleness = candidate
        .steps
        .iter()
        .map(|s| s.from_activity_age_ms as f64)
        .fold(0.0_f64, f64::max);
    let ownership_staleness = decay(ownership_staleness, ACTIVITY_HALF_LIFE_MS);

    let generation_gap = candidate.current_generation.saturating_sub(candidate.source_generation) as f64;
    let generation_freshness = decay(generation_gap, 4.0);

    let specific_want_ratio =
        candidate.steps.iter().filter(|s| s.is_specific_want).count() as f64 / length;

    let min_trade_value_matches = candidate
        .steps
        .iter()
        .filter(|s| {
            let hints = candidate.hints_of(&s.to);
            match (&hints.min_trade_value, &s.valuation) {
                (Some(min), Some(actual)) if min.comparable_to(actual) => actual.amount >= min.amount,
                _ => true,
            }
        })
        .count() as f64
        / length;

    let max_participants_matches = {
        let satisfied = distinct_wallets
            .iter()
            .filter(|wallet| {
                candidate
                    .hints_of(wallet)
                    .max_participants
                    .map_or(true, |max| max as f64 >= length)
            })
            .count();
        satisfied as f64 / distinct_wallets.len().max(1) as f64
    };

    let valuation_confidence_alignment = candidate
        .steps
        .iter()
        .filter(|s| {
            s.valuation.is_some() && s.valuation_age_ms.is_some_and(|age| age < FRESH_VALUATION_THRESHOLD_MS)
        })
        .count() as f64
        / length;

    let reliability: HashMap<&WalletId, f64> = distinct_wallets
        .iter()
        .map(|w| (*w, candidate.reliability_of(w)))
        .collect();
    let wallet_reliability_prior =
        reliability.values().sum::<f64>() / reliability.len().max(1) as f64;

    let mut vector = [0.0; SCORE_DIMENSIONS];
    vector[ScoreDimension::PerStepValueDelta.index()] = normalize_spread(mean_abs_delta, value_scale);
    vector[ScoreDimension::ValueVarianceAcrossParticipants.index()] =
        normalize_spread(variance.sqrt(), value_scale);
    vector[ScoreDimension::MaxMinValueGap.index()] = normalize_spread(max_min_gap.max(0.0), value_scale);
    vector[ScoreDimension::ValuationConfidenceRatio.index()] = valuation_confidence_ratio;
    vector[ScoreDimension::CurrencyNormalizedTotal.index()] = currency_normalized_total;
    vector[ScoreDimension::LoopLengthPreference.index()] = loop_length_preference;
    vector[ScoreDimension::ParticipantDiversity.index()] = participant_diversity;
    vector[ScoreDimension::EdgeRedundancy.index()] = edge_redundancy;
    vector[ScoreDimension::CommunityCohesion.index()] = community_cohesion;
    vector[ScoreDimension::ParticipantActivityRecency.index()] = participant_activity_recency;
    vector[ScoreDimension::ValuationFreshness.index()] = valuation_freshness;
    vector[ScoreDimension::OwnershipStaleness.index()] = ownership_staleness;
    vector[ScoreDimension::GenerationFreshness.index()] = generation_freshness;
    vector[ScoreDimension::SpecificWantRatio.index()] = specific_want_ratio;
    vector[ScoreDimension::MinTradeValuePreferenceMatch.index()] = min_trade_value_matches;
    vector[ScoreDimension::MaxParticipantsPreferenceMatch.index()] = max_participants_matches;
    vector[ScoreDimension::ValuationConfidenceAlignment.index()] = valuation_confidence_alignment;
    vector[ScoreDimension::WalletReliabilityPrior.index()] = wallet_reliability_prior;

    ScoreVector(vector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use barter_shared::{FixedPoint, NftId, Valuation};

    fn minimal_candidate() -> LoopCandidate {
        LoopCandidate {
            steps: vec![
                crate::model::ScoringStep {
                    from: WalletId::new("a"),
                    to: WalletId::new("b"),
                    nft: NftId::new("alpha"),
                    valuation: Some(Valuation::new(FixedPoint::from_whole(10), "ETH")),
                    valuation_age_ms: Some(1_000),
                    is_specific_want: true,
                    alternative_count: 0,
                    from_activity_age_ms: 1_000,
                },
                crate::model::ScoringStep {
                    from: WalletId::new("b"),
                    to: WalletId::new("c"),
                    nft: NftId::new("beta"),
                    valuation: Some(Valuation::new(FixedPoint::from_whole(10), "ETH")),
                    valuation_age_ms: Some(1_000),
                    is_specific_want: true,
                    alternative_count: 0,
                    from_activity_age_ms: 1_000,
                },
                crate::model::ScoringStep {
                    from: WalletId::new("c"),
                    to: WalletId::new("a"),
                    nft: NftId::new("gamma"),
                    valuation: Some(Valuation::new(FixedPoint::from_whole(10), "ETH")),
                    valuation_age_ms: Some(1_000),
                    is_specific_want: true,
                    alternative_count: 0,
                    from_activity_age_ms: 1_000,
                },
            ],
            community_cohesion: 1.0,
            source_generation: 5,
            current_generation: 5,
            preference_hints: HashMap::new(),
            wallet_reliability: HashMap::new(),
        }
    }

    #[test]
    fn equal_valuations_score_perfect_fairness() {
        let vector = score(&minimal_candidate(), 6);
        assert!((vector.get(ScoreDimension::PerStepValueDelta) - 1.0).abs() < 1e-9);
        assert!((vector.get(ScoreDimension::ValueVarianceAcrossParticipants) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn aggregate_with_uniform_weights_is_in_unit_range() {
        let vector = score(&minimal_candidate(), 6);
        let weights = [1.0 / SCORE_DIMENSIONS as f64; SCORE_DIMENSIONS];
        let aggregate = vector.aggregate(&weights);
        assert!((0.0..=1.0).contains(&aggregate));
    }

    #[test]
    fn same_generation_yields_maximal_generation_freshness() {
        let vector = score(&minimal_candidate(), 6);
        assert!((vector.get(ScoreDimension::GenerationFreshness) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn mismatched_currencies_reduce_currency_normalized_total() {
        let mut candidate = minimal_candidate();
        candidate.steps[1].valuation = Some(Valuation::new(FixedPoint::from_whole(10), "USD"));
        let vector = score(&candidate, 6);
        assert!(vector.get(ScoreDimension::CurrencyNormalizedTotal) < 1.0);
    }

    #[test]
    fn stale_generation_reduces_generation_freshness() {
        let mut candidate = minimal_candidate();
        candidate.current_generation = 50;
        let vector = score(&candidate, 6);
        assert!(vector.get(ScoreDimension::GenerationFreshness) < 0.5);
    }

    #[test]
    fn longer_loop_scores_lower_on_length_preference() {
        let short = score(&minimal_candidate(), 6);
        let mut long_candidate = minimal_candidate();
        long_candidate.steps.push(crate::model::ScoringStep {
            from: WalletId::new("d"),
            to: WalletId::new("a"),
            nft: NftId::new("delta"),
            valuation: Some(Valuation::new(FixedPoint::from_whole(10), "ETH")),
            valuation_age_ms: Some(1_000),
            is_specific_want: true,
            alternative_count: 0,
            from_activity_age_ms: 1_000,
        });
        let long = score(&long_candidate, 6);
        assert!(long.get(ScoreDimension::LoopLengthPreference) < short.get(ScoreDimension::LoopLengthPreference));
    }
}
