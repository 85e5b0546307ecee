//! Consensus Aggregator - reduces per-provider judgments to one verdict.
//!
//! This is a pure function of the judgment set: no I/O, no shared state,
//! deterministic for fixed inputs.

use std::collections::BTreeSet;

use crate::domain::{
    ConfidenceLevel, ConsensusResult, Judgment, JudgmentSet, JudgmentTally, Verdict,
};

/// Ceiling for confidence in an UNCERTAIN verdict.
const UNCERTAIN_CAP: f64 = 70.0;
/// Maximum bonus awarded when policy-limited providers agree with the verdict.
const POLICY_BONUS_WEIGHT: f64 = 20.0;
/// Ceiling when every substantive signal came from a policy-limited provider.
const ALL_POLICY_CAP: f64 = 90.0;
/// Maximum penalty for UNCERTAIN dissent under a TRUE/FALSE verdict.
const UNCERTAIN_PENALTY_WEIGHT: f64 = 30.0;
/// Floor once the dissent penalty applies.
const PENALTY_FLOOR: f64 = 40.0;

/// Combines judgments into a consensus result.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsensusAggregator;

impl ConsensusAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Aggregate a judgment set.
    ///
    /// `policy_limited` names providers that hedged on policy grounds. They
    /// normally carry a POLICY_LIMITED judgment and drop out of the tally;
    /// when such a provider still carries a substantive judgment it is
    /// counted, but weighted through the policy bonus instead of the base.
    pub fn aggregate(
        &self,
        judgments: JudgmentSet,
        policy_limited: BTreeSet<String>,
    ) -> ConsensusResult {
        let tally = JudgmentTally::from_judgments(judgments.values());
        let verdict = select_verdict(&tally);
        let confidence = compute_confidence(verdict, &tally, &judgments, &policy_limited);
        let confidence_percentage = round_percentage(confidence);

        tracing::debug!(
            true_count = tally.true_count,
            false_count = tally.false_count,
            uncertain_count = tally.uncertain_count,
            policy_limited = policy_limited.len(),
            raw_confidence = confidence,
            "Aggregated judgments"
        );

        let uncertain_providers = providers_with(&judgments, Judgment::Uncertain);
        let recused_providers = providers_with(&judgments, Judgment::Recuse);

        ConsensusResult {
            verdict,
            confidence_percentage,
            confidence_level: ConfidenceLevel::from_percentage(confidence_percentage),
            judgments,
            policy_limited_providers: policy_limited,
            uncertain_providers,
            recused_providers,
            tally,
        }
    }
}

/// Pick the verdict from substantive counts.
fn select_verdict(tally: &JudgmentTally) -> Verdict {
    let n = tally.substantive();
    if n == 0 {
        return Verdict::Uncertain;
    }

    let uncertain = tally.uncertain_count;
    let mut verdict = if uncertain as f64 >= n as f64 / 3.0 || uncertain >= 2 {
        Verdict::Uncertain
    } else {
        // First maximum wins, in this order.
        let mut best = Verdict::True;
        for candidate in [Verdict::False, Verdict::Uncertain] {
            if tally.count(candidate) > tally.count(best) {
                best = candidate;
            }
        }
        best
    };

    // Symmetric disagreement never resolves in either truth direction.
    if tally.true_count == tally.false_count && tally.true_count > 0 {
        verdict = Verdict::Uncertain;
    }

    verdict
}

/// Unrounded confidence for a verdict.
fn compute_confidence(
    verdict: Verdict,
    tally: &JudgmentTally,
    judgments: &JudgmentSet,
    policy_limited: &BTreeSet<String>,
) -> f64 {
    let n = tally.substantive();
    if n == 0 {
        return 0.0;
    }
    let n_f = n as f64;
    let count = tally.count(verdict) as f64;

    if verdict == Verdict::Uncertain {
        return (count / n_f * 100.0).min(UNCERTAIN_CAP);
    }

    let policy_labels: Vec<Judgment> = policy_limited
        .iter()
        .filter_map(|provider| judgments.get(provider).copied())
        .collect();
    let policy_aligned = policy_labels
        .iter()
        .filter(|j| **j == verdict.as_judgment())
        .count() as f64;
    let policy_substantive = policy_labels.iter().filter(|j| j.is_substantive()).count();
    let non_policy_total = n.saturating_sub(policy_substantive);

    let mut confidence = if non_policy_total > 0 {
        let base = (count - policy_aligned) / non_policy_total as f64 * 100.0;
        let bonus = policy_aligned / n_f * POLICY_BONUS_WEIGHT;
        (base + bonus).min(100.0)
    } else {
        count / n_f * ALL_POLICY_CAP
    };

    if tally.uncertain_count > 0 {
        let penalty = tally.uncertain_count as f64 / n_f * UNCERTAIN_PENALTY_WEIGHT;
        confidence = (confidence - penalty).max(PENALTY_FLOOR);
    }

    confidence
}

/// Round half away from zero and clamp into 0..=100.
fn round_percentage(confidence: f64) -> u8 {
    if !confidence.is_finite() {
        return 0;
    }
    confidence.round().clamp(0.0, 100.0) as u8
}

fn providers_with(judgments: &JudgmentSet, judgment: Judgment) -> BTreeSet<String> {
    judgments
        .iter()
        .filter(|(_, j)| **j == judgment)
        .map(|(provider, _)| provider.clone())
        .collect()
}
