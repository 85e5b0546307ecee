//! Consensus result types.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{ConfidenceLevel, Judgment, Verdict};

/// Provider id to judgment, one entry per provider that produced usable text.
pub type JudgmentSet = BTreeMap<String, Judgment>;

/// Counts over the substantive subset of a judgment set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct JudgmentTally {
    pub true_count: usize,
    pub false_count: usize,
    pub uncertain_count: usize,
}

impl JudgmentTally {
    /// Count TRUE, FALSE and UNCERTAIN judgments, ignoring opt-outs.
    pub fn from_judgments<'a>(judgments: impl IntoIterator<Item = &'a Judgment>) -> Self {
        let mut tally = Self::default();
        for verdict in judgments.into_iter().filter_map(Judgment::as_verdict) {
            match verdict {
                Verdict::True => tally.true_count += 1,
                Verdict::False => tally.false_count += 1,
                Verdict::Uncertain => tally.uncertain_count += 1,
            }
        }
        tally
    }

    /// Size of the substantive subset.
    pub fn substantive(&self) -> usize {
        self.true_count + self.false_count + self.uncertain_count
    }

    /// Count for a given verdict.
    pub fn count(&self, verdict: Verdict) -> usize {
        match verdict {
            Verdict::True => self.true_count,
            Verdict::False => self.false_count,
            Verdict::Uncertain => self.uncertain_count,
        }
    }
}

/// Consensus across providers for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConsensusResult {
    /// Final verdict.
    pub verdict: Verdict,

    /// Confidence in the verdict, 0 to 100.
    pub confidence_percentage: u8,

    /// Bucketed confidence.
    pub confidence_level: ConfidenceLevel,

    /// Per-provider judgments.
    #[schema(value_type = BTreeMap<String, Judgment>)]
    pub judgments: JudgmentSet,

    /// Providers that declined on policy grounds.
    pub policy_limited_providers: BTreeSet<String>,

    /// Providers judged UNCERTAIN.
    pub uncertain_providers: BTreeSet<String>,

    /// Providers that recused themselves.
    pub recused_providers: BTreeSet<String>,

    /// Substantive counts behind the verdict.
    pub tally: JudgmentTally,
}

impl ConsensusResult {
    /// Number of providers that took part in the substantive tally.
    pub fn substantive_count(&self) -> usize {
        self.tally.substantive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_ignores_opt_outs() {
        let judgments = [
            Judgment::True,
            Judgment::Recuse,
            Judgment::PolicyLimited,
            Judgment::Uncertain,
            Judgment::True,
        ];
        let tally = JudgmentTally::from_judgments(judgments.iter());
        assert_eq!(tally.true_count, 2);
        assert_eq!(tally.false_count, 0);
        assert_eq!(tally.uncertain_count, 1);
        assert_eq!(tally.substantive(), 3);
        assert_eq!(tally.count(Verdict::True), 2);
    }
}
