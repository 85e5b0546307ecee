//! Consensus Coordinator - runs the interpretation pipeline.
//!
//! This is the single entry point callers use: it turns a batch of raw
//! provider responses into a consensus result.

use std::collections::BTreeSet;

use crate::domain::{ConsensusResult, Judgment, JudgmentSet, ModelResponse, ResponseBatch};
use crate::engine::{
    ConsensusAggregator, OptOutDetector, OptOutOutcome, ResponseClassifier, ResponseNormalizer,
};

/// Interpretation of a single response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation {
    pub judgment: Judgment,
    /// Opt-out pattern that short-circuited classification, if any.
    pub matched_pattern: Option<String>,
}

/// Orchestrates normalization, opt-out detection, classification and
/// aggregation.
pub struct ConsensusCoordinator {
    normalizer: ResponseNormalizer,
    opt_out: Box<dyn OptOutDetector>,
    classifier: Box<dyn ResponseClassifier>,
    aggregator: ConsensusAggregator,
}

impl ConsensusCoordinator {
    /// Create a new coordinator with the given components.
    pub fn new(opt_out: Box<dyn OptOutDetector>, classifier: Box<dyn ResponseClassifier>) -> Self {
        Self {
            normalizer: ResponseNormalizer::new(),
            opt_out,
            classifier,
            aggregator: ConsensusAggregator::new(),
        }
    }

    /// Interpret one response's text.
    ///
    /// Pipeline order:
    /// 1. Normalizer - strip markup
    /// 2. Opt-out Detector - recusal, then policy limitation
    /// 3. Classifier - only when no opt-out matched
    ///
    /// Text that is only markup normalizes to nothing and classifies as
    /// UNCERTAIN.
    pub fn interpret(&self, text: &str) -> Interpretation {
        let normalized = self.normalizer.normalize(text);
        let outcome = self.opt_out.detect(&normalized);

        let judgment = match &outcome {
            OptOutOutcome::Recused { .. } => Judgment::Recuse,
            OptOutOutcome::PolicyLimited { .. } => Judgment::PolicyLimited,
            OptOutOutcome::Substantive => self.classifier.classify(&normalized),
        };

        Interpretation {
            judgment,
            matched_pattern: outcome.pattern().map(str::to_string),
        }
    }

    /// Aggregate a batch of provider responses into a consensus.
    ///
    /// Failed and empty responses are dropped; they never count as
    /// UNCERTAIN.
    pub fn aggregate(&self, responses: &ResponseBatch) -> ConsensusResult {
        let mut judgments = JudgmentSet::new();
        let mut policy_limited = BTreeSet::new();

        for (provider_id, response) in responses {
            let Some(interpretation) = self.interpret_response(response) else {
                tracing::debug!(
                    provider = %provider_id,
                    error = ?response.error,
                    "Dropping response without usable text"
                );
                continue;
            };

            tracing::debug!(
                provider = %provider_id,
                judgment = %interpretation.judgment,
                pattern = ?interpretation.matched_pattern,
                "Response interpreted"
            );

            if interpretation.judgment == Judgment::PolicyLimited {
                policy_limited.insert(provider_id.clone());
            }
            judgments.insert(provider_id.clone(), interpretation.judgment);
        }

        let result = self.aggregator.aggregate(judgments, policy_limited);

        tracing::info!(
            verdict = %result.verdict,
            confidence = result.confidence_percentage,
            confidence_level = %result.confidence_level,
            responded = result.judgments.len(),
            substantive = result.substantive_count(),
            "Consensus complete"
        );

        result
    }

    fn interpret_response(&self, response: &ModelResponse) -> Option<Interpretation> {
        response.usable_text().map(|text| self.interpret(text))
    }
}

impl Default for ConsensusCoordinator {
    fn default() -> Self {
        Self::new(
            Box::new(crate::engine::PhraseOptOutDetector::default()),
            Box::new(crate::engine::KeywordClassifier::default()),
        )
    }
}
