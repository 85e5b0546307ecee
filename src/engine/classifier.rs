//! Text Classifier - reads a provider's self-reported verdict.
//!
//! The classifier trusts the provider to honor the requested answer format.
//! It looks for explicit TRUE/FALSE tokens and for hedging vocabulary; it
//! does not try to understand the claim itself.

use crate::domain::Judgment;

/// Phrases marking a response as non-committal.
pub const UNCERTAINTY_PHRASES: &[&str] = &[
    "cannot be definitively answered",
    "remains disputed",
    "insufficient evidence",
    "ambiguous",
    "unclear",
    "debated",
    "controversial",
    "depends on",
    "uncertain",
    "inconclusive",
    "no scientific consensus",
    "not enough information",
    "mixed evidence",
];

/// Negations that cancel a directly following verdict token.
const NEGATIONS: &[&str] = &["NOT ", "ISN'T ", "ISN’T "];

/// Trait for response classifier implementations.
pub trait ResponseClassifier: Send + Sync {
    /// Classify normalized text into TRUE, FALSE or UNCERTAIN.
    fn classify(&self, text: &str) -> Judgment;
}

/// Token and vocabulary based classifier.
pub struct KeywordClassifier {
    uncertainty_phrases: Vec<String>,
}

impl KeywordClassifier {
    /// Create a classifier with the built-in vocabulary plus extra phrases.
    pub fn new(extra_uncertainty: &[String]) -> Self {
        let uncertainty_phrases = UNCERTAINTY_PHRASES
            .iter()
            .map(|p| p.to_string())
            .chain(
                extra_uncertainty
                    .iter()
                    .map(|p| p.trim().to_lowercase())
                    .filter(|p| !p.is_empty()),
            )
            .collect();

        Self {
            uncertainty_phrases,
        }
    }

    /// Whether the text contains any uncertainty phrase (case-insensitive).
    pub fn is_uncertain(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.uncertainty_phrases
            .iter()
            .any(|phrase| lower.contains(phrase.as_str()))
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl ResponseClassifier for KeywordClassifier {
    fn classify(&self, text: &str) -> Judgment {
        let uncertain = self.is_uncertain(text);
        let upper = text.to_uppercase();

        let judgment = if asserts(&upper, "FALSE") {
            if uncertain {
                Judgment::Uncertain
            } else {
                Judgment::False
            }
        } else if asserts(&upper, "TRUE") {
            if uncertain {
                Judgment::Uncertain
            } else {
                Judgment::True
            }
        } else {
            // Literal UNCERTAIN, hedging vocabulary and unparseable stances
            // all land here.
            Judgment::Uncertain
        };

        tracing::trace!(uncertain, judgment = %judgment, "Classified response");
        judgment
    }
}

/// Whether `token` occurs in `upper` at least once without a negation
/// directly before it. Occurrences inside longer words count.
fn asserts(upper: &str, token: &str) -> bool {
    upper.match_indices(token).any(|(start, _)| {
        let prefix = &upper[..start];
        !NEGATIONS.iter().any(|neg| prefix.ends_with(neg))
    })
}
