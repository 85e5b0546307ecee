//! Opt-out Detector - recognizes non-answers before classification.
//!
//! Two kinds of non-answer are excluded from the substantive tally:
//! recusals (the model calls the question paradoxical or unanswerable) and
//! policy refusals (the model declines on safety grounds). Recusal is
//! checked first; either match pre-empts the TRUE/FALSE classifier.

use regex::{Regex, RegexBuilder};

/// Phrases signaling the model considers the question unanswerable.
pub const RECUSAL_PATTERNS: &[&str] = &[
    r"paradox",
    r"self-referential",
    r"category error",
    r"cannot be definitively labeled",
    r"inherently unanswerable",
    r"unanswerable by design",
    r"philosophical objection",
    r"recuse",
];

/// Phrases signaling a refusal on safety or policy grounds.
pub const POLICY_PATTERNS: &[&str] = &[
    r"i (?:don't|don’t|do not) feel comfortable",
    r"i apologize\b.*\bcannot",
    r"not appropriate to discuss",
    r"recommend consulting",
    r"please consult official sources",
    r"policy_limited",
];

/// Outcome of opt-out detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptOutOutcome {
    /// The response takes a stance and should be classified.
    Substantive,
    /// The model recused itself.
    Recused { pattern: String },
    /// The model declined on policy grounds.
    PolicyLimited { pattern: String },
}

impl OptOutOutcome {
    /// The pattern that matched, if any.
    pub fn pattern(&self) -> Option<&str> {
        match self {
            OptOutOutcome::Substantive => None,
            OptOutOutcome::Recused { pattern } | OptOutOutcome::PolicyLimited { pattern } => {
                Some(pattern)
            }
        }
    }
}

/// Trait for opt-out detector implementations.
pub trait OptOutDetector: Send + Sync {
    /// Inspect normalized response text for a recusal or policy refusal.
    fn detect(&self, text: &str) -> OptOutOutcome;
}

/// A compiled pattern together with its source, for reporting.
#[derive(Debug, Clone)]
struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    fn compile(source: &str) -> Option<Self> {
        RegexBuilder::new(source)
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| tracing::warn!(pattern = %source, error = %e, "Skipping invalid opt-out pattern"))
            .ok()
            .map(|regex| Self {
                source: source.to_string(),
                regex,
            })
    }

    fn literal(phrase: &str) -> Option<Self> {
        let phrase = phrase.trim();
        if phrase.is_empty() {
            return None;
        }
        Self::compile(&regex::escape(phrase)).map(|p| Self {
            source: phrase.to_string(),
            ..p
        })
    }
}

/// Phrase-based opt-out detector.
///
/// Built-in patterns are case-insensitive regexes; extra phrases from
/// configuration are matched as literal substrings.
pub struct PhraseOptOutDetector {
    recusal: Vec<Pattern>,
    policy: Vec<Pattern>,
}

impl PhraseOptOutDetector {
    /// Create a detector with the built-in patterns plus extra literal phrases.
    pub fn new(extra_recusal: &[String], extra_policy: &[String]) -> Self {
        let recusal = RECUSAL_PATTERNS
            .iter()
            .filter_map(|p| Pattern::compile(p))
            .chain(extra_recusal.iter().filter_map(|p| Pattern::literal(p)))
            .collect();

        let policy = POLICY_PATTERNS
            .iter()
            .filter_map(|p| Pattern::compile(p))
            .chain(extra_policy.iter().filter_map(|p| Pattern::literal(p)))
            .collect();

        Self { recusal, policy }
    }

    fn first_match<'a>(patterns: &'a [Pattern], text: &str) -> Option<&'a Pattern> {
        patterns.iter().find(|p| p.regex.is_match(text))
    }
}

impl Default for PhraseOptOutDetector {
    fn default() -> Self {
        Self::new(&[], &[])
    }
}

impl OptOutDetector for PhraseOptOutDetector {
    fn detect(&self, text: &str) -> OptOutOutcome {
        if let Some(p) = Self::first_match(&self.recusal, text) {
            return OptOutOutcome::Recused {
                pattern: p.source.clone(),
            };
        }

        if let Some(p) = Self::first_match(&self.policy, text) {
            return OptOutOutcome::PolicyLimited {
                pattern: p.source.clone(),
            };
        }

        OptOutOutcome::Substantive
    }
}
