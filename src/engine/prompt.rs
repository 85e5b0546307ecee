//! Query preprocessing - turns a user claim into the provider prompt.

use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::config::QueryConfig;

/// Instruction prepended to every claim sent to providers.
pub const PROMPT_PREFIX: &str =
    "This is a consensus request for a TRUE, FALSE or UNCERTAIN response: ";

/// A claim ready to be sent to providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparedQuery {
    /// The claim as the user submitted it (trimmed).
    pub query: String,
    /// The full prompt sent to providers.
    pub structured_query: String,
}

/// Strips filler phrases and applies synonyms before building the prompt.
pub struct QueryPreprocessor {
    removals: Vec<Regex>,
    synonyms: Vec<(Regex, String)>,
}

impl QueryPreprocessor {
    pub fn new(config: &QueryConfig) -> Self {
        let removals = config
            .removal_phrases
            .iter()
            .filter(|p| !p.trim().is_empty())
            .filter_map(|p| case_insensitive(&regex::escape(p.trim())))
            .collect();

        let synonyms = sorted_synonyms(&config.synonyms)
            .into_iter()
            .filter_map(|(word, replacement)| {
                case_insensitive(&format!(r"\b{}\b", regex::escape(word)))
                    .map(|re| (re, replacement.to_string()))
            })
            .collect();

        Self { removals, synonyms }
    }

    /// Build the provider prompt for a raw claim.
    pub fn prepare(&self, raw_query: &str) -> PreparedQuery {
        let query = raw_query.trim().to_string();

        let mut text = query.clone();
        for re in &self.removals {
            text = re.replace_all(&text, "").into_owned();
        }
        tracing::debug!(text = %text, "After phrase removal");

        for (re, replacement) in &self.synonyms {
            text = re.replace_all(&text, replacement.as_str()).into_owned();
        }
        tracing::debug!(text = %text, "After synonym replacement");

        let words: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
        let structured_query = format!("{}{}", PROMPT_PREFIX, words.join(" "));

        PreparedQuery {
            query,
            structured_query,
        }
    }
}

/// Longest words first so multi-word entries win over their parts.
fn sorted_synonyms(synonyms: &BTreeMap<String, String>) -> Vec<(&str, &str)> {
    let mut entries: Vec<(&str, &str)> = synonyms
        .iter()
        .filter(|(word, _)| !word.trim().is_empty())
        .map(|(w, r)| (w.as_str(), r.as_str()))
        .collect();
    entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(b.0)));
    entries
}

fn case_insensitive(pattern: &str) -> Option<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| tracing::warn!(pattern = %pattern, error = %e, "Skipping invalid query pattern"))
        .ok()
}
