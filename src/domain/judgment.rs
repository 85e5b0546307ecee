//! Judgment-related domain types.
//!
//! A judgment is the stance one provider took on a claim. A verdict is the
//! consensus outcome across providers, and only ever takes one of the three
//! substantive values.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-provider classified stance on a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Judgment {
    /// The provider asserted the claim is true.
    True,
    /// The provider asserted the claim is false.
    False,
    /// The provider could not commit either way.
    Uncertain,
    /// The provider declared the question paradoxical or unanswerable.
    Recuse,
    /// The provider declined on safety or policy grounds.
    PolicyLimited,
}

impl Judgment {
    /// Whether this judgment takes part in the substantive tally.
    pub fn is_substantive(&self) -> bool {
        !matches!(self, Judgment::Recuse | Judgment::PolicyLimited)
    }

    /// The verdict this judgment corresponds to, if it is substantive.
    pub fn as_verdict(&self) -> Option<Verdict> {
        match self {
            Judgment::True => Some(Verdict::True),
            Judgment::False => Some(Verdict::False),
            Judgment::Uncertain => Some(Verdict::Uncertain),
            Judgment::Recuse | Judgment::PolicyLimited => None,
        }
    }
}

impl std::fmt::Display for Judgment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Judgment::True => write!(f, "TRUE"),
            Judgment::False => write!(f, "FALSE"),
            Judgment::Uncertain => write!(f, "UNCERTAIN"),
            Judgment::Recuse => write!(f, "RECUSE"),
            Judgment::PolicyLimited => write!(f, "POLICY_LIMITED"),
        }
    }
}

/// Final three-way consensus outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    True,
    False,
    Uncertain,
}

impl Verdict {
    /// The per-provider judgment that agrees with this verdict.
    pub fn as_judgment(&self) -> Judgment {
        match self {
            Verdict::True => Judgment::True,
            Verdict::False => Judgment::False,
            Verdict::Uncertain => Judgment::Uncertain,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_judgment().fmt(f)
    }
}

/// Coarse bucket for a confidence percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum ConfidenceLevel {
    #[serde(rename = "VERY LOW")]
    VeryLow,
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "VERY HIGH")]
    VeryHigh,
}

impl ConfidenceLevel {
    /// Bucket a rounded confidence percentage.
    pub fn from_percentage(percentage: u8) -> Self {
        match percentage {
            90.. => ConfidenceLevel::VeryHigh,
            70..=89 => ConfidenceLevel::High,
            50..=69 => ConfidenceLevel::Medium,
            30..=49 => ConfidenceLevel::Low,
            _ => ConfidenceLevel::VeryLow,
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfidenceLevel::VeryLow => write!(f, "VERY LOW"),
            ConfidenceLevel::Low => write!(f, "LOW"),
            ConfidenceLevel::Medium => write!(f, "MEDIUM"),
            ConfidenceLevel::High => write!(f, "HIGH"),
            ConfidenceLevel::VeryHigh => write!(f, "VERY HIGH"),
        }
    }
}
