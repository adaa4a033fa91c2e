//! Contract types for the background-quality classification collaborator.
//!
//! The vision service is invoked elsewhere; this crate only pins down the
//! shape of its answer and a parser that never fails. Models drift between
//! well-formed JSON, JSON wrapped in prose, and plain free text, so the
//! parser degrades step by step instead of erroring.

use serde::{Deserialize, Serialize};

/// Longest rationale kept from a free-text response.
pub const MAX_RATIONALE_LEN: usize = 280;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Good,
    Bad,
    #[default]
    Unknown,
}

/// One image's structured judgment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Judgment {
    #[serde(default)]
    pub foreground: String,
    #[serde(default)]
    pub background: String,
    #[serde(default)]
    pub classification: Verdict,
    #[serde(default)]
    pub rationale: String,
}

impl Judgment {
    /// Parse a raw service response, never failing.
    ///
    /// Strict JSON first, then the outermost `{...}` span embedded in
    /// prose, and finally an `Unknown` verdict carrying the truncated raw
    /// text as rationale.
    pub fn parse(raw: &str) -> Judgment {
        if let Ok(judgment) = serde_json::from_str::<Judgment>(raw.trim()) {
            return judgment;
        }
        if let Some(snippet) = embedded_object(raw) {
            if let Ok(judgment) = serde_json::from_str::<Judgment>(snippet) {
                return judgment;
            }
        }
        Judgment {
            rationale: truncate(raw, MAX_RATIONALE_LEN),
            ..Judgment::default()
        }
    }
}

fn embedded_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

fn truncate(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        trimmed.to_string()
    } else {
        trimmed.chars().take(max_chars).collect()
    }
}
