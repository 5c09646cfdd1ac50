//! Context clue extraction from raw utterances

use regex::Regex;
use serde::{Deserialize, Serialize};

const NAME_MARKER: &str = "my name is";
const LOCATION_MARKER: &str = "i live in";

/// Structured facts inferred from one utterance. Values are never empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextClues {
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "user_name")]
    pub user_name: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "user_location"
    )]
    pub user_location: Option<String>,
}

impl ContextClues {
    pub fn is_empty(&self) -> bool {
        self.user_name.is_none() && self.user_location.is_none()
    }
}

/// How strictly a marker phrase must be placed to count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClueMatching {
    /// Marker anywhere in the text, "i live in" inside any sentence counts
    #[default]
    Loose,
    /// Marker must open the utterance or a sentence and sit on word boundaries
    Strict,
}

/// Derives name and location clues from utterance text
#[derive(Debug, Clone)]
pub struct ContextExtractor {
    mode: ClueMatching,
    strict_name: Regex,
    strict_location: Regex,
}

impl ContextExtractor {
    pub fn new(mode: ClueMatching) -> Self {
        Self {
            mode,
            strict_name: Self::compile_strict(NAME_MARKER),
            strict_location: Self::compile_strict(LOCATION_MARKER),
        }
    }

    fn compile_strict(marker: &str) -> Regex {
        let pattern = format!(r"(?:^|[.!?,;])\s*{}\b", regex::escape(marker));
        Regex::new(&pattern).expect("marker pattern is a valid regex")
    }

    pub fn mode(&self) -> ClueMatching {
        self.mode
    }

    /// Extract clues; each marker is evaluated independently
    pub fn extract(&self, utterance: &str) -> ContextClues {
        let lower = utterance.to_lowercase();
        ContextClues {
            user_name: self.value_after(&lower, NAME_MARKER, &self.strict_name),
            user_location: self.value_after(&lower, LOCATION_MARKER, &self.strict_location),
        }
    }

    /// Text after the last accepted occurrence of `marker`, title-cased
    fn value_after(&self, lower: &str, marker: &str, strict: &Regex) -> Option<String> {
        let start = match self.mode {
            ClueMatching::Loose => lower.rfind(marker).map(|i| i + marker.len()),
            ClueMatching::Strict => strict.find_iter(lower).last().map(|m| m.end()),
        }?;
        let value = lower[start..].trim();
        if value.is_empty() {
            None
        } else {
            Some(title_case(value))
        }
    }
}

impl Default for ContextExtractor {
    fn default() -> Self {
        Self::new(ClueMatching::Loose)
    }
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}
