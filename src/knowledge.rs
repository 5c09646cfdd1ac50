//! Pattern/response knowledge base
//!
//! Categories are kept in load order. That order is the tie-break when an
//! utterance satisfies patterns from more than one category: the earliest
//! category wins. The built-in table is ordered:
//!
//! `greetings, name, colors, weather, time, date, creator, capabilities,
//! feelings, thanks, machine_learning, memory`
//!
//! A TOML file lists categories as an array and keeps file order:
//!
//! ```toml
//! [[category]]
//! name = "greetings"
//! patterns = ["hello", "hi"]
//! responses = ["Hello! How can I assist you today?"]
//! ```

use crate::{ParleyError, Result};
use chrono::{DateTime, TimeZone};
use rand::seq::SliceRandom;
use rand::RngCore;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;

/// One intent category: the phrases that trigger it and what to answer
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeEntry {
    pub category: String,
    /// Lowercase substrings, scanned in order
    pub patterns: Vec<String>,
    /// Never empty
    pub responses: Vec<String>,
}

impl KnowledgeEntry {
    /// Pick one response uniformly at random
    pub fn pick_response(&self, rng: &mut dyn RngCore) -> &str {
        // `new` guarantees at least one response
        self.responses
            .choose(rng)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// First pattern contained in an already-lowercased utterance
    pub fn matching_pattern(&self, utterance_lower: &str) -> Option<&str> {
        self.patterns
            .iter()
            .map(String::as_str)
            .find(|p| utterance_lower.contains(p))
    }
}

/// Immutable, ordered set of knowledge entries
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
}

#[derive(Debug, Deserialize)]
struct KnowledgeFile {
    #[serde(default)]
    category: Vec<CategoryToml>,
}

#[derive(Debug, Deserialize)]
struct CategoryToml {
    name: String,
    #[serde(default)]
    patterns: Vec<String>,
    #[serde(default)]
    responses: Vec<String>,
}

impl KnowledgeBase {
    /// Validate and normalize entries. Patterns are trimmed and lowercased.
    pub fn new(entries: Vec<KnowledgeEntry>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(entries.len());

        for entry in entries {
            let category = entry.category.trim().to_string();
            if category.is_empty() {
                return Err(ParleyError::KnowledgeBase(
                    "category name cannot be empty".to_string(),
                ));
            }
            if !seen.insert(category.clone()) {
                return Err(ParleyError::KnowledgeBase(format!(
                    "duplicate category '{}'",
                    category
                )));
            }

            let patterns: Vec<String> = entry
                .patterns
                .iter()
                .map(|p| p.trim().to_lowercase())
                .collect();
            if patterns.is_empty() {
                return Err(ParleyError::KnowledgeBase(format!(
                    "category '{}' has no patterns",
                    category
                )));
            }
            // An empty pattern would match every utterance
            if patterns.iter().any(|p| p.is_empty()) {
                return Err(ParleyError::KnowledgeBase(format!(
                    "category '{}' has an empty pattern",
                    category
                )));
            }
            if entry.responses.is_empty() {
                return Err(ParleyError::KnowledgeBase(format!(
                    "category '{}' has no responses",
                    category
                )));
            }

            normalized.push(KnowledgeEntry {
                category,
                patterns,
                responses: entry.responses,
            });
        }

        Ok(Self {
            entries: normalized,
        })
    }

    /// Parse a `[[category]]` TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: KnowledgeFile = toml::from_str(text)?;
        let entries = file
            .category
            .into_iter()
            .map(|c| KnowledgeEntry {
                category: c.name,
                patterns: c.patterns,
                responses: c.responses,
            })
            .collect();
        Self::new(entries)
    }

    /// Load a knowledge base from a TOML file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        Self::from_toml_str(&content)
    }

    /// The built-in assistant table
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|(category, patterns, responses)| KnowledgeEntry {
                category: category.to_string(),
                patterns: patterns.iter().map(|p| p.to_string()).collect(),
                responses: responses.iter().map(|r| r.to_string()).collect(),
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn get(&self, category: &str) -> Option<&KnowledgeEntry> {
        self.entries.iter().find(|e| e.category == category)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Substitute clock placeholders in a response template.
///
/// `{time}` `{time12}` `{date}` `{date_short}`
pub fn render_response<Tz>(template: &str, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    if !template.contains('{') {
        return template.to_string();
    }
    template
        .replace("{time12}", &now.format("%I:%M %p").to_string())
        .replace("{time}", &now.format("%H:%M:%S").to_string())
        .replace("{date_short}", &now.format("%m/%d/%Y").to_string())
        .replace("{date}", &now.format("%A, %B %d, %Y").to_string())
}

type BuiltinEntry = (&'static str, &'static [&'static str], &'static [&'static str]);

const BUILTIN: &[BuiltinEntry] = &[
    (
        "greetings",
        &["hello", "hi", "hey", "good morning", "good afternoon", "good evening"],
        &[
            "Hello! How can I assist you today?",
            "Hi there! What can I help you with?",
            "Hey! Nice to see you. How can I be of service?",
        ],
    ),
    (
        "name",
        &["what is your name", "who are you", "your name"],
        &[
            "My name is Parley, your virtual assistant!",
            "I'm Parley, here to help you with your queries.",
            "You can call me Parley. I'm your friendly chatbot.",
        ],
    ),
    (
        "colors",
        &["colors", "favorite color", "what colors do you like"],
        &[
            "I'm quite fond of blue and green - they remind me of nature and technology!",
            "I like blue and green. Blue for the sky, green for growth!",
            "My favorites are blue and green - they're calming and refreshing.",
        ],
    ),
    (
        "weather",
        &["weather", "temperature", "forecast"],
        &[
            "Ask me \"weather in <city>\" and I'll look it up for you!",
            "For live conditions, try \"weather in London\".",
            "I can fetch the weather - just say \"weather in\" followed by a city.",
        ],
    ),
    (
        "time",
        &["time", "current time", "what time is it"],
        &["The current time is {time}", "It's {time12} right now"],
    ),
    (
        "date",
        &["date", "today's date", "what day is it"],
        &["Today is {date}", "The date is {date_short}"],
    ),
    (
        "creator",
        &["who made you", "who created you", "your developer"],
        &[
            "I was created by a developer using Rust!",
            "I'm built with Rust, a pattern-matching knowledge base and a sentiment lexicon.",
            "A programmer created me using a handful of Rust crates to make me smart!",
        ],
    ),
    (
        "capabilities",
        &["what can you do", "your abilities", "help me"],
        &[
            "I can chat with you, answer questions, analyze sentiment, tell time/date, and more!",
            "I can: answer questions, detect sentiment in your messages, provide time/date info, and have general conversations!",
            "My capabilities include: keyword understanding, sentiment analysis, basic Q&A, and friendly conversation!",
        ],
    ),
    (
        "feelings",
        &["how are you", "how do you feel", "are you okay"],
        &[
            "I'm functioning perfectly! Thanks for asking.",
            "I'm great! Ready to help you with anything.",
            "I'm just a program, but I'm running smoothly and happy to help!",
        ],
    ),
    (
        "thanks",
        &["thank you", "thanks", "appreciate it"],
        &[
            "You're welcome! Happy to help.",
            "Anytime! Let me know if you need anything else.",
            "Glad I could assist you! 😊",
        ],
    ),
    (
        "machine_learning",
        &["machine learning", "neural network", "ai model", "deep learning"],
        &[
            "I match your words against a knowledge base, so my answers are predictable and auditable!",
            "No neural networks here - I use keyword patterns and a sentiment lexicon.",
            "I keep track of our conversations to provide better assistance.",
        ],
    ),
    (
        "memory",
        &["remember", "memory", "recall", "previous conversation"],
        &[
            "I can remember our recent conversations and use that context to help you better!",
            "My memory system stores our interactions to provide more personalized responses.",
            "I maintain conversation history to understand context and your preferences.",
        ],
    ),
];
