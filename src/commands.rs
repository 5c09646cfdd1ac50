//! Command routing
//!
//! Commands are checked before intent matching, in this order:
//! exit phrases, help phrases, `weather in <city>`, anything mentioning
//! news/headlines, `wikipedia <topic>`, then memory questions.

use std::fmt;

pub const EXIT_PHRASES: &[&str] = &["exit", "quit", "bye", "goodbye"];
pub const HELP_PHRASES: &[&str] = &["help", "commands", "what can you do"];

pub const WEATHER_PREFIX: &str = "weather in";
pub const WIKIPEDIA_PREFIX: &str = "wikipedia";
pub const NEWS_KEYWORDS: &[&str] = &["news", "headlines"];
pub const MEMORY_KEYWORDS: &[&str] = &["remember", "memory"];

pub const DEFAULT_WEATHER_LOCATION: &str = "London";
pub const DEFAULT_WIKIPEDIA_TOPIC: &str = "Artificial Intelligence";
pub const DEFAULT_NEWS_CATEGORY: &str = "general";

/// NewsAPI categories recognised inside a news request
pub const NEWS_CATEGORIES: &[&str] = &[
    "business",
    "entertainment",
    "health",
    "science",
    "sports",
    "technology",
];

pub const FAREWELL: &str = "Goodbye! Thanks for chatting with me. Have a wonderful day! 👋";

pub const COMMANDS_GUIDE: &str = "\
🤖 **Parley Commands Guide** 🤖

**Basic Commands:**
- hello/hi/hey: Start a conversation
- help: Show this help message
- exit/quit/bye: Close the chat

**Questions You Can Ask:**
- What is your name? / Who are you?
- What's your favorite color?
- How are you? / How do you feel?
- What time is it? / What day is it?
- Who created you?
- Thank you / Thanks

**Live Information:**
- Weather in [city]: Get weather information
- Wikipedia [topic]: Get a Wikipedia summary
- News (optionally with a category like sports or technology): Latest headlines

**Memory:**
- My name is [name] / I live in [city]: Tell me about yourself
- What do you remember?: Ask what I know about you
";

/// A routed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    Help,
    Weather(String),
    News(String),
    Wikipedia(String),
    MemoryQuery,
}

impl Command {
    /// Route an utterance; `None` means it goes to intent matching
    pub fn parse(utterance: &str) -> Option<Command> {
        let trimmed = utterance.trim();
        let lower = trimmed.to_lowercase();

        if EXIT_PHRASES.contains(&lower.as_str()) {
            return Some(Command::Exit);
        }
        if HELP_PHRASES.contains(&lower.as_str()) {
            return Some(Command::Help);
        }

        if let Some(location) = strip_prefix_ignore_case(trimmed, WEATHER_PREFIX) {
            return Some(Command::Weather(or_default(location, DEFAULT_WEATHER_LOCATION)));
        }
        if NEWS_KEYWORDS.iter().any(|k| lower.contains(k)) {
            return Some(Command::News(news_category(&lower).to_string()));
        }
        if let Some(topic) = strip_prefix_ignore_case(trimmed, WIKIPEDIA_PREFIX) {
            return Some(Command::Wikipedia(or_default(topic, DEFAULT_WIKIPEDIA_TOPIC)));
        }

        if MEMORY_KEYWORDS.iter().any(|k| lower.contains(k)) {
            return Some(Command::MemoryQuery);
        }

        None
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Exit => "exit",
            Command::Help => "help",
            Command::Weather(_) => "weather",
            Command::News(_) => "news",
            Command::Wikipedia(_) => "wikipedia",
            Command::MemoryQuery => "memory",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Weather(arg) | Command::News(arg) | Command::Wikipedia(arg) => {
                write!(f, "{}({})", self.name(), arg)
            }
            _ => write!(f, "{}", self.name()),
        }
    }
}

/// Text after an ASCII prefix, compared case-insensitively
fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&text[prefix.len()..])
    } else {
        None
    }
}

fn or_default(arg: &str, default: &str) -> String {
    let arg = arg.trim();
    if arg.is_empty() {
        default.to_string()
    } else {
        arg.to_string()
    }
}

fn news_category(lower: &str) -> &'static str {
    lower
        .split(|c: char| !c.is_alphanumeric())
        .find_map(|word| NEWS_CATEGORIES.iter().find(|c| **c == word).copied())
        .unwrap_or(DEFAULT_NEWS_CATEGORY)
}
