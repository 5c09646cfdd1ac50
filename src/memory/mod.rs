//! Memory module for Parley
//!
//! Provides context clue extraction, the bounded conversation log, and the
//! storage port it persists through.

mod conversation;
mod extractor;
mod store;

pub use conversation::{ConversationMemory, Interaction, UserContext};
pub use extractor::{title_case, ClueMatching, ContextClues, ContextExtractor};
pub use store::{InMemoryStore, JsonFileStore, MemorySnapshot, MemoryStore};
