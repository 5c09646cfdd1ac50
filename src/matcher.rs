//! Intent matching over the knowledge base

use crate::knowledge::{KnowledgeBase, KnowledgeEntry};
use std::sync::Arc;

/// Finds the first category whose pattern occurs in an utterance.
///
/// Scans categories in knowledge-base order and, inside each category, its
/// patterns in order. Matching is plain lowercase substring containment.
#[derive(Debug, Clone)]
pub struct IntentMatcher {
    knowledge: Arc<KnowledgeBase>,
}

impl IntentMatcher {
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self { knowledge }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Matching entry for an utterance, or `None` when nothing applies
    pub fn match_intent(&self, utterance: &str) -> Option<&KnowledgeEntry> {
        let lower = utterance.to_lowercase();
        self.knowledge
            .entries()
            .iter()
            .find(|entry| entry.matching_pattern(&lower).is_some())
    }

    /// Category name of the match
    pub fn match_category(&self, utterance: &str) -> Option<&str> {
        self.match_intent(utterance).map(|e| e.category.as_str())
    }
}
