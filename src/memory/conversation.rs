//! Bounded conversation memory with write-through persistence

use super::extractor::{ContextClues, ContextExtractor};
use super::store::{MemorySnapshot, MemoryStore};
use crate::sentiment::normalize_score;
use crate::Result;
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// One completed turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,

    #[serde(alias = "user_message")]
    pub user_message: String,

    #[serde(alias = "bot_response")]
    pub bot_response: String,

    pub sentiment: f32,

    #[serde(default, alias = "context_clues")]
    pub context_clues: ContextClues,
}

/// What the user has told us about themselves
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "user_name")]
    pub user_name: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "user_location"
    )]
    pub user_location: Option<String>,
}

impl UserContext {
    pub fn is_empty(&self) -> bool {
        self.user_name.is_none() && self.user_location.is_none()
    }

    /// Last write wins per key; absent clues leave known values alone
    pub fn apply(&mut self, clues: &ContextClues) {
        if let Some(name) = &clues.user_name {
            self.user_name = Some(name.clone());
        }
        if let Some(location) = &clues.user_location {
            self.user_location = Some(location.clone());
        }
    }
}

/// Accepts RFC 3339 and naive ISO-8601 (read as UTC)
fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Capacity-bounded interaction log plus the derived user context.
///
/// Every mutation is flushed to the store before the call returns. Eviction
/// is FIFO by insertion order.
pub struct ConversationMemory {
    interactions: VecDeque<Interaction>,
    user_context: UserContext,
    max_size: usize,
    extractor: ContextExtractor,
    store: Box<dyn MemoryStore>,
}

impl ConversationMemory {
    /// Load memory from `store`. A missing or unreadable record starts empty.
    pub async fn open(
        store: Box<dyn MemoryStore>,
        max_size: usize,
        extractor: ContextExtractor,
    ) -> Self {
        let max_size = max_size.max(1);
        let snapshot = match store.load().await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                debug!("No stored conversation memory, starting fresh");
                MemorySnapshot::default()
            }
            Err(e) => {
                warn!("Failed to load conversation memory, starting fresh: {}", e);
                MemorySnapshot::default()
            }
        };

        let mut interactions: VecDeque<Interaction> = snapshot.memory.into();
        while interactions.len() > max_size {
            interactions.pop_front();
        }
        info!(
            "Conversation memory ready: {} interactions (capacity {})",
            interactions.len(),
            max_size
        );

        Self {
            interactions,
            user_context: snapshot.user_context,
            max_size,
            extractor,
            store,
        }
    }

    /// Record a finished turn.
    ///
    /// Append, eviction and context update are applied together, then the
    /// full record is persisted once. Save failures are logged, not returned.
    pub async fn add_interaction(&mut self, user_message: &str, bot_response: &str, sentiment: f32) {
        let context_clues = self.extractor.extract(user_message);
        let interaction = Interaction {
            timestamp: Utc::now(),
            user_message: user_message.to_string(),
            bot_response: bot_response.to_string(),
            sentiment: normalize_score(sentiment),
            context_clues,
        };

        self.user_context.apply(&interaction.context_clues);
        self.interactions.push_back(interaction);
        while self.interactions.len() > self.max_size {
            self.interactions.pop_front();
        }

        if let Err(e) = self.save().await {
            warn!("Failed to save conversation memory: {}", e);
        }
    }

    /// Interactions newer than `lookback_minutes` ago
    pub fn recent_context(&self, lookback_minutes: i64) -> impl Iterator<Item = &Interaction> + '_ {
        self.recent_context_at(Utc::now(), lookback_minutes)
    }

    pub fn recent_context_at(
        &self,
        now: DateTime<Utc>,
        lookback_minutes: i64,
    ) -> impl Iterator<Item = &Interaction> + '_ {
        // A window reaching past the representable range has no cutoff
        let cutoff = Duration::try_minutes(lookback_minutes)
            .and_then(|lookback| now.checked_sub_signed(lookback));
        self.interactions
            .iter()
            .filter(move |i| cutoff.map_or(true, |cutoff| i.timestamp > cutoff))
    }

    pub fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot {
            memory: self.interactions.iter().cloned().collect(),
            user_context: self.user_context.clone(),
        }
    }

    /// Persist the full record
    pub async fn save(&self) -> Result<()> {
        self.store.save(&self.snapshot()).await
    }

    /// Forget everything, including the user context
    pub async fn reset(&mut self) -> Result<()> {
        self.interactions.clear();
        self.user_context = UserContext::default();
        info!("Conversation memory reset");
        self.save().await
    }

    pub fn interactions(&self) -> impl Iterator<Item = &Interaction> + '_ {
        self.interactions.iter()
    }

    pub fn user_context(&self) -> &UserContext {
        &self.user_context
    }

    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}
