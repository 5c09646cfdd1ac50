//! Response selection policy
//!
//! One utterance in, one response out. Routing order, first match wins:
//!
//! 1. exit phrases (also requests shutdown)
//! 2. help phrases
//! 3. weather / news / wikipedia via the knowledge gateway
//! 4. memory questions
//! 5. knowledge-base intent, prefixed with the user's name when known
//! 6. sentiment-toned fallback
//!
//! Whatever the route, the turn is recorded in conversation memory exactly
//! once, with the sentiment score computed at the start of the turn.

use crate::commands::{Command, COMMANDS_GUIDE, FAREWELL};
use crate::gateway::{call_with_timeout, GatewayService, KnowledgeGateway};
use crate::knowledge::render_response;
use crate::matcher::IntentMatcher;
use crate::memory::ConversationMemory;
use crate::sentiment::{normalize_score, SentimentScorer};
use crate::{Result, DEFAULT_GATEWAY_TIMEOUT};
use chrono::Local;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Scores above this get an upbeat fallback
pub const POSITIVE_THRESHOLD: f32 = 0.3;
/// Scores below this get a sympathetic fallback
pub const NEGATIVE_THRESHOLD: f32 = -0.3;

pub const POSITIVE_OPENER: &str = "That's wonderful! ";
pub const NEGATIVE_OPENER: &str = "I understand this might be frustrating. ";

pub const FALLBACK_RESPONSES: &[&str] = &[
    "I'm not sure I understand. Could you rephrase that?",
    "That's an interesting question! I'm still learning though.",
    "I don't have information about that yet. Try asking something else!",
    "Hmm, I'm not programmed to answer that. Maybe ask me about my capabilities?",
    "I'm still learning! Could you try a different question?",
];

pub const EMPTY_MEMORY_REPLY: &str =
    "I don't have much memory of our conversation yet. Keep chatting with me!";

/// Turns utterances into responses for a single conversation
pub struct ResponseSelector {
    matcher: IntentMatcher,
    memory: ConversationMemory,
    scorer: Box<dyn SentimentScorer>,
    gateway: Arc<dyn KnowledgeGateway>,
    rng: Box<dyn RngCore + Send>,
    gateway_timeout: Duration,
    shutdown: bool,
}

impl ResponseSelector {
    pub fn new(
        matcher: IntentMatcher,
        memory: ConversationMemory,
        scorer: Box<dyn SentimentScorer>,
        gateway: Arc<dyn KnowledgeGateway>,
    ) -> Self {
        Self {
            matcher,
            memory,
            scorer,
            gateway,
            rng: Box::new(StdRng::from_entropy()),
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
            shutdown: false,
        }
    }

    /// Replace the randomness source used for response picks
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_gateway_timeout(mut self, timeout: Duration) -> Self {
        self.gateway_timeout = timeout;
        self
    }

    /// Answer one utterance and record the turn
    pub async fn handle_turn(&mut self, utterance: &str) -> String {
        let utterance = utterance.trim();
        let sentiment = normalize_score(self.scorer.score(utterance));
        let response = self.respond(utterance, sentiment).await;
        self.memory
            .add_interaction(utterance, &response, sentiment)
            .await;
        response
    }

    /// Set once an exit phrase has been answered
    pub fn shutdown_requested(&self) -> bool {
        self.shutdown
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn matcher(&self) -> &IntentMatcher {
        &self.matcher
    }

    pub async fn reset_memory(&mut self) -> Result<()> {
        self.memory.reset().await
    }

    async fn respond(&mut self, utterance: &str, sentiment: f32) -> String {
        if let Some(command) = Command::parse(utterance) {
            debug!("Routing to command {}", command);
            return self.run_command(command).await;
        }

        let prefix = self.personalized_prefix();
        if let Some(entry) = self.matcher.match_intent(utterance) {
            debug!("Matched intent {}", entry.category);
            let chosen = entry.pick_response(&mut *self.rng);
            return format!("{}{}", prefix, render_response(chosen, &Local::now()));
        }

        debug!("No intent matched, sentiment {:.2}", sentiment);
        self.fallback(&prefix, sentiment)
    }

    async fn run_command(&mut self, command: Command) -> String {
        let timeout = self.gateway_timeout;
        match command {
            Command::Exit => {
                self.shutdown = true;
                FAREWELL.to_string()
            }
            Command::Help => COMMANDS_GUIDE.to_string(),
            Command::Weather(location) => {
                call_with_timeout(
                    GatewayService::Weather,
                    timeout,
                    self.gateway.weather(&location),
                )
                .await
            }
            Command::News(category) => {
                call_with_timeout(
                    GatewayService::News,
                    timeout,
                    self.gateway.news_headlines(&category),
                )
                .await
            }
            Command::Wikipedia(topic) => {
                call_with_timeout(
                    GatewayService::Wikipedia,
                    timeout,
                    self.gateway.wikipedia_summary(&topic),
                )
                .await
            }
            Command::MemoryQuery => self.memory_summary(),
        }
    }

    fn personalized_prefix(&self) -> String {
        match &self.memory.user_context().user_name {
            Some(name) => format!("By the way {}, ", name),
            None => String::new(),
        }
    }

    fn memory_summary(&self) -> String {
        let context = self.memory.user_context();
        let count = self.memory.len();
        if context.is_empty() && count == 0 {
            return EMPTY_MEMORY_REPLY.to_string();
        }

        let mut reply = format!("I remember our last {} conversations", count);
        if let Some(name) = &context.user_name {
            reply.push_str(&format!(" and that your name is {}", name));
        }
        if let Some(location) = &context.user_location {
            reply.push_str(&format!(" and you live in {}", location));
        }
        reply.push_str("! 😊");
        reply
    }

    fn fallback(&mut self, prefix: &str, sentiment: f32) -> String {
        let opener = if sentiment > POSITIVE_THRESHOLD {
            POSITIVE_OPENER
        } else if sentiment < NEGATIVE_THRESHOLD {
            NEGATIVE_OPENER
        } else {
            ""
        };
        let pick = FALLBACK_RESPONSES
            .choose(&mut *self.rng)
            .copied()
            .unwrap_or(FALLBACK_RESPONSES[0]);
        format!("{}{}{}", prefix, opener, pick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{KnowledgeBase, KnowledgeEntry};
    use crate::memory::{ContextExtractor, InMemoryStore};
    use crate::sentiment::FixedScorer;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubGateway {
        calls: Mutex<Vec<String>>,
    }

    impl StubGateway {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl KnowledgeGateway for StubGateway {
        async fn weather(&self, location: &str) -> String {
            self.calls.lock().unwrap().push(format!("weather:{}", location));
            "Sunny, 20C".to_string()
        }

        async fn wikipedia_summary(&self, topic: &str) -> String {
            self.calls.lock().unwrap().push(format!("wikipedia:{}", topic));
            format!("About {}", topic)
        }

        async fn news_headlines(&self, category: &str) -> String {
            self.calls.lock().unwrap().push(format!("news:{}", category));
            "Headlines".to_string()
        }
    }

    struct SlowGateway;

    #[async_trait]
    impl KnowledgeGateway for SlowGateway {
        async fn weather(&self, _location: &str) -> String {
            tokio::time::sleep(Duration::from_secs(10)).await;
            "late".to_string()
        }

        async fn wikipedia_summary(&self, _topic: &str) -> String {
            tokio::time::sleep(Duration::from_secs(10)).await;
            "late".to_string()
        }

        async fn news_headlines(&self, _category: &str) -> String {
            tokio::time::sleep(Duration::from_secs(10)).await;
            "late".to_string()
        }
    }

    struct CountingScorer {
        calls: Arc<AtomicUsize>,
        score: f32,
    }

    impl SentimentScorer for CountingScorer {
        fn score(&self, _text: &str) -> f32 {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.score
        }
    }

    struct NanScorer;

    impl SentimentScorer for NanScorer {
        fn score(&self, _text: &str) -> f32 {
            f32::NAN
        }
    }

    fn greetings_only() -> KnowledgeBase {
        KnowledgeBase::new(vec![KnowledgeEntry {
            category: "greetings".to_string(),
            patterns: vec!["hello".to_string()],
            responses: vec!["Hello!".to_string(), "Hi there!".to_string()],
        }])
        .unwrap()
    }

    async fn selector_with(
        knowledge: KnowledgeBase,
        scorer: Box<dyn SentimentScorer>,
        gateway: Arc<dyn KnowledgeGateway>,
    ) -> ResponseSelector {
        let memory = ConversationMemory::open(
            Box::new(InMemoryStore::new()),
            100,
            ContextExtractor::default(),
        )
        .await;
        ResponseSelector::new(
            IntentMatcher::new(Arc::new(knowledge)),
            memory,
            scorer,
            gateway,
        )
        .with_seed(42)
    }

    async fn neutral_selector() -> ResponseSelector {
        selector_with(
            KnowledgeBase::builtin(),
            Box::new(FixedScorer(0.0)),
            Arc::new(StubGateway::default()),
        )
        .await
    }

    #[tokio::test]
    async fn test_weather_reply_is_gateway_text_verbatim() {
        let gateway = Arc::new(StubGateway::default());
        let mut selector =
            selector_with(KnowledgeBase::builtin(), Box::new(FixedScorer(0.0)), gateway.clone())
                .await;

        let reply = selector.handle_turn("weather in Tokyo").await;
        assert_eq!(reply, "Sunny, 20C");
        assert_eq!(selector.memory().len(), 1);
        assert_eq!(gateway.calls(), vec!["weather:Tokyo".to_string()]);
    }

    #[tokio::test]
    async fn test_gateway_defaults_and_categories() {
        let gateway = Arc::new(StubGateway::default());
        let mut selector =
            selector_with(KnowledgeBase::builtin(), Box::new(FixedScorer(0.0)), gateway.clone())
                .await;

        selector.handle_turn("weather in").await;
        selector.handle_turn("wikipedia").await;
        selector.handle_turn("technology news please").await;
        assert_eq!(
            gateway.calls(),
            vec![
                "weather:London".to_string(),
                "wikipedia:Artificial Intelligence".to_string(),
                "news:technology".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_gateway_timeout_becomes_unavailable_text() {
        let mut selector = selector_with(
            KnowledgeBase::builtin(),
            Box::new(FixedScorer(0.0)),
            Arc::new(SlowGateway),
        )
        .await
        .with_gateway_timeout(Duration::from_millis(20));

        let reply = selector.handle_turn("wikipedia Rust").await;
        assert_eq!(reply, GatewayService::Wikipedia.unavailable_message());
        assert_eq!(selector.memory().len(), 1);
        assert!(!selector.shutdown_requested());
    }

    #[tokio::test]
    async fn test_known_name_personalizes_intent_reply() {
        let mut selector = neutral_selector().await;
        selector.handle_turn("my name is Bob").await;

        let reply = selector.handle_turn("hello").await;
        let rest = reply
            .strip_prefix("By the way Bob, ")
            .expect("reply should be personalized");
        let greetings = selector.matcher().knowledge().get("greetings").unwrap();
        assert!(greetings.responses.iter().any(|r| r == rest), "reply={}", reply);
    }

    #[tokio::test]
    async fn test_exit_requests_shutdown_and_is_recorded() {
        let mut selector = neutral_selector().await;
        assert!(!selector.shutdown_requested());

        let reply = selector.handle_turn("Goodbye").await;
        assert_eq!(reply, FAREWELL);
        assert!(selector.shutdown_requested());
        assert_eq!(selector.memory().len(), 1);
    }

    #[tokio::test]
    async fn test_help_returns_guide() {
        let mut selector = neutral_selector().await;
        assert_eq!(selector.handle_turn("help").await, COMMANDS_GUIDE);
        assert_eq!(selector.handle_turn("what can you do").await, COMMANDS_GUIDE);
    }

    #[tokio::test]
    async fn test_memory_summary() {
        let mut selector = neutral_selector().await;
        assert_eq!(selector.handle_turn("do you remember me?").await, EMPTY_MEMORY_REPLY);

        let mut selector = neutral_selector().await;
        selector.handle_turn("my name is bob").await;
        selector.handle_turn("i live in paris").await;
        assert_eq!(
            selector.handle_turn("what do you remember about me?").await,
            "I remember our last 2 conversations and that your name is Bob and you live in Paris! 😊"
        );
    }

    #[tokio::test]
    async fn test_fallback_thresholds_are_strict() {
        async fn reply_for(score: f32) -> String {
            let mut selector = selector_with(
                greetings_only(),
                Box::new(FixedScorer(score)),
                Arc::new(StubGateway::default()),
            )
            .await;
            selector.handle_turn("purple elephants").await
        }

        for neutral in [0.3, -0.3, 0.0] {
            let reply = reply_for(neutral).await;
            assert!(FALLBACK_RESPONSES.contains(&reply.as_str()), "score {} gave {}", neutral, reply);
        }

        let reply = reply_for(0.31).await;
        let rest = reply.strip_prefix(POSITIVE_OPENER).unwrap();
        assert!(FALLBACK_RESPONSES.contains(&rest));

        let reply = reply_for(-0.31).await;
        let rest = reply.strip_prefix(NEGATIVE_OPENER).unwrap();
        assert!(FALLBACK_RESPONSES.contains(&rest));
    }

    #[tokio::test]
    async fn test_fallback_is_personalized() {
        let mut selector = selector_with(
            greetings_only(),
            Box::new(FixedScorer(-0.9)),
            Arc::new(StubGateway::default()),
        )
        .await;
        selector.handle_turn("my name is zoe").await;
        let reply = selector.handle_turn("everything is awful").await;
        assert!(
            reply.starts_with(&format!("By the way Zoe, {}", NEGATIVE_OPENER)),
            "reply={}",
            reply
        );
    }

    #[tokio::test]
    async fn test_sentiment_scored_once_per_turn_on_every_route() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scorer = CountingScorer {
            calls: calls.clone(),
            score: 0.5,
        };
        let mut selector = selector_with(
            KnowledgeBase::builtin(),
            Box::new(scorer),
            Arc::new(StubGateway::default()),
        )
        .await;

        for utterance in ["help", "weather in Rome", "remember me?", "hello", "zzz", "bye"] {
            selector.handle_turn(utterance).await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 6);
        assert_eq!(selector.memory().len(), 6);
        assert!(selector.memory().interactions().all(|i| i.sentiment == 0.5));
    }

    #[tokio::test]
    async fn test_non_finite_sentiment_is_recorded_as_neutral() {
        let mut selector = selector_with(
            greetings_only(),
            Box::new(NanScorer),
            Arc::new(StubGateway::default()),
        )
        .await;

        let reply = selector.handle_turn("zzz").await;
        assert!(FALLBACK_RESPONSES.contains(&reply.as_str()), "reply={}", reply);
        assert!(selector.memory().interactions().all(|i| i.sentiment == 0.0));
    }

    #[tokio::test]
    async fn test_seeded_selectors_agree() {
        let mut a = neutral_selector().await;
        let mut b = neutral_selector().await;
        for utterance in ["hello", "thanks", "who are you", "qwerty"] {
            assert_eq!(a.handle_turn(utterance).await, b.handle_turn(utterance).await);
        }
    }

    #[tokio::test]
    async fn test_clock_placeholders_are_rendered() {
        let mut selector = neutral_selector().await;
        let reply = selector.handle_turn("what time is it").await;
        assert!(!reply.contains('{'), "reply={}", reply);
        let reply = selector.handle_turn("what day is it").await;
        assert!(!reply.contains('{'), "reply={}", reply);
    }
}
