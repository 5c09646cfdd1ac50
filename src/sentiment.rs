//! Sentiment polarity scoring
//!
//! The engine only needs a polarity in [-1, 1]. `LexiconScorer` is a
//! word-level heuristic good enough to pick the tone of a fallback reply.

/// Polarity of a text, in [-1, 1]
pub trait SentimentScorer: Send + Sync {
    fn score(&self, text: &str) -> f32;
}

/// Always returns the same score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedScorer(pub f32);

impl SentimentScorer for FixedScorer {
    fn score(&self, _text: &str) -> f32 {
        normalize_score(self.0)
    }
}

/// Clamp into [-1, 1]; NaN and infinities become neutral
pub fn normalize_score(score: f32) -> f32 {
    if score.is_finite() {
        score.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "awesome", "amazing", "excellent", "wonderful", "fantastic", "brilliant",
    "beautiful", "love", "lovely", "like", "happy", "glad", "nice", "perfect", "cool", "fun",
    "best", "superb", "delighted", "pleased", "excited", "helpful", "thank", "thanks", "enjoy",
    "win", "success",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "horrible", "worst", "hate", "angry", "sad", "upset", "annoying",
    "annoyed", "frustrated", "frustrating", "broken", "wrong", "stupid", "useless", "boring",
    "disappointing", "disappointed", "confused", "stuck", "fail", "failed", "problem", "pain",
    "sucks", "poor", "ugly",
];

const INTENSIFIERS: &[&str] = &["very", "really", "so", "extremely", "super", "totally"];

const NEGATORS: &[&str] = &[
    "not", "no", "never", "don't", "dont", "isn't", "isnt", "wasn't", "can't", "cannot", "won't",
];

/// Positive/negative word lexicon with negation and intensifiers
#[derive(Debug, Clone, Default)]
pub struct LexiconScorer;

impl LexiconScorer {
    pub fn new() -> Self {
        Self
    }

    fn polarity(word: &str) -> f32 {
        if POSITIVE_WORDS.contains(&word) {
            1.0
        } else if NEGATIVE_WORDS.contains(&word) {
            -1.0
        } else {
            0.0
        }
    }
}

impl SentimentScorer for LexiconScorer {
    fn score(&self, text: &str) -> f32 {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|w| !w.is_empty())
            .collect();

        let mut total = 0.0f32;
        let mut hits = 0usize;
        let mut negate = false;
        let mut boost = 1.0f32;

        for word in &words {
            if NEGATORS.contains(word) {
                negate = true;
                continue;
            }
            if INTENSIFIERS.contains(word) {
                boost = 1.5;
                continue;
            }

            let polarity = Self::polarity(word);
            if polarity != 0.0 {
                let signed = if negate { -0.5 * polarity } else { polarity };
                total += signed * boost;
                hits += 1;
            }
            negate = false;
            boost = 1.0;
        }

        if hits == 0 {
            return 0.0;
        }

        // Average polarity, damped when the marker words are a small share of the text
        let average = total / hits as f32;
        let density = (hits as f32 / words.len().max(1) as f32 * 3.0).min(1.0);
        let emphasis = if text.contains('!') { 1.2 } else { 1.0 };
        (average * density.max(0.5) * emphasis).clamp(-1.0, 1.0)
    }
}
