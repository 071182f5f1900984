//! Canned reply selection and per-companion conversation history.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::companion::Companion;

/// Generic flavor lines mixed into every reply pool, independent of traits.
const FLAVOR_LINES: &[&str] = &[
    "Let's build something amazing together!",
    "Did you hear a creeper hissing last night? Spooky.",
    "I found some iron while you were away!",
    "Race you to the village well!",
    "The sunset over the mountains was incredible today.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Player,
    Companion,
}

/// One line in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub id: String,
    pub speaker: Speaker,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatEntry {
    pub fn player(text: impl Into<String>) -> Self {
        Self::new(Speaker::Player, text)
    }

    pub fn companion(text: impl Into<String>) -> Self {
        Self::new(Speaker::Companion, text)
    }

    fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            speaker,
            text: text.into(),
            sent_at: Utc::now(),
        }
    }
}

/// Candidate replies for one companion: templates interpolating the record's
/// traits, plus the generic flavor pool. Never empty.
pub fn reply_pool(companion: &Companion) -> Vec<String> {
    let mut pool = vec![
        format!("{} here! Always happy to chat.", companion.name),
        format!("I'm feeling {} today. How about you?", companion.mood),
        format!("Want to go {} with me later?", companion.favorite_activity),
        format!("Level {} already! We make a great team.", companion.level),
    ];
    if let Some(skill) = companion.primary_skill() {
        pool.push(format!("I've been practicing my {} all morning!", skill));
    }
    pool.extend(FLAVOR_LINES.iter().map(|line| (*line).to_string()));
    pool
}

/// Pick one reply uniformly at random from the companion's pool.
///
/// The random source is injected so tests can substitute a seeded generator.
pub fn select_reply<R: Rng + ?Sized>(companion: &Companion, rng: &mut R) -> String {
    let mut pool = reply_pool(companion);
    let idx = rng.gen_range(0..pool.len());
    pool.swap_remove(idx)
}

/// Append-only per-companion conversation history. Lives in memory for the
/// session; only the roster itself is persisted.
#[derive(Debug, Default)]
pub struct ConversationLog {
    entries: HashMap<String, Vec<ChatEntry>>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, companion_id: &str, entry: ChatEntry) {
        self.entries
            .entry(companion_id.to_string())
            .or_default()
            .push(entry);
    }

    pub fn history(&self, companion_id: &str) -> &[ChatEntry] {
        self.entries
            .get(companion_id)
            .map(|entries| entries.as_slice())
            .unwrap_or(&[])
    }

    pub fn clear(&mut self, companion_id: &str) {
        self.entries.remove(companion_id);
    }
}
