//! State engine for a Minecraft-themed AI companion app: character records,
//! canned-reply chat with leveling and achievements, durable roster storage,
//! and a simulated Xbox Live connection flow.

pub mod companion;
pub mod config;
pub mod dialogue;
pub mod engine;
pub mod progression;
pub mod roster;
pub mod xbox;

pub use companion::{
    Achievement, Companion, CompanionDraft, CompanionTemplate, Personality, Profession,
};
pub use config::CompanionConfig;
pub use dialogue::{ChatEntry, Speaker};
pub use engine::{CompanionEngine, CompanionEvent};
pub use roster::RosterStore;
pub use xbox::{FriendNetwork, XboxLiveClient};
