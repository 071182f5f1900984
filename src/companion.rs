use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Professions offered by the companion creation form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profession {
    #[default]
    Trader,
    Guard,
    Mage,
    Farmer,
    Blacksmith,
    Builder,
}

/// Fixed personality set a companion is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    #[default]
    Friendly,
    Serious,
    Wise,
    Cheerful,
    Gloomy,
    Grumpy,
}

impl Personality {
    /// Starting mood tag for a freshly created companion.
    pub fn initial_mood(&self) -> &'static str {
        match self {
            Personality::Friendly => "happy",
            Personality::Serious => "focused",
            Personality::Wise => "thoughtful",
            Personality::Cheerful => "excited",
            Personality::Gloomy => "melancholy",
            Personality::Grumpy => "annoyed",
        }
    }
}

/// Unlockable achievement tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    SeasonedAdventurer,
    VillageVeteran,
    Chatty,
    BestFriends,
}

impl Achievement {
    /// Evaluation order used by the progression updater. Unlocks are appended
    /// to a companion's achievement list in this order.
    pub const ALL: [Achievement; 4] = [
        Achievement::SeasonedAdventurer,
        Achievement::VillageVeteran,
        Achievement::Chatty,
        Achievement::BestFriends,
    ];

    /// Display title for notifications.
    pub fn title(&self) -> &'static str {
        match self {
            Achievement::SeasonedAdventurer => "Seasoned Adventurer",
            Achievement::VillageVeteran => "Village Veteran",
            Achievement::Chatty => "Chatty",
            Achievement::BestFriends => "Best Friends",
        }
    }
}

/// One AI friend record. The whole roster of these is what gets persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Companion {
    pub id: String,
    pub name: String,
    pub skin: String,
    pub profession: Profession,
    pub personality: Personality,
    /// The line the companion introduces itself with.
    pub greeting: String,
    pub level: u32,
    /// Experience toward the next level; always below `level * 100`.
    pub xp: u32,
    pub mood: String,
    #[serde(default)]
    pub skills: Vec<String>,
    pub favorite_activity: String,
    #[serde(default)]
    pub messages_count: u32,
    /// Insertion-ordered, duplicate-free.
    #[serde(default)]
    pub achievements: Vec<Achievement>,
    /// World the companion has been placed into, if any.
    #[serde(default)]
    pub world: Option<String>,
    #[serde(default)]
    pub xbox_linked: bool,
    #[serde(default)]
    pub gamertag: Option<String>,
    #[serde(default)]
    pub xuid: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Companion {
    /// First skill tag, used by reply templates.
    pub fn primary_skill(&self) -> Option<&str> {
        self.skills.first().map(String::as_str)
    }
}

/// User-supplied fields for creating a companion. Name and greeting are
/// required; everything else defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanionDraft {
    pub name: String,
    pub greeting: String,
    #[serde(default)]
    pub profession: Profession,
    #[serde(default)]
    pub personality: Personality,
    #[serde(default = "default_skin")]
    pub skin: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default = "default_favorite_activity")]
    pub favorite_activity: String,
}

fn default_skin() -> String {
    "villager".to_string()
}

fn default_favorite_activity() -> String {
    "exploring".to_string()
}

impl Default for CompanionDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            greeting: String::new(),
            profession: Profession::default(),
            personality: Personality::default(),
            skin: default_skin(),
            skills: Vec::new(),
            favorite_activity: default_favorite_activity(),
        }
    }
}

impl CompanionDraft {
    /// Validate the draft and build a level-1 companion from it.
    pub fn build(self) -> Result<Companion> {
        let name = self.name.trim();
        if name.is_empty() {
            bail!("Companion name is required");
        }
        let greeting = self.greeting.trim();
        if greeting.is_empty() {
            bail!("Companion greeting is required");
        }

        Ok(Companion {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            skin: self.skin,
            profession: self.profession,
            personality: self.personality,
            greeting: greeting.to_string(),
            level: 1,
            xp: 0,
            mood: self.personality.initial_mood().to_string(),
            skills: self.skills,
            favorite_activity: self.favorite_activity,
            messages_count: 0,
            achievements: Vec::new(),
            world: None,
            xbox_linked: false,
            gamertag: None,
            xuid: None,
            created_at: Utc::now(),
        })
    }
}

fn seed(
    name: &str,
    profession: Profession,
    skin: &str,
    personality: Personality,
    greeting: &str,
    skills: &[&str],
    favorite_activity: &str,
) -> Companion {
    Companion {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        skin: skin.to_string(),
        profession,
        personality,
        greeting: greeting.to_string(),
        level: 1,
        xp: 0,
        mood: personality.initial_mood().to_string(),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        favorite_activity: favorite_activity.to_string(),
        messages_count: 0,
        achievements: Vec::new(),
        world: None,
        xbox_linked: false,
        gamertag: None,
        xuid: None,
        created_at: Utc::now(),
    }
}

/// Built-in roster used when no stored roster exists yet.
pub fn seed_roster() -> Vec<Companion> {
    vec![
        seed(
            "Steve the Trader",
            Profession::Trader,
            "villager",
            Personality::Friendly,
            "Welcome! I have the finest goods in the village!",
            &["trading", "exploring"],
            "trading",
        ),
        seed(
            "Alex the Guard",
            Profession::Guard,
            "knight",
            Personality::Serious,
            "Halt! Who goes there?",
            &["fighting", "patrolling"],
            "patrolling",
        ),
        seed(
            "Merlin the Wizard",
            Profession::Mage,
            "wizard",
            Personality::Wise,
            "Magic is an art that takes a lifetime to master...",
            &["brewing", "enchanting"],
            "enchanting",
        ),
    ]
}

/// A ready-made companion preset.
#[derive(Debug, Clone, Copy)]
pub struct CompanionTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub profession: Profession,
    pub skin: &'static str,
    pub personality: Personality,
    pub greeting: &'static str,
    pub skills: &'static [&'static str],
    pub favorite_activity: &'static str,
}

/// Presets offered on the templates tab.
pub const BUILTIN_TEMPLATES: [CompanionTemplate; 3] = [
    CompanionTemplate {
        id: "friendly_trader",
        name: "Friendly Trader",
        description: "A ready-made trader with a warm welcome",
        profession: Profession::Trader,
        skin: "villager",
        personality: Personality::Friendly,
        greeting: "Step right up, I have deals you won't believe!",
        skills: &["trading", "haggling"],
        favorite_activity: "trading",
    },
    CompanionTemplate {
        id: "gate_guard",
        name: "Gate Guard",
        description: "A vigilant guard for your fortress",
        profession: Profession::Guard,
        skin: "knight",
        personality: Personality::Serious,
        greeting: "State your business at the gate.",
        skills: &["fighting", "patrolling"],
        favorite_activity: "patrolling",
    },
    CompanionTemplate {
        id: "village_farmer",
        name: "Village Farmer",
        description: "A hard-working farmhand with stories to tell",
        profession: Profession::Farmer,
        skin: "farmer",
        personality: Personality::Cheerful,
        greeting: "The wheat's almost ready, come see!",
        skills: &["farming", "composting"],
        favorite_activity: "harvesting",
    },
];

impl CompanionTemplate {
    /// Stamp out a fresh companion from this preset.
    pub fn instantiate(&self) -> Companion {
        seed(
            self.name,
            self.profession,
            self.skin,
            self.personality,
            self.greeting,
            self.skills,
            self.favorite_activity,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_requires_name() {
        let draft = CompanionDraft {
            greeting: "Hello!".to_string(),
            ..CompanionDraft::default()
        };
        assert!(draft.build().is_err());

        let draft = CompanionDraft {
            name: "   ".to_string(),
            greeting: "Hello!".to_string(),
            ..CompanionDraft::default()
        };
        assert!(draft.build().is_err());
    }

    #[test]
    fn test_draft_requires_greeting() {
        let draft = CompanionDraft {
            name: "Robin".to_string(),
            ..CompanionDraft::default()
        };
        assert!(draft.build().is_err());
    }

    #[test]
    fn test_draft_builds_level_one_companion() {
        let draft = CompanionDraft {
            name: "  Robin  ".to_string(),
            greeting: "Hi there!".to_string(),
            personality: Personality::Cheerful,
            ..CompanionDraft::default()
        };
        let companion = draft.build().unwrap();
        assert_eq!(companion.name, "Robin");
        assert_eq!(companion.level, 1);
        assert_eq!(companion.xp, 0);
        assert_eq!(companion.mood, "excited");
        assert!(companion.achievements.is_empty());
        assert!(!companion.xbox_linked);
    }

    #[test]
    fn test_seed_roster_has_three_companions() {
        let roster = seed_roster();
        assert_eq!(roster.len(), 3);
        assert!(roster.iter().all(|c| c.level == 1 && c.xp == 0));
        assert_eq!(roster[0].profession, Profession::Trader);
        assert_eq!(roster[1].profession, Profession::Guard);
        assert_eq!(roster[2].profession, Profession::Mage);
    }

    #[test]
    fn test_template_instantiation() {
        let template = &BUILTIN_TEMPLATES[0];
        let companion = template.instantiate();
        assert_eq!(companion.name, "Friendly Trader");
        assert_eq!(companion.level, 1);
        assert_eq!(companion.messages_count, 0);

        // Each instantiation is a distinct record.
        let other = template.instantiate();
        assert_ne!(companion.id, other.id);
    }

    #[test]
    fn test_achievement_titles() {
        assert_eq!(Achievement::SeasonedAdventurer.title(), "Seasoned Adventurer");
        assert_eq!(Achievement::Chatty.title(), "Chatty");
        assert_eq!(Achievement::ALL.len(), 4);
    }

    #[test]
    fn test_companion_serde_round_trip() {
        let companion = seed_roster().remove(0);
        let raw = serde_json::to_string(&companion).unwrap();
        let parsed: Companion = serde_json::from_str(&raw).unwrap();
        assert_eq!(companion, parsed);
    }
}
