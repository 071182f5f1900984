//! Leveling and achievement rules applied after every chat exchange.

use crate::companion::{Achievement, Companion};

/// What a single progression update unlocked, for user-visible notifications.
/// Not part of the persisted record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressReport {
    pub levels_gained: u32,
    pub unlocked: Vec<Achievement>,
}

impl ProgressReport {
    pub fn leveled_up(&self) -> bool {
        self.levels_gained > 0
    }
}

/// XP required to advance out of `level`.
pub fn level_threshold(level: u32) -> u32 {
    level * 100
}

fn earned(achievement: Achievement, companion: &Companion) -> bool {
    match achievement {
        Achievement::SeasonedAdventurer => companion.level >= 10,
        Achievement::VillageVeteran => companion.level >= 25,
        Achievement::Chatty => companion.messages_count >= 10,
        Achievement::BestFriends => companion.messages_count >= 50,
    }
}

/// Apply one chat exchange to a companion: grant XP, promote through as many
/// levels as the gain covers, bump the message counter, then unlock any newly
/// earned achievements in evaluation order.
///
/// Leftover XP carries into the next level, so `0 <= xp < level * 100` holds
/// on return no matter how large the increment was. Cannot fail; the caller
/// decides what to do with the report.
pub fn record_exchange(companion: &mut Companion, xp_gain: u32) -> ProgressReport {
    let mut report = ProgressReport::default();

    companion.xp += xp_gain;
    while companion.xp >= level_threshold(companion.level) {
        companion.xp -= level_threshold(companion.level);
        companion.level += 1;
        report.levels_gained += 1;
    }

    companion.messages_count += 1;

    for achievement in Achievement::ALL {
        if earned(achievement, companion) && !companion.achievements.contains(&achievement) {
            companion.achievements.push(achievement);
            report.unlocked.push(achievement);
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::companion::{seed_roster, Companion};

    fn fresh() -> Companion {
        seed_roster().remove(0)
    }

    #[test]
    fn test_exact_threshold_promotes_once() {
        let mut companion = fresh();
        let report = record_exchange(&mut companion, 100);

        assert_eq!(companion.level, 2);
        assert_eq!(companion.xp, 0);
        assert_eq!(report.levels_gained, 1);
        assert!(report.unlocked.is_empty());
    }

    #[test]
    fn test_large_gain_carries_through_multiple_levels() {
        let mut companion = fresh();
        // 350 XP: 100 to leave level 1, 200 to leave level 2, 50 left over.
        let report = record_exchange(&mut companion, 350);

        assert_eq!(companion.level, 3);
        assert_eq!(companion.xp, 50);
        assert_eq!(report.levels_gained, 2);
    }

    #[test]
    fn test_xp_invariant_holds_under_repeated_updates() {
        for increment in [0u32, 1, 37, 99, 100, 250, 1000] {
            let mut companion = fresh();
            let mut last_level = companion.level;
            for _ in 0..50 {
                record_exchange(&mut companion, increment);
                assert!(companion.xp < level_threshold(companion.level));
                assert!(companion.level >= last_level);
                last_level = companion.level;
            }
        }
    }

    #[test]
    fn test_chatty_unlocks_exactly_once_at_ten_messages() {
        let mut companion = fresh();
        for _ in 0..9 {
            let report = record_exchange(&mut companion, 0);
            assert!(report.unlocked.is_empty());
        }
        assert_eq!(companion.messages_count, 9);

        let report = record_exchange(&mut companion, 0);
        assert_eq!(companion.messages_count, 10);
        assert_eq!(report.unlocked, vec![Achievement::Chatty]);

        // Re-crossing the threshold never duplicates the tag.
        for _ in 0..60 {
            record_exchange(&mut companion, 0);
        }
        let chatty_count = companion
            .achievements
            .iter()
            .filter(|a| **a == Achievement::Chatty)
            .count();
        assert_eq!(chatty_count, 1);
        assert!(companion.achievements.contains(&Achievement::BestFriends));
    }

    #[test]
    fn test_simultaneous_unlocks_follow_evaluation_order() {
        let mut companion = fresh();
        companion.level = 24;
        companion.xp = level_threshold(24) - 1;
        companion.messages_count = 9;

        let report = record_exchange(&mut companion, 1);

        assert_eq!(companion.level, 25);
        assert_eq!(companion.xp, 0);
        assert_eq!(
            report.unlocked,
            vec![
                Achievement::SeasonedAdventurer,
                Achievement::VillageVeteran,
                Achievement::Chatty,
            ]
        );
        assert_eq!(companion.achievements, report.unlocked);
    }

    #[test]
    fn test_achievements_never_shrink() {
        let mut companion = fresh();
        companion.achievements = vec![Achievement::Chatty];
        companion.messages_count = 20;

        record_exchange(&mut companion, 10);
        assert!(companion.achievements.contains(&Achievement::Chatty));
    }
}
