//! Scoring and level progression.
//!
//! | event                  | points                                   |
//! |------------------------|------------------------------------------|
//! | harpoon kill           | kind base (100 red / 200 dragon) × level |
//! | rock crush             | 150 × level                              |
//! | power-up pickup        | 50                                       |
//! | level clear            | 500 × level + 10 × par seconds left      |

use super::ai::MonsterKind;

pub const ROCK_CRUSH_POINTS: u32 = 150;
pub const POWER_UP_POINTS: u32 = 50;
pub const LEVEL_CLEAR_POINTS: u32 = 500;
pub const PAR_SECONDS: f32 = 180.0;
pub const TIME_BONUS_PER_SECOND: u32 = 10;

pub fn harpoon_kill_points(kind: MonsterKind, level: u32) -> u32 {
    kind.base_points() * level.max(1)
}

pub fn rock_crush_points(level: u32) -> u32 {
    ROCK_CRUSH_POINTS * level.max(1)
}

/// Bonus for clearing `level` after `elapsed` seconds.
pub fn level_clear_bonus(level: u32, elapsed: f32) -> u32 {
    let remaining = (PAR_SECONDS - elapsed).max(0.0) as u32;
    LEVEL_CLEAR_POINTS * level.max(1) + remaining * TIME_BONUS_PER_SECOND
}

/// Monsters placed by the generated layout.
pub fn monster_count_for(level: u32) -> usize {
    (3 + level as usize).min(10)
}

/// Rocks placed by the generated layout.
pub fn rock_count_for(level: u32) -> usize {
    8 + 2 * level as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kills_scale_with_level() {
        assert_eq!(harpoon_kill_points(MonsterKind::RedMonster, 1), 100);
        assert_eq!(harpoon_kill_points(MonsterKind::GreenDragon, 1), 200);
        assert_eq!(harpoon_kill_points(MonsterKind::RedMonster, 3), 300);
        assert_eq!(rock_crush_points(2), 300);
    }

    #[test]
    fn clear_bonus_rewards_speed() {
        assert_eq!(level_clear_bonus(1, 0.0), 500 + 1800);
        assert_eq!(level_clear_bonus(2, 170.5), 1000 + 90);
        assert_eq!(level_clear_bonus(1, 999.0), 500);
        assert!(level_clear_bonus(1, 10.0) > level_clear_bonus(1, 60.0));
    }

    #[test]
    fn generated_levels_grow() {
        assert_eq!(monster_count_for(1), 4);
        assert_eq!(monster_count_for(20), 10);
        assert!(rock_count_for(3) > rock_count_for(1));
    }
}
