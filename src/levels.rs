use crate::constants::{DEFAULT_RESPAWN_MAX, STAGE_PER_MAP};
use crate::types::{Behavior, EnemyBehaviors, EnemyCounts, Lifetime};

pub struct LevelConfig {
    pub id: &'static str,
    pub size: i32,
    pub enemy_counts: fn(u32) -> EnemyCounts,
    pub wall_lifetime: fn(u32) -> Lifetime,
    pub show_adjacent_walls: fn(u32) -> bool,
    pub enemy_behaviors: EnemyBehaviors,
    pub path_length: Lifetime,
    pub biased_spawn: bool,
    pub biased_goal: bool,
    pub respawn_max: u32,
    pub stage_per_map: u32,
    pub sight_range: Option<u32>,
}

pub static LEVELS: &[LevelConfig] = &[
    LevelConfig {
        id: "tutorial",
        size: 5,
        enemy_counts: tutorial_enemies,
        wall_lifetime: always_unbounded,
        show_adjacent_walls: always,
        enemy_behaviors: EnemyBehaviors {
            random: Behavior::Random,
            slow: Behavior::Basic,
            sight: Behavior::Basic,
            fast: Behavior::Basic,
        },
        path_length: Lifetime::Unbounded,
        biased_spawn: true,
        biased_goal: false,
        respawn_max: 5,
        stage_per_map: STAGE_PER_MAP,
        sight_range: None,
    },
    LevelConfig {
        id: "corridors",
        size: 7,
        enemy_counts: corridor_enemies,
        wall_lifetime: shrinking_walls,
        show_adjacent_walls: never,
        enemy_behaviors: DEFAULT_BEHAVIORS,
        path_length: Lifetime::Finite(12),
        biased_spawn: true,
        biased_goal: true,
        respawn_max: DEFAULT_RESPAWN_MAX,
        stage_per_map: STAGE_PER_MAP,
        sight_range: None,
    },
    LevelConfig {
        id: "watchers",
        size: 9,
        enemy_counts: watcher_enemies,
        wall_lifetime: fixed_short_walls,
        show_adjacent_walls: first_stages_only,
        enemy_behaviors: DEFAULT_BEHAVIORS,
        path_length: Lifetime::Finite(8),
        biased_spawn: true,
        biased_goal: true,
        respawn_max: DEFAULT_RESPAWN_MAX,
        stage_per_map: STAGE_PER_MAP,
        sight_range: Some(5),
    },
    LevelConfig {
        id: "blackout",
        size: 9,
        enemy_counts: blackout_enemies,
        wall_lifetime: blackout_walls,
        show_adjacent_walls: never,
        enemy_behaviors: EnemyBehaviors {
            random: Behavior::Basic,
            slow: Behavior::Smart,
            sight: Behavior::Sight,
            fast: Behavior::Smart,
        },
        path_length: Lifetime::Finite(4),
        biased_spawn: false,
        biased_goal: true,
        respawn_max: 1,
        stage_per_map: 2,
        sight_range: Some(3),
    },
];

const DEFAULT_BEHAVIORS: EnemyBehaviors = EnemyBehaviors {
    random: Behavior::Random,
    slow: Behavior::Smart,
    sight: Behavior::Sight,
    fast: Behavior::Basic,
};

pub fn find_level(id: &str) -> Option<&'static LevelConfig> {
    LEVELS.iter().find(|level| level.id == id)
}

#[derive(Clone, Copy)]
pub struct StageRules {
    level: Option<&'static LevelConfig>,
}

impl StageRules {
    pub fn resolve(level_id: Option<&str>) -> Self {
        Self {
            level: level_id.and_then(find_level),
        }
    }

    pub fn enemy_counts(self, stage: u32, fallback: EnemyCounts) -> EnemyCounts {
        self.level
            .map_or(fallback, |level| (level.enemy_counts)(stage))
    }

    pub fn wall_lifetime(self, stage: u32, fallback: Lifetime) -> Lifetime {
        self.level
            .map_or(fallback, |level| (level.wall_lifetime)(stage))
    }

    pub fn show_adjacent_walls(self, stage: u32, fallback: bool) -> bool {
        self.level
            .map_or(fallback, |level| (level.show_adjacent_walls)(stage))
    }
}

fn always(_stage: u32) -> bool {
    true
}

fn never(_stage: u32) -> bool {
    false
}

fn first_stages_only(stage: u32) -> bool {
    stage <= 2
}

fn always_unbounded(_stage: u32) -> Lifetime {
    Lifetime::Unbounded
}

fn shrinking_walls(stage: u32) -> Lifetime {
    Lifetime::Finite(12u32.saturating_sub(stage * 2).max(4))
}

fn fixed_short_walls(_stage: u32) -> Lifetime {
    Lifetime::Finite(6)
}

fn blackout_walls(stage: u32) -> Lifetime {
    if stage <= 1 {
        Lifetime::Finite(3)
    } else {
        Lifetime::Finite(1)
    }
}

fn tutorial_enemies(stage: u32) -> EnemyCounts {
    EnemyCounts {
        random: if stage >= 3 { 2 } else { 1 },
        ..EnemyCounts::default()
    }
}

fn corridor_enemies(stage: u32) -> EnemyCounts {
    EnemyCounts {
        random: 1,
        slow: 1 + stage / 4,
        sight: 0,
        fast: u32::from(stage >= 6),
    }
}

fn watcher_enemies(stage: u32) -> EnemyCounts {
    EnemyCounts {
        random: 1,
        slow: 0,
        sight: 1 + stage / 3,
        fast: 0,
    }
}

fn blackout_enemies(stage: u32) -> EnemyCounts {
    EnemyCounts {
        random: 0,
        slow: 1,
        sight: 1,
        fast: 1 + stage / 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_ids_are_unique() {
        for (idx, level) in LEVELS.iter().enumerate() {
            assert!(LEVELS[idx + 1..].iter().all(|other| other.id != level.id));
        }
    }

    #[test]
    fn unknown_level_falls_back_to_run_values() {
        let rules = StageRules::resolve(Some("missing"));
        let fallback = EnemyCounts {
            random: 3,
            ..EnemyCounts::default()
        };
        assert_eq!(rules.enemy_counts(4, fallback), fallback);
        assert_eq!(rules.wall_lifetime(4, Lifetime::Finite(2)), Lifetime::Finite(2));
        assert!(rules.show_adjacent_walls(4, true));
    }

    #[test]
    fn corridor_walls_shrink_but_stay_visible() {
        let rules = StageRules::resolve(Some("corridors"));
        assert_eq!(rules.wall_lifetime(1, Lifetime::Unbounded), Lifetime::Finite(10));
        assert_eq!(rules.wall_lifetime(3, Lifetime::Unbounded), Lifetime::Finite(6));
        assert_eq!(rules.wall_lifetime(20, Lifetime::Unbounded), Lifetime::Finite(4));
    }

    #[test]
    fn watchers_reveal_walls_early_only() {
        let rules = StageRules::resolve(Some("watchers"));
        assert!(rules.show_adjacent_walls(1, false));
        assert!(!rules.show_adjacent_walls(3, true));
        assert_eq!(rules.enemy_counts(6, EnemyCounts::default()).sight, 3);
    }
}
