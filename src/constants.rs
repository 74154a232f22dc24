use crate::types::{EnemyCounts, Lifetime};

pub const DEFAULT_SIZE: i32 = 5;
pub const STAGE_PER_MAP: u32 = 3;
pub const ENEMY_PATH_LENGTH: usize = 4;
pub const DEFAULT_RESPAWN_MAX: u32 = 3;
pub const DEFAULT_WALL_LIFETIME: Lifetime = Lifetime::Unbounded;
pub const DEFAULT_PATH_LENGTH: Lifetime = Lifetime::Unbounded;

pub const SMART_CHASE_DISTANCE: u32 = 2;

pub const MAZE_VARIANTS_PER_SIZE: usize = 4;
pub const MAZE_EXTRA_OPENINGS_DIVISOR: usize = 4;

pub const SAVE_VERSION: u8 = 1;
pub const SUSPEND_KEY: &str = "suspend";
pub const BEST_SCORE_KEY_PREFIX: &str = "best_score";

pub fn default_enemy_counts(size: i32) -> EnemyCounts {
    if size <= 5 {
        return EnemyCounts {
            random: 1,
            ..EnemyCounts::default()
        };
    }
    if size <= 8 {
        return EnemyCounts {
            random: 1,
            slow: 1,
            ..EnemyCounts::default()
        };
    }
    EnemyCounts {
        random: 1,
        slow: 1,
        sight: 1,
        fast: 0,
    }
}
