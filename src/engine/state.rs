use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::constants::{
    default_enemy_counts, DEFAULT_PATH_LENGTH, DEFAULT_RESPAWN_MAX, DEFAULT_SIZE,
    DEFAULT_WALL_LIFETIME, STAGE_PER_MAP,
};
use crate::levels::LevelConfig;
use crate::maze::Maze;
use crate::types::{Enemy, EnemyBehaviors, EnemyCounts, Lifetime, Vec2};

use super::wall_memory::WallHits;

pub type VisitMap = BTreeMap<Vec2, u32>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunConfig {
    pub size: i32,
    pub enemy_counts: EnemyCounts,
    pub enemy_behaviors: EnemyBehaviors,
    pub wall_lifetime: Lifetime,
    pub path_length: Lifetime,
    pub show_adjacent_walls: bool,
    pub move_adjacent_wall_life: Lifetime,
    pub bump_adjacent_wall_life: Lifetime,
    pub biased_spawn: bool,
    pub biased_goal: bool,
    pub respawn_max: u32,
    pub stage_per_map: u32,
    pub sight_range: Option<u32>,
    pub level_id: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            enemy_counts: default_enemy_counts(DEFAULT_SIZE),
            enemy_behaviors: EnemyBehaviors::default(),
            wall_lifetime: DEFAULT_WALL_LIFETIME,
            path_length: DEFAULT_PATH_LENGTH,
            show_adjacent_walls: false,
            move_adjacent_wall_life: Lifetime::Unbounded,
            bump_adjacent_wall_life: Lifetime::Unbounded,
            biased_spawn: true,
            biased_goal: true,
            respawn_max: DEFAULT_RESPAWN_MAX,
            stage_per_map: STAGE_PER_MAP,
            sight_range: None,
            level_id: None,
        }
    }
}

impl RunConfig {
    pub fn freeplay(size: i32) -> Self {
        Self {
            size,
            enemy_counts: default_enemy_counts(size),
            ..Self::default()
        }
    }

    pub fn for_level(level: &LevelConfig) -> Self {
        Self {
            size: level.size,
            enemy_counts: (level.enemy_counts)(1),
            enemy_behaviors: level.enemy_behaviors,
            wall_lifetime: (level.wall_lifetime)(1),
            path_length: level.path_length,
            show_adjacent_walls: (level.show_adjacent_walls)(1),
            move_adjacent_wall_life: Lifetime::Unbounded,
            bump_adjacent_wall_life: Lifetime::Unbounded,
            biased_spawn: level.biased_spawn,
            biased_goal: level.biased_goal,
            respawn_max: level.respawn_max,
            stage_per_map: level.stage_per_map,
            sight_range: level.sight_range,
            level_id: Some(level.id.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    pub maze: Maze,
    pub player: Vec2,
    pub steps: u32,
    pub bumps: u32,
    pub total_steps: u32,
    pub total_bumps: u32,
    pub path: Vec<Vec2>,
    pub path_length: Lifetime,
    pub hits: WallHits,
    pub enemies: Vec<Enemy>,
    pub enemy_visited: Vec<VisitMap>,
    pub enemy_paths: Vec<Vec<Vec2>>,
    pub caught: bool,
    pub stage: u32,
    pub visited_goals: BTreeSet<Vec2>,
    pub final_stage: bool,
    pub enemy_behaviors: EnemyBehaviors,
    pub enemy_counts: EnemyCounts,
    pub wall_lifetime: Lifetime,
    pub show_adjacent_walls: bool,
    pub move_adjacent_wall_life: Lifetime,
    pub bump_adjacent_wall_life: Lifetime,
    pub biased_spawn: bool,
    pub biased_goal: bool,
    pub respawn_stock: u32,
    pub respawn_max: u32,
    pub stage_per_map: u32,
    pub sight_range: Option<u32>,
    pub level_id: Option<String>,
}

impl GameState {
    pub fn goal_reached(&self) -> bool {
        self.player == self.maze.goal
    }

    pub fn config(&self) -> RunConfig {
        if let Some(level) = self.level() {
            return RunConfig {
                move_adjacent_wall_life: self.move_adjacent_wall_life,
                bump_adjacent_wall_life: self.bump_adjacent_wall_life,
                ..RunConfig::for_level(level)
            };
        }
        RunConfig {
            size: self.maze.size,
            enemy_counts: self.enemy_counts,
            enemy_behaviors: self.enemy_behaviors,
            wall_lifetime: self.wall_lifetime,
            path_length: self.path_length,
            show_adjacent_walls: self.show_adjacent_walls,
            move_adjacent_wall_life: self.move_adjacent_wall_life,
            bump_adjacent_wall_life: self.bump_adjacent_wall_life,
            biased_spawn: self.biased_spawn,
            biased_goal: self.biased_goal,
            respawn_max: self.respawn_max,
            stage_per_map: self.stage_per_map,
            sight_range: self.sight_range,
            level_id: None,
        }
    }

    pub fn level(&self) -> Option<&'static LevelConfig> {
        self.level_id.as_deref().and_then(crate::levels::find_level)
    }

    pub(super) fn push_path(&mut self, cell: Vec2) {
        self.path.push(cell);
        let keep = self.path_length.cap(self.path.len());
        if keep < self.path.len() {
            self.path.drain(..self.path.len() - keep);
        }
    }
}
