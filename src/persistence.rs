use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::constants::{SAVE_VERSION, STAGE_PER_MAP};
use crate::engine::{GameState, VisitMap, WallHits};
use crate::levels::find_level;
use crate::maze::Maze;
use crate::types::{Enemy, EnemyBehaviors, EnemyCounts, Lifetime, Vec2};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("store i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed save data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported save version {found} (newest known is {supported})")]
    UnsupportedVersion { found: u8, supported: u8 },
}

/// JSON-safe layout of a suspended run. Maps are arrays of `["x,y", value]`
/// pairs, sets are arrays of `"x,y"` keys, and unbounded lifetimes are `null`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedState {
    #[serde(default)]
    pub version: u8,
    pub maze: Maze,
    pub player: Vec2,
    #[serde(default)]
    pub steps: u32,
    #[serde(default)]
    pub bumps: u32,
    #[serde(default)]
    pub total_steps: u32,
    #[serde(default)]
    pub total_bumps: u32,
    #[serde(default)]
    pub path: Vec<Vec2>,
    #[serde(default)]
    pub path_length: Lifetime,
    #[serde(default)]
    pub hit_v: Vec<(String, Lifetime)>,
    #[serde(default)]
    pub hit_h: Vec<(String, Lifetime)>,
    #[serde(default)]
    pub enemies: Vec<Enemy>,
    #[serde(default)]
    pub enemy_visited: Vec<Vec<(String, u32)>>,
    #[serde(default)]
    pub enemy_paths: Vec<Vec<Vec2>>,
    #[serde(default)]
    pub caught: bool,
    #[serde(default = "first_stage")]
    pub stage: u32,
    #[serde(default)]
    pub visited_goals: Vec<String>,
    #[serde(default)]
    pub final_stage: bool,
    #[serde(default)]
    pub enemy_behaviors: EnemyBehaviors,
    #[serde(default)]
    pub enemy_counts: EnemyCounts,
    #[serde(default)]
    pub wall_lifetime: Lifetime,
    #[serde(default)]
    pub show_adjacent_walls: bool,
    #[serde(default)]
    pub move_adjacent_wall_life: Lifetime,
    #[serde(default)]
    pub bump_adjacent_wall_life: Lifetime,
    #[serde(default = "enabled")]
    pub biased_spawn: bool,
    #[serde(default = "enabled")]
    pub biased_goal: bool,
    #[serde(default)]
    pub level_id: Option<String>,
    #[serde(default)]
    pub respawn_stock: u32,
    #[serde(default)]
    pub respawn_max: u32,
    #[serde(default = "default_stage_per_map")]
    pub stage_per_map: u32,
    #[serde(default)]
    pub sight_range: Option<u32>,
}

fn first_stage() -> u32 {
    1
}

fn enabled() -> bool {
    true
}

fn default_stage_per_map() -> u32 {
    STAGE_PER_MAP
}

pub fn encode_state(state: &GameState) -> SavedState {
    SavedState {
        version: SAVE_VERSION,
        maze: state.maze.clone(),
        player: state.player,
        steps: state.steps,
        bumps: state.bumps,
        total_steps: state.total_steps,
        total_bumps: state.total_bumps,
        path: state.path.clone(),
        path_length: state.path_length,
        hit_v: encode_pairs(&state.hits.v),
        hit_h: encode_pairs(&state.hits.h),
        enemies: state.enemies.clone(),
        enemy_visited: state.enemy_visited.iter().map(encode_pairs).collect(),
        enemy_paths: state.enemy_paths.clone(),
        caught: state.caught,
        stage: state.stage,
        visited_goals: state.visited_goals.iter().map(|cell| cell.key()).collect(),
        final_stage: state.final_stage,
        enemy_behaviors: state.enemy_behaviors,
        enemy_counts: state.enemy_counts,
        wall_lifetime: state.wall_lifetime,
        show_adjacent_walls: state.show_adjacent_walls,
        move_adjacent_wall_life: state.move_adjacent_wall_life,
        bump_adjacent_wall_life: state.bump_adjacent_wall_life,
        biased_spawn: state.biased_spawn,
        biased_goal: state.biased_goal,
        level_id: state.level_id.clone(),
        respawn_stock: state.respawn_stock,
        respawn_max: state.respawn_max,
        stage_per_map: state.stage_per_map,
        sight_range: state.sight_range,
    }
}

pub fn decode_state(saved: SavedState) -> Result<GameState, PersistenceError> {
    if saved.version > SAVE_VERSION {
        return Err(PersistenceError::UnsupportedVersion {
            found: saved.version,
            supported: SAVE_VERSION,
        });
    }

    let enemy_visited = saved
        .enemies
        .iter()
        .enumerate()
        .map(|(idx, enemy)| match saved.enemy_visited.get(idx) {
            Some(pairs) => decode_pairs(pairs),
            None => VisitMap::from([(enemy.pos, 1)]),
        })
        .collect();
    let enemy_paths = saved
        .enemies
        .iter()
        .enumerate()
        .map(|(idx, enemy)| match saved.enemy_paths.get(idx) {
            Some(trail) if !trail.is_empty() => trail.clone(),
            _ => vec![enemy.pos],
        })
        .collect();
    let mut state = GameState {
        player: saved.player,
        steps: saved.steps,
        bumps: saved.bumps,
        total_steps: saved.total_steps,
        total_bumps: saved.total_bumps,
        path: saved.path,
        path_length: saved.path_length,
        hits: WallHits {
            v: decode_pairs(&saved.hit_v),
            h: decode_pairs(&saved.hit_h),
        },
        enemies: saved.enemies,
        enemy_visited,
        enemy_paths,
        caught: saved.caught,
        stage: saved.stage.max(1),
        visited_goals: saved
            .visited_goals
            .iter()
            .filter_map(|key| parse_cell(key))
            .collect(),
        final_stage: saved.final_stage,
        enemy_behaviors: saved.enemy_behaviors,
        enemy_counts: saved.enemy_counts,
        wall_lifetime: saved.wall_lifetime,
        show_adjacent_walls: saved.show_adjacent_walls,
        move_adjacent_wall_life: saved.move_adjacent_wall_life,
        bump_adjacent_wall_life: saved.bump_adjacent_wall_life,
        biased_spawn: saved.biased_spawn,
        biased_goal: saved.biased_goal,
        respawn_stock: saved.respawn_stock.min(saved.respawn_max),
        respawn_max: saved.respawn_max,
        stage_per_map: saved.stage_per_map,
        sight_range: saved.sight_range,
        level_id: saved.level_id,
        maze: saved.maze,
    };
    state.visited_goals.insert(state.maze.goal);

    if let Some(level) = state.level_id.as_deref().and_then(find_level) {
        let stage = state.stage;
        state.enemy_counts = (level.enemy_counts)(stage);
        state.wall_lifetime = (level.wall_lifetime)(stage);
        state.show_adjacent_walls = (level.show_adjacent_walls)(stage);
        state.biased_spawn = level.biased_spawn;
        state.biased_goal = level.biased_goal;
        state.sight_range = level.sight_range;
    }
    Ok(state)
}

pub fn to_json(state: &GameState) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string(&encode_state(state))?)
}

pub fn from_json(text: &str) -> Result<GameState, PersistenceError> {
    let saved: SavedState = serde_json::from_str(text)?;
    decode_state(saved)
}

fn encode_pairs<V: Copy>(map: &BTreeMap<Vec2, V>) -> Vec<(String, V)> {
    map.iter().map(|(cell, value)| (cell.key(), *value)).collect()
}

fn decode_pairs<V: Copy>(pairs: &[(String, V)]) -> BTreeMap<Vec2, V> {
    pairs
        .iter()
        .filter_map(|(key, value)| parse_cell(key).map(|cell| (cell, *value)))
        .collect()
}

fn parse_cell(key: &str) -> Option<Vec2> {
    let cell = Vec2::parse_key(key);
    if cell.is_none() {
        debug!(key, "skipping malformed cell key in save");
    }
    cell
}
