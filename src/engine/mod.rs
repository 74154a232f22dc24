use std::sync::Arc;

use tracing::{debug, warn};

use crate::levels::StageRules;
use crate::maze::{manhattan, next_position, Maze, MazeCatalog};
use crate::pathfinding::PathStep;
use crate::rng::{RandomSource, Rng};
use crate::types::{Behavior, Direction, Enemy, EnemyBehaviors, EnemyCounts, EnemyKind, Vec2};

pub mod enemy_ai;
pub mod spawn_system;
pub mod stage;
mod state;
mod utils;
pub mod wall_memory;

pub use self::enemy_ai::PlayerTrack;
pub use self::spawn_system::spawn_enemies;
pub use self::stage::{create_first_stage, next_stage_state, restart_run, MazePool};
pub use self::state::{GameState, RunConfig, VisitMap};
pub use self::wall_memory::WallHits;

#[derive(Clone, Debug)]
pub enum Action {
    Move(Direction),
    Reset,
    NewMaze(RunConfig),
    NextStage,
    ResetRun,
    RespawnEnemies(Vec2),
    Load(Box<GameState>),
}

pub fn reduce(
    state: &GameState,
    action: Action,
    pool: &mut MazePool,
    rng: &mut impl RandomSource,
) -> GameState {
    match action {
        Action::Move(dir) => apply_move(state, dir, rng),
        Action::Reset => reset_stage(state, rng),
        Action::NewMaze(config) => {
            let base = pool.draw_or_generate(config.size, None, rng);
            create_first_stage(&base, &config, rng)
        }
        Action::NextStage => next_stage_state(state, pool, rng),
        Action::ResetRun => restart_run(state, rng),
        Action::RespawnEnemies(from) => respawn_enemies(state, from, rng),
        Action::Load(loaded) => *loaded,
    }
}

fn apply_move(state: &GameState, dir: Direction, rng: &mut impl RandomSource) -> GameState {
    if state.caught {
        return state.clone();
    }
    let mut next = state.clone();
    let before = state.player;
    next.hits.decay();

    let moved = match state.maze.hit_wall(before, dir) {
        Some(wall) => {
            next.bumps += 1;
            next.total_bumps += 1;
            next.hits.record(wall, state.wall_lifetime);
            false
        }
        None => {
            next.player = next_position(before, dir);
            next.steps += 1;
            next.total_steps += 1;
            next.push_path(next.player);
            true
        }
    };
    if next.show_adjacent_walls {
        let life = if moved {
            next.move_adjacent_wall_life
        } else {
            next.bump_adjacent_wall_life
        };
        next.hits.reveal_adjacent(&state.maze, next.player, life);
    }

    let track = PlayerTrack {
        before,
        after: next.player,
    };
    let mut crossed = false;
    for idx in 0..next.enemies.len() {
        crossed |= enemy_ai::take_turn(
            &mut next.enemies[idx],
            &mut next.enemy_visited[idx],
            &mut next.enemy_paths[idx],
            &state.maze,
            track,
            state.sight_range,
            rng,
        );
    }
    next.caught = crossed || next.enemies.iter().any(|enemy| enemy.pos == track.after);
    if next.caught {
        debug!(stage = next.stage, player = %next.player, "player caught");
    }
    next
}

fn reset_stage(state: &GameState, rng: &mut impl RandomSource) -> GameState {
    let mut next = state.clone();
    let start = state.maze.start;
    next.player = start;
    next.steps = 0;
    next.bumps = 0;
    next.path = vec![start];
    next.caught = false;
    next.hits = WallHits::default();
    next.respawn_roster(start, rng);
    if next.show_adjacent_walls {
        let life = next.move_adjacent_wall_life;
        next.hits.reveal_adjacent(&state.maze, start, life);
    }
    next
}

fn respawn_enemies(state: &GameState, from: Vec2, rng: &mut impl RandomSource) -> GameState {
    let mut next = state.clone();
    if state.respawn_stock == 0 {
        warn!(stage = state.stage, "respawn requested with no stock left");
    }
    next.respawn_stock = state.respawn_stock.saturating_sub(1);
    next.caught = false;
    next.respawn_roster(from, rng);
    next
}

#[derive(Clone, Debug)]
pub struct GameEngine {
    state: Arc<GameState>,
    pool: MazePool,
    rng: Rng,
}

impl GameEngine {
    pub fn new(config: RunConfig, catalog: MazeCatalog, seed: u32) -> Self {
        let mut rng = Rng::new(seed);
        let mut pool = MazePool::new(catalog);
        let base = pool.draw_or_generate(config.size, None, &mut rng);
        let state = create_first_stage(&base, &config, &mut rng);
        Self {
            state: Arc::new(state),
            pool,
            rng,
        }
    }

    pub fn resume(state: GameState, catalog: MazeCatalog, seed: u32) -> Self {
        Self {
            state: Arc::new(state),
            pool: MazePool::new(catalog),
            rng: Rng::new(seed),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn snapshot(&self) -> Arc<GameState> {
        Arc::clone(&self.state)
    }

    pub fn dispatch(&mut self, action: Action) -> Arc<GameState> {
        let next = reduce(&self.state, action, &mut self.pool, &mut self.rng);
        self.state = Arc::new(next);
        self.snapshot()
    }
}
