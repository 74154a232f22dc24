use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use super::utils::pick_cell_index;
use super::*;
use crate::maze::{generate_layout, MazeCatalog};

#[derive(Clone, Debug)]
pub struct MazePool {
    catalog: MazeCatalog,
    remaining: BTreeMap<i32, Vec<Maze>>,
}

impl MazePool {
    pub fn new(catalog: MazeCatalog) -> Self {
        Self {
            catalog,
            remaining: BTreeMap::new(),
        }
    }

    pub fn catalog(&self) -> &MazeCatalog {
        &self.catalog
    }

    pub fn remaining(&self, size: i32) -> usize {
        match self.remaining.get(&size) {
            Some(left) if !left.is_empty() => left.len(),
            _ => self.catalog.layouts(size).len(),
        }
    }

    pub fn reset(&mut self) {
        self.remaining.clear();
    }

    pub fn draw(&mut self, size: i32, rng: &mut impl RandomSource) -> Option<Maze> {
        self.draw_excluding(size, None, rng)
    }

    /// Draws without replacement, skipping `exclude_id` while another
    /// layout of the same size is available.
    pub fn draw_excluding(
        &mut self,
        size: i32,
        exclude_id: Option<&str>,
        rng: &mut impl RandomSource,
    ) -> Option<Maze> {
        let layouts = self.catalog.layouts(size);
        if layouts.is_empty() {
            return None;
        }
        let remaining = self.remaining.entry(size).or_default();
        if remaining.is_empty() {
            debug!(size, count = layouts.len(), "refilling maze pool");
            *remaining = layouts.to_vec();
        }

        let eligible = |left: &[Maze]| -> Vec<usize> {
            left.iter()
                .enumerate()
                .filter(|(_, maze)| Some(maze.id.as_str()) != exclude_id)
                .map(|(idx, _)| idx)
                .collect()
        };
        let mut candidates = eligible(remaining);
        if candidates.is_empty() && layouts.len() > 1 {
            debug!(size, "only the current layout is left; refilling early");
            *remaining = layouts.to_vec();
            candidates = eligible(remaining);
        }
        let idx = if candidates.is_empty() {
            rng.pick_index(remaining.len())
        } else {
            candidates[rng.pick_index(candidates.len())]
        };
        Some(remaining.swap_remove(idx))
    }

    pub fn draw_or_generate(
        &mut self,
        size: i32,
        exclude_id: Option<&str>,
        rng: &mut impl RandomSource,
    ) -> Maze {
        if let Some(maze) = self.draw_excluding(size, exclude_id, rng) {
            return maze;
        }
        warn!(size, "no maze layouts for size; generating one");
        generate_layout(format!("adhoc-{size}"), size, rng)
    }
}

pub fn create_first_stage(
    base: &Maze,
    config: &RunConfig,
    rng: &mut impl RandomSource,
) -> GameState {
    let cells = base.cells();
    let start = cells
        .get(rng.pick_index(cells.len()))
        .copied()
        .unwrap_or(base.start);
    let others: Vec<Vec2> = cells.iter().copied().filter(|cell| *cell != start).collect();
    let goal = pick_cell_index(&others, start, config.biased_goal, rng)
        .map(|idx| others[idx])
        .unwrap_or(base.goal);

    let rules = StageRules::resolve(config.level_id.as_deref());
    let visited_goals = BTreeSet::from([goal]);
    let mut state = GameState {
        maze: base.with_endpoints(start, goal),
        player: start,
        steps: 0,
        bumps: 0,
        total_steps: 0,
        total_bumps: 0,
        path: vec![start],
        path_length: config.path_length,
        hits: WallHits::default(),
        enemies: Vec::new(),
        enemy_visited: Vec::new(),
        enemy_paths: Vec::new(),
        caught: false,
        stage: 1,
        final_stage: visited_goals.len() == base.cell_count(),
        visited_goals,
        enemy_behaviors: config.enemy_behaviors,
        enemy_counts: rules.enemy_counts(1, config.enemy_counts),
        wall_lifetime: rules.wall_lifetime(1, config.wall_lifetime),
        show_adjacent_walls: rules.show_adjacent_walls(1, config.show_adjacent_walls),
        move_adjacent_wall_life: config.move_adjacent_wall_life,
        bump_adjacent_wall_life: config.bump_adjacent_wall_life,
        biased_spawn: config.biased_spawn,
        biased_goal: config.biased_goal,
        respawn_stock: config.respawn_max,
        respawn_max: config.respawn_max,
        stage_per_map: config.stage_per_map,
        sight_range: config.sight_range,
        level_id: config.level_id.clone(),
    };
    state.respawn_roster(start, rng);
    if state.show_adjacent_walls {
        state
            .hits
            .reveal_adjacent(&state.maze, start, state.move_adjacent_wall_life);
    }
    info!(
        maze = %state.maze.id,
        start = %start,
        goal = %goal,
        enemies = state.enemies.len(),
        "run started"
    );
    state
}

pub fn next_stage_state(
    state: &GameState,
    pool: &mut MazePool,
    rng: &mut impl RandomSource,
) -> GameState {
    let start = state.maze.goal;
    let candidates: Vec<Vec2> = state
        .maze
        .cells()
        .into_iter()
        .filter(|cell| !state.visited_goals.contains(cell) && *cell != start)
        .collect();
    let Some(goal_idx) = pick_cell_index(&candidates, start, state.biased_goal, rng) else {
        info!(stage = state.stage, "every cell has been a goal; run is final");
        let mut next = state.clone();
        next.final_stage = true;
        return next;
    };
    let goal = candidates[goal_idx];
    let stage = state.stage + 1;
    let rotate = state.stage_per_map > 0 && (stage - 1) % state.stage_per_map == 0;

    let mut next = state.clone();
    if rotate {
        let layout = pool.draw_or_generate(state.maze.size, Some(&state.maze.id), rng);
        debug!(from = %state.maze.id, to = %layout.id, stage, "rotating maze");
        next.maze = layout.with_endpoints(start, goal);
        next.hits = WallHits::default();
    } else {
        next.maze = state.maze.with_endpoints(start, goal);
    }

    let rules = StageRules::resolve(state.level_id.as_deref());
    next.stage = stage;
    next.player = start;
    next.steps = 0;
    next.bumps = 0;
    next.path = vec![start];
    next.caught = false;
    next.visited_goals.insert(goal);
    next.final_stage = next.visited_goals.len() == next.maze.cell_count();
    next.enemy_counts = rules.enemy_counts(stage, state.enemy_counts);
    next.wall_lifetime = rules.wall_lifetime(stage, state.wall_lifetime);
    next.show_adjacent_walls = rules.show_adjacent_walls(stage, state.show_adjacent_walls);
    next.respawn_roster(start, rng);
    if next.show_adjacent_walls {
        let life = next.move_adjacent_wall_life;
        next.hits.reveal_adjacent(&next.maze, start, life);
    }
    info!(
        stage,
        goal = %goal,
        final_stage = next.final_stage,
        rotated = rotate,
        "stage advanced"
    );
    next
}

pub fn restart_run(state: &GameState, rng: &mut impl RandomSource) -> GameState {
    create_first_stage(&state.maze, &state.config(), rng)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::rng::Rng;
    use crate::types::Lifetime;

    fn catalog(size: i32, variants: usize) -> MazeCatalog {
        MazeCatalog::generated(&[size], variants, 31)
    }

    fn quiet_config(size: i32) -> RunConfig {
        RunConfig {
            size,
            enemy_counts: EnemyCounts::default(),
            ..RunConfig::default()
        }
    }

    #[test]
    fn pool_hands_out_every_layout_before_repeating() {
        let mut pool = MazePool::new(catalog(5, 4));
        let mut rng = Rng::new(1);
        let ids: HashSet<String> = (0..4)
            .map(|_| pool.draw(5, &mut rng).expect("layout").id)
            .collect();
        assert_eq!(ids.len(), 4);
        assert_eq!(pool.remaining(5), 4);
        let again = pool.draw(5, &mut rng).expect("pool refilled");
        assert!(ids.contains(&again.id));
        assert_eq!(pool.remaining(5), 3);
    }

    #[test]
    fn pool_returns_none_for_unknown_size_and_reset_refills() {
        let mut pool = MazePool::new(catalog(5, 2));
        let mut rng = Rng::new(2);
        assert!(pool.draw(6, &mut rng).is_none());
        pool.draw(5, &mut rng).expect("layout");
        assert_eq!(pool.remaining(5), 1);
        pool.reset();
        assert_eq!(pool.remaining(5), 2);
        assert_eq!(pool.draw_or_generate(6, None, &mut rng).size, 6);
    }

    #[test]
    fn pool_skips_excluded_layout_when_possible() {
        let mut pool = MazePool::new(catalog(4, 2));
        let mut rng = Rng::new(3);
        let first = pool.draw(4, &mut rng).expect("layout");
        let second = pool
            .draw_excluding(4, Some(&first.id), &mut rng)
            .expect("layout");
        assert_ne!(first.id, second.id);
        // Pool is empty now; a refill must still avoid `second`.
        let third = pool
            .draw_excluding(4, Some(&second.id), &mut rng)
            .expect("layout");
        assert_ne!(third.id, second.id);
    }

    #[test]
    fn first_stage_places_distinct_start_and_goal() {
        let base = catalog(5, 1).layouts(5)[0].clone();
        for seed in 0..40 {
            let mut rng = Rng::new(seed);
            let state = create_first_stage(&base, &RunConfig::freeplay(5), &mut rng);
            assert_ne!(state.maze.start, state.maze.goal);
            assert_eq!(state.player, state.maze.start);
            assert_eq!(state.stage, 1);
            assert_eq!(state.path, vec![state.player]);
            assert!(state.visited_goals.contains(&state.maze.goal));
            assert!(!state.final_stage);
            assert_eq!(state.enemies.len(), state.enemy_visited.len());
            assert_eq!(state.enemies.len(), state.enemy_paths.len());
            assert_eq!(state.respawn_stock, state.respawn_max);
        }
    }

    #[test]
    fn next_stage_starts_at_previous_goal_and_rotates_maze() {
        let mut pool = MazePool::new(catalog(5, 3));
        let mut rng = Rng::new(4);
        let base = pool.draw(5, &mut rng).expect("layout");
        let mut state = create_first_stage(&base, &quiet_config(5), &mut rng);
        state.hits.record(
            crate::maze::wall_key(state.player, Direction::Up),
            Lifetime::Unbounded,
        );
        state.steps = 9;
        state.total_steps = 9;

        let second = next_stage_state(&state, &mut pool, &mut rng);
        assert_eq!(second.stage, 2);
        assert_eq!(second.player, state.maze.goal);
        assert_eq!(second.maze.id, state.maze.id);
        assert_eq!(second.hits, state.hits);
        assert_eq!(second.steps, 0);
        assert_eq!(second.total_steps, 9);
        assert!(!state.visited_goals.contains(&second.maze.goal));

        let third = next_stage_state(&second, &mut pool, &mut rng);
        assert_eq!(third.maze.id, state.maze.id);
        let fourth = next_stage_state(&third, &mut pool, &mut rng);
        assert_eq!(fourth.stage, 4);
        assert_ne!(fourth.maze.id, state.maze.id);
        assert!(fourth.hits.is_empty());
        assert_eq!(fourth.visited_goals.len(), 4);
    }

    #[test]
    fn small_grid_runs_out_of_goals() {
        let base = Maze::open("tiny", 2, Vec2::new(0, 0), Vec2::new(1, 1));
        let mut pool = MazePool::new(MazeCatalog::default());
        let mut rng = Rng::new(5);
        let mut state = create_first_stage(&base, &quiet_config(2), &mut rng);
        let mut stages = 1;
        while !state.final_stage {
            state = next_stage_state(&state, &mut pool, &mut rng);
            stages += 1;
            assert!(stages <= 4);
        }
        assert_eq!(stages, 4);
        assert_eq!(state.visited_goals.len(), 4);
        let after = next_stage_state(&state, &mut pool, &mut rng);
        assert_eq!(after.stage, state.stage);
        assert!(after.final_stage);
    }

    #[test]
    fn restart_discards_progress_on_same_maze() {
        let mut pool = MazePool::new(catalog(5, 2));
        let mut rng = Rng::new(6);
        let base = pool.draw(5, &mut rng).expect("layout");
        let state = create_first_stage(&base, &RunConfig::freeplay(5), &mut rng);
        let advanced = next_stage_state(&state, &mut pool, &mut rng);
        let restarted = restart_run(&advanced, &mut rng);
        assert_eq!(restarted.stage, 1);
        assert_eq!(restarted.maze.id, advanced.maze.id);
        assert_eq!(restarted.visited_goals.len(), 1);
        assert_eq!(restarted.total_steps, 0);
    }

    #[test]
    fn level_rules_drive_stage_values() {
        let level = crate::levels::find_level("corridors").expect("level exists");
        let config = RunConfig::for_level(level);
        let mut pool = MazePool::new(catalog(config.size, 3));
        let mut rng = Rng::new(7);
        let base = pool.draw(config.size, &mut rng).expect("layout");
        let first = create_first_stage(&base, &config, &mut rng);
        assert_eq!(first.wall_lifetime, (level.wall_lifetime)(1));
        let second = next_stage_state(&first, &mut pool, &mut rng);
        assert_eq!(second.wall_lifetime, (level.wall_lifetime)(2));
        assert_eq!(second.enemy_counts, (level.enemy_counts)(2));
    }
}
