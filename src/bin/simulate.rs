use clap::Parser;
use maze_chase_engine::constants::{DEFAULT_SIZE, MAZE_VARIANTS_PER_SIZE};
use maze_chase_engine::engine::{Action, GameEngine, GameState, RunConfig};
use maze_chase_engine::levels::find_level;
use maze_chase_engine::maze::MazeCatalog;
use maze_chase_engine::pathfinding::shortest_step;
use maze_chase_engine::rng::{RandomSource, Rng};
use maze_chase_engine::store::{BestScoreStore, FileStore, Score, SuspendSlot};
use maze_chase_engine::types::Direction;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info, warn};

const WANDER_CHANCE: f64 = 0.15;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    size: Option<i32>,
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long, default_value_t = 3)]
    runs: usize,
    #[arg(long)]
    level: Option<String>,
    #[arg(long, default_value_t = 500)]
    max_turns: u32,
    /// JSON array of maze layouts.
    #[arg(long)]
    mazes: Option<PathBuf>,
    /// JSON `RunConfig`; overrides `--size` and `--level`.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory for best scores and the suspended final state.
    #[arg(long)]
    save_dir: Option<PathBuf>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Outcome {
    Cleared,
    CaughtOut,
    TurnLimit,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunResultLine {
    run: String,
    seed: u32,
    level: Option<String>,
    size: i32,
    outcome: Outcome,
    stage: u32,
    total_steps: u32,
    total_bumps: u32,
    turns: u32,
    catches: u32,
    respawns_used: u32,
    mazes_seen: usize,
    new_best: bool,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary {
    match_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    run_count: usize,
    anomaly_count: usize,
    average_stage: f64,
    outcome_counts: BTreeMap<String, usize>,
    runs: Vec<RunResultLine>,
}

fn main() {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();
    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(message) => {
            error!(%message, "invalid run configuration");
            std::process::exit(2);
        }
    };
    let base_seed = cli.seed.unwrap_or_else(rand::random::<u32>);
    let catalog = match load_catalog(cli.mazes.as_deref(), config.size, base_seed) {
        Ok(catalog) => catalog,
        Err(message) => {
            error!(%message, "failed to load maze layouts");
            std::process::exit(2);
        }
    };

    let started_at_ms = now_ms();
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(base_seed, started_at_ms));
    let score_key = config
        .level_id
        .clone()
        .unwrap_or_else(|| format!("freeplay-{}", config.size));
    let mut best_scores = cli
        .save_dir
        .clone()
        .map(|dir| BestScoreStore::new(FileStore::new(dir)));

    let mut results = Vec::new();
    let mut has_anomaly = false;
    for idx in 0..cli.runs {
        let seed = base_seed.wrapping_add(idx as u32);
        let name = format!("run-{}", idx + 1);
        info!(%match_id, run = %name, seed, size = config.size, "run started");

        let (mut result, final_state) =
            play_run(&name, &config, catalog.clone(), seed, cli.max_turns);
        if let Some(scores) = best_scores.as_mut() {
            result.new_best = scores.record(&score_key, Score::of_run(&final_state));
            for notice in scores.take_notices() {
                warn!(?notice, "best score not persisted");
            }
        }
        for anomaly in &result.anomalies {
            warn!(run = %name, seed, %anomaly, "anomaly detected");
        }
        has_anomaly |= !result.anomalies.is_empty();
        info!(
            run = %name,
            outcome = ?result.outcome,
            stage = result.stage,
            turns = result.turns,
            "run finished"
        );

        match serde_json::to_string(&result) {
            Ok(line) => println!("{line}"),
            Err(error) => error!(%error, "failed to serialize run result"),
        }
        if let Some(dir) = cli.save_dir.as_ref() {
            suspend_final_state(dir, &final_state);
        }
        results.push(result);
    }

    let summary = build_run_summary(match_id.clone(), started_at_ms, now_ms(), results);
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            error!(path = %path.display(), %error, "failed to write summary");
            std::process::exit(2);
        }
    }
    info!(
        %match_id,
        runs = summary.run_count,
        anomalies = summary.anomaly_count,
        average_stage = summary.average_stage,
        "simulation finished"
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn resolve_config(cli: &Cli) -> Result<RunConfig, String> {
    if let Some(path) = cli.config.as_ref() {
        let text = std::fs::read_to_string(path)
            .map_err(|error| format!("read {}: {error}", path.display()))?;
        return serde_json::from_str(&text)
            .map_err(|error| format!("parse {}: {error}", path.display()));
    }
    if let Some(level_id) = cli.level.as_deref() {
        let level = find_level(level_id).ok_or_else(|| format!("unknown level '{level_id}'"))?;
        return Ok(RunConfig::for_level(level));
    }
    let size = cli.size.unwrap_or(DEFAULT_SIZE);
    if size < 2 {
        return Err(format!("grid size {size} is too small"));
    }
    Ok(RunConfig::freeplay(size))
}

fn load_catalog(path: Option<&Path>, size: i32, seed: u32) -> Result<MazeCatalog, String> {
    let Some(path) = path else {
        return Ok(MazeCatalog::generated(&[size], MAZE_VARIANTS_PER_SIZE, seed));
    };
    let text = std::fs::read_to_string(path)
        .map_err(|error| format!("read {}: {error}", path.display()))?;
    MazeCatalog::from_json(&text).map_err(|error| format!("parse {}: {error}", path.display()))
}

fn play_run(
    name: &str,
    config: &RunConfig,
    catalog: MazeCatalog,
    seed: u32,
    max_turns: u32,
) -> (RunResultLine, GameState) {
    let mut engine = GameEngine::new(config.clone(), catalog, seed);
    let mut player_rng = Rng::new(seed ^ 0x5bd1_e995);
    let mut anomalies = BTreeSet::new();
    let mut mazes_seen = BTreeSet::from([engine.state().maze.id.clone()]);
    let mut catches = 0;
    let mut respawns_used = 0;
    let mut turns = 0;

    let outcome = loop {
        if turns >= max_turns {
            break Outcome::TurnLimit;
        }
        let dir = choose_player_move(engine.state(), &mut player_rng);
        let mut state = engine.dispatch(Action::Move(dir));
        turns += 1;
        for anomaly in collect_state_anomalies(&state) {
            anomalies.insert(anomaly);
        }

        if state.caught {
            catches += 1;
            if state.respawn_stock == 0 {
                break Outcome::CaughtOut;
            }
            respawns_used += 1;
            state = engine.dispatch(Action::RespawnEnemies(state.player));
        }
        if state.goal_reached() {
            if state.final_stage {
                break Outcome::Cleared;
            }
            let next = engine.dispatch(Action::NextStage);
            mazes_seen.insert(next.maze.id.clone());
        }
    };

    let state = engine.state().clone();
    let result = RunResultLine {
        run: name.to_string(),
        seed,
        level: state.level_id.clone(),
        size: state.maze.size,
        outcome,
        stage: state.stage,
        total_steps: state.total_steps,
        total_bumps: state.total_bumps,
        turns,
        catches,
        respawns_used,
        mazes_seen: mazes_seen.len(),
        new_best: false,
        anomalies: anomalies.into_iter().collect(),
    };
    (result, state)
}

fn choose_player_move(state: &GameState, rng: &mut impl RandomSource) -> Direction {
    if rng.next_f64() < WANDER_CHANCE {
        return Direction::ALL[rng.pick_index(Direction::ALL.len())];
    }
    shortest_step(state.player, state.maze.goal, &state.maze)
        .and_then(|step| step.direction)
        .unwrap_or_else(|| Direction::ALL[rng.pick_index(Direction::ALL.len())])
}

fn collect_state_anomalies(state: &GameState) -> Vec<String> {
    let mut anomalies = Vec::new();
    if !state.maze.in_bounds(state.player) {
        anomalies.push(format!("player out of bounds: {}", state.player));
    }
    for enemy in &state.enemies {
        if !state.maze.in_bounds(enemy.pos) {
            anomalies.push(format!("enemy out of bounds: {}", enemy.pos));
        }
    }
    if state.enemy_visited.len() != state.enemies.len()
        || state.enemy_paths.len() != state.enemies.len()
    {
        anomalies.push("enemy bookkeeping out of sync with roster".to_string());
    }
    if let Some(limit) = state.path_length.as_option() {
        if state.path.len() > limit.max(1) as usize {
            anomalies.push(format!("player path exceeds limit: {}", state.path.len()));
        }
    }
    if state.respawn_stock > state.respawn_max {
        anomalies.push("respawn stock above maximum".to_string());
    }
    if state.maze.start == state.maze.goal {
        anomalies.push("start and goal coincide".to_string());
    }
    anomalies
}

fn suspend_final_state(dir: &Path, state: &GameState) {
    let mut slot = SuspendSlot::new(FileStore::new(dir.to_path_buf()));
    slot.save(state);
    for notice in slot.take_notices() {
        warn!(?notice, "final state not suspended");
    }
}

fn default_match_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn outcome_key(outcome: Outcome) -> String {
    match outcome {
        Outcome::Cleared => "cleared",
        Outcome::CaughtOut => "caught_out",
        Outcome::TurnLimit => "turn_limit",
    }
    .to_string()
}

fn build_run_summary(
    match_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    runs: Vec<RunResultLine>,
) -> RunSummary {
    let run_count = runs.len();
    let mut outcome_counts = BTreeMap::new();
    for run in &runs {
        *outcome_counts.entry(outcome_key(run.outcome)).or_insert(0) += 1;
    }
    let average_stage = if run_count == 0 {
        0.0
    } else {
        runs.iter().map(|run| f64::from(run.stage)).sum::<f64>() / run_count as f64
    };
    RunSummary {
        match_id,
        started_at_ms,
        finished_at_ms,
        run_count,
        anomaly_count: runs.iter().map(|run| run.anomalies.len()).sum(),
        average_stage,
        outcome_counts,
        runs,
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
