use super::*;
use crate::constants::{ENEMY_PATH_LENGTH, SMART_CHASE_DISTANCE};
use crate::pathfinding::{in_sight, shortest_step};

#[derive(Clone, Copy, Debug)]
pub struct PlayerTrack {
    pub before: Vec2,
    pub after: Vec2,
}

/// Runs one turn of an enemy. Returns true when one of its steps crossed
/// the player head-on, i.e. it left the player's new cell for the old one.
pub fn take_turn(
    enemy: &mut Enemy,
    visited: &mut VisitMap,
    trail: &mut Vec<Vec2>,
    maze: &Maze,
    player: PlayerTrack,
    sight_range: Option<u32>,
    rng: &mut impl RandomSource,
) -> bool {
    if enemy.cooldown > 0 {
        enemy.cooldown -= 1;
        return false;
    }
    enemy.cooldown = enemy.interval.saturating_sub(1);

    for _ in 0..enemy.repeat.max(1) {
        let Some(dir) = choose_direction(enemy, maze, visited, player, sight_range, rng) else {
            continue;
        };
        let from = enemy.pos;
        enemy.pos = next_position(from, dir);
        *visited.entry(enemy.pos).or_insert(0) += 1;
        trail.push(enemy.pos);
        if trail.len() > ENEMY_PATH_LENGTH {
            trail.drain(..trail.len() - ENEMY_PATH_LENGTH);
        }
        if enemy.target == Some(enemy.pos) {
            enemy.target = None;
        }
        if from == player.after && enemy.pos == player.before {
            return true;
        }
        if enemy.pos == player.after {
            break;
        }
    }
    false
}

pub fn choose_direction(
    enemy: &mut Enemy,
    maze: &Maze,
    visited: &VisitMap,
    player: PlayerTrack,
    sight_range: Option<u32>,
    rng: &mut impl RandomSource,
) -> Option<Direction> {
    match enemy.behavior {
        Behavior::Random => random_step(enemy.pos, maze, rng),
        Behavior::Basic => frontier_step(enemy.pos, maze, visited, rng),
        Behavior::Smart => match shortest_step(enemy.pos, player.after, maze) {
            Some(PathStep {
                direction,
                distance,
            }) if distance <= SMART_CHASE_DISTANCE => direction,
            _ => frontier_step(enemy.pos, maze, visited, rng),
        },
        Behavior::Sight => {
            if in_sight(enemy.pos, player.after, maze, sight_range)
                || in_sight(enemy.pos, player.before, maze, sight_range)
            {
                enemy.target = Some(player.after);
            }
            if enemy.target == Some(enemy.pos) {
                enemy.target = None;
            }
            match enemy.target {
                Some(target) => match shortest_step(enemy.pos, target, maze) {
                    Some(step) => step.direction,
                    None => toward_step(enemy.pos, target, maze),
                },
                None => frontier_step(enemy.pos, maze, visited, rng),
            }
        }
    }
}

fn random_step(pos: Vec2, maze: &Maze, rng: &mut impl RandomSource) -> Option<Direction> {
    let options = maze.legal_directions(pos);
    if options.is_empty() {
        return None;
    }
    Some(options[rng.pick_index(options.len())])
}

fn frontier_step(
    pos: Vec2,
    maze: &Maze,
    visited: &VisitMap,
    rng: &mut impl RandomSource,
) -> Option<Direction> {
    let options: Vec<(Direction, u32)> = maze
        .legal_directions(pos)
        .into_iter()
        .map(|dir| {
            let count = visited
                .get(&next_position(pos, dir))
                .copied()
                .unwrap_or(0);
            (dir, count)
        })
        .collect();
    let fewest = options.iter().map(|(_, count)| *count).min()?;
    let best: Vec<Direction> = options
        .into_iter()
        .filter(|(_, count)| *count == fewest)
        .map(|(dir, _)| dir)
        .collect();
    Some(best[rng.pick_index(best.len())])
}

fn toward_step(pos: Vec2, target: Vec2, maze: &Maze) -> Option<Direction> {
    maze.legal_directions(pos)
        .into_iter()
        .min_by_key(|dir| manhattan(next_position(pos, *dir), target))
}
