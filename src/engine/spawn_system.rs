use std::collections::BTreeSet;

use tracing::debug;

use super::utils::pick_cell_index;
use super::*;

pub fn spawn_enemies(
    counts: EnemyCounts,
    behaviors: EnemyBehaviors,
    maze: &Maze,
    exclude: &BTreeSet<Vec2>,
    reference: Vec2,
    biased: bool,
    rng: &mut impl RandomSource,
) -> Vec<Enemy> {
    let mut pool: Vec<Vec2> = maze
        .cells()
        .into_iter()
        .filter(|cell| !exclude.contains(cell))
        .collect();
    let mut enemies = Vec::with_capacity(counts.total() as usize);
    for kind in EnemyKind::ALL {
        for _ in 0..counts.of(kind) {
            let Some(idx) = pick_cell_index(&pool, reference, biased, rng) else {
                debug!(?kind, "no free cell left for enemy");
                return enemies;
            };
            let cell = pool.remove(idx);
            enemies.push(Enemy::new(cell, kind, behaviors.of(kind)));
        }
    }
    enemies
}

impl GameState {
    pub(super) fn respawn_roster(&mut self, reference: Vec2, rng: &mut impl RandomSource) {
        let exclude: BTreeSet<Vec2> = [self.maze.start, self.maze.goal, reference]
            .into_iter()
            .collect();
        self.enemies = spawn_enemies(
            self.enemy_counts,
            self.enemy_behaviors,
            &self.maze,
            &exclude,
            reference,
            self.biased_spawn,
            rng,
        );
        self.enemy_visited = self
            .enemies
            .iter()
            .map(|enemy| VisitMap::from([(enemy.pos, 1)]))
            .collect();
        self.enemy_paths = self.enemies.iter().map(|enemy| vec![enemy.pos]).collect();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::rng::{Rng, SequenceRng};

    fn maze() -> Maze {
        Maze::open("open", 4, Vec2::new(0, 0), Vec2::new(3, 3))
    }

    #[test]
    fn never_spawns_on_start_goal_or_twice() {
        let maze = maze();
        let exclude = BTreeSet::from([maze.start, maze.goal]);
        let counts = EnemyCounts {
            random: 4,
            slow: 4,
            sight: 3,
            fast: 3,
        };
        for seed in 0..50u32 {
            let mut rng = Rng::new(seed);
            let enemies = spawn_enemies(
                counts,
                EnemyBehaviors::default(),
                &maze,
                &exclude,
                maze.start,
                seed % 2 == 0,
                &mut rng,
            );
            assert_eq!(enemies.len(), 14);
            let cells: HashSet<Vec2> = enemies.iter().map(|enemy| enemy.pos).collect();
            assert_eq!(cells.len(), enemies.len());
            assert!(!cells.contains(&maze.start));
            assert!(!cells.contains(&maze.goal));
        }
    }

    #[test]
    fn stops_when_cells_run_out() {
        let maze = maze();
        let exclude = BTreeSet::from([maze.start, maze.goal]);
        let counts = EnemyCounts {
            random: 20,
            ..EnemyCounts::default()
        };
        let mut rng = SequenceRng::new(vec![0.0]);
        let enemies = spawn_enemies(
            counts,
            EnemyBehaviors::default(),
            &maze,
            &exclude,
            maze.start,
            false,
            &mut rng,
        );
        assert_eq!(enemies.len(), 14);
    }

    #[test]
    fn kinds_carry_their_behavior_and_cadence() {
        let maze = maze();
        let counts = EnemyCounts {
            random: 1,
            slow: 1,
            sight: 1,
            fast: 1,
        };
        let mut rng = Rng::new(8);
        let enemies = spawn_enemies(
            counts,
            EnemyBehaviors::default(),
            &maze,
            &BTreeSet::new(),
            maze.start,
            true,
            &mut rng,
        );
        let kinds: Vec<(EnemyKind, Behavior, u32, u32)> = enemies
            .iter()
            .map(|enemy| (enemy.kind, enemy.behavior, enemy.interval, enemy.repeat))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (EnemyKind::Random, Behavior::Random, 1, 1),
                (EnemyKind::Slow, Behavior::Smart, 2, 1),
                (EnemyKind::Sight, Behavior::Sight, 1, 1),
                (EnemyKind::Fast, Behavior::Basic, 1, 2),
            ]
        );
    }
}
