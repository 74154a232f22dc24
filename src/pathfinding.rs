use std::collections::{HashMap, VecDeque};

use crate::maze::{manhattan, next_position, Maze};
use crate::types::{Direction, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathStep {
    pub direction: Option<Direction>,
    pub distance: u32,
}

/// Breadth-first search over legal moves. Neighbours are expanded in
/// `Direction::ALL` order so ties always resolve the same way.
pub fn shortest_step(from: Vec2, to: Vec2, maze: &Maze) -> Option<PathStep> {
    if from == to {
        return Some(PathStep {
            direction: None,
            distance: 0,
        });
    }
    if !maze.in_bounds(from) || !maze.in_bounds(to) {
        return None;
    }

    // cell -> (first direction taken from `from`, distance)
    let mut seen: HashMap<Vec2, (Direction, u32)> = HashMap::new();
    let mut queue = VecDeque::new();
    for dir in Direction::ALL {
        if !maze.can_move(from, dir) {
            continue;
        }
        let next = next_position(from, dir);
        if seen.contains_key(&next) {
            continue;
        }
        seen.insert(next, (dir, 1));
        queue.push_back(next);
    }

    while let Some(cell) = queue.pop_front() {
        let (first, distance) = seen[&cell];
        if cell == to {
            return Some(PathStep {
                direction: Some(first),
                distance,
            });
        }
        for dir in Direction::ALL {
            if !maze.can_move(cell, dir) {
                continue;
            }
            let next = next_position(cell, dir);
            if next == from || seen.contains_key(&next) {
                continue;
            }
            seen.insert(next, (first, distance + 1));
            queue.push_back(next);
        }
    }
    None
}

pub fn in_sight(observer: Vec2, target: Vec2, maze: &Maze, range: Option<u32>) -> bool {
    if observer.x != target.x && observer.y != target.y {
        return false;
    }
    if let Some(range) = range {
        if manhattan(observer, target) > range {
            return false;
        }
    }
    let dir = if observer.x == target.x {
        if target.y < observer.y {
            Direction::Up
        } else {
            Direction::Down
        }
    } else if target.x < observer.x {
        Direction::Left
    } else {
        Direction::Right
    };

    let mut cell = observer;
    while cell != target {
        if !maze.can_move(cell, dir) {
            return false;
        }
        cell = next_position(cell, dir);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::generate_layout;
    use crate::rng::Rng;

    fn open(size: i32) -> Maze {
        Maze::open("open", size, Vec2::new(0, 0), Vec2::new(size - 1, size - 1))
    }

    #[test]
    fn open_grid_distance_is_manhattan() {
        let maze = open(5);
        for a in maze.cells() {
            for b in [Vec2::new(0, 0), Vec2::new(4, 4), Vec2::new(2, 3)] {
                let step = shortest_step(a, b, &maze).expect("open grid is connected");
                assert_eq!(step.distance, manhattan(a, b));
            }
        }
    }

    #[test]
    fn ties_prefer_up_then_down_then_left_then_right() {
        let maze = open(5);
        let step = shortest_step(Vec2::new(2, 2), Vec2::new(0, 0), &maze).unwrap();
        assert_eq!(step.direction, Some(Direction::Up));
        let step = shortest_step(Vec2::new(2, 2), Vec2::new(4, 4), &maze).unwrap();
        assert_eq!(step.direction, Some(Direction::Down));
        let step = shortest_step(Vec2::new(2, 2), Vec2::new(0, 2), &maze).unwrap();
        assert_eq!(step.direction, Some(Direction::Left));
    }

    #[test]
    fn walls_force_detour() {
        // Wall between (0,0) and (1,0); path must go around through row 1.
        let maze = open(3).with_wall(Vec2::new(0, 0), Direction::Right);
        let step = shortest_step(Vec2::new(0, 0), Vec2::new(1, 0), &maze).unwrap();
        assert_eq!(step.direction, Some(Direction::Down));
        assert_eq!(step.distance, 3);
    }

    #[test]
    fn sealed_cell_is_unreachable() {
        let maze = open(3)
            .with_wall(Vec2::new(2, 2), Direction::Up)
            .with_wall(Vec2::new(2, 2), Direction::Left);
        assert_eq!(shortest_step(Vec2::new(0, 0), Vec2::new(2, 2), &maze), None);
    }

    #[test]
    fn same_cell_has_zero_distance() {
        let maze = open(3);
        let step = shortest_step(Vec2::new(1, 1), Vec2::new(1, 1), &maze).unwrap();
        assert_eq!(step.direction, None);
        assert_eq!(step.distance, 0);
    }

    #[test]
    fn bfs_distance_matches_generated_layout_symmetry() {
        let mut rng = Rng::new(5);
        let maze = generate_layout("g", 6, &mut rng);
        let a = Vec2::new(0, 5);
        let b = Vec2::new(5, 0);
        let ab = shortest_step(a, b, &maze).unwrap().distance;
        let ba = shortest_step(b, a, &maze).unwrap().distance;
        assert_eq!(ab, ba);
        assert!(ab >= manhattan(a, b));
    }

    #[test]
    fn sight_requires_alignment_and_clear_line() {
        let maze = open(5).with_wall(Vec2::new(2, 0), Direction::Right);
        assert!(in_sight(Vec2::new(0, 0), Vec2::new(2, 0), &maze, None));
        assert!(!in_sight(Vec2::new(0, 0), Vec2::new(4, 0), &maze, None));
        assert!(!in_sight(Vec2::new(0, 0), Vec2::new(1, 1), &maze, None));
        assert!(in_sight(Vec2::new(3, 4), Vec2::new(3, 0), &maze, None));
        assert!(!in_sight(Vec2::new(3, 4), Vec2::new(3, 0), &maze, Some(3)));
        assert!(in_sight(Vec2::new(1, 1), Vec2::new(1, 1), &maze, Some(0)));
    }
}
