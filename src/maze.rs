use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::MAZE_EXTRA_OPENINGS_DIVISOR;
use crate::rng::{RandomSource, Rng};
use crate::types::{Direction, Vec2, WallKey, WallOrientation};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maze {
    pub id: String,
    pub size: i32,
    pub start: Vec2,
    pub goal: Vec2,
    /// Cells with a wall on their east side.
    #[serde(rename = "verticalWalls", default)]
    pub v_walls: BTreeSet<Vec2>,
    /// Cells with a wall on their south side.
    #[serde(rename = "horizontalWalls", default)]
    pub h_walls: BTreeSet<Vec2>,
}

impl Maze {
    pub fn open(id: impl Into<String>, size: i32, start: Vec2, goal: Vec2) -> Self {
        Self {
            id: id.into(),
            size,
            start,
            goal,
            v_walls: BTreeSet::new(),
            h_walls: BTreeSet::new(),
        }
    }

    pub fn with_wall(mut self, cell: Vec2, dir: Direction) -> Self {
        let key = wall_key(cell, dir);
        match key.orientation {
            WallOrientation::Vertical => self.v_walls.insert(key.cell),
            WallOrientation::Horizontal => self.h_walls.insert(key.cell),
        };
        self
    }

    pub fn with_endpoints(&self, start: Vec2, goal: Vec2) -> Self {
        Self {
            start,
            goal,
            ..self.clone()
        }
    }

    pub fn in_bounds(&self, pos: Vec2) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.size && pos.y < self.size
    }

    pub fn cell_count(&self) -> usize {
        (self.size.max(0) as usize).pow(2)
    }

    pub fn cells(&self) -> Vec<Vec2> {
        let mut out = Vec::with_capacity(self.cell_count());
        for y in 0..self.size {
            for x in 0..self.size {
                out.push(Vec2 { x, y });
            }
        }
        out
    }

    pub fn hit_wall(&self, pos: Vec2, dir: Direction) -> Option<WallKey> {
        let key = wall_key(pos, dir);
        if !self.in_bounds(pos) || !self.in_bounds(next_position(pos, dir)) {
            return Some(key);
        }
        let blocked = match key.orientation {
            WallOrientation::Vertical => self.v_walls.contains(&key.cell),
            WallOrientation::Horizontal => self.h_walls.contains(&key.cell),
        };
        blocked.then_some(key)
    }

    pub fn can_move(&self, pos: Vec2, dir: Direction) -> bool {
        self.hit_wall(pos, dir).is_none()
    }

    pub fn legal_directions(&self, pos: Vec2) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|dir| self.can_move(pos, *dir))
            .collect()
    }
}

pub fn next_position(pos: Vec2, dir: Direction) -> Vec2 {
    let (dx, dy) = dir.delta();
    Vec2 {
        x: pos.x + dx,
        y: pos.y + dy,
    }
}

pub fn manhattan(a: Vec2, b: Vec2) -> u32 {
    a.x.abs_diff(b.x) + a.y.abs_diff(b.y)
}

/// Canonical key of the edge crossed when leaving `pos` in `dir`.
pub fn wall_key(pos: Vec2, dir: Direction) -> WallKey {
    match dir {
        Direction::Right => WallKey {
            orientation: WallOrientation::Vertical,
            cell: pos,
        },
        Direction::Left => WallKey {
            orientation: WallOrientation::Vertical,
            cell: Vec2::new(pos.x - 1, pos.y),
        },
        Direction::Down => WallKey {
            orientation: WallOrientation::Horizontal,
            cell: pos,
        },
        Direction::Up => WallKey {
            orientation: WallOrientation::Horizontal,
            cell: Vec2::new(pos.x, pos.y - 1),
        },
    }
}

pub fn generate_layout(id: impl Into<String>, size: i32, rng: &mut impl RandomSource) -> Maze {
    let size = size.max(2);
    let mut maze = Maze::open(id, size, Vec2::new(0, 0), Vec2::new(size - 1, size - 1));
    for y in 0..size {
        for x in 0..size {
            if x < size - 1 {
                maze.v_walls.insert(Vec2 { x, y });
            }
            if y < size - 1 {
                maze.h_walls.insert(Vec2 { x, y });
            }
        }
    }

    let mut visited = BTreeSet::new();
    let mut stack = vec![Vec2::new(0, 0)];
    visited.insert(Vec2::new(0, 0));
    while let Some(&current) = stack.last() {
        let options: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|dir| {
                let next = next_position(current, *dir);
                maze.in_bounds(next) && !visited.contains(&next)
            })
            .collect();
        if options.is_empty() {
            stack.pop();
            continue;
        }
        let dir = options[rng.pick_index(options.len())];
        remove_wall(&mut maze, wall_key(current, dir));
        let next = next_position(current, dir);
        visited.insert(next);
        stack.push(next);
    }

    let mut remaining: Vec<WallKey> = maze
        .v_walls
        .iter()
        .map(|cell| WallKey {
            orientation: WallOrientation::Vertical,
            cell: *cell,
        })
        .chain(maze.h_walls.iter().map(|cell| WallKey {
            orientation: WallOrientation::Horizontal,
            cell: *cell,
        }))
        .collect();
    let openings = remaining.len() / MAZE_EXTRA_OPENINGS_DIVISOR;
    for _ in 0..openings {
        if remaining.is_empty() {
            break;
        }
        let key = remaining.swap_remove(rng.pick_index(remaining.len()));
        remove_wall(&mut maze, key);
    }
    maze
}

fn remove_wall(maze: &mut Maze, key: WallKey) {
    match key.orientation {
        WallOrientation::Vertical => maze.v_walls.remove(&key.cell),
        WallOrientation::Horizontal => maze.h_walls.remove(&key.cell),
    };
}

#[derive(Clone, Debug, Default)]
pub struct MazeCatalog {
    layouts: BTreeMap<i32, Vec<Maze>>,
}

impl MazeCatalog {
    pub fn generated(sizes: &[i32], variants: usize, seed: u32) -> Self {
        let mut rng = Rng::new(seed);
        let mut catalog = Self::default();
        for &size in sizes {
            for variant in 0..variants.max(1) {
                catalog.insert(generate_layout(
                    format!("gen-{size}-{variant}"),
                    size,
                    &mut rng,
                ));
            }
        }
        debug!(sizes = ?sizes, variants, seed, "generated maze catalog");
        catalog
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let mazes: Vec<Maze> = serde_json::from_str(text)?;
        let mut catalog = Self::default();
        for maze in mazes {
            catalog.insert(maze);
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, maze: Maze) {
        self.layouts.entry(maze.size).or_default().push(maze);
    }

    pub fn layouts(&self, size: i32) -> &[Maze] {
        self.layouts.get(&size).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn sizes(&self) -> Vec<i32> {
        self.layouts.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashSet, VecDeque};

    use super::*;

    fn reachable_from_origin(maze: &Maze) -> HashSet<Vec2> {
        let mut out = HashSet::new();
        let mut queue = VecDeque::new();
        out.insert(Vec2::new(0, 0));
        queue.push_back(Vec2::new(0, 0));
        while let Some(cell) = queue.pop_front() {
            for dir in maze.legal_directions(cell) {
                let next = next_position(cell, dir);
                if out.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        out
    }

    #[test]
    fn can_move_agrees_with_hit_wall_everywhere() {
        let mut rng = Rng::new(11);
        let maze = generate_layout("m", 6, &mut rng);
        for cell in maze.cells() {
            for dir in Direction::ALL {
                assert_eq!(maze.can_move(cell, dir), maze.hit_wall(cell, dir).is_none());
            }
        }
    }

    #[test]
    fn boundaries_block_with_edge_keys() {
        let maze = Maze::open("open", 3, Vec2::new(0, 0), Vec2::new(2, 2));
        assert_eq!(
            maze.hit_wall(Vec2::new(0, 1), Direction::Left),
            Some(WallKey {
                orientation: WallOrientation::Vertical,
                cell: Vec2::new(-1, 1),
            })
        );
        assert_eq!(
            maze.hit_wall(Vec2::new(1, 0), Direction::Up),
            Some(WallKey {
                orientation: WallOrientation::Horizontal,
                cell: Vec2::new(1, -1),
            })
        );
        assert_eq!(
            maze.hit_wall(Vec2::new(2, 2), Direction::Right),
            Some(WallKey {
                orientation: WallOrientation::Vertical,
                cell: Vec2::new(2, 2),
            })
        );
        assert!(maze.can_move(Vec2::new(1, 1), Direction::Down));
    }

    #[test]
    fn interior_wall_blocks_both_sides() {
        let maze = Maze::open("w", 3, Vec2::new(0, 0), Vec2::new(2, 2))
            .with_wall(Vec2::new(1, 1), Direction::Right);
        assert!(!maze.can_move(Vec2::new(1, 1), Direction::Right));
        assert!(!maze.can_move(Vec2::new(2, 1), Direction::Left));
        assert_eq!(
            maze.hit_wall(Vec2::new(2, 1), Direction::Left),
            maze.hit_wall(Vec2::new(1, 1), Direction::Right)
        );
        assert!(maze.can_move(Vec2::new(1, 1), Direction::Left));
    }

    #[test]
    fn manhattan_is_symmetric() {
        let a = Vec2::new(1, 4);
        let b = Vec2::new(3, 0);
        assert_eq!(manhattan(a, b), manhattan(b, a));
        assert_eq!(manhattan(a, b), 6);
        assert_eq!(manhattan(a, a), 0);
    }

    #[test]
    fn generated_layouts_are_fully_connected() {
        let catalog = MazeCatalog::generated(&[4, 7], 3, 2024);
        for size in catalog.sizes() {
            for maze in catalog.layouts(size) {
                assert_eq!(reachable_from_origin(maze).len(), maze.cell_count());
            }
        }
    }

    #[test]
    fn same_seed_generates_same_catalog() {
        let a = MazeCatalog::generated(&[5], 2, 77);
        let b = MazeCatalog::generated(&[5], 2, 77);
        assert_eq!(a.layouts(5), b.layouts(5));
        assert!(a.layouts(6).is_empty());
    }

    #[test]
    fn catalog_loads_raw_json() {
        let text = r#"[
  {
    "id": "tiny",
    "size": 2,
    "start": { "x": 0, "y": 0 },
    "goal": { "x": 1, "y": 1 },
    "verticalWalls": [{ "x": 0, "y": 0 }]
  }
]"#;
        let catalog = MazeCatalog::from_json(text).expect("valid catalog");
        let maze = &catalog.layouts(2)[0];
        assert_eq!(maze.id, "tiny");
        assert!(!maze.can_move(Vec2::new(0, 0), Direction::Right));
        assert!(maze.h_walls.is_empty());
    }
}
