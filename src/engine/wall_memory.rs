use std::collections::BTreeMap;

use crate::maze::Maze;
use crate::types::{Direction, Lifetime, Vec2, WallKey, WallOrientation};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WallHits {
    pub v: BTreeMap<Vec2, Lifetime>,
    pub h: BTreeMap<Vec2, Lifetime>,
}

impl WallHits {
    pub fn get(&self, key: WallKey) -> Option<Lifetime> {
        self.side(key.orientation).get(&key.cell).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.v.is_empty() && self.h.is_empty()
    }

    pub fn len(&self) -> usize {
        self.v.len() + self.h.len()
    }

    pub fn decay(&mut self) {
        for map in [&mut self.v, &mut self.h] {
            map.retain(|_, life| match life.decay() {
                Some(next) => {
                    *life = next;
                    true
                }
                None => false,
            });
        }
    }

    /// Marks a wall; an existing mark is only ever extended.
    pub fn record(&mut self, key: WallKey, life: Lifetime) {
        if life.is_expired() {
            return;
        }
        let map = self.side_mut(key.orientation);
        match map.get(&key.cell) {
            Some(current) if *current >= life => {}
            _ => {
                map.insert(key.cell, life);
            }
        }
    }

    pub fn reveal_adjacent(&mut self, maze: &Maze, pos: Vec2, life: Lifetime) {
        for dir in Direction::ALL {
            if let Some(key) = maze.hit_wall(pos, dir) {
                self.record(key, life);
            }
        }
    }

    fn side(&self, orientation: WallOrientation) -> &BTreeMap<Vec2, Lifetime> {
        match orientation {
            WallOrientation::Vertical => &self.v,
            WallOrientation::Horizontal => &self.h,
        }
    }

    fn side_mut(&mut self, orientation: WallOrientation) -> &mut BTreeMap<Vec2, Lifetime> {
        match orientation {
            WallOrientation::Vertical => &mut self.v,
            WallOrientation::Horizontal => &mut self.h,
        }
    }
}
