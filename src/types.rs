use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Fixed check order; BFS tie-breaking depends on it.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn key(self) -> String {
        format!("{},{}", self.x, self.y)
    }

    pub fn parse_key(key: &str) -> Option<Self> {
        let (x, y) = key.split_once(',')?;
        Some(Self {
            x: x.trim().parse().ok()?,
            y: y.trim().parse().ok()?,
        })
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Remaining lifetime of a mark, or a configured limit. `Unbounded` never
/// expires and compares greater than every finite value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    Finite(u32),
    #[default]
    Unbounded,
}

impl Lifetime {
    pub fn decay(self) -> Option<Lifetime> {
        match self {
            Lifetime::Unbounded => Some(Lifetime::Unbounded),
            Lifetime::Finite(turns) if turns > 1 => Some(Lifetime::Finite(turns - 1)),
            Lifetime::Finite(_) => None,
        }
    }

    pub fn is_expired(self) -> bool {
        self == Lifetime::Finite(0)
    }

    pub fn cap(self, len: usize) -> usize {
        match self {
            Lifetime::Unbounded => len,
            Lifetime::Finite(limit) => len.min(limit as usize),
        }
    }

    pub fn as_option(self) -> Option<u32> {
        match self {
            Lifetime::Finite(turns) => Some(turns),
            Lifetime::Unbounded => None,
        }
    }

    pub fn from_option(value: Option<u32>) -> Self {
        value.map_or(Lifetime::Unbounded, Lifetime::Finite)
    }
}

impl Ord for Lifetime {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Lifetime::Unbounded, Lifetime::Unbounded) => Ordering::Equal,
            (Lifetime::Unbounded, Lifetime::Finite(_)) => Ordering::Greater,
            (Lifetime::Finite(_), Lifetime::Unbounded) => Ordering::Less,
            (Lifetime::Finite(a), Lifetime::Finite(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Lifetime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for Lifetime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_option().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Lifetime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<u32>::deserialize(deserializer).map(Lifetime::from_option)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WallOrientation {
    /// Wall on the east side of `cell`.
    Vertical,
    /// Wall on the south side of `cell`.
    Horizontal,
}

/// One edge between two cells or between a cell and the grid boundary.
/// West/north boundaries are keyed on the virtual cell at -1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WallKey {
    pub orientation: WallOrientation,
    pub cell: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Behavior {
    Random,
    Basic,
    Smart,
    Sight,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Random,
    Slow,
    Sight,
    Fast,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 4] = [
        EnemyKind::Random,
        EnemyKind::Slow,
        EnemyKind::Sight,
        EnemyKind::Fast,
    ];

    /// `(interval, repeat)`: act every `interval` turns, `repeat` steps each time.
    pub fn cadence(self) -> (u32, u32) {
        match self {
            EnemyKind::Random | EnemyKind::Sight => (1, 1),
            EnemyKind::Slow => (2, 1),
            EnemyKind::Fast => (1, 2),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyCounts {
    pub random: u32,
    pub slow: u32,
    pub sight: u32,
    pub fast: u32,
}

impl EnemyCounts {
    pub fn of(self, kind: EnemyKind) -> u32 {
        match kind {
            EnemyKind::Random => self.random,
            EnemyKind::Slow => self.slow,
            EnemyKind::Sight => self.sight,
            EnemyKind::Fast => self.fast,
        }
    }

    pub fn total(self) -> u32 {
        self.random + self.slow + self.sight + self.fast
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyBehaviors {
    pub random: Behavior,
    pub slow: Behavior,
    pub sight: Behavior,
    pub fast: Behavior,
}

impl Default for EnemyBehaviors {
    fn default() -> Self {
        Self {
            random: Behavior::Random,
            slow: Behavior::Smart,
            sight: Behavior::Sight,
            fast: Behavior::Basic,
        }
    }
}

impl EnemyBehaviors {
    pub fn of(self, kind: EnemyKind) -> Behavior {
        match kind {
            EnemyKind::Random => self.random,
            EnemyKind::Slow => self.slow,
            EnemyKind::Sight => self.sight,
            EnemyKind::Fast => self.fast,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enemy {
    pub pos: Vec2,
    #[serde(default = "visible_by_default")]
    pub visible: bool,
    pub interval: u32,
    pub cooldown: u32,
    pub repeat: u32,
    pub behavior: Behavior,
    pub kind: EnemyKind,
    #[serde(default)]
    pub target: Option<Vec2>,
}

fn visible_by_default() -> bool {
    true
}

impl Enemy {
    pub fn new(pos: Vec2, kind: EnemyKind, behavior: Behavior) -> Self {
        let (interval, repeat) = kind.cadence();
        Self {
            pos,
            visible: true,
            interval,
            cooldown: 0,
            repeat,
            behavior,
            kind,
            target: None,
        }
    }
}
