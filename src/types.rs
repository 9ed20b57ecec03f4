// Board and agent types shared by the simulator and both planners
//
// Everything here is plain data with value semantics. Planners clone a World
// before touching it, so no branch ever observes another branch's moves.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 2D coordinate on the board
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }

    /// The four grid neighbours, in `Direction::all()` order
    pub fn neighbors(&self) -> [Coord; 4] {
        let dirs = Direction::all();
        [
            dirs[0].apply(self),
            dirs[1].apply(self),
            dirs[2].apply(self),
            dirs[3].apply(self),
        ]
    }
}

/// Absolute facing, ordered clockwise so that turning is modular arithmetic
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// Returns all directions in clockwise order starting from Up
    pub fn all() -> [Direction; 4] {
        [Direction::Up, Direction::Right, Direction::Down, Direction::Left]
    }

    pub fn index(&self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }

    pub fn from_index(idx: u8) -> Direction {
        Direction::all()[(idx % 4) as usize]
    }

    /// Facing after applying a relative move: `(current + offset) mod 4`
    pub fn turn(&self, mv: Move) -> Direction {
        Direction::from_index(self.index() + mv.offset())
    }

    /// Calculates the next coordinate when moving in this direction
    pub fn apply(&self, coord: &Coord) -> Coord {
        match self {
            Direction::Up => Coord { x: coord.x, y: coord.y + 1 },
            Direction::Down => Coord { x: coord.x, y: coord.y - 1 },
            Direction::Left => Coord { x: coord.x - 1, y: coord.y },
            Direction::Right => Coord { x: coord.x + 1, y: coord.y },
        }
    }
}

/// Relative move command, interpreted against the agent's current facing
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Left,
    Straight,
    Right,
}

impl Move {
    /// All moves in the order the planners expand them
    pub fn all() -> [Move; 3] {
        [Move::Left, Move::Straight, Move::Right]
    }

    /// Clockwise quarter turns added to the facing index
    pub fn offset(&self) -> u8 {
        match self {
            Move::Left => 3,
            Move::Straight => 0,
            Move::Right => 1,
        }
    }

    /// Position within `Move::all()`, used for per-move bookkeeping arrays
    pub fn index(&self) -> usize {
        match self {
            Move::Left => 0,
            Move::Straight => 1,
            Move::Right => 2,
        }
    }

    /// Converts move to string representation for API response
    pub fn as_str(&self) -> &'static str {
        match self {
            Move::Left => "left",
            Move::Straight => "straight",
            Move::Right => "right",
        }
    }

    pub fn parse(s: &str) -> Result<Move, String> {
        match s.trim().to_lowercase().as_str() {
            "left" => Ok(Move::Left),
            "straight" => Ok(Move::Straight),
            "right" => Ok(Move::Right),
            _ => Err(format!("Invalid move: {}", s)),
        }
    }
}

/// A snake: body cells from head (index 0) to tail (last index)
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Agent {
    pub body: Vec<Coord>,
    pub direction: Direction,
    #[serde(default = "default_alive")]
    pub alive: bool,
    #[serde(default)]
    pub score: u32,
}

fn default_alive() -> bool {
    true
}

impl Agent {
    pub fn new(body: Vec<Coord>, direction: Direction) -> Self {
        Agent {
            body,
            direction,
            alive: true,
            score: 0,
        }
    }

    pub fn head(&self) -> Coord {
        self.body[0]
    }

    pub fn tail(&self) -> Coord {
        self.body[self.body.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Cell the head would enter after `mv`
    pub fn next_head(&self, mv: Move) -> Coord {
        self.direction.turn(mv).apply(&self.head())
    }

    /// Commits a move: prepends the new head and drops the tail unless growing
    pub fn advance(&mut self, mv: Move, grow: bool) {
        let next = self.next_head(mv);
        self.direction = self.direction.turn(mv);
        self.body.insert(0, next);
        if !grow {
            self.body.pop();
        }
    }
}

/// Full world snapshot as seen by the controlled agent
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct World {
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub walls: BTreeSet<Coord>,
    #[serde(default)]
    pub food: BTreeSet<Coord>,
    pub agent: Agent,
    #[serde(default)]
    pub opponents: Vec<Agent>,
    #[serde(default)]
    pub score: u32,
}

impl World {
    pub fn new(width: i32, height: i32, agent: Agent) -> Self {
        World {
            width,
            height,
            walls: BTreeSet::new(),
            food: BTreeSet::new(),
            agent,
            opponents: Vec::new(),
            score: 0,
        }
    }

    pub fn in_bounds(&self, coord: &Coord) -> bool {
        coord.x >= 0 && coord.x < self.width && coord.y >= 0 && coord.y < self.height
    }

    /// Opponents that are still on the board
    pub fn live_opponents(&self) -> impl Iterator<Item = &Agent> {
        self.opponents.iter().filter(|o| o.alive)
    }
}

/// Request body of every HTTP endpoint: the tick number and the world snapshot
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TickRequest {
    #[serde(default)]
    pub turn: i32,
    pub world: World,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turning_is_modular() {
        assert_eq!(Direction::Up.turn(Move::Left), Direction::Left);
        assert_eq!(Direction::Up.turn(Move::Right), Direction::Right);
        assert_eq!(Direction::Left.turn(Move::Right), Direction::Up);
        assert_eq!(Direction::Left.turn(Move::Straight), Direction::Left);
        assert_eq!(Direction::Down.turn(Move::Left), Direction::Right);
    }

    #[test]
    fn test_advance_without_growth_keeps_length() {
        let mut agent = Agent::new(
            vec![Coord::new(2, 2), Coord::new(2, 1), Coord::new(2, 0)],
            Direction::Up,
        );
        agent.advance(Move::Right, false);
        assert_eq!(agent.body, vec![Coord::new(3, 2), Coord::new(2, 2), Coord::new(2, 1)]);
        assert_eq!(agent.direction, Direction::Right);
    }

    #[test]
    fn test_advance_with_growth_keeps_tail() {
        let mut agent = Agent::new(vec![Coord::new(2, 2)], Direction::Up);
        agent.advance(Move::Straight, true);
        assert_eq!(agent.body, vec![Coord::new(2, 3), Coord::new(2, 2)]);
    }

    #[test]
    fn test_world_deserializes_with_defaults() {
        let json = r#"{
            "width": 5,
            "height": 5,
            "agent": { "body": [{"x": 2, "y": 2}], "direction": "up" }
        }"#;
        let world: World = serde_json::from_str(json).expect("valid world json");
        assert!(world.agent.alive);
        assert!(world.food.is_empty());
        assert!(world.opponents.is_empty());
    }

    #[test]
    fn test_move_parse() {
        assert_eq!(Move::parse("Straight"), Ok(Move::Straight));
        assert!(Move::parse("up").is_err());
    }
}
