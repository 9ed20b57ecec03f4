// Opponent policies
//
// The lookahead planner needs to know what the other snakes will do, but how
// they decide is not its business. It only sees this trait. Implementations
// must be pure: the same view always yields the same move.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::distance::manhattan_distance;
use crate::simulation::{legal_moves, Mover};
use crate::types::{Move, World};

/// Decides a move for an agent given the world from that agent's perspective
pub trait OpponentPolicy: Send + Sync {
    fn choose(&self, view: &World) -> Move;
}

impl<F> OpponentPolicy for F
where
    F: Fn(&World) -> Move + Send + Sync,
{
    fn choose(&self, view: &World) -> Move {
        self(view)
    }
}

/// Always goes straight, even into a wall
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightPolicy;

impl OpponentPolicy for StraightPolicy {
    fn choose(&self, _view: &World) -> Move {
        Move::Straight
    }
}

/// Picks the legal move that lands closest to the nearest food
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyFoodPolicy;

impl OpponentPolicy for GreedyFoodPolicy {
    fn choose(&self, view: &World) -> Move {
        let legal = legal_moves(view, Mover::Primary);

        legal
            .iter()
            .copied()
            .min_by_key(|&mv| {
                let next = view.agent.next_head(mv);
                view.food
                    .iter()
                    .map(|&food| manhattan_distance(next, food))
                    .min()
                    .unwrap_or(0)
            })
            .unwrap_or(Move::Straight)
    }
}

/// Uniformly random legal move, derived deterministically from a seed and the view
#[derive(Debug, Clone, Copy)]
pub struct SeededRandomPolicy {
    pub seed: u64,
}

impl SeededRandomPolicy {
    pub fn new(seed: u64) -> Self {
        SeededRandomPolicy { seed }
    }

    fn view_seed(&self, view: &World) -> u64 {
        let head = view.agent.head();
        let mixed = ((head.x as u32 as u64) << 32)
            ^ (head.y as u32 as u64)
            ^ ((view.agent.len() as u64) << 48)
            ^ ((view.agent.direction.index() as u64) << 56);
        self.seed ^ mixed.wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }
}

impl OpponentPolicy for SeededRandomPolicy {
    fn choose(&self, view: &World) -> Move {
        if view.agent.is_empty() {
            return Move::Straight;
        }
        let legal = legal_moves(view, Mover::Primary);
        if legal.is_empty() {
            return Move::Straight;
        }
        let mut rng = StdRng::seed_from_u64(self.view_seed(view));
        legal[rng.random_range(0..legal.len())]
    }
}

/// Policy selector used by configuration
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    Straight,
    GreedyFood,
    SeededRandom,
}

impl PolicyKind {
    pub fn build(&self, seed: u64) -> Box<dyn OpponentPolicy> {
        match self {
            PolicyKind::Straight => Box::new(StraightPolicy),
            PolicyKind::GreedyFood => Box::new(GreedyFoodPolicy),
            PolicyKind::SeededRandom => Box::new(SeededRandomPolicy::new(seed)),
        }
    }
}
