// Beam heuristic planner
//
// Keeps the `beam_width` best move sequences, extends each of them by every
// legal move, scores the extensions and keeps the best again, down to
// `max_depth`. Opponents are not simulated here: they stay where they are in
// the snapshot and only act as obstacles and as a proximity penalty.

use log::debug;
use rayon::prelude::*;
use std::sync::Arc;

use crate::config::BeamConfig;
use crate::distance::{closest_opponent_distance, manhattan_distance};
use crate::planner::Planner;
use crate::reachability::ReachabilityCache;
use crate::types::{Agent, Coord, Move, World};

/// One candidate move sequence with the agent it produces
#[derive(Debug, Clone)]
struct BeamNode {
    agent: Agent,
    path: Vec<Move>,
    /// Path positions that landed on a snapshot food cell, repeats included
    food_eaten: u32,
    score: f64,
}

/// Result of a beam search
#[derive(Debug, Clone, PartialEq)]
pub struct BeamOutcome {
    /// First move of the best sequence in the final beam
    pub best_move: Option<Move>,
    /// Score of that sequence
    pub final_score: Option<f64>,
    /// Highest score of any sequence scored during the search
    pub best_seen_score: Option<f64>,
    /// Number of depths that produced at least one sequence
    pub depth_reached: usize,
}

pub struct BeamPlanner {
    settings: BeamConfig,
    cache: Arc<ReachabilityCache>,
}

impl BeamPlanner {
    /// A zero width or depth would drop every candidate, so both are at least 1
    pub fn new(mut settings: BeamConfig, cache: Arc<ReachabilityCache>) -> Self {
        settings.beam_width = settings.beam_width.max(1);
        settings.max_depth = settings.max_depth.max(1);
        BeamPlanner { settings, cache }
    }

    pub fn search(&self, world: &World) -> BeamOutcome {
        let mut outcome = BeamOutcome {
            best_move: None,
            final_score: None,
            best_seen_score: None,
            depth_reached: 0,
        };
        if world.agent.is_empty() {
            return outcome;
        }

        let mut beam = vec![BeamNode {
            agent: world.agent.clone(),
            path: Vec::new(),
            food_eaten: 0,
            score: 0.0,
        }];

        for depth in 0..self.settings.max_depth {
            let mut candidates = self.extend(world, &beam);
            if candidates.is_empty() {
                break;
            }

            if self.settings.parallel_scoring {
                candidates
                    .par_iter_mut()
                    .for_each(|node| node.score = self.evaluate(world, node));
            } else {
                candidates
                    .iter_mut()
                    .for_each(|node| node.score = self.evaluate(world, node));
            }

            for node in &candidates {
                outcome.best_seen_score = Some(match outcome.best_seen_score {
                    Some(best) if best >= node.score => best,
                    _ => node.score,
                });
            }

            // Stable: equal scores keep generation order
            candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
            candidates.truncate(self.settings.beam_width);

            beam = candidates;
            outcome.depth_reached = depth + 1;
        }

        if let Some(best) = beam.first() {
            outcome.best_move = best.path.first().copied();
            outcome.final_score = best.path.first().map(|_| best.score);
        }

        debug!(
            "beam: {:?} (score {:?}, depth {})",
            outcome.best_move.map(|mv| mv.as_str()),
            outcome.final_score,
            outcome.depth_reached
        );

        outcome
    }

    fn extend(&self, world: &World, beam: &[BeamNode]) -> Vec<BeamNode> {
        let mut candidates = Vec::with_capacity(beam.len() * 3);

        for node in beam {
            for mv in Move::all() {
                let next = node.agent.next_head(mv);
                if !is_open(world, &node.agent, next) {
                    continue;
                }

                // Food stays on the snapshot, so re-entering a food cell eats again
                let on_food = world.food.contains(&next);

                let mut agent = node.agent.clone();
                agent.advance(mv, on_food);

                let mut food_eaten = node.food_eaten;
                if on_food {
                    food_eaten += 1;
                    agent.score += 1;
                }

                let mut path = node.path.clone();
                path.push(mv);

                candidates.push(BeamNode {
                    agent,
                    path,
                    food_eaten,
                    score: 0.0,
                });
            }
        }

        candidates
    }

    /// Tail reachability, food eaten, food proximity and opponent proximity
    fn evaluate(&self, world: &World, node: &BeamNode) -> f64 {
        let head = node.agent.head();
        let mut score = 0.0;

        let tail_reachable = self.cache.can_reach_tail(
            head,
            node.agent.tail(),
            &node.agent.body,
            &world.walls,
            world.width,
            world.height,
        );
        if !tail_reachable {
            score -= self.settings.unreachable_penalty;
        }

        score += node.food_eaten as f64 * self.settings.food_eaten_weight;
        score += food_proximity(world, head) * self.settings.food_distance_weight;

        if let Some(distance) = closest_opponent_distance(world, head) {
            if distance < self.settings.enemy_radius {
                score -= (self.settings.enemy_radius - distance) as f64 * self.settings.enemy_weight;
            }
        }

        score
    }
}

/// Whether `agent`'s head may enter `next` with opponents frozen in place
fn is_open(world: &World, agent: &Agent, next: Coord) -> bool {
    if !world.in_bounds(&next) || world.walls.contains(&next) {
        return false;
    }

    let without_tail = &agent.body[..agent.len().saturating_sub(1)];
    if without_tail.contains(&next) {
        return false;
    }

    !world.live_opponents().any(|o| o.body.contains(&next))
}

/// Sum of inverse Manhattan distances from `head` to every food cell
pub fn food_proximity(world: &World, head: Coord) -> f64 {
    world
        .food
        .iter()
        .map(|&food| manhattan_distance(head, food))
        .filter(|&d| d > 0)
        .map(|d| 1.0 / d as f64)
        .sum()
}

impl Planner for BeamPlanner {
    fn name(&self) -> &'static str {
        "beam"
    }

    fn plan(&self, world: &World) -> Option<Move> {
        self.search(world).best_move
    }
}
