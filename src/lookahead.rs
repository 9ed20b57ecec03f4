// Lookahead planner
//
// Best-first search over simulated futures. Every node owns a full copy of the
// world, advanced tick by tick with the opponents moving through the injected
// policy. Nodes that have not eaten yet are ordered by projected distance to
// food; the first node that eats with its trail still reachable decides the
// move. Both the main search and the trail check are budgeted so a tick always
// finishes in bounded time.

use log::debug;
use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap};
use std::sync::Arc;

use crate::config::LookaheadConfig;
use crate::distance::{distance_to_nearest, distance_to_nearest_food};
use crate::planner::Planner;
use crate::policy::OpponentPolicy;
use crate::reachability::ReachabilityCache;
use crate::simulation::advance;
use crate::types::{Coord, Move, World};

/// Why the lookahead settled on its move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Reached food with the trail still reachable
    SafeFood,
    /// Reached food but the trail check failed or ran out of budget
    UnconfirmedFood,
    /// Best pending frontier entry when the search stopped
    Frontier,
    /// No frontier at all; a legal move whose tail is reachable
    SafeLegal,
    /// No frontier at all; the first legal move
    FirstLegal,
    /// Nothing survived a single tick
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookaheadOutcome {
    pub chosen: Move,
    pub decision: Decision,
    /// Frontier nodes pushed before deciding, the quantity `max_expansions` bounds
    pub pushed_nodes: usize,
}

/// Pending node of the food search
struct FoodNode {
    world: World,
    first: Move,
    ticks: u32,
    food_distance: u32,
    seq: u64,
}

impl FoodNode {
    fn projected(&self) -> u32 {
        self.ticks + self.food_distance
    }
}

// BinaryHeap pops the greatest element, so "greater" means "expand sooner":
// smaller projected distance, then more ticks taken, then newest.
impl Ord for FoodNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .projected()
            .cmp(&self.projected())
            .then(self.ticks.cmp(&other.ticks))
            .then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for FoodNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FoodNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FoodNode {}

/// Pending node of the trail search
struct TrailNode {
    world: World,
    trail: BTreeSet<Coord>,
    distance: u32,
    seq: u64,
}

impl Ord for TrailNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .cmp(&self.distance)
            .then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for TrailNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for TrailNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TrailNode {}

/// Frontier of the food search plus per-first-move bookkeeping
struct Frontier {
    heap: BinaryHeap<FoodNode>,
    pending: [usize; 3],
    pushed: usize,
    seq: u64,
}

impl Frontier {
    fn new() -> Self {
        Frontier {
            heap: BinaryHeap::new(),
            pending: [0; 3],
            pushed: 0,
            seq: 0,
        }
    }

    fn push(&mut self, world: World, first: Move, ticks: u32, food_distance: u32) {
        self.heap.push(FoodNode {
            world,
            first,
            ticks,
            food_distance,
            seq: self.seq,
        });
        self.seq += 1;
        self.pending[first.index()] += 1;
        self.pushed += 1;
    }

    fn pop(&mut self) -> Option<FoodNode> {
        let node = self.heap.pop()?;
        self.pending[node.first.index()] -= 1;
        Some(node)
    }

    fn is_exhausted(&self) -> bool {
        self.pending.iter().all(|&n| n == 0)
    }

    /// The search only pays off while it can still tell first moves apart.
    /// With a fallback in hand, any other first move with pending work keeps
    /// it going; otherwise at least two first moves must still be pending.
    fn worth_expanding(&self, fallback: Option<Move>) -> bool {
        match fallback {
            Some(fallback) => Move::all()
                .iter()
                .filter(|mv| **mv != fallback)
                .any(|mv| self.pending[mv.index()] > 0),
            None => self.pending.iter().filter(|&&n| n > 0).count() >= 2,
        }
    }
}

/// Priority-frontier lookahead planner
pub struct LookaheadPlanner {
    settings: LookaheadConfig,
    policy: Box<dyn OpponentPolicy>,
    cache: Arc<ReachabilityCache>,
}

impl LookaheadPlanner {
    pub fn new(
        settings: LookaheadConfig,
        policy: Box<dyn OpponentPolicy>,
        cache: Arc<ReachabilityCache>,
    ) -> Self {
        LookaheadPlanner {
            settings,
            policy,
            cache,
        }
    }

    /// Runs the search and reports how the move was chosen
    pub fn plan_detailed(&self, world: &World) -> LookaheadOutcome {
        let mut frontier = Frontier::new();
        let mut fallback: Option<Move> = None;
        let mut survivors: Vec<(Move, World)> = Vec::new();

        for mv in Move::all() {
            let mut child = world.clone();
            if !advance(&mut child, mv, self.policy.as_ref()) {
                continue;
            }

            if child.score <= world.score {
                if let Some(d) = distance_to_nearest_food(&child) {
                    frontier.push(child.clone(), mv, 1, d);
                }
                survivors.push((mv, child));
            } else if self.trail_is_reachable(&child) {
                return self.outcome(mv, Decision::SafeFood, frontier.pushed);
            } else {
                fallback = Some(mv);
            }
        }

        if frontier.is_exhausted() {
            if let Some(mv) = fallback {
                return self.outcome(mv, Decision::UnconfirmedFood, frontier.pushed);
            }
            return self.without_frontier(&survivors, frontier.pushed);
        }

        while frontier.worth_expanding(fallback)
            && frontier.pushed <= self.settings.max_expansions
        {
            let node = match frontier.pop() {
                Some(node) => node,
                None => break,
            };

            for mv in Move::all() {
                let mut child = node.world.clone();
                if !advance(&mut child, mv, self.policy.as_ref()) {
                    continue;
                }

                if child.score <= node.world.score {
                    if let Some(d) = distance_to_nearest_food(&child) {
                        frontier.push(child, node.first, node.ticks + 1, d);
                    }
                } else if self.trail_is_reachable(&child) {
                    return self.outcome(node.first, Decision::SafeFood, frontier.pushed);
                } else {
                    fallback = Some(node.first);
                }
            }
        }

        if let Some(mv) = fallback {
            return self.outcome(mv, Decision::UnconfirmedFood, frontier.pushed);
        }

        match frontier.pop() {
            Some(node) => self.outcome(node.first, Decision::Frontier, frontier.pushed),
            None => self.without_frontier(&survivors, frontier.pushed),
        }
    }

    /// Bounded simulated search for the agent's own trail
    ///
    /// The trail starts as the current body and gains every cell the head
    /// leaves. Stepping the head onto a trail cell means the agent can keep
    /// chasing its own tail, which is what "safe after eating" means here.
    pub fn trail_is_reachable(&self, world: &World) -> bool {
        let mut heap = BinaryHeap::new();
        let mut seq: u64 = 0;
        heap.push(TrailNode {
            world: world.clone(),
            trail: world.agent.body.iter().copied().collect(),
            distance: 0,
            seq,
        });
        let mut nodes = 1;

        while nodes <= self.settings.trail_search_max_nodes {
            let node = match heap.pop() {
                Some(node) => node,
                None => break,
            };

            for mv in Move::all() {
                let mut child = node.world.clone();
                if !advance(&mut child, mv, self.policy.as_ref()) {
                    continue;
                }

                let mut trail = node.trail.clone();
                trail.insert(node.world.agent.head());

                if trail.contains(&child.agent.head()) {
                    return true;
                }

                let distance = match distance_to_nearest(&child, &trail) {
                    Some(d) => d,
                    None => continue,
                };

                seq += 1;
                heap.push(TrailNode {
                    world: child,
                    trail,
                    distance,
                    seq,
                });
                nodes += 1;
            }
        }

        false
    }

    fn without_frontier(&self, survivors: &[(Move, World)], pushed_nodes: usize) -> LookaheadOutcome {
        if let Some((mv, _)) = survivors
            .iter()
            .find(|(_, child)| self.cache.agent_can_reach_tail(child))
        {
            return self.outcome(*mv, Decision::SafeLegal, pushed_nodes);
        }
        if let Some((mv, _)) = survivors.first() {
            return self.outcome(*mv, Decision::FirstLegal, pushed_nodes);
        }
        self.outcome(Move::Straight, Decision::Default, pushed_nodes)
    }

    fn outcome(&self, chosen: Move, decision: Decision, pushed_nodes: usize) -> LookaheadOutcome {
        debug!(
            "lookahead: {} via {:?} after {} pushed nodes",
            chosen.as_str(),
            decision,
            pushed_nodes
        );
        LookaheadOutcome {
            chosen,
            decision,
            pushed_nodes,
        }
    }
}

impl Planner for LookaheadPlanner {
    fn name(&self) -> &'static str {
        "lookahead"
    }

    fn plan(&self, world: &World) -> Option<Move> {
        Some(self.plan_detailed(world).chosen)
    }
}
