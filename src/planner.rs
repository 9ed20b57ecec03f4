// Planner contract shared by the lookahead and beam strategies
//
// The run loop calls exactly one planner per tick. Planners never mutate the
// snapshot they are given; `None` means no legal move exists and the caller
// picks its own fallback.

use serde::Deserialize;
use std::sync::Arc;

use crate::beam::BeamPlanner;
use crate::config::Config;
use crate::lookahead::LookaheadPlanner;
use crate::reachability::ReachabilityCache;
use crate::types::{Move, World};

pub trait Planner: Send + Sync {
    fn name(&self) -> &'static str;

    fn plan(&self, world: &World) -> Option<Move>;
}

/// Planner selector used by configuration
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlannerKind {
    Lookahead,
    Beam,
}

impl PlannerKind {
    pub fn parse(s: &str) -> Result<PlannerKind, String> {
        match s.trim().to_lowercase().as_str() {
            "lookahead" => Ok(PlannerKind::Lookahead),
            "beam" => Ok(PlannerKind::Beam),
            _ => Err(format!("Unknown planner: {}", s)),
        }
    }
}

/// Builds the planner of the given kind, sharing one reachability cache
pub fn build_planner(
    kind: PlannerKind,
    config: &Config,
    cache: Arc<ReachabilityCache>,
) -> Box<dyn Planner> {
    match kind {
        PlannerKind::Lookahead => Box::new(LookaheadPlanner::new(
            config.lookahead.clone(),
            config
                .planner
                .opponent_policy
                .build(config.planner.policy_seed),
            cache,
        )),
        PlannerKind::Beam => Box::new(BeamPlanner::new(config.beam.clone(), cache)),
    }
}

/// Builds the configured planner with a cache sized from configuration
pub fn from_config(config: &Config) -> Box<dyn Planner> {
    let cache = Arc::new(ReachabilityCache::new(config.cache.reachability_capacity));
    build_planner(config.planner.kind, config, cache)
}
