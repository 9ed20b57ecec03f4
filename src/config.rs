// Configuration module for reading Snake.toml
// Every tunable of the planners and the server lives here

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::planner::PlannerKind;
use crate::policy::PolicyKind;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub timing: TimingConfig,
    pub planner: PlannerConfig,
    pub lookahead: LookaheadConfig,
    pub beam: BeamConfig,
    pub cache: CacheConfig,
    pub debug: DebugConfig,
}

/// Response deadline handling for the HTTP wrapper
#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    pub response_time_budget_ms: u64,
    pub network_overhead_ms: u64,
    pub polling_interval_ms: u64,
}

impl TimingConfig {
    /// Computes the effective computation budget
    pub fn effective_budget_ms(&self) -> u64 {
        self.response_time_budget_ms.saturating_sub(self.network_overhead_ms)
    }
}

/// Which planner runs each tick and how opponents are modelled during lookahead
#[derive(Debug, Deserialize, Clone)]
pub struct PlannerConfig {
    pub kind: PlannerKind,
    pub opponent_policy: PolicyKind,
    pub policy_seed: u64,
}

/// Budgets of the priority-frontier lookahead planner
#[derive(Debug, Deserialize, Clone)]
pub struct LookaheadConfig {
    /// Ceiling on frontier nodes pushed, not nodes popped; the search stops
    /// expanding once more than this many have been pushed
    pub max_expansions: usize,
    /// Ceiling on nodes pushed by the post-eating trail search
    pub trail_search_max_nodes: usize,
}

/// Width, depth and weights of the beam heuristic planner
#[derive(Debug, Deserialize, Clone)]
pub struct BeamConfig {
    pub beam_width: usize,
    pub max_depth: usize,
    pub food_eaten_weight: f64,
    pub food_distance_weight: f64,
    pub enemy_weight: f64,
    pub enemy_radius: i32,
    pub unreachable_penalty: f64,
    pub parallel_scoring: bool,
}

/// Reachability memoization
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    pub reachability_capacity: usize,
}

/// Debug configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Snake.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        toml::from_str(&contents).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Loads default configuration from Snake.toml in the project root
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Snake.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Snake.toml
    pub fn default_hardcoded() -> Self {
        Config {
            timing: TimingConfig {
                response_time_budget_ms: 400,
                network_overhead_ms: 50,
                polling_interval_ms: 5,
            },
            planner: PlannerConfig {
                kind: PlannerKind::Lookahead,
                opponent_policy: PolicyKind::GreedyFood,
                policy_seed: 7,
            },
            lookahead: LookaheadConfig {
                max_expansions: 256,
                trail_search_max_nodes: 65,
            },
            beam: BeamConfig {
                beam_width: 6,
                max_depth: 16,
                food_eaten_weight: 25.0,
                food_distance_weight: 10.0,
                enemy_weight: 10.0,
                enemy_radius: 5,
                unreachable_penalty: 1000.0,
                parallel_scoring: true,
            },
            cache: CacheConfig {
                reachability_capacity: 10_000,
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "snake_debug.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            log::warn!("Could not load Snake.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_budget_calculation() {
        let config = Config::default_hardcoded();
        assert_eq!(config.timing.effective_budget_ms(), 350);
    }

    #[test]
    fn test_snake_toml_can_be_parsed() {
        let result = Config::from_file("Snake.toml");
        assert!(
            result.is_ok(),
            "Failed to parse Snake.toml: {:?}",
            result.err()
        );
    }

    #[test]
    fn test_all_config_values_match_hardcoded_defaults() {
        let file_config = Config::from_file("Snake.toml").expect("Snake.toml should be parseable");
        let hardcoded = Config::default_hardcoded();

        assert_eq!(
            file_config.timing.response_time_budget_ms,
            hardcoded.timing.response_time_budget_ms
        );
        assert_eq!(
            file_config.timing.network_overhead_ms,
            hardcoded.timing.network_overhead_ms
        );
        assert_eq!(
            file_config.timing.polling_interval_ms,
            hardcoded.timing.polling_interval_ms
        );

        assert_eq!(file_config.planner.kind, hardcoded.planner.kind);
        assert_eq!(
            file_config.planner.opponent_policy,
            hardcoded.planner.opponent_policy
        );
        assert_eq!(file_config.planner.policy_seed, hardcoded.planner.policy_seed);

        assert_eq!(
            file_config.lookahead.max_expansions,
            hardcoded.lookahead.max_expansions
        );
        assert_eq!(
            file_config.lookahead.trail_search_max_nodes,
            hardcoded.lookahead.trail_search_max_nodes
        );

        assert_eq!(file_config.beam.beam_width, hardcoded.beam.beam_width);
        assert_eq!(file_config.beam.max_depth, hardcoded.beam.max_depth);
        assert_eq!(
            file_config.beam.food_eaten_weight,
            hardcoded.beam.food_eaten_weight
        );
        assert_eq!(
            file_config.beam.food_distance_weight,
            hardcoded.beam.food_distance_weight
        );
        assert_eq!(file_config.beam.enemy_weight, hardcoded.beam.enemy_weight);
        assert_eq!(file_config.beam.enemy_radius, hardcoded.beam.enemy_radius);
        assert_eq!(
            file_config.beam.unreachable_penalty,
            hardcoded.beam.unreachable_penalty
        );
        assert_eq!(
            file_config.beam.parallel_scoring,
            hardcoded.beam.parallel_scoring
        );

        assert_eq!(
            file_config.cache.reachability_capacity,
            hardcoded.cache.reachability_capacity
        );
        assert_eq!(file_config.debug.enabled, hardcoded.debug.enabled);
        assert_eq!(
            file_config.debug.log_file_path,
            hardcoded.debug.log_file_path
        );
    }

    #[test]
    fn test_load_or_default_works() {
        let config = Config::load_or_default();
        assert_eq!(config.lookahead.max_expansions, 256);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let result = Config::from_file("nonexistent.toml");
        assert!(result.is_err());
    }
}
