// Replay module for re-running planners on logged decisions
//
// This module provides functionality to:
// 1. Parse JSONL decision logs written by the debug logger
// 2. Re-run the planner that made each decision on the logged world
// 3. Compare logged vs replayed moves (planners are deterministic, so any
//    mismatch means behavior changed)
// 4. Print a summary report

use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::debug_logger::DecisionLogEntry;
use crate::planner::{build_planner, Planner, PlannerKind};
use crate::reachability::ReachabilityCache;
use crate::types::Move;

/// Result of replaying a single turn
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub turn: i32,
    pub original_move: Option<Move>,
    pub replayed_move: Option<Move>,
    pub matches: bool,
    pub computation_time_ms: u128,
}

/// Statistics for a complete replay session
#[derive(Debug, Default)]
pub struct ReplayStats {
    pub total_turns: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub match_rate: f64,
}

/// Replay engine for analyzing decision logs
pub struct ReplayEngine {
    config: Config,
    verbose: bool,
    planner_override: Option<PlannerKind>,
    cache: Arc<ReachabilityCache>,
}

impl ReplayEngine {
    /// Creates a new replay engine with the given configuration
    pub fn new(config: Config, verbose: bool) -> Self {
        let cache = Arc::new(ReachabilityCache::new(config.cache.reachability_capacity));
        ReplayEngine {
            config,
            verbose,
            planner_override: None,
            cache,
        }
    }

    /// Replays every entry with `kind` instead of the planner that logged it
    pub fn with_planner(mut self, kind: PlannerKind) -> Self {
        self.planner_override = Some(kind);
        self
    }

    /// Loads all log entries from a JSONL file
    pub fn load_log_file<P: AsRef<Path>>(&self, log_path: P) -> Result<Vec<DecisionLogEntry>, String> {
        let file =
            File::open(log_path.as_ref()).map_err(|e| format!("Failed to open log file: {}", e))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: DecisionLogEntry = serde_json::from_str(&line)
                .map_err(|e| format!("Failed to parse JSON on line {}: {}", line_num + 1, e))?;

            entries.push(entry);
        }

        info!("Loaded {} log entries", entries.len());
        Ok(entries)
    }

    fn planner_for(&self, entry: &DecisionLogEntry) -> Result<Box<dyn Planner>, String> {
        let kind = match self.planner_override {
            Some(kind) => kind,
            None => PlannerKind::parse(&entry.planner)?,
        };
        Ok(build_planner(kind, &self.config, self.cache.clone()))
    }

    /// Replays a single log entry and compares the result
    pub fn replay_entry(&self, entry: &DecisionLogEntry) -> Result<ReplayResult, String> {
        let planner = self.planner_for(entry)?;

        let start_time = Instant::now();
        let replayed_move = planner.plan(&entry.world);
        let computation_time_ms = start_time.elapsed().as_millis();

        let matches = replayed_move == entry.chosen_move;

        if self.verbose {
            if matches {
                info!(
                    "Turn {}: MATCH - {} ({}ms)",
                    entry.turn,
                    move_label(replayed_move),
                    computation_time_ms
                );
            } else {
                warn!(
                    "Turn {}: MISMATCH - Original: {}, Replayed: {} ({}ms)",
                    entry.turn,
                    move_label(entry.chosen_move),
                    move_label(replayed_move),
                    computation_time_ms
                );
            }
        }

        Ok(ReplayResult {
            turn: entry.turn,
            original_move: entry.chosen_move,
            replayed_move,
            matches,
            computation_time_ms,
        })
    }

    /// Replays all entries in a log file
    pub fn replay_all(&self, entries: &[DecisionLogEntry]) -> Vec<ReplayResult> {
        let mut results = Vec::new();

        for entry in entries {
            match self.replay_entry(entry) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("Failed to replay turn {}: {}", entry.turn, e);
                }
            }
        }

        results
    }

    /// Replays specific turns from a log file
    pub fn replay_turns(
        &self,
        entries: &[DecisionLogEntry],
        turn_numbers: &[i32],
    ) -> Result<Vec<ReplayResult>, String> {
        let mut results = Vec::new();

        for turn_num in turn_numbers {
            let entry = entries
                .iter()
                .find(|e| e.turn == *turn_num)
                .ok_or_else(|| format!("Turn {} not found in log file", turn_num))?;

            results.push(self.replay_entry(entry)?);
        }

        Ok(results)
    }

    /// Generates statistics from replay results
    pub fn generate_stats(&self, results: &[ReplayResult]) -> ReplayStats {
        let total_turns = results.len();
        let matches = results.iter().filter(|r| r.matches).count();
        let mismatches = total_turns - matches;
        let match_rate = if total_turns > 0 {
            (matches as f64 / total_turns as f64) * 100.0
        } else {
            0.0
        };

        ReplayStats {
            total_turns,
            matches,
            mismatches,
            match_rate,
        }
    }

    /// Prints a detailed report of replay results
    pub fn print_report(&self, results: &[ReplayResult]) {
        let stats = self.generate_stats(results);

        println!("\n═══════════════════════════════════════════════════════════");
        println!("                    REPLAY REPORT");
        println!("═══════════════════════════════════════════════════════════");
        println!("Total Turns:    {}", stats.total_turns);
        println!("Matches:        {} ({:.1}%)", stats.matches, stats.match_rate);
        println!("Mismatches:     {}", stats.mismatches);
        println!("═══════════════════════════════════════════════════════════\n");

        if !results.is_empty() {
            let avg_time: f64 = results
                .iter()
                .map(|r| r.computation_time_ms as f64)
                .sum::<f64>()
                / results.len() as f64;
            println!("Average Computation Time:   {:.1}ms\n", avg_time);
        }

        let mismatches: Vec<_> = results.iter().filter(|r| !r.matches).collect();
        if !mismatches.is_empty() {
            println!("═══════════════════════════════════════════════════════════");
            println!("                  DETAILED MISMATCHES");
            println!("═══════════════════════════════════════════════════════════");

            for result in mismatches {
                println!(
                    "Turn {}: {} → {} ({}ms)",
                    result.turn,
                    move_label(result.original_move),
                    move_label(result.replayed_move),
                    result.computation_time_ms
                );
            }
            println!();
        }
    }

    /// Validates that specific expected moves were logged
    pub fn validate_expected_moves(
        &self,
        entries: &[DecisionLogEntry],
        expected_moves: &[(i32, Vec<Move>)],
    ) -> Result<(), String> {
        for (turn, acceptable) in expected_moves {
            let entry = entries
                .iter()
                .find(|e| e.turn == *turn)
                .ok_or_else(|| format!("Turn {} not found in log", turn))?;

            let acceptable_hit = entry
                .chosen_move
                .map(|mv| acceptable.contains(&mv))
                .unwrap_or(false);

            if !acceptable_hit {
                return Err(format!(
                    "Turn {}: Expected one of {:?}, but got {}",
                    turn,
                    acceptable.iter().map(|m| m.as_str()).collect::<Vec<_>>(),
                    move_label(entry.chosen_move)
                ));
            }
        }

        Ok(())
    }
}

fn move_label(mv: Option<Move>) -> &'static str {
    mv.map(|mv| mv.as_str()).unwrap_or("none")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Agent, Coord, Direction, World};

    fn entry(turn: i32, planner: &str, chosen_move: Option<Move>) -> DecisionLogEntry {
        let mut world = World::new(7, 7, Agent::new(vec![Coord::new(3, 3)], Direction::Up));
        world.food.insert(Coord::new(3, 4));
        DecisionLogEntry {
            turn,
            planner: planner.to_string(),
            chosen_move,
            world,
            timestamp: "2026-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_replay_matches_deterministic_decision() {
        let engine = ReplayEngine::new(Config::default_hardcoded(), false);
        let result = engine
            .replay_entry(&entry(1, "lookahead", Some(Move::Straight)))
            .expect("replay should succeed");
        assert!(result.matches);
    }

    #[test]
    fn test_replay_flags_mismatch() {
        let engine = ReplayEngine::new(Config::default_hardcoded(), false);
        let result = engine
            .replay_entry(&entry(1, "lookahead", Some(Move::Left)))
            .expect("replay should succeed");
        assert!(!result.matches);

        let stats = engine.generate_stats(&[result]);
        assert_eq!(stats.mismatches, 1);
    }

    #[test]
    fn test_unknown_planner_is_an_error() {
        let engine = ReplayEngine::new(Config::default_hardcoded(), false);
        assert!(engine.replay_entry(&entry(1, "minimax", None)).is_err());
    }

    #[test]
    fn test_validate_expected_moves() {
        let engine = ReplayEngine::new(Config::default_hardcoded(), false);
        let entries = vec![entry(3, "beam", Some(Move::Right))];
        assert!(engine
            .validate_expected_moves(&entries, &[(3, vec![Move::Left, Move::Right])])
            .is_ok());
        assert!(engine
            .validate_expected_moves(&entries, &[(3, vec![Move::Straight])])
            .is_err());
        assert!(engine
            .validate_expected_moves(&entries, &[(4, vec![Move::Straight])])
            .is_err());
    }
}
