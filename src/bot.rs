// Snake bot wrapper around a single planner
//
// The HTTP layer calls into this once per tick. The planner runs on the
// blocking pool while the request task polls a lock-free slot, so a slow
// search can never hold the response past the time budget.

use log::{info, warn};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::debug_logger::DebugLogger;
use crate::planner::{self, Planner};
use crate::types::{Move, World};

const NO_MOVE: u8 = u8::MAX;

/// Lock-free shared state between the polling request task and the planner
#[derive(Debug)]
pub struct SharedSearchState {
    /// Chosen move encoded as its `Move::index()`, or NO_MOVE
    chosen_move: AtomicU8,
    /// Flag indicating search completion
    search_complete: AtomicBool,
}

impl SharedSearchState {
    pub fn new() -> Self {
        SharedSearchState {
            chosen_move: AtomicU8::new(NO_MOVE),
            search_complete: AtomicBool::new(false),
        }
    }

    pub fn publish(&self, chosen: Option<Move>) {
        let encoded = chosen.map(|mv| mv.index() as u8).unwrap_or(NO_MOVE);
        self.chosen_move.store(encoded, Ordering::Release);
        self.search_complete.store(true, Ordering::Release);
    }

    pub fn is_complete(&self) -> bool {
        self.search_complete.load(Ordering::Acquire)
    }

    pub fn chosen(&self) -> Option<Move> {
        let encoded = self.chosen_move.load(Ordering::Acquire);
        Move::all().get(encoded as usize).copied()
    }
}

impl Default for SharedSearchState {
    fn default() -> Self {
        Self::new()
    }
}

/// Snake bot holding its static configuration and the configured planner
pub struct Bot {
    config: Config,
    planner: Arc<dyn Planner>,
    debug_logger: DebugLogger,
}

impl Bot {
    /// Creates a new Bot with the planner named in `config`
    pub fn new(config: Config, debug_logger: DebugLogger) -> Self {
        let planner: Arc<dyn Planner> = Arc::from(planner::from_config(&config));
        Bot::with_planner(config, planner, debug_logger)
    }

    /// Creates a Bot around an explicit planner
    pub fn with_planner(config: Config, planner: Arc<dyn Planner>, debug_logger: DebugLogger) -> Self {
        Bot {
            config,
            planner,
            debug_logger,
        }
    }

    /// Returns bot metadata
    /// Corresponds to GET / endpoint
    pub fn info(&self) -> Value {
        info!("INFO");

        json!({
            "apiversion": "1",
            "author": "tail-safe-snake",
            "planner": self.planner.name(),
            "moves": Move::all().iter().map(|mv| mv.as_str()).collect::<Vec<_>>(),
        })
    }

    /// Called when a game starts
    pub fn start(&self, turn: i32, world: &World) {
        info!(
            "GAME START (turn {}, {}x{}, {} opponents, planner {})",
            turn,
            world.width,
            world.height,
            world.opponents.len(),
            self.planner.name()
        );
    }

    /// Called when a game ends
    pub fn end(&self, turn: i32, world: &World) {
        info!("GAME OVER (turn {}, score {})", turn, world.score);
    }

    /// Runs the planner with the configured time budget
    ///
    /// The snapshot is cloned into the blocking task, so the caller's world is
    /// never touched. If the planner finds no legal move, or does not finish in
    /// time, the answer is `straight`.
    pub async fn get_move(&self, turn: i32, world: &World) -> Value {
        let start_time = Instant::now();

        let shared = Arc::new(SharedSearchState::new());
        let shared_clone = shared.clone();
        let planner = self.planner.clone();
        let snapshot = world.clone();

        tokio::task::spawn_blocking(move || {
            let chosen = planner.plan(&snapshot);
            shared_clone.publish(chosen);
        });

        let effective_budget = self.config.timing.effective_budget_ms();
        let polling_interval = Duration::from_millis(self.config.timing.polling_interval_ms.max(1));

        loop {
            tokio::time::sleep(polling_interval).await;

            let elapsed = start_time.elapsed().as_millis() as u64;
            if shared.is_complete() || elapsed >= effective_budget {
                break;
            }
        }

        let planned = if shared.is_complete() {
            shared.chosen()
        } else {
            warn!("Turn {}: planner exceeded {}ms budget", turn, effective_budget);
            None
        };

        let chosen_move = planned.unwrap_or_else(|| {
            warn!("Turn {}: no legal move available, defaulting to straight", turn);
            Move::Straight
        });

        info!(
            "Turn {}: Chose {} via {} (time: {}ms)",
            turn,
            chosen_move.as_str(),
            self.planner.name(),
            start_time.elapsed().as_millis()
        );

        self.debug_logger
            .log_move(turn, self.planner.name(), world.clone(), planned);

        json!({ "move": chosen_move.as_str() })
    }
}
