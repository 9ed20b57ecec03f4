// Library exports for the tail-safe snake planner
// The server binary, the replay tool and the tests all build on these modules

pub mod beam;
pub mod bot;
pub mod config;
pub mod debug_logger;
pub mod distance;
pub mod lookahead;
pub mod planner;
pub mod policy;
pub mod reachability;
pub mod replay;
pub mod simulation;
pub mod types;
