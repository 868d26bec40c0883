// Library exports for the snake agent
// The training binary and integration tests drive the agent through these modules

pub mod agent;
pub mod config;
pub mod debug_logger;
pub mod error;
pub mod game;
pub mod reachability;
pub mod search;
pub mod survival;
pub mod sweep;
pub mod training;
pub mod trap;
pub mod types;
