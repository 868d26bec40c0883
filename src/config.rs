// Configuration module for reading Agent.toml
// Every tunable of the agent, the search costs and the training sessions lives here

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::agent::Strategy;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub strategy: StrategyConfig,
    pub search: SearchConfig,
    pub survival: SurvivalConfig,
    pub trap: TrapConfig,
    pub session: SessionConfig,
    pub debug: DebugConfig,
}

/// Which planner drives the snake and which optional layers are active
#[derive(Debug, Deserialize, Clone)]
pub struct StrategyConfig {
    pub algorithm: Strategy,
    pub survival: bool,
    pub lookahead: bool,
    pub random_seed: u64,
}

/// A* cost policy constants
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct SearchConfig {
    pub weighted_heuristic_factor: i64,
    pub inverse_ceiling: i64,
    pub survival_heuristic_weight: i64,
    pub survival_body_weight: i64,
}

/// Tail-chasing fallback constants
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct SurvivalConfig {
    pub min_body_buffer: usize,
    pub min_path_length: usize,
}

/// Trap detection and lookahead correction constants
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct TrapConfig {
    pub step_threshold: f64,
    pub path_threshold: f64,
    pub lookahead_depth: usize,
    pub max_correction_attempts: usize,
}

/// Headless session and training harness settings
#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub grid_height: usize,
    pub grid_width: usize,
    pub initial_length: usize,
    pub max_score: u32,
    pub max_ticks: u64,
    pub seed: u64,
    pub trials: usize,
    pub output_dir: String,
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
    /// * `path` - Path to the Agent.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        toml::from_str(&contents).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Loads default configuration from Agent.toml in the project root
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Agent.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Agent.toml
    pub fn default_hardcoded() -> Self {
        Config {
            strategy: StrategyConfig {
                algorithm: Strategy::AStar,
                survival: true,
                lookahead: false,
                random_seed: 171,
            },
            search: SearchConfig {
                weighted_heuristic_factor: 10,
                inverse_ceiling: 10_000,
                survival_heuristic_weight: 5,
                survival_body_weight: 2,
            },
            survival: SurvivalConfig {
                min_body_buffer: 5,
                min_path_length: 3,
            },
            trap: TrapConfig {
                step_threshold: 0.6,
                path_threshold: 0.8,
                lookahead_depth: 2,
                max_correction_attempts: 3,
            },
            session: SessionConfig {
                grid_height: 20,
                grid_width: 20,
                initial_length: 3,
                max_score: 100,
                max_ticks: 200_000,
                seed: 171,
                trials: 30,
                output_dir: "results".to_string(),
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "snake_agent_debug.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            log::warn!("Could not load Agent.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }
}
