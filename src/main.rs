// Training runner for the snake agent
//
// Usage:
//   cargo run --release -- [options]
//
// Options:
//   --strategy <name>      random | sshaped | astar | weighted | inverse
//   --survival             Chase the tail when the food is unreachable
//   --no-survival          Never enter survival mode
//   --lookahead            Vet plans with the trap detector
//   --trials <n>           Number of games to play
//   --output-dir <dir>     Directory for the per-trial record files
//   --config <path>        Path to Agent.toml (default: Agent.toml)
//   --seed <n>             Base seed for the game sessions

use log::{error, info};
use rayon::prelude::*;
use std::env;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process;

use astar_snake::agent::Strategy;
use astar_snake::config::Config;
use astar_snake::debug_logger::DebugLogger;
use astar_snake::training::{run_session, SessionSummary};

fn print_usage() {
    eprintln!("A* Snake Training Runner");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  astar-snake [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("  --strategy <NAME>       random | sshaped | astar | weighted | inverse");
    eprintln!("  --survival              Chase the tail when the food is unreachable");
    eprintln!("  --no-survival           Never enter survival mode");
    eprintln!("  --lookahead             Vet plans with the trap detector");
    eprintln!("  --trials <N>            Number of games to play");
    eprintln!("  --output-dir <DIR>      Directory for the per-trial record files");
    eprintln!("  --config <PATH>         Path to Agent.toml (default: Agent.toml)");
    eprintln!("  --seed <N>              Base seed for the game sessions");
    eprintln!("  --help                  Show this help message");
    eprintln!();
    eprintln!("EXAMPLES:");
    eprintln!("  # 30 A* games with survival mode, records in ./survival");
    eprintln!("  astar-snake --strategy astar --survival --output-dir survival");
}

/// Settings given on the command line, applied over the loaded config
#[derive(Debug, Default)]
struct CliOverrides {
    config_path: Option<String>,
    strategy: Option<Strategy>,
    survival: Option<bool>,
    lookahead: bool,
    trials: Option<usize>,
    output_dir: Option<String>,
    seed: Option<u64>,
}

fn parse_args(args: &[String]) -> Result<CliOverrides, String> {
    let mut overrides = CliOverrides::default();
    let mut i = 0;

    let value = |i: usize, flag: &str| -> Result<String, String> {
        args.get(i + 1)
            .cloned()
            .ok_or_else(|| format!("{} requires an argument", flag))
    };

    while i < args.len() {
        match args[i].as_str() {
            "--strategy" => {
                overrides.strategy = Some(Strategy::parse(&value(i, "--strategy")?)?);
                i += 1;
            }
            "--survival" => overrides.survival = Some(true),
            "--no-survival" => overrides.survival = Some(false),
            "--lookahead" => overrides.lookahead = true,
            "--trials" => {
                let raw = value(i, "--trials")?;
                overrides.trials = Some(
                    raw.parse::<usize>()
                        .map_err(|e| format!("Invalid trial count '{}': {}", raw, e))?,
                );
                i += 1;
            }
            "--output-dir" => {
                overrides.output_dir = Some(value(i, "--output-dir")?);
                i += 1;
            }
            "--config" => {
                overrides.config_path = Some(value(i, "--config")?);
                i += 1;
            }
            "--seed" => {
                let raw = value(i, "--seed")?;
                overrides.seed = Some(
                    raw.parse::<u64>()
                        .map_err(|e| format!("Invalid seed '{}': {}", raw, e))?,
                );
                i += 1;
            }
            other => return Err(format!("Unknown option '{}'", other)),
        }
        i += 1;
    }

    Ok(overrides)
}

fn record_path(dir: &Path, strategy: Strategy, survival: bool, trial: usize) -> PathBuf {
    let suffix = if survival { "_survival" } else { "" };
    dir.join(format!("{}{}_{}.csv", strategy.as_str(), suffix, trial))
}

fn run_trial(config: &Config, dir: &Path, trial: usize, logger: &DebugLogger) -> io::Result<SessionSummary> {
    let path = record_path(dir, config.strategy.algorithm, config.strategy.survival, trial);
    let file = File::create(&path)?;
    info!("Trial {} writing {}", trial, path.display());
    let (summary, _) = run_session(config, trial, BufWriter::new(file), logger)?;
    Ok(summary)
}

fn main() {
    // Default to 'info' level logging unless RUST_LOG is set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help") {
        print_usage();
        process::exit(0);
    }

    let overrides = match parse_args(&args) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            process::exit(1);
        }
    };

    let mut config = match &overrides.config_path {
        Some(path) => Config::from_file(path).unwrap_or_else(|e| {
            eprintln!("Warning: Could not load config from '{}': {}", path, e);
            eprintln!("Using default configuration");
            Config::default_hardcoded()
        }),
        None => Config::load_or_default(),
    };
    if let Some(strategy) = overrides.strategy {
        config.strategy.algorithm = strategy;
    }
    if let Some(survival) = overrides.survival {
        config.strategy.survival = survival;
    }
    if overrides.lookahead {
        config.strategy.lookahead = true;
    }
    if let Some(trials) = overrides.trials {
        config.session.trials = trials;
    }
    if let Some(dir) = overrides.output_dir {
        config.session.output_dir = dir;
    }
    if let Some(seed) = overrides.seed {
        config.session.seed = seed;
    }

    if config.strategy.algorithm == Strategy::Sweep && config.session.grid_height % 2 != 0 {
        eprintln!(
            "Error: the sshaped strategy needs an even grid height, got {}",
            config.session.grid_height
        );
        process::exit(1);
    }

    let dir = PathBuf::from(&config.session.output_dir);
    if let Err(e) = fs::create_dir_all(&dir) {
        eprintln!("Error: could not create output directory '{}': {}", dir.display(), e);
        process::exit(1);
    }

    let logger = DebugLogger::new(config.debug.enabled, &config.debug.log_file_path);

    info!(
        "Running {} trial(s) of {} (survival: {}, lookahead: {}) on a {}x{} grid",
        config.session.trials,
        config.strategy.algorithm.as_str(),
        config.strategy.survival,
        config.strategy.lookahead,
        config.session.grid_height,
        config.session.grid_width
    );

    let results: Vec<io::Result<SessionSummary>> = (0..config.session.trials)
        .into_par_iter()
        .map(|trial| run_trial(&config, &dir, trial, &logger))
        .collect();
    logger.flush();

    let mut summaries = Vec::with_capacity(results.len());
    for (trial, result) in results.into_iter().enumerate() {
        match result {
            Ok(summary) => summaries.push(summary),
            Err(e) => error!("Trial {} failed: {}", trial, e),
        }
    }

    if summaries.is_empty() {
        eprintln!("Error: no trial completed");
        process::exit(1);
    }

    let mean_score = summaries.iter().map(|s| f64::from(s.score)).sum::<f64>() / summaries.len() as f64;
    let survivors = summaries.iter().filter(|s| s.alive).count();
    println!(
        "{} trial(s): mean score {:.2}, max {}, {} still alive",
        summaries.len(),
        mean_score,
        summaries.iter().map(|s| s.score).max().unwrap_or(0),
        survivors
    );
    match serde_json::to_string_pretty(&summaries) {
        Ok(json) => {
            let summary_path = dir.join("summary.json");
            if let Err(e) = fs::write(&summary_path, json) {
                error!("Failed to write {}: {}", summary_path.display(), e);
            }
        }
        Err(e) => error!("Failed to serialize trial summaries: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args_reads_every_flag() {
        let o = parse_args(&args(&[
            "--strategy",
            "weighted",
            "--survival",
            "--lookahead",
            "--trials",
            "4",
            "--output-dir",
            "out",
            "--seed",
            "9",
        ]))
        .unwrap();
        assert_eq!(o.strategy, Some(Strategy::Weighted));
        assert_eq!(o.survival, Some(true));
        assert!(o.lookahead);
        assert_eq!(o.trials, Some(4));
        assert_eq!(o.output_dir.as_deref(), Some("out"));
        assert_eq!(o.seed, Some(9));
    }

    #[test]
    fn test_parse_args_rejects_bad_input() {
        assert!(parse_args(&args(&["--strategy", "bfs"])).is_err());
        assert!(parse_args(&args(&["--trials"])).is_err());
        assert!(parse_args(&args(&["--bogus"])).is_err());
    }

    #[test]
    fn test_record_file_names() {
        let dir = Path::new("survival");
        assert_eq!(
            record_path(dir, Strategy::Sweep, false, 3),
            PathBuf::from("survival/sshaped_3.csv")
        );
        assert_eq!(
            record_path(dir, Strategy::AStar, true, 0),
            PathBuf::from("survival/astar_survival_0.csv")
        );
    }
}
