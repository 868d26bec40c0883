// Training runs: play headless games and record the score trace
//
// A record stream is CSV-like: a `count,score` header, one `count,score` line
// before every move, then a closing `count,elapsed_seconds` line.

use log::info;
use serde::Serialize;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use crate::agent::{AgentController, AgentStats, Strategy};
use crate::config::Config;
use crate::debug_logger::DebugLogger;
use crate::game::GameSession;

/// Writes the per-tick score trace of one game
pub struct RecordWriter<W: Write> {
    out: W,
    records: u64,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(mut out: W) -> io::Result<Self> {
        writeln!(out, "count,score")?;
        Ok(RecordWriter { out, records: 0 })
    }

    pub fn record(&mut self, count: u64, score: u32) -> io::Result<()> {
        self.records += 1;
        writeln!(self.out, "{},{}", count, score)
    }

    /// Number of `record` lines written so far
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Writes the closing line and hands the sink back
    pub fn finish(mut self, count: u64, elapsed: Duration) -> io::Result<W> {
        writeln!(self.out, "{},{:.4}", count, elapsed.as_secs_f64())?;
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Outcome of one training game
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub trial: usize,
    pub strategy: Strategy,
    pub survival: bool,
    pub score: u32,
    pub ticks: u64,
    pub alive: bool,
    pub completed: bool,
    pub elapsed_secs: f64,
    pub stats: AgentStats,
}

/// Plays one game to the end and streams its record to `sink`.
///
/// The game stops when the snake dies, reaches `max_score`, fills the board or
/// runs for `max_ticks` moves. The session seed is `session.seed + trial` and
/// the agent seed `strategy.random_seed + trial`, so trials differ but replay
/// identically.
pub fn run_session<W: Write>(
    config: &Config,
    trial: usize,
    sink: W,
    logger: &DebugLogger,
) -> io::Result<(SessionSummary, W)> {
    let session_config = &config.session;
    let mut agent_config = config.clone();
    agent_config.strategy.random_seed = config.strategy.random_seed.wrapping_add(trial as u64);

    let mut game = GameSession::new(session_config, session_config.seed.wrapping_add(trial as u64))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let mut agent = AgentController::new(&agent_config);
    let mut writer = RecordWriter::new(sink)?;

    let start = Instant::now();
    let mut count: u64 = 0;

    while game.is_alive() && game.score() < session_config.max_score && count < session_config.max_ticks {
        let food = match game.food_position() {
            Some(food) => food,
            None => break,
        };
        writer.record(count, game.score())?;

        let state = game.snapshot();
        let mv = agent.choose_next_move(&state, food);
        logger.log_move(trial, count, mv, agent.phase(), state.head(), Some(food), game.score());

        game.step(mv).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        count += 1;
    }

    let elapsed = start.elapsed();
    let sink = writer.finish(count, elapsed)?;

    let summary = SessionSummary {
        trial,
        strategy: agent.strategy(),
        survival: config.strategy.survival,
        score: game.score(),
        ticks: count,
        alive: game.is_alive(),
        completed: game.is_complete(),
        elapsed_secs: elapsed.as_secs_f64(),
        stats: agent.stats(),
    };
    info!(
        "Trial {} ({}): score {} after {} moves, {}",
        trial,
        summary.strategy.as_str(),
        summary.score,
        summary.ticks,
        if summary.alive { "alive" } else { "dead" }
    );
    Ok((summary, sink))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_writer_format() {
        let mut writer = RecordWriter::new(Vec::new()).unwrap();
        writer.record(0, 0).unwrap();
        writer.record(1, 1).unwrap();
        assert_eq!(writer.records(), 2);
        let out = writer.finish(2, Duration::from_millis(1500)).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "count,score\n0,0\n1,1\n2,1.5000\n");
    }

    #[test]
    fn test_session_record_has_one_line_per_move() {
        let mut config = Config::default_hardcoded();
        config.session.grid_height = 8;
        config.session.grid_width = 8;
        config.session.max_score = 5;

        let (summary, out) = run_session(&config, 0, Vec::new(), &DebugLogger::disabled()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "count,score");
        assert_eq!(lines.len() as u64, summary.ticks + 2);
        let closing: Vec<&str> = lines[lines.len() - 1].split(',').collect();
        assert_eq!(closing[0].parse::<u64>().unwrap(), summary.ticks);
        assert_eq!(closing[1].split('.').nth(1).map(str::len), Some(4));
        assert_eq!(summary.stats.ticks, summary.ticks);
    }

    #[test]
    fn test_tick_cap_stops_the_game() {
        let mut config = Config::default_hardcoded();
        config.strategy.algorithm = Strategy::Sweep;
        config.session.grid_height = 6;
        config.session.grid_width = 6;
        config.session.max_ticks = 4;

        let (summary, _) = run_session(&config, 1, Vec::new(), &DebugLogger::disabled()).unwrap();
        assert_eq!(summary.ticks, 4);
        assert!(summary.alive);
    }
}
