// Trap detection by short simulation plus flood fill
//
// A move is a trap when, after playing it on a scratch copy of the grid, the
// head can reach too small a share of the remaining open cells. The corrector
// uses the same test to vet whole plans and to look for a safer detour.

use log::{debug, info, warn};
use std::collections::VecDeque;

use crate::config::TrapConfig;
use crate::reachability::{count_reachable, open_cells};
use crate::search::{Path, PathSearch, PlanningMode};
use crate::types::{Cell, GridError, Position, StateSnapshot};

/// Flags moves and plans that leave the head with too little room
#[derive(Debug, Clone, Copy)]
pub struct TrapDetector {
    config: TrapConfig,
}

impl TrapDetector {
    pub fn new(config: TrapConfig) -> Self {
        TrapDetector { config }
    }

    /// Plays `steps` on a copy of the snapshot.
    ///
    /// Each step becomes the new head; the tail retracts unless that step
    /// eats `food`.
    pub fn simulate(state: &StateSnapshot, steps: &[Position], food: Position) -> Result<StateSnapshot, GridError> {
        let mut grid = state.grid.clone();
        let mut body: VecDeque<Position> = state.body.iter().copied().collect();
        let mut food_left = true;

        for &step in steps {
            let eats = food_left && step == food;
            if eats {
                food_left = false;
            } else if let Some(tail) = body.pop_back() {
                grid.set(tail, Cell::Empty)?;
            }
            grid.set(step, Cell::Body)?;
            body.push_front(step);
        }

        Ok(StateSnapshot::new(grid, state.score, state.alive, body.into_iter().collect()))
    }

    /// Share of the open cells still reachable from the head after `steps`
    ///
    /// A step off the grid scores 0. A board with no open cells left scores 1.
    pub fn space_ratio(state: &StateSnapshot, steps: &[Position], food: Position) -> f64 {
        let after = match Self::simulate(state, steps, food) {
            Ok(after) => after,
            Err(_) => return 0.0,
        };
        let open = open_cells(&after.grid);
        if open == 0 {
            return 1.0;
        }
        count_reachable(&after.grid, after.head()) as f64 / open as f64
    }

    /// True when moving the head to `next` leaves less than the single-step threshold
    pub fn is_trap(&self, state: &StateSnapshot, next: Position, food: Position) -> bool {
        let ratio = Self::space_ratio(state, &[next], food);
        debug!("Step to ({}, {}) keeps {:.2} of open space", next.row, next.col, ratio);
        ratio < self.config.step_threshold
    }

    /// Vets the first `lookahead_depth` steps of a plan
    pub fn is_plan_safe(&self, state: &StateSnapshot, path: &Path, food: Position) -> bool {
        let steps: Vec<Position> = path.forward().take(self.config.lookahead_depth.max(1)).collect();
        let first = match steps.first() {
            Some(&first) => first,
            None => return true,
        };
        if self.is_trap(state, first, food) {
            return false;
        }
        Self::space_ratio(state, &steps, food) >= self.config.path_threshold
    }
}

/// What the corrector did with a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    /// The plan passed the lookahead check
    Kept,
    /// A safe detour was found on the given attempt
    Replaced { attempts: usize },
    /// No safe detour; the flagged plan is still used
    KeptRisky { attempts: usize },
}

/// Replaces unsafe plans with Inverse-mode detours when one checks out
#[derive(Debug, Clone, Copy)]
pub struct LookaheadCorrector {
    detector: TrapDetector,
    search: PathSearch,
    max_attempts: usize,
}

impl LookaheadCorrector {
    pub fn new(config: TrapConfig, search: PathSearch) -> Self {
        LookaheadCorrector {
            detector: TrapDetector::new(config),
            search,
            max_attempts: config.max_correction_attempts,
        }
    }

    pub fn detector(&self) -> &TrapDetector {
        &self.detector
    }

    /// Returns a plan to follow and how it was obtained.
    ///
    /// Each retry walls off the next cell of the last rejected plan and asks
    /// for an Inverse-mode route to the food. Walls accumulate across retries.
    pub fn correct(&self, state: &StateSnapshot, food: Position, path: Path) -> (Path, Correction) {
        if self.detector.is_plan_safe(state, &path, food) {
            return (path, Correction::Kept);
        }

        let mut working = state.clone();
        let mut rejected = path.clone();
        let mut attempts = 0;

        while attempts < self.max_attempts {
            let offending = match rejected.peek_next() {
                Some(p) => p,
                None => break,
            };
            if working.grid.set(offending, Cell::Wall).is_err() {
                break;
            }
            attempts += 1;

            match self.search.search(&working, food, PlanningMode::Inverse) {
                Ok(candidate) if !candidate.is_empty() => {
                    if self.detector.is_plan_safe(&working, &candidate, food) {
                        info!(
                            "Lookahead replaced a trapped plan after {} attempt(s) ({} -> {} steps)",
                            attempts,
                            path.len(),
                            candidate.len()
                        );
                        return (candidate, Correction::Replaced { attempts });
                    }
                    rejected = candidate;
                }
                _ => break,
            }
        }

        warn!(
            "Lookahead found no safe detour after {} attempt(s), keeping the flagged plan",
            attempts
        );
        (path, Correction::KeptRisky { attempts })
    }
}
