// Tail-chasing fallback used when the food cannot be reached
//
// The snake stalls by following the longest Survival-mode route to a segment
// near its own tail, buying time for the board to open up.

use log::debug;

use crate::config::SurvivalConfig;
use crate::error::PlanError;
use crate::search::{Path, PathSearch, PlanningMode};
use crate::types::StateSnapshot;

/// A stalling route and the body index it ends on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurvivalPlan {
    pub path: Path,
    pub target_index: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct SurvivalPlanner {
    search: PathSearch,
    config: SurvivalConfig,
}

impl SurvivalPlanner {
    pub fn new(config: SurvivalConfig, search: PathSearch) -> Self {
        SurvivalPlanner { search, config }
    }

    /// Finds the longest Survival-mode path to a body segment near the tail.
    ///
    /// Candidates run from the tail towards the head and stop before
    /// `min_body_buffer`. Paths shorter than `min_path_length` are ignored;
    /// on equal lengths the candidate closest to the tail wins.
    pub fn plan(&self, state: &StateSnapshot) -> Result<SurvivalPlan, PlanError> {
        let mut best: Option<SurvivalPlan> = None;

        for index in (self.config.min_body_buffer + 1..state.body.len()).rev() {
            let target = state.body[index];
            let path = match self.search.search(state, target, PlanningMode::Survival) {
                Ok(path) => path,
                Err(_) => continue,
            };
            debug!("Survival candidate {} gives a {}-step path", index, path.len());

            if path.len() < self.config.min_path_length {
                continue;
            }
            if best.as_ref().map_or(true, |b| path.len() > b.path.len()) {
                best = Some(SurvivalPlan {
                    path,
                    target_index: index,
                });
            }
        }

        best.ok_or(PlanError::SurvivalExhausted {
            body_len: state.body.len(),
        })
    }
}
