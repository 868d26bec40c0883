// A* path search with selectable cost policies
//
// One search run owns a flat arena of nodes; parents are arena indices, so
// reconstructing a path is a walk over `usize`s. The open set is a binary heap
// keyed by (f, insertion sequence): equal-f nodes come out first-in-first-out.

use log::debug;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::config::SearchConfig;
use crate::error::PlanError;
use crate::types::{Cell, Position, StateSnapshot};

/// Cost policy used to rank open nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanningMode {
    /// f = g + h, shortest path
    Default,
    /// f = g + k·h, greedy pull towards the goal
    Weighted,
    /// f = C − (g + h), prefers the farthest open cells first
    Inverse,
    /// f = −(g + a·h) + b·dist_to_body, packs the snake against itself
    Survival,
}

/// Ordered steps from the start (exclusive) to the goal (inclusive)
///
/// Stored goal-first; `pop_next` takes from the back so steps come out in
/// walking order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    steps: Vec<Position>,
}

impl Path {
    /// Builds a path from steps listed in walking order
    pub fn from_forward(mut forward: Vec<Position>) -> Self {
        forward.reverse();
        Path { steps: forward }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Next step to walk, without consuming it
    pub fn peek_next(&self) -> Option<Position> {
        self.steps.last().copied()
    }

    /// Consumes the next step
    pub fn pop_next(&mut self) -> Option<Position> {
        self.steps.pop()
    }

    pub fn goal(&self) -> Option<Position> {
        self.steps.first().copied()
    }

    /// Steps in walking order
    pub fn forward(&self) -> impl Iterator<Item = Position> + '_ {
        self.steps.iter().rev().copied()
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }
}

/// Hooks for watching a search run, e.g. to animate it
///
/// Observers see the search but cannot steer it.
pub trait SearchObserver {
    fn node_opened(&mut self, _position: Position) {}
    fn node_expanded(&mut self, _position: Position) {}
    fn goal_reached(&mut self, _path: &Path) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SearchObserver for NoopObserver {}

#[derive(Debug, Clone, Copy)]
struct SearchNode {
    position: Position,
    parent: Option<usize>,
    g: i64,
    h: i64,
    f: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    Unseen,
    Open(usize),
    Closed,
}

/// A* search over the snapshot grid
#[derive(Debug, Clone, Copy)]
pub struct PathSearch {
    costs: SearchConfig,
}

impl PathSearch {
    pub fn new(costs: SearchConfig) -> Self {
        PathSearch { costs }
    }

    /// Searches from the snake's head to `goal`
    pub fn search(&self, state: &StateSnapshot, goal: Position, mode: PlanningMode) -> Result<Path, PlanError> {
        self.search_observed(state, goal, mode, &mut NoopObserver)
    }

    /// Same as `search`, reporting progress to `observer`
    pub fn search_observed(
        &self,
        state: &StateSnapshot,
        goal: Position,
        mode: PlanningMode,
        observer: &mut dyn SearchObserver,
    ) -> Result<Path, PlanError> {
        let grid = &state.grid;
        let start = state.head();

        let mut arena: Vec<SearchNode> = Vec::new();
        let mut node_state = vec![NodeState::Unseen; grid.cell_count()];
        let mut open: BinaryHeap<Reverse<(i64, u64, usize)>> = BinaryHeap::new();
        let mut seq: u64 = 0;

        arena.push(SearchNode {
            position: start,
            parent: None,
            g: 0,
            h: i64::from(start.manhattan(goal)),
            f: 0,
        });
        if let Some(i) = grid.index(start) {
            node_state[i] = NodeState::Open(0);
        }
        open.push(Reverse((0, seq, 0)));
        let mut expanded = 0usize;

        while let Some(Reverse((f, _, idx))) = open.pop() {
            let current = arena[idx];
            if let Some(i) = grid.index(current.position) {
                // Skip heap entries superseded by a relaxation
                if node_state[i] != NodeState::Open(idx) || current.f != f {
                    continue;
                }
                node_state[i] = NodeState::Closed;
            }
            expanded += 1;
            observer.node_expanded(current.position);

            if current.position == goal {
                let path = Self::reconstruct(&arena, idx);
                debug!(
                    "{:?} search reached ({}, {}) in {} steps, {} nodes expanded",
                    mode,
                    goal.row,
                    goal.col,
                    path.len(),
                    expanded
                );
                observer.goal_reached(&path);
                return Ok(path);
            }

            for child in current.position.neighbors() {
                let cell_idx = match grid.index(child) {
                    Some(i) => i,
                    None => continue,
                };
                if !Self::is_walkable(grid.cell(child), child == goal && mode == PlanningMode::Survival) {
                    continue;
                }

                let g = current.g + 1;
                match node_state[cell_idx] {
                    NodeState::Closed => continue,
                    NodeState::Open(existing) => {
                        if arena[existing].g > g {
                            let node = &mut arena[existing];
                            node.g = g;
                            node.parent = Some(idx);
                            node.f = self.f_cost(mode, g, node.h, child, &state.body);
                            seq += 1;
                            open.push(Reverse((node.f, seq, existing)));
                        }
                    }
                    NodeState::Unseen => {
                        let h = i64::from(child.manhattan(goal));
                        let f = self.f_cost(mode, g, h, child, &state.body);
                        arena.push(SearchNode {
                            position: child,
                            parent: Some(idx),
                            g,
                            h,
                            f,
                        });
                        let new_idx = arena.len() - 1;
                        node_state[cell_idx] = NodeState::Open(new_idx);
                        seq += 1;
                        open.push(Reverse((f, seq, new_idx)));
                        observer.node_opened(child);
                    }
                }
            }
        }

        debug!(
            "{:?} search to ({}, {}) failed after expanding {} nodes",
            mode, goal.row, goal.col, expanded
        );
        Err(PlanError::PathNotFound { goal, mode })
    }

    /// Priority of a node under the given cost policy
    fn f_cost(&self, mode: PlanningMode, g: i64, h: i64, position: Position, body: &[Position]) -> i64 {
        match mode {
            PlanningMode::Default => g + h,
            PlanningMode::Weighted => g + self.costs.weighted_heuristic_factor * h,
            PlanningMode::Inverse => self.costs.inverse_ceiling - (g + h),
            PlanningMode::Survival => {
                -(g + self.costs.survival_heuristic_weight * h)
                    + self.costs.survival_body_weight * Self::dist_to_body(position, body)
            }
        }
    }

    /// Minimum Manhattan distance from `position` to any body segment
    fn dist_to_body(position: Position, body: &[Position]) -> i64 {
        body.iter()
            .map(|&segment| i64::from(position.manhattan(segment)))
            .min()
            .unwrap_or(0)
    }

    fn is_walkable(cell: Option<Cell>, goal_exempt: bool) -> bool {
        match cell {
            Some(Cell::Empty) | Some(Cell::Food) => true,
            Some(Cell::Body) => goal_exempt,
            Some(Cell::Wall) | None => false,
        }
    }

    fn reconstruct(arena: &[SearchNode], goal_idx: usize) -> Path {
        let mut steps = Vec::new();
        let mut idx = goal_idx;
        while let Some(parent) = arena[idx].parent {
            steps.push(arena[idx].position);
            idx = parent;
        }
        Path { steps }
    }
}
