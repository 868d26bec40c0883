// Agent controller: the per-game state machine that turns snapshots into moves
//
// The controller owns the only state that survives between ticks: the cached
// path, the survival flag and the sweep's first-move flag. Everything else is
// recomputed from the snapshot it is handed.

use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::PlanError;
use crate::search::{Path, PathSearch, PlanningMode};
use crate::survival::SurvivalPlanner;
use crate::sweep::sweep_path;
use crate::trap::{Correction, LookaheadCorrector};
use crate::types::{Move, Position, StateSnapshot};

/// Move emitted when no plan can be produced
pub const FALLBACK_MOVE: Move = Move::Down;

/// Planner that drives the snake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Strategy {
    #[serde(rename = "random")]
    Random,
    #[serde(rename = "sshaped")]
    Sweep,
    #[serde(rename = "astar")]
    AStar,
    #[serde(rename = "weighted")]
    Weighted,
    #[serde(rename = "inverse")]
    Inverse,
}

impl Strategy {
    /// Name used in configuration files, CLI flags and result file names
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Random => "random",
            Strategy::Sweep => "sshaped",
            Strategy::AStar => "astar",
            Strategy::Weighted => "weighted",
            Strategy::Inverse => "inverse",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "random" => Ok(Strategy::Random),
            "sshaped" | "sweep" => Ok(Strategy::Sweep),
            "astar" => Ok(Strategy::AStar),
            "weighted" => Ok(Strategy::Weighted),
            "inverse" => Ok(Strategy::Inverse),
            _ => Err(format!("Invalid strategy: {}", s)),
        }
    }

    /// A* cost policy behind the strategy, if it is search based
    pub fn planning_mode(&self) -> Option<PlanningMode> {
        match self {
            Strategy::AStar => Some(PlanningMode::Default),
            Strategy::Weighted => Some(PlanningMode::Weighted),
            Strategy::Inverse => Some(PlanningMode::Inverse),
            Strategy::Random | Strategy::Sweep => None,
        }
    }
}

/// Controller state machine phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AgentPhase {
    /// No cached path
    Idle,
    /// Consuming the cached path one step per tick
    Following,
    /// Cached path exhausted, asking a planner for a new one
    Replanning,
    /// No route to the food; chasing the tail or emitting the fallback move
    SurvivalFallback,
    /// Vetting the next steps of the cached path
    LookaheadCorrecting,
}

/// Counters describing what the controller did over a game
///
/// A survival episode counts one entry and at most one exit, however many
/// ticks it spends exhausted on the fallback move.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AgentStats {
    pub ticks: u64,
    pub replans: u64,
    pub survival_entries: u64,
    pub survival_exits: u64,
    pub survival_exhausted: u64,
    pub fallback_moves: u64,
    pub corrections: u64,
    pub risky_plans: u64,
    pub malformed_deltas: u64,
}

/// Inputs and output of the previous decision
#[derive(Debug, Clone)]
struct Decision {
    body: Vec<Position>,
    score: u32,
    food: Position,
    chosen: Move,
}

impl Decision {
    fn matches(&self, state: &StateSnapshot, food: Position) -> bool {
        self.food == food && self.score == state.score && self.body == state.body
    }
}

/// Chooses one move per tick for a single game
pub struct AgentController {
    strategy: Strategy,
    survival_enabled: bool,
    lookahead_enabled: bool,
    search: PathSearch,
    survival: SurvivalPlanner,
    corrector: LookaheadCorrector,
    rng: StdRng,
    cached: Path,
    in_survival: bool,
    first_move: bool,
    phase: AgentPhase,
    last: Option<Decision>,
    stats: AgentStats,
}

impl AgentController {
    /// Creates a controller for one game
    ///
    /// # Arguments
    /// * `config` - Static configuration that does not change during the game
    pub fn new(config: &Config) -> Self {
        let search = PathSearch::new(config.search);
        AgentController {
            strategy: config.strategy.algorithm,
            survival_enabled: config.strategy.survival,
            lookahead_enabled: config.strategy.lookahead,
            search,
            survival: SurvivalPlanner::new(config.survival, search),
            corrector: LookaheadCorrector::new(config.trap, search),
            rng: StdRng::seed_from_u64(config.strategy.random_seed),
            cached: Path::default(),
            in_survival: false,
            first_move: true,
            phase: AgentPhase::Idle,
            last: None,
            stats: AgentStats::default(),
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn phase(&self) -> AgentPhase {
        self.phase
    }

    pub fn stats(&self) -> AgentStats {
        self.stats
    }

    pub fn in_survival_mode(&self) -> bool {
        self.in_survival
    }

    /// Steps still queued in the cached path
    pub fn cached_path(&self) -> &Path {
        &self.cached
    }

    /// Computes the move for this tick.
    ///
    /// Asking again with an unchanged snapshot and food returns the same move
    /// without consuming the cached path. The memo compares body, score and
    /// food only, so a grid edit that leaves all three unchanged is not
    /// noticed; `GameSession` never does that. A malformed step is reported,
    /// the stale path dropped and the move replanned once.
    pub fn choose_next_move(&mut self, state: &StateSnapshot, food: Position) -> Move {
        if let Some(last) = &self.last {
            if last.matches(state, food) {
                return last.chosen;
            }
        }
        self.stats.ticks += 1;

        let chosen = match self.try_next_move(state, food) {
            Ok(mv) => mv,
            Err(err) => {
                error!("Tick {}: {}, dropping the cached path", self.stats.ticks, err);
                self.stats.malformed_deltas += 1;
                self.cached.clear();
                match self.try_next_move(state, food) {
                    Ok(mv) => mv,
                    Err(err) => {
                        error!("Tick {}: replanning failed too: {}", self.stats.ticks, err);
                        self.stats.malformed_deltas += 1;
                        self.cached.clear();
                        self.transition(AgentPhase::Idle);
                        self.fallback()
                    }
                }
            }
        };

        self.last = Some(Decision {
            body: state.body.clone(),
            score: state.score,
            food,
            chosen,
        });
        chosen
    }

    /// One pass of the state machine.
    ///
    /// Planning failures are recovered here (survival path or fallback move);
    /// only `PlanError::MalformedMoveDelta` reaches the caller.
    pub fn try_next_move(&mut self, state: &StateSnapshot, food: Position) -> Result<Move, PlanError> {
        let head = state.head();

        if self.survival_enabled && self.in_survival && !self.cached.is_empty() {
            if let Ok(path) = self.search.search(state, food, PlanningMode::Default) {
                if !path.is_empty() {
                    info!("Food reachable again, leaving survival mode");
                    self.leave_survival();
                    self.cached = path;
                }
            }
        }

        if self.strategy == Strategy::Random {
            self.transition(AgentPhase::Idle);
            return Ok(Move::all()[self.rng.random_range(0..4usize)]);
        }

        if self.cached.is_empty() {
            // After an exhausted survival search the flag stays set: no path was followed
            let exhausted_last_tick = self.phase == AgentPhase::SurvivalFallback;
            if self.in_survival && !exhausted_last_tick {
                info!("Survival path consumed, leaving survival mode");
                self.leave_survival();
            }
            self.transition(AgentPhase::Replanning);
            self.stats.replans += 1;

            match self.plan(state, food) {
                Ok(path) => {
                    if self.in_survival {
                        info!("Food reachable again, leaving survival mode");
                        self.leave_survival();
                    }
                    self.cached = path;
                }
                Err(err) => {
                    warn!("{}", err);
                    match self.plan_survival(state) {
                        Some(path) => self.cached = path,
                        None => return Ok(self.fallback()),
                    }
                }
            }
        }

        if self.lookahead_enabled && !self.in_survival && self.strategy.planning_mode().is_some() {
            self.transition(AgentPhase::LookaheadCorrecting);
            let plan = std::mem::take(&mut self.cached);
            let (plan, correction) = self.corrector.correct(state, food, plan);
            match correction {
                Correction::Kept => {}
                Correction::Replaced { .. } => self.stats.corrections += 1,
                Correction::KeptRisky { .. } => self.stats.risky_plans += 1,
            }
            self.cached = plan;
        }

        let next = match self.cached.pop_next() {
            Some(next) => next,
            None => return Ok(self.fallback()),
        };
        let mv = Move::from_delta(head, next)?;
        self.transition(AgentPhase::Following);
        Ok(mv)
    }

    /// Fresh plan for the configured strategy
    fn plan(&mut self, state: &StateSnapshot, food: Position) -> Result<Path, PlanError> {
        match self.strategy.planning_mode() {
            Some(mode) => {
                let path = self.search.search(state, food, mode)?;
                if path.is_empty() {
                    return Err(PlanError::PathNotFound { goal: food, mode });
                }
                Ok(path)
            }
            None => {
                let path = sweep_path(state, self.first_move);
                self.first_move = false;
                Ok(path)
            }
        }
    }

    /// Engages survival mode; `None` means the fallback move must be used
    fn plan_survival(&mut self, state: &StateSnapshot) -> Option<Path> {
        if !self.survival_enabled {
            self.transition(AgentPhase::Idle);
            return None;
        }

        self.transition(AgentPhase::SurvivalFallback);
        if !self.in_survival {
            info!("Entering survival mode (body length {})", state.body.len());
            self.in_survival = true;
            self.stats.survival_entries += 1;
        }

        match self.survival.plan(state) {
            Ok(plan) => {
                info!(
                    "Survival path of {} steps towards body segment {}",
                    plan.path.len(),
                    plan.target_index
                );
                Some(plan.path)
            }
            Err(err) => {
                warn!("{}, moving {}", err, FALLBACK_MOVE.as_str());
                self.stats.survival_exhausted += 1;
                None
            }
        }
    }

    fn leave_survival(&mut self) {
        self.in_survival = false;
        self.stats.survival_exits += 1;
    }

    fn fallback(&mut self) -> Move {
        self.stats.fallback_moves += 1;
        FALLBACK_MOVE
    }

    fn transition(&mut self, phase: AgentPhase) {
        if self.phase != phase {
            debug!("{:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cell, Grid};

    fn config_with(strategy: Strategy) -> Config {
        let mut config = Config::default_hardcoded();
        config.strategy.algorithm = strategy;
        config
    }

    /// Snapshot after moving the head by `mv` without eating
    fn advance(state: &StateSnapshot, mv: Move) -> StateSnapshot {
        let mut grid = state.grid.clone();
        let mut body = state.body.clone();
        let tail = body.pop().unwrap();
        grid.set(tail, Cell::Empty).unwrap();
        let head = state.head().step(mv);
        grid.set(head, Cell::Body).unwrap();
        body.insert(0, head);
        StateSnapshot::new(grid, state.score, true, body)
    }

    fn boxed_food_state() -> StateSnapshot {
        let mut rows = vec!["@#........", "##........"];
        rows.extend(std::iter::repeat("..........").take(8));
        StateSnapshot::from_rows(&rows, (0..8).map(|i| Position::new(5, 2 + i)).collect(), 0).unwrap()
    }

    #[test]
    fn test_scenario_a_reaches_food_in_two_moves() {
        let mut agent = AgentController::new(&Config::default_hardcoded());
        let food = Position::new(0, 0);
        let state = StateSnapshot::from_rows(&["...", "...", "..."], vec![Position::new(1, 1)], 0).unwrap();

        let first = agent.choose_next_move(&state, food);
        assert!(first == Move::Up || first == Move::Left);
        let state = advance(&state, first);
        let second = agent.choose_next_move(&state, food);
        assert_eq!(state.head().step(second), food);
        assert_eq!(agent.phase(), AgentPhase::Following);
        assert!(agent.cached_path().is_empty());
    }

    #[test]
    fn test_repeated_queries_return_the_same_move() {
        let mut agent = AgentController::new(&Config::default_hardcoded());
        let food = Position::new(4, 5);
        let state = StateSnapshot::from_rows(&["......"; 6], vec![Position::new(0, 0)], 0).unwrap();

        let first = agent.choose_next_move(&state, food);
        let remaining = agent.cached_path().len();
        for _ in 0..5 {
            assert_eq!(agent.choose_next_move(&state, food), first);
        }
        assert_eq!(agent.cached_path().len(), remaining);
        assert_eq!(agent.stats().ticks, 1);

        let state = advance(&state, first);
        agent.choose_next_move(&state, food);
        assert_eq!(agent.cached_path().len(), remaining - 1);
        assert_eq!(agent.stats().ticks, 2);
    }

    #[test]
    fn test_unreachable_food_without_survival_moves_down() {
        let mut config = Config::default_hardcoded();
        config.strategy.survival = false;
        let mut agent = AgentController::new(&config);

        let mv = agent.choose_next_move(&boxed_food_state(), Position::new(0, 0));
        assert_eq!(mv, FALLBACK_MOVE);
        assert_eq!(agent.stats().fallback_moves, 1);
        assert_eq!(agent.phase(), AgentPhase::Idle);
        assert!(!agent.in_survival_mode());
    }

    #[test]
    fn test_unreachable_food_engages_survival() {
        let mut agent = AgentController::new(&Config::default_hardcoded());
        let state = boxed_food_state();

        let mv = agent.choose_next_move(&state, Position::new(0, 0));
        assert!(state.grid.is_open(state.head().step(mv)));
        assert!(agent.in_survival_mode());
        assert_eq!(agent.stats().survival_entries, 1);
        assert_eq!(agent.phase(), AgentPhase::Following);
        assert!(agent.cached_path().len() >= 2);
    }

    #[test]
    fn test_survival_ends_once_food_is_reachable() {
        let mut agent = AgentController::new(&Config::default_hardcoded());
        let food = Position::new(0, 0);
        let boxed = boxed_food_state();
        let mv = agent.choose_next_move(&boxed, food);
        assert!(agent.in_survival_mode());

        // Same body one step later, with the walls around the food gone
        let moved = advance(&boxed, mv);
        let mut grid = moved.grid.clone();
        for wall in [Position::new(0, 1), Position::new(1, 0), Position::new(1, 1)] {
            grid.set(wall, Cell::Empty).unwrap();
        }
        let opened = StateSnapshot::new(grid, 0, true, moved.body.clone());

        let expected = PathSearch::new(Config::default_hardcoded().search)
            .search(&opened, food, PlanningMode::Default)
            .unwrap();
        let mv = agent.choose_next_move(&opened, food);
        assert!(!agent.in_survival_mode());
        assert_eq!(agent.stats().survival_exits, 1);
        assert_eq!(Some(opened.head().step(mv)), expected.peek_next());
        assert_eq!(agent.cached_path().len(), expected.len() - 1);
    }

    #[test]
    fn test_exhausted_survival_moves_down_and_stays_in_fallback() {
        let rows = vec!["####", "#..#", "#..#", "#..#", "#..#", "####"];
        let body = vec![
            Position::new(1, 1),
            Position::new(1, 2),
            Position::new(2, 2),
            Position::new(2, 1),
            Position::new(3, 1),
            Position::new(3, 2),
            Position::new(4, 2),
            Position::new(4, 1),
        ];
        let state = StateSnapshot::from_rows(&rows, body, 0).unwrap();
        let mut agent = AgentController::new(&Config::default_hardcoded());

        assert_eq!(agent.choose_next_move(&state, Position::new(0, 0)), FALLBACK_MOVE);
        assert_eq!(agent.phase(), AgentPhase::SurvivalFallback);
        assert_eq!(agent.stats().survival_exhausted, 1);
        assert!(agent.in_survival_mode());
    }

    /// Snake of 8 filling a sealed 4x2 pocket, head at the top left
    fn sealed_pocket(top_row: &str, score: u32) -> StateSnapshot {
        let rows = vec![top_row, "#..#", "#..#", "#..#", "#..#", "####"];
        let body = vec![
            Position::new(1, 1),
            Position::new(1, 2),
            Position::new(2, 2),
            Position::new(2, 1),
            Position::new(3, 1),
            Position::new(3, 2),
            Position::new(4, 2),
            Position::new(4, 1),
        ];
        StateSnapshot::from_rows(&rows, body, score).unwrap()
    }

    #[test]
    fn test_repeated_exhaustion_counts_one_survival_episode() {
        let mut agent = AgentController::new(&Config::default_hardcoded());
        let food = Position::new(0, 1);

        assert_eq!(agent.choose_next_move(&sealed_pocket("####", 0), food), FALLBACK_MOVE);
        // Score differs so the memo does not answer
        assert_eq!(agent.choose_next_move(&sealed_pocket("####", 1), food), FALLBACK_MOVE);

        let stats = agent.stats();
        assert_eq!(stats.ticks, 2);
        assert_eq!(stats.survival_exhausted, 2);
        assert_eq!(stats.survival_entries, 1);
        assert_eq!(stats.survival_exits, 0);
        assert_eq!(stats.fallback_moves, 2);
        assert!(agent.in_survival_mode());
        assert_eq!(agent.phase(), AgentPhase::SurvivalFallback);
    }

    #[test]
    fn test_food_reachable_after_exhaustion_leaves_survival() {
        let mut agent = AgentController::new(&Config::default_hardcoded());
        let food = Position::new(0, 1);

        assert_eq!(agent.choose_next_move(&sealed_pocket("####", 0), food), FALLBACK_MOVE);
        assert!(agent.in_survival_mode());

        // The wall above the head opens onto the food
        let mv = agent.choose_next_move(&sealed_pocket("#.##", 1), food);
        assert_eq!(mv, Move::Up);
        assert!(!agent.in_survival_mode());
        let stats = agent.stats();
        assert_eq!(stats.survival_entries, 1);
        assert_eq!(stats.survival_exits, 1);
        assert_eq!(stats.survival_exhausted, 1);
        assert_eq!(agent.phase(), AgentPhase::Following);
    }

    #[test]
    fn test_stale_path_is_reported_and_replanned() {
        let mut agent = AgentController::new(&Config::default_hardcoded());
        let food = Position::new(5, 5);
        let rows = ["......"; 6];
        let state = StateSnapshot::from_rows(&rows, vec![Position::new(2, 2)], 0).unwrap();
        agent.choose_next_move(&state, food);

        // The world jumps the head somewhere the cached path does not start
        let teleported = StateSnapshot::from_rows(&rows, vec![Position::new(0, 0)], 0).unwrap();
        let mv = agent.choose_next_move(&teleported, food);
        assert_eq!(agent.stats().malformed_deltas, 1);
        assert!(mv == Move::Right || mv == Move::Down);
        assert_eq!(agent.cached_path().len(), 9);
    }

    #[test]
    fn test_sweep_steps_off_the_top_row_first() {
        let mut agent = AgentController::new(&config_with(Strategy::Sweep));
        let food = Position::new(3, 3);
        let state = StateSnapshot::from_rows(&["....", "....", "....", "...."], vec![Position::new(0, 1)], 0).unwrap();

        assert_eq!(agent.choose_next_move(&state, food), Move::Down);
        let state = advance(&state, Move::Down);
        assert_eq!(agent.choose_next_move(&state, food), Move::Right);
    }

    #[test]
    fn test_random_strategy_is_reproducible() {
        let config = config_with(Strategy::Random);
        let mut a = AgentController::new(&config);
        let mut b = AgentController::new(&config);
        let food = Position::new(0, 0);
        let mut grid = Grid::new(5, 5).unwrap();
        grid.set(Position::new(2, 2), Cell::Body).unwrap();
        let mut state = StateSnapshot::new(grid, 0, true, vec![Position::new(2, 2)]);

        for score in 0..20 {
            state.score = score;
            assert_eq!(a.choose_next_move(&state, food), b.choose_next_move(&state, food));
        }
    }

    #[test]
    fn test_lookahead_keeps_flagged_plan_without_alternative() {
        let mut config = Config::default_hardcoded();
        config.strategy.lookahead = true;
        let mut agent = AgentController::new(&config);
        let state = StateSnapshot::from_rows(
            &["............."],
            vec![Position::new(0, 6), Position::new(0, 7), Position::new(0, 8)],
            0,
        )
        .unwrap();

        assert_eq!(agent.choose_next_move(&state, Position::new(0, 0)), Move::Left);
        assert_eq!(agent.stats().risky_plans, 1);
        assert_eq!(agent.stats().corrections, 0);
    }

    #[test]
    fn test_strategy_names_round_trip() {
        for strategy in [
            Strategy::Random,
            Strategy::Sweep,
            Strategy::AStar,
            Strategy::Weighted,
            Strategy::Inverse,
        ] {
            assert_eq!(Strategy::parse(strategy.as_str()), Ok(strategy));
        }
        assert!(Strategy::parse("dijkstra").is_err());
    }
}
