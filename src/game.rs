// Headless snake game used to drive the agent in training runs

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

use crate::config::SessionConfig;
use crate::types::{Cell, Grid, GridError, Move, Position, StateSnapshot};

/// What ended the game on a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    OutOfBounds,
    Wall,
    SelfCollision,
}

/// Information about one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    /// Whether the snake ate food this step
    pub ate: bool,
    /// Collision that killed the snake, if any
    pub collision: Option<Collision>,
}

/// One game on a bounded grid with a single food item
pub struct GameSession {
    grid: Grid,
    body: VecDeque<Position>,
    food: Option<Position>,
    score: u32,
    alive: bool,
    ticks: u64,
    rng: StdRng,
}

impl GameSession {
    /// Starts a game with a horizontal snake and one food item
    ///
    /// The head spawns on a random row with the body trailing to its left.
    pub fn new(config: &SessionConfig, seed: u64) -> Result<Self, GridError> {
        let mut grid = Grid::new(config.grid_height, config.grid_width)?;
        let length = config.initial_length;
        if length == 0 || length >= config.grid_width {
            return Err(GridError::SnakeTooLong {
                length,
                width: config.grid_width,
            });
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let row = rng.random_range(0..config.grid_height) as i32;
        let head_col = rng.random_range(length - 1..config.grid_width - 1) as i32;

        let mut body = VecDeque::with_capacity(length);
        for offset in 0..length as i32 {
            let segment = Position::new(row, head_col - offset);
            grid.set(segment, Cell::Body)?;
            body.push_back(segment);
        }

        let mut session = GameSession {
            grid,
            body,
            food: None,
            score: 0,
            alive: true,
            ticks: 0,
            rng,
        };
        session.spawn_food()?;
        Ok(session)
    }

    /// Copy of the world as the agent sees it
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot::new(
            self.grid.clone(),
            self.score,
            self.alive,
            self.body.iter().copied().collect(),
        )
    }

    /// Current food, `None` once the snake fills the board
    pub fn food_position(&self) -> Option<Position> {
        self.food
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// True when no open cell is left for food
    pub fn is_complete(&self) -> bool {
        self.food.is_none()
    }

    /// Advances the game by one move
    pub fn step(&mut self, mv: Move) -> Result<StepOutcome, GridError> {
        if !self.alive {
            return Ok(StepOutcome {
                ate: false,
                collision: None,
            });
        }
        self.ticks += 1;

        let head = self.body[0].step(mv);
        let ate = self.food == Some(head);

        if let Some(collision) = self.collision_at(head, ate) {
            debug!("Snake died at tick {} ({:?})", self.ticks, collision);
            self.alive = false;
            return Ok(StepOutcome {
                ate: false,
                collision: Some(collision),
            });
        }

        if !ate {
            if let Some(tail) = self.body.pop_back() {
                self.grid.set(tail, Cell::Empty)?;
            }
        }
        self.grid.set(head, Cell::Body)?;
        self.body.push_front(head);

        if ate {
            self.score += 1;
            self.spawn_food()?;
        }

        Ok(StepOutcome {
            ate,
            collision: None,
        })
    }

    /// The tail is a legal target unless the snake grows this step
    fn collision_at(&self, head: Position, growing: bool) -> Option<Collision> {
        match self.grid.cell(head) {
            None => Some(Collision::OutOfBounds),
            Some(Cell::Wall) => Some(Collision::Wall),
            Some(Cell::Body) => {
                let tail = self.body.back().copied();
                if !growing && tail == Some(head) {
                    None
                } else {
                    Some(Collision::SelfCollision)
                }
            }
            Some(Cell::Empty) | Some(Cell::Food) => None,
        }
    }

    fn spawn_food(&mut self) -> Result<(), GridError> {
        let free: Vec<Position> = self.grid.positions().filter(|&p| self.grid.cell(p) == Some(Cell::Empty)).collect();
        if free.is_empty() {
            self.food = None;
            return Ok(());
        }
        let food = free[self.rng.random_range(0..free.len())];
        self.grid.set(food, Cell::Food)?;
        self.food = Some(food);
        Ok(())
    }
}
