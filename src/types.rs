// Grid, position and snapshot types shared by every planner
//
// The authoritative grid belongs to the game session. Planners only ever see a
// `StateSnapshot` and never write back into it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::PlanError;

/// Classification of a single grid cell
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    Wall,
    Body,
    Food,
}

impl Cell {
    /// Open cells are the ones a head may move into: empty cells and food
    pub fn is_open(&self) -> bool {
        matches!(self, Cell::Empty | Cell::Food)
    }

    fn from_char(c: char) -> Option<Cell> {
        match c {
            '.' | ' ' => Some(Cell::Empty),
            '#' => Some(Cell::Wall),
            '+' => Some(Cell::Body),
            '@' => Some(Cell::Food),
            _ => None,
        }
    }

    fn as_char(&self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Wall => '#',
            Cell::Body => '+',
            Cell::Food => '@',
        }
    }
}

/// Row/column coordinate on the grid. Row 0 is the top edge.
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub fn new(row: i32, col: i32) -> Self {
        Position { row, col }
    }

    /// Manhattan distance between two positions
    pub fn manhattan(&self, other: Position) -> i32 {
        (self.row - other.row).abs() + (self.col - other.col).abs()
    }

    /// The 4 orthogonal neighbours, in search expansion order (left, right, up, down)
    pub fn neighbors(&self) -> [Position; 4] {
        [
            Position::new(self.row, self.col - 1),
            Position::new(self.row, self.col + 1),
            Position::new(self.row - 1, self.col),
            Position::new(self.row + 1, self.col),
        ]
    }

    /// Calculates the next position when moving in the given direction
    pub fn step(&self, mv: Move) -> Position {
        let (dr, dc) = mv.delta();
        Position::new(self.row + dr, self.col + dc)
    }
}

/// Represents the four possible movement directions for the snake
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// Returns all possible moves
    pub fn all() -> [Move; 4] {
        [Move::Right, Move::Down, Move::Left, Move::Up]
    }

    /// Converts the move to its string representation for logs and records
    pub fn as_str(&self) -> &'static str {
        match self {
            Move::Up => "up",
            Move::Down => "down",
            Move::Left => "left",
            Move::Right => "right",
        }
    }

    /// Row/column delta of the move
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Move::Up => (-1, 0),
            Move::Down => (1, 0),
            Move::Left => (0, -1),
            Move::Right => (0, 1),
        }
    }

    /// Move that takes `from` to the orthogonally adjacent `to`
    ///
    /// Any other delta (diagonal, longer than one cell, or zero) means the
    /// path being followed no longer starts at the head.
    pub fn from_delta(from: Position, to: Position) -> Result<Move, PlanError> {
        match (to.row - from.row, to.col - from.col) {
            (0, 1) => Ok(Move::Right),
            (0, -1) => Ok(Move::Left),
            (1, 0) => Ok(Move::Down),
            (-1, 0) => Ok(Move::Up),
            _ => Err(PlanError::MalformedMoveDelta { from, to }),
        }
    }
}

/// Errors raised while building a grid
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("grid dimensions must be positive, got {height}x{width}")]
    EmptyDimensions { height: usize, width: usize },
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown cell character {0:?}")]
    UnknownCell(char),
    #[error("position ({}, {}) is outside the grid", .0.row, .0.col)]
    OutOfBounds(Position),
    #[error("a snake of length {length} does not fit a row of width {width}")]
    SnakeTooLong { length: usize, width: usize },
    #[error("a snapshot needs at least one body segment")]
    EmptyBody,
}

/// Row-major grid of cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    height: usize,
    width: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Creates an all-empty grid
    pub fn new(height: usize, width: usize) -> Result<Self, GridError> {
        if height == 0 || width == 0 {
            return Err(GridError::EmptyDimensions { height, width });
        }

        Ok(Grid {
            height,
            width,
            cells: vec![Cell::Empty; height * width],
        })
    }

    /// Parses a grid from text rows: `.` or space empty, `#` wall, `+` body, `@` food
    pub fn from_rows(rows: &[&str]) -> Result<Self, GridError> {
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        let mut grid = Grid::new(rows.len(), width)?;

        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(GridError::RaggedRows {
                    row,
                    expected: width,
                    found,
                });
            }
            for (col, c) in line.chars().enumerate() {
                grid.cells[row * width + col] = Cell::from_char(c).ok_or(GridError::UnknownCell(c))?;
            }
        }

        Ok(grid)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.row >= 0 && pos.col >= 0 && (pos.row as usize) < self.height && (pos.col as usize) < self.width
    }

    /// Flat index of an in-bounds position
    pub fn index(&self, pos: Position) -> Option<usize> {
        if self.in_bounds(pos) {
            Some(pos.row as usize * self.width + pos.col as usize)
        } else {
            None
        }
    }

    /// Cell at `pos`, or `None` when out of bounds
    pub fn cell(&self, pos: Position) -> Option<Cell> {
        self.index(pos).map(|i| self.cells[i])
    }

    /// True if the position is inside the grid and open (empty or food)
    pub fn is_open(&self, pos: Position) -> bool {
        self.cell(pos).map_or(false, |c| c.is_open())
    }

    pub fn set(&mut self, pos: Position, cell: Cell) -> Result<(), GridError> {
        let i = self.index(pos).ok_or(GridError::OutOfBounds(pos))?;
        self.cells[i] = cell;
        Ok(())
    }

    /// Iterates over all positions in row-major order
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height).flat_map(move |r| (0..self.width).map(move |c| Position::new(r as i32, c as i32)))
    }

    /// Renders the grid back to the text form accepted by `from_rows`
    pub fn to_rows(&self) -> Vec<String> {
        self.cells
            .chunks(self.width)
            .map(|row| row.iter().map(Cell::as_char).collect())
            .collect()
    }
}

/// Read-only view of the world handed to the agent each tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    pub grid: Grid,
    pub score: u32,
    pub alive: bool,
    /// Body segments, head first
    pub body: Vec<Position>,
}

impl StateSnapshot {
    /// `body` must hold at least the head
    pub fn new(grid: Grid, score: u32, alive: bool, body: Vec<Position>) -> Self {
        debug_assert!(!body.is_empty(), "snapshot built without a head");
        StateSnapshot {
            grid,
            score,
            alive,
            body,
        }
    }

    /// Builds a snapshot from text rows, marking every body segment on the grid
    pub fn from_rows(rows: &[&str], body: Vec<Position>, score: u32) -> Result<Self, GridError> {
        if body.is_empty() {
            return Err(GridError::EmptyBody);
        }
        let mut grid = Grid::from_rows(rows)?;
        for &segment in &body {
            grid.set(segment, Cell::Body)?;
        }
        Ok(StateSnapshot::new(grid, score, true, body))
    }

    pub fn head(&self) -> Position {
        self.body[0]
    }

    pub fn tail(&self) -> Position {
        self.body[self.body.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_deltas_round_trip_through_positions() {
        let origin = Position::new(4, 4);
        for mv in Move::all() {
            assert_eq!(Move::from_delta(origin, origin.step(mv)), Ok(mv));
        }
    }

    #[test]
    fn test_from_delta_rejects_non_orthogonal_steps() {
        let origin = Position::new(2, 2);
        assert!(Move::from_delta(origin, origin).is_err());
        assert!(Move::from_delta(origin, Position::new(3, 3)).is_err());
        assert!(Move::from_delta(origin, Position::new(2, 4)).is_err());
    }

    #[test]
    fn test_grid_rejects_zero_dimensions() {
        assert_eq!(
            Grid::new(0, 5),
            Err(GridError::EmptyDimensions { height: 0, width: 5 })
        );
    }

    #[test]
    fn test_grid_parses_rows() {
        let grid = Grid::from_rows(&[".#@", "+.."]).unwrap();
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.cell(Position::new(0, 1)), Some(Cell::Wall));
        assert_eq!(grid.cell(Position::new(0, 2)), Some(Cell::Food));
        assert_eq!(grid.cell(Position::new(1, 0)), Some(Cell::Body));
        assert_eq!(grid.cell(Position::new(2, 0)), None);
        assert_eq!(grid.to_rows(), vec![".#@".to_string(), "+..".to_string()]);
    }

    #[test]
    fn test_grid_rejects_ragged_rows_and_unknown_cells() {
        assert!(matches!(
            Grid::from_rows(&["...", ".."]),
            Err(GridError::RaggedRows { row: 1, .. })
        ));
        assert_eq!(Grid::from_rows(&[".x."]), Err(GridError::UnknownCell('x')));
    }

    #[test]
    fn test_snapshot_without_body_is_rejected() {
        assert_eq!(StateSnapshot::from_rows(&["..."], vec![], 0), Err(GridError::EmptyBody));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "snapshot built without a head")]
    fn test_snapshot_new_without_body_panics_in_debug() {
        let grid = Grid::from_rows(&["..."]).unwrap();
        StateSnapshot::new(grid, 0, true, Vec::new());
    }

    #[test]
    fn test_neighbors_are_orthogonal() {
        let p = Position::new(1, 1);
        for n in p.neighbors() {
            assert_eq!(p.manhattan(n), 1);
        }
    }
}
