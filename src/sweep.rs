// S-shaped coverage sweep
//
// A fixed Hamiltonian cycle through the board: row 0 right-to-left, row 1
// left-to-right and so on over every column but the last, then straight up the
// last column back to the top-right corner. The cycle only closes when the
// grid height is even; callers must respect that, it is not checked here.

use crate::search::Path;
use crate::types::{Position, StateSnapshot};

/// Builds the next leg of the sweep for the snake in `state`.
///
/// * `first_call` with the head on row 0: a single step down, so the sweep
///   does not start by running along the spawn row.
/// * head away from the top-right corner: a lead-in along the head's row to
///   the last column, then up the last column to the corner, followed by the
///   full cycle.
/// * head on the corner, where the previous cycle ended: the full cycle.
pub fn sweep_path(state: &StateSnapshot, first_call: bool) -> Path {
    let head = state.head();
    let height = state.grid.height() as i32;
    let width = state.grid.width() as i32;
    let last_col = width - 1;

    if first_call && head.row == 0 {
        return Path::from_forward(vec![Position::new(head.row + 1, head.col)]);
    }

    let mut forward = Vec::with_capacity((height * width) as usize);

    if head != Position::new(0, last_col) {
        for col in head.col + 1..width {
            forward.push(Position::new(head.row, col));
        }
        for row in (0..head.row).rev() {
            forward.push(Position::new(row, last_col));
        }
    }

    for row in 0..height {
        if row % 2 == 0 {
            for col in (0..last_col).rev() {
                forward.push(Position::new(row, col));
            }
        } else {
            for col in 0..last_col {
                forward.push(Position::new(row, col));
            }
        }
    }
    for row in (0..height).rev() {
        forward.push(Position::new(row, last_col));
    }

    Path::from_forward(forward)
}
