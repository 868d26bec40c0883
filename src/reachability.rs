// Flood-fill space counting used by the trap detector

use std::collections::VecDeque;

use crate::types::{Grid, Position};

/// Counts open cells reachable from `from` through 4-connected open cells.
///
/// The fill is seeded from the neighbours of `from`; `from` itself is never
/// counted, whatever it contains.
pub fn count_reachable(grid: &Grid, from: Position) -> usize {
    let mut visited = vec![false; grid.cell_count()];
    let mut queue = VecDeque::new();
    let mut count = 0;

    if let Some(i) = grid.index(from) {
        visited[i] = true;
    }
    queue.push_back(from);

    while let Some(current) = queue.pop_front() {
        for next in current.neighbors() {
            let i = match grid.index(next) {
                Some(i) => i,
                None => continue,
            };
            if visited[i] || !grid.is_open(next) {
                continue;
            }
            visited[i] = true;
            count += 1;
            queue.push_back(next);
        }
    }

    count
}

/// Number of open (empty or food) cells on the grid
pub fn open_cells(grid: &Grid) -> usize {
    grid.positions().filter(|&p| grid.is_open(p)).count()
}
