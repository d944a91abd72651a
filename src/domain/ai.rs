/// Enemy AI: A* pathfinding over the cave grid.
///
/// 8-connected, walls impassable, every step costs 1 (diagonals included).
/// The heuristic is straight-line distance to the goal. With free diagonals
/// it can overestimate, so routes bending around walls are not always the
/// shortest; the enemy only needs a plausible route, so that is accepted.
/// On open ground the search still walks the straight Chebyshev route.
///
/// The returned path excludes the start tile and ends on the goal tile,
/// so its length equals the number of moves.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::grid::{Grid, NEIGHBOURS_8};

/// One open-set entry. Ordered so `BinaryHeap` pops the lowest priority,
/// earliest-inserted first.
#[derive(Clone, Copy, Debug)]
struct Frontier {
    priority: f32,
    seq: u64,
    index: usize,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Find a path from `start` to `goal` (tile coordinates).
///
/// Returns the tile indices to walk through, start excluded, goal included.
/// Empty when start == goal, when the goal is a wall or off the grid,
/// or when no route exists.
pub fn find_path(grid: &Grid, start: (i32, i32), goal: (i32, i32)) -> Vec<usize> {
    let (Some(start_idx), Some(goal_idx)) = (
        grid.checked_index(start.0, start.1),
        grid.checked_index(goal.0, goal.1),
    ) else {
        return vec![];
    };
    if start_idx == goal_idx || grid.tile(goal_idx).is_wall() {
        return vec![];
    }

    let mut came_from: Vec<Option<usize>> = vec![None; grid.len()];
    let mut cost_so_far: Vec<u32> = vec![u32::MAX; grid.len()];
    let mut open = BinaryHeap::with_capacity(64);
    let mut seq = 0u64;

    cost_so_far[start_idx] = 0;
    open.push(Frontier { priority: 0.0, seq, index: start_idx });

    while let Some(Frontier { index: current, .. }) = open.pop() {
        if current == goal_idx {
            break;
        }

        let (cx, cy) = grid.coords(current);
        let next_cost = cost_so_far[current] + 1;

        for &(dx, dy) in &NEIGHBOURS_8 {
            let (nx, ny) = (cx as i32 + dx, cy as i32 + dy);
            let Some(next) = grid.checked_index(nx, ny) else { continue };
            if grid.tile(next).is_wall() {
                continue;
            }
            if next_cost >= cost_so_far[next] {
                continue;
            }
            cost_so_far[next] = next_cost;
            came_from[next] = Some(current);
            seq += 1;
            let priority = next_cost as f32 + heuristic((nx, ny), goal);
            open.push(Frontier { priority, seq, index: next });
        }
    }

    reconstruct(&came_from, start_idx, goal_idx)
}

/// Straight-line distance between two tiles.
fn heuristic(a: (i32, i32), b: (i32, i32)) -> f32 {
    let dx = (a.0 - b.0) as f32;
    let dy = (a.1 - b.1) as f32;
    (dx * dx + dy * dy).sqrt()
}

/// Walk predecessors from goal back to start. Bounded by the grid size, so
/// a broken chain yields an empty path instead of spinning.
fn reconstruct(came_from: &[Option<usize>], start: usize, goal: usize) -> Vec<usize> {
    let mut path = Vec::new();
    let mut current = goal;
    for _ in 0..came_from.len() {
        if current == start {
            path.reverse();
            return path;
        }
        path.push(current);
        match came_from[current] {
            Some(prev) => current = prev,
            None => return vec![],
        }
    }
    vec![]
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn is_contiguous(grid: &Grid, start: (i32, i32), path: &[usize]) -> bool {
        let mut prev = start;
        for &i in path {
            let (x, y) = grid.coords(i);
            let (x, y) = (x as i32, y as i32);
            if (x - prev.0).abs() > 1 || (y - prev.1).abs() > 1 || (x, y) == prev {
                return false;
            }
            prev = (x, y);
        }
        true
    }

    #[test]
    fn open_grid_path_length_is_chebyshev_distance() {
        let grid = Grid::bordered(20, 20);
        let cases = [((1, 1), (18, 18)), ((2, 10), (17, 4)), ((5, 5), (5, 15)), ((3, 3), (12, 6))];
        for (start, goal) in cases {
            let path = find_path(&grid, start, goal);
            let expect = (goal.0 - start.0).abs().max((goal.1 - start.1).abs()) as usize;
            assert_eq!(path.len(), expect, "{:?} -> {:?}", start, goal);
            assert_eq!(*path.last().unwrap(), grid.index(goal.0 as usize, goal.1 as usize));
        }
    }

    #[test]
    fn path_is_contiguous_and_avoids_walls() {
        let grid = Grid::from_rows(&[
            "##########",
            "#S   #   #",
            "#### # # #",
            "#    # # #",
            "# ####   #",
            "#      #G#",
            "##########",
        ]);
        let start = (1, 1);
        let goal = (8, 5);
        let path = find_path(&grid, start, goal);
        assert!(!path.is_empty());
        assert!(is_contiguous(&grid, start, &path));
        for &i in &path {
            assert!(!grid.tile(i).is_wall(), "path crosses wall at {:?}", grid.coords(i));
        }
        assert_eq!(*path.last().unwrap(), grid.index(8, 5));
    }

    #[test]
    fn disconnected_goal_gives_empty_path() {
        let grid = Grid::from_rows(&[
            "#######",
            "#  #  #",
            "#  #  #",
            "#######",
        ]);
        assert!(find_path(&grid, (1, 1), (5, 2)).is_empty());
    }

    #[test]
    fn same_tile_gives_empty_path() {
        let grid = Grid::bordered(5, 5);
        assert!(find_path(&grid, (2, 2), (2, 2)).is_empty());
    }

    #[test]
    fn wall_or_off_grid_goal_gives_empty_path() {
        let grid = Grid::bordered(5, 5);
        assert!(find_path(&grid, (2, 2), (0, 0)).is_empty());
        assert!(find_path(&grid, (2, 2), (9, 9)).is_empty());
        assert!(find_path(&grid, (-1, 2), (2, 2)).is_empty());
    }

    #[test]
    fn adjacent_goal_is_one_step() {
        let grid = Grid::bordered(6, 6);
        let path = find_path(&grid, (2, 2), (3, 3));
        assert_eq!(path, vec![grid.index(3, 3)]);
    }

    #[test]
    fn reconstruct_stops_on_broken_chain() {
        // 2 -> 1 -> (none): start 0 is never reached.
        let came_from = vec![None, None, Some(1)];
        assert!(reconstruct(&came_from, 0, 2).is_empty());
    }

    #[test]
    fn reconstruct_stops_on_cycle() {
        let came_from = vec![None, Some(2), Some(1)];
        assert!(reconstruct(&came_from, 0, 2).is_empty());
    }
}
