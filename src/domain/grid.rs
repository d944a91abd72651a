/// The cave map: a rectangular grid of wall/floor tiles.
///
/// Cells are stored row-major (`row * width + col`). Every index in
/// `[0, width * height)` holds a tile. Lookups outside the grid read as
/// `Tile::Wall`, so callers never index out of bounds; the generator also
/// keeps the border solid, so in practice nothing ever walks off the map.

use super::tile::{self, Tile};

/// 8-neighbourhood offsets, clockwise from top.
pub const NEIGHBOURS_8: [(i32, i32); 8] = [
    (0, -1), (1, -1), (1, 0), (1, 1),
    (0, 1), (-1, 1), (-1, 0), (-1, -1),
];

/// 4-neighbourhood offsets: top, right, bottom, left.
pub const NEIGHBOURS_4: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Tile>,
}

impl Grid {
    /// A grid of the given size with every cell set to `tile`.
    pub fn filled(width: usize, height: usize, tile: Tile) -> Self {
        Grid { width, height, cells: vec![tile; width * height] }
    }

    /// A grid with solid border walls and an open interior.
    pub fn bordered(width: usize, height: usize) -> Self {
        let mut grid = Grid::filled(width, height, Tile::Floor);
        for row in 0..height {
            for col in 0..width {
                if grid.is_border(col, row) {
                    grid.set(col, row, Tile::Wall);
                }
            }
        }
        grid
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells (`width * height`).
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn index(&self, col: usize, row: usize) -> usize {
        row * self.width + col
    }

    /// `(col, row)` of a cell index.
    #[inline]
    pub fn coords(&self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    /// Index of `(col, row)` if it lies inside the grid.
    #[inline]
    pub fn checked_index(&self, col: i32, row: i32) -> Option<usize> {
        if col < 0 || row < 0 {
            return None;
        }
        let (col, row) = (col as usize, row as usize);
        if col >= self.width || row >= self.height {
            return None;
        }
        Some(self.index(col, row))
    }

    /// Tile at `(col, row)`. Out of bounds = wall.
    #[inline]
    pub fn cell_at(&self, col: i32, row: i32) -> Tile {
        match self.checked_index(col, row) {
            Some(i) => self.cells[i],
            None => Tile::Wall,
        }
    }

    /// Tile at a cell index. Out of bounds = wall.
    #[inline]
    pub fn tile(&self, index: usize) -> Tile {
        self.cells.get(index).copied().unwrap_or(Tile::Wall)
    }

    #[inline]
    pub fn is_wall_tile(&self, col: i32, row: i32) -> bool {
        self.cell_at(col, row).is_wall()
    }

    /// Wall test for a continuous world position (length units).
    #[inline]
    pub fn is_wall(&self, x: f32, y: f32) -> bool {
        self.is_wall_tile(tile::to_tile(x), tile::to_tile(y))
    }

    #[inline]
    pub fn is_border(&self, col: usize, row: usize) -> bool {
        col == 0 || row == 0 || col + 1 == self.width || row + 1 == self.height
    }

    /// Number of walls among the 8 neighbours of `(col, row)`.
    pub fn wall_neighbours(&self, col: usize, row: usize) -> u8 {
        NEIGHBOURS_8
            .iter()
            .map(|&(dx, dy)| self.cell_at(col as i32 + dx, row as i32 + dy).weight())
            .sum()
    }

    pub(crate) fn set(&mut self, col: usize, row: usize, tile: Tile) {
        if col < self.width && row < self.height {
            let i = self.index(col, row);
            self.cells[i] = tile;
        }
    }

    /// Build a grid from a string diagram: `#` = wall, anything else = floor.
    #[cfg(test)]
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.len());
        let mut grid = Grid::filled(width, height, Tile::Floor);
        for (row, line) in rows.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                if ch == '#' {
                    grid.set(col, row, Tile::Wall);
                }
            }
        }
        grid
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_and_coords_round_trip() {
        let g = Grid::filled(7, 5, Tile::Floor);
        let i = g.index(3, 4);
        assert_eq!(i, 4 * 7 + 3);
        assert_eq!(g.coords(i), (3, 4));
    }

    #[test]
    fn out_of_bounds_is_wall() {
        let g = Grid::filled(3, 3, Tile::Floor);
        assert_eq!(g.cell_at(-1, 0), Tile::Wall);
        assert_eq!(g.cell_at(0, -1), Tile::Wall);
        assert_eq!(g.cell_at(3, 0), Tile::Wall);
        assert_eq!(g.cell_at(0, 3), Tile::Wall);
        assert_eq!(g.tile(99), Tile::Wall);
        assert_eq!(g.cell_at(1, 1), Tile::Floor);
    }

    #[test]
    fn bordered_grid_has_solid_border() {
        let g = Grid::bordered(10, 6);
        assert_eq!(g.len(), 60);
        for row in 0..6 {
            for col in 0..10 {
                let expect_wall = g.is_border(col, row);
                assert_eq!(g.cell_at(col as i32, row as i32).is_wall(), expect_wall);
            }
        }
    }

    #[test]
    fn continuous_lookup_floors_to_tile() {
        let g = Grid::from_rows(&[
            "###",
            "# #",
            "###",
        ]);
        // Tile (1,1) spans [4, 8) in both axes.
        assert!(!g.is_wall(4.0, 4.0));
        assert!(!g.is_wall(7.99, 7.99));
        assert!(g.is_wall(3.99, 5.0));
        assert!(g.is_wall(8.0, 5.0));
        assert!(g.is_wall(-0.5, 5.0));
    }

    #[test]
    fn wall_neighbour_count() {
        let g = Grid::from_rows(&[
            "###",
            "# .",
            "...",
        ]);
        assert_eq!(g.wall_neighbours(1, 1), 4);
        // Corner cell counts out-of-bounds neighbours as walls.
        assert_eq!(g.wall_neighbours(0, 0), 7);
    }
}
