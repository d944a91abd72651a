/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

/// Side length of one tile, in world length units.
pub const TILE_SIZE: f32 = 4.0;

/// One cell of the cave map. Stored as a single byte: 0 = floor, 1 = wall.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[repr(u8)]
pub enum Tile {
    #[default]
    Floor = 0,
    Wall = 1,
}

impl Tile {
    /// Does this tile block movement, sight and pathfinding?
    pub fn is_wall(self) -> bool {
        matches!(self, Tile::Wall)
    }

    /// Wall = 1, floor = 0. Used for neighbour counting.
    pub fn weight(self) -> u8 {
        self as u8
    }
}

/// Convert a continuous coordinate to its tile coordinate.
#[inline]
pub fn to_tile(coord: f32) -> i32 {
    (coord / TILE_SIZE).floor() as i32
}
