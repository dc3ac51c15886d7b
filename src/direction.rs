//! Vector displacements between squares, expressed in bit-index deltas.
//!
//! Squares are numbered `rank*8 + file`, so incrementing rank adds 8 to the
//! index and incrementing file (towards h) adds 1.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Direction(pub i8);

impl Direction {
    pub const NORTH: Direction = Direction(8);
    pub const SOUTH: Direction = Direction(-8);
    pub const EAST: Direction = Direction(1);
    pub const WEST: Direction = Direction(-1);
    pub const NORTH_EAST: Direction = Direction(9);
    pub const NORTH_WEST: Direction = Direction(7);
    pub const SOUTH_EAST: Direction = Direction(-7);
    pub const SOUTH_WEST: Direction = Direction(-9);

    pub const ROOK_DIRECTIONS: [Direction; 4] =
        [Direction::NORTH, Direction::SOUTH, Direction::EAST, Direction::WEST];
    pub const BISHOP_DIRECTIONS: [Direction; 4] = [
        Direction::NORTH_EAST,
        Direction::NORTH_WEST,
        Direction::SOUTH_EAST,
        Direction::SOUTH_WEST,
    ];
}
