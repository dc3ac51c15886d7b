//! Precomputed tables: knight/king/pawn step attacks, file/rank masks, and the masks used by
//! the evaluator (passed/doubled/isolated pawns, outposts, king-safety rings). Everything
//! here is a pure function of square index, computed once at startup and read-only after.

use crate::bitboard::Bitboard;
use crate::color::Color;
use crate::square::Square;
use once_cell::sync::Lazy;

fn step_attacks(offsets: &[(i8, i8)]) -> [Bitboard; 64] {
    let mut table = [Bitboard::EMPTY; 64];
    for (idx, slot) in table.iter_mut().enumerate() {
        let sq = Square(idx as u8);
        let rank = sq.rank() as i8;
        let file = sq.file() as i8;
        let mut bb = Bitboard::EMPTY;
        for &(dr, df) in offsets {
            let r = rank + dr;
            let f = file + df;
            if (0..8).contains(&r) && (0..8).contains(&f) {
                bb.set(Square::from_rank_file(r as u8, f as u8));
            }
        }
        *slot = bb;
    }
    table
}

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2), (2, 1), (2, -1), (1, -2), (-1, -2), (-2, -1), (-2, 1), (-1, 2),
];
const KING_OFFSETS: [(i8, i8); 8] = [
    (1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1), (1, -1),
];

pub static KNIGHT_ATTACKS: Lazy<[Bitboard; 64]> = Lazy::new(|| step_attacks(&KNIGHT_OFFSETS));
pub static KING_ATTACKS: Lazy<[Bitboard; 64]> = Lazy::new(|| step_attacks(&KING_OFFSETS));

/// Single-step pawn pushes, indexed `[color][square]`. Does not check occupancy.
pub static PAWN_PUSHES: Lazy<[[Bitboard; 64]; 2]> = Lazy::new(|| {
    let mut table = [[Bitboard::EMPTY; 64]; 2];
    for sq in 0..64u8 {
        let s = Square(sq);
        table[Color::White as usize][sq as usize] = Bitboard::from_square(s).north();
        table[Color::Black as usize][sq as usize] = Bitboard::from_square(s).south();
    }
    table
});

/// Pawn capture targets (both diagonals), indexed `[color][square]`.
pub static PAWN_ATTACKS: Lazy<[[Bitboard; 64]; 2]> = Lazy::new(|| {
    let mut table = [[Bitboard::EMPTY; 64]; 2];
    for sq in 0..64u8 {
        let s = Square(sq);
        let bb = Bitboard::from_square(s);
        table[Color::White as usize][sq as usize] = bb.north_east() | bb.north_west();
        table[Color::Black as usize][sq as usize] = bb.south_east() | bb.south_west();
    }
    table
});

pub static FILE_MASKS: Lazy<[Bitboard; 8]> = Lazy::new(|| {
    let mut masks = [Bitboard::EMPTY; 8];
    for (file, slot) in masks.iter_mut().enumerate() {
        let mut bb = Bitboard::EMPTY;
        for rank in 0..8 {
            bb.set(Square::from_rank_file(rank, file as u8));
        }
        *slot = bb;
    }
    masks
});

pub static RANK_MASKS: Lazy<[Bitboard; 8]> = Lazy::new(|| {
    let mut masks = [Bitboard::EMPTY; 8];
    for (rank, slot) in masks.iter_mut().enumerate() {
        let mut bb = Bitboard::EMPTY;
        for file in 0..8 {
            bb.set(Square::from_rank_file(rank as u8, file));
        }
        *slot = bb;
    }
    masks
});

#[must_use]
pub fn adjacent_files_mask(file: u8) -> Bitboard {
    let mut bb = Bitboard::EMPTY;
    if file > 0 {
        bb |= FILE_MASKS[file as usize - 1];
    }
    if file < 7 {
        bb |= FILE_MASKS[file as usize + 1];
    }
    bb
}

/// All squares strictly ahead of `rank`, in `color`'s direction of advance.
fn ranks_ahead(color: Color, rank: u8) -> Bitboard {
    let mut bb = Bitboard::EMPTY;
    match color {
        Color::White => {
            for r in (rank + 1)..8 {
                bb |= RANK_MASKS[r as usize];
            }
        }
        Color::Black => {
            for r in 0..rank {
                bb |= RANK_MASKS[r as usize];
            }
        }
    }
    bb
}

/// Own file plus both adjacent files, strictly ahead of the square: a pawn here is passed
/// only if no enemy pawn occupies this mask.
pub static PASSED_PAWN_MASKS: Lazy<[[Bitboard; 64]; 2]> = Lazy::new(|| {
    let mut table = [[Bitboard::EMPTY; 64]; 2];
    for color in [Color::White, Color::Black] {
        for sq in 0..64u8 {
            let s = Square(sq);
            let file_span = FILE_MASKS[s.file() as usize] | adjacent_files_mask(s.file());
            table[color as usize][sq as usize] = file_span & ranks_ahead(color, s.rank());
        }
    }
    table
});

/// Same file, strictly ahead: a pawn here is doubled if a friendly pawn occupies this mask.
pub static DOUBLED_PAWN_MASKS: Lazy<[[Bitboard; 64]; 2]> = Lazy::new(|| {
    let mut table = [[Bitboard::EMPTY; 64]; 2];
    for color in [Color::White, Color::Black] {
        for sq in 0..64u8 {
            let s = Square(sq);
            table[color as usize][sq as usize] =
                FILE_MASKS[s.file() as usize] & ranks_ahead(color, s.rank());
        }
    }
    table
});

/// Adjacent files, every rank: a pawn here is isolated if no friendly pawn occupies this
/// mask, regardless of rank.
pub static ISOLATED_PAWN_MASKS: Lazy<[Bitboard; 64]> = Lazy::new(|| {
    let mut table = [Bitboard::EMPTY; 64];
    for sq in 0..64u8 {
        table[sq as usize] = adjacent_files_mask(Square(sq).file());
    }
    table
});

/// Adjacent files, strictly ahead: a knight/bishop here is a candidate outpost only if no
/// enemy pawn occupies this mask (none can ever attack the square by advancing).
pub static OUTPOST_MASKS: Lazy<[[Bitboard; 64]; 2]> = Lazy::new(|| {
    let mut table = [[Bitboard::EMPTY; 64]; 2];
    for color in [Color::White, Color::Black] {
        for sq in 0..64u8 {
            let s = Square(sq);
            table[color as usize][sq as usize] =
                adjacent_files_mask(s.file()) & ranks_ahead(color, s.rank());
        }
    }
    table
});

/// The 8 squares orthogonally/diagonally adjacent to the king.
pub static KING_INNER_RING: Lazy<[Bitboard; 64]> = Lazy::new(|| *KING_ATTACKS);

/// The ring of squares at Chebyshev distance exactly 2 from the king: together with the
/// inner ring this forms the full 5x5 hull around the king square.
pub static KING_OUTER_RING: Lazy<[Bitboard; 64]> = Lazy::new(|| {
    let mut table = [Bitboard::EMPTY; 64];
    for sq in 0..64u8 {
        let s = Square(sq);
        let mut bb = Bitboard::EMPTY;
        for other in 0..64u8 {
            let o = Square(other);
            if s.chebyshev_to(o) == 2 {
                bb.set(o);
            }
        }
        table[sq as usize] = bb;
    }
    table
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knight_corner_has_two_targets() {
        assert_eq!(KNIGHT_ATTACKS[Square::A1.0 as usize].len(), 2);
    }

    #[test]
    fn king_center_has_eight_targets() {
        let e4 = Square::from_rank_file(3, 4);
        assert_eq!(KING_ATTACKS[e4.0 as usize].len(), 8);
    }

    #[test]
    fn passed_pawn_mask_excludes_current_rank() {
        let sq = Square::from_rank_file(3, 4);
        let mask = PASSED_PAWN_MASKS[Color::White as usize][sq.0 as usize];
        assert!((mask & RANK_MASKS[3]).is_empty());
        assert!(!(mask & RANK_MASKS[4]).is_empty());
    }

    #[test]
    fn isolated_pawn_mask_excludes_own_file() {
        let sq = Square::from_rank_file(3, 4);
        let mask = ISOLATED_PAWN_MASKS[sq.0 as usize];
        assert!((mask & FILE_MASKS[4]).is_empty());
    }

    #[test]
    fn king_rings_partition_the_hull() {
        let sq = Square::from_rank_file(4, 4);
        let inner = KING_INNER_RING[sq.0 as usize];
        let outer = KING_OUTER_RING[sq.0 as usize];
        assert!((inner & outer).is_empty());
        assert_eq!(outer.len(), 16);
    }
}
