//! Magic-bitboard move generation for sliding pieces (bishops and rooks).
//!
//! Tables are built once at startup by searching for a multiplier that perfectly hashes
//! every blocker subset of a square's ray mask into a slot holding that subset's attack
//! set. The search is deterministic: candidates come from a sparse pseudo-random generator
//! seeded per rank, so the discovered magic numbers (and therefore move generation) are
//! identical across runs and platforms.

use crate::bitboard::Bitboard;
use crate::rng::{Xorshift64Star, MAGIC_SEARCH_SEEDS};
use crate::square::Square;
use once_cell::sync::Lazy;

const ROOK_RAYS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_RAYS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// One ray's squares from (exclusive of) `square` out to the board edge, inclusive of the
/// edge square, nearest first.
fn ray(square: Square, dr: i8, df: i8) -> Vec<Square> {
    let mut squares = Vec::new();
    let mut rank = square.rank() as i8 + dr;
    let mut file = square.file() as i8 + df;
    while (0..8).contains(&rank) && (0..8).contains(&file) {
        squares.push(Square::from_rank_file(rank as u8, file as u8));
        rank += dr;
        file += df;
    }
    squares
}

/// The blocker mask for one square along the given ray set: every square that could hold a
/// piece relevant to the slider's attacks, which excludes the outermost (edge) square of
/// each ray since no occupant beyond it could ever matter.
fn blocker_mask(square: Square, rays: &[(i8, i8); 4]) -> Bitboard {
    let mut bb = Bitboard::EMPTY;
    for &(dr, df) in rays {
        let squares = ray(square, dr, df);
        for &sq in squares.iter().take(squares.len().saturating_sub(1)) {
            bb.set(sq);
        }
    }
    bb
}

/// The actual attack set for one square given a concrete occupancy of the whole board:
/// walk each ray, including the first blocker (it may be a capture) and stopping there.
fn attacks_given_occupancy(square: Square, rays: &[(i8, i8); 4], occupancy: Bitboard) -> Bitboard {
    let mut bb = Bitboard::EMPTY;
    for &(dr, df) in rays {
        for sq in ray(square, dr, df) {
            bb.set(sq);
            if occupancy.contains(sq) {
                break;
            }
        }
    }
    bb
}

pub struct Magic {
    pub mask: Bitboard,
    pub magic: u64,
    pub shift: u32,
    table: Vec<Bitboard>,
}

impl Magic {
    #[must_use]
    #[inline(always)]
    pub fn index(&self, occupancy: Bitboard) -> usize {
        let relevant = occupancy & self.mask;
        ((relevant.0.wrapping_mul(self.magic)) >> self.shift) as usize
    }

    #[must_use]
    #[inline(always)]
    pub fn attacks(&self, occupancy: Bitboard) -> Bitboard {
        self.table[self.index(occupancy)]
    }
}

fn search_magic(square: Square, rays: &[(i8, i8); 4], max_entries: usize) -> Magic {
    let mask = blocker_mask(square, rays);
    let bits = mask.len();
    debug_assert!((1usize << bits) <= max_entries);
    let shift = 64 - bits;

    let mut subsets = Vec::with_capacity(1 << bits);
    let mut attacks = Vec::with_capacity(1 << bits);
    let mut subset = mask;
    loop {
        subsets.push(subset);
        attacks.push(attacks_given_occupancy(square, rays, subset));
        subset = subset.next_subset(mask);
        if subset == mask {
            break;
        }
    }

    let mut rng = Xorshift64Star::new(MAGIC_SEARCH_SEEDS[square.rank() as usize]);
    'search: loop {
        let candidate = rng.sparse_u64();
        if candidate == 0 {
            continue;
        }
        let mut table = vec![None; 1 << bits];
        for (&subset, &attack) in subsets.iter().zip(attacks.iter()) {
            let idx = ((subset.0.wrapping_mul(candidate)) >> shift) as usize;
            match table[idx] {
                None => table[idx] = Some(attack),
                Some(existing) if existing == attack => {}
                Some(_) => continue 'search,
            }
        }
        let table = table.into_iter().map(|slot| slot.unwrap_or(Bitboard::EMPTY)).collect();
        return Magic { mask, magic: candidate, shift: shift as u32, table };
    }
}

fn build_table(rays: &[(i8, i8); 4], max_entries: usize) -> Vec<Magic> {
    (0..64u8)
        .map(|i| search_magic(Square(i), rays, max_entries))
        .collect()
}

pub static ROOK_MAGICS: Lazy<Vec<Magic>> = Lazy::new(|| build_table(&ROOK_RAYS, 4096));
pub static BISHOP_MAGICS: Lazy<Vec<Magic>> = Lazy::new(|| build_table(&BISHOP_RAYS, 512));

#[must_use]
#[inline(always)]
pub fn rook_attacks(square: Square, occupancy: Bitboard) -> Bitboard {
    ROOK_MAGICS[square.0 as usize].attacks(occupancy)
}

#[must_use]
#[inline(always)]
pub fn bishop_attacks(square: Square, occupancy: Bitboard) -> Bitboard {
    BISHOP_MAGICS[square.0 as usize].attacks(occupancy)
}

#[must_use]
#[inline(always)]
pub fn queen_attacks(square: Square, occupancy: Bitboard) -> Bitboard {
    rook_attacks(square, occupancy) | bishop_attacks(square, occupancy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rook_on_empty_board_attacks_whole_rank_and_file() {
        let d4 = Square::from_rank_file(3, 3);
        let attacks = rook_attacks(d4, Bitboard::EMPTY);
        // 7 squares on the rank (minus self) + 7 on the file = 14.
        assert_eq!(attacks.len(), 14);
    }

    #[test]
    fn bishop_on_empty_board_attacks_both_diagonals() {
        let d4 = Square::from_rank_file(3, 3);
        let attacks = bishop_attacks(d4, Bitboard::EMPTY);
        assert_eq!(attacks.len(), 13);
    }

    #[test]
    fn rook_stops_at_first_blocker_and_includes_it() {
        let a1 = Square::from_rank_file(0, 0);
        let blocker = Square::from_rank_file(0, 3);
        let occ = Bitboard::from_square(blocker);
        let attacks = rook_attacks(a1, occ);
        assert!(attacks.contains(blocker));
        assert!(!attacks.contains(Square::from_rank_file(0, 4)));
    }

    #[test]
    fn corner_bishop_mask_is_small() {
        let a1 = Square::from_rank_file(0, 0);
        // Single diagonal ray of length 7, minus the edge square = 6 relevant squares.
        assert_eq!(blocker_mask(a1, &BISHOP_RAYS).len(), 6);
    }
}
