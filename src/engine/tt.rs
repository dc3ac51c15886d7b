//! The transposition table: a fixed-size hash table from position hashes to search results.
//!
//! Entries are addressed by `hash mod len`. Each index is treated as the head of a two-slot
//! cluster — itself and its immediate successor in the flat array — so a miss at the primary
//! slot gets one linear probe into its neighbor before giving up. The last index in the array
//! has no successor, so it only ever probes itself.

use crate::moves::Move;

/// A score at or above this magnitude is "near mate": plies-from-root have been folded into it
/// and it must be un-folded before use outside the ply at which it was found.
pub const MATE: i32 = 30_000;
pub const MATE_THRESHOLD: i32 = MATE - 128;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    hash: u64,
    best_move: Move,
    score: i32,
    depth: i8,
    bound: Bound,
    age: u8,
}

/// The result of a transposition probe: a move-ordering hint, and — if the stored search was
/// deep enough and its bound is conclusive against the caller's window — a usable score.
/// `bound` and `raw_score` are filled in on any hash hit at all (regardless of depth or window
/// usability), for heuristics such as internal iterative deepening and singular extension that
/// need to know what kind of entry is there without being able to use its score outright.
#[derive(Clone, Copy, Debug)]
pub struct Probe {
    pub best_move: Option<Move>,
    pub score: Option<i32>,
    pub bound: Option<Bound>,
    pub raw_score: Option<i32>,
    pub depth: Option<i8>,
}

const BYTES_PER_ENTRY: usize = std::mem::size_of::<Entry>();

pub struct TranspositionTable {
    entries: Vec<Option<Entry>>,
    age: u8,
}

impl TranspositionTable {
    #[must_use]
    pub fn with_size_mb(size_mb: usize) -> TranspositionTable {
        let mut tt = TranspositionTable { entries: Vec::new(), age: 0 };
        tt.resize_mb(size_mb);
        tt
    }

    pub fn resize_mb(&mut self, size_mb: usize) {
        let bucket_count = (size_mb * 1024 * 1024 / BYTES_PER_ENTRY).max(1);
        self.entries = vec![None; bucket_count];
        self.age = 0;
    }

    #[must_use]
    pub fn size_mb(&self) -> usize {
        self.entries.len() * BYTES_PER_ENTRY / (1024 * 1024)
    }

    pub fn clear(&mut self) {
        for slot in &mut self.entries {
            *slot = None;
        }
        self.age = 0;
    }

    /// Mark the start of a new search generation, so stale entries from prior searches are
    /// preferred for replacement over ones written during this search.
    pub fn new_search(&mut self) {
        self.age = self.age.wrapping_add(1);
    }

    fn index(&self, hash: u64) -> usize {
        (hash % self.entries.len() as u64) as usize
    }

    fn neighbor(&self, index: usize) -> usize {
        if index + 1 < self.entries.len() { index + 1 } else { index }
    }

    /// Probe the table for `hash`. `ply` is the distance from the search root, used to
    /// un-fold mate-distance scores back to root-relative ones. `required_depth`, `alpha`,
    /// and `beta` decide whether the stored score is conclusive enough to return outright;
    /// the best move, if any is stored, is always returned as an ordering hint regardless.
    #[must_use]
    pub fn probe(&self, hash: u64, ply: u32, required_depth: i8, alpha: i32, beta: i32) -> Probe {
        let index = self.index(hash);
        let entry = self.entries[index]
            .filter(|e| e.hash == hash)
            .or_else(|| self.entries[self.neighbor(index)].filter(|e| e.hash == hash));

        let Some(entry) = entry else {
            return Probe { best_move: None, score: None, bound: None, raw_score: None, depth: None };
        };

        let best_move = Some(entry.best_move).filter(|m| !m.is_null());
        let raw_score = Some(unfold_mate(entry.score, ply));
        let bound = Some(entry.bound);
        let depth = Some(entry.depth);

        if entry.depth < required_depth {
            return Probe { best_move, score: None, bound, raw_score, depth };
        }

        let score = raw_score.unwrap();
        let score = match entry.bound {
            Bound::Exact => Some(score),
            Bound::Lower if score >= beta => Some(beta),
            Bound::Upper if score <= alpha => Some(alpha),
            _ => None,
        };
        Probe { best_move, score, bound, raw_score, depth }
    }

    /// Record a search result for `hash`. `score` is relative to `ply` plies from root; it is
    /// folded to a root-independent form before storage so mate scores compare correctly
    /// across different root distances to the same position.
    pub fn store(&mut self, hash: u64, ply: u32, depth: i8, score: i32, bound: Bound, best_move: Move) {
        let index = self.index(hash);
        let neighbor = self.neighbor(index);
        let slot = match self.entries[index] {
            Some(existing) if existing.age == self.age && existing.depth > depth => neighbor,
            _ => index,
        };
        self.entries[slot] = Some(Entry {
            hash,
            best_move,
            score: fold_mate(score, ply),
            depth,
            bound,
            age: self.age,
        });
    }

    /// Fraction of sampled slots that are occupied, in parts per thousand — reported to the
    /// front-end as `hashfull`.
    #[must_use]
    pub fn fill_permille(&self) -> u32 {
        if self.entries.is_empty() {
            return 1000;
        }
        let sample = self.entries.len().min(1000);
        let filled = self.entries[..sample].iter().filter(|e| e.is_some()).count();
        (filled * 1000 / sample) as u32
    }
}

fn fold_mate(score: i32, ply: u32) -> i32 {
    if score >= MATE_THRESHOLD {
        score + ply as i32
    } else if score <= -MATE_THRESHOLD {
        score - ply as i32
    } else {
        score
    }
}

fn unfold_mate(score: i32, ply: u32) -> i32 {
    if score >= MATE_THRESHOLD {
        score - ply as i32
    } else if score <= -MATE_THRESHOLD {
        score + ply as i32
    } else {
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::square::Square;

    #[test]
    fn round_trips_an_exact_entry() {
        let mut tt = TranspositionTable::with_size_mb(1);
        let m = Move::quiet(Square::E2, Square::E4);
        tt.store(12345, 0, 6, 250, Bound::Exact, m);
        let probe = tt.probe(12345, 0, 6, -1000, 1000);
        assert_eq!(probe.score, Some(250));
        assert_eq!(probe.best_move, Some(m));
    }

    #[test]
    fn shallow_entry_is_not_usable_but_still_a_move_hint() {
        let mut tt = TranspositionTable::with_size_mb(1);
        let m = Move::quiet(Square::D2, Square::D4);
        tt.store(999, 0, 3, 10, Bound::Exact, m);
        let probe = tt.probe(999, 0, 8, -1000, 1000);
        assert_eq!(probe.score, None);
        assert_eq!(probe.best_move, Some(m));
    }

    #[test]
    fn lower_bound_only_usable_against_beta() {
        let mut tt = TranspositionTable::with_size_mb(1);
        let m = Move::quiet(Square::G1, Square::F3);
        tt.store(7, 0, 4, 500, Bound::Lower, m);
        assert_eq!(tt.probe(7, 0, 4, -1000, 400).score, Some(400));
        assert_eq!(tt.probe(7, 0, 4, -1000, 600).score, None);
    }

    #[test]
    fn mate_scores_fold_and_unfold_across_ply() {
        let mut tt = TranspositionTable::with_size_mb(1);
        let m = Move::quiet(Square::A1, Square::A2);
        // A mate found 3 plies into this search is stored root-relative, then read back at
        // the same ply it was stored from.
        tt.store(42, 3, 5, MATE - 3, Bound::Exact, m);
        assert_eq!(tt.probe(42, 3, 5, -MATE, MATE).score, Some(MATE - 3));
    }
}
