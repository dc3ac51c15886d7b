//! UCI `setoption` dispatch: the hash-size spin option and the four "clear" buttons.

use crate::engine::search::Heuristics;
use crate::engine::tt::TranspositionTable;

pub const DEFAULT_HASH_MB: usize = 64;
pub const MIN_HASH_MB: usize = 1;
pub const MAX_HASH_MB: usize = 32_000;

pub const HASH_SIZE_OPTION: &str = "Transposition Table Size";
pub const CLEAR_TT_OPTION: &str = "Clear Transposition Table";
pub const CLEAR_KILLERS_OPTION: &str = "Clear Killer Moves";
pub const CLEAR_COUNTERS_OPTION: &str = "Clear Counter Moves";
pub const CLEAR_HISTORY_OPTION: &str = "Clear History Heuristic Stats";

/// Apply a `setoption` command by name. Unknown names and malformed values are silently
/// ignored (a numeric parse failure leaves the table at whatever size it already is,
/// rather than touching it).
pub fn set_option(name: &str, value: Option<&str>, tt: &mut TranspositionTable, heuristics: &mut Heuristics) {
    match name {
        HASH_SIZE_OPTION => {
            if let Some(value) = value {
                if let Ok(mb) = value.trim().parse::<usize>() {
                    tt.resize_mb(mb.clamp(MIN_HASH_MB, MAX_HASH_MB));
                }
            }
        }
        CLEAR_TT_OPTION => tt.clear(),
        CLEAR_KILLERS_OPTION | CLEAR_COUNTERS_OPTION | CLEAR_HISTORY_OPTION => heuristics.clear(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_parse_resizes_the_table() {
        let mut tt = TranspositionTable::with_size_mb(DEFAULT_HASH_MB);
        let mut heuristics = Heuristics::new();
        set_option(HASH_SIZE_OPTION, Some("1"), &mut tt, &mut heuristics);
        assert_eq!(tt.size_mb(), 1);
    }

    #[test]
    fn unparsable_value_leaves_size_untouched() {
        let mut tt = TranspositionTable::with_size_mb(DEFAULT_HASH_MB);
        let mut heuristics = Heuristics::new();
        set_option(HASH_SIZE_OPTION, Some("not a number"), &mut tt, &mut heuristics);
        assert_eq!(tt.size_mb(), DEFAULT_HASH_MB);
    }

    #[test]
    fn out_of_range_value_clamps_instead_of_rejecting() {
        let mut tt = TranspositionTable::with_size_mb(DEFAULT_HASH_MB);
        let mut heuristics = Heuristics::new();
        set_option(HASH_SIZE_OPTION, Some("100000"), &mut tt, &mut heuristics);
        assert_eq!(tt.size_mb(), MAX_HASH_MB);
    }

    #[test]
    fn clear_transposition_table_empties_it() {
        use crate::moves::Move;
        let mut tt = TranspositionTable::with_size_mb(1);
        let mut heuristics = Heuristics::new();
        tt.store(1, 0, 4, 10, crate::engine::tt::Bound::Exact, Move::NULL);
        set_option(CLEAR_TT_OPTION, None, &mut tt, &mut heuristics);
        assert_eq!(tt.probe(1, 0, 0, -1000, 1000).best_move, None);
    }
}
