//! Castling rights, tracked as a 4-bit mask.

use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

/// A bitmask of the four castling rights: White kingside/queenside, Black
/// kingside/queenside, in that bit order (bits 0-3).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CastleRights(pub u8);

impl CastleRights {
    pub const WHITE_KINGSIDE: CastleRights = CastleRights(1 << 0);
    pub const WHITE_QUEENSIDE: CastleRights = CastleRights(1 << 1);
    pub const BLACK_KINGSIDE: CastleRights = CastleRights(1 << 2);
    pub const BLACK_QUEENSIDE: CastleRights = CastleRights(1 << 3);

    pub const WHITE: CastleRights =
        CastleRights(CastleRights::WHITE_KINGSIDE.0 | CastleRights::WHITE_QUEENSIDE.0);
    pub const BLACK: CastleRights =
        CastleRights(CastleRights::BLACK_KINGSIDE.0 | CastleRights::BLACK_QUEENSIDE.0);

    pub const NONE: CastleRights = CastleRights(0);
    pub const ALL: CastleRights = CastleRights(0b1111);

    #[must_use]
    #[inline(always)]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    #[inline(always)]
    pub const fn has(self, right: CastleRights) -> bool {
        self.0 & right.0 != 0
    }

    #[inline(always)]
    pub fn remove(&mut self, right: CastleRights) {
        self.0 &= !right.0;
    }

    #[must_use]
    pub fn from_fen_field(s: &str) -> Result<CastleRights, &'static str> {
        if s == "-" {
            return Ok(CastleRights::NONE);
        }
        let mut rights = CastleRights::NONE;
        for c in s.chars() {
            rights.0 |= match c {
                'K' => CastleRights::WHITE_KINGSIDE.0,
                'Q' => CastleRights::WHITE_QUEENSIDE.0,
                'k' => CastleRights::BLACK_KINGSIDE.0,
                'q' => CastleRights::BLACK_QUEENSIDE.0,
                _ => return Err("invalid castling availability character"),
            };
        }
        Ok(rights)
    }

    #[must_use]
    pub fn to_fen_field(self) -> String {
        if self.is_empty() {
            return "-".to_string();
        }
        let mut s = String::with_capacity(4);
        if self.has(CastleRights::WHITE_KINGSIDE) {
            s.push('K');
        }
        if self.has(CastleRights::WHITE_QUEENSIDE) {
            s.push('Q');
        }
        if self.has(CastleRights::BLACK_KINGSIDE) {
            s.push('k');
        }
        if self.has(CastleRights::BLACK_QUEENSIDE) {
            s.push('q');
        }
        s
    }
}

impl BitOr for CastleRights {
    type Output = CastleRights;
    #[inline(always)]
    fn bitor(self, rhs: CastleRights) -> CastleRights {
        CastleRights(self.0 | rhs.0)
    }
}
impl BitOrAssign for CastleRights {
    #[inline(always)]
    fn bitor_assign(&mut self, rhs: CastleRights) {
        self.0 |= rhs.0;
    }
}
impl BitAnd for CastleRights {
    type Output = CastleRights;
    #[inline(always)]
    fn bitand(self, rhs: CastleRights) -> CastleRights {
        CastleRights(self.0 & rhs.0)
    }
}
impl BitAndAssign for CastleRights {
    #[inline(always)]
    fn bitand_assign(&mut self, rhs: CastleRights) {
        self.0 &= rhs.0;
    }
}
impl Not for CastleRights {
    type Output = CastleRights;
    #[inline(always)]
    fn not(self) -> CastleRights {
        CastleRights(!self.0 & CastleRights::ALL.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fen_field_round_trip() {
        for s in ["-", "K", "Qk", "KQkq", "Kq"] {
            let rights = CastleRights::from_fen_field(s).unwrap();
            assert_eq!(rights.to_fen_field(), s);
        }
    }

    #[test]
    fn remove_clears_only_that_right() {
        let mut rights = CastleRights::ALL;
        rights.remove(CastleRights::WHITE_KINGSIDE);
        assert!(!rights.has(CastleRights::WHITE_KINGSIDE));
        assert!(rights.has(CastleRights::WHITE_QUEENSIDE));
        assert!(rights.has(CastleRights::BLACK_KINGSIDE));
    }
}
