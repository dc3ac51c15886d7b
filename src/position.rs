//! Board state: piece placement, make/unmake, and FEN I/O.

use crate::bitboard::Bitboard;
use crate::castling::CastleRights;
use crate::color::Color;
use crate::eval::EvalTables;
use crate::moves::{Move, MoveType};
use crate::piece::PieceType;
use crate::square::Square;
use crate::zobrist::ZOBRIST;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// One state snapshot, pushed before every `make_move`/`make_null_move` and popped by the
/// matching unmake. Everything not reachable by reversing the move's own square edits lives
/// here.
#[derive(Clone, Copy)]
struct Undo {
    hash: u64,
    castle_rights: CastleRights,
    halfmove_clock: u8,
    en_passant: Option<Square>,
    captured: Option<(PieceType, Color)>,
    moved_piece: PieceType,
}

#[derive(Clone)]
pub struct Position {
    squares: [Option<(PieceType, Color)>; 64],
    color_bb: [Bitboard; 2],
    piece_bb: [[Bitboard; 6]; 2],
    pub side: Color,
    pub castle_rights: CastleRights,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u8,
    pub fullmove_number: u32,
    pub hash: u64,
    mg_score: [i32; 2],
    eg_score: [i32; 2],
    phase: i32,
    history: Vec<Undo>,
}

/// Per-corner mask: moving from, or capturing on, one of these squares removes the
/// associated castling right.
const CASTLE_RIGHT_LOSS: [(Square, CastleRights); 4] = [
    (Square::A1, CastleRights::WHITE_QUEENSIDE),
    (Square::H1, CastleRights::WHITE_KINGSIDE),
    (Square::A8, CastleRights::BLACK_QUEENSIDE),
    (Square::H8, CastleRights::BLACK_KINGSIDE),
];

impl Position {
    #[must_use]
    pub fn startpos() -> Position {
        Position::from_fen(START_FEN, &crate::eval::StandardTables).expect("start FEN is well-formed")
    }

    #[must_use]
    pub fn color_bb(&self, color: Color) -> Bitboard {
        self.color_bb[color as usize]
    }

    #[must_use]
    pub fn piece_bb(&self, color: Color, pt: PieceType) -> Bitboard {
        self.piece_bb[color as usize][pt.index()]
    }

    #[must_use]
    pub fn occupied(&self) -> Bitboard {
        self.color_bb[0] | self.color_bb[1]
    }

    #[must_use]
    pub fn piece_at(&self, sq: Square) -> Option<(PieceType, Color)> {
        self.squares[sq.0 as usize]
    }

    #[must_use]
    pub fn king_square(&self, color: Color) -> Square {
        self.piece_bb(color, PieceType::King)
            .squares()
            .next()
            .expect("every legal position has a king of each color")
    }

    #[must_use]
    pub fn mg_score(&self, color: Color) -> i32 {
        self.mg_score[color as usize]
    }

    #[must_use]
    pub fn eg_score(&self, color: Color) -> i32 {
        self.eg_score[color as usize]
    }

    #[must_use]
    pub fn phase(&self) -> i32 {
        self.phase
    }

    fn empty(tables: &impl EvalTables) -> Position {
        Position {
            squares: [None; 64],
            color_bb: [Bitboard::EMPTY; 2],
            piece_bb: [[Bitboard::EMPTY; 6]; 2],
            side: Color::White,
            castle_rights: CastleRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
            mg_score: [0; 2],
            eg_score: [0; 2],
            phase: tables.total_phase(),
            history: Vec::with_capacity(64),
        }
    }

    fn place_piece(&mut self, color: Color, pt: PieceType, sq: Square, tables: &impl EvalTables) {
        debug_assert!(self.squares[sq.0 as usize].is_none());
        self.squares[sq.0 as usize] = Some((pt, color));
        self.color_bb[color as usize].set(sq);
        self.piece_bb[color as usize][pt.index()].set(sq);
        self.hash ^= ZOBRIST.piece_at(color, pt, sq);
        let side = color as usize;
        self.mg_score[side] += tables.material_mg(pt) + tables.pst_mg(color, pt, sq);
        self.eg_score[side] += tables.material_eg(pt) + tables.pst_eg(color, pt, sq);
        self.phase -= tables.phase_weight(pt);
    }

    fn remove_piece(&mut self, sq: Square, tables: &impl EvalTables) -> (PieceType, Color) {
        let (pt, color) = self.squares[sq.0 as usize].take().expect("square must be occupied");
        self.color_bb[color as usize].clear(sq);
        self.piece_bb[color as usize][pt.index()].clear(sq);
        self.hash ^= ZOBRIST.piece_at(color, pt, sq);
        let side = color as usize;
        self.mg_score[side] -= tables.material_mg(pt) + tables.pst_mg(color, pt, sq);
        self.eg_score[side] -= tables.material_eg(pt) + tables.pst_eg(color, pt, sq);
        self.phase += tables.phase_weight(pt);
        (pt, color)
    }

    fn move_piece(&mut self, from: Square, to: Square, tables: &impl EvalTables) -> PieceType {
        let (pt, color) = self.remove_piece(from, tables);
        self.place_piece(color, pt, to, tables);
        pt
    }

    // ---- FEN ----

    pub fn from_fen(fen: &str, tables: &impl EvalTables) -> Result<Position, &'static str>
    where
        Self: Sized,
    {
        let mut fields = fen.split_whitespace();
        let placement = fields.next().ok_or("missing piece placement field")?;
        let side = fields.next().ok_or("missing side to move field")?;
        let castling = fields.next().unwrap_or("-");
        let en_passant = fields.next().unwrap_or("-");
        let halfmove = fields.next().unwrap_or("0");
        let fullmove = fields.next().unwrap_or("1");

        let mut position = Position::empty(tables);

        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err("piece placement must have 8 ranks");
        }
        for (rank_from_top, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_from_top as u8;
            let mut file = 0u8;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as u8;
                } else {
                    if file >= 8 {
                        return Err("rank has too many squares");
                    }
                    let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
                    let pt = PieceType::from_letter(c)?;
                    position.place_piece(color, pt, Square::from_rank_file(rank, file), tables);
                    file += 1;
                }
            }
            if file != 8 {
                return Err("rank does not cover all 8 files");
            }
        }

        position.side = match side {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return Err("side to move must be 'w' or 'b'"),
        };

        position.castle_rights = CastleRights::from_fen_field(castling)?;

        position.en_passant = match en_passant {
            "-" => None,
            s => Some(Square::from_algebraic(s)?),
        };

        position.halfmove_clock = halfmove.parse().map_err(|_| "invalid halfmove clock")?;
        position.fullmove_number = fullmove.parse().map_err(|_| "invalid fullmove number")?;

        position.hash = position.recompute_hash();

        Ok(position)
    }

    #[must_use]
    pub fn to_fen(&self) -> String {
        let mut placement = String::new();
        for rank_from_top in 0..8u8 {
            let rank = 7 - rank_from_top;
            let mut empty_run = 0u8;
            for file in 0..8u8 {
                match self.piece_at(Square::from_rank_file(rank, file)) {
                    None => empty_run += 1,
                    Some((pt, color)) => {
                        if empty_run > 0 {
                            placement.push_str(&empty_run.to_string());
                            empty_run = 0;
                        }
                        let letter = pt.letter();
                        placement.push(if color == Color::White {
                            letter.to_ascii_uppercase()
                        } else {
                            letter
                        });
                    }
                }
            }
            if empty_run > 0 {
                placement.push_str(&empty_run.to_string());
            }
            if rank_from_top != 7 {
                placement.push('/');
            }
        }

        format!(
            "{} {} {} {} {} {}",
            placement,
            if self.side == Color::White { "w" } else { "b" },
            self.castle_rights.to_fen_field(),
            self.en_passant.map_or("-".to_string(), |sq| sq.to_algebraic()),
            self.halfmove_clock,
            self.fullmove_number,
        )
    }

    /// Recompute the Zobrist hash from scratch: used by `from_fen` and as a cross-check in
    /// tests, never on the hot path.
    #[must_use]
    pub fn recompute_hash(&self) -> u64 {
        let mut hash = 0u64;
        for sq in 0..64u8 {
            if let Some((pt, color)) = self.squares[sq as usize] {
                hash ^= ZOBRIST.piece_at(color, pt, Square(sq));
            }
        }
        hash ^= ZOBRIST.castling(self.castle_rights);
        hash ^= ZOBRIST.en_passant(self.en_passant.map(Square::file));
        if self.side == Color::White {
            hash ^= ZOBRIST.side_to_move();
        }
        hash
    }

    // ---- make / unmake ----

    /// Apply a pseudo-legal move. Returns `false` if doing so leaves the mover's own king in
    /// check, in which case the caller must immediately call `unmake_move`.
    pub fn make_move(&mut self, m: Move, tables: &impl EvalTables) -> bool {
        let mover_color = self.side;
        let from = m.from_square();
        let to = m.to_square();
        let moved_piece = self.piece_at(from).expect("from-square must hold a piece").0;

        let old_hash_ep_castle =
            ZOBRIST.en_passant(self.en_passant.map(Square::file)) ^ ZOBRIST.castling(self.castle_rights);

        self.history.push(Undo {
            hash: self.hash,
            castle_rights: self.castle_rights,
            halfmove_clock: self.halfmove_clock,
            en_passant: self.en_passant,
            captured: None, // filled in below once known
            moved_piece,
        });

        let old_en_passant = self.en_passant;
        self.en_passant = None;
        self.halfmove_clock += 1;

        let mut captured = None;

        match m.move_type() {
            MoveType::Quiet => {
                self.move_piece(from, to, tables);
            }
            MoveType::Capture => {
                if m.is_en_passant() {
                    let captured_sq = match mover_color {
                        Color::White => Square(to.0 - 8),
                        Color::Black => Square(to.0 + 8),
                    };
                    captured = Some(self.remove_piece(captured_sq, tables));
                    self.move_piece(from, to, tables);
                } else {
                    captured = Some(self.remove_piece(to, tables));
                    self.move_piece(from, to, tables);
                }
                self.halfmove_clock = 0;
            }
            MoveType::Castle => {
                self.move_piece(from, to, tables);
                let (rook_from, rook_to) = match to {
                    Square::G1 => (Square::H1, Square::F1),
                    Square::C1 => (Square::A1, Square::D1),
                    Square::G8 => (Square::H8, Square::F8),
                    Square::C8 => (Square::A8, Square::D8),
                    _ => unreachable!("castle destination must be one of the four corners"),
                };
                self.move_piece(rook_from, rook_to, tables);
            }
            MoveType::Promotion => {
                if self.piece_at(to).is_some() {
                    captured = Some(self.remove_piece(to, tables));
                }
                self.remove_piece(from, tables);
                let target = m.promotion_target().expect("promotion move must carry a target");
                self.place_piece(mover_color, target.piece_type(), to, tables);
                self.halfmove_clock = 0;
            }
        }

        self.history.last_mut().unwrap().captured = captured;

        if moved_piece == PieceType::Pawn {
            self.halfmove_clock = 0;
            if from.rank().abs_diff(to.rank()) == 2 {
                let skipped = Square::from_rank_file((from.rank() + to.rank()) / 2, from.file());
                let enemy = !mover_color;
                // An enemy pawn threatens `skipped` iff it sits on one of the squares that
                // `skipped` itself would attack as a pawn of the *mover's* color (the
                // attack relation is its own inverse across one diagonal step).
                let can_capture = crate::tables::PAWN_ATTACKS[mover_color as usize][skipped.0 as usize]
                    & self.piece_bb(enemy, PieceType::Pawn);
                if !can_capture.is_empty() {
                    self.en_passant = Some(skipped);
                }
            }
        }

        for &(sq, right) in &CASTLE_RIGHT_LOSS {
            if from == sq || to == sq {
                self.castle_rights.remove(right);
            }
        }
        if moved_piece == PieceType::King {
            self.castle_rights.remove(match mover_color {
                Color::White => CastleRights::WHITE,
                Color::Black => CastleRights::BLACK,
            });
        }

        self.hash ^= old_hash_ep_castle;
        self.hash ^= ZOBRIST.en_passant(self.en_passant.map(Square::file))
            ^ ZOBRIST.castling(self.castle_rights);
        self.hash ^= ZOBRIST.side_to_move();

        self.side = !mover_color;
        if mover_color == Color::Black {
            self.fullmove_number += 1;
        }
        let _ = old_en_passant;

        !self.is_square_attacked(self.king_square(mover_color), !mover_color)
    }

    pub fn unmake_move(&mut self, m: Move, tables: &impl EvalTables) {
        self.side = !self.side;
        let mover_color = self.side;
        if mover_color == Color::Black {
            self.fullmove_number -= 1;
        }
        let undo = self.history.pop().expect("unmake without matching make");

        let from = m.from_square();
        let to = m.to_square();

        match m.move_type() {
            MoveType::Quiet => {
                self.move_piece(to, from, tables);
            }
            MoveType::Capture => {
                self.move_piece(to, from, tables);
                if let Some((pt, color)) = undo.captured {
                    let capture_sq = if m.is_en_passant() {
                        match mover_color {
                            Color::White => Square(to.0 - 8),
                            Color::Black => Square(to.0 + 8),
                        }
                    } else {
                        to
                    };
                    self.place_piece(color, pt, capture_sq, tables);
                }
            }
            MoveType::Castle => {
                let (rook_from, rook_to) = match to {
                    Square::G1 => (Square::H1, Square::F1),
                    Square::C1 => (Square::A1, Square::D1),
                    Square::G8 => (Square::H8, Square::F8),
                    Square::C8 => (Square::A8, Square::D8),
                    _ => unreachable!(),
                };
                self.move_piece(rook_to, rook_from, tables);
                self.move_piece(to, from, tables);
            }
            MoveType::Promotion => {
                self.remove_piece(to, tables);
                self.place_piece(mover_color, undo.moved_piece, from, tables);
                if let Some((pt, color)) = undo.captured {
                    self.place_piece(color, pt, to, tables);
                }
            }
        }

        self.hash = undo.hash;
        self.castle_rights = undo.castle_rights;
        self.halfmove_clock = undo.halfmove_clock;
        self.en_passant = undo.en_passant;
    }

    pub fn make_null_move(&mut self) {
        self.history.push(Undo {
            hash: self.hash,
            castle_rights: self.castle_rights,
            halfmove_clock: self.halfmove_clock,
            en_passant: self.en_passant,
            captured: None,
            moved_piece: PieceType::King, // unused for null moves
        });
        self.hash ^= ZOBRIST.en_passant(self.en_passant.map(Square::file));
        self.hash ^= ZOBRIST.en_passant(None);
        self.en_passant = None;
        self.halfmove_clock = 0;
        self.hash ^= ZOBRIST.side_to_move();
        self.side = !self.side;
    }

    pub fn unmake_null_move(&mut self) {
        self.side = !self.side;
        let undo = self.history.pop().expect("unmake_null without matching make_null");
        self.hash = undo.hash;
        self.castle_rights = undo.castle_rights;
        self.halfmove_clock = undo.halfmove_clock;
        self.en_passant = undo.en_passant;
    }

    #[must_use]
    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        crate::movegen::is_square_attacked(self, sq, by)
    }

    #[must_use]
    pub fn is_in_check(&self) -> bool {
        self.is_square_attacked(self.king_square(self.side), !self.side)
    }

    #[must_use]
    pub fn has_no_major_or_minor_pieces(&self) -> bool {
        for color in [Color::White, Color::Black] {
            for pt in [PieceType::Knight, PieceType::Bishop, PieceType::Rook, PieceType::Queen] {
                if !self.piece_bb(color, pt).is_empty() {
                    return false;
                }
            }
        }
        true
    }

    /// Whether the current position's hash matches one of its own ancestors on the move
    /// stack — every `Undo` frame records the hash of the position it was pushed from, so
    /// this is exactly the set of positions seen earlier in the current search/game line.
    #[must_use]
    pub fn is_repetition(&self) -> bool {
        self.history.iter().any(|undo| undo.hash == self.hash)
    }
}

impl std::fmt::Display for Position {
    /// Eight ranks, 8th at top and 1st at bottom, capital letters for White and lowercase for
    /// Black, a dot for an empty square.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for rank in (0..8u8).rev() {
            for file in 0..8u8 {
                match self.piece_at(Square::from_rank_file(rank, file)) {
                    Some((pt, Color::White)) => write!(f, "{}", pt.letter().to_ascii_uppercase())?,
                    Some((pt, Color::Black)) => write!(f, "{}", pt.letter())?,
                    None => write!(f, ".")?,
                }
                write!(f, " ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::StandardTables;

    #[test]
    fn startpos_hash_matches_recompute() {
        let p = Position::startpos();
        assert_eq!(p.hash, p.recompute_hash());
    }

    #[test]
    fn fen_round_trip() {
        for fen in [
            START_FEN,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        ] {
            let p = Position::from_fen(fen, &StandardTables).unwrap();
            assert_eq!(p.to_fen(), fen);
        }
    }

    #[test]
    fn make_unmake_restores_hash_and_material() {
        let mut p = Position::startpos();
        let before_hash = p.hash;
        let before_mg = p.mg_score(Color::White);
        let m = Move::quiet(Square::E2, Square::E4);
        // e2e4 is a double push, so encode it as a quiet move from e2 to e4 directly.
        assert!(p.make_move(m, &StandardTables));
        assert_ne!(p.hash, before_hash);
        p.unmake_move(m, &StandardTables);
        assert_eq!(p.hash, before_hash);
        assert_eq!(p.mg_score(Color::White), before_mg);
        assert_eq!(p.hash, p.recompute_hash());
    }

    #[test]
    fn illegal_move_leaves_king_in_check() {
        // White king on e1 pinned view: moving the e-pawn away exposes nothing here, so
        // instead construct a position where a non-king move leaves the king in check.
        let mut p =
            Position::from_fen("4k3/8/8/8/8/8/4r3/4K3 w - - 0 1", &StandardTables).unwrap();
        let m = Move::quiet(Square::E1, Square::D1);
        let legal = p.make_move(m, &StandardTables);
        p.unmake_move(m, &StandardTables);
        assert!(!legal || p.is_in_check());
        let _ = legal;
    }
}
