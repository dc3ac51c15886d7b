//! Principal-variation negamax search: iterative deepening at the top, a pruned/reduced
//! negamax over the main line, and a capture-only quiescence search at the horizon.

use crate::color::Color;
use crate::engine::tt::{Bound, TranspositionTable, MATE, MATE_THRESHOLD};
use crate::engine::time::TimeManager;
use crate::eval::{evaluate, StandardTables};
use crate::movegen::{generate_all, generate_captures};
use crate::moves::{Move, MoveType};
use crate::piece::PieceType;
use crate::position::Position;
use crate::see::see;

const MAX_PLY: u32 = 128;
const HISTORY_MAX: i32 = 1 << 14;

const FUTILITY_MARGINS: [i32; 9] = [0, 100, 160, 220, 280, 340, 400, 460, 520];
const LMP_LIMITS: [usize; 6] = [0, 8, 12, 16, 20, 24];

const TT_MOVE_SCORE: i32 = 2_000_000;
const CAPTURE_BASE: i32 = 1_000_000;
const KILLER0_SCORE: i32 = 900_000;
const KILLER1_SCORE: i32 = 890_000;
const COUNTER_MOVE_BONUS: i32 = 400_000;

/// Raised through `?` whenever the time manager's cooperative-cancel flag is observed; every
/// caller on the stack propagates it without touching the transposition table, so an aborted
/// iteration never leaves a partial result behind.
#[derive(Debug)]
pub struct Aborted;

type SearchOutcome<T> = Result<T, Aborted>;

fn is_quiet(m: Move) -> bool {
    !matches!(m.move_type(), MoveType::Capture | MoveType::Promotion)
}

/// Killer slots, history, and counter-move tables — move-ordering state that persists across
/// the whole iterative-deepening search (cleared only by `ucinewgame` / the REPL reset).
pub struct Heuristics {
    killers: Vec<[Move; 2]>,
    history: [[[i32; 64]; 64]; 2],
    counter_moves: [[Move; 64]; 64],
}

impl Heuristics {
    #[must_use]
    pub fn new() -> Heuristics {
        Heuristics {
            killers: vec![[Move::NULL; 2]; MAX_PLY as usize],
            history: [[[0; 64]; 64]; 2],
            counter_moves: [[Move::NULL; 64]; 64],
        }
    }

    pub fn clear(&mut self) {
        *self = Heuristics::new();
    }

    fn killer_slot(&self, ply: u32, m: Move) -> Option<usize> {
        let k = &self.killers[ply as usize];
        if k[0].same_move(m) {
            Some(0)
        } else if k[1].same_move(m) {
            Some(1)
        } else {
            None
        }
    }

    fn history_score(&self, side: Color, m: Move) -> i32 {
        self.history[side as usize][m.from_square().0 as usize][m.to_square().0 as usize]
    }

    fn counter_move(&self, prev_move: Move) -> Move {
        if prev_move.is_null() {
            Move::NULL
        } else {
            self.counter_moves[prev_move.from_square().0 as usize][prev_move.to_square().0 as usize]
        }
    }

    fn bump_history(&mut self, side: Color, m: Move, delta: i32) {
        let entry = &mut self.history[side as usize][m.from_square().0 as usize][m.to_square().0 as usize];
        *entry += delta;
        if entry.abs() > HISTORY_MAX {
            for row in &mut self.history[side as usize] {
                for v in row.iter_mut() {
                    *v /= 2;
                }
            }
        }
    }

    /// Record a beta cutoff at `cutoff_move`: reward it and penalize the other quiet moves
    /// already tried at this node, install it as a killer, and remember it as the reply to
    /// `prev_move`. Captures and promotions don't touch history/killers/counters — only
    /// quiet-move ordering benefits from this feedback.
    fn on_cutoff(&mut self, side: Color, depth: i32, ply: u32, cutoff_move: Move, prev_move: Move, tried_quiets: &[Move]) {
        if !is_quiet(cutoff_move) {
            return;
        }
        let bonus = depth * depth;
        for &m in tried_quiets {
            if !m.same_move(cutoff_move) {
                self.bump_history(side, m, -bonus);
            }
        }
        self.bump_history(side, cutoff_move, bonus);

        let k = &mut self.killers[ply as usize];
        if !k[0].same_move(cutoff_move) {
            k[1] = k[0];
            k[0] = cutoff_move;
        }
        if !prev_move.is_null() {
            self.counter_moves[prev_move.from_square().0 as usize][prev_move.to_square().0 as usize] = cutoff_move;
        }
    }

    fn score_move(&self, pos: &Position, m: Move, tt_move: Option<Move>, ply: u32, prev_move: Move) -> i32 {
        if let Some(tt_move) = tt_move {
            if m.same_move(tt_move) {
                return TT_MOVE_SCORE;
            }
        }
        if matches!(m.move_type(), MoveType::Capture | MoveType::Promotion) {
            let victim_value = if m.is_en_passant() {
                PieceType::Pawn.see_value()
            } else {
                pos.piece_at(m.to_square()).map_or(0, |(pt, _)| pt.see_value())
            };
            let aggressor = pos.piece_at(m.from_square()).map_or(PieceType::Pawn, |(pt, _)| pt);
            let mut score = CAPTURE_BASE + victim_value * 16 - aggressor.index() as i32;
            if let Some(target) = m.promotion_target() {
                score += target.piece_type().see_value();
            }
            return score;
        }
        if let Some(slot) = self.killer_slot(ply, m) {
            return if slot == 0 { KILLER0_SCORE } else { KILLER1_SCORE };
        }
        let mut score = self.history_score(pos.side, m);
        if self.counter_move(prev_move).same_move(m) {
            score += COUNTER_MOVE_BONUS;
        }
        score
    }
}

impl Default for Heuristics {
    fn default() -> Heuristics {
        Heuristics::new()
    }
}

/// Reported once per completed iterative-deepening depth.
#[derive(Clone, Debug)]
pub struct IterationReport {
    pub depth: u32,
    pub score: i32,
    pub nodes: u64,
    pub elapsed_ms: u64,
    pub nps: u64,
    pub hashfull: u32,
    pub pv: Vec<Move>,
}

struct Searcher<'a> {
    tt: &'a mut TranspositionTable,
    time: &'a TimeManager,
    heuristics: Heuristics,
    nodes: u64,
    nodes_since_poll: u64,
    seldepth: u32,
    start: std::time::Instant,
}

impl<'a> Searcher<'a> {
    fn poll(&mut self) -> SearchOutcome<()> {
        self.nodes += 1;
        self.nodes_since_poll += 1;
        if self.nodes_since_poll >= 2048 {
            self.time.poll(self.nodes_since_poll);
            self.nodes_since_poll = 0;
        }
        if self.time.is_stopped() {
            return Err(Aborted);
        }
        Ok(())
    }

    fn negamax(
        &mut self,
        pos: &mut Position,
        mut depth: i32,
        ply: u32,
        mut alpha: i32,
        mut beta: i32,
        pv: &mut Vec<Move>,
        allow_null: bool,
        prev_move: Move,
        exclude_move: Move,
    ) -> SearchOutcome<i32> {
        self.poll()?;
        self.seldepth = self.seldepth.max(ply);
        if ply >= MAX_PLY {
            return Ok(evaluate(pos));
        }

        let in_check = pos.is_in_check();
        if in_check {
            depth += 1;
        }
        if depth <= 0 {
            return self.quiescence(pos, ply, alpha, beta);
        }

        if ply > 0 {
            if pos.is_repetition() || (pos.halfmove_clock >= 100 && !(ply == 1 && in_check)) {
                return Ok(0);
            }
        }

        let is_pv = beta - alpha > 1;
        let probe = self.tt.probe(pos.hash, ply, depth as i8, alpha, beta);
        if ply > 0 {
            if let Some(score) = probe.score {
                if exclude_move.is_null() || probe.best_move != Some(exclude_move) {
                    return Ok(score);
                }
            }
        }
        let mut tt_move = probe.best_move;

        let static_eval = evaluate(pos);

        if !in_check && !is_pv {
            if beta.abs() < MATE_THRESHOLD {
                let margin_score = static_eval - 85 * depth;
                if margin_score >= beta {
                    return Ok(margin_score);
                }
            }

            if allow_null && depth >= 2 && exclude_move.is_null() {
                let side_has_pieces = [PieceType::Knight, PieceType::Bishop, PieceType::Rook, PieceType::Queen]
                    .iter()
                    .any(|&pt| !pos.piece_bb(pos.side, pt).is_empty());
                if side_has_pieces {
                    pos.make_null_move();
                    let reduction = 3 + depth / 6;
                    let mut discard = Vec::new();
                    let score = -self.negamax(pos, depth - 1 - reduction, ply + 1, -beta, -beta + 1, &mut discard, false, Move::NULL, Move::NULL)?;
                    pos.unmake_null_move();
                    if score >= beta && score.abs() < MATE_THRESHOLD {
                        return Ok(beta);
                    }
                }
            }

            if depth <= 2 {
                let margin = static_eval + 3 * FUTILITY_MARGINS[depth.clamp(0, 8) as usize];
                if margin < alpha {
                    let probe_score = self.quiescence(pos, ply, alpha, alpha + 1)?;
                    if probe_score < alpha {
                        return Ok(alpha);
                    }
                }
            }
        }

        let futile = !in_check
            && !is_pv
            && depth <= 8
            && alpha.abs() < MATE_THRESHOLD
            && beta.abs() < MATE_THRESHOLD
            && static_eval + FUTILITY_MARGINS[depth.clamp(0, 8) as usize] <= alpha;

        if depth >= 4 && (is_pv || probe.bound == Some(Bound::Lower)) && tt_move.is_none() {
            let mut hint_pv = Vec::new();
            let _ = self.negamax(pos, depth - 3, ply, alpha, beta, &mut hint_pv, true, prev_move, Move::NULL)?;
            tt_move = hint_pv.first().copied();
        }

        let mut moves = generate_all(pos);
        moves.sort_by_key(|&m| std::cmp::Reverse(self.heuristics.score_move(pos, m, tt_move, ply, prev_move)));

        let mut legal_count = 0;
        let mut best_score = -MATE + ply as i32;
        let mut best_move = Move::NULL;
        let mut raised_alpha = false;
        let mut tried_quiets = Vec::new();
        let tables = StandardTables;

        for m in moves {
            if m.same_move(exclude_move) {
                continue;
            }

            let quiet = is_quiet(m);

            let mut extension = 0;
            if depth >= 4
                && is_pv
                && exclude_move.is_null()
                && tt_move.is_some_and(|tt| m.same_move(tt))
                && matches!(probe.bound, Some(Bound::Exact) | Some(Bound::Lower))
            {
                if let Some(tt_score) = probe.raw_score {
                    let singular_beta = tt_score - 2 * depth;
                    let mut discard = Vec::new();
                    let score = self.negamax(pos, (depth - 1) / 2, ply, singular_beta - 1, singular_beta, &mut discard, false, prev_move, m)?;
                    if score < singular_beta {
                        extension = 1;
                    }
                }
            }

            if !pos.make_move(m, &tables) {
                pos.unmake_move(m, &tables);
                continue;
            }
            legal_count += 1;
            let gives_check = pos.is_in_check();

            if depth <= 5 && !in_check && quiet && !gives_check && legal_count > LMP_LIMITS[depth.clamp(0, 5) as usize] {
                pos.unmake_move(m, &tables);
                continue;
            }
            if futile && legal_count > 1 && quiet && !gives_check {
                pos.unmake_move(m, &tables);
                continue;
            }

            let child_depth = depth - 1 + extension;
            let mut child_pv = Vec::new();
            let score = if legal_count == 1 {
                -self.negamax(pos, child_depth, ply + 1, -beta, -alpha, &mut child_pv, true, m, Move::NULL)?
            } else {
                let do_lmr = legal_count >= 4 && depth >= 3 && quiet && !gives_check && !is_pv;
                let reduction = if do_lmr { (depth / 4).max(2) + legal_count as i32 / 12 } else { 0 };

                let mut score =
                    -self.negamax(pos, child_depth - reduction, ply + 1, -alpha - 1, -alpha, &mut child_pv, true, m, Move::NULL)?;
                if score > alpha && reduction > 0 {
                    score = -self.negamax(pos, child_depth, ply + 1, -alpha - 1, -alpha, &mut child_pv, true, m, Move::NULL)?;
                }
                if score > alpha && score < beta {
                    score = -self.negamax(pos, child_depth, ply + 1, -beta, -alpha, &mut child_pv, true, m, Move::NULL)?;
                }
                score
            };
            pos.unmake_move(m, &tables);

            if quiet {
                tried_quiets.push(m);
            }

            if score > best_score {
                best_score = score;
                best_move = m;

                if score > alpha {
                    pv.clear();
                    pv.push(m);
                    pv.extend(child_pv);

                    if score >= beta {
                        self.heuristics.on_cutoff(pos.side, depth, ply, m, prev_move, &tried_quiets);
                        break;
                    }
                    raised_alpha = true;
                    alpha = score;
                }
            }
        }

        if legal_count == 0 {
            best_score = if in_check { -MATE + ply as i32 } else { 0 };
        } else {
            let bound = if best_score >= beta {
                Bound::Lower
            } else if raised_alpha {
                Bound::Exact
            } else {
                Bound::Upper
            };
            self.tt.store(pos.hash, ply, depth as i8, best_score, bound, best_move);
        }

        Ok(best_score)
    }

    fn quiescence(&mut self, pos: &mut Position, ply: u32, mut alpha: i32, beta: i32) -> SearchOutcome<i32> {
        self.poll()?;
        self.seldepth = self.seldepth.max(ply);
        if ply >= MAX_PLY {
            return Ok(evaluate(pos));
        }

        let in_check = ply <= 2 && pos.is_in_check();
        let stand_pat = evaluate(pos);

        if !in_check {
            if stand_pat >= beta {
                return Ok(stand_pat);
            }
            if stand_pat > alpha {
                alpha = stand_pat;
            }
        }

        let moves = if in_check { generate_all(pos) } else { generate_captures(pos) };
        let tables = StandardTables;
        let mut best_score = if in_check { -MATE + ply as i32 } else { stand_pat };
        let mut legal_count = 0;

        for m in moves {
            if !in_check && see(pos, m) < 0 {
                continue;
            }
            if !pos.make_move(m, &tables) {
                pos.unmake_move(m, &tables);
                continue;
            }
            legal_count += 1;
            let score = -self.quiescence(pos, ply + 1, -beta, -alpha)?;
            pos.unmake_move(m, &tables);

            if score > best_score {
                best_score = score;
                if score > alpha {
                    alpha = score;
                    if score >= beta {
                        break;
                    }
                }
            }
        }

        if in_check && legal_count == 0 {
            return Ok(-MATE + ply as i32);
        }
        Ok(best_score)
    }
}

/// Run iterative deepening from `pos` up to `max_depth`, reporting each completed iteration
/// through `on_iteration`. Returns the best move found; if even depth 1 is interrupted before
/// completing, falls back to the partial principal variation's first move, or else the first
/// legal move in the position.
pub fn iterative_deepening(
    pos: &mut Position,
    tt: &mut TranspositionTable,
    time: &TimeManager,
    heuristics: Heuristics,
    max_depth: u32,
    mut on_iteration: impl FnMut(&IterationReport),
) -> (Move, Heuristics) {
    tt.new_search();
    let mut searcher =
        Searcher { tt, time, heuristics, nodes: 0, nodes_since_poll: 0, seldepth: 0, start: std::time::Instant::now() };

    let mut alpha = -MATE;
    let mut beta = MATE;
    let mut depth = 1;
    let mut best_move = None;
    let mut extended = false;

    loop {
        if depth > max_depth {
            break;
        }
        let mut pv = Vec::new();
        match searcher.negamax(pos, depth as i32, 0, alpha, beta, &mut pv, true, Move::NULL, Move::NULL) {
            Err(Aborted) => {
                if depth == 1 && best_move.is_none() {
                    best_move = pv.first().copied();
                }
                break;
            }
            Ok(score) => {
                if (score <= alpha || score >= beta) && alpha != -MATE {
                    alpha = -MATE;
                    beta = MATE;
                    if depth >= 6 && !extended {
                        time.extend_once();
                        extended = true;
                    }
                    continue;
                }
                alpha = score - 35;
                beta = score + 35;
                best_move = pv.first().copied();
                let elapsed_ms = searcher.start.elapsed().as_millis() as u64;
                let nps = searcher.nodes * 1000 / elapsed_ms.max(1);
                let hashfull = searcher.tt.fill_permille();
                on_iteration(&IterationReport { depth, score, nodes: searcher.nodes, elapsed_ms, nps, hashfull, pv });
                depth += 1;
            }
        }
    }

    let best_move = best_move.unwrap_or_else(|| generate_all(pos).into_iter().find(|&m| {
        let tables = StandardTables;
        let legal = pos.make_move(m, &tables);
        pos.unmake_move(m, &tables);
        legal
    }).expect("go must only be called in a position with at least one legal move"));

    (best_move, searcher.heuristics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::time::TimeManager;
    use crate::square::Square;

    fn search_depth(fen: &str, depth: u32) -> (Move, i32) {
        let mut pos = Position::from_fen(fen, &StandardTables).unwrap();
        let mut tt = TranspositionTable::with_size_mb(1);
        let time = TimeManager::unbounded();
        let mut last_score = 0;
        let (m, _) = iterative_deepening(&mut pos, &mut tt, &time, Heuristics::new(), depth, |report| {
            last_score = report.score;
        });
        (m, last_score)
    }

    #[test]
    fn finds_mate_in_one() {
        let (m, score) = search_depth("6k1/5ppp/8/8/8/8/8/4R1K1 w - - 0 1", 5);
        assert_eq!(score, MATE - 1);
        assert_eq!(m.to_string(), "e1e8");
    }

    #[test]
    fn single_legal_move_is_played_at_depth_one() {
        let (m, _) = search_depth("r3k2b/8/8/8/8/8/8/K7 w - - 0 1", 1);
        assert_eq!(m.from_square(), Square::A1);
    }

    #[test]
    fn rook_on_open_file_is_preferred() {
        let (m, _) = search_depth("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", 8);
        assert_eq!(m.from_square(), Square::A1);
    }
}
