//! Parsing UCI command lines into a structured [`Command`].

use std::fmt::Display;
use std::str::FromStr;

use crate::movegen::generate_all;
use crate::moves::{Move, PromotionTarget};
use crate::position::Position;
use crate::square::Square;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Uci,
    IsReady,
    SetOption { name: String, value: Option<String> },
    NewGame,
    Position { fen: Option<String>, moves: Vec<String> },
    Go(Vec<GoOption>),
    Stop,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoOption {
    WhiteTime(i64),
    BlackTime(i64),
    WhiteInc(u32),
    BlackInc(u32),
    MovesToGo(u8),
    Depth(u32),
    Nodes(u64),
    MoveTime(u32),
    Infinite,
}

pub type ParseResult = Result<Command, String>;

pub fn parse_line(line: &str) -> ParseResult {
    let mut tokens = line.split_ascii_whitespace();
    let first = tokens.next().ok_or("empty line")?;
    match first {
        "uci" => Ok(Command::Uci),
        "isready" => Ok(Command::IsReady),
        "setoption" => parse_set_option(&mut tokens),
        "ucinewgame" => Ok(Command::NewGame),
        "position" => parse_position(&mut tokens),
        "go" => parse_go(&mut tokens),
        "stop" => Ok(Command::Stop),
        "quit" => Ok(Command::Quit),
        _ => Err(format!("unrecognized UCI command `{first}`")),
    }
}

fn parse_set_option(tokens: &mut dyn Iterator<Item = &str>) -> ParseResult {
    let name_tok = tokens.next().ok_or("expected `name` in setoption")?;
    if name_tok != "name" {
        return Err(format!("expected `name`, got `{name_tok}`"));
    }

    let mut name = String::new();
    loop {
        let Some(tok) = tokens.next() else {
            return Ok(Command::SetOption { name, value: None });
        };
        if tok == "value" {
            break;
        }
        if !name.is_empty() {
            name += " ";
        }
        name += tok;
    }

    let mut value = String::new();
    for tok in tokens {
        if !value.is_empty() {
            value += " ";
        }
        value += tok;
    }
    Ok(Command::SetOption { name, value: Some(value) })
}

fn parse_position(tokens: &mut dyn Iterator<Item = &str>) -> ParseResult {
    let first = tokens.next().ok_or("reached end of line parsing position")?;
    let (fen, mut pending) = match first {
        "startpos" => (None, tokens.next()),
        "fen" => {
            let mut fen = String::new();
            let mut next = tokens.next();
            while let Some(tok) = next {
                if tok == "moves" {
                    break;
                }
                if !fen.is_empty() {
                    fen += " ";
                }
                fen += tok;
                next = tokens.next();
            }
            (Some(fen), None)
        }
        _ => return Err("position must start with `startpos` or `fen`".to_string()),
    };

    let mut moves = Vec::new();
    if let Some(tok) = pending.take() {
        if tok != "moves" {
            moves.push(tok.to_string());
        }
    }
    for tok in tokens {
        moves.push(tok.to_string());
    }
    Ok(Command::Position { fen, moves })
}

fn parse_go(tokens: &mut dyn Iterator<Item = &str>) -> ParseResult {
    fn parse_int<F: FromStr>(x: Option<&str>) -> Result<F, String>
    where
        F::Err: Display,
    {
        x.ok_or_else(|| "reached end of line parsing go option".to_string())?
            .parse()
            .map_err(|e| format!("bad integer in `go`: {e}"))
    }

    let mut opts = Vec::new();
    while let Some(tok) = tokens.next() {
        opts.push(match tok {
            "wtime" => GoOption::WhiteTime(parse_int(tokens.next())?),
            "btime" => GoOption::BlackTime(parse_int(tokens.next())?),
            "winc" => GoOption::WhiteInc(parse_int(tokens.next())?),
            "binc" => GoOption::BlackInc(parse_int(tokens.next())?),
            "movestogo" => GoOption::MovesToGo(parse_int(tokens.next())?),
            "depth" => GoOption::Depth(parse_int(tokens.next())?),
            "nodes" => GoOption::Nodes(parse_int(tokens.next())?),
            "movetime" => GoOption::MoveTime(parse_int(tokens.next())?),
            "infinite" => GoOption::Infinite,
            "ponder" => continue,
            _ => return Err(format!("unrecognized `go` option `{tok}`")),
        });
    }
    Ok(Command::Go(opts))
}

/// Decode a UCI move string (`<from><to>[promo]`) against `pos` by matching it against the
/// position's own pseudo-legal moves, rather than re-deriving a move type from the text. This
/// sidesteps the classic decoder mistake of tagging a promotion string as a castle move: the
/// move's actual type always comes from the generator, never from re-parsing the string.
#[must_use]
pub fn decode_move(pos: &Position, text: &str) -> Option<Move> {
    if text.len() < 4 {
        return None;
    }
    let from = Square::from_algebraic(&text[0..2]).ok()?;
    let to = Square::from_algebraic(&text[2..4]).ok()?;
    let promo = text.get(4..5).and_then(|c| match c {
        "q" => Some(PromotionTarget::Queen),
        "r" => Some(PromotionTarget::Rook),
        "b" => Some(PromotionTarget::Bishop),
        "n" => Some(PromotionTarget::Knight),
        _ => None,
    });

    generate_all(pos)
        .into_iter()
        .find(|m| m.from_square() == from && m.to_square() == to && m.promotion_target() == promo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::StandardTables;

    #[test]
    fn position_startpos_with_moves() {
        assert_eq!(
            parse_line("position startpos moves e2e4 e7e5"),
            Ok(Command::Position { fen: None, moves: vec!["e2e4".to_string(), "e7e5".to_string()] })
        );
    }

    #[test]
    fn position_fen() {
        let cmd = parse_line("position fen 8/8/8/8/8/8/8/K6k w - - 0 1 moves a1a2").unwrap();
        assert_eq!(
            cmd,
            Command::Position {
                fen: Some("8/8/8/8/8/8/8/K6k w - - 0 1".to_string()),
                moves: vec!["a1a2".to_string()],
            }
        );
    }

    #[test]
    fn go_with_clock_and_depth() {
        let cmd = parse_line("go wtime 1000 btime 2000 winc 10 binc 20 depth 8").unwrap();
        assert_eq!(
            cmd,
            Command::Go(vec![
                GoOption::WhiteTime(1000),
                GoOption::BlackTime(2000),
                GoOption::WhiteInc(10),
                GoOption::BlackInc(20),
                GoOption::Depth(8),
            ])
        );
    }

    #[test]
    fn setoption_with_multi_word_name() {
        let cmd = parse_line("setoption name Transposition Table Size value 128").unwrap();
        assert_eq!(
            cmd,
            Command::SetOption { name: "Transposition Table Size".to_string(), value: Some("128".to_string()) }
        );
    }

    #[test]
    fn decode_move_promotion_is_never_mistaken_for_castling() {
        let pos = Position::from_fen("8/P6k/8/8/8/8/7p/7K w - - 0 1", &StandardTables).unwrap();
        let m = decode_move(&pos, "a7a8q").unwrap();
        assert_eq!(m.move_type(), crate::moves::MoveType::Promotion);
    }

    #[test]
    fn decode_move_castling_is_the_kings_two_square_move() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1", &StandardTables).unwrap();
        let m = decode_move(&pos, "e1g1").unwrap();
        assert_eq!(m.move_type(), crate::moves::MoveType::Castle);
    }
}
