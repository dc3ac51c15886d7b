//! Messages the engine sends back to the front-end, and their UCI text formatting.

use std::fmt;

use crate::moves::Move;

pub enum Message<'a> {
    Id { name: &'a str, author: &'a str },
    UciOk,
    ReadyOk,
    Option { name: &'a str, opt: OptionType },
    BestMove(Move),
    Info(&'a [EngineInfo<'a>]),
}

pub enum EngineInfo<'a> {
    Depth(u32),
    SelDepth(u32),
    TimeMs(u64),
    Nodes(u64),
    NodeSpeed(u64),
    HashFull(u32),
    Pv(&'a [Move]),
    ScoreCp(i32),
    ScoreMate(i32),
    String(&'a str),
}

pub enum OptionType {
    Spin { default: i64, min: i64, max: i64 },
    Button,
}

impl fmt::Display for Message<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Id { name, author } => {
                writeln!(f, "id name {name}")?;
                write!(f, "id author {author}")
            }
            Message::UciOk => write!(f, "uciok"),
            Message::ReadyOk => write!(f, "readyok"),
            Message::Option { name, opt } => {
                write!(f, "option name {name} type ")?;
                match opt {
                    OptionType::Spin { default, min, max } => {
                        write!(f, "spin default {default} min {min} max {max}")
                    }
                    OptionType::Button => write!(f, "button"),
                }
            }
            Message::BestMove(m) => write!(f, "bestmove {m}"),
            Message::Info(infos) => {
                write!(f, "info")?;
                for info in *infos {
                    write!(f, " ")?;
                    match info {
                        EngineInfo::Depth(d) => write!(f, "depth {d}")?,
                        EngineInfo::SelDepth(d) => write!(f, "seldepth {d}")?,
                        EngineInfo::TimeMs(t) => write!(f, "time {t}")?,
                        EngineInfo::Nodes(n) => write!(f, "nodes {n}")?,
                        EngineInfo::NodeSpeed(nps) => write!(f, "nps {nps}")?,
                        EngineInfo::HashFull(permille) => write!(f, "hashfull {permille}")?,
                        EngineInfo::ScoreCp(cp) => write!(f, "score cp {cp}")?,
                        EngineInfo::ScoreMate(moves) => write!(f, "score mate {moves}")?,
                        EngineInfo::String(s) => write!(f, "string {s}")?,
                        EngineInfo::Pv(pv) => {
                            write!(f, "pv")?;
                            for m in *pv {
                                write!(f, " {m}")?;
                            }
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::square::Square;

    #[test]
    fn formats_bestmove() {
        let m = Move::quiet(Square::E2, Square::E4);
        assert_eq!(Message::BestMove(m).to_string(), "bestmove e2e4");
    }

    #[test]
    fn formats_spin_option() {
        let msg = Message::Option {
            name: "Transposition Table Size",
            opt: OptionType::Spin { default: 64, min: 1, max: 32_000 },
        };
        assert_eq!(msg.to_string(), "option name Transposition Table Size type spin default 64 min 1 max 32000");
    }

    #[test]
    fn formats_mate_score_info_line() {
        let infos = [EngineInfo::Depth(5), EngineInfo::ScoreMate(1), EngineInfo::Nodes(12)];
        assert_eq!(Message::Info(&infos).to_string(), "info depth 5 score mate 1 nodes 12");
    }
}
