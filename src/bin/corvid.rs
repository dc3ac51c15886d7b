//! Entry point: a line-oriented REPL that switches permanently into UCI mode the first time
//! the front-end sends `uci`.

use std::io::{self, BufRead, Write};
use std::thread::JoinHandle;

use corvid::engine::options;
use corvid::engine::search::{iterative_deepening, Heuristics, IterationReport};
use corvid::engine::time::TimeManager;
use corvid::engine::tt::TranspositionTable;
use corvid::eval::{evaluate, StandardTables};
use corvid::perft::{divide, perft};
use corvid::position::Position;
use corvid::uci::parse::{decode_move, parse_line, Command};
use corvid::uci::send::{EngineInfo, Message};
use corvid::uci::{go_params, option_list};

const ENGINE_NAME: &str = "Corvid";
const ENGINE_AUTHOR: &str = "Corvid Authors";
const PERFT_DEPTH_CAP: u32 = 6;

struct PendingSearch {
    time: TimeManager,
    handle: JoinHandle<(corvid::moves::Move, TranspositionTable, Heuristics)>,
}

struct Engine {
    pos: Position,
    tt: Option<TranspositionTable>,
    heuristics: Option<Heuristics>,
    search: Option<PendingSearch>,
    uci_mode: bool,
}

impl Engine {
    fn new() -> Engine {
        Engine {
            pos: Position::startpos(),
            tt: Some(TranspositionTable::with_size_mb(options::DEFAULT_HASH_MB)),
            heuristics: Some(Heuristics::new()),
            search: None,
            uci_mode: false,
        }
    }

    fn send_uci_identity(&self) {
        println!("{}", Message::Id { name: ENGINE_NAME, author: ENGINE_AUTHOR });
        for (name, opt) in option_list() {
            println!("{}", Message::Option { name, opt });
        }
        println!("{}", Message::UciOk);
    }

    /// Block until a running search finishes, printing its `bestmove` line.
    fn join_search(&mut self) {
        if let Some(pending) = self.search.take() {
            let (best, tt, heuristics) = pending.handle.join().expect("search thread panicked");
            self.tt = Some(tt);
            self.heuristics = Some(heuristics);
            println!("{}", Message::BestMove(best));
        }
    }

    fn start_search(&mut self, opts: &[corvid::uci::parse::GoOption]) {
        self.join_search();
        let params = go_params(self.pos.side, opts);
        let time = TimeManager::new(params.time_control, self.pos.fullmove_number, params.max_nodes);

        let mut pos = self.pos.clone();
        let mut tt = self.tt.take().unwrap();
        let heuristics = self.heuristics.take().unwrap();
        let max_depth = params.max_depth;
        let search_time = time.clone();

        let handle = std::thread::spawn(move || {
            let (best, heuristics) = iterative_deepening(
                &mut pos,
                &mut tt,
                &search_time,
                heuristics,
                max_depth,
                report_iteration,
            );
            (best, tt, heuristics)
        });

        self.search = Some(PendingSearch { time, handle });
    }

    fn handle_uci(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Uci => self.send_uci_identity(),
            Command::IsReady => println!("{}", Message::ReadyOk),
            Command::SetOption { name, value } => {
                self.join_search();
                options::set_option(&name, value.as_deref(), self.tt.as_mut().unwrap(), self.heuristics.as_mut().unwrap());
            }
            Command::NewGame => {
                self.join_search();
                self.tt.as_mut().unwrap().clear();
                self.heuristics.as_mut().unwrap().clear();
                self.pos = Position::startpos();
            }
            Command::Position { fen, moves } => {
                self.join_search();
                let fen = fen.unwrap_or_else(|| corvid::position::START_FEN.to_string());
                match Position::from_fen(&fen, &StandardTables) {
                    Ok(mut pos) => {
                        for text in &moves {
                            match decode_move(&pos, text) {
                                Some(m) => {
                                    pos.make_move(m, &StandardTables);
                                }
                                None => break,
                            }
                        }
                        self.pos = pos;
                    }
                    Err(_) => println!("Invalid FEN String"),
                }
            }
            Command::Go(opts) => self.start_search(&opts),
            Command::Stop => {
                if let Some(pending) = &self.search {
                    pending.time.stop();
                }
                self.join_search();
            }
            Command::Quit => return false,
        }
        true
    }

    fn handle_repl(&mut self, line: &str) -> bool {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("uci") => {
                self.uci_mode = true;
                self.send_uci_identity();
            }
            Some("seeBoardState") => print!("{}", self.pos),
            Some("changePosition") => {
                let fen = tokens.collect::<Vec<_>>().join(" ");
                match Position::from_fen(&fen, &StandardTables) {
                    Ok(pos) => self.pos = pos,
                    Err(_) => println!("Invalid FEN String"),
                }
            }
            Some("perft") => {
                if let Some(depth) = tokens.next().and_then(|t| t.parse::<u32>().ok()) {
                    let depth = depth.min(PERFT_DEPTH_CAP);
                    println!("{}", perft(&mut self.pos, depth));
                }
            }
            Some("dividePerft") => {
                if let Some(depth) = tokens.next().and_then(|t| t.parse::<u32>().ok()) {
                    let depth = depth.min(PERFT_DEPTH_CAP);
                    for (m, count) in divide(&mut self.pos, depth) {
                        println!("{m}: {count}");
                    }
                }
            }
            Some("evaluatePosition") => println!("{}", evaluate(&self.pos)),
            Some("exit") => return false,
            _ => {}
        }
        true
    }
}

fn report_iteration(report: &IterationReport) {
    let score = if report.score.abs() >= corvid::engine::tt::MATE_THRESHOLD {
        let mate_in = (corvid::engine::tt::MATE - report.score.abs() + 1) / 2;
        EngineInfo::ScoreMate(if report.score > 0 { mate_in } else { -mate_in })
    } else {
        EngineInfo::ScoreCp(report.score)
    };
    let infos = [
        EngineInfo::Depth(report.depth),
        score,
        EngineInfo::Nodes(report.nodes),
        EngineInfo::TimeMs(report.elapsed_ms),
        EngineInfo::NodeSpeed(report.nps),
        EngineInfo::HashFull(report.hashfull),
        EngineInfo::Pv(&report.pv),
    ];
    println!("{}", Message::Info(&infos));
    let _ = io::stdout().flush();
}

fn main() {
    let mut engine = Engine::new();
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let keep_going = if engine.uci_mode {
            match parse_line(line) {
                Ok(cmd) => engine.handle_uci(cmd),
                Err(_) => true,
            }
        } else {
            engine.handle_repl(line)
        };

        if !keep_going {
            engine.join_search();
            break;
        }
        let _ = io::stdout().flush();
    }
}
