//! The Universal Chess Interface: command parsing, outbound message formatting, and the glue
//! that turns a `go` command's options into a [`TimeControl`](crate::engine::time::TimeControl).

pub mod parse;
pub mod send;

use crate::color::Color;
use crate::engine::options;
use crate::engine::time::TimeControl;
use parse::GoOption;

/// The engine options advertised in response to `uci`, in display order.
#[must_use]
pub fn option_list() -> Vec<(&'static str, send::OptionType)> {
    vec![
        (
            options::HASH_SIZE_OPTION,
            send::OptionType::Spin {
                default: options::DEFAULT_HASH_MB as i64,
                min: options::MIN_HASH_MB as i64,
                max: options::MAX_HASH_MB as i64,
            },
        ),
        (options::CLEAR_TT_OPTION, send::OptionType::Button),
        (options::CLEAR_KILLERS_OPTION, send::OptionType::Button),
        (options::CLEAR_COUNTERS_OPTION, send::OptionType::Button),
        (options::CLEAR_HISTORY_OPTION, send::OptionType::Button),
    ]
}

/// What a `go` command asked for, decoded from the side-to-move's point of view.
pub struct GoParams {
    pub time_control: TimeControl,
    pub max_depth: u32,
    pub max_nodes: Option<u64>,
}

const DEFAULT_MAX_DEPTH: u32 = 64;

#[must_use]
pub fn go_params(side: Color, opts: &[GoOption]) -> GoParams {
    let mut control = TimeControl::default();
    let mut max_depth = DEFAULT_MAX_DEPTH;
    let mut max_nodes = None;

    let (mut own_time, mut own_inc) = (None, 0u32);
    for opt in opts {
        match *opt {
            GoOption::WhiteTime(ms) if side == Color::White => own_time = Some(ms.max(0) as u32),
            GoOption::BlackTime(ms) if side == Color::Black => own_time = Some(ms.max(0) as u32),
            GoOption::WhiteInc(ms) if side == Color::White => own_inc = ms,
            GoOption::BlackInc(ms) if side == Color::Black => own_inc = ms,
            GoOption::MovesToGo(n) => control.moves_to_go = Some(n),
            GoOption::Depth(d) => max_depth = d,
            GoOption::Nodes(n) => max_nodes = Some(n),
            GoOption::MoveTime(ms) => control.move_time_ms = Some(ms),
            GoOption::Infinite => control.infinite = true,
            _ => {}
        }
    }
    control.remaining_ms = own_time;
    control.increment_ms = own_inc;

    GoParams { time_control: control, max_depth, max_nodes }
}
