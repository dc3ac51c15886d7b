//! Time management: deciding how long a search is allowed to run, and the cooperative
//! cancellation flag the searcher polls to honor that deadline (or an explicit `stop`).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How a `go` command bounds the upcoming search. Fields mirror the UCI `go` options; at most
/// one of `move_time` or the `remaining`/`increment`/`moves_to_go` triple is meaningful at once.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeControl {
    pub move_time_ms: Option<u32>,
    pub remaining_ms: Option<u32>,
    pub increment_ms: u32,
    pub moves_to_go: Option<u8>,
    pub infinite: bool,
}

/// Owns the cancellation flag and deadline for one search. Cheaply clonable so the UCI/REPL
/// command loop can hold a handle to signal `stop` into a search running on another thread.
#[derive(Clone)]
pub struct TimeManager {
    end_search: Arc<AtomicBool>,
    deadline: Arc<std::sync::Mutex<Option<Instant>>>,
    nodes_seen: Arc<AtomicU64>,
    node_budget: Option<u64>,
    extended: Arc<AtomicBool>,
}

impl TimeManager {
    #[must_use]
    pub fn new(control: TimeControl, ply_number: u32, node_budget: Option<u64>) -> TimeManager {
        let deadline = allocate(control, ply_number);
        TimeManager {
            end_search: Arc::new(AtomicBool::new(false)),
            deadline: Arc::new(std::sync::Mutex::new(deadline)),
            nodes_seen: Arc::new(AtomicU64::new(0)),
            node_budget,
            extended: Arc::new(AtomicBool::new(false)),
        }
    }

    /// An always-on manager with no deadline and no node cap, for perft and `evaluatePosition`.
    #[must_use]
    pub fn unbounded() -> TimeManager {
        TimeManager {
            end_search: Arc::new(AtomicBool::new(false)),
            deadline: Arc::new(std::sync::Mutex::new(None)),
            nodes_seen: Arc::new(AtomicU64::new(0)),
            node_budget: None,
            extended: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Externally request the search to stop at its next poll (the UCI `stop` command).
    pub fn stop(&self) {
        self.end_search.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.end_search.load(Ordering::Relaxed)
    }

    /// Extend the deadline by 30% of the time remaining until it, once per search (used on an
    /// aspiration-window miss at depth >= 6). A no-op on subsequent calls or with no deadline.
    pub fn extend_once(&self) {
        if self.extended.swap(true, Ordering::Relaxed) {
            return;
        }
        let mut guard = self.deadline.lock().unwrap();
        if let Some(deadline) = *guard {
            let now = Instant::now();
            if deadline > now {
                *guard = Some(now + (deadline - now) * 13 / 10);
            }
        }
    }

    /// Called by the searcher every 2048 visited nodes (and on re-entry). Updates the node
    /// count, checks the node cap, and checks the wall-clock deadline.
    pub fn poll(&self, nodes_since_last_poll: u64) {
        let total = self.nodes_seen.fetch_add(nodes_since_last_poll, Ordering::Relaxed) + nodes_since_last_poll;
        if let Some(cap) = self.node_budget {
            if total >= cap {
                self.end_search.store(true, Ordering::Relaxed);
                return;
            }
        }
        if let Some(deadline) = *self.deadline.lock().unwrap() {
            if Instant::now() >= deadline {
                self.end_search.store(true, Ordering::Relaxed);
            }
        }
    }

    #[must_use]
    pub fn nodes_seen(&self) -> u64 {
        self.nodes_seen.load(Ordering::Relaxed)
    }
}

/// Compute the deadline for a search given its time control, per the allocation rule: a fixed
/// move time if given; otherwise a share of the remaining clock plus most of the increment,
/// clamped away from starving or overrunning the clock; otherwise no deadline at all.
fn allocate(control: TimeControl, ply_number: u32) -> Option<Instant> {
    if control.infinite {
        return None;
    }
    if let Some(move_time) = control.move_time_ms {
        return Some(Instant::now() + Duration::from_millis(u64::from(move_time)));
    }
    let remaining = control.remaining_ms?;

    let per_move = match control.moves_to_go {
        Some(moves_to_go) if moves_to_go > 0 => remaining / u32::from(moves_to_go),
        _ if control.increment_ms > 0 => remaining / (40u32.saturating_sub(ply_number)).max(10),
        _ => remaining / 40,
    };
    let per_move = per_move + 3 * control.increment_ms / 4;

    let per_move = if per_move >= remaining {
        remaining.saturating_sub(150)
    } else {
        per_move
    };
    let per_move = if per_move == 0 { 100 } else { per_move };

    Some(Instant::now() + Duration::from_millis(u64::from(per_move)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_move_time_sets_a_near_deadline() {
        let tm = TimeManager::new(
            TimeControl { move_time_ms: Some(50), ..Default::default() },
            0,
            None,
        );
        assert!(!tm.is_stopped());
        std::thread::sleep(Duration::from_millis(80));
        tm.poll(1);
        assert!(tm.is_stopped());
    }

    #[test]
    fn infinite_search_never_times_out_on_its_own() {
        let tm = TimeManager::new(TimeControl { infinite: true, ..Default::default() }, 0, None);
        tm.poll(1_000_000);
        assert!(!tm.is_stopped());
    }

    #[test]
    fn node_budget_stops_the_search() {
        let tm = TimeManager::new(TimeControl::default(), 0, Some(100));
        tm.poll(50);
        assert!(!tm.is_stopped());
        tm.poll(51);
        assert!(tm.is_stopped());
    }

    #[test]
    fn explicit_stop_is_observed_immediately() {
        let tm = TimeManager::unbounded();
        assert!(!tm.is_stopped());
        tm.stop();
        assert!(tm.is_stopped());
    }
}
