//! Per-cell debounce and write coalescing.
//!
//! Each cell key moves through an explicit state machine:
//!
//! ```text
//! (absent) --edit--> Debouncing --deadline--> Sending --complete--> (absent)
//!     ^                  |  ^                    |
//!     |                  \--/ edit restarts      | edit sets `queued`;
//!     |                       the window         | completion re-enters
//!     \----------------------------------------- Debouncing
//! ```
//!
//! A burst of edits to one cell collapses into a single outbound write
//! carrying the latest value at fire time. At most one write per key
//! is ever in flight; an edit landing while a write is outstanding is
//! queued and re-debounced once the write resolves, never dropped.
//! Keys are independent: debounce windows and in-flight writes for
//! different cells do not interact.
//!
//! The coalescer never looks at a wall clock. Callers pass `Instant`s
//! into every method, which keeps the whole state machine
//! deterministic under test and lets the host event loop own
//! scheduling (`next_deadline` says when to wake up).

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use log::debug;
use rustc_hash::FxHashMap;
use statgrid_engine::cell::Cell;
use statgrid_engine::store::{CellKey, CellStore};

/// Debounce window for the single-sheet grid.
pub const GRID_DEBOUNCE: Duration = Duration::from_millis(500);

/// Debounce window for the multi-worksheet grid. Longer, because a
/// duplicate submission is costlier there.
pub const WORKBOOK_DEBOUNCE: Duration = Duration::from_millis(800);

#[derive(Debug, Clone)]
enum KeyState {
    /// Waiting out the quiet period. `baseline` is the settled value
    /// the cell held before the current burst of edits, kept for
    /// rollback.
    Debouncing {
        deadline: Instant,
        baseline: Option<Cell>,
    },
    /// A write is in flight. `sent` is the value it carries; `queued`
    /// marks that the cell was edited again while waiting and a new
    /// cycle must start once this write resolves.
    Sending {
        baseline: Option<Cell>,
        sent: Option<Cell>,
        queued: bool,
    },
}

/// A write the caller must now issue. `cell` is `None` when the cell
/// was cleared.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingWrite {
    pub key: CellKey,
    pub cell: Option<Cell>,
}

/// What to do after a write for a key resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Success, nothing else pending for the key.
    Settled,
    /// A queued edit re-entered the debounce window; expect another
    /// write for this key later.
    Requeued,
    /// Failure: restore the store entry at the key to this value
    /// (`None` = clear it).
    RolledBack(Option<Cell>),
    /// Completion for a key this coalescer is not tracking (state was
    /// torn down in the meantime). Ignore.
    Stale,
}

/// Per-worksheet edit coalescer. All pending timers die with the
/// instance, so dropping it on worksheet teardown is the cancellation
/// path.
#[derive(Debug)]
pub struct EditCoalescer {
    delay: Duration,
    states: FxHashMap<CellKey, KeyState>,
    /// Min-heap of (deadline, key). Entries are not removed when a
    /// window restarts; stale ones are skipped on pop by comparing
    /// against the deadline recorded in the key's state.
    deadlines: BinaryHeap<Reverse<(Instant, CellKey)>>,
}

impl EditCoalescer {
    pub fn new(delay: Duration) -> Self {
        EditCoalescer {
            delay,
            states: FxHashMap::default(),
            deadlines: BinaryHeap::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record an edit to `key`. `prior` is the store value immediately
    /// before this edit; it is only retained when the key was idle, so
    /// the rollback target of a burst is the last settled value.
    pub fn record_edit(&mut self, key: CellKey, prior: Option<Cell>, now: Instant) {
        match self.states.get_mut(&key) {
            None => {
                let deadline = now + self.delay;
                self.states.insert(
                    key,
                    KeyState::Debouncing {
                        deadline,
                        baseline: prior,
                    },
                );
                self.deadlines.push(Reverse((deadline, key)));
            }
            Some(KeyState::Debouncing { deadline, .. }) => {
                // Restart the window; the old heap entry goes stale.
                *deadline = now + self.delay;
                let deadline = *deadline;
                self.deadlines.push(Reverse((deadline, key)));
            }
            Some(KeyState::Sending { queued, .. }) => {
                debug!("edit to in-flight cell {:?} queued", key);
                *queued = true;
            }
        }
    }

    /// Collect every key whose debounce window has elapsed and move it
    /// to `Sending`. The returned writes carry the latest store value
    /// at fire time, not the value seen when the window started.
    pub fn take_due(&mut self, now: Instant, store: &CellStore) -> Vec<PendingWrite> {
        let mut due = Vec::new();
        while let Some(&Reverse((deadline, key))) = self.deadlines.peek() {
            if deadline > now {
                break;
            }
            self.deadlines.pop();

            let fire = match self.states.get(&key) {
                Some(KeyState::Debouncing { deadline: d, .. }) => *d == deadline,
                // Already sending or torn down: this heap entry is
                // stale. A key in `Sending` never fires a second
                // concurrent write.
                _ => false,
            };
            if !fire {
                continue;
            }

            if let Some(KeyState::Debouncing { baseline, .. }) = self.states.remove(&key) {
                let cell = store.get(key.0, key.1).cloned();
                self.states.insert(
                    key,
                    KeyState::Sending {
                        baseline,
                        sent: cell.clone(),
                        queued: false,
                    },
                );
                due.push(PendingWrite { key, cell });
            }
        }
        due
    }

    /// Resolve the in-flight write for `key`.
    ///
    /// On success, the sent value becomes the new rollback baseline
    /// for any queued follow-up. On failure with nothing queued, the
    /// caller must restore the returned baseline; with a queued edit
    /// the newer optimistic value stays visible and the original
    /// baseline is retained for the retry.
    pub fn complete(&mut self, key: CellKey, success: bool, now: Instant) -> Completion {
        let state = match self.states.remove(&key) {
            Some(state) => state,
            None => return Completion::Stale,
        };

        let (baseline, sent, queued) = match state {
            KeyState::Sending {
                baseline,
                sent,
                queued,
            } => (baseline, sent, queued),
            other => {
                // Not in flight; a reset raced this completion.
                self.states.insert(key, other);
                return Completion::Stale;
            }
        };

        if queued {
            let deadline = now + self.delay;
            let baseline = if success { sent } else { baseline };
            self.states.insert(
                key,
                KeyState::Debouncing { deadline, baseline },
            );
            self.deadlines.push(Reverse((deadline, key)));
            return Completion::Requeued;
        }

        if success {
            Completion::Settled
        } else {
            debug!("write for cell {:?} failed, rolling back", key);
            Completion::RolledBack(baseline)
        }
    }

    /// True while any key is debouncing or in flight; drives the
    /// unsaved-changes indicator.
    pub fn has_pending(&self) -> bool {
        !self.states.is_empty()
    }

    pub fn pending_keys(&self) -> Vec<CellKey> {
        let mut keys: Vec<_> = self.states.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    pub fn is_in_flight(&self, key: CellKey) -> bool {
        matches!(self.states.get(&key), Some(KeyState::Sending { .. }))
    }

    /// Earliest deadline still pending, for host wakeup scheduling.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.states
            .values()
            .filter_map(|state| match state {
                KeyState::Debouncing { deadline, .. } => Some(*deadline),
                KeyState::Sending { .. } => None,
            })
            .min()
    }

    /// Drop all pending windows and in-flight tracking. Completions
    /// arriving afterwards report `Stale`.
    pub fn reset(&mut self) {
        self.states.clear();
        self.deadlines.clear();
    }
}
