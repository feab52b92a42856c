//! Single-threaded timers over a host clock
//!
//! The owner polls with the current time and dispatches whatever came due.
//! Cancelled ids never fire again, and ids are never reused, so a handle
//! kept past its cancel can always be recognised as stale.

/// Handle to a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Shortest period a repeating timer may have (seconds)
const MIN_PERIOD: f64 = 1.0e-3;

#[derive(Debug, Clone, Copy)]
struct Entry<A> {
    id: TimerId,
    due: f64,
    /// `Some(period)` for repeating timers
    period: Option<f64>,
    action: A,
}

/// Timer queue carrying an action of type `A` per timer
#[derive(Debug, Clone)]
pub struct Timers<A> {
    entries: Vec<Entry<A>>,
    next_id: u64,
}

impl<A> Default for Timers<A> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }
}

impl<A: Copy> Timers<A> {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Fire `action` once, `delay` seconds after `now`
    pub fn schedule_once(&mut self, now: f64, delay: f64, action: A) -> TimerId {
        let id = self.allocate_id();
        self.entries.push(Entry {
            id,
            due: now + delay.max(0.0),
            period: None,
            action,
        });
        id
    }

    /// Fire `action` every `period` seconds, first at `now + period`
    pub fn schedule_repeating(&mut self, now: f64, period: f64, action: A) -> TimerId {
        let period = period.max(MIN_PERIOD);
        let id = self.allocate_id();
        self.entries.push(Entry {
            id,
            due: now + period,
            period: Some(period),
            action,
        });
        id
    }

    /// Cancel a timer. Returns false if it already fired (one-shot) or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    pub fn is_live(&self, id: TimerId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Number of timers that can still fire
    pub fn live_count(&self) -> usize {
        self.entries.len()
    }

    /// Take the earliest timer due at or before `now`
    ///
    /// One-shot timers are removed. Repeating timers are moved to their
    /// next period after `now`; periods skipped by a clock jump collapse
    /// into this single fire.
    pub fn pop_due(&mut self, now: f64) -> Option<(TimerId, A)> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= now)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.id.cmp(&b.id)))
            .map(|(i, _)| i)?;

        let entry = self.entries[idx];
        match entry.period {
            Some(period) => {
                let mut due = entry.due + period;
                if due <= now {
                    let skipped = ((now - due) / period).floor() + 1.0;
                    due += skipped * period;
                }
                self.entries[idx].due = due;
            }
            None => {
                self.entries.swap_remove(idx);
            }
        }
        Some((entry.id, entry.action))
    }
}
