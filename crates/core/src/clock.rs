//! Owned, cancellable scheduled tasks on a host-driven clock.
//!
//! The scheduler never reads a real clock. The host advances it with the
//! current time (`performance.now()`, `Instant::elapsed`, or a simulated
//! value in tests) and drains due tasks in time order. Every scheduled task
//! is represented by a [`TaskHandle`]; dropping the handle cancels the task.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Shortest accepted repeat period; a zero period would never let the
/// clock move past the task.
const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

#[derive(Debug)]
struct Task {
    id: TaskId,
    due: Duration,
    period: Option<Duration>,
    cancelled: Rc<Cell<bool>>,
}

/// Owning handle for one scheduled task.
///
/// Cancelling is immediate: a task that was already due but not yet drained
/// is never returned by [`Scheduler::pop_due`] once its handle is cancelled.
#[must_use = "dropping a TaskHandle cancels the task"]
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    cancelled: Rc<Cell<bool>>,
}

impl TaskHandle {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Single-threaded timer queue.
#[derive(Debug, Default)]
pub struct Scheduler {
    now: Duration,
    next_id: u64,
    tasks: Vec<Task>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clock value, i.e. the latest time passed to
    /// [`advance_clock`](Self::advance_clock) or the due time of the most
    /// recently drained task.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Run once, `delay` from now.
    pub fn schedule_once(&mut self, delay: Duration) -> TaskHandle {
        self.insert(self.now + delay, None)
    }

    /// Run every `period`, first at `now + period`.
    pub fn schedule_repeating(&mut self, period: Duration) -> TaskHandle {
        let period = period.max(MIN_PERIOD);
        self.insert(self.now + period, Some(period))
    }

    fn insert(&mut self, due: Duration, period: Option<Duration>) -> TaskHandle {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        let cancelled = Rc::new(Cell::new(false));
        self.tasks.push(Task {
            id,
            due,
            period,
            cancelled: Rc::clone(&cancelled),
        });
        TaskHandle { id, cancelled }
    }

    /// Number of live (not cancelled) tasks.
    pub fn pending(&self) -> usize {
        self.tasks.iter().filter(|t| !t.cancelled.get()).count()
    }

    /// Due time of the earliest live task.
    pub fn next_due(&mut self) -> Option<Duration> {
        self.prune();
        self.tasks.iter().map(|t| t.due).min()
    }

    /// Take the earliest live task due at or before `deadline`.
    ///
    /// Ties are broken by scheduling order. A task that is on time runs at
    /// its due time and repeating tasks stay on their period grid. A
    /// repeating task that missed one or more whole periods (a throttled
    /// host, a late frame) runs once at `deadline` and is re-armed a period
    /// from then; the missed periods are dropped, never replayed.
    pub fn pop_due(&mut self, deadline: Duration) -> Option<TaskId> {
        self.prune();
        let idx = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= deadline)
            .min_by_key(|(_, t)| (t.due, t.id))
            .map(|(idx, _)| idx)?;

        let task = &mut self.tasks[idx];
        let id = task.id;
        match task.period {
            Some(period) if task.due + period > deadline => {
                self.now = self.now.max(task.due);
                task.due += period;
            }
            Some(period) => {
                self.now = self.now.max(deadline);
                task.due = deadline + period;
            }
            None => {
                self.now = self.now.max(task.due);
                self.tasks.swap_remove(idx);
            }
        }
        Some(id)
    }

    /// Move the clock forward to `now`. Going backwards is ignored.
    pub fn advance_clock(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    fn prune(&mut self) {
        self.tasks.retain(|t| !t.cancelled.get());
    }
}

/// Convert a host timestamp in milliseconds (e.g. `performance.now()`).
/// Negative or non-finite values map to zero.
pub fn from_millis_f64(ms: f64) -> Duration {
    Duration::try_from_secs_f64(ms / 1000.0).unwrap_or_default()
}
