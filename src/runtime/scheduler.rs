use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::foundation::core::Millis;

/// Upper bound on tasks executed by one [`Scheduler::run_until_idle`] call.
pub const MAX_IDLE_TASKS: usize = 1_000_000;

/// Handle for a pending timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

type Task = Box<dyn FnOnce()>;

#[derive(Default)]
struct SchedulerInner {
    now: Millis,
    next_id: u64,
    // Keyed by (due, id) so equal deadlines fire in insertion order.
    queue: BTreeMap<(Millis, u64), Task>,
    due_by_id: HashMap<u64, Millis>,
}

/// Cooperative, single-threaded timer queue over a virtual millisecond clock.
///
/// Nothing runs on its own: the host drives time with [`Scheduler::advance`],
/// [`Scheduler::advance_to`] or [`Scheduler::run_until_idle`]. Tasks may schedule or cancel
/// other timers while running.
#[derive(Clone, Default)]
pub struct Scheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Scheduler")
            .field("now", &inner.now)
            .field("pending", &inner.queue.len())
            .finish()
    }
}

impl Scheduler {
    /// Create a scheduler with its clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Millis {
        self.inner.borrow().now
    }

    /// Run `task` once `delay` has elapsed. A zero delay still waits for the next advance.
    pub fn set_timeout(&self, delay: Millis, task: impl FnOnce() + 'static) -> TimerId {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = inner.next_id;
        let due = inner.now.saturating_add(delay);
        inner.queue.insert((due, id), Box::new(task));
        inner.due_by_id.insert(id, due);
        TimerId(id)
    }

    /// Cancel a pending timer. Returns `false` if it already fired or was cancelled.
    pub fn clear_timeout(&self, id: TimerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(due) = inner.due_by_id.remove(&id.0) else {
            return false;
        };
        inner.queue.remove(&(due, id.0)).is_some()
    }

    /// Whether `id` is still waiting to fire.
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.inner.borrow().due_by_id.contains_key(&id.0)
    }

    /// Number of pending timers.
    pub fn pending(&self) -> usize {
        self.inner.borrow().queue.len()
    }

    /// Deadline of the earliest pending timer.
    pub fn next_due(&self) -> Option<Millis> {
        self.inner.borrow().queue.keys().next().map(|(due, _)| *due)
    }

    /// Move the clock forward by `by`, running every timer that falls due on the way.
    pub fn advance(&self, by: Millis) -> usize {
        let target = self.now().saturating_add(by);
        self.advance_to(target)
    }

    /// Move the clock to `at` (never backwards), running every timer due up to it.
    pub fn advance_to(&self, at: Millis) -> usize {
        let mut ran = 0usize;
        while let Some(task) = self.pop_due(at) {
            task();
            ran += 1;
        }
        let mut inner = self.inner.borrow_mut();
        inner.now = inner.now.max(at);
        ran
    }

    /// Run timers in deadline order until none are left.
    ///
    /// Stops after [`MAX_IDLE_TASKS`] tasks so a caller that keeps rescheduling (for example an
    /// animation retrying on an element that never attaches) cannot hang the host.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0usize;
        while ran < MAX_IDLE_TASKS {
            let Some(task) = self.pop_due(Millis(u64::MAX)) else {
                return ran;
            };
            task();
            ran += 1;
        }
        tracing::warn!(
            pending = self.pending(),
            now = %self.now(),
            "scheduler task budget exhausted before going idle"
        );
        ran
    }

    fn pop_due(&self, limit: Millis) -> Option<Task> {
        let mut inner = self.inner.borrow_mut();
        let key = *inner.queue.keys().next()?;
        if key.0 > limit {
            return None;
        }
        let task = inner.queue.remove(&key)?;
        inner.due_by_id.remove(&key.1);
        inner.now = inner.now.max(key.0);
        Some(task)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/scheduler.rs"]
mod tests;
