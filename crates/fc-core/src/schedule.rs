//! Cooperative scheduler for delayed and repeating callbacks
//!
//! The scheduler runs on a logical clock that the frame loop advances, which
//! keeps every delayed effect (typing reveal, auto-rotation, pulse animation)
//! single-threaded and cancellable. Callbacks run without the scheduler lock
//! held, so a callback may schedule new work or cancel itself.

use std::collections::BTreeMap;
use std::time::Duration;

use ahash::AHashSet;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::{CoreError, CoreResult};

type Callback = Box<dyn FnMut() + Send>;

/// Handle to a scheduled task; dropping it does not cancel the task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

struct ScheduledTask {
    label: &'static str,
    due: Duration,
    every: Option<Duration>,
    callback: Callback,
}

#[derive(Default)]
struct SchedulerInner {
    now: Duration,
    next_id: u64,
    tasks: BTreeMap<u64, ScheduledTask>,

    /// Task currently executing outside the lock
    running: Option<u64>,

    /// Repeating tasks cancelled while they were running
    cancelled_while_running: AHashSet<u64>,
}

impl SchedulerInner {
    fn insert(&mut self, task: ScheduledTask) -> TaskHandle {
        self.next_id += 1;
        let id = self.next_id;
        self.tasks.insert(id, task);
        TaskHandle(id)
    }

    /// Remove and return the earliest task due at or before `until`
    fn take_due(&mut self, until: Duration) -> Option<(u64, ScheduledTask)> {
        let id = self
            .tasks
            .iter()
            .filter(|(_, task)| task.due <= until)
            .min_by_key(|(id, task)| (task.due, **id))
            .map(|(id, _)| *id)?;
        self.tasks.remove(&id).map(|task| (id, task))
    }
}

/// Single-threaded timer driven by [`Scheduler::advance`]
pub struct Scheduler {
    inner: Mutex<SchedulerInner>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SchedulerInner::default()),
        }
    }

    /// Logical time elapsed since the scheduler was created
    pub fn now(&self) -> Duration {
        self.inner.lock().now
    }

    /// Run `callback` once after `delay`
    pub fn schedule_once<F>(&self, label: &'static str, delay: Duration, callback: F) -> TaskHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let mut callback = Some(callback);
        let mut inner = self.inner.lock();
        let due = inner.now + delay;
        let handle = inner.insert(ScheduledTask {
            label,
            due,
            every: None,
            callback: Box::new(move || {
                if let Some(callback) = callback.take() {
                    callback();
                }
            }),
        });
        trace!(task = label, id = handle.0, ?delay, "scheduled once");
        handle
    }

    /// Run `callback` every `interval` until cancelled
    pub fn schedule_repeating<F>(
        &self,
        label: &'static str,
        interval: Duration,
        callback: F,
    ) -> CoreResult<TaskHandle>
    where
        F: FnMut() + Send + 'static,
    {
        if interval.is_zero() {
            return Err(CoreError::invalid(format!("task '{label}' needs a non-zero interval")));
        }

        let mut inner = self.inner.lock();
        let due = inner.now + interval;
        let handle = inner.insert(ScheduledTask {
            label,
            due,
            every: Some(interval),
            callback: Box::new(callback),
        });
        trace!(task = label, id = handle.0, ?interval, "scheduled repeating");
        Ok(handle)
    }

    /// Cancel a task. Returns false when it already ran or was cancelled.
    pub fn cancel(&self, handle: TaskHandle) -> bool {
        let mut inner = self.inner.lock();
        if let Some(task) = inner.tasks.remove(&handle.0) {
            debug!(task = task.label, id = handle.0, "task cancelled");
            return true;
        }
        if inner.running == Some(handle.0) {
            return inner.cancelled_while_running.insert(handle.0);
        }
        false
    }

    pub fn is_scheduled(&self, handle: TaskHandle) -> bool {
        let inner = self.inner.lock();
        inner.tasks.contains_key(&handle.0)
            || (inner.running == Some(handle.0) && !inner.cancelled_while_running.contains(&handle.0))
    }

    /// Number of pending tasks
    pub fn active_count(&self) -> usize {
        self.inner.lock().tasks.len()
    }

    /// Advance the clock by `dt` and run every task that became due.
    ///
    /// Each callback observes the clock at its own due time, so work it
    /// schedules is timed from that point and may still fall inside this
    /// window. Repeating tasks that fell behind run once per missed interval.
    /// Returns the number of callbacks executed.
    pub fn advance(&self, dt: Duration) -> usize {
        let target = self.inner.lock().now + dt;

        let mut ran = 0;
        loop {
            let (id, mut task) = {
                let mut inner = self.inner.lock();
                match inner.take_due(target) {
                    Some((id, task)) => {
                        inner.now = inner.now.max(task.due);
                        inner.running = Some(id);
                        (id, task)
                    }
                    None => break,
                }
            };

            (task.callback)();
            ran += 1;

            let mut inner = self.inner.lock();
            inner.running = None;
            let cancelled = inner.cancelled_while_running.remove(&id);
            if let Some(every) = task.every {
                if !cancelled {
                    task.due += every;
                    inner.tasks.insert(id, task);
                }
            }
        }
        self.inner.lock().now = target;
        ran
    }

    /// Drop every pending task
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        let dropped = inner.tasks.len();
        inner.tasks.clear();
        if let Some(running) = inner.running {
            inner.cancelled_while_running.insert(running);
        }
        debug!(dropped, "scheduler cleared");
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, impl FnMut() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = count.clone();
        (count, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_once_runs_after_delay() {
        let scheduler = Scheduler::new();
        let (count, mut tick) = counter();
        scheduler.schedule_once("once", Duration::from_millis(100), move || tick());

        assert_eq!(scheduler.advance(Duration::from_millis(99)), 0);
        assert_eq!(scheduler.advance(Duration::from_millis(1)), 1);
        assert_eq!(scheduler.advance(Duration::from_secs(1)), 0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.active_count(), 0);
    }

    #[test]
    fn test_repeating_catches_up_and_cancels() {
        let scheduler = Scheduler::new();
        let (count, tick) = counter();
        let handle = scheduler
            .schedule_repeating("repeat", Duration::from_millis(10), tick)
            .unwrap();

        scheduler.advance(Duration::from_millis(35));
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(scheduler.is_scheduled(handle));

        assert!(scheduler.cancel(handle));
        assert!(!scheduler.cancel(handle));
        scheduler.advance(Duration::from_millis(100));
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(scheduler.active_count(), 0);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let scheduler = Scheduler::new();
        let result = scheduler.schedule_repeating("spin", Duration::ZERO, || {});
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn test_task_can_cancel_itself() {
        let scheduler = Arc::new(Scheduler::new());
        let handle_slot = Arc::new(parking_lot::Mutex::new(None::<TaskHandle>));
        let runs = Arc::new(AtomicUsize::new(0));

        let handle = {
            let scheduler_ref = Arc::downgrade(&scheduler);
            let handle_slot = handle_slot.clone();
            let runs = runs.clone();
            scheduler
                .schedule_repeating("self-cancel", Duration::from_millis(5), move || {
                    if runs.fetch_add(1, Ordering::SeqCst) == 1 {
                        if let (Some(s), Some(h)) = (scheduler_ref.upgrade(), *handle_slot.lock()) {
                            assert!(s.cancel(h));
                        }
                    }
                })
                .unwrap()
        };
        *handle_slot.lock() = Some(handle);

        scheduler.advance(Duration::from_millis(50));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert!(!scheduler.is_scheduled(handle));
    }

    #[test]
    fn test_callbacks_may_schedule_more_work() {
        let scheduler = Arc::new(Scheduler::new());
        let (count, mut tick) = counter();
        let weak = Arc::downgrade(&scheduler);
        scheduler.schedule_once("outer", Duration::from_millis(1), move || {
            if let Some(s) = weak.upgrade() {
                s.schedule_once("inner", Duration::from_millis(1), move || tick());
            }
        });

        scheduler.advance(Duration::from_millis(1));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        scheduler.advance(Duration::from_millis(1));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_chained_task_is_timed_from_its_parent() {
        let scheduler = Arc::new(Scheduler::new());
        let fired_at = Arc::new(parking_lot::Mutex::new(None::<Duration>));
        let weak = Arc::downgrade(&scheduler);
        let slot = fired_at.clone();
        scheduler.schedule_once("thinking", Duration::from_millis(100), move || {
            if let Some(s) = weak.upgrade() {
                let clock = Arc::downgrade(&s);
                s.schedule_once("typing", Duration::from_millis(10), move || {
                    *slot.lock() = clock.upgrade().map(|c| c.now());
                });
            }
        });

        assert_eq!(scheduler.advance(Duration::from_millis(120)), 2);
        assert_eq!(*fired_at.lock(), Some(Duration::from_millis(110)));
        assert_eq!(scheduler.now(), Duration::from_millis(120));
        assert_eq!(scheduler.active_count(), 0);
    }

    #[test]
    fn test_clear_drops_everything() {
        let scheduler = Scheduler::new();
        scheduler.schedule_once("a", Duration::from_millis(1), || {});
        scheduler.schedule_repeating("b", Duration::from_millis(1), || {}).unwrap();
        scheduler.clear();
        assert_eq!(scheduler.active_count(), 0);
        assert_eq!(scheduler.advance(Duration::from_secs(1)), 0);
    }
}
