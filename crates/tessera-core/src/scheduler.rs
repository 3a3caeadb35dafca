// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Deferred callbacks.
//!
//! Transitions and other timed behaviour are written against the
//! [`Scheduler`] contract: "run this after a delay, give me a handle to cancel
//! it". [`TaskQueue`] is the single implementation; it is pumped once per
//! frame by the application loop and reads time from a [`Clock`].

use crate::utils::timer::Stopwatch;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Monotonic time source.
pub trait Clock {
    /// Time elapsed since the clock's origin. Never decreases.
    fn now(&self) -> Duration;
}

/// Wall-clock time measured from construction.
#[derive(Debug, Default)]
pub struct SystemClock {
    stopwatch: Stopwatch,
}

impl SystemClock {
    /// Starts a new clock at zero.
    pub fn new() -> Self {
        Self {
            stopwatch: Stopwatch::new(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.stopwatch.elapsed().unwrap_or_default()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    /// Creates a clock reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        self.now.set(self.now.get() + delta);
    }

    /// Moves the clock to `now`. Earlier values are ignored.
    pub fn set(&self, now: Duration) {
        if now > self.now.get() {
            self.now.set(now);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Identifies a scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

/// Contract for deferred execution.
pub trait Scheduler {
    /// Current time on the scheduler's clock.
    fn now(&self) -> Duration;

    /// Runs `callback` once, no earlier than `delay` from now.
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TaskHandle;

    /// Prevents `handle` from firing. Returns `false` if it already fired or
    /// was already cancelled.
    fn cancel(&self, handle: &TaskHandle) -> bool;

    /// Delay to pass to [`Scheduler::schedule`] to run on the next frame.
    fn frame_delay(&self) -> Duration;
}

/// How the queue is driven.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FrameMode {
    /// Pumped once per rendered frame; a zero delay means "next frame".
    #[default]
    Frames,
    /// No frame callback available: per-frame work is spaced by a fixed
    /// interval instead.
    Interval(Duration),
}

struct Task {
    id: u64,
    due: Duration,
    armed_at_pump: u64,
    callback: Box<dyn FnOnce()>,
}

/// Single-threaded timer queue.
///
/// Nothing runs until [`TaskQueue::pump`] is called. A callback scheduled
/// while the queue is being pumped never runs in that same pump, even with a
/// zero delay, so per-frame animation loops advance exactly one step per
/// frame.
pub struct TaskQueue {
    clock: Rc<dyn Clock>,
    mode: FrameMode,
    next_id: Cell<u64>,
    pump_generation: Cell<u64>,
    tasks: RefCell<Vec<Task>>,
    fired: Cell<u64>,
}

impl TaskQueue {
    /// Creates a queue reading time from `clock`.
    pub fn new(clock: Rc<dyn Clock>, mode: FrameMode) -> Self {
        Self {
            clock,
            mode,
            next_id: Cell::new(0),
            pump_generation: Cell::new(0),
            tasks: RefCell::new(Vec::new()),
            fired: Cell::new(0),
        }
    }

    /// A frame-driven queue on the system clock.
    pub fn with_system_clock() -> Self {
        Self::new(Rc::new(SystemClock::new()), FrameMode::Frames)
    }

    /// The queue's frame mode.
    pub fn mode(&self) -> FrameMode {
        self.mode
    }

    /// Runs every callback that is due and was scheduled before this call.
    ///
    /// Callbacks run one at a time with no internal borrow held, so they may
    /// schedule or cancel freely. Returns how many ran.
    pub fn pump(&self) -> usize {
        let generation = self.pump_generation.get() + 1;
        self.pump_generation.set(generation);
        let now = self.clock.now();

        let mut ran = 0;
        while let Some(task) = self.take_next_due(now, generation) {
            (task.callback)();
            self.fired.set(self.fired.get() + 1);
            ran += 1;
        }
        if ran > 0 {
            log::trace!("TaskQueue: pump {generation} ran {ran} task(s)");
        }
        ran
    }

    /// Number of callbacks waiting to fire.
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Total number of callbacks that have fired.
    pub fn fired(&self) -> u64 {
        self.fired.get()
    }

    /// Drops every pending callback without running it.
    pub fn clear(&self) {
        let dropped = std::mem::take(&mut *self.tasks.borrow_mut());
        if !dropped.is_empty() {
            log::debug!("TaskQueue: dropped {} pending task(s)", dropped.len());
        }
    }

    fn take_next_due(&self, now: Duration, generation: u64) -> Option<Task> {
        let mut tasks = self.tasks.borrow_mut();
        let index = tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| task.due <= now && task.armed_at_pump < generation)
            .min_by_key(|(_, task)| (task.due, task.id))
            .map(|(index, _)| index)?;
        Some(tasks.remove(index))
    }
}

impl Scheduler for TaskQueue {
    fn now(&self) -> Duration {
        self.clock.now()
    }

    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TaskHandle {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.tasks.borrow_mut().push(Task {
            id,
            due: self.clock.now() + delay,
            armed_at_pump: self.pump_generation.get(),
            callback,
        });
        TaskHandle(id)
    }

    fn cancel(&self, handle: &TaskHandle) -> bool {
        let removed = {
            let mut tasks = self.tasks.borrow_mut();
            tasks
                .iter()
                .position(|task| task.id == handle.0)
                .map(|index| tasks.remove(index))
        };
        // The callback is dropped outside the borrow; its captures may own
        // things whose destructors touch this queue.
        removed.is_some()
    }

    fn frame_delay(&self) -> Duration {
        match self.mode {
            FrameMode::Frames => Duration::ZERO,
            FrameMode::Interval(interval) => interval,
        }
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("mode", &self.mode)
            .field("pending", &self.pending())
            .field("fired", &self.fired.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual_queue(mode: FrameMode) -> (Rc<ManualClock>, TaskQueue) {
        let clock = Rc::new(ManualClock::new());
        let queue = TaskQueue::new(clock.clone(), mode);
        (clock, queue)
    }

    fn record(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> Box<dyn FnOnce()> {
        let log = log.clone();
        Box::new(move || log.borrow_mut().push(name))
    }

    #[test]
    fn manual_clock_never_goes_backwards() {
        let clock = ManualClock::new();
        clock.advance(Duration::from_millis(100));
        clock.set(Duration::from_millis(50));
        assert_eq!(clock.now(), Duration::from_millis(100));
    }

    #[test]
    fn tasks_fire_only_once_due() {
        let (clock, queue) = manual_queue(FrameMode::Frames);
        let log = Rc::new(RefCell::new(Vec::new()));
        queue.schedule(Duration::from_millis(250), record(&log, "late"));

        clock.advance(Duration::from_millis(249));
        assert_eq!(queue.pump(), 0);
        clock.advance(Duration::from_millis(1));
        assert_eq!(queue.pump(), 1);
        assert_eq!(*log.borrow(), vec!["late"]);
        assert_eq!(queue.fired(), 1);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn due_tasks_run_in_due_then_schedule_order() {
        let (clock, queue) = manual_queue(FrameMode::Frames);
        let log = Rc::new(RefCell::new(Vec::new()));
        queue.schedule(Duration::from_millis(20), record(&log, "b"));
        queue.schedule(Duration::from_millis(10), record(&log, "a"));
        queue.schedule(Duration::from_millis(20), record(&log, "c"));

        clock.advance(Duration::from_millis(30));
        queue.pump();
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn cancel_is_idempotent() {
        let (clock, queue) = manual_queue(FrameMode::Frames);
        let log = Rc::new(RefCell::new(Vec::new()));
        let handle = queue.schedule(Duration::ZERO, record(&log, "cancelled"));

        assert!(queue.cancel(&handle));
        assert!(!queue.cancel(&handle));
        clock.advance(Duration::from_millis(1));
        queue.pump();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn zero_delay_reschedule_waits_for_next_pump() {
        let (_clock, queue) = manual_queue(FrameMode::Frames);
        let queue = Rc::new(queue);
        let count = Rc::new(Cell::new(0));

        fn tick(queue: Rc<TaskQueue>, count: Rc<Cell<u32>>) {
            count.set(count.get() + 1);
            let next_queue = queue.clone();
            queue.schedule(
                queue.frame_delay(),
                Box::new(move || tick(next_queue, count)),
            );
        }

        let first_queue = queue.clone();
        let first_count = count.clone();
        queue.schedule(
            Duration::ZERO,
            Box::new(move || tick(first_queue, first_count)),
        );

        queue.pump();
        assert_eq!(count.get(), 1);
        queue.pump();
        assert_eq!(count.get(), 2);
        assert_eq!(queue.pending(), 1);
        queue.clear();
    }

    #[test]
    fn callback_can_cancel_a_later_task_in_the_same_pump() {
        let (clock, queue) = manual_queue(FrameMode::Frames);
        let queue = Rc::new(queue);
        let log = Rc::new(RefCell::new(Vec::new()));

        let victim = queue.schedule(Duration::from_millis(5), record(&log, "victim"));
        let canceller_queue = queue.clone();
        let canceller_log = log.clone();
        queue.schedule(
            Duration::from_millis(1),
            Box::new(move || {
                canceller_log.borrow_mut().push("canceller");
                canceller_queue.cancel(&victim);
            }),
        );

        clock.advance(Duration::from_millis(10));
        queue.pump();
        assert_eq!(*log.borrow(), vec!["canceller"]);
    }

    #[test]
    fn frame_delay_follows_mode() {
        let (_clock, frames) = manual_queue(FrameMode::Frames);
        assert_eq!(frames.frame_delay(), Duration::ZERO);
        let (_clock, interval) = manual_queue(FrameMode::Interval(Duration::from_millis(16)));
        assert_eq!(interval.frame_delay(), Duration::from_millis(16));
    }
}
