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

//! Enter/exit animations for screen-capable views.
//!
//! A [`TransitionRunner`] drives at most one animation at a time against a
//! [`DisplayNode`]. Animations are chains of callbacks on a [`Scheduler`];
//! starting a new one, or destroying the view, cancels the pending callback
//! and bumps a generation counter so a callback that slipped through is a
//! no-op.

use crate::node::{DisplayNode, NodeRef};
use crate::view::ExitStatus;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;
use tessera_core::{Scheduler, TaskHandle};

/// Visual effect applied when a screen enters or exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    /// No effect on enter or exit.
    None,
    /// Hard cut, optionally delayed.
    Instant,
    /// Opacity ramp from transparent to opaque.
    Fade,
    /// Enters from the left, exits to the right.
    SlideInLeft,
    /// Enters from the right, exits to the left.
    SlideInRight,
    /// Enters from above, exits downwards.
    SlideInUp,
    /// Enters from below, exits upwards.
    SlideInDown,
}

impl TransitionKind {
    /// Unit offsets `(enter, exit)` of a slide, in viewport extents.
    fn slide_deltas(self) -> Option<((f32, f32), (f32, f32))> {
        match self {
            TransitionKind::SlideInLeft => Some(((-1.0, 0.0), (1.0, 0.0))),
            TransitionKind::SlideInRight => Some(((1.0, 0.0), (-1.0, 0.0))),
            TransitionKind::SlideInDown => Some(((0.0, 1.0), (0.0, -1.0))),
            TransitionKind::SlideInUp => Some(((0.0, -1.0), (0.0, 1.0))),
            TransitionKind::None | TransitionKind::Instant | TransitionKind::Fade => None,
        }
    }
}

/// A transition kind with its duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transition {
    /// The effect.
    pub kind: TransitionKind,
    /// How long the effect lasts.
    pub duration: Duration,
}

impl Transition {
    /// A transition of `kind` lasting `duration`.
    pub const fn new(kind: TransitionKind, duration: Duration) -> Self {
        Self { kind, duration }
    }

    /// A transition of `kind` lasting `millis` milliseconds.
    pub const fn from_millis(kind: TransitionKind, millis: u64) -> Self {
        Self::new(kind, Duration::from_millis(millis))
    }

    /// An immediate hard cut.
    pub const fn instant() -> Self {
        Self::new(TransitionKind::Instant, Duration::ZERO)
    }

    /// A fade lasting `duration`.
    pub const fn fade(duration: Duration) -> Self {
        Self::new(TransitionKind::Fade, duration)
    }
}

impl Default for Transition {
    fn default() -> Self {
        Self::instant()
    }
}

/// Where a runner is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    /// Nothing in flight.
    Idle,
    /// An enter animation is in flight.
    Entering,
    /// An exit is in flight; the view is destroyed when it ends.
    Exiting,
    /// The view was destroyed. Terminal.
    Destroyed,
}

struct PendingTask {
    scheduler: Weak<dyn Scheduler>,
    handle: TaskHandle,
}

struct RunnerState {
    phase: TransitionPhase,
    generation: u64,
    pending: Option<PendingTask>,
    origin: Option<(f32, f32)>,
}

/// Per-view transition state machine.
///
/// `Idle -> Entering -> Idle` or `Idle -> Exiting -> Destroyed`.
pub struct TransitionRunner {
    state: Rc<RefCell<RunnerState>>,
}

type TickFn = Box<dyn Fn(&mut DisplayNode, f32)>;
type DoneFn = Box<dyn FnOnce()>;

impl TransitionRunner {
    /// An idle runner.
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(RunnerState {
                phase: TransitionPhase::Idle,
                generation: 0,
                pending: None,
                origin: None,
            })),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> TransitionPhase {
        self.state.borrow().phase
    }

    /// Returns `true` while a scheduled callback is outstanding.
    pub fn has_pending(&self) -> bool {
        self.state.borrow().pending.is_some()
    }

    /// Cancels the outstanding callback, if any. Safe to call repeatedly.
    pub fn cancel(&self) {
        let pending = {
            let mut state = self.state.borrow_mut();
            state.generation += 1;
            state.pending.take()
        };
        if let Some(pending) = pending {
            if let Some(scheduler) = pending.scheduler.upgrade() {
                scheduler.cancel(&pending.handle);
            }
        }
    }

    /// Cancels everything and enters the terminal phase.
    pub fn mark_destroyed(&self) {
        self.cancel();
        self.state.borrow_mut().phase = TransitionPhase::Destroyed;
    }

    /// Plays the enter half of `transition` on `node`.
    ///
    /// Without a scheduler every effect completes synchronously.
    pub fn enter(
        &self,
        transition: &Transition,
        scheduler: Option<&Rc<dyn Scheduler>>,
        node: &NodeRef,
        viewport: (f32, f32),
    ) {
        if !self.begin(TransitionPhase::Entering) {
            return;
        }
        let duration = transition.duration;
        log::debug!("Transition: enter {:?} over {duration:?}", transition.kind);

        match transition.kind {
            TransitionKind::None => self.finish_phase(),
            TransitionKind::Instant => {
                if duration.is_zero() {
                    self.finish_phase();
                    return;
                }
                node.borrow_mut().visible = false;
                self.run(
                    scheduler,
                    node,
                    duration,
                    duration,
                    Box::new(|node: &mut DisplayNode, t: f32| {
                        if t >= 1.0 {
                            node.visible = true;
                        }
                    }),
                    Box::new(|| {}),
                );
            }
            TransitionKind::Fade => {
                {
                    let mut node = node.borrow_mut();
                    node.visible = true;
                    node.alpha = 0.0;
                }
                let first = scheduler.map(|s| s.frame_delay()).unwrap_or_default();
                self.run(
                    scheduler,
                    node,
                    duration,
                    first,
                    Box::new(|node: &mut DisplayNode, t: f32| {
                        node.alpha = if t >= 1.0 { 1.0 } else { t };
                    }),
                    Box::new(|| {}),
                );
            }
            kind => {
                let Some(((dx, dy), _)) = kind.slide_deltas() else {
                    self.finish_phase();
                    return;
                };
                let (base_x, base_y) = self.slide_setup(node, viewport);
                let (w, h) = viewport;
                {
                    let mut node = node.borrow_mut();
                    node.visible = true;
                    node.alpha = 1.0;
                    node.x = base_x + dx * w;
                    node.y = base_y + dy * h;
                }
                let first = scheduler.map(|s| s.frame_delay()).unwrap_or_default();
                self.run(
                    scheduler,
                    node,
                    duration,
                    first,
                    Box::new(move |node: &mut DisplayNode, t: f32| {
                        if t >= 1.0 {
                            node.x = base_x;
                            node.y = base_y;
                        } else {
                            let inv = 1.0 - t;
                            node.x = base_x + dx * w * inv;
                            node.y = base_y + dy * h * inv;
                        }
                    }),
                    Box::new(|| {}),
                );
            }
        }
    }

    /// Plays the exit half of `transition` on `node`.
    ///
    /// Returns [`ExitStatus::Finished`] when the exit completed synchronously;
    /// the caller then destroys the view. Otherwise `on_finished` runs when
    /// the animation ends and is expected to destroy the view.
    pub fn exit(
        &self,
        transition: &Transition,
        scheduler: Option<&Rc<dyn Scheduler>>,
        node: &NodeRef,
        viewport: (f32, f32),
        on_finished: Box<dyn FnOnce()>,
    ) -> ExitStatus {
        if !self.begin(TransitionPhase::Exiting) {
            return ExitStatus::Finished;
        }
        let duration = transition.duration;
        log::debug!("Transition: exit {:?} over {duration:?}", transition.kind);

        let synchronous = duration.is_zero() || scheduler.is_none();
        match transition.kind {
            TransitionKind::None => {
                // Nothing to play; the screen lingers until force-destroyed.
                self.state.borrow_mut().phase = TransitionPhase::Idle;
                ExitStatus::Pending
            }
            TransitionKind::Instant | TransitionKind::Fade => {
                if synchronous {
                    return ExitStatus::Finished;
                }
                self.run(
                    scheduler,
                    node,
                    duration,
                    duration,
                    Box::new(|_: &mut DisplayNode, _: f32| {}),
                    on_finished,
                );
                ExitStatus::Pending
            }
            kind => {
                let Some((_, (dx, dy))) = kind.slide_deltas() else {
                    return ExitStatus::Finished;
                };
                let (base_x, base_y) = self.slide_setup(node, viewport);
                let (w, h) = viewport;
                if synchronous {
                    let mut node = node.borrow_mut();
                    node.x = base_x + dx * w;
                    node.y = base_y + dy * h;
                    return ExitStatus::Finished;
                }
                let first = scheduler.map(|s| s.frame_delay()).unwrap_or_default();
                self.run(
                    scheduler,
                    node,
                    duration,
                    first,
                    Box::new(move |node: &mut DisplayNode, t: f32| {
                        node.x = base_x + dx * w * t;
                        node.y = base_y + dy * h * t;
                    }),
                    on_finished,
                );
                ExitStatus::Pending
            }
        }
    }

    /// Cancels whatever is in flight and moves to `phase`. Returns `false`
    /// once destroyed.
    fn begin(&self, phase: TransitionPhase) -> bool {
        if self.phase() == TransitionPhase::Destroyed {
            return false;
        }
        self.cancel();
        self.state.borrow_mut().phase = phase;
        true
    }

    fn finish_phase(&self) {
        let mut state = self.state.borrow_mut();
        if state.phase == TransitionPhase::Entering {
            state.phase = TransitionPhase::Idle;
        }
    }

    /// Records the natural position on first use and sizes the clip mask.
    fn slide_setup(&self, node: &NodeRef, (w, h): (f32, f32)) -> (f32, f32) {
        let mut node = node.borrow_mut();
        node.clip = Some((w.floor().max(1.0), h.floor().max(1.0)));
        *self
            .state
            .borrow_mut()
            .origin
            .get_or_insert((node.x, node.y))
    }

    fn run(
        &self,
        scheduler: Option<&Rc<dyn Scheduler>>,
        node: &NodeRef,
        duration: Duration,
        first_delay: Duration,
        on_tick: TickFn,
        on_done: DoneFn,
    ) {
        let scheduler = match scheduler {
            Some(scheduler) if !duration.is_zero() => scheduler,
            _ => {
                on_tick(&mut node.borrow_mut(), 1.0);
                self.finish_phase();
                on_done();
                return;
            }
        };

        let tween = Tween {
            state: Rc::downgrade(&self.state),
            scheduler: Rc::downgrade(scheduler),
            generation: self.state.borrow().generation,
            start: scheduler.now(),
            duration,
            node: node.clone(),
            on_tick,
            on_done,
        };
        tween.schedule(first_delay);
    }
}

impl Default for TransitionRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TransitionRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("TransitionRunner")
            .field("phase", &state.phase)
            .field("pending", &state.pending.is_some())
            .finish()
    }
}

/// One in-flight animation. Each scheduled callback owns the tween and
/// hands it on to the next frame.
struct Tween {
    state: Weak<RefCell<RunnerState>>,
    scheduler: Weak<dyn Scheduler>,
    generation: u64,
    start: Duration,
    duration: Duration,
    node: NodeRef,
    on_tick: TickFn,
    on_done: DoneFn,
}

impl Tween {
    fn schedule(self, delay: Duration) {
        let (Some(state), Some(scheduler)) = (self.state.upgrade(), self.scheduler.upgrade())
        else {
            return;
        };
        let weak_scheduler = self.scheduler.clone();
        let handle = scheduler.schedule(delay, Box::new(move || self.tick()));
        state.borrow_mut().pending = Some(PendingTask {
            scheduler: weak_scheduler,
            handle,
        });
    }

    fn tick(self) {
        let (Some(state), Some(scheduler)) = (self.state.upgrade(), self.scheduler.upgrade())
        else {
            return;
        };
        {
            let mut state = state.borrow_mut();
            if state.generation != self.generation || state.phase == TransitionPhase::Destroyed {
                return;
            }
            state.pending = None;
        }

        let elapsed = scheduler.now().saturating_sub(self.start);
        let t = progress(elapsed, self.duration);
        {
            let mut node = self.node.borrow_mut();
            if node.destroyed {
                return;
            }
            (self.on_tick)(&mut node, t);
        }

        if t >= 1.0 {
            {
                let mut state = state.borrow_mut();
                if state.phase == TransitionPhase::Entering {
                    state.phase = TransitionPhase::Idle;
                }
            }
            (self.on_done)();
        } else {
            let delay = scheduler.frame_delay();
            self.schedule(delay);
        }
    }
}

fn progress(elapsed: Duration, duration: Duration) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::{FrameMode, ManualClock, TaskQueue};

    fn harness(mode: FrameMode) -> (Rc<ManualClock>, Rc<TaskQueue>, Rc<dyn Scheduler>) {
        let clock = Rc::new(ManualClock::new());
        let queue = Rc::new(TaskQueue::new(clock.clone(), mode));
        let scheduler: Rc<dyn Scheduler> = queue.clone();
        (clock, queue, scheduler)
    }

    fn step(clock: &ManualClock, queue: &TaskQueue, millis: u64) {
        clock.advance(Duration::from_millis(millis));
        queue.pump();
    }

    #[test]
    fn instant_zero_is_synchronous() {
        let (_clock, queue, scheduler) = harness(FrameMode::Frames);
        let runner = TransitionRunner::new();
        let node = DisplayNode::shared();

        runner.enter(&Transition::instant(), Some(&scheduler), &node, (100.0, 100.0));
        assert!(node.borrow().visible);
        assert_eq!(queue.pending(), 0);
        assert_eq!(runner.phase(), TransitionPhase::Idle);
    }

    #[test]
    fn delayed_instant_fires_once() {
        let (clock, queue, scheduler) = harness(FrameMode::Frames);
        let runner = TransitionRunner::new();
        let node = DisplayNode::shared();

        let transition = Transition::from_millis(TransitionKind::Instant, 250);
        runner.enter(&transition, Some(&scheduler), &node, (100.0, 100.0));
        assert!(!node.borrow().visible);

        step(&clock, &queue, 249);
        assert!(!node.borrow().visible);
        step(&clock, &queue, 1);
        assert!(node.borrow().visible);
        assert_eq!(queue.fired(), 1);
        assert_eq!(queue.pending(), 0);
        assert_eq!(runner.phase(), TransitionPhase::Idle);
    }

    #[test]
    fn fade_ramps_and_snaps_to_opaque() {
        let (clock, queue, scheduler) = harness(FrameMode::Frames);
        let runner = TransitionRunner::new();
        let node = DisplayNode::shared();

        runner.enter(&Transition::fade(Duration::from_millis(100)), Some(&scheduler), &node, (1.0, 1.0));
        assert_eq!(node.borrow().alpha, 0.0);

        step(&clock, &queue, 25);
        assert!((node.borrow().alpha - 0.25).abs() < 1e-4);
        step(&clock, &queue, 50);
        assert!((node.borrow().alpha - 0.75).abs() < 1e-4);
        step(&clock, &queue, 40);
        assert_eq!(node.borrow().alpha, 1.0);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn fade_uses_interval_when_frames_are_unavailable() {
        let (clock, queue, scheduler) =
            harness(FrameMode::Interval(Duration::from_millis(16)));
        let runner = TransitionRunner::new();
        let node = DisplayNode::shared();

        runner.enter(&Transition::fade(Duration::from_millis(32)), Some(&scheduler), &node, (1.0, 1.0));
        queue.pump();
        assert_eq!(node.borrow().alpha, 0.0, "first tick waits one interval");
        step(&clock, &queue, 16);
        assert!((node.borrow().alpha - 0.5).abs() < 1e-4);
        step(&clock, &queue, 16);
        assert_eq!(node.borrow().alpha, 1.0);
    }

    #[test]
    fn fade_without_duration_snaps() {
        let runner = TransitionRunner::new();
        let node = DisplayNode::shared();
        runner.enter(&Transition::fade(Duration::ZERO), None, &node, (1.0, 1.0));
        assert_eq!(node.borrow().alpha, 1.0);
    }

    #[test]
    fn slide_enter_returns_to_natural_position() {
        let (clock, queue, scheduler) = harness(FrameMode::Frames);
        let runner = TransitionRunner::new();
        let node = DisplayNode::shared();

        let transition = Transition::from_millis(TransitionKind::SlideInLeft, 100);
        runner.enter(&transition, Some(&scheduler), &node, (800.0, 600.0));
        assert_eq!(node.borrow().position(), (-800.0, 0.0));
        assert_eq!(node.borrow().clip, Some((800.0, 600.0)));

        step(&clock, &queue, 50);
        assert!((node.borrow().x + 400.0).abs() < 1e-2);
        step(&clock, &queue, 50);
        assert_eq!(node.borrow().position(), (0.0, 0.0));
    }

    #[test]
    fn slide_exit_moves_the_opposite_way_then_finishes() {
        let (clock, queue, scheduler) = harness(FrameMode::Frames);
        let runner = TransitionRunner::new();
        let node = DisplayNode::shared();
        let finished = Rc::new(std::cell::Cell::new(false));
        let flag = finished.clone();

        let transition = Transition::from_millis(TransitionKind::SlideInDown, 100);
        let status = runner.exit(
            &transition,
            Some(&scheduler),
            &node,
            (800.0, 600.0),
            Box::new(move || flag.set(true)),
        );
        assert_eq!(status, ExitStatus::Pending);

        step(&clock, &queue, 50);
        assert!((node.borrow().y + 300.0).abs() < 1e-2);
        assert!(!finished.get());
        step(&clock, &queue, 50);
        assert_eq!(node.borrow().position(), (0.0, -600.0));
        assert!(finished.get());
    }

    #[test]
    fn zero_duration_exit_reports_finished() {
        let runner = TransitionRunner::new();
        let node = DisplayNode::shared();
        for kind in [TransitionKind::Instant, TransitionKind::Fade, TransitionKind::SlideInUp] {
            let status = runner.exit(
                &Transition::new(kind, Duration::ZERO),
                None,
                &node,
                (10.0, 10.0),
                Box::new(|| panic!("synchronous exits are finished by the caller")),
            );
            assert_eq!(status, ExitStatus::Finished);
        }
    }

    #[test]
    fn none_is_a_noop_both_ways() {
        let (_clock, queue, scheduler) = harness(FrameMode::Frames);
        let runner = TransitionRunner::new();
        let node = DisplayNode::shared();
        let none = Transition::new(TransitionKind::None, Duration::from_millis(100));

        runner.enter(&none, Some(&scheduler), &node, (1.0, 1.0));
        let status = runner.exit(&none, Some(&scheduler), &node, (1.0, 1.0), Box::new(|| {}));
        assert_eq!(status, ExitStatus::Pending);
        assert_eq!(queue.pending(), 0);
        assert!(node.borrow().visible);
    }

    #[test]
    fn new_transition_cancels_the_previous_one() {
        let (clock, queue, scheduler) = harness(FrameMode::Frames);
        let runner = TransitionRunner::new();
        let node = DisplayNode::shared();

        runner.enter(
            &Transition::from_millis(TransitionKind::Instant, 100),
            Some(&scheduler),
            &node,
            (1.0, 1.0),
        );
        runner.enter(&Transition::fade(Duration::from_millis(100)), Some(&scheduler), &node, (1.0, 1.0));
        assert_eq!(queue.pending(), 1);

        step(&clock, &queue, 200);
        assert_eq!(node.borrow().alpha, 1.0);
        assert!(node.borrow().visible);
    }

    #[test]
    fn destroyed_runner_ignores_late_callbacks() {
        let (clock, queue, scheduler) = harness(FrameMode::Frames);
        let runner = TransitionRunner::new();
        let node = DisplayNode::shared();

        runner.enter(&Transition::fade(Duration::from_millis(100)), Some(&scheduler), &node, (1.0, 1.0));
        runner.mark_destroyed();
        runner.mark_destroyed();
        assert_eq!(queue.pending(), 0);

        step(&clock, &queue, 200);
        assert_eq!(node.borrow().alpha, 0.0);
        assert_eq!(runner.phase(), TransitionPhase::Destroyed);
    }
}
