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

use crate::base::ViewBase;
use crate::factory::ViewCreator;
use crate::node::NodeRef;
use crate::transition::{Transition, TransitionRunner};
use crate::view::{ControllerRef, ExitStatus, Screen, View, WeakView};
use std::rc::Rc;
use tessera_io::AssetLoader;

/// Screen state: a [`ViewBase`], a display node and a transition runner.
///
/// Concrete screens embed a `ScreenBase` and forward [`Screen`] calls to it.
#[derive(Debug, Default)]
pub struct ScreenBase {
    view: ViewBase,
    node: NodeRef,
    runner: TransitionRunner,
}

impl ScreenBase {
    /// A fresh screen with a visible node.
    pub fn new() -> Self {
        Self::default()
    }

    /// The embedded view state.
    pub fn view(&self) -> &ViewBase {
        &self.view
    }

    /// Mutable access to the embedded view state.
    pub fn view_mut(&mut self) -> &mut ViewBase {
        &mut self.view
    }

    /// The screen's display node.
    pub fn node(&self) -> &NodeRef {
        &self.node
    }

    /// The transition runner.
    pub fn runner(&self) -> &TransitionRunner {
        &self.runner
    }

    /// Size the transitions animate over.
    ///
    /// Own layout size, then the parent's, then the window size, then 1x1.
    pub fn viewport(&self) -> (f32, f32) {
        let node = self.node.borrow();
        node.layout_size
            .or_else(|| node.parent_layout_size())
            .or_else(|| self.view.creator().and_then(ViewCreator::window_size))
            .unwrap_or((1.0, 1.0))
    }

    /// Plays the enter half of `transition`.
    pub fn enter(&mut self, transition: &Transition) {
        let scheduler = self.view.scheduler();
        let viewport = self.viewport();
        self.runner
            .enter(transition, scheduler.as_ref(), &self.node, viewport);
    }

    /// Plays the exit half of `transition`. An animated exit destroys the
    /// screen through its bound handle when it ends.
    pub fn exit(&mut self, transition: &Transition) -> ExitStatus {
        let scheduler = self.view.scheduler();
        let viewport = self.viewport();
        let handle = self.view.handle().cloned();
        let on_finished = Box::new(move || {
            let Some(screen) = handle.and_then(|h| h.upgrade()) else {
                return;
            };
            match screen.try_borrow_mut() {
                Ok(mut screen) if !screen.is_destroyed() => screen.destroy(),
                Ok(_) => {}
                Err(_) => log::warn!("ScreenBase: screen busy at end of exit; not destroyed"),
            };
        });
        self.runner
            .exit(transition, scheduler.as_ref(), &self.node, viewport, on_finished)
    }

    /// Records the layout size, clamped to at least 1x1.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.node.borrow_mut().layout_size = Some((width.max(1.0), height.max(1.0)));
    }

    /// Stops transitions, destroys the view state and hides the node.
    pub fn destroy(&mut self) {
        if self.view.is_destroyed() {
            return;
        }
        self.runner.mark_destroyed();
        self.view.destroy();
        let mut node = self.node.borrow_mut();
        node.destroyed = true;
        node.visible = false;
        node.set_parent(None);
    }

    /// Returns `true` once destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.view.is_destroyed()
    }
}

impl View for ScreenBase {
    fn initialize(&mut self, creator: ViewCreator, assets: Rc<AssetLoader>) {
        self.view.initialize(creator, assets);
    }

    fn set_controller(&mut self, controller: Option<ControllerRef>) {
        self.view.set_controller(controller);
    }

    fn destroy(&mut self) {
        ScreenBase::destroy(self);
    }

    fn is_destroyed(&self) -> bool {
        ScreenBase::is_destroyed(self)
    }

    fn bind_handle(&mut self, handle: WeakView) {
        self.view.bind_handle(handle);
    }

    fn node(&self) -> Option<NodeRef> {
        Some(self.node.clone())
    }
}

impl Screen for ScreenBase {
    fn on_enter(&mut self, transition: &Transition) {
        self.enter(transition);
    }

    fn on_exit(&mut self, transition: &Transition) -> ExitStatus {
        self.exit(transition)
    }

    fn on_resize(&mut self, width: f32, height: f32, _dpr: f32) {
        self.resize(width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::DisplayNode;

    #[test]
    fn viewport_prefers_own_layout_then_parent() {
        let mut screen = ScreenBase::new();
        assert_eq!(screen.viewport(), (1.0, 1.0));

        let parent = DisplayNode::shared();
        parent.borrow_mut().layout_size = Some((320.0, 240.0));
        screen.node().borrow_mut().set_parent(Some(&parent));
        assert_eq!(screen.viewport(), (320.0, 240.0));

        screen.resize(0.0, 90.0);
        assert_eq!(screen.viewport(), (1.0, 90.0));
    }

    #[test]
    fn destroy_hides_node_once() {
        let mut screen = ScreenBase::new();
        screen.destroy();
        screen.destroy();
        let node = screen.node().borrow();
        assert!(node.destroyed);
        assert!(!node.visible);
        assert!(screen.is_destroyed());
    }

    #[test]
    fn exit_without_scheduler_finishes_synchronously() {
        let mut screen = ScreenBase::new();
        assert_eq!(
            screen.exit(&Transition::fade(std::time::Duration::from_millis(250))),
            ExitStatus::Finished
        );
    }
}
