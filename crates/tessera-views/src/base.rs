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

use crate::factory::ViewCreator;
use crate::view::{ControllerRef, View, WeakView};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;
use tessera_core::{Scheduler, Unsubscribe, UnsubscribeBag};
use tessera_io::AssetLoader;

/// State shared by every view: the injected capabilities, the controller
/// and the subscriptions to release on destroy.
///
/// Concrete views embed a `ViewBase` and forward the [`View`] lifecycle to
/// it. Used on its own it is a view with no content.
#[derive(Default)]
pub struct ViewBase {
    creator: Option<ViewCreator>,
    assets: Option<Rc<AssetLoader>>,
    controller: Option<ControllerRef>,
    handle: Option<WeakView>,
    subscriptions: UnsubscribeBag,
    destroyed: bool,
}

impl ViewBase {
    /// An uninitialized base.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the capabilities handed over by the factory.
    pub fn initialize(&mut self, creator: ViewCreator, assets: Rc<AssetLoader>) {
        self.creator = Some(creator);
        self.assets = Some(assets);
    }

    /// The restricted factory, once initialized.
    pub fn creator(&self) -> Option<&ViewCreator> {
        self.creator.as_ref()
    }

    /// The asset loader, once initialized.
    pub fn assets(&self) -> Option<&Rc<AssetLoader>> {
        self.assets.as_ref()
    }

    /// The scheduler behind the creator, once initialized.
    pub fn scheduler(&self) -> Option<Rc<dyn Scheduler>> {
        self.creator.as_ref().map(ViewCreator::scheduler)
    }

    /// Replaces the controller.
    pub fn set_controller(&mut self, controller: Option<ControllerRef>) {
        self.controller = controller;
    }

    /// The current controller.
    pub fn controller(&self) -> Option<&ControllerRef> {
        self.controller.as_ref()
    }

    /// Stores the view's weak self handle.
    pub fn bind_handle(&mut self, handle: WeakView) {
        self.handle = Some(handle);
    }

    /// The view's weak self handle, if bound.
    pub fn handle(&self) -> Option<&WeakView> {
        self.handle.as_ref()
    }

    /// Releases `subscription` when the view is destroyed.
    pub fn track(&mut self, subscription: impl Into<Option<Unsubscribe>>) {
        self.subscriptions.add(subscription);
    }

    /// Returns `true` once destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Destroys the controller, then releases subscriptions and capabilities.
    /// Runs once; later calls do nothing.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        if let Some(controller) = self.controller.take() {
            self.destroy_controller(controller);
        }
        self.subscriptions.flush();
        self.creator = None;
        self.assets = None;
    }

    fn destroy_controller(&self, controller: ControllerRef) {
        if let Ok(mut busy) = controller.try_borrow_mut() {
            busy.destroy();
            return;
        }
        // The controller is on the stack (it triggered this destroy); finish
        // it on the next frame.
        match self.scheduler() {
            Some(scheduler) => {
                log::debug!("ViewBase: controller busy, deferring its destroy");
                scheduler.schedule(
                    Duration::ZERO,
                    Box::new(move || {
                        if let Ok(mut controller) = controller.try_borrow_mut() {
                            controller.destroy();
                        }
                    }),
                );
            }
            None => log::warn!("ViewBase: controller busy and no scheduler; destroy skipped"),
        }
    }
}

impl View for ViewBase {
    fn initialize(&mut self, creator: ViewCreator, assets: Rc<AssetLoader>) {
        ViewBase::initialize(self, creator, assets);
    }

    fn set_controller(&mut self, controller: Option<ControllerRef>) {
        ViewBase::set_controller(self, controller);
    }

    fn destroy(&mut self) {
        ViewBase::destroy(self);
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn bind_handle(&mut self, handle: WeakView) {
        ViewBase::bind_handle(self, handle);
    }
}

impl fmt::Debug for ViewBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewBase")
            .field("initialized", &self.creator.is_some())
            .field("has_controller", &self.controller.is_some())
            .field("subscriptions", &self.subscriptions.len())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Controller;
    use std::cell::{Cell, RefCell};

    struct CountingController(Rc<Cell<u32>>);

    impl Controller for CountingController {
        fn destroy(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn destroy_runs_controller_then_subscriptions_once() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let destroyed = Rc::new(Cell::new(0));

        let mut base = ViewBase::new();
        base.set_controller(Some(Rc::new(RefCell::new(CountingController(
            destroyed.clone(),
        )))));
        let log = order.clone();
        let counter = destroyed.clone();
        base.track(Unsubscribe::new(move || {
            log.borrow_mut().push(counter.get());
        }));

        base.destroy();
        base.destroy();

        assert_eq!(destroyed.get(), 1);
        // The subscription ran after the controller was destroyed.
        assert_eq!(*order.borrow(), vec![1]);
        assert!(base.is_destroyed());
        assert!(base.controller().is_none());
    }
}
