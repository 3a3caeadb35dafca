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

use crate::error::ViewError;
use crate::view::{AnyView, ControllerRef, View, ViewController, ViewHandle};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tessera_core::InstanceResolver;

/// Pairs views with controllers outside the factory and tears them down
/// together.
#[derive(Default)]
pub struct ViewBinder {
    pairs: RefCell<Vec<(AnyView, ControllerRef)>>,
}

impl ViewBinder {
    /// An empty binder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a `C` for `view`, initializes it and tracks the pair.
    pub fn bind<V, C>(
        &self,
        view: &ViewHandle<V>,
        resolver: &dyn InstanceResolver,
    ) -> Result<Rc<RefCell<C>>, ViewError>
    where
        V: View,
        C: ViewController<V>,
    {
        let controller = Rc::new(RefCell::new(C::default()));
        controller.borrow_mut().initialize(view, resolver)?;
        self.track(view.clone(), controller.clone());
        Ok(controller)
    }

    /// Tracks an already wired pair.
    pub fn track(&self, view: AnyView, controller: ControllerRef) {
        self.pairs.borrow_mut().push((view, controller));
    }

    /// Number of tracked pairs.
    pub fn len(&self) -> usize {
        self.pairs.borrow().len()
    }

    /// Returns `true` when nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.pairs.borrow().is_empty()
    }

    /// Destroys every controller, then every view, newest first.
    pub fn destroy_all(&self) {
        let pairs = std::mem::take(&mut *self.pairs.borrow_mut());
        if pairs.is_empty() {
            return;
        }
        log::debug!("ViewBinder: destroying {} pairs", pairs.len());
        for (_, controller) in pairs.iter().rev() {
            match controller.try_borrow_mut() {
                Ok(mut controller) => controller.destroy(),
                Err(_) => log::warn!("ViewBinder: controller busy; destroy skipped"),
            }
        }
        for (view, _) in pairs.iter().rev() {
            match view.try_borrow_mut() {
                Ok(mut view) if !view.is_destroyed() => view.destroy(),
                Ok(_) => {}
                Err(_) => log::warn!("ViewBinder: view busy; destroy skipped"),
            }
        }
    }
}

impl fmt::Debug for ViewBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewBinder").field("pairs", &self.len()).finish()
    }
}
