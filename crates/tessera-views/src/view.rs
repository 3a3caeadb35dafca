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
use crate::factory::ViewCreator;
use crate::node::NodeRef;
use crate::transition::Transition;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tessera_core::InstanceResolver;
use tessera_io::AssetLoader;

/// Shared handle to a concrete view.
pub type ViewHandle<V> = Rc<RefCell<V>>;
/// Shared handle to any view.
pub type AnyView = Rc<RefCell<dyn View>>;
/// Non-owning handle to any view.
pub type WeakView = Weak<RefCell<dyn View>>;
/// Shared handle to any screen-capable view.
pub type AnyScreen = Rc<RefCell<dyn Screen>>;
/// Shared handle to a controller, as held by its view.
pub type ControllerRef = Rc<RefCell<dyn Controller>>;

/// Lifecycle every view implements.
///
/// The factory calls, in order: [`bind_handle`](View::bind_handle),
/// [`initialize`](View::initialize), [`post_initialize`](View::post_initialize)
/// and [`set_controller`](View::set_controller). A view owns its controller
/// and must destroy it before tearing down its own content.
pub trait View: 'static {
    /// Receives the restricted creator and the asset loader.
    fn initialize(&mut self, creator: ViewCreator, assets: Rc<AssetLoader>);

    /// Builds children once the capabilities from `initialize` exist.
    fn post_initialize(&mut self) -> Result<(), ViewError> {
        Ok(())
    }

    /// Installs or clears the controller.
    fn set_controller(&mut self, controller: Option<ControllerRef>);

    /// Tears down the controller, then the view's own content.
    fn destroy(&mut self);

    /// Returns `true` once [`destroy`](View::destroy) has run.
    fn is_destroyed(&self) -> bool;

    /// Receives a weak handle to the view itself.
    fn bind_handle(&mut self, _handle: WeakView) {}

    /// The display node a rendering layer attaches, if the view has one.
    fn node(&self) -> Option<NodeRef> {
        None
    }
}

/// Outcome of [`Screen::on_exit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The exit is over; the caller destroys the screen.
    Finished,
    /// The exit is animating; the screen destroys itself when it ends.
    Pending,
}

/// Capability of views that can be the active screen.
pub trait Screen: View {
    /// The screen became active.
    fn on_enter(&mut self, _transition: &Transition) {}

    /// The screen was superseded.
    fn on_exit(&mut self, _transition: &Transition) -> ExitStatus {
        ExitStatus::Finished
    }

    /// The window was resized, or a previous size is being replayed.
    fn on_resize(&mut self, _width: f32, _height: f32, _dpr: f32) {}
}

/// Type-erased controller surface, as seen by the view that owns it.
pub trait Controller: 'static {
    /// Releases whatever the controller registered.
    fn destroy(&mut self);
}

/// A controller bound to views of type `V`.
///
/// Constructed with `Default`, then initialized with its already attached
/// and initialized view.
pub trait ViewController<V: View>: Controller + Default {
    /// Wires the controller to `view`, resolving dependencies from `resolver`.
    fn initialize(
        &mut self,
        view: &ViewHandle<V>,
        resolver: &dyn InstanceResolver,
    ) -> Result<(), ViewError>;
}
