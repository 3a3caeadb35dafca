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

//! # Tessera Views
//!
//! The view/controller lifecycle and the single-active-screen navigator.
//!
//! [`ViewFactory`] owns the registration table and the active screen. Views
//! receive a restricted [`ViewCreator`] and the shared asset loader during
//! initialization; controllers receive their view and the dependency
//! resolver. Screen-capable views animate through [`ScreenBase`] and its
//! [`TransitionRunner`].

#![warn(missing_docs)]

mod base;
mod binder;
mod container;
mod error;
mod factory;
mod node;
mod screen;
mod transition;
mod view;

pub use base::ViewBase;
pub use binder::ViewBinder;
pub use container::{LayerContainer, ViewContainer};
pub use error::ViewError;
pub use factory::{Created, ViewCreator, ViewFactory};
pub use node::{DisplayNode, NodeRef};
pub use screen::ScreenBase;
pub use transition::{Transition, TransitionKind, TransitionPhase, TransitionRunner};
pub use view::{
    AnyScreen, AnyView, Controller, ControllerRef, ExitStatus, Screen, View, ViewController,
    ViewHandle, WeakView,
};
