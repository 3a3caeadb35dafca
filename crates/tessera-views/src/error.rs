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

use tessera_core::ContainerError;
use thiserror::Error;

/// Errors raised by the view factory and view lifecycle.
#[derive(Debug, Error)]
pub enum ViewError {
    /// No registration exists for the requested view type.
    #[error("no view factory registration for view: {view}")]
    MissingViewRegistration {
        /// Type name of the view.
        view: &'static str,
    },
    /// The view is registered with a different controller type.
    #[error("view {view} is registered with controller {registered}, not {requested}")]
    ControllerMismatch {
        /// Type name of the view.
        view: &'static str,
        /// Controller type in the registration.
        registered: &'static str,
        /// Controller type the caller asked for.
        requested: &'static str,
    },
    /// The registration keyed by a view type built a value of another type.
    #[error("registration for view {view} constructed a {constructed}")]
    ConstructedTypeMismatch {
        /// Type name of the requested view.
        view: &'static str,
        /// Type name the registration builds.
        constructed: &'static str,
    },
    /// A HUD or world registration was used before its container was set.
    #[error("{layer} view container is not set")]
    ContainerNotSet {
        /// `hud` or `world`.
        layer: &'static str,
    },
    /// The restricted creator outlived its factory.
    #[error("view factory has been dropped")]
    FactoryDropped,
    /// A rendering collaborator refused to attach a view.
    #[error("failed to attach view: {0}")]
    Attach(String),
    /// Resolving a dependency failed.
    #[error(transparent)]
    Container(#[from] ContainerError),
}
