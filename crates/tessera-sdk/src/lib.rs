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

//! The composition root of a Tessera application.
//!
//! An [`App`] owns the dependency container, the asset loader, the view
//! factory and the frame scheduler. Feature modules plug in through
//! [`ModuleBinding`]; the app runs their configuration once, issues their
//! asset requests and reports when the load gate opens.

pub mod app;
pub mod config;
pub mod module;

pub use app::App;
pub use config::{AppConfig, AppMode};
pub use module::{AssetSet, ModuleBinding};

/// Re-exports most applications need.
pub mod prelude {
    pub use crate::{App, AppConfig, AppMode, AssetSet, ModuleBinding};
    pub use tessera_core::{
        Container, InstanceResolver, ResolveExt, Scheduler, Signal, Token, Unsubscribe,
        UnsubscribeBag, UpdateService,
    };
    pub use tessera_io::{AssetLoader, AssetRequest, AssetType, MemoryFetcher};
    pub use tessera_views::{
        Controller, ControllerRef, ExitStatus, NodeRef, Screen, ScreenBase, Transition,
        TransitionKind, View, ViewBase, ViewBinder, ViewController, ViewCreator, ViewError,
        ViewFactory, ViewHandle, WeakView,
    };
}
