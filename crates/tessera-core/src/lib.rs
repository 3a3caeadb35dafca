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

//! # Tessera Core
//!
//! Foundational crate containing the dependency container, the scheduling
//! contract used by animated transitions, and the small subscription
//! primitives every other layer of the composition runtime builds on.
//!
//! Everything in this crate is single-threaded: shared state lives behind
//! `Rc`/`RefCell`, and re-entrant calls are made observably safe rather than
//! locked.

#![warn(missing_docs)]

pub mod di;
pub mod event;
pub mod scheduler;
pub mod subscription;
pub mod update;
pub mod utils;

pub use di::{Container, ContainerError, InstanceResolver, ResolveExt, Token};
pub use event::{EventBus, Signal};
pub use scheduler::{Clock, FrameMode, ManualClock, Scheduler, SystemClock, TaskHandle, TaskQueue};
pub use subscription::{Unsubscribe, UnsubscribeBag};
pub use update::UpdateService;
pub use utils::timer::Stopwatch;
