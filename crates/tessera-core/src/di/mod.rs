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

//! Identity-keyed singleton container.
//!
//! The [`Container`] maps a [`Token`] to a provider: either a pre-built
//! instance or a lazy factory that is realised once, on first resolution.
//! Secondary tokens (aliases) can redirect to a primary binding.
//!
//! Systems that only need to *resolve* dependencies receive a
//! `&dyn InstanceResolver`, which exposes no binding API.

mod container;
mod error;
mod resolver;
mod token;

pub use container::Container;
pub use error::ContainerError;
pub use resolver::{InstanceResolver, ResolveExt};
pub use token::{Token, TokenInfo, TokenKey};
