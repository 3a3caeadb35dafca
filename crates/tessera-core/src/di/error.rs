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

use thiserror::Error;

/// Failures raised by the [`Container`](super::Container).
///
/// Apart from [`CreationFailed`](ContainerError::CreationFailed), every
/// variant signals a composition-root mistake and is meant to propagate to
/// the caller unhandled.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The primary token already has a provider.
    #[error("token is already bound: {token}")]
    DuplicateBinding {
        /// Name of the offending token.
        token: String,
    },

    /// The alias already redirects to a different primary token.
    #[error("alias token is already mapped: {alias} -> {existing}")]
    AliasConflict {
        /// Name of the alias token.
        alias: String,
        /// Name of the primary the alias currently points to.
        existing: String,
    },

    /// No provider exists for the requested token.
    #[error("no binding found for token: {requested}{}", alias_suffix(.resolved))]
    MissingBinding {
        /// Name of the token that was requested.
        requested: String,
        /// Name of the primary token when `requested` was an alias.
        resolved: Option<String>,
    },

    /// A factory re-entrantly requested its own token.
    #[error("circular dependency while creating: {token}")]
    CircularDependency {
        /// Name of the token whose factory was already running.
        token: String,
    },

    /// The stored instance is not of the type the token promises.
    #[error("binding for {token} does not hold a value of type {expected}")]
    TypeMismatch {
        /// Name of the token that was resolved.
        token: String,
        /// Type the caller expected.
        expected: &'static str,
    },

    /// A singleton factory reported a failure of its own.
    #[error("failed to create {token}")]
    CreationFailed {
        /// Name of the token being created.
        token: String,
        /// The underlying failure.
        #[source]
        source: anyhow::Error,
    },
}

impl ContainerError {
    /// Wraps an arbitrary factory failure for the given token name.
    pub fn creation_failed(token: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::CreationFailed {
            token: token.into(),
            source: source.into(),
        }
    }
}

fn alias_suffix(resolved: &Option<String>) -> String {
    resolved
        .as_ref()
        .map(|primary| format!(" (alias of {primary})"))
        .unwrap_or_default()
}
