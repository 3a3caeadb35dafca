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

/// Errors raised while requesting, fetching or decoding assets.
///
/// Payloads are strings so one settled error can be handed to every caller
/// awaiting the same load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    /// The asset type has no loading strategy.
    #[error("unsupported asset type: {0}")]
    UnsupportedAssetType(String),
    /// The fetcher could not produce bytes for `url`.
    #[error("failed to fetch '{url}': {message}")]
    Fetch {
        /// Location that was requested.
        url: String,
        /// Underlying failure.
        message: String,
    },
    /// The bytes for `id` could not be decoded.
    #[error("failed to decode asset '{id}': {message}")]
    Decode {
        /// Logical asset id.
        id: String,
        /// Underlying failure.
        message: String,
    },
    /// The load could not be handed to the executor.
    #[error("failed to spawn asset load: {0}")]
    Spawn(String),
    /// An asset manifest could not be read or parsed.
    #[error("invalid asset manifest: {0}")]
    Manifest(String),
}
