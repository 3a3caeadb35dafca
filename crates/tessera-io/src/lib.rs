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

//! # Tessera IO
//!
//! Asset loading for the composition runtime: typed requests, fetchers that
//! produce raw bytes, a closed set of decoders, and [`AssetLoader`], which
//! de-duplicates requests by id and exposes the counters used as the load
//! gate.

#![warn(missing_docs)]

mod asset;
mod decode;
mod error;
mod fetch;
mod loader;
mod manifest;

pub use asset::{AssetRequest, AssetType, GltfAsset, LoadedAsset, TextureAsset};
pub use decode::decode;
pub use error::AssetError;
pub use fetch::{AssetFetcher, FetchFuture, FileFetcher, MemoryFetcher};
pub use loader::{AssetEvent, AssetLoader, LoadHandle};
pub use manifest::{AssetManifest, ManifestEntry};
