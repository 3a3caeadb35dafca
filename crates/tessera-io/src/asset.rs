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

use crate::error::AssetError;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

/// The closed set of loadable asset kinds.
///
/// Adding a kind means extending this enum and the `match` in
/// [`decode`](crate::decode); the compiler rejects one without the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetType {
    /// A 2D texture for the HUD layer, decoded to RGBA8.
    HudTexture,
    /// A glTF document for the world layer.
    Gltf,
}

impl AssetType {
    /// Every supported kind.
    pub const ALL: [AssetType; 2] = [AssetType::HudTexture, AssetType::Gltf];

    /// Canonical name used in manifests and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            AssetType::HudTexture => "hud-texture",
            AssetType::Gltf => "gltf",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "hud-texture" | "hudTexture" => Ok(AssetType::HudTexture),
            "gltf" => Ok(AssetType::Gltf),
            other => Err(AssetError::UnsupportedAssetType(other.to_string())),
        }
    }
}

/// A request to load one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    /// Selects the decoding strategy.
    pub asset_type: AssetType,
    /// Stable logical name; loads are de-duplicated on it.
    pub id: String,
    /// Location handed to the fetcher.
    pub url: String,
}

impl AssetRequest {
    /// Builds a request.
    pub fn new(asset_type: AssetType, id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            asset_type,
            id: id.into(),
            url: url.into(),
        }
    }

    /// Builds a request from a type name, failing for unknown types.
    pub fn parse(
        type_name: &str,
        id: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<Self, AssetError> {
        Ok(Self::new(type_name.parse()?, id, url))
    }
}

/// Decoded RGBA8 pixels.
#[derive(Clone, PartialEq, Eq)]
pub struct TextureAsset {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA8 data, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

impl fmt::Debug for TextureAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureAsset")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// A parsed glTF document.
pub struct GltfAsset {
    gltf: gltf::Gltf,
}

impl GltfAsset {
    pub(crate) fn new(gltf: gltf::Gltf) -> Self {
        Self { gltf }
    }

    /// The parsed document.
    pub fn document(&self) -> &gltf::Document {
        &self.gltf.document
    }

    /// Embedded binary chunk of a `.glb`, if any.
    pub fn blob(&self) -> Option<&[u8]> {
        self.gltf.blob.as_deref()
    }

    /// Number of scenes in the document.
    pub fn scene_count(&self) -> usize {
        self.gltf.document.scenes().len()
    }

    /// Number of meshes in the document.
    pub fn mesh_count(&self) -> usize {
        self.gltf.document.meshes().len()
    }
}

impl fmt::Debug for GltfAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GltfAsset")
            .field("scenes", &self.scene_count())
            .field("meshes", &self.mesh_count())
            .finish()
    }
}

/// A realized asset as stored by the loader.
#[derive(Debug, Clone)]
pub enum LoadedAsset {
    /// A HUD texture.
    Texture(Rc<TextureAsset>),
    /// A glTF document.
    Gltf(Rc<GltfAsset>),
}

impl LoadedAsset {
    /// The kind of asset this is.
    pub fn asset_type(&self) -> AssetType {
        match self {
            LoadedAsset::Texture(_) => AssetType::HudTexture,
            LoadedAsset::Gltf(_) => AssetType::Gltf,
        }
    }
}
