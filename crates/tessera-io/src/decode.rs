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

use crate::asset::{AssetType, GltfAsset, LoadedAsset, TextureAsset};
use crate::error::AssetError;
use std::rc::Rc;

/// Decodes fetched bytes with the strategy for `asset_type`.
pub fn decode(asset_type: AssetType, id: &str, bytes: &[u8]) -> Result<LoadedAsset, AssetError> {
    let decode_error = |message: String| AssetError::Decode {
        id: id.to_string(),
        message,
    };

    match asset_type {
        AssetType::HudTexture => {
            let rgba = image::load_from_memory(bytes)
                .map_err(|e| decode_error(e.to_string()))?
                .to_rgba8();
            let (width, height) = rgba.dimensions();
            Ok(LoadedAsset::Texture(Rc::new(TextureAsset {
                width,
                height,
                pixels: rgba.into_raw(),
            })))
        }
        AssetType::Gltf => {
            let gltf = gltf::Gltf::from_slice(bytes).map_err(|e| decode_error(e.to_string()))?;
            Ok(LoadedAsset::Gltf(Rc::new(GltfAsset::new(gltf))))
        }
    }
}
