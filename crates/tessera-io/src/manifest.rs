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

use crate::asset::AssetRequest;
use crate::error::AssetError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One `[[assets]]` entry of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Asset type name, e.g. `hud-texture` or `gltf`.
    #[serde(rename = "type")]
    pub asset_type: String,
    /// Logical asset id.
    pub id: String,
    /// Location handed to the fetcher.
    pub url: String,
}

/// A TOML list of asset requests.
///
/// ```toml
/// [[assets]]
/// type = "hud-texture"
/// id = "logo"
/// url = "textures/logo.png"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetManifest {
    /// Entries in declaration order.
    #[serde(default)]
    pub assets: Vec<ManifestEntry>,
}

impl AssetManifest {
    /// Parses a manifest from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, AssetError> {
        toml::from_str(text).map_err(|e| AssetError::Manifest(e.to_string()))
    }

    /// Reads and parses a manifest file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| AssetError::Manifest(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Converts every entry to an [`AssetRequest`]. Fails on the first entry
    /// with an unknown type.
    pub fn requests(&self) -> Result<Vec<AssetRequest>, AssetError> {
        self.assets
            .iter()
            .map(|entry| AssetRequest::parse(&entry.asset_type, &entry.id, &entry.url))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AssetType;

    #[test]
    fn parses_entries_in_order() {
        let manifest = AssetManifest::from_toml_str(
            r#"
            [[assets]]
            type = "hud-texture"
            id = "logo"
            url = "textures/logo.png"

            [[assets]]
            type = "gltf"
            id = "ship"
            url = "models/ship.gltf"
            "#,
        )
        .unwrap();

        let requests = manifest.requests().unwrap();
        assert_eq!(
            requests,
            vec![
                AssetRequest::new(AssetType::HudTexture, "logo", "textures/logo.png"),
                AssetRequest::new(AssetType::Gltf, "ship", "models/ship.gltf"),
            ]
        );
    }

    #[test]
    fn unknown_type_fails_at_conversion() {
        let manifest = AssetManifest::from_toml_str(
            r#"
            [[assets]]
            type = "shader"
            id = "blur"
            url = "blur.wgsl"
            "#,
        )
        .unwrap();
        assert_eq!(
            manifest.requests(),
            Err(AssetError::UnsupportedAssetType("shader".into()))
        );
    }

    #[test]
    fn empty_manifest_is_valid() {
        assert!(AssetManifest::from_toml_str("").unwrap().assets.is_empty());
    }

    #[test]
    fn malformed_toml_is_a_manifest_error() {
        assert!(matches!(
            AssetManifest::from_toml_str("[[assets]]\ntype = "),
            Err(AssetError::Manifest(_))
        ));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assets.toml");
        std::fs::write(&path, "[[assets]]\ntype = \"gltf\"\nid = \"a\"\nurl = \"a.gltf\"\n").unwrap();
        assert_eq!(AssetManifest::load(&path).unwrap().assets.len(), 1);
    }
}
