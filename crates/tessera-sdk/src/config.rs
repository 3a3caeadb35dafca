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

//! Application configuration, loadable from TOML.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tessera_core::FrameMode;

/// Which rendering layers the app drives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppMode {
    /// HUD layer only.
    #[serde(rename = "2d")]
    TwoD,
    /// World layer only.
    #[serde(rename = "3d")]
    ThreeD,
    /// Both layers, world below HUD.
    #[default]
    #[serde(rename = "hybrid")]
    Hybrid,
}

impl AppMode {
    /// Whether the world layer exists in this mode.
    pub fn has_world(self) -> bool {
        matches!(self, AppMode::ThreeD | AppMode::Hybrid)
    }

    /// Whether the HUD layer exists in this mode.
    pub fn has_hud(self) -> bool {
        matches!(self, AppMode::TwoD | AppMode::Hybrid)
    }
}

/// Top-level application settings. Every field has a default.
///
/// ```toml
/// mode = "2d"
/// width = 1280
/// log_filter = "tessera=debug"
///
/// [asset_overrides]
/// "MainScreen.Background" = "backgrounds/night.png"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Rendering layers to create.
    pub mode: AppMode,
    /// Fixed logical width; overrides measured sizes when set.
    pub width: Option<u32>,
    /// Fixed logical height; overrides measured sizes when set.
    pub height: Option<u32>,
    /// Default `env_logger` filter when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Directory the file fetcher resolves asset urls against.
    pub asset_root: PathBuf,
    /// Optional manifest of extra asset requests, relative to the working
    /// directory.
    pub asset_manifest: Option<PathBuf>,
    /// Interval of the timer fallback, in milliseconds.
    pub frame_interval_ms: u64,
    /// Drive per-frame work with the fixed interval instead of frames.
    pub timer_fallback: bool,
    /// Asset id to replacement url.
    pub asset_overrides: BTreeMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: AppMode::default(),
            width: None,
            height: None,
            log_filter: tessera_telemetry::logging::DEFAULT_FILTER.to_string(),
            asset_root: PathBuf::from("assets"),
            asset_manifest: None,
            frame_interval_ms: 16,
            timer_fallback: false,
            asset_overrides: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse application config")
    }

    /// Reads and parses a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("In config file {}", path.display()))
    }

    /// The scheduler mode these settings select.
    pub fn frame_mode(&self) -> FrameMode {
        if self.timer_fallback {
            FrameMode::Interval(Duration::from_millis(self.frame_interval_ms.max(1)))
        } else {
            FrameMode::Frames
        }
    }

    /// Applies the fixed size, if any, to a measured size.
    pub fn effective_size(&self, measured_width: f32, measured_height: f32) -> (f32, f32) {
        let width = self.width.map_or(measured_width, |w| w as f32);
        let height = self.height.map_or(measured_height, |h| h as f32);
        (width.floor().max(1.0), height.floor().max(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.frame_mode(), FrameMode::Frames);
        assert!(config.mode.has_world() && config.mode.has_hud());
    }

    #[test]
    fn parses_every_field() {
        let config = AppConfig::from_toml_str(
            r#"
            mode = "2d"
            width = 1280
            height = 720
            log_filter = "debug"
            asset_root = "data"
            frame_interval_ms = 20
            timer_fallback = true

            [asset_overrides]
            "Main.Logo" = "logo-dark.png"
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, AppMode::TwoD);
        assert!(!config.mode.has_world());
        assert_eq!((config.width, config.height), (Some(1280), Some(720)));
        assert_eq!(config.asset_root, PathBuf::from("data"));
        assert_eq!(
            config.frame_mode(),
            FrameMode::Interval(Duration::from_millis(20))
        );
        assert_eq!(config.asset_overrides["Main.Logo"], "logo-dark.png");
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(AppConfig::from_toml_str("mode = \"4d\"").is_err());
    }

    #[test]
    fn fixed_size_wins_per_axis() {
        let config = AppConfig {
            width: Some(640),
            ..AppConfig::default()
        };
        assert_eq!(config.effective_size(1000.7, 500.2), (640.0, 500.0));
        assert_eq!(AppConfig::default().effective_size(0.0, 0.4), (1.0, 1.0));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.toml");
        std::fs::write(&path, "mode = \"3d\"\n").unwrap();
        assert_eq!(AppConfig::load(&path).unwrap().mode, AppMode::ThreeD);
        assert!(AppConfig::load(dir.path().join("missing.toml")).is_err());
    }
}
