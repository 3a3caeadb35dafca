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

// Tessera Sandbox
// Headless demo: loads assets, shows a menu, then slides to a level.

mod menu;

use anyhow::{bail, Context, Result};
use image::{ImageFormat, Rgba, RgbaImage};
use menu::{MainScreen, MenuAction, MenuEvents, MenuModule};
use std::io::Cursor;
use std::rc::Rc;
use std::time::Duration;
use tessera_core::{ManualClock, ResolveExt};
use tessera_io::MemoryFetcher;
use tessera_sdk::{App, AppConfig};
use tessera_views::Transition;

const FRAME: Duration = Duration::from_millis(16);
const MAX_LOAD_FRAMES: u32 = 600;

const SHIP_GLTF: &str = r#"{
  "asset": { "version": "2.0" },
  "scenes": [{ "nodes": [0] }],
  "nodes": [{ "name": "ship" }]
}"#;

fn background_png() -> Result<Vec<u8>> {
    let image = RgbaImage::from_fn(8, 8, |x, y| {
        let shade = ((x + y) * 16) as u8;
        Rgba([shade, shade, 96, 255])
    });
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .context("Failed to encode the background texture")?;
    Ok(bytes.into_inner())
}

fn load_config() -> Result<AppConfig> {
    match std::env::args().nth(1) {
        Some(path) => AppConfig::load(&path),
        None => Ok(AppConfig::default()),
    }
}

fn main() -> Result<()> {
    let config = load_config()?;
    tessera_telemetry::logging::init(&config.log_filter);

    let fetcher = Rc::new(MemoryFetcher::new());
    fetcher.insert("mainscreen/background.png", background_png()?);
    fetcher.insert("level/ship.gltf", SHIP_GLTF.as_bytes());

    let clock = Rc::new(ManualClock::new());
    let mut app = App::with_parts(config, fetcher, clock.clone())?;
    app.add_module(MenuModule::new());
    app.initialize()?;
    app.request_resize(1280.0, 720.0, 1.0);

    let mut frames = 0;
    while !app.is_loaded() {
        if frames >= MAX_LOAD_FRAMES {
            bail!("Assets did not finish loading");
        }
        clock.advance(FRAME);
        app.step(FRAME.as_secs_f32());
        frames += 1;
    }
    for (id, error) in app.asset_failures() {
        log::warn!("Sandbox: continuing without '{id}': {error}");
    }

    app.create_screen::<MainScreen>(&Transition::fade(Duration::from_millis(300)))?;
    let events = app.container().resolve::<MenuEvents>()?;

    for frame in 0..120 {
        match frame {
            20 => events.actions.emit(&MenuAction::Settings),
            30 => events.actions.emit(&MenuAction::Play),
            _ => {}
        }
        clock.advance(FRAME);
        app.step(FRAME.as_secs_f32());
    }

    log::info!(
        "Sandbox: active screen = {}, exiting screens = {}",
        app.views().active_screen().is_some(),
        app.views().exiting_count()
    );

    println!("{}", app.metrics().snapshot_json()?);
    app.destroy();
    Ok(())
}
