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

use anyhow::{bail, Result};
use futures::future::{self, FutureExt};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use tessera_core::{Container, ManualClock, ResolveExt, Scheduler, TaskQueue, Token, UpdateService};
use tessera_io::{AssetFetcher, AssetLoader, AssetRequest, AssetType, FetchFuture, MemoryFetcher};
use tessera_sdk::{App, AppConfig, AppMode, AssetSet, ModuleBinding};
use tessera_views::{
    Controller, ScreenBase, Transition, ViewController, ViewError, ViewFactory, ViewHandle,
};

const GLTF: &[u8] = br#"{"asset":{"version":"2.0"}}"#;

#[derive(Default)]
struct Idle;

impl Controller for Idle {
    fn destroy(&mut self) {}
}

impl ViewController<ScreenBase> for Idle {
    fn initialize(
        &mut self,
        _view: &ViewHandle<ScreenBase>,
        _resolver: &dyn tessera_core::InstanceResolver,
    ) -> Result<(), ViewError> {
        Ok(())
    }
}

#[derive(Default)]
struct Counters {
    di: Cell<u32>,
    views: Cell<u32>,
    fail_next: Cell<bool>,
}

struct ShipModule {
    counters: Rc<Counters>,
}

impl ModuleBinding for ShipModule {
    fn name(&self) -> &str {
        "ships"
    }

    fn configure_di(&self, container: &Container) -> Result<()> {
        self.counters.di.set(self.counters.di.get() + 1);
        if self.counters.fail_next.replace(false) {
            bail!("ship registry unavailable");
        }
        container.bind_instance(&Token::<String>::of(), Rc::new("Aurora".to_string()), &[])?;
        Ok(())
    }

    fn configure_views(&self, views: &ViewFactory) -> Result<()> {
        self.counters.views.set(self.counters.views.get() + 1);
        views.register_hud_view::<ScreenBase, Idle>();
        Ok(())
    }

    fn asset_requests(&self) -> Vec<AssetRequest> {
        AssetSet::new()
            .with(AssetRequest::new(AssetType::Gltf, "ship", "models/ship.gltf"))
            .to_vec()
    }
}

struct Stalled;

impl AssetFetcher for Stalled {
    fn fetch(&self, _url: &str) -> FetchFuture {
        future::pending().boxed_local()
    }
}

fn app_with(
    config: AppConfig,
    fetcher: Rc<dyn AssetFetcher>,
) -> (App, Rc<ManualClock>, Rc<Counters>) {
    let clock = Rc::new(ManualClock::new());
    let mut app = App::with_parts(config, fetcher, clock.clone()).unwrap();
    let counters = Rc::new(Counters::default());
    app.add_module(ShipModule {
        counters: counters.clone(),
    });
    (app, clock, counters)
}

fn memory_assets() -> Rc<MemoryFetcher> {
    let fetcher = Rc::new(MemoryFetcher::new());
    fetcher.insert("models/ship.gltf", GLTF);
    fetcher
}

#[test]
fn base_services_are_resolvable() {
    let (app, _clock, _) = app_with(AppConfig::default(), memory_assets());
    let container = app.container();

    let updates = container.resolve::<UpdateService>().unwrap();
    updates.register(0, |_| {}).call();
    assert!(container.resolve::<AssetLoader>().is_ok());
    assert!(container.resolve::<TaskQueue>().is_ok());
    assert!(container.resolve::<AppConfig>().is_ok());
    let scheduler = container.get_instance(&Token::<dyn Scheduler>::of()).unwrap();
    assert_eq!(scheduler.frame_delay(), Duration::ZERO);
}

#[test]
fn configuration_runs_once() {
    let (mut app, _clock, counters) = app_with(AppConfig::default(), memory_assets());
    app.configure().unwrap();
    app.configure().unwrap();
    assert_eq!((counters.di.get(), counters.views.get()), (1, 1));
    assert!(app.is_configured());
    assert_eq!(*app.container().resolve::<String>().unwrap(), "Aurora");
}

#[test]
fn failed_configuration_can_be_retried() {
    let (mut app, _clock, counters) = app_with(AppConfig::default(), memory_assets());
    counters.fail_next.set(true);

    let err = app.configure().unwrap_err();
    assert!(format!("{err:#}").contains("ship registry unavailable"));
    assert!(!app.is_configured());
    assert_eq!(counters.views.get(), 0);

    app.configure().unwrap();
    assert_eq!((counters.di.get(), counters.views.get()), (2, 1));
}

#[test]
fn screens_wait_for_the_load_gate() {
    let (mut app, _clock, _) = app_with(AppConfig::default(), Rc::new(Stalled));
    assert!(app.create_screen::<ScreenBase>(&Transition::instant()).is_err());

    app.initialize().unwrap();
    app.step(0.016);
    assert!(!app.is_loaded());
    assert_eq!(app.assets().total_items(), 1);
    assert!(app.create_screen::<ScreenBase>(&Transition::instant()).is_err());
}

#[test]
fn overrides_redirect_module_requests() {
    let fetcher = Rc::new(MemoryFetcher::new());
    fetcher.insert("models/ship-v2.gltf", GLTF);
    let mut config = AppConfig::default();
    config
        .asset_overrides
        .insert("ship".into(), "models/ship-v2.gltf".into());

    let (mut app, _clock, _) = app_with(config, fetcher);
    app.initialize().unwrap();

    assert!(app.is_loaded());
    assert!(app.asset_failures().is_empty());
    assert!(app.assets().gltf("ship").is_some());
}

#[test]
fn failed_assets_still_open_the_gate() {
    let (mut app, _clock, _) = app_with(AppConfig::default(), Rc::new(MemoryFetcher::new()));
    app.initialize().unwrap();

    assert!(app.is_loaded());
    assert_eq!(app.asset_failures().len(), 1);
    assert_eq!(app.asset_failures()[0].0, "ship");
    assert!(app.create_screen::<ScreenBase>(&Transition::instant()).is_ok());
}

#[test]
fn fixed_size_wins_and_is_replayed_to_new_screens() {
    let config = AppConfig {
        width: Some(640),
        ..AppConfig::default()
    };
    let (mut app, _clock, _) = app_with(config, memory_assets());
    app.initialize().unwrap();

    app.resize(1000.0, 500.0, 2.0);
    assert_eq!(app.size(), Some((640.0, 500.0, 2.0)));
    let hud = app.hud().unwrap();
    assert_eq!(hud.size(), Some((640.0, 500.0, 2.0)));

    let screen = app.create_screen::<ScreenBase>(&Transition::instant()).unwrap();
    assert_eq!(screen.borrow().viewport(), (640.0, 500.0));

    app.request_resize(1000.6, 0.2, 1.0);
    assert_eq!(app.size(), Some((640.0, 1.0, 1.0)));
    assert_eq!(screen.borrow().viewport(), (640.0, 1.0));
}

#[test]
fn step_runs_updates_then_transitions() {
    let (mut app, clock, _) = app_with(AppConfig::default(), memory_assets());
    app.initialize().unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let _keep = app.update_service().register(0, move |dt| sink.borrow_mut().push(dt));

    let fade = Transition::fade(Duration::from_millis(100));
    let first = app.create_screen::<ScreenBase>(&Transition::instant()).unwrap();
    let second = app.create_screen::<ScreenBase>(&fade).unwrap();

    clock.advance(Duration::from_millis(50));
    app.step(0.05);
    assert!(!first.borrow().is_destroyed());
    clock.advance(Duration::from_millis(50));
    app.step(0.05);

    assert!(first.borrow().is_destroyed());
    assert_eq!(second.borrow().node().borrow().alpha, 1.0);
    assert_eq!(*seen.borrow(), vec![0.05, 0.05]);
}

#[test]
fn destroy_tears_everything_down_once() {
    let (mut app, _clock, _) = app_with(AppConfig::default(), memory_assets());
    app.initialize().unwrap();
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let _keep = app
        .update_service()
        .register(0, move |_| counter.set(counter.get() + 1));
    let screen = app.create_screen::<ScreenBase>(&Transition::instant()).unwrap();

    app.destroy();
    app.destroy();
    app.step(0.016);

    assert!(app.is_destroyed());
    assert!(screen.borrow().is_destroyed());
    assert!(app.update_service().is_empty());
    assert!(app.views().active_screen().is_none());
    assert_eq!(calls.get(), 0);
}

#[test]
fn mode_selects_layers() {
    let config = AppConfig {
        mode: AppMode::TwoD,
        ..AppConfig::default()
    };
    let (app, _clock, _) = app_with(config, memory_assets());
    assert!(app.hud().is_some());
    assert!(app.world().is_none());
}
