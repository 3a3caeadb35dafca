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

//! The application composition root.

use crate::config::AppConfig;
use crate::module::ModuleBinding;
use anyhow::{ensure, Context, Result};
use futures::executor::LocalPool;
use std::any::type_name;
use std::rc::Rc;
use tessera_core::{
    Clock, Container, EventBus, Scheduler, SystemClock, TaskQueue, Token, UpdateService,
};
use tessera_io::{
    AssetError, AssetEvent, AssetFetcher, AssetLoader, AssetManifest, AssetRequest, FileFetcher,
};
use tessera_telemetry::{CounterHandle, MetricsRegistry};
use tessera_views::{
    LayerContainer, Screen, Transition, ViewBinder, ViewContainer, ViewFactory, ViewHandle,
};

/// Owns every service of one application instance.
///
/// Base services are bound into the container at construction:
/// [`UpdateService`], [`ViewBinder`], the [`TaskQueue`] (also as
/// `dyn Scheduler`), the [`AssetLoader`], the [`MetricsRegistry`] and the
/// [`AppConfig`].
///
/// Typical lifecycle: [`add_module`](App::add_module), [`initialize`](App::initialize),
/// call [`step`](App::step) every frame until [`is_loaded`](App::is_loaded),
/// then [`create_screen`](App::create_screen).
pub struct App {
    config: Rc<AppConfig>,
    container: Rc<Container>,
    updates: UpdateService,
    binder: Rc<ViewBinder>,
    scheduler: Rc<TaskQueue>,
    pool: LocalPool,
    assets: Rc<AssetLoader>,
    views: ViewFactory,
    metrics: MetricsRegistry,
    asset_events: EventBus<AssetEvent>,
    world: Option<Rc<LayerContainer>>,
    hud: Option<Rc<LayerContainer>>,
    modules: Vec<Box<dyn ModuleBinding>>,
    configured: bool,
    size: Option<(f32, f32, f32)>,
    failures: Vec<(String, AssetError)>,
    frames: Option<CounterHandle>,
    destroyed: bool,
}

impl App {
    /// An app fetching assets from `config.asset_root` on the system clock.
    pub fn new(config: AppConfig) -> Result<Self> {
        let fetcher = Rc::new(FileFetcher::new(config.asset_root.clone()));
        Self::with_fetcher(config, fetcher)
    }

    /// An app fetching assets through `fetcher` on the system clock.
    pub fn with_fetcher(config: AppConfig, fetcher: Rc<dyn AssetFetcher>) -> Result<Self> {
        Self::with_parts(config, fetcher, Rc::new(SystemClock::new()))
    }

    /// An app with every external source supplied by the caller.
    pub fn with_parts(
        config: AppConfig,
        fetcher: Rc<dyn AssetFetcher>,
        clock: Rc<dyn Clock>,
    ) -> Result<Self> {
        let config = Rc::new(config);
        let metrics = MetricsRegistry::new();
        let pool = LocalPool::new();
        let asset_events = EventBus::new();
        let assets = Rc::new(
            AssetLoader::new(fetcher, pool.spawner())
                .with_metrics(&metrics)
                .with_event_sender(asset_events.sender()),
        );
        let scheduler = Rc::new(TaskQueue::new(clock, config.frame_mode()));
        let updates = UpdateService::new();
        let binder = Rc::new(ViewBinder::new());

        let container = Rc::new(Container::new());
        Self::bind_base_services(
            &container, &config, &updates, &binder, &scheduler, &assets, &metrics,
        )
        .context("Failed to bind base services")?;

        let views = ViewFactory::new(container.clone(), assets.clone(), scheduler.clone());
        let world = config
            .mode
            .has_world()
            .then(|| Rc::new(LayerContainer::new("world")));
        let hud = config
            .mode
            .has_hud()
            .then(|| Rc::new(LayerContainer::new("hud")));
        views.set_view_containers(
            world.clone().map(|layer| layer as Rc<dyn ViewContainer>),
            hud.clone().map(|layer| layer as Rc<dyn ViewContainer>),
        );

        let frames = match metrics.register_counter("app", "frames_total", "Frames stepped") {
            Ok(counter) => Some(counter),
            Err(e) => {
                log::warn!("App: frame counter unavailable: {e}");
                None
            }
        };

        log::info!("App: created in {:?} mode", config.mode);
        Ok(Self {
            config,
            container,
            updates,
            binder,
            scheduler,
            pool,
            assets,
            views,
            metrics,
            asset_events,
            world,
            hud,
            modules: Vec::new(),
            configured: false,
            size: None,
            failures: Vec::new(),
            frames,
            destroyed: false,
        })
    }

    fn bind_base_services(
        container: &Container,
        config: &Rc<AppConfig>,
        updates: &UpdateService,
        binder: &Rc<ViewBinder>,
        scheduler: &Rc<TaskQueue>,
        assets: &Rc<AssetLoader>,
        metrics: &MetricsRegistry,
    ) -> Result<()> {
        container.bind_instance(&Token::<AppConfig>::of(), config.clone(), &[])?;
        container.bind_instance(&Token::<UpdateService>::of(), Rc::new(updates.clone()), &[])?;
        container.bind_instance(&Token::<ViewBinder>::of(), binder.clone(), &[])?;
        container.bind_instance(&Token::<TaskQueue>::of(), scheduler.clone(), &[])?;
        let erased: Rc<dyn Scheduler> = scheduler.clone();
        container.bind_instance(&Token::<dyn Scheduler>::of(), erased, &[])?;
        container.bind_instance(&Token::<AssetLoader>::of(), assets.clone(), &[])?;
        container.bind_instance(&Token::<MetricsRegistry>::of(), Rc::new(metrics.clone()), &[])?;
        Ok(())
    }

    /// Adds a feature module. Modules added after configuration are not
    /// configured.
    pub fn add_module(&mut self, module: impl ModuleBinding + 'static) -> &mut Self {
        if self.configured {
            log::warn!("App: module '{}' added after configuration", module.name());
        }
        self.modules.push(Box::new(module));
        self
    }

    /// Runs every module's `configure_di`, then every `configure_views`.
    ///
    /// Runs once. A failure leaves the app unconfigured so the call may be
    /// retried.
    pub fn configure(&mut self) -> Result<()> {
        if self.configured {
            return Ok(());
        }
        self.configured = true;
        let result = self.run_configuration();
        if result.is_err() {
            self.configured = false;
        }
        result
    }

    fn run_configuration(&self) -> Result<()> {
        for module in &self.modules {
            module
                .configure_di(&self.container)
                .with_context(|| format!("Module '{}' failed to configure DI", module.name()))?;
        }
        for module in &self.modules {
            module
                .configure_views(&self.views)
                .with_context(|| format!("Module '{}' failed to register views", module.name()))?;
        }
        log::info!("App: configured {} module(s)", self.modules.len());
        Ok(())
    }

    /// Configures the app and requests every module's assets.
    pub fn initialize(&mut self) -> Result<()> {
        self.configure()?;
        let requested = self.request_assets()?;
        log::info!("App: initialized, {requested} asset request(s) issued");
        Ok(())
    }

    /// Issues the module and manifest asset requests with the configured
    /// url overrides applied. Returns how many requests were issued.
    pub fn request_assets(&mut self) -> Result<usize> {
        let mut requests: Vec<AssetRequest> = self
            .modules
            .iter()
            .flat_map(|module| module.asset_requests())
            .collect();
        if let Some(path) = &self.config.asset_manifest {
            let manifest = AssetManifest::load(path)
                .with_context(|| format!("Failed to load asset manifest {}", path.display()))?;
            requests.extend(manifest.requests().context("Invalid asset manifest")?);
        }

        for request in &requests {
            let request = match self.config.asset_overrides.get(&request.id) {
                Some(url) => AssetRequest::new(request.asset_type, request.id.clone(), url.clone()),
                None => request.clone(),
            };
            self.assets
                .load(&request)
                .with_context(|| format!("Failed to request asset '{}'", request.id))?;
        }
        self.poll_assets();
        Ok(requests.len())
    }

    /// Drives in-flight asset loads as far as they can go without blocking
    /// and records failures.
    pub fn poll_assets(&mut self) {
        self.pool.run_until_stalled();
        for event in self.asset_events.drain() {
            match event {
                AssetEvent::Loaded { id } => log::debug!("App: asset '{id}' ready"),
                AssetEvent::Failed { id, error } => {
                    log::warn!("App: asset '{id}' failed: {error}");
                    self.failures.push((id, error));
                }
            }
        }
    }

    /// The load gate: every requested asset has settled.
    pub fn is_loaded(&self) -> bool {
        self.assets.is_complete()
    }

    /// Assets whose load failed, in settlement order.
    pub fn asset_failures(&self) -> &[(String, AssetError)] {
        &self.failures
    }

    /// Runs one frame: update callbacks, due scheduled tasks, then asset
    /// loads.
    pub fn step(&mut self, dt: f32) {
        if self.destroyed {
            return;
        }
        self.updates.tick(dt);
        self.scheduler.pump();
        self.poll_assets();
        if let Some(frames) = &self.frames {
            if let Err(e) = frames.increment() {
                log::trace!("App: frame counter: {e}");
            }
        }
    }

    /// Resizes the layers and the views. The configured fixed size, if any,
    /// replaces `width`/`height`.
    pub fn resize(&mut self, width: f32, height: f32, dpr: f32) {
        let width = self.config.width.map_or(width, |w| w as f32);
        let height = self.config.height.map_or(height, |h| h as f32);
        log::debug!("App: resize to {width}x{height} @ {dpr}");
        self.size = Some((width, height, dpr));
        for layer in self.world.iter().chain(self.hud.iter()) {
            layer.resize(width, height, dpr);
        }
        self.views.resize(width, height, dpr);
    }

    /// Resizes from a measured size: the fixed size wins, the result is
    /// floored and at least 1x1.
    pub fn request_resize(&mut self, measured_width: f32, measured_height: f32, dpr: f32) {
        let (width, height) = self.config.effective_size(measured_width, measured_height);
        self.resize(width, height, dpr);
    }

    /// Last size applied, as `(width, height, dpr)`.
    pub fn size(&self) -> Option<(f32, f32, f32)> {
        self.size
    }

    /// Makes a new `V` the active screen on its registered layer.
    ///
    /// Fails before configuration or while assets are still loading.
    pub fn create_screen<V: Screen>(&self, transition: &Transition) -> Result<ViewHandle<V>> {
        ensure!(self.configured, "App is not configured");
        ensure!(
            self.is_loaded(),
            "Assets are still loading ({}/{})",
            self.assets.loaded_items(),
            self.assets.total_items()
        );
        self.views
            .create_screen::<V>(None, transition)
            .with_context(|| format!("Failed to create screen {}", type_name::<V>()))
    }

    /// Tears down update callbacks, bound pairs, screens and pending tasks.
    /// Runs once.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        log::info!("App: shutting down");
        self.updates.clear();
        self.binder.destroy_all();
        self.views.destroy_screens();
        self.scheduler.clear();
    }

    /// The configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The dependency container.
    pub fn container(&self) -> &Rc<Container> {
        &self.container
    }

    /// The per-frame update service.
    pub fn update_service(&self) -> &UpdateService {
        &self.updates
    }

    /// The view/controller binder.
    pub fn view_binder(&self) -> &Rc<ViewBinder> {
        &self.binder
    }

    /// The frame scheduler.
    pub fn scheduler(&self) -> &Rc<TaskQueue> {
        &self.scheduler
    }

    /// The asset loader.
    pub fn assets(&self) -> &Rc<AssetLoader> {
        &self.assets
    }

    /// The view factory.
    pub fn views(&self) -> &ViewFactory {
        &self.views
    }

    /// The metrics registry.
    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// The world layer, in `3d` and `hybrid` modes.
    pub fn world(&self) -> Option<&Rc<LayerContainer>> {
        self.world.as_ref()
    }

    /// The HUD layer, in `2d` and `hybrid` modes.
    pub fn hud(&self) -> Option<&Rc<LayerContainer>> {
        self.hud.as_ref()
    }

    /// Whether [`configure`](App::configure) has succeeded.
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Whether [`destroy`](App::destroy) has run.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.destroy();
    }
}
