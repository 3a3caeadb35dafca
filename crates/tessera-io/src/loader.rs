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

use crate::asset::{AssetRequest, AssetType, GltfAsset, LoadedAsset, TextureAsset};
use crate::decode::decode;
use crate::error::AssetError;
use crate::fetch::AssetFetcher;
use futures::future::{self, FutureExt, LocalBoxFuture, Shared};
use futures::task::{LocalSpawn, LocalSpawnExt};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use tessera_telemetry::{
    CounterHandle, HistogramHandle, MetricsRegistry, MetricsResult, ScopedMetricTimer,
};

/// Completion of one asset load. Cloneable; every clone resolves to the
/// same result.
pub type LoadHandle = Shared<LocalBoxFuture<'static, Result<(), AssetError>>>;

/// Published when a load settles.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetEvent {
    /// The asset is now available through [`AssetLoader::get_asset`].
    Loaded {
        /// Logical asset id.
        id: String,
    },
    /// The load failed. It is retried only if requested again.
    Failed {
        /// Logical asset id.
        id: String,
        /// Why it failed.
        error: AssetError,
    },
}

#[derive(Clone)]
struct LoaderMetrics {
    requested_total: CounterHandle,
    settled_total: CounterHandle,
    failed_total: CounterHandle,
    fetch_time: HistogramHandle,
}

impl LoaderMetrics {
    fn register(registry: &MetricsRegistry) -> MetricsResult<Self> {
        Ok(Self {
            requested_total: registry.register_counter(
                "assets",
                "requested_total",
                "Distinct asset ids dispatched",
            )?,
            settled_total: registry.register_counter(
                "assets",
                "settled_total",
                "Asset loads settled, successfully or not",
            )?,
            failed_total: registry.register_counter(
                "assets",
                "failed_total",
                "Asset loads that failed",
            )?,
            fetch_time: registry.register_histogram(
                "assets",
                "fetch_time",
                "Time from dispatch to decoded asset",
                "ms",
                vec![1.0, 5.0, 16.0, 33.0, 100.0, 500.0],
            )?,
        })
    }

    fn bump(counter: &CounterHandle) {
        if let Err(e) = counter.increment() {
            log::warn!("AssetLoader: failed to update {}: {e}", counter.id());
        }
    }
}

#[derive(Default)]
struct LoaderState {
    assets_by_id: HashMap<String, LoadedAsset>,
    failed_by_id: HashMap<String, AssetError>,
    inflight_by_id: HashMap<String, LoadHandle>,
    total_items: usize,
    loaded_items: usize,
}

/// De-duplicating asset loader.
///
/// Each id is dispatched once until it loads; a failed id is dispatched
/// again only when it is requested again. `total_items` counts dispatches
/// and `loaded_items` counts those that settled, successfully or not; the
/// two being equal is the load gate. Loaded assets are kept for the
/// loader's lifetime.
///
/// Loads are spawned on the supplied [`LocalSpawn`], so they make progress
/// whether or not anyone awaits the returned handle.
pub struct AssetLoader {
    state: Rc<RefCell<LoaderState>>,
    fetcher: Rc<dyn AssetFetcher>,
    spawner: Box<dyn LocalSpawn>,
    metrics: Option<LoaderMetrics>,
    events: Option<flume::Sender<AssetEvent>>,
}

impl AssetLoader {
    /// Creates a loader fetching through `fetcher` and running loads on
    /// `spawner`.
    pub fn new(fetcher: Rc<dyn AssetFetcher>, spawner: impl LocalSpawn + 'static) -> Self {
        Self {
            state: Rc::new(RefCell::new(LoaderState::default())),
            fetcher,
            spawner: Box::new(spawner),
            metrics: None,
            events: None,
        }
    }

    /// Records request, settle and timing metrics into `registry`.
    pub fn with_metrics(mut self, registry: &MetricsRegistry) -> Self {
        self.metrics = match LoaderMetrics::register(registry) {
            Ok(metrics) => Some(metrics),
            Err(e) => {
                log::warn!("AssetLoader: metrics unavailable: {e}");
                None
            }
        };
        self
    }

    /// Publishes an [`AssetEvent`] through `sender` whenever a load settles.
    pub fn with_event_sender(mut self, sender: flume::Sender<AssetEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Requests `request.id`.
    ///
    /// - Already loaded: returns a settled handle; nothing is counted or
    ///   dispatched.
    /// - In flight: returns a handle to the pending load.
    /// - Otherwise, including after an earlier failure: counts the id,
    ///   dispatches the fetch and decode, and returns its handle.
    pub fn load(&self, request: &AssetRequest) -> Result<LoadHandle, AssetError> {
        {
            let state = self.state.borrow();
            if state.assets_by_id.contains_key(&request.id) {
                return Ok(settled(Ok(())));
            }
            if let Some(pending) = state.inflight_by_id.get(&request.id) {
                log::trace!("AssetLoader: '{}' already in flight", request.id);
                return Ok(pending.clone());
            }
            if state.failed_by_id.contains_key(&request.id) {
                log::info!("AssetLoader: retrying '{}'", request.id);
            }
        }

        log::info!(
            "AssetLoader: loading {} '{}' from {}",
            request.asset_type,
            request.id,
            request.url
        );
        let handle = self.dispatch(request);
        {
            let mut state = self.state.borrow_mut();
            state.total_items += 1;
            state
                .inflight_by_id
                .insert(request.id.clone(), handle.clone());
        }

        if let Some(metrics) = &self.metrics {
            LoaderMetrics::bump(&metrics.requested_total);
        }

        if let Err(e) = self.spawner.spawn_local(handle.clone().map(|_| ())) {
            let mut state = self.state.borrow_mut();
            state.inflight_by_id.remove(&request.id);
            state.total_items -= 1;
            return Err(AssetError::Spawn(e.to_string()));
        }
        Ok(handle)
    }

    /// Builds a request from its parts and loads it.
    pub fn load_parts(
        &self,
        asset_type: AssetType,
        id: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<LoadHandle, AssetError> {
        self.load(&AssetRequest::new(asset_type, id, url))
    }

    /// Loads with the type given by name; unknown names fail with
    /// [`AssetError::UnsupportedAssetType`].
    pub fn load_typed(
        &self,
        type_name: &str,
        id: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<LoadHandle, AssetError> {
        self.load(&AssetRequest::parse(type_name, id, url)?)
    }

    /// Loads every request, in order.
    pub fn load_all<'a>(
        &self,
        requests: impl IntoIterator<Item = &'a AssetRequest>,
    ) -> Result<Vec<LoadHandle>, AssetError> {
        requests.into_iter().map(|request| self.load(request)).collect()
    }

    /// The realized asset for `id`, if it has loaded.
    pub fn get_asset(&self, id: &str) -> Option<LoadedAsset> {
        self.state.borrow().assets_by_id.get(id).cloned()
    }

    /// The texture loaded under `id`.
    pub fn texture(&self, id: &str) -> Option<Rc<TextureAsset>> {
        match self.get_asset(id)? {
            LoadedAsset::Texture(texture) => Some(texture),
            _ => None,
        }
    }

    /// The glTF document loaded under `id`.
    pub fn gltf(&self, id: &str) -> Option<Rc<GltfAsset>> {
        match self.get_asset(id)? {
            LoadedAsset::Gltf(gltf) => Some(gltf),
            _ => None,
        }
    }

    /// The error the last settled load of `id` failed with, until a later
    /// load of `id` succeeds.
    pub fn failure(&self, id: &str) -> Option<AssetError> {
        self.state.borrow().failed_by_id.get(id).cloned()
    }

    /// Returns `true` while `id` is being loaded.
    pub fn is_loading(&self, id: &str) -> bool {
        self.state.borrow().inflight_by_id.contains_key(id)
    }

    /// Dispatches so far.
    pub fn total_items(&self) -> usize {
        self.state.borrow().total_items
    }

    /// Dispatched ids that have settled.
    pub fn loaded_items(&self) -> usize {
        self.state.borrow().loaded_items
    }

    /// The load gate: every dispatched id has settled.
    pub fn is_complete(&self) -> bool {
        let state = self.state.borrow();
        state.loaded_items == state.total_items
    }

    /// Settled fraction in `[0, 1]`; `1.0` when nothing was requested.
    pub fn progress(&self) -> f32 {
        let state = self.state.borrow();
        if state.total_items == 0 {
            1.0
        } else {
            state.loaded_items as f32 / state.total_items as f32
        }
    }

    fn dispatch(&self, request: &AssetRequest) -> LoadHandle {
        let fetch = self.fetcher.fetch(&request.url);
        let weak_state = Rc::downgrade(&self.state);
        let metrics = self.metrics.clone();
        let events = self.events.clone();
        let request = request.clone();

        async move {
            let result = {
                let _timer = metrics
                    .as_ref()
                    .map(|metrics| ScopedMetricTimer::new(&metrics.fetch_time));
                match fetch.await {
                    Ok(bytes) => decode(request.asset_type, &request.id, &bytes),
                    Err(e) => Err(e),
                }
            };
            settle(&weak_state, &request, result, metrics.as_ref(), events.as_ref())
        }
        .boxed_local()
        .shared()
    }
}

fn settled(result: Result<(), AssetError>) -> LoadHandle {
    future::ready(result).boxed_local().shared()
}

fn settle(
    state: &Weak<RefCell<LoaderState>>,
    request: &AssetRequest,
    result: Result<LoadedAsset, AssetError>,
    metrics: Option<&LoaderMetrics>,
    events: Option<&flume::Sender<AssetEvent>>,
) -> Result<(), AssetError> {
    if let Some(state) = state.upgrade() {
        let mut state = state.borrow_mut();
        state.inflight_by_id.remove(&request.id);
        match &result {
            Ok(asset) => {
                state.failed_by_id.remove(&request.id);
                state.assets_by_id.insert(request.id.clone(), asset.clone());
            }
            Err(error) => {
                state.failed_by_id.insert(request.id.clone(), error.clone());
            }
        }
        state.loaded_items += 1;
    }

    if let Some(metrics) = metrics {
        LoaderMetrics::bump(&metrics.settled_total);
        if result.is_err() {
            LoaderMetrics::bump(&metrics.failed_total);
        }
    }

    let event = match &result {
        Ok(_) => {
            log::info!("AssetLoader: '{}' loaded", request.id);
            AssetEvent::Loaded {
                id: request.id.clone(),
            }
        }
        Err(error) => {
            log::warn!("AssetLoader: '{}' failed: {error}", request.id);
            AssetEvent::Failed {
                id: request.id.clone(),
                error: error.clone(),
            }
        }
    };
    if let Some(events) = events {
        if events.send(event).is_err() {
            log::debug!("AssetLoader: event receiver dropped");
        }
    }

    result.map(|_| ())
}

impl fmt::Debug for AssetLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("AssetLoader")
            .field("total_items", &state.total_items)
            .field("loaded_items", &state.loaded_items)
            .field("inflight", &state.inflight_by_id.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MemoryFetcher;
    use futures::executor::LocalPool;

    const GLTF: &[u8] = br#"{"asset":{"version":"2.0"}}"#;

    #[test]
    fn progress_is_full_when_nothing_requested() {
        let pool = LocalPool::new();
        let loader = AssetLoader::new(Rc::new(MemoryFetcher::new()), pool.spawner());
        assert_eq!(loader.progress(), 1.0);
        assert!(loader.is_complete());
    }

    #[test]
    fn load_settles_when_the_pool_runs() {
        let mut pool = LocalPool::new();
        let fetcher = Rc::new(MemoryFetcher::new());
        fetcher.insert("ship.gltf", GLTF);
        let loader = AssetLoader::new(fetcher, pool.spawner());

        loader.load_parts(AssetType::Gltf, "ship", "ship.gltf").unwrap();
        assert_eq!((loader.total_items(), loader.loaded_items()), (1, 0));
        assert!(loader.is_loading("ship"));
        assert!(!loader.is_complete());

        pool.run_until_stalled();
        assert!(loader.is_complete());
        assert!(loader.gltf("ship").is_some());
        assert!(loader.texture("ship").is_none());
    }

    #[test]
    fn load_typed_rejects_unknown_types_without_counting() {
        let pool = LocalPool::new();
        let loader = AssetLoader::new(Rc::new(MemoryFetcher::new()), pool.spawner());
        let err = loader.load_typed("audio", "music", "music.ogg").unwrap_err();
        assert_eq!(err, AssetError::UnsupportedAssetType("audio".into()));
        assert_eq!(loader.total_items(), 0);
    }

    #[test]
    fn metrics_track_requests_and_failures() {
        let mut pool = LocalPool::new();
        let registry = MetricsRegistry::new();
        let fetcher = Rc::new(MemoryFetcher::new());
        fetcher.insert("ok.gltf", GLTF);
        let loader = AssetLoader::new(fetcher, pool.spawner()).with_metrics(&registry);

        loader.load_parts(AssetType::Gltf, "ok", "ok.gltf").unwrap();
        loader.load_parts(AssetType::Gltf, "ok", "ok.gltf").unwrap();
        loader.load_parts(AssetType::Gltf, "missing", "missing.gltf").unwrap();
        pool.run_until_stalled();

        let value = |name: &str| {
            registry
                .get_metric(&tessera_telemetry::MetricId::new("assets", name))
                .unwrap()
                .value
                .as_counter()
                .unwrap()
        };
        assert_eq!(value("requested_total"), 2);
        assert_eq!(value("settled_total"), 2);
        assert_eq!(value("failed_total"), 1);
    }
}
