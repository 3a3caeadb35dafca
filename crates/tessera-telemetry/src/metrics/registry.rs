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

use super::storage::{InMemoryBackend, MetricsBackend};
use super::types::{Metric, MetricId, MetricSnapshot, MetricType, MetricsError, MetricsResult};
use std::rc::Rc;

/// Entry point of the metrics system.
///
/// Registering a metric returns a typed handle that writes straight to the
/// backend. Registering an id that already exists with the same kind returns
/// a handle to the existing metric and keeps its value.
#[derive(Debug, Clone)]
pub struct MetricsRegistry {
    backend: Rc<dyn MetricsBackend>,
}

impl MetricsRegistry {
    /// Creates a registry over a fresh [`InMemoryBackend`].
    pub fn new() -> Self {
        Self::with_backend(Rc::new(InMemoryBackend::new()))
    }

    /// Creates a registry over a custom backend.
    pub fn with_backend(backend: Rc<dyn MetricsBackend>) -> Self {
        Self { backend }
    }

    /// Registers (or reuses) a counter.
    pub fn register_counter(
        &self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> MetricsResult<CounterHandle> {
        let id = MetricId::new(namespace, name);
        self.ensure(&id, MetricType::Counter, || {
            Metric::counter(id.clone(), description)
        })?;
        Ok(CounterHandle {
            id,
            backend: self.backend.clone(),
        })
    }

    /// Registers (or reuses) a gauge.
    pub fn register_gauge(
        &self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        unit: impl Into<String>,
    ) -> MetricsResult<GaugeHandle> {
        let id = MetricId::new(namespace, name);
        self.ensure(&id, MetricType::Gauge, || {
            Metric::gauge(id.clone(), description, unit)
        })?;
        Ok(GaugeHandle {
            id,
            backend: self.backend.clone(),
        })
    }

    /// Registers (or reuses) a histogram.
    pub fn register_histogram(
        &self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        unit: impl Into<String>,
        buckets: Vec<f64>,
    ) -> MetricsResult<HistogramHandle> {
        let id = MetricId::new(namespace, name);
        self.ensure(&id, MetricType::Histogram, || {
            Metric::histogram(id.clone(), description, unit, buckets)
        })?;
        Ok(HistogramHandle {
            id,
            backend: self.backend.clone(),
        })
    }

    /// Returns a copy of the metric stored under `id`.
    pub fn get_metric(&self, id: &MetricId) -> MetricsResult<Metric> {
        self.backend.get_metric(id)
    }

    /// Returns `true` if `id` is registered.
    pub fn contains_metric(&self, id: &MetricId) -> bool {
        self.backend.contains_metric(id)
    }

    /// Number of registered metrics.
    pub fn metric_count(&self) -> usize {
        self.backend.metric_count()
    }

    /// Summaries of every metric in `namespace`, sorted by id.
    pub fn namespace_snapshot(&self, namespace: &str) -> Vec<MetricSnapshot> {
        let mut metrics: Vec<Metric> = self
            .backend
            .list_all_metrics()
            .into_iter()
            .filter(|metric| metric.metadata.id.namespace == namespace)
            .collect();
        metrics.sort_by(|a, b| a.metadata.id.cmp(&b.metadata.id));
        metrics.iter().map(Metric::snapshot).collect()
    }

    /// Summaries of every metric, sorted by id.
    pub fn snapshot(&self) -> Vec<MetricSnapshot> {
        let mut metrics = self.backend.list_all_metrics();
        metrics.sort_by(|a, b| a.metadata.id.cmp(&b.metadata.id));
        metrics.iter().map(Metric::snapshot).collect()
    }

    /// [`MetricsRegistry::snapshot`] rendered as pretty-printed JSON.
    pub fn snapshot_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
    }

    fn ensure(
        &self,
        id: &MetricId,
        metric_type: MetricType,
        create: impl FnOnce() -> Metric,
    ) -> MetricsResult<()> {
        match self.backend.get_metric(id) {
            Ok(existing) if existing.metadata.metric_type == metric_type => Ok(()),
            Ok(existing) => Err(MetricsError::TypeMismatch {
                expected: metric_type,
                found: existing.metadata.metric_type,
            }),
            Err(MetricsError::MetricNotFound(_)) => self.backend.put_metric(create()),
            Err(e) => Err(e),
        }
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Write handle for a counter.
#[derive(Debug, Clone)]
pub struct CounterHandle {
    id: MetricId,
    backend: Rc<dyn MetricsBackend>,
}

impl CounterHandle {
    /// Adds one and returns the new value.
    pub fn increment(&self) -> MetricsResult<u64> {
        self.backend.increment_counter(&self.id, 1)
    }

    /// Adds `amount` and returns the new value.
    pub fn increment_by(&self, amount: u64) -> MetricsResult<u64> {
        self.backend.increment_counter(&self.id, amount)
    }

    /// Current value.
    pub fn get(&self) -> MetricsResult<u64> {
        let metric = self.backend.get_metric(&self.id)?;
        metric
            .value
            .as_counter()
            .ok_or(MetricsError::TypeMismatch {
                expected: MetricType::Counter,
                found: metric.value.metric_type(),
            })
    }

    /// The counter's id.
    pub fn id(&self) -> &MetricId {
        &self.id
    }
}

/// Write handle for a gauge.
#[derive(Debug, Clone)]
pub struct GaugeHandle {
    id: MetricId,
    backend: Rc<dyn MetricsBackend>,
}

impl GaugeHandle {
    /// Sets the gauge.
    pub fn set(&self, value: f64) -> MetricsResult<()> {
        self.backend.set_gauge(&self.id, value)
    }

    /// Current value.
    pub fn get(&self) -> MetricsResult<f64> {
        let metric = self.backend.get_metric(&self.id)?;
        metric.value.as_gauge().ok_or(MetricsError::TypeMismatch {
            expected: MetricType::Gauge,
            found: metric.value.metric_type(),
        })
    }

    /// The gauge's id.
    pub fn id(&self) -> &MetricId {
        &self.id
    }
}

/// Write handle for a histogram.
#[derive(Debug, Clone)]
pub struct HistogramHandle {
    id: MetricId,
    backend: Rc<dyn MetricsBackend>,
}

impl HistogramHandle {
    /// Records one sample.
    pub fn observe(&self, value: f64) -> MetricsResult<()> {
        self.backend.record_histogram_sample(&self.id, value)
    }

    /// Number of samples recorded so far.
    pub fn sample_count(&self) -> MetricsResult<usize> {
        let metric = self.backend.get_metric(&self.id)?;
        metric
            .value
            .samples()
            .map(<[f64]>::len)
            .ok_or(MetricsError::TypeMismatch {
                expected: MetricType::Histogram,
                found: metric.value.metric_type(),
            })
    }

    /// The histogram's id.
    pub fn id(&self) -> &MetricId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_registration_and_operations() {
        let registry = MetricsRegistry::new();
        let counter = registry
            .register_counter("assets", "requested_total", "Distinct asset ids requested")
            .unwrap();

        assert_eq!(counter.increment().unwrap(), 1);
        assert_eq!(counter.increment_by(5).unwrap(), 6);
        assert_eq!(counter.get().unwrap(), 6);
        assert!(registry.contains_metric(counter.id()));
        assert_eq!(registry.metric_count(), 1);
    }

    #[test]
    fn reregistering_keeps_the_existing_value() {
        let registry = MetricsRegistry::new();
        let first = registry.register_counter("assets", "settled_total", "").unwrap();
        first.increment_by(3).unwrap();

        let second = registry.register_counter("assets", "settled_total", "").unwrap();
        assert_eq!(second.get().unwrap(), 3);
        assert_eq!(registry.metric_count(), 1);
    }

    #[test]
    fn reregistering_as_another_kind_fails() {
        let registry = MetricsRegistry::new();
        registry.register_counter("views", "screens", "").unwrap();
        let err = registry
            .register_gauge("views", "screens", "", "count")
            .unwrap_err();
        assert_eq!(
            err,
            MetricsError::TypeMismatch {
                expected: MetricType::Gauge,
                found: MetricType::Counter,
            }
        );
    }

    #[test]
    fn gauge_and_histogram_handles() {
        let registry = MetricsRegistry::new();
        let gauge = registry
            .register_gauge("assets", "progress", "Load gate progress", "ratio")
            .unwrap();
        gauge.set(0.5).unwrap();
        assert_eq!(gauge.get().unwrap(), 0.5);

        let histogram = registry
            .register_histogram("assets", "fetch_time", "Fetch duration", "ms", vec![1.0, 10.0])
            .unwrap();
        histogram.observe(2.5).unwrap();
        histogram.observe(15.0).unwrap();
        assert_eq!(histogram.sample_count().unwrap(), 2);
    }

    #[test]
    fn snapshots_are_sorted_and_filtered() {
        let registry = MetricsRegistry::new();
        registry.register_counter("b", "two", "").unwrap();
        registry.register_counter("a", "one", "").unwrap();
        registry.register_counter("b", "one", "").unwrap();

        let ids: Vec<String> = registry.snapshot().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["a:one", "b:one", "b:two"]);
        assert_eq!(registry.namespace_snapshot("b").len(), 2);
    }

    #[test]
    fn json_snapshot_names_the_metric_kind() {
        let registry = MetricsRegistry::new();
        registry
            .register_counter("assets", "requested_total", "")
            .unwrap()
            .increment_by(2)
            .unwrap();

        let json: serde_json::Value = serde_json::from_str(&registry.snapshot_json().unwrap()).unwrap();
        assert_eq!(json[0]["id"], "assets:requested_total");
        assert_eq!(json[0]["type"], "counter");
        assert_eq!(json[0]["value"], 2.0);
    }
}
