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

use super::types::{Metric, MetricId, MetricType, MetricValue, MetricsError, MetricsResult};
use std::collections::HashMap;
use std::fmt::Debug;
use std::cell::RefCell;

/// Storage contract behind [`MetricsRegistry`](super::MetricsRegistry).
pub trait MetricsBackend: Debug + 'static {
    /// Inserts or replaces a metric.
    fn put_metric(&self, metric: Metric) -> MetricsResult<()>;

    /// Returns a copy of the metric stored under `id`.
    fn get_metric(&self, id: &MetricId) -> MetricsResult<Metric>;

    /// Returns `true` if `id` is stored.
    fn contains_metric(&self, id: &MetricId) -> bool;

    /// Returns every stored metric.
    fn list_all_metrics(&self) -> Vec<Metric>;

    /// Number of stored metrics.
    fn metric_count(&self) -> usize;

    /// Adds `delta` to a counter and returns the new value.
    fn increment_counter(&self, id: &MetricId, delta: u64) -> MetricsResult<u64> {
        let mut metric = self.get_metric(id)?;
        match metric.value {
            MetricValue::Counter(ref mut value) => {
                *value = value.saturating_add(delta);
                let result = *value;
                metric.metadata.last_updated = std::time::Instant::now();
                self.put_metric(metric)?;
                Ok(result)
            }
            _ => Err(MetricsError::TypeMismatch {
                expected: MetricType::Counter,
                found: metric.value.metric_type(),
            }),
        }
    }

    /// Sets a gauge.
    fn set_gauge(&self, id: &MetricId, value: f64) -> MetricsResult<()> {
        let mut metric = self.get_metric(id)?;
        match metric.value {
            MetricValue::Gauge(ref mut gauge) => {
                *gauge = value;
                metric.metadata.last_updated = std::time::Instant::now();
                self.put_metric(metric)
            }
            _ => Err(MetricsError::TypeMismatch {
                expected: MetricType::Gauge,
                found: metric.value.metric_type(),
            }),
        }
    }

    /// Records one histogram sample.
    fn record_histogram_sample(&self, id: &MetricId, sample: f64) -> MetricsResult<()> {
        let mut metric = self.get_metric(id)?;
        match metric.value {
            MetricValue::Histogram {
                ref mut samples,
                ref bucket_bounds,
                ref mut bucket_counts,
            } => {
                samples.push(sample);
                for (count, &bound) in bucket_counts.iter_mut().zip(bucket_bounds) {
                    if sample <= bound {
                        *count += 1;
                    }
                }
                metric.metadata.last_updated = std::time::Instant::now();
                self.put_metric(metric)
            }
            _ => Err(MetricsError::TypeMismatch {
                expected: MetricType::Histogram,
                found: metric.value.metric_type(),
            }),
        }
    }
}

/// In-process storage for a single-threaded runtime.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    storage: RefCell<HashMap<MetricId, Metric>>,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetricsBackend for InMemoryBackend {
    fn put_metric(&self, metric: Metric) -> MetricsResult<()> {
        let mut storage = self.storage.try_borrow_mut().map_err(|_| {
            MetricsError::StorageError("metric storage is already borrowed".to_string())
        })?;
        storage.insert(metric.metadata.id.clone(), metric);
        Ok(())
    }

    fn get_metric(&self, id: &MetricId) -> MetricsResult<Metric> {
        self.storage
            .borrow()
            .get(id)
            .cloned()
            .ok_or_else(|| MetricsError::MetricNotFound(id.clone()))
    }

    fn contains_metric(&self, id: &MetricId) -> bool {
        self.storage.borrow().contains_key(id)
    }

    fn list_all_metrics(&self) -> Vec<Metric> {
        self.storage.borrow().values().cloned().collect()
    }

    fn metric_count(&self) -> usize {
        self.storage.borrow().len()
    }
}
