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

use serde::Serialize;
use std::fmt;
use std::time::Instant;

/// Identifies a metric as `namespace:name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricId {
    /// Broad category, e.g. `assets`.
    pub namespace: String,
    /// Metric name within the namespace, e.g. `fetch_time`.
    pub name: String,
}

impl MetricId {
    /// Creates an id from its two parts.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

/// Kind of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    /// Monotonic count.
    Counter,
    /// Value that moves both ways.
    Gauge,
    /// Distribution of samples.
    Histogram,
}

/// Current value of a metric.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// Counter value.
    Counter(u64),
    /// Gauge value.
    Gauge(f64),
    /// Recorded samples and their bucket distribution.
    Histogram {
        /// Raw samples in recording order.
        samples: Vec<f64>,
        /// Inclusive upper bound of each bucket.
        bucket_bounds: Vec<f64>,
        /// Number of samples at or below each bound.
        bucket_counts: Vec<u64>,
    },
}

impl MetricValue {
    /// The [`MetricType`] of this value.
    pub fn metric_type(&self) -> MetricType {
        match self {
            MetricValue::Counter(_) => MetricType::Counter,
            MetricValue::Gauge(_) => MetricType::Gauge,
            MetricValue::Histogram { .. } => MetricType::Histogram,
        }
    }

    /// The counter value, if this is a counter.
    pub fn as_counter(&self) -> Option<u64> {
        match self {
            MetricValue::Counter(v) => Some(*v),
            _ => None,
        }
    }

    /// The gauge value, if this is a gauge.
    pub fn as_gauge(&self) -> Option<f64> {
        match self {
            MetricValue::Gauge(v) => Some(*v),
            _ => None,
        }
    }

    /// The recorded samples, if this is a histogram.
    pub fn samples(&self) -> Option<&[f64]> {
        match self {
            MetricValue::Histogram { samples, .. } => Some(samples),
            _ => None,
        }
    }
}

/// Static description of a metric.
#[derive(Debug, Clone)]
pub struct MetricMetadata {
    /// The metric's id.
    pub id: MetricId,
    /// The metric's kind.
    pub metric_type: MetricType,
    /// Human-readable description.
    pub description: String,
    /// Unit of measurement, e.g. `ms`.
    pub unit: String,
    /// Time of the last write.
    pub last_updated: Instant,
}

/// A metric: metadata plus current value.
#[derive(Debug, Clone)]
pub struct Metric {
    /// Static description.
    pub metadata: MetricMetadata,
    /// Current value.
    pub value: MetricValue,
}

impl Metric {
    fn with_value(
        id: MetricId,
        description: impl Into<String>,
        unit: impl Into<String>,
        value: MetricValue,
    ) -> Self {
        Self {
            metadata: MetricMetadata {
                id,
                metric_type: value.metric_type(),
                description: description.into(),
                unit: unit.into(),
                last_updated: Instant::now(),
            },
            value,
        }
    }

    /// A counter starting at zero.
    pub fn counter(id: MetricId, description: impl Into<String>) -> Self {
        Self::with_value(id, description, "count", MetricValue::Counter(0))
    }

    /// A gauge starting at zero.
    pub fn gauge(id: MetricId, description: impl Into<String>, unit: impl Into<String>) -> Self {
        Self::with_value(id, description, unit, MetricValue::Gauge(0.0))
    }

    /// An empty histogram with the given bucket bounds.
    pub fn histogram(
        id: MetricId,
        description: impl Into<String>,
        unit: impl Into<String>,
        bucket_bounds: Vec<f64>,
    ) -> Self {
        let bucket_counts = vec![0; bucket_bounds.len()];
        Self::with_value(
            id,
            description,
            unit,
            MetricValue::Histogram {
                samples: Vec::new(),
                bucket_bounds,
                bucket_counts,
            },
        )
    }

    /// Flattens the metric into a serialisable summary.
    pub fn snapshot(&self) -> MetricSnapshot {
        let (value, samples) = match &self.value {
            MetricValue::Counter(v) => (*v as f64, 0),
            MetricValue::Gauge(v) => (*v, 0),
            MetricValue::Histogram { samples, .. } if samples.is_empty() => (0.0, 0),
            MetricValue::Histogram { samples, .. } => {
                (samples.iter().sum::<f64>() / samples.len() as f64, samples.len())
            }
        };
        MetricSnapshot {
            id: self.metadata.id.to_string(),
            metric_type: self.metadata.metric_type,
            unit: self.metadata.unit.clone(),
            value,
            samples,
        }
    }
}

/// Serialisable summary of a metric. Histograms report their mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSnapshot {
    /// `namespace:name`.
    pub id: String,
    /// The metric's kind.
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    /// Unit of measurement.
    pub unit: String,
    /// Counter or gauge value, or histogram mean.
    pub value: f64,
    /// Number of histogram samples; zero for other kinds.
    pub samples: usize,
}

/// Result alias for metric operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// Errors raised by the metrics system.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricsError {
    /// No metric is registered under this id.
    #[error("metric not found: {0}")]
    MetricNotFound(MetricId),
    /// The operation does not apply to this kind of metric.
    #[error("type mismatch: expected {expected:?}, found {found:?}")]
    TypeMismatch {
        /// Kind the operation needs.
        expected: MetricType,
        /// Kind actually stored.
        found: MetricType,
    },
    /// The storage layer failed.
    #[error("storage error: {0}")]
    StorageError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_displays_as_namespace_and_name() {
        assert_eq!(MetricId::new("assets", "fetch_time").to_string(), "assets:fetch_time");
    }

    #[test]
    fn histogram_snapshot_reports_mean() {
        let mut metric = Metric::histogram(MetricId::new("a", "b"), "test", "ms", vec![10.0]);
        if let MetricValue::Histogram { samples, .. } = &mut metric.value {
            samples.extend([2.0, 4.0]);
        }
        let snapshot = metric.snapshot();
        assert_eq!(snapshot.value, 3.0);
        assert_eq!(snapshot.samples, 2);
        assert_eq!(snapshot.metric_type, MetricType::Histogram);
    }
}
