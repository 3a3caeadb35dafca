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

//! Metric definitions, storage and the registry handing out typed handles.

mod registry;
mod storage;
mod types;

pub use registry::{CounterHandle, GaugeHandle, HistogramHandle, MetricsRegistry};
pub use storage::{InMemoryBackend, MetricsBackend};
pub use types::{
    Metric, MetricId, MetricMetadata, MetricSnapshot, MetricType, MetricValue, MetricsError,
    MetricsResult,
};
