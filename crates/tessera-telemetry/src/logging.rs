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

//! Logging bootstrap.

use env_logger::{Builder, Env};

/// Filter used when neither `RUST_LOG` nor the caller provides one.
pub const DEFAULT_FILTER: &str = "info";

/// Initialises the global `env_logger`.
///
/// `RUST_LOG` takes precedence over `default_filter`. Returns `false` if a
/// logger was already installed, in which case nothing changes.
pub fn init(default_filter: &str) -> bool {
    let filter = if default_filter.trim().is_empty() {
        DEFAULT_FILTER
    } else {
        default_filter
    };
    let installed = Builder::from_env(Env::default().default_filter_or(filter))
        .format_timestamp_millis()
        .try_init()
        .is_ok();
    if installed {
        log::debug!("Logger initialised with default filter '{filter}'");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_noop() {
        init("debug");
        assert!(!init("trace"));
    }
}
