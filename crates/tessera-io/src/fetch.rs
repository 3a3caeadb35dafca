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

use crate::error::AssetError;
use futures::future::{self, FutureExt, LocalBoxFuture};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Future returned by [`AssetFetcher::fetch`].
pub type FetchFuture = LocalBoxFuture<'static, Result<Vec<u8>, AssetError>>;

/// Produces the raw bytes behind an asset url.
pub trait AssetFetcher {
    /// Starts fetching `url`.
    fn fetch(&self, url: &str) -> FetchFuture;
}

/// Reads asset urls as paths relative to a root directory.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    /// Creates a fetcher rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, url: &str) -> Result<PathBuf, AssetError> {
        let escapes = Path::new(url).components().any(|component| {
            matches!(
                component,
                Component::Prefix(_) | Component::RootDir | Component::ParentDir
            )
        });
        if escapes {
            return Err(AssetError::Fetch {
                url: url.to_string(),
                message: "url must stay under the asset root".to_string(),
            });
        }
        Ok(self.root.join(url))
    }
}

impl AssetFetcher for FileFetcher {
    /// The file is read when the returned future is first polled.
    fn fetch(&self, url: &str) -> FetchFuture {
        let path = match self.resolve(url) {
            Ok(path) => path,
            Err(e) => return future::ready(Err(e)).boxed_local(),
        };
        let url = url.to_string();
        async move {
            log::trace!("FileFetcher: reading {}", path.display());
            std::fs::read(&path).map_err(|e| AssetError::Fetch {
                url,
                message: e.to_string(),
            })
        }
        .boxed_local()
    }
}

/// Serves bytes registered in memory. Unknown urls fail with
/// [`AssetError::Fetch`].
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    entries: RefCell<HashMap<String, Vec<u8>>>,
}

impl MemoryFetcher {
    /// Creates an empty fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `bytes` under `url`, replacing any previous entry.
    pub fn insert(&self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.entries.borrow_mut().insert(url.into(), bytes.into());
    }
}

impl AssetFetcher for MemoryFetcher {
    fn fetch(&self, url: &str) -> FetchFuture {
        let result = self
            .entries
            .borrow()
            .get(url)
            .cloned()
            .ok_or_else(|| AssetError::Fetch {
                url: url.to_string(),
                message: "not found".to_string(),
            });
        future::ready(result).boxed_local()
    }
}
