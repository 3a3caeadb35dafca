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

//! Feature modules and their asset sets.

use anyhow::Result;
use tessera_core::Container;
use tessera_io::AssetRequest;
use tessera_views::ViewFactory;

/// A feature module plugged into an [`App`](crate::App).
///
/// The app calls `configure_di` on every module, then `configure_views` on
/// every module, exactly once, and finally loads `asset_requests`.
pub trait ModuleBinding {
    /// Name used in logs and error context.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Binds the module's services.
    fn configure_di(&self, _container: &Container) -> Result<()> {
        Ok(())
    }

    /// Registers the module's views.
    fn configure_views(&self, _views: &ViewFactory) -> Result<()> {
        Ok(())
    }

    /// Assets the module needs before its views are created.
    fn asset_requests(&self) -> Vec<AssetRequest> {
        Vec::new()
    }
}

/// An ordered set of asset requests keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetSet {
    requests: Vec<AssetRequest>,
}

impl AssetSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `request`, replacing any earlier request with the same id.
    pub fn insert(&mut self, request: AssetRequest) {
        match self.requests.iter_mut().find(|r| r.id == request.id) {
            Some(existing) => *existing = request,
            None => self.requests.push(request),
        }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, request: AssetRequest) -> Self {
        self.insert(request);
        self
    }

    /// Points `id` at `url`. Unknown ids are ignored; returns whether a
    /// request was changed.
    pub fn override_url(&mut self, id: &str, url: impl Into<String>) -> bool {
        match self.requests.iter_mut().find(|r| r.id == id) {
            Some(request) => {
                *request = AssetRequest::new(request.asset_type, id, url);
                true
            }
            None => false,
        }
    }

    /// The request for `id`.
    pub fn get(&self, id: &str) -> Option<&AssetRequest> {
        self.requests.iter().find(|r| r.id == id)
    }

    /// Requests in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &AssetRequest> {
        self.requests.iter()
    }

    /// Copies the requests out.
    pub fn to_vec(&self) -> Vec<AssetRequest> {
        self.requests.clone()
    }

    /// Number of requests.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Returns `true` when empty.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

impl FromIterator<AssetRequest> for AssetSet {
    fn from_iter<I: IntoIterator<Item = AssetRequest>>(iter: I) -> Self {
        let mut set = Self::new();
        for request in iter {
            set.insert(request);
        }
        set
    }
}
