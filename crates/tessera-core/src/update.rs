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

//! Ordered per-frame callbacks.

use crate::subscription::Unsubscribe;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type UpdateCallback = Rc<RefCell<dyn FnMut(f32)>>;

struct Entry {
    id: u64,
    order: i32,
    callback: UpdateCallback,
}

#[derive(Default)]
struct Inner {
    next_id: Cell<u64>,
    entries: RefCell<Vec<Entry>>,
}

/// Registry of callbacks run once per frame.
///
/// Callbacks run in ascending `order`; equal orders keep registration
/// order. Registering or unregistering from inside a callback takes effect on
/// the next [`UpdateService::tick`].
#[derive(Clone, Default)]
pub struct UpdateService {
    inner: Rc<Inner>,
}

impl UpdateService {
    /// Creates an empty service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` at `order`. Calling the returned handle removes it.
    pub fn register(&self, order: i32, callback: impl FnMut(f32) + 'static) -> Unsubscribe {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);

        {
            let mut entries = self.inner.entries.borrow_mut();
            entries.push(Entry {
                id,
                order,
                callback: Rc::new(RefCell::new(callback)),
            });
            // Stable: equal orders stay in registration order.
            entries.sort_by_key(|entry| entry.order);
        }

        let weak: Weak<Inner> = Rc::downgrade(&self.inner);
        Unsubscribe::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.entries.borrow_mut().retain(|entry| entry.id != id);
            }
        })
    }

    /// Runs every registered callback with the frame delta in seconds.
    pub fn tick(&self, dt: f32) {
        let snapshot: Vec<UpdateCallback> = self
            .inner
            .entries
            .borrow()
            .iter()
            .map(|entry| entry.callback.clone())
            .collect();
        for callback in snapshot {
            if let Ok(mut callback) = callback.try_borrow_mut() {
                (&mut *callback)(dt);
            }
        }
    }

    /// Removes every callback.
    pub fn clear(&self) {
        let removed = std::mem::take(&mut *self.inner.entries.borrow_mut());
        log::debug!("UpdateService: cleared {} callback(s)", removed.len());
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for UpdateService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateService")
            .field("callbacks", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> impl FnMut(f32) + 'static {
        let log = log.clone();
        move |_| log.borrow_mut().push(name)
    }

    #[test]
    fn runs_in_ascending_order_stable_for_ties() {
        let service = UpdateService::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let _c = service.register(10, push(&log, "c"));
        let _a = service.register(-5, push(&log, "a"));
        let _b1 = service.register(0, push(&log, "b1"));
        let _b2 = service.register(0, push(&log, "b2"));

        service.tick(0.016);
        assert_eq!(*log.borrow(), vec!["a", "b1", "b2", "c"]);
    }

    #[test]
    fn passes_delta_time() {
        let service = UpdateService::new();
        let total = Rc::new(Cell::new(0.0f32));
        let sink = total.clone();
        let _handle = service.register(0, move |dt| sink.set(sink.get() + dt));

        service.tick(0.25);
        service.tick(0.5);
        assert!((total.get() - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn unsubscribe_removes_the_callback() {
        let service = UpdateService::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let handle = service.register(0, push(&log, "gone"));
        let _kept = service.register(1, push(&log, "kept"));

        handle.call();
        service.tick(0.0);
        assert_eq!(*log.borrow(), vec!["kept"]);
        assert_eq!(service.len(), 1);
    }

    #[test]
    fn registration_during_tick_applies_next_tick() {
        let service = UpdateService::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let pending = Rc::new(RefCell::new(Vec::new()));

        let registrar = service.clone();
        let late_log = log.clone();
        let handles = pending.clone();
        let _outer = service.register(0, move |_| {
            if handles.borrow().is_empty() {
                handles
                    .borrow_mut()
                    .push(registrar.register(1, push(&late_log, "late")));
            }
        });

        service.tick(0.0);
        assert!(log.borrow().is_empty());
        service.tick(0.0);
        assert_eq!(*log.borrow(), vec!["late"]);
        service.clear();
    }

    #[test]
    fn clear_empties_the_service() {
        let service = UpdateService::new();
        let _a = service.register(0, |_| {});
        let _b = service.register(0, |_| {});
        service.clear();
        assert!(service.is_empty());
    }
}
