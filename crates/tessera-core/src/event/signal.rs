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

use crate::subscription::Unsubscribe;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Listener<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct Slots<T> {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(u64, Listener<T>)>>,
}

/// Synchronous multicast signal.
///
/// Listeners run in connection order. A listener connected or disconnected
/// during [`Signal::emit`] takes effect from the next emission.
pub struct Signal<T: 'static> {
    slots: Rc<Slots<T>>,
}

impl<T: 'static> Signal<T> {
    /// Creates a signal with no listeners.
    pub fn new() -> Self {
        Self {
            slots: Rc::new(Slots {
                next_id: Cell::new(0),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Connects `listener`. The returned handle disconnects it.
    pub fn connect(&self, listener: impl FnMut(&T) + 'static) -> Unsubscribe {
        let id = self.slots.next_id.get();
        self.slots.next_id.set(id + 1);
        let listener: Listener<T> = Rc::new(RefCell::new(listener));
        self.slots.listeners.borrow_mut().push((id, listener));

        let weak: Weak<Slots<T>> = Rc::downgrade(&self.slots);
        Unsubscribe::new(move || {
            if let Some(slots) = weak.upgrade() {
                slots.listeners.borrow_mut().retain(|(other, _)| *other != id);
            }
        })
    }

    /// Delivers `value` to every listener connected at the time of the call.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<Listener<T>> = self
            .slots
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in snapshot {
            // A listener that re-emits the same signal is skipped for the
            // nested emission.
            if let Ok(mut callback) = listener.try_borrow_mut() {
                (&mut *callback)(value);
            }
        }
    }

    /// Number of connected listeners.
    pub fn listener_count(&self) -> usize {
        self.slots.listeners.borrow().len()
    }
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
