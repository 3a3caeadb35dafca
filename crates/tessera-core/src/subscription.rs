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

//! Teardown handles.
//!
//! Registration APIs across the runtime return an [`Unsubscribe`]. Owners
//! collect them in an [`UnsubscribeBag`] and flush the bag on destroy.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// A one-shot teardown callback.
///
/// Dropping an `Unsubscribe` without calling it leaves the registration in
/// place.
#[must_use = "dropping an Unsubscribe leaves the registration active"]
pub struct Unsubscribe(Option<Box<dyn FnOnce()>>);

impl Unsubscribe {
    /// Wraps a teardown callback.
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Some(Box::new(f)))
    }

    /// A handle that does nothing when called.
    pub fn noop() -> Self {
        Self(None)
    }

    /// Runs the teardown.
    pub fn call(mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Unsubscribe")
            .field(&self.0.as_ref().map(|_| "armed"))
            .finish()
    }
}

/// LIFO collection of teardown handles.
#[derive(Default)]
pub struct UnsubscribeBag {
    entries: Vec<Unsubscribe>,
}

impl UnsubscribeBag {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handle. `None` is ignored so optional registrations can be
    /// added without a branch at the call site.
    pub fn add(&mut self, handle: impl Into<Option<Unsubscribe>>) {
        if let Some(handle) = handle.into() {
            self.entries.push(handle);
        }
    }

    /// Runs every handle in reverse insertion order and empties the bag.
    ///
    /// A handle that panics is logged and does not stop the rest from
    /// running. Flushing an empty bag is a no-op.
    pub fn flush(&mut self) {
        while let Some(handle) = self.entries.pop() {
            if panic::catch_unwind(AssertUnwindSafe(|| handle.call())).is_err() {
                log::warn!("UnsubscribeBag: teardown handle panicked; continuing flush");
            }
        }
    }

    /// Number of handles waiting to be flushed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the bag holds no handles.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for UnsubscribeBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnsubscribeBag")
            .field("len", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder(log: &Rc<RefCell<Vec<u32>>>, id: u32) -> Unsubscribe {
        let log = log.clone();
        Unsubscribe::new(move || log.borrow_mut().push(id))
    }

    #[test]
    fn flush_runs_in_reverse_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bag = UnsubscribeBag::new();
        bag.add(recorder(&log, 1));
        bag.add(recorder(&log, 2));
        bag.add(recorder(&log, 3));

        bag.flush();
        assert_eq!(*log.borrow(), vec![3, 2, 1]);
        assert!(bag.is_empty());
    }

    #[test]
    fn flush_is_idempotent() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bag = UnsubscribeBag::new();
        bag.add(recorder(&log, 1));

        bag.flush();
        bag.flush();
        assert_eq!(*log.borrow(), vec![1]);
    }

    #[test]
    fn none_and_noop_are_accepted() {
        let mut bag = UnsubscribeBag::new();
        bag.add(None::<Unsubscribe>);
        bag.add(Unsubscribe::noop());
        assert_eq!(bag.len(), 1);
        bag.flush();
    }

    #[test]
    fn panicking_handle_does_not_stop_the_flush() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bag = UnsubscribeBag::new();
        bag.add(recorder(&log, 1));
        bag.add(Unsubscribe::new(|| panic!("teardown failed")));
        bag.add(recorder(&log, 3));

        bag.flush();
        assert_eq!(*log.borrow(), vec![3, 1]);
        assert!(bag.is_empty());
    }
}
