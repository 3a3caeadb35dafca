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

/// Queued event channel for a single event type.
///
/// Producers hold a [`flume::Sender`] obtained from [`EventBus::sender`];
/// the owner drains pending events with [`EventBus::drain`] or reads the
/// receiver directly.
#[derive(Debug)]
pub struct EventBus<T: 'static> {
    sender: flume::Sender<T>,
    receiver: flume::Receiver<T>,
}

impl<T: 'static> EventBus<T> {
    /// Creates a bus backed by an unbounded channel.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        log::trace!("EventBus<{}> initialized.", std::any::type_name::<T>());
        Self { sender, receiver }
    }

    /// Sends an event, logging an error if the receiver is gone.
    pub fn publish(&self, event: T) {
        if let Err(e) = self.sender.send(event) {
            log::error!("Failed to send event: {e}. Receiver likely disconnected.");
        }
    }

    /// Returns a new sender handle for this bus.
    pub fn sender(&self) -> flume::Sender<T> {
        self.sender.clone()
    }

    /// Returns the receiving end of the channel.
    pub fn receiver(&self) -> &flume::Receiver<T> {
        &self.receiver
    }

    /// Takes every event queued so far, in publication order.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }

    /// Number of events waiting to be drained.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl<T: 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flume::TryRecvError;

    #[derive(Debug, Clone, PartialEq)]
    enum TestEvent {
        Loaded { id: String },
        Resized { width: u32, height: u32 },
    }

    #[test]
    fn try_receive_empty() {
        let bus = EventBus::<TestEvent>::new();
        match bus.receiver().try_recv() {
            Err(TryRecvError::Empty) => {}
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn drain_preserves_order() {
        let bus = EventBus::<TestEvent>::new();
        let sender = bus.sender();
        sender
            .send(TestEvent::Loaded { id: "a".into() })
            .expect("send should succeed");
        bus.publish(TestEvent::Resized {
            width: 800,
            height: 600,
        });

        assert_eq!(bus.pending(), 2);
        assert_eq!(
            bus.drain(),
            vec![
                TestEvent::Loaded { id: "a".into() },
                TestEvent::Resized {
                    width: 800,
                    height: 600
                },
            ]
        );
        assert_eq!(bus.pending(), 0);
    }

    #[test]
    fn cloned_senders_feed_the_same_bus() {
        let bus = EventBus::<u32>::default();
        let first = bus.sender();
        let second = bus.sender();
        first.send(1).expect("send should succeed");
        second.send(2).expect("send should succeed");
        drop(first);
        drop(second);
        assert_eq!(bus.drain(), vec![1, 2]);
    }
}
