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


/// Manages a generic, thread-safe event channel.
///
/// The bus is generic over the event type `T`, so the cache and any host code
/// can reuse it without `hoard-core` knowing about their event types.
#[derive(Debug)]
pub struct EventBus<T: Clone + Send + Sync + 'static> {
    sender: flume::Sender<T>,
    receiver: flume::Receiver<T>,
}

impl<T: Clone + Send + Sync + 'static> EventBus<T> {
    /// Creates a new EventBus backed by an unbounded channel.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        log::debug!("EventBus<{}> initialized.", std::any::type_name::<T>());
        Self { sender, receiver }
    }

    /// Sends an event without blocking.
    ///
    /// The bus owns a receiver, so sending only fails if every receiver clone
    /// was dropped; that is logged and otherwise ignored.
    pub fn publish(&self, event: T) {
        log::trace!("Publishing {}.", std::any::type_name::<T>());

        if let Err(e) = self.sender.send(event) {
            log::error!("Failed to send event: {e}. Receiver likely disconnected.");
        }
    }

    /// Returns a clone of the sender end of the channel.
    pub fn sender(&self) -> flume::Sender<T> {
        self.sender.clone()
    }

    /// Returns the receiver end of the channel, for consumers to drain.
    pub fn receiver(&self) -> &flume::Receiver<T> {
        &self.receiver
    }

    /// Removes and returns every event currently queued.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.drain().collect()
    }
}

impl<T: Clone + Send + Sync + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetKey, ErasedAsset, LoadHandle, LoadId};
    use crate::event::AssetEvent;
    use flume::{SendError, TryRecvError};
    use std::{thread, time::Duration};

    struct Clip;
    impl crate::asset::Asset for Clip {}

    fn loaded(key: AssetKey) -> AssetEvent {
        AssetEvent::Loaded {
            key,
            handle: LoadHandle::completed(LoadId(1), key.to_string(), ErasedAsset::new(Clip)),
        }
    }

    #[test]
    fn try_receive_empty() {
        let bus = EventBus::<AssetEvent>::new();

        match bus.receiver().try_recv() {
            Err(TryRecvError::Empty) => {}
            Ok(event) => panic!("Received unexpected event: {event:?}"),
            Err(e) => panic!("Received unexpected error: {e:?}"),
        }
    }

    #[test]
    fn publish_preserves_order() {
        let bus = EventBus::<AssetEvent>::new();
        let a = AssetKey::new();
        let b = AssetKey::new();

        bus.publish(loaded(a));
        bus.publish(AssetEvent::Unloaded { key: a });
        bus.publish(loaded(b));

        let events = bus.drain();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], AssetEvent::Loaded { key, .. } if key == a));
        assert!(matches!(events[1], AssetEvent::Unloaded { key } if key == a));
        assert_eq!(events[2].key(), b);
        assert!(bus.receiver().is_empty());
    }

    #[test]
    fn send_from_thread() {
        let bus = EventBus::<AssetEvent>::new();
        let sender = bus.sender();
        let key = AssetKey::new();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            sender
                .send(AssetEvent::Unloaded { key })
                .expect("Send from thread failed");
        });

        match bus.receiver().recv_timeout(Duration::from_secs(1)) {
            Ok(event) => assert_eq!(event.key(), key),
            Err(e) => panic!("Failed to receive event from thread: {e:?}"),
        }

        handle.join().expect("Thread join failed");
    }

    #[test]
    fn send_error_on_receiver_drop() {
        let bus = EventBus::<AssetEvent>::new();
        let sender = bus.sender();

        drop(bus);

        match sender.send(AssetEvent::Unloaded {
            key: AssetKey::new(),
        }) {
            Err(SendError(_)) => {}
            Ok(()) => panic!("Send unexpectedly succeeded after receiver drop"),
        }
    }
}
