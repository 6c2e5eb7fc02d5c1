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

//! An in-process session.

use crate::subscribers::Subscribers;
use ballsim_core::{Callback, Envelope, Message, MessageKind, TimeStamp, Transport};
use std::sync::atomic::{AtomicBool, Ordering};

/// Envelopes kept for a slow tap reader before new ones are dropped.
pub const TAP_CAPACITY: usize = 1024;

/// A session that never leaves the process.
///
/// Publishing runs the matching callbacks synchronously on the publisher's
/// thread, then copies the envelope to the tap channel. Nothing is ever
/// serialized.
pub struct LocalSession {
    subscribers: Subscribers,
    tap_sender: flume::Sender<Envelope>,
    tap_receiver: flume::Receiver<Envelope>,
    running: AtomicBool,
}

impl LocalSession {
    /// Creates a running session with no subscribers.
    pub fn new() -> Self {
        let (tap_sender, tap_receiver) = flume::bounded(TAP_CAPACITY);
        log::info!("Local session opened.");
        Self {
            subscribers: Subscribers::default(),
            tap_sender,
            tap_receiver,
            running: AtomicBool::new(true),
        }
    }

    /// Returns a receiver observing every published envelope.
    ///
    /// All taps share one queue. When it is full, new envelopes are dropped
    /// for the tap only; subscribers still receive them.
    pub fn tap(&self) -> flume::Receiver<Envelope> {
        self.tap_receiver.clone()
    }

    /// Marks the session as shut down. Publishing becomes a no-op.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            log::info!("Local session stopped.");
        }
    }
}

impl Default for LocalSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for LocalSession {
    fn publish(&self, message: Message, sent: TimeStamp, sender_stamp: u32) {
        if !self.is_running() {
            log::trace!("Dropping {:?} published on a stopped session.", message.kind());
            return;
        }
        let envelope = Envelope::new(message, sent, sender_stamp);
        self.subscribers.dispatch(envelope);
        // A full or abandoned tap is not an error.
        let _ = self.tap_sender.try_send(envelope);
    }

    fn subscribe(&self, kind: MessageKind, callback: Callback) {
        self.subscribers.add(kind, callback);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
