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

//! The contract between the simulator and a publish/subscribe session.
//!
//! The simulator only ever needs three things from its middleware: a way to
//! publish, a way to be called back on inbound traffic, and a liveness flag.
//! Concrete sessions live in `ballsim-infra`.

use crate::message::{Envelope, Message, MessageKind, TimeStamp};
use std::sync::Arc;
use thiserror::Error;

/// A callback invoked once per received envelope of the subscribed kind.
///
/// Sessions may invoke callbacks from their own threads, concurrently with
/// the publisher and with each other.
pub type Callback = Arc<dyn Fn(Envelope) + Send + Sync>;

/// A publish/subscribe session keyed by a numeric connection id.
pub trait Transport: Send + Sync {
    /// Publishes `message`. Fire-and-forget: failures are the session's
    /// business and are never reported back to the caller.
    fn publish(&self, message: Message, sent: TimeStamp, sender_stamp: u32);

    /// Registers `callback` for every inbound message of `kind`.
    fn subscribe(&self, kind: MessageKind, callback: Callback);

    /// Returns `false` once the session has shut down.
    fn is_running(&self) -> bool;
}

/// Errors raised while opening a session or moving bytes through it.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection id cannot be mapped onto a multicast group.
    #[error("session id {0} is outside the supported range 1..=254")]
    InvalidSession(u16),
    /// A socket operation failed.
    #[error("socket error during {context}: {source}")]
    Io {
        /// What the session was doing.
        context: &'static str,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// An envelope could not be encoded.
    #[error("failed to encode envelope: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    /// A datagram could not be decoded into an envelope.
    #[error("failed to decode envelope: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}

impl TransportError {
    /// Wraps an I/O error with the operation that produced it.
    pub fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }
}
