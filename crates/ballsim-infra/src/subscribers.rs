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

//! Callback table shared by the session implementations.

use ballsim_core::{Callback, Envelope, MessageKind};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Callbacks registered per message kind.
#[derive(Default)]
pub(crate) struct Subscribers {
    table: RwLock<HashMap<MessageKind, Vec<Callback>>>,
}

impl Subscribers {
    pub(crate) fn add(&self, kind: MessageKind, callback: Callback) {
        self.table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default()
            .push(callback);
        log::debug!("Subscribed to {kind:?}.");
    }

    /// Invokes every callback registered for the envelope's kind.
    ///
    /// Returns how many callbacks ran. The table lock is released before the
    /// callbacks run, so a callback may subscribe again.
    pub(crate) fn dispatch(&self, envelope: Envelope) -> usize {
        let callbacks = self
            .table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&envelope.kind())
            .cloned()
            .unwrap_or_default();
        for callback in &callbacks {
            callback(envelope);
        }
        callbacks.len()
    }
}
