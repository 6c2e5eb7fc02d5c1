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

//! Binary wire encoding for envelopes.

use crate::message::Envelope;
use crate::transport::TransportError;

/// Largest datagram a session will ever need to receive.
pub const MAX_DATAGRAM_LEN: usize = 512;

/// Encodes an envelope with bincode's standard configuration.
pub fn encode_envelope(envelope: &Envelope) -> Result<Vec<u8>, TransportError> {
    Ok(bincode::serde::encode_to_vec(
        envelope,
        bincode::config::standard(),
    )?)
}

/// Decodes an envelope previously produced by [`encode_envelope`].
///
/// Trailing bytes after the envelope are ignored.
pub fn decode_envelope(bytes: &[u8]) -> Result<Envelope, TransportError> {
    let (envelope, _read) =
        bincode::serde::decode_from_slice::<Envelope, _>(bytes, bincode::config::standard())?;
    Ok(envelope)
}
