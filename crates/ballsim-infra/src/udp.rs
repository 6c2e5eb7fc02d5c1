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

//! A UDP multicast session.
//!
//! Connection id `cid` maps onto the group `225.0.0.<cid>` on port
//! [`SESSION_PORT`]. Every participant of a session binds the same port and
//! joins the same group; envelopes travel as one datagram each, encoded with
//! [`ballsim_core::codec`]. The host's own datagrams loop back and reach the
//! local subscribers too, which is why receivers filter on sender stamps.

use crate::subscribers::Subscribers;
use ballsim_core::codec::{decode_envelope, encode_envelope, MAX_DATAGRAM_LEN};
use ballsim_core::{
    Callback, Envelope, Message, MessageKind, TimeStamp, Transport, TransportError,
};
use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

/// Port shared by every session.
pub const SESSION_PORT: u16 = 12175;

/// How often the receiver thread checks whether it should stop.
const RECEIVE_TIMEOUT: Duration = Duration::from_millis(100);

/// Maps a connection id onto its multicast group.
pub fn group_for(cid: u16) -> Result<Ipv4Addr, TransportError> {
    match u8::try_from(cid) {
        Ok(last @ 1..=254) => Ok(Ipv4Addr::new(225, 0, 0, last)),
        _ => Err(TransportError::InvalidSession(cid)),
    }
}

/// Binds a UDP socket on `port` that other sockets of this host may bind too.
///
/// Address reuse (and port reuse on unix) must be set before binding, so the
/// socket is built with `socket2` and handed back as a std socket.
fn bind_shared(port: u16) -> Result<UdpSocket, TransportError> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .map_err(|e| TransportError::io("create socket", e))?;
    socket
        .set_reuse_address(true)
        .map_err(|e| TransportError::io("enable address reuse", e))?;
    #[cfg(unix)]
    socket
        .set_reuse_port(true)
        .map_err(|e| TransportError::io("enable port reuse", e))?;
    let address = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
    socket
        .bind(&SockAddr::from(address))
        .map_err(|e| TransportError::io("bind", e))?;
    Ok(socket.into())
}

/// A session over UDP multicast.
///
/// A background thread receives and dispatches inbound envelopes until
/// [`stop`](Self::stop) is called or the session is dropped.
pub struct UdpSession {
    socket: UdpSocket,
    group: SocketAddr,
    subscribers: Arc<Subscribers>,
    running: Arc<AtomicBool>,
    receiver: Mutex<Option<JoinHandle<()>>>,
}

impl UdpSession {
    /// Joins the multicast group of `cid` and starts receiving.
    pub fn open(cid: u16) -> Result<Self, TransportError> {
        let group_ip = group_for(cid)?;
        let socket = bind_shared(SESSION_PORT)?;
        socket
            .join_multicast_v4(&group_ip, &Ipv4Addr::UNSPECIFIED)
            .map_err(|e| TransportError::io("join multicast group", e))?;
        socket
            .set_multicast_loop_v4(true)
            .map_err(|e| TransportError::io("enable multicast loopback", e))?;
        socket
            .set_read_timeout(Some(RECEIVE_TIMEOUT))
            .map_err(|e| TransportError::io("set read timeout", e))?;

        let session = Self {
            group: SocketAddr::V4(SocketAddrV4::new(group_ip, SESSION_PORT)),
            subscribers: Arc::new(Subscribers::default()),
            running: Arc::new(AtomicBool::new(true)),
            receiver: Mutex::new(None),
            socket,
        };
        session.spawn_receiver()?;

        log::info!("Session {cid} opened on {}.", session.group);
        Ok(session)
    }

    fn spawn_receiver(&self) -> Result<(), TransportError> {
        let socket = self
            .socket
            .try_clone()
            .map_err(|e| TransportError::io("clone socket", e))?;
        let subscribers = Arc::clone(&self.subscribers);
        let running = Arc::clone(&self.running);

        let handle = std::thread::Builder::new()
            .name("ballsim-udp-rx".to_owned())
            .spawn(move || receive_loop(&socket, &subscribers, &running))
            .map_err(|e| TransportError::io("spawn receiver thread", e))?;
        *self
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(())
    }

    /// Stops the receiver thread and leaves the group. Idempotent.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let handle = self
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                log::error!("UDP receiver thread panicked.");
            }
        }
        if let SocketAddr::V4(group) = self.group {
            if let Err(e) = self
                .socket
                .leave_multicast_v4(group.ip(), &Ipv4Addr::UNSPECIFIED)
            {
                log::debug!("Failed to leave {}: {e}", self.group);
            }
        }
        log::info!("Session on {} stopped.", self.group);
    }

    fn send(&self, envelope: &Envelope) -> Result<(), TransportError> {
        let bytes = encode_envelope(envelope)?;
        self.socket
            .send_to(&bytes, self.group)
            .map_err(|e| TransportError::io("send", e))?;
        Ok(())
    }
}

fn receive_loop(socket: &UdpSocket, subscribers: &Subscribers, running: &AtomicBool) {
    let mut buffer = [0u8; MAX_DATAGRAM_LEN];
    while running.load(Ordering::SeqCst) {
        match socket.recv_from(&mut buffer) {
            Ok((len, from)) => match decode_envelope(&buffer[..len]) {
                Ok(envelope) => {
                    subscribers.dispatch(envelope);
                }
                Err(e) => log::debug!("Ignoring datagram from {from}: {e}"),
            },
            Err(ref e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(e) => {
                log::error!("UDP receive failed: {e}");
                std::thread::sleep(RECEIVE_TIMEOUT);
            }
        }
    }
    log::debug!("UDP receiver thread exiting.");
}

impl Transport for UdpSession {
    fn publish(&self, message: Message, sent: TimeStamp, sender_stamp: u32) {
        if !self.is_running() {
            return;
        }
        let envelope = Envelope::new(message, sent, sender_stamp);
        if let Err(e) = self.send(&envelope) {
            log::debug!("Failed to publish {:?}: {e}", message.kind());
        }
    }

    fn subscribe(&self, kind: MessageKind, callback: Callback) {
        self.subscribers.add(kind, callback);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for UdpSession {
    fn drop(&mut self) {
        self.stop();
    }
}
