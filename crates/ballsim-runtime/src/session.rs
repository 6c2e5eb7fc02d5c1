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

//! The session the binary runs on, kept concrete so it can be stopped.

use crate::cli::{Cli, TransportKind};
use anyhow::{Context, Result};
use ballsim_core::Transport;
use ballsim_infra::{LocalSession, UdpSession};
use std::sync::Arc;

/// The open session, shared by the service and the signal handler.
#[derive(Clone)]
pub enum Session {
    Udp(Arc<UdpSession>),
    Local(Arc<LocalSession>),
}

impl Session {
    /// Opens the transport selected on the command line.
    pub fn open(cli: &Cli) -> Result<Self> {
        match cli.transport {
            TransportKind::Udp => {
                let session = UdpSession::open(cli.cid)
                    .with_context(|| format!("failed to open session {}", cli.cid))?;
                Ok(Self::Udp(Arc::new(session)))
            }
            TransportKind::Local => {
                let session = LocalSession::new();
                let tap = session.tap();
                // Nobody else is on an in-process bus; show what would be sent.
                std::thread::Builder::new()
                    .name("ballsim-local-tap".to_owned())
                    .spawn(move || {
                        for envelope in tap.iter() {
                            log::debug!("[{}] {:?}", envelope.sender_stamp, envelope.message);
                        }
                    })
                    .context("failed to spawn the local tap reader")?;
                Ok(Self::Local(Arc::new(session)))
            }
        }
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        match self {
            Self::Udp(session) => session.clone(),
            Self::Local(session) => session.clone(),
        }
    }

    /// Shuts the session down; a running service returns after its current tick.
    pub fn stop(&self) {
        match self {
            Self::Udp(session) => session.stop(),
            Self::Local(session) => session.stop(),
        }
    }
}
