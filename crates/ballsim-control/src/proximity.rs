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

//! Times how long the agent stays in contact with the ball.

use ballsim_core::Vec2;
use std::time::{Duration, Instant};

/// A change of contact state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProximityEvent {
    /// The agent came within the watch radius.
    Entered,
    /// The agent left the watch radius after `duration` in contact.
    Left {
        /// Time spent in contact.
        duration: Duration,
    },
}

/// Edge detector on the agent-to-ball distance.
#[derive(Debug, Clone)]
pub struct ProximityWatch {
    radius: f32,
    since: Option<Instant>,
}

impl ProximityWatch {
    /// Creates a watch that is not in contact.
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            since: None,
        }
    }

    /// Whether the agent is currently in contact with the ball.
    pub fn is_close(&self) -> bool {
        self.since.is_some()
    }

    /// Feeds one sample. Returns an event only when the contact state changes.
    pub fn observe(&mut self, agent: Vec2, ball: Vec2, now: Instant) -> Option<ProximityEvent> {
        let close = agent.distance(ball) <= self.radius;
        match (close, self.since) {
            (true, None) => {
                log::warn!("Too close to the ball at ({:.2}, {:.2})!", ball.x, ball.y);
                self.since = Some(now);
                Some(ProximityEvent::Entered)
            }
            (false, Some(start)) => {
                let duration = now.saturating_duration_since(start);
                log::info!(
                    "Left the ball after {:.3} second(s) in contact.",
                    duration.as_secs_f64()
                );
                self.since = None;
                Some(ProximityEvent::Left { duration })
            }
            _ => None,
        }
    }
}
