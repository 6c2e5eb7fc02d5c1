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

//! The message set exchanged over a session.
//!
//! Every payload travels inside an [`Envelope`] that carries the sender stamp
//! and the sample time. Receivers route on [`MessageKind`] first and on the
//! sender stamp second, so the same payload type can mean different things
//! depending on who sent it (a `Frame` from stamp 0 is the agent, from stamp 2
//! it is the ball).

use crate::math::Vec2;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// A pose in the simulated arena.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Position along the arena x axis.
    pub x: f32,
    /// Position along the arena y axis.
    pub y: f32,
    /// Altitude.
    pub z: f32,
}

impl Frame {
    /// Creates a frame at `point` with altitude `z`.
    #[inline]
    pub const fn at(point: Vec2, z: f32) -> Self {
        Self {
            x: point.x,
            y: point.y,
            z,
        }
    }

    /// Projects the frame onto the arena floor.
    #[inline]
    pub const fn planar(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// A preview point reported by a perception node.
///
/// Only `distance` is consumed by the simulator; it gates the ball motion.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewPoint {
    /// Bearing of the preview point, in radians.
    pub azimuth_angle: f32,
    /// Range to the preview point.
    pub distance: f32,
}

/// Signals that the mission supervisor considers the current task done.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCompletion {
    /// `true` while the task is considered complete.
    pub completed: bool,
}

/// Status published by the simulator every tick.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFoundState {
    /// Number of targets visited since the last reset.
    pub target_found_count: u32,
    /// Whether the agent currently sits on the charge pad.
    ///
    /// Always `false` for scenarios without a charge pad.
    pub is_chpad_found: bool,
}

/// Discriminant used to register callbacks for one message type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// [`Frame`]
    Frame,
    /// [`PreviewPoint`]
    PreviewPoint,
    /// [`TaskCompletion`]
    TaskCompletion,
    /// [`TargetFoundState`]
    TargetFoundState,
}

/// Any payload that can be published on a session.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// A pose.
    Frame(Frame),
    /// A preview point.
    PreviewPoint(PreviewPoint),
    /// A completion flag.
    TaskCompletion(TaskCompletion),
    /// A found-count status.
    TargetFoundState(TargetFoundState),
}

impl Message {
    /// Returns the kind this message is routed under.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Frame(_) => MessageKind::Frame,
            Self::PreviewPoint(_) => MessageKind::PreviewPoint,
            Self::TaskCompletion(_) => MessageKind::TaskCompletion,
            Self::TargetFoundState(_) => MessageKind::TargetFoundState,
        }
    }
}

impl From<Frame> for Message {
    fn from(value: Frame) -> Self {
        Self::Frame(value)
    }
}

impl From<PreviewPoint> for Message {
    fn from(value: PreviewPoint) -> Self {
        Self::PreviewPoint(value)
    }
}

impl From<TaskCompletion> for Message {
    fn from(value: TaskCompletion) -> Self {
        Self::TaskCompletion(value)
    }
}

impl From<TargetFoundState> for Message {
    fn from(value: TargetFoundState) -> Self {
        Self::TargetFoundState(value)
    }
}

/// Wall-clock sample time attached to every published message.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeStamp {
    /// Whole seconds since the Unix epoch.
    pub seconds: i64,
    /// Sub-second part, in microseconds.
    pub microseconds: u32,
}

impl TimeStamp {
    /// Samples the system clock.
    ///
    /// A clock set before the epoch yields the zero timestamp.
    pub fn now() -> Self {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|since| Self {
                seconds: since.as_secs() as i64,
                microseconds: since.subsec_micros(),
            })
            .unwrap_or_default()
    }
}

/// A message together with its routing metadata.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// The payload.
    pub message: Message,
    /// Time the sender sampled the payload.
    pub sent: TimeStamp,
    /// Identifier chosen by the sender to tell its streams apart.
    pub sender_stamp: u32,
}

impl Envelope {
    /// Wraps `message` for publication.
    pub fn new(message: Message, sent: TimeStamp, sender_stamp: u32) -> Self {
        Self {
            message,
            sent,
            sender_stamp,
        }
    }

    /// Shortcut for `self.message.kind()`.
    pub fn kind(&self) -> MessageKind {
        self.message.kind()
    }
}
