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

//! State observed from other participants.
//!
//! Transport callbacks write into [`ObservedState`] from their own threads
//! while the control loop reads a [`snapshot`](ObservedState::snapshot) once
//! per tick. Inbound values are stored exactly as received.

use ballsim_core::Vec2;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Obstacle distance before the first reading arrives.
pub const NO_READING: f32 = -1.0;

/// A consistent copy of everything the simulation observes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Observation {
    /// Last reported agent position.
    pub position: Vec2,
    /// Last obstacle distance reading, [`NO_READING`] until one arrives.
    pub obstacle_distance: f32,
    /// Last completion flag.
    pub task_completed: bool,
}

impl Default for Observation {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            obstacle_distance: NO_READING,
            task_completed: false,
        }
    }
}

impl Observation {
    /// Whether at least one obstacle distance reading has arrived.
    pub fn has_distance_reading(&self) -> bool {
        self.obstacle_distance > NO_READING
    }
}

/// Lock-guarded holder of the latest [`Observation`].
///
/// Every accessor holds the lock for a single assignment or copy.
#[derive(Debug, Default)]
pub struct ObservedState {
    inner: Mutex<Observation>,
}

impl ObservedState {
    /// Creates a holder with no position, no reading and no completion.
    pub fn new() -> Self {
        Self::default()
    }

    // The guarded value is plain data, a panicking writer cannot leave it half-written.
    fn lock(&self) -> MutexGuard<'_, Observation> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the agent position.
    pub fn update_position(&self, x: f32, y: f32) {
        self.lock().position = Vec2::new(x, y);
    }

    /// Replaces the obstacle distance reading.
    pub fn update_obstacle_distance(&self, distance: f32) {
        self.lock().obstacle_distance = distance;
    }

    /// Replaces the completion flag.
    pub fn update_completion(&self, completed: bool) {
        self.lock().task_completed = completed;
    }

    /// Copies the current observation.
    pub fn snapshot(&self) -> Observation {
        *self.lock()
    }
}
