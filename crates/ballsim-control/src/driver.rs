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

//! One-dimensional back-and-forth motion of the ball.

use crate::scenario::DriverConfig;

/// Direction of travel along the driven axis.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    /// Towards the upper bound.
    #[default]
    Forward,
    /// Towards the lower bound.
    Reverse,
}

impl Direction {
    /// `1.0` or `-1.0`.
    pub fn sign(self) -> f32 {
        match self {
            Self::Forward => 1.0,
            Self::Reverse => -1.0,
        }
    }
}

/// Oscillates a scalar between two bounds.
///
/// Reversal is decided from the position left by the previous step, so the
/// ball can end up one step past a bound before it turns around.
#[derive(Debug, Clone)]
pub struct OscillatingDriver {
    config: DriverConfig,
    position: f32,
    direction: Direction,
}

impl OscillatingDriver {
    /// Creates a driver at its initial position, heading forward.
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            position: config.initial_position,
            direction: Direction::Forward,
        }
    }

    /// Direction the next step will take from the current position.
    pub fn next_direction(&self) -> Direction {
        if self.position >= self.config.upper_bound {
            Direction::Reverse
        } else if self.position <= self.config.lower_bound {
            Direction::Forward
        } else {
            self.direction
        }
    }

    /// Whether `obstacle_distance` lets the ball move.
    pub fn gate_open(&self, obstacle_distance: f32) -> bool {
        match self.config.obstacle_gate {
            None => true,
            Some(min) => obstacle_distance > min,
        }
    }

    /// Advances one tick. Returns `false` when the gate held the ball in place.
    pub fn step(&mut self, obstacle_distance: f32) -> bool {
        self.direction = self.next_direction();
        if !self.gate_open(obstacle_distance) {
            return false;
        }
        self.position += self.direction.sign() * self.config.step;
        true
    }

    /// Returns to the initial position, heading forward.
    pub fn reset(&mut self) {
        self.position = self.config.initial_position;
        self.direction = Direction::Forward;
    }

    /// Current position along the driven axis.
    pub fn position(&self) -> f32 {
        self.position
    }

    /// Direction taken by the last step.
    pub fn direction(&self) -> Direction {
        self.direction
    }
}
