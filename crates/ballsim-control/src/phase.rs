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

//! Tick counting and the phase cycle that decides where the ball is drawn.
//!
//! Phase boundaries are cumulative and inclusive: with three phases of 3000
//! ticks the ball drives x while the counter is in `0..=3000`, is parked in
//! `3001..=6000` and drives y in `6001..=9000`. The first tick past the last
//! boundary is the wrap tick; the counter restarts from zero on it.

use crate::scenario::{PhaseLayout, Placement};

/// Ball placement selected for one tick.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PhaseSelection {
    /// The counter is inside a phase.
    Place(Placement),
    /// The counter ran past the last boundary and was reset to zero.
    Wrapped,
}

/// Counts ticks and maps them onto the phase cycle.
#[derive(Debug, Clone)]
pub struct PhaseTimer {
    layout: PhaseLayout,
    boundaries: Vec<u32>,
    ticks: u32,
}

impl PhaseTimer {
    /// Creates a timer at tick zero.
    pub fn new(layout: PhaseLayout) -> Self {
        let boundaries = match &layout {
            PhaseLayout::Continuous(_) => Vec::new(),
            PhaseLayout::Cycle(phases) => phases
                .iter()
                .scan(0u32, |end, phase| {
                    *end = end.saturating_add(phase.length);
                    Some(*end)
                })
                .collect(),
        };
        Self {
            layout,
            boundaries,
            ticks: 0,
        }
    }

    /// Placement for the current counter, without wrapping.
    ///
    /// `None` on the wrap tick.
    pub fn current(&self) -> Option<Placement> {
        match &self.layout {
            PhaseLayout::Continuous(axis) => Some(Placement::Drive(*axis)),
            PhaseLayout::Cycle(phases) => self
                .boundaries
                .iter()
                .position(|end| self.ticks <= *end)
                .map(|index| phases[index].placement),
        }
    }

    /// Selects this tick's placement, wrapping the counter past the last boundary.
    pub fn select(&mut self) -> PhaseSelection {
        match self.current() {
            Some(placement) => PhaseSelection::Place(placement),
            None => {
                log::debug!("Phase cycle complete after {} ticks, wrapping.", self.ticks);
                self.ticks = 0;
                PhaseSelection::Wrapped
            }
        }
    }

    /// Counts the end of a tick.
    pub fn advance(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
    }

    /// Back to tick zero.
    pub fn reset(&mut self) {
        self.ticks = 0;
    }

    /// Current counter value.
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Last inclusive boundary of the cycle; `None` for continuous layouts.
    pub fn final_boundary(&self) -> Option<u32> {
        self.boundaries.last().copied()
    }
}
