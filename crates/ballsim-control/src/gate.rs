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

//! Run reset on task completion.

use crate::driver::OscillatingDriver;
use crate::phase::PhaseTimer;
use crate::sequencer::WaypointSequencer;

/// Resets the run while the completion flag is observed.
///
/// The gate is level-triggered: the engine applies it on every tick the flag
/// reads `true`, not only on the rising edge. Applying it repeatedly leaves
/// the same state as applying it once. Retired targets come back at the
/// origin their scenario gave them.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct CompletionGate;

/// What a gate application changed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GateReset {
    /// Found count before the reset.
    pub cleared_count: u32,
    /// Retired targets put back at their origin.
    pub restored_targets: usize,
}

impl CompletionGate {
    /// Creates the gate.
    pub fn new() -> Self {
        Self
    }

    /// Clears the found count, rewinds the driver and the phase timer, and
    /// reactivates retired targets.
    pub fn apply(
        &self,
        sequencer: &mut WaypointSequencer,
        driver: &mut OscillatingDriver,
        timer: &mut PhaseTimer,
    ) -> GateReset {
        let cleared_count = sequencer.found_count();
        sequencer.reset_count();
        driver.reset();
        timer.reset();
        let restored_targets = sequencer.restore_inactive();

        log::debug!(
            "Completion reset: cleared {} found, restored {} target(s).",
            cleared_count,
            restored_targets
        );
        GateReset {
            cleared_count,
            restored_targets,
        }
    }
}
