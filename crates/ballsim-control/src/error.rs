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

//! Errors raised while loading or validating a scenario.

use std::path::PathBuf;
use thiserror::Error;

/// A scenario that cannot be run.
///
/// These are startup-time errors only; nothing observed at runtime is ever
/// turned into an error.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// Scenarios drive one or two targets.
    #[error("scenario must define 1 or 2 targets, found {0}")]
    TargetCount(usize),
    /// A cycling target needs at least one point to cycle to.
    #[error("target {index} has no rotation points but the scenario cycles targets")]
    EmptyRotation {
        /// Position of the target in the scenario list.
        index: usize,
    },
    /// Two outbound streams share a sender stamp.
    #[error("sender stamp {0} is used by more than one outbound stream")]
    DuplicateStamp(u32),
    /// The driver step must be a positive, finite number.
    #[error("driver step must be positive and finite, got {0}")]
    InvalidStep(f32),
    /// The driver bounds are empty or inverted.
    #[error("driver bounds are inverted: lower {lower} >= upper {upper}")]
    InvertedBounds {
        /// Lower reversal bound.
        lower: f32,
        /// Upper reversal bound.
        upper: f32,
    },
    /// A radius (visit, proximity, charge pad) must be positive.
    #[error("{what} radius must be positive, got {value}")]
    InvalidRadius {
        /// Which radius.
        what: &'static str,
        /// The offending value.
        value: f32,
    },
    /// A cycling phase layout needs at least one phase.
    #[error("phase cycle is empty")]
    EmptyPhases,
    /// Every phase must last at least one tick.
    #[error("phase {index} has zero length")]
    ZeroLengthPhase {
        /// Position of the phase in the cycle.
        index: usize,
    },
    /// The phase cycle does not fit in the tick counter.
    #[error("phase cycle is longer than {max} ticks")]
    PhaseOverflow {
        /// Largest supported total length.
        max: u32,
    },
    /// The control loop needs a non-zero period.
    #[error("control loop period must be at least 1 ms")]
    ZeroPeriod,
    /// The scenario file could not be read.
    #[error("failed to read scenario file {path}: {source}")]
    Io {
        /// The file that was requested.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The scenario file is not a valid RON scenario.
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] ron::error::SpannedError),
}
