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

//! # Ballsim Control
//!
//! The scripted ball simulation: a generic engine interpreting a declarative
//! [`Scenario`], and the [`BallSimService`] loop that feeds it observed agent
//! state and publishes its output on a [`Transport`](ballsim_core::Transport).
//!
//! Per tick the engine runs, in order: the completion gate, the proximity
//! watch, the waypoint sequencer, the oscillating driver and the phase timer.

#![warn(missing_docs)]

pub mod driver;
pub mod engine;
pub mod error;
pub mod gate;
pub mod observed;
pub mod phase;
pub mod proximity;
pub mod scenario;
pub mod sequencer;
pub mod service;

pub use engine::{SimulationEngine, TickReport};
pub use error::ScenarioError;
pub use observed::{Observation, ObservedState};
pub use scenario::{MapType, Scenario};
pub use service::{BallSimService, RunSummary};
