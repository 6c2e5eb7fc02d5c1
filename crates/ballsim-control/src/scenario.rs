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

//! Declarative description of a simulation run.
//!
//! A [`Scenario`] lists the targets, how they react to a visit, how the ball
//! oscillates and which axis it is drawn on in each phase. The presets
//! ([`Scenario::line`], [`Scenario::room`], [`Scenario::maze`]) reproduce the
//! stock arena layouts; anything else can be loaded from a RON file.

use crate::error::ScenarioError;
use ballsim_core::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Radius within which a target counts as visited.
pub const DEFAULT_VISIT_RADIUS: f32 = 0.3;
/// Radius within which the agent counts as sitting on the charge pad.
pub const DEFAULT_CHARGE_PAD_RADIUS: f32 = 0.10;
/// Radius within which the agent counts as touching the ball.
pub const DEFAULT_PROXIMITY_RADIUS: f32 = 0.05;
/// Ticks per phase in the stock layouts.
pub const DEFAULT_PHASE_LENGTH: u32 = 3000;
/// Control loop period of every stock layout.
pub const DEFAULT_PERIOD_MS: u64 = 100;
/// Startup delay of the layouts that wait for other participants.
pub const DEFAULT_STARTUP_DELAY_MS: u64 = 5000;

/// Arena layout selector.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapType {
    /// Single target cycling around a room.
    Room,
    /// Two one-shot targets in a maze.
    #[default]
    Maze,
}

impl std::fmt::Display for MapType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Room => write!(f, "room"),
            Self::Maze => write!(f, "maze"),
        }
    }
}

/// What happens to a target once the agent reaches it.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisitMode {
    /// The target is retired to the sentinel until the completion gate fires.
    #[default]
    Deactivate,
    /// The target jumps to the next point of its rotation.
    Cycle,
    /// Targets are decorative and never visited.
    Fixed,
}

/// One target of the scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSpec {
    /// Where the target starts, and where the completion gate restores it.
    pub origin: Vec2,
    /// Sender stamp of the target's outbound frame.
    pub sender_stamp: u32,
    /// Points visited after `origin` in [`VisitMode::Cycle`], wrapping back to `origin`.
    #[serde(default)]
    pub rotation: Vec<Vec2>,
}

impl TargetSpec {
    /// A target without rotation.
    pub fn fixed(origin: Vec2, sender_stamp: u32) -> Self {
        Self {
            origin,
            sender_stamp,
            rotation: Vec::new(),
        }
    }
}

/// Parameters of the oscillating ball.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Position at startup and after a completion reset.
    pub initial_position: f32,
    /// Distance covered per tick.
    pub step: f32,
    /// Reversal bound; reaching or passing it turns the ball forward.
    pub lower_bound: f32,
    /// Reversal bound; reaching or passing it turns the ball back.
    pub upper_bound: f32,
    /// Obstacle distance the ball needs to keep moving. `None` never pauses.
    pub obstacle_gate: Option<f32>,
}

impl DriverConfig {
    /// The ball of the arena layouts, pausing when an obstacle is within 0.1.
    pub const fn arena() -> Self {
        Self {
            initial_position: 0.0,
            step: 0.1,
            lower_bound: -0.75,
            upper_bound: 1.25,
            obstacle_gate: Some(0.1),
        }
    }
}

/// Arena axis the ball is drawn on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    /// Ball at `(position, 0)`.
    X,
    /// Ball at `(0, position)`.
    Y,
}

/// Where the ball is drawn during a phase.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    /// The driver position is mapped onto an axis.
    Drive(Axis),
    /// The ball is parked at the sentinel, out of the arena.
    Parked,
}

/// A fixed-length window of the phase cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSpec {
    /// Number of ticks in the phase.
    pub length: u32,
    /// Ball placement during the phase.
    pub placement: Placement,
}

/// How ticks map to ball placements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseLayout {
    /// Always drive the same axis.
    Continuous(Axis),
    /// Walk through the phases, then wrap.
    Cycle(Vec<PhaseSpec>),
}

impl PhaseLayout {
    /// X drive, parked, Y drive, [`DEFAULT_PHASE_LENGTH`] ticks each.
    pub fn three_phase() -> Self {
        Self::Cycle(vec![
            PhaseSpec {
                length: DEFAULT_PHASE_LENGTH,
                placement: Placement::Drive(Axis::X),
            },
            PhaseSpec {
                length: DEFAULT_PHASE_LENGTH,
                placement: Placement::Parked,
            },
            PhaseSpec {
                length: DEFAULT_PHASE_LENGTH,
                placement: Placement::Drive(Axis::Y),
            },
        ])
    }
}

/// The charge pad reported in the status message.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargePad {
    /// Pad center.
    pub position: Vec2,
    /// Distance at which the agent counts as landed on the pad.
    pub radius: f32,
}

/// The per-tick status message.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusConfig {
    /// Sender stamp of the status message.
    pub sender_stamp: u32,
    /// Pad whose occupancy is reported, if any.
    pub charge_pad: Option<ChargePad>,
}

/// Sender stamps the inbound callbacks listen to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundStamps {
    /// Stamp of the agent's position frames.
    pub agent: u32,
    /// Stamp of the obstacle distance readings.
    pub obstacle: u32,
    /// Stamp of the completion flags.
    pub completion: u32,
}

impl Default for InboundStamps {
    fn default() -> Self {
        Self {
            agent: 0,
            obstacle: 1,
            completion: 0,
        }
    }
}

fn default_visit_radius() -> f32 {
    DEFAULT_VISIT_RADIUS
}

fn default_altitude() -> f32 {
    1.0
}

fn default_period_ms() -> u64 {
    DEFAULT_PERIOD_MS
}

/// A complete, declarative simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Human readable name, used in logs.
    pub name: String,
    /// Layout family, reported in logs. Presets pick their targets from it.
    #[serde(default)]
    pub map_type: MapType,
    /// Ordered targets. Earlier targets win ties.
    pub targets: Vec<TargetSpec>,
    /// Reaction of a target to a visit.
    #[serde(default)]
    pub visit_mode: VisitMode,
    /// Radius within which a target counts as visited.
    #[serde(default = "default_visit_radius")]
    pub visit_radius: f32,
    /// The oscillating ball.
    pub driver: DriverConfig,
    /// Tick-to-placement mapping of the ball.
    pub phases: PhaseLayout,
    /// Sender stamp of the ball frame.
    pub ball_stamp: u32,
    /// Altitude written into every outbound frame.
    #[serde(default = "default_altitude")]
    pub altitude: f32,
    /// The status message, if the layout publishes one.
    #[serde(default)]
    pub status: Option<StatusConfig>,
    /// Whether a completion flag resets the run.
    #[serde(default)]
    pub completion_gate: bool,
    /// Radius of the ball proximity watch, if enabled.
    #[serde(default)]
    pub proximity_radius: Option<f32>,
    /// Control loop period.
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,
    /// One-time wait before the first tick.
    #[serde(default)]
    pub startup_delay_ms: u64,
    /// Sender stamps of inbound traffic.
    #[serde(default)]
    pub inbound: InboundStamps,
}

impl Scenario {
    /// The minimal stub: a static target at the origin and a ball sweeping
    /// the y axis between -3 and 3, never pausing.
    pub fn line() -> Self {
        Self {
            name: "line".to_owned(),
            map_type: MapType::Maze,
            targets: vec![TargetSpec::fixed(Vec2::ZERO, 1)],
            visit_mode: VisitMode::Fixed,
            visit_radius: DEFAULT_VISIT_RADIUS,
            driver: DriverConfig {
                initial_position: 0.0,
                step: 0.1,
                lower_bound: -3.0,
                upper_bound: 3.0,
                obstacle_gate: None,
            },
            phases: PhaseLayout::Continuous(Axis::Y),
            ball_stamp: 2,
            altitude: 1.0,
            status: None,
            completion_gate: false,
            proximity_radius: None,
            period_ms: DEFAULT_PERIOD_MS,
            startup_delay_ms: 0,
            inbound: InboundStamps::default(),
        }
    }

    /// Two one-shot targets in the maze.
    pub fn maze() -> Self {
        Self {
            name: "maze".to_owned(),
            map_type: MapType::Maze,
            targets: vec![
                TargetSpec::fixed(Vec2::new(-0.65, 0.0), 1),
                TargetSpec::fixed(Vec2::new(1.25, -1.0), 3),
            ],
            visit_mode: VisitMode::Deactivate,
            ..Self::arena_base()
        }
    }

    /// One target cycling `(1,-1) -> (-0.7,-1) -> (1,0)` around the room.
    pub fn room() -> Self {
        Self {
            name: "room".to_owned(),
            map_type: MapType::Room,
            targets: vec![TargetSpec {
                origin: Vec2::new(1.0, -1.0),
                sender_stamp: 1,
                rotation: vec![Vec2::new(-0.7, -1.0), Vec2::new(1.0, 0.0)],
            }],
            visit_mode: VisitMode::Cycle,
            ..Self::arena_base()
        }
    }

    /// The preset of a map type.
    pub fn for_map(map_type: MapType) -> Self {
        match map_type {
            MapType::Room => Self::room(),
            MapType::Maze => Self::maze(),
        }
    }

    fn arena_base() -> Self {
        Self {
            name: String::new(),
            map_type: MapType::Maze,
            targets: Vec::new(),
            visit_mode: VisitMode::Deactivate,
            visit_radius: DEFAULT_VISIT_RADIUS,
            driver: DriverConfig::arena(),
            phases: PhaseLayout::three_phase(),
            ball_stamp: 2,
            altitude: 1.0,
            status: Some(StatusConfig {
                sender_stamp: 0,
                charge_pad: None,
            }),
            completion_gate: false,
            proximity_radius: Some(DEFAULT_PROXIMITY_RADIUS),
            period_ms: DEFAULT_PERIOD_MS,
            startup_delay_ms: DEFAULT_STARTUP_DELAY_MS,
            inbound: InboundStamps::default(),
        }
    }

    /// Reports charge pad occupancy in the status message.
    ///
    /// Scenarios without a status message get one on stamp 0.
    pub fn with_charge_pad(mut self, position: Vec2) -> Self {
        let pad = ChargePad {
            position,
            radius: DEFAULT_CHARGE_PAD_RADIUS,
        };
        match self.status.as_mut() {
            Some(status) => status.charge_pad = Some(pad),
            None => {
                self.status = Some(StatusConfig {
                    sender_stamp: 0,
                    charge_pad: Some(pad),
                })
            }
        }
        self
    }

    /// Enables or disables the completion gate.
    pub fn with_completion_gate(mut self, enabled: bool) -> Self {
        self.completion_gate = enabled;
        self
    }

    /// Control loop period.
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// One-time wait before the first tick.
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    /// Parses a scenario from RON text and validates it.
    pub fn from_ron_str(text: &str) -> Result<Self, ScenarioError> {
        let scenario: Self = ron::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Reads, parses and validates a RON scenario file.
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let text = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&text)
    }

    /// Checks the invariants the engine relies on.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !(1..=2).contains(&self.targets.len()) {
            return Err(ScenarioError::TargetCount(self.targets.len()));
        }
        if self.visit_mode == VisitMode::Cycle {
            if let Some(index) = self.targets.iter().position(|t| t.rotation.is_empty()) {
                return Err(ScenarioError::EmptyRotation { index });
            }
        }

        let mut stamps = HashSet::new();
        let outbound = self
            .targets
            .iter()
            .map(|t| t.sender_stamp)
            .chain(std::iter::once(self.ball_stamp))
            .chain(self.status.iter().map(|s| s.sender_stamp));
        for stamp in outbound {
            if !stamps.insert(stamp) {
                return Err(ScenarioError::DuplicateStamp(stamp));
            }
        }

        let driver = &self.driver;
        if !(driver.step.is_finite() && driver.step > 0.0) {
            return Err(ScenarioError::InvalidStep(driver.step));
        }
        if !(driver.lower_bound < driver.upper_bound) {
            return Err(ScenarioError::InvertedBounds {
                lower: driver.lower_bound,
                upper: driver.upper_bound,
            });
        }

        check_radius("visit", self.visit_radius)?;
        if let Some(radius) = self.proximity_radius {
            check_radius("proximity", radius)?;
        }
        if let Some(pad) = self.status.and_then(|s| s.charge_pad) {
            check_radius("charge pad", pad.radius)?;
        }

        if let PhaseLayout::Cycle(phases) = &self.phases {
            if phases.is_empty() {
                return Err(ScenarioError::EmptyPhases);
            }
            if let Some(index) = phases.iter().position(|p| p.length == 0) {
                return Err(ScenarioError::ZeroLengthPhase { index });
            }
            let max = u32::MAX / 2;
            let total = phases
                .iter()
                .try_fold(0u32, |acc, p| acc.checked_add(p.length))
                .filter(|total| *total <= max);
            if total.is_none() {
                return Err(ScenarioError::PhaseOverflow { max });
            }
        }

        if self.period_ms == 0 {
            return Err(ScenarioError::ZeroPeriod);
        }
        Ok(())
    }
}

fn check_radius(what: &'static str, value: f32) -> Result<(), ScenarioError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ScenarioError::InvalidRadius { what, value })
    }
}
