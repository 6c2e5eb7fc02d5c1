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

//! The scenario interpreter.
//!
//! [`SimulationEngine::tick`] is a pure function of the engine state, one
//! [`Observation`] and the current instant: it performs no I/O besides
//! logging, which keeps the whole simulation testable without a transport.

use crate::driver::OscillatingDriver;
use crate::error::ScenarioError;
use crate::gate::{CompletionGate, GateReset};
use crate::observed::Observation;
use crate::phase::{PhaseSelection, PhaseTimer};
use crate::proximity::{ProximityEvent, ProximityWatch};
use crate::scenario::{Axis, Placement, Scenario};
use crate::sequencer::{Visit, WaypointSequencer, SENTINEL};
use ballsim_core::{Frame, Message, TargetFoundState, Vec2};
use std::time::Instant;

/// Everything one tick produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Index of the tick since the engine was created, starting at 1.
    pub iteration: u64,
    /// One `(sender_stamp, frame)` per target, in scenario order.
    pub targets: Vec<(u32, Frame)>,
    /// The ball frame and its sender stamp.
    pub ball: (u32, Frame),
    /// The status message and its sender stamp, if the scenario has one.
    pub status: Option<(u32, TargetFoundState)>,
    /// Set when the completion gate fired this tick.
    pub reset: Option<GateReset>,
    /// Set when a target was reached this tick.
    pub visit: Option<Visit>,
    /// Set when the agent touched or left the ball this tick.
    pub proximity: Option<ProximityEvent>,
}

impl TickReport {
    /// Messages to publish, in order: targets, ball, status.
    pub fn outbound(&self) -> Vec<(u32, Message)> {
        let mut out = Vec::with_capacity(self.targets.len() + 2);
        out.extend(
            self.targets
                .iter()
                .map(|(stamp, frame)| (*stamp, Message::Frame(*frame))),
        );
        out.push((self.ball.0, Message::Frame(self.ball.1)));
        if let Some((stamp, status)) = self.status {
            out.push((stamp, Message::TargetFoundState(status)));
        }
        out
    }
}

/// Interprets a [`Scenario`] one tick at a time.
#[derive(Debug, Clone)]
pub struct SimulationEngine {
    scenario: Scenario,
    sequencer: WaypointSequencer,
    driver: OscillatingDriver,
    timer: PhaseTimer,
    gate: Option<CompletionGate>,
    proximity: Option<ProximityWatch>,
    iteration: u64,
}

impl SimulationEngine {
    /// Validates `scenario` and builds the engine at tick zero.
    pub fn new(scenario: Scenario) -> Result<Self, ScenarioError> {
        scenario.validate()?;
        Ok(Self {
            sequencer: WaypointSequencer::new(
                &scenario.targets,
                scenario.visit_mode,
                scenario.visit_radius,
            ),
            driver: OscillatingDriver::new(scenario.driver),
            timer: PhaseTimer::new(scenario.phases.clone()),
            gate: scenario.completion_gate.then(CompletionGate::new),
            proximity: scenario.proximity_radius.map(ProximityWatch::new),
            iteration: 0,
            scenario,
        })
    }

    /// Runs one control iteration against `observation`.
    pub fn tick(&mut self, observation: &Observation, now: Instant) -> TickReport {
        self.iteration += 1;

        let reset = match self.gate {
            Some(gate) if observation.task_completed => {
                Some(gate.apply(&mut self.sequencer, &mut self.driver, &mut self.timer))
            }
            _ => None,
        };

        let proximity = self.watch_ball(observation, now);

        let visit = self.sequencer.visit(observation.position);
        if let Some(visit) = &visit {
            match visit.moved_to {
                Some(next) => log::info!(
                    "Target {} reached at ({:.2}, {:.2}), next at ({:.2}, {:.2}). Found: {}",
                    visit.index,
                    visit.at.x,
                    visit.at.y,
                    next.x,
                    next.y,
                    visit.found_count
                ),
                None => log::info!(
                    "Target {} reached at ({:.2}, {:.2}). Found: {}",
                    visit.index,
                    visit.at.x,
                    visit.at.y,
                    visit.found_count
                ),
            }
        }

        self.driver.step(observation.obstacle_distance);

        let altitude = self.scenario.altitude;
        let ball = match self.timer.select() {
            PhaseSelection::Place(placement) => Frame::at(self.place_ball(placement), altitude),
            PhaseSelection::Wrapped => Frame::default(),
        };

        let targets = self
            .sequencer
            .targets()
            .iter()
            .map(|t| (t.sender_stamp(), Frame::at(t.published_position(), altitude)))
            .collect();

        let status = self.scenario.status.map(|status| {
            let on_pad = status
                .charge_pad
                .is_some_and(|pad| observation.position.distance(pad.position) <= pad.radius);
            (
                status.sender_stamp,
                TargetFoundState {
                    target_found_count: self.sequencer.found_count(),
                    is_chpad_found: on_pad,
                },
            )
        });

        self.timer.advance();

        log::trace!(
            "Tick {}: agent ({:.2}, {:.2}), ball ({:.2}, {:.2}), found {}",
            self.iteration,
            observation.position.x,
            observation.position.y,
            ball.x,
            ball.y,
            self.sequencer.found_count()
        );

        TickReport {
            iteration: self.iteration,
            targets,
            ball: (self.scenario.ball_stamp, ball),
            status,
            reset,
            visit,
            proximity,
        }
    }

    // Contact is only tracked once a distance reading exists and while the
    // ball is actually drawn on an axis; parked and wrap ticks leave it alone.
    fn watch_ball(&mut self, observation: &Observation, now: Instant) -> Option<ProximityEvent> {
        if !observation.has_distance_reading() {
            return None;
        }
        let ball = match self.timer.current()? {
            Placement::Drive(axis) => project(axis, self.driver.position()),
            Placement::Parked => return None,
        };
        self.proximity
            .as_mut()?
            .observe(observation.position, ball, now)
    }

    fn place_ball(&self, placement: Placement) -> Vec2 {
        match placement {
            Placement::Drive(axis) => project(axis, self.driver.position()),
            Placement::Parked => SENTINEL,
        }
    }

    /// The scenario being interpreted.
    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Current target state and found count.
    pub fn sequencer(&self) -> &WaypointSequencer {
        &self.sequencer
    }

    /// Current ball driver state.
    pub fn driver(&self) -> &OscillatingDriver {
        &self.driver
    }

    /// Current phase counter.
    pub fn timer(&self) -> &PhaseTimer {
        &self.timer
    }
}

fn project(axis: Axis, position: f32) -> Vec2 {
    match axis {
        Axis::X => Vec2::new(position, 0.0),
        Axis::Y => Vec2::new(0.0, position),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observed::NO_READING;
    use approx::assert_abs_diff_eq;

    fn arena_frame(x: f32, y: f32) -> Frame {
        Frame::at(Vec2::new(x, y), 1.0)
    }

    fn clear_floor(position: Vec2) -> Observation {
        Observation {
            position,
            obstacle_distance: 1.0,
            task_completed: false,
        }
    }

    #[test]
    fn test_outbound_order_and_stamps() {
        let mut engine = SimulationEngine::new(Scenario::maze()).expect("valid");
        let report = engine.tick(&clear_floor(Vec2::ZERO), Instant::now());
        let stamps: Vec<u32> = report.outbound().iter().map(|(s, _)| *s).collect();
        assert_eq!(stamps, vec![1, 3, 2, 0]);
    }

    #[test]
    fn test_first_tick_of_maze() {
        let mut engine = SimulationEngine::new(Scenario::maze()).expect("valid");
        let report = engine.tick(&clear_floor(Vec2::ZERO), Instant::now());

        assert_eq!(report.iteration, 1);
        assert_eq!(report.targets[0], (1, arena_frame(-0.65, 0.0)));
        assert_eq!(report.targets[1], (3, arena_frame(1.25, -1.0)));
        assert_eq!(report.ball.0, 2);
        assert_abs_diff_eq!(report.ball.1.x, 0.1, epsilon = 1e-6);
        assert_eq!(report.ball.1.y, 0.0);
        assert_eq!(report.ball.1.z, 1.0);
        assert_eq!(
            report.status,
            Some((
                0,
                TargetFoundState {
                    target_found_count: 0,
                    is_chpad_found: false
                }
            ))
        );
        assert_eq!(engine.timer().ticks(), 1);
    }

    #[test]
    fn test_ball_waits_for_first_reading() {
        let mut engine = SimulationEngine::new(Scenario::maze()).expect("valid");
        let observation = Observation {
            obstacle_distance: NO_READING,
            ..Observation::default()
        };
        for _ in 0..5 {
            let report = engine.tick(&observation, Instant::now());
            assert_eq!(report.ball.1.x, 0.0);
        }
    }

    #[test]
    fn test_visit_retires_target_on_the_wire() {
        let mut engine = SimulationEngine::new(Scenario::maze()).expect("valid");
        let report = engine.tick(&clear_floor(Vec2::new(1.2, -0.9)), Instant::now());

        assert_eq!(report.visit.map(|v| v.index), Some(1));
        assert_eq!(report.targets[1], (3, arena_frame(-5.0, -5.0)));
        assert_eq!(report.status.map(|(_, s)| s.target_found_count), Some(1));
    }

    #[test]
    fn test_room_visit_publishes_next_rotation_point() {
        let mut engine = SimulationEngine::new(Scenario::room()).expect("valid");
        let now = Instant::now();
        engine.tick(&clear_floor(Vec2::new(0.0, 0.5)), now);

        let report = engine.tick(&clear_floor(Vec2::new(1.1, -0.85)), now);

        assert_eq!(report.status.map(|(_, s)| s.target_found_count), Some(1));
        assert_eq!(report.targets, vec![(1, arena_frame(-0.7, -1.0))]);
        assert_eq!(report.visit.and_then(|v| v.moved_to), Some(Vec2::new(-0.7, -1.0)));
    }

    #[test]
    fn test_charge_pad_flag_follows_agent() {
        let scenario = Scenario::maze().with_charge_pad(Vec2::new(0.5, 0.5));
        let mut engine = SimulationEngine::new(scenario).expect("valid");
        let now = Instant::now();

        let on_pad = engine.tick(&clear_floor(Vec2::new(0.55, 0.5)), now);
        assert_eq!(on_pad.status.map(|(_, s)| s.is_chpad_found), Some(true));

        let off_pad = engine.tick(&clear_floor(Vec2::new(0.7, 0.5)), now);
        assert_eq!(off_pad.status.map(|(_, s)| s.is_chpad_found), Some(false));
    }

    #[test]
    fn test_gate_ignored_when_disabled() {
        let mut engine = SimulationEngine::new(Scenario::maze()).expect("valid");
        engine.tick(&clear_floor(Vec2::new(-0.65, 0.0)), Instant::now());
        let report = engine.tick(
            &Observation {
                task_completed: true,
                ..clear_floor(Vec2::ZERO)
            },
            Instant::now(),
        );
        assert_eq!(report.reset, None);
        assert_eq!(engine.sequencer().found_count(), 1);
    }

    #[test]
    fn test_gate_fires_every_tick_while_flag_holds() {
        let scenario = Scenario::maze().with_completion_gate(true);
        let mut engine = SimulationEngine::new(scenario).expect("valid");
        engine.tick(&clear_floor(Vec2::new(-0.65, 0.0)), Instant::now());

        let done = Observation {
            task_completed: true,
            ..clear_floor(Vec2::ZERO)
        };
        let first = engine.tick(&done, Instant::now());
        let second = engine.tick(&done, Instant::now());

        assert_eq!(first.reset.map(|r| r.cleared_count), Some(1));
        assert_eq!(first.reset.map(|r| r.restored_targets), Some(1));
        assert!(second.reset.is_some(), "level-triggered");
        assert_eq!(first.targets, second.targets);
        assert_eq!(first.ball, second.ball);
        assert_eq!(first.status, second.status);
        assert_eq!(engine.timer().ticks(), 1);
    }

    #[test]
    fn test_parked_phase_publishes_sentinel() {
        let mut engine = SimulationEngine::new(Scenario::maze()).expect("valid");
        let observation = clear_floor(Vec2::ZERO);
        let now = Instant::now();
        for _ in 0..=3000 {
            engine.tick(&observation, now);
        }
        let report = engine.tick(&observation, now);
        assert_eq!(report.ball.1, arena_frame(-5.0, -5.0));
    }

    #[test]
    fn test_wrap_tick_publishes_zero_frame() {
        let mut engine = SimulationEngine::new(Scenario::maze()).expect("valid");
        let observation = clear_floor(Vec2::new(3.0, 3.0));
        let now = Instant::now();
        for _ in 0..=9000 {
            engine.tick(&observation, now);
        }
        let wrap = engine.tick(&observation, now);
        assert_eq!(wrap.ball.1, Frame::default());
        assert_eq!(engine.timer().ticks(), 1);

        let next = engine.tick(&observation, now);
        assert_eq!(next.ball.1.y, 0.0, "back on the x axis");
        assert_eq!(next.ball.1.z, 1.0);
    }

    #[test]
    fn test_line_variant_sweeps_y_between_three() {
        let mut engine = SimulationEngine::new(Scenario::line()).expect("valid");
        let observation = Observation::default();
        let now = Instant::now();
        let mut max_y = f32::MIN;
        let mut min_y = f32::MAX;
        for _ in 0..200 {
            let report = engine.tick(&observation, now);
            assert_eq!(report.ball.1.x, 0.0);
            assert!(report.status.is_none());
            assert_eq!(report.targets, vec![(1, arena_frame(0.0, 0.0))]);
            max_y = max_y.max(report.ball.1.y);
            min_y = min_y.min(report.ball.1.y);
        }
        // One step of overshoot at most past either bound.
        assert!(max_y > 2.99 && max_y < 3.11, "max {max_y}");
        assert!(min_y < -2.99 && min_y > -3.11, "min {min_y}");
    }

    #[test]
    fn test_proximity_needs_reading_and_driven_ball() {
        let mut engine = SimulationEngine::new(Scenario::maze()).expect("valid");
        let now = Instant::now();

        // No reading: agent and ball share the origin but nothing is tracked,
        // and the closed obstacle gate keeps the ball there.
        let blind = Observation::default();
        assert_eq!(engine.tick(&blind, now).proximity, None);

        let report = engine.tick(&clear_floor(Vec2::ZERO), now);
        assert_eq!(report.proximity, Some(ProximityEvent::Entered));

        let report = engine.tick(&clear_floor(Vec2::new(-0.5, 0.0)), now);
        assert!(matches!(report.proximity, Some(ProximityEvent::Left { .. })));
    }
}
