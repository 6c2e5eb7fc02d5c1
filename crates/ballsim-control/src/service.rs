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

//! The periodic control loop wiring a [`SimulationEngine`] to a [`Transport`].

use crate::engine::SimulationEngine;
use crate::error::ScenarioError;
use crate::observed::ObservedState;
use crate::scenario::Scenario;
use ballsim_core::{Envelope, Message, MessageKind, TimeStamp, Transport};
use std::sync::Arc;
use std::time::Instant;

/// Outcome of a finished run.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks executed.
    pub iterations: u64,
    /// Found count when the session stopped.
    pub found_count: u32,
}

/// Subscribes to the agent's traffic and publishes the simulation every period.
pub struct BallSimService {
    transport: Arc<dyn Transport>,
    engine: SimulationEngine,
    observed: Arc<ObservedState>,
}

impl BallSimService {
    /// Validates `scenario` and registers the inbound callbacks on `transport`.
    ///
    /// The completion flag is only listened to when the scenario enables the
    /// completion gate.
    pub fn new(transport: Arc<dyn Transport>, scenario: Scenario) -> Result<Self, ScenarioError> {
        let inbound = scenario.inbound;
        let gated = scenario.completion_gate;
        let engine = SimulationEngine::new(scenario)?;
        let observed = Arc::new(ObservedState::new());

        let state = Arc::clone(&observed);
        transport.subscribe(
            MessageKind::Frame,
            Arc::new(move |envelope: Envelope| {
                if envelope.sender_stamp != inbound.agent {
                    return;
                }
                if let Message::Frame(frame) = envelope.message {
                    state.update_position(frame.x, frame.y);
                }
            }),
        );

        let state = Arc::clone(&observed);
        transport.subscribe(
            MessageKind::PreviewPoint,
            Arc::new(move |envelope: Envelope| {
                if envelope.sender_stamp != inbound.obstacle {
                    return;
                }
                if let Message::PreviewPoint(point) = envelope.message {
                    state.update_obstacle_distance(point.distance);
                }
            }),
        );

        if gated {
            let state = Arc::clone(&observed);
            transport.subscribe(
                MessageKind::TaskCompletion,
                Arc::new(move |envelope: Envelope| {
                    if envelope.sender_stamp != inbound.completion {
                        return;
                    }
                    if let Message::TaskCompletion(done) = envelope.message {
                        state.update_completion(done.completed);
                    }
                }),
            );
        }

        Ok(Self {
            transport,
            engine,
            observed,
        })
    }

    /// Shared view of the inbound state.
    pub fn observed(&self) -> &Arc<ObservedState> {
        &self.observed
    }

    /// The engine driven by this service.
    pub fn engine(&self) -> &SimulationEngine {
        &self.engine
    }

    /// Runs until the transport stops.
    ///
    /// Waits out the startup delay once, then sleeps one period, snapshots the
    /// observed state, ticks the engine and publishes its output, in that
    /// order, for as long as the session is running.
    pub fn run(&mut self) -> RunSummary {
        let scenario = self.engine.scenario();
        let delay = scenario.startup_delay();
        let period = scenario.period();
        if !delay.is_zero() {
            log::info!(
                "Waiting {} ms for the other participants...",
                delay.as_millis()
            );
            std::thread::sleep(delay);
        }

        log::info!(
            "Start ball simulation '{}' ({} layout, {} ms period).",
            scenario.name,
            scenario.map_type,
            period.as_millis()
        );

        let mut iterations = 0u64;
        while self.transport.is_running() {
            std::thread::sleep(period);
            let observation = self.observed.snapshot();
            let report = self.engine.tick(&observation, Instant::now());
            for (stamp, message) in report.outbound() {
                self.transport.publish(message, TimeStamp::now(), stamp);
            }
            iterations += 1;
        }

        let summary = RunSummary {
            iterations,
            found_count: self.engine.sequencer().found_count(),
        };
        log::info!(
            "Session stopped after {} tick(s), {} target(s) found.",
            summary.iterations,
            summary.found_count
        );
        summary
    }
}
