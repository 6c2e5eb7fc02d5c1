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

//! Waypoint sequencing: targets the agent has to reach, and the found count.

use crate::scenario::{TargetSpec, VisitMode};
use ballsim_core::Vec2;

/// Out-of-arena point published for retired targets and the parked ball.
pub const SENTINEL: Vec2 = Vec2::new(-5.0, -5.0);

/// A target and its progress through its rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    route: Vec<Vec2>,
    cursor: usize,
    active: bool,
    sender_stamp: u32,
}

impl Target {
    fn from_spec(spec: &TargetSpec) -> Self {
        let mut route = Vec::with_capacity(1 + spec.rotation.len());
        route.push(spec.origin);
        route.extend_from_slice(&spec.rotation);
        Self {
            route,
            cursor: 0,
            active: true,
            sender_stamp: spec.sender_stamp,
        }
    }

    /// Current coordinates while active.
    pub fn position(&self) -> Vec2 {
        self.route[self.cursor]
    }

    /// `false` once retired.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// What goes on the wire: the position, or [`SENTINEL`] once retired.
    pub fn published_position(&self) -> Vec2 {
        if self.active {
            self.position()
        } else {
            SENTINEL
        }
    }

    /// Sender stamp of the target's frame.
    pub fn sender_stamp(&self) -> u32 {
        self.sender_stamp
    }
}

/// A target reached during a tick.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Visit {
    /// Index of the target in the scenario list.
    pub index: usize,
    /// Where the target was when it was reached.
    pub at: Vec2,
    /// Where the target moved to; `None` when it was retired.
    pub moved_to: Option<Vec2>,
    /// Found count after the visit.
    pub found_count: u32,
}

/// Advances targets as the agent reaches them.
#[derive(Debug, Clone)]
pub struct WaypointSequencer {
    targets: Vec<Target>,
    mode: VisitMode,
    radius: f32,
    found: u32,
}

impl WaypointSequencer {
    /// Builds the sequencer from the scenario's target list.
    pub fn new(specs: &[TargetSpec], mode: VisitMode, radius: f32) -> Self {
        Self {
            targets: specs.iter().map(Target::from_spec).collect(),
            mode,
            radius,
            found: 0,
        }
    }

    /// Checks `position` against the active targets in list order.
    ///
    /// The first target within the visit radius is advanced and counted; the
    /// others wait for the next tick even if they are within reach too.
    pub fn visit(&mut self, position: Vec2) -> Option<Visit> {
        if self.mode == VisitMode::Fixed {
            return None;
        }

        let radius = self.radius;
        let (index, target) = self
            .targets
            .iter_mut()
            .enumerate()
            .find(|(_, t)| t.active && position.distance(t.position()) <= radius)?;

        let at = target.position();
        let moved_to = match self.mode {
            VisitMode::Cycle => {
                target.cursor = (target.cursor + 1) % target.route.len();
                Some(target.position())
            }
            _ => {
                target.active = false;
                None
            }
        };
        self.found = self.found.saturating_add(1);

        Some(Visit {
            index,
            at,
            moved_to,
            found_count: self.found,
        })
    }

    /// Reactivates every retired target at its origin.
    ///
    /// Returns how many targets were restored. Active targets keep their
    /// place in the rotation.
    pub fn restore_inactive(&mut self) -> usize {
        let mut restored = 0;
        for target in self.targets.iter_mut().filter(|t| !t.active) {
            target.active = true;
            target.cursor = 0;
            restored += 1;
        }
        restored
    }

    /// Resets the found count to zero.
    pub fn reset_count(&mut self) {
        self.found = 0;
    }

    /// Targets visited since the last reset.
    pub fn found_count(&self) -> u32 {
        self.found
    }

    /// All targets, in scenario order.
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn maze() -> WaypointSequencer {
        WaypointSequencer::new(
            &[
                TargetSpec::fixed(Vec2::new(-0.65, 0.0), 1),
                TargetSpec::fixed(Vec2::new(1.25, -1.0), 3),
            ],
            VisitMode::Deactivate,
            0.3,
        )
    }

    fn room() -> WaypointSequencer {
        WaypointSequencer::new(
            &[TargetSpec {
                origin: Vec2::new(1.0, -1.0),
                sender_stamp: 1,
                rotation: vec![Vec2::new(-0.7, -1.0), Vec2::new(1.0, 0.0)],
            }],
            VisitMode::Cycle,
            0.3,
        )
    }

    #[test]
    fn test_far_position_changes_nothing() {
        let mut seq = maze();
        let before = seq.targets().to_vec();
        for p in [Vec2::ZERO, Vec2::new(-0.2, 0.0), Vec2::new(1.25, -0.69)] {
            assert_eq!(seq.visit(p), None);
        }
        assert_eq!(seq.targets(), &before[..]);
        assert_eq!(seq.found_count(), 0);
    }

    #[test]
    fn test_reaching_target_retires_it_once() {
        let mut seq = maze();
        let visit = seq.visit(Vec2::new(-0.6, 0.1)).expect("within radius");
        assert_eq!(visit.index, 0);
        assert_eq!(visit.moved_to, None);
        assert_eq!(visit.found_count, 1);
        assert!(!seq.targets()[0].is_active());
        assert_eq!(seq.targets()[0].published_position(), SENTINEL);

        // Standing on the retired spot does not count again.
        assert_eq!(seq.visit(Vec2::new(-0.6, 0.1)), None);
        assert_eq!(seq.found_count(), 1);
    }

    #[test]
    fn test_boundary_distance_counts_as_visit() {
        let mut seq = WaypointSequencer::new(
            &[TargetSpec::fixed(Vec2::ZERO, 1)],
            VisitMode::Deactivate,
            5.0,
        );
        assert!(seq.visit(Vec2::new(3.0, 4.0)).is_some());
    }

    #[test]
    fn test_first_target_wins_tie() {
        let mut seq = WaypointSequencer::new(
            &[
                TargetSpec::fixed(Vec2::new(0.0, 0.0), 1),
                TargetSpec::fixed(Vec2::new(0.1, 0.0), 3),
            ],
            VisitMode::Deactivate,
            0.3,
        );
        let here = Vec2::new(0.05, 0.0);

        assert_eq!(seq.visit(here).map(|v| v.index), Some(0));
        assert!(seq.targets()[1].is_active());
        assert_eq!(seq.found_count(), 1);

        assert_eq!(seq.visit(here).map(|v| v.index), Some(1));
        assert_eq!(seq.found_count(), 2);
    }

    #[test]
    fn test_room_target_cycles_through_rotation() {
        let mut seq = room();
        let visit = seq.visit(Vec2::new(1.0, -1.0)).expect("on target");
        assert_eq!(visit.moved_to, Some(Vec2::new(-0.7, -1.0)));
        assert!(seq.targets()[0].is_active());

        seq.visit(Vec2::new(-0.7, -1.0)).expect("second point");
        assert_eq!(seq.targets()[0].position(), Vec2::new(1.0, 0.0));

        seq.visit(Vec2::new(1.0, 0.0)).expect("third point");
        assert_eq!(seq.targets()[0].position(), Vec2::new(1.0, -1.0));
        assert_eq!(seq.found_count(), 3);
    }

    #[test]
    fn test_fixed_targets_are_never_visited() {
        let mut seq = WaypointSequencer::new(
            &[TargetSpec::fixed(Vec2::ZERO, 1)],
            VisitMode::Fixed,
            0.3,
        );
        assert_eq!(seq.visit(Vec2::ZERO), None);
        assert_eq!(seq.found_count(), 0);
    }

    #[test]
    fn test_nan_position_is_never_within_reach() {
        let mut seq = maze();
        assert_eq!(seq.visit(Vec2::new(f32::NAN, f32::NAN)), None);
    }

    #[test]
    fn test_restore_reactivates_only_retired_targets() {
        let mut seq = maze();
        seq.visit(Vec2::new(1.25, -1.0)).expect("second target");
        assert_eq!(seq.restore_inactive(), 1);
        assert!(seq.targets().iter().all(Target::is_active));
        assert_eq!(seq.targets()[1].published_position(), Vec2::new(1.25, -1.0));
        assert_eq!(seq.restore_inactive(), 0);
    }
}
