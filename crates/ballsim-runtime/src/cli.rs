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

//! Command line options and scenario assembly.

use anyhow::{bail, Context, Result};
use ballsim_control::{MapType, Scenario};
use ballsim_core::Vec2;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum MapArg {
    Room,
    Maze,
}

impl From<MapArg> for MapType {
    fn from(arg: MapArg) -> Self {
        match arg {
            MapArg::Room => MapType::Room,
            MapArg::Maze => MapType::Maze,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Variant {
    /// Static target at the origin, ball sweeping the y axis.
    Line,
    /// The arena layout selected by --map-type.
    Layout,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    /// UDP multicast on 225.0.0.<cid>.
    Udp,
    /// In-process bus; outbound traffic is only logged.
    Local,
}

#[derive(Debug, Parser)]
#[command(name = "ballsim")]
#[command(about = "Scripted ball and waypoint simulator for a multicast session")]
pub struct Cli {
    /// Session id; selects the multicast group 225.0.0.<cid>
    #[arg(long)]
    pub cid: u16,

    /// Arena layout
    #[arg(long, value_enum, default_value_t = MapArg::Maze)]
    pub map_type: MapArg,

    /// Simulator flavour
    #[arg(long, value_enum, default_value_t = Variant::Layout)]
    pub variant: Variant,

    /// Charge pad x coordinate; requires --chpady
    #[arg(long, allow_negative_numbers = true)]
    pub chpadx: Option<f32>,

    /// Charge pad y coordinate; requires --chpadx
    #[arg(long, allow_negative_numbers = true)]
    pub chpady: Option<f32>,

    /// Reset the run whenever a task completion flag is received
    #[arg(long)]
    pub completion_gate: bool,

    /// Wait before the first tick, in milliseconds [default: from scenario]
    #[arg(long)]
    pub startup_delay_ms: Option<u64>,

    /// Control loop period, in milliseconds [default: from scenario]
    #[arg(long)]
    pub period_ms: Option<u64>,

    /// Load the scenario from a RON file instead of the presets
    #[arg(long)]
    pub scenario: Option<PathBuf>,

    /// Session implementation
    #[arg(long, value_enum, default_value_t = TransportKind::Udp)]
    pub transport: TransportKind,
}

impl Cli {
    /// Builds and validates the scenario described by the options.
    pub fn scenario(&self) -> Result<Scenario> {
        let mut scenario = match (&self.scenario, self.variant) {
            (Some(path), _) => Scenario::load(path)
                .with_context(|| format!("failed to load scenario {}", path.display()))?,
            (None, Variant::Line) => Scenario::line(),
            (None, Variant::Layout) => Scenario::for_map(self.map_type.into()),
        };

        match (self.chpadx, self.chpady) {
            (Some(x), Some(y)) => scenario = scenario.with_charge_pad(Vec2::new(x, y)),
            (None, None) => {}
            _ => bail!("--chpadx and --chpady must be given together"),
        }
        if self.completion_gate {
            scenario = scenario.with_completion_gate(true);
        }
        if let Some(delay) = self.startup_delay_ms {
            scenario.startup_delay_ms = delay;
        }
        if let Some(period) = self.period_ms {
            scenario.period_ms = period;
        }

        scenario.validate().context("invalid scenario")?;
        Ok(scenario)
    }
}
