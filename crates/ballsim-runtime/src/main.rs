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

mod cli;
mod session;

use anyhow::{Context, Result};
use ballsim_control::BallSimService;
use clap::Parser;
use cli::Cli;
use session::Session;

fn main() -> Result<()> {
    let cli = Cli::parse();

    use env_logger::{Builder, Env};
    Builder::from_env(Env::default().default_filter_or("info")).init();

    let scenario = cli.scenario()?;
    log::info!(
        "Scenario '{}' selected for session {} ({:?} transport).",
        scenario.name,
        cli.cid,
        cli.transport
    );

    let session = Session::open(&cli)?;
    let mut service = BallSimService::new(session.transport(), scenario)
        .context("failed to start the simulation")?;

    let handle = session.clone();
    ctrlc::set_handler(move || {
        log::info!("Interrupted, stopping the session.");
        handle.stop();
    })
    .context("failed to install the Ctrl-C handler")?;

    let summary = service.run();
    session.stop();

    log::info!(
        "Simulation finished: {} tick(s), {} target(s) found.",
        summary.iterations,
        summary.found_count
    );
    Ok(())
}
