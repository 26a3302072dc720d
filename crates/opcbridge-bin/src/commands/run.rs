// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `run` command.

use std::time::Duration;

use tracing::info;

use crate::cli::{Cli, RunArgs};
use crate::error::BinResult;
use crate::runtime::RuntimeBuilder;

/// Executes the `run` command to start the bridge.
pub async fn run(cli: &Cli, args: RunArgs) -> BinResult<()> {
    info!("Starting opcbridge...");

    let runtime = RuntimeBuilder::new()
        .config_path(&cli.config)
        .run_for(args.run_for.map(Duration::from_secs))
        .skip_subscribe(args.skip_subscribe)
        .build()?;

    runtime.run().await
}
