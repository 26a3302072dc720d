// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use crate::cli::{Cli, ValidateArgs};
use crate::config::FileConfig;
use crate::error::BinResult;

/// Validates the configuration file without starting the bridge.
pub fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config = FileConfig::load(&cli.config)?;

    println!("Configuration OK: {}", cli.config.display());
    println!("  session: {}@{}", config.session.name, config.session.host);
    println!(
        "  subscription: '{}' at {} ms, {} startup tag(s)",
        config.subscription.group_name,
        config.subscription.update_rate_ms,
        config.subscription.tags.len()
    );

    if args.show_config {
        let rendered = toml::to_string_pretty(&config)
            .map_err(|e| crate::error::BinError::runtime(e.to_string()))?;
        println!("\n{rendered}");
    }

    Ok(())
}
