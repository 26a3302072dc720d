// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Main binary entry point for the opcbridge gateway.

use opcbridge_bin::error::report_error_and_exit;
use opcbridge_bin::{commands, init_logging, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    init_logging(cli.effective_log_level(), cli.log_format);

    if let Err(error) = commands::execute(cli).await {
        report_error_and_exit(error);
    }
}
