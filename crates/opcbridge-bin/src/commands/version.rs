// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `version` command.

use crate::error::BinResult;

/// Prints detailed version information.
pub fn version() -> BinResult<()> {
    println!("opcbridge v{}", opcbridge_core::VERSION);
    println!("  core:   {} v{}", opcbridge_core::NAME, opcbridge_core::VERSION);
    println!("  binary: {} v{}", crate::NAME, crate::VERSION);
    Ok(())
}
