// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `version` command.

use crate::cli::Cli;
use crate::error::BinResult;

/// Executes the `version` command to display version information.
pub fn version(_cli: &Cli) -> BinResult<()> {
    println!("tagbus - Modbus/TCP tag gateway");
    println!();
    println!("Version Information:");
    println!("  tagbus-bin:     {}", env!("CARGO_PKG_VERSION"));
    println!("  tagbus-core:    {}", tagbus_core::VERSION);
    println!("  tagbus-modbus:  {}", tagbus_modbus::VERSION);
    println!("  tagbus-store:   {}", tagbus_store::VERSION);
    println!("  tagbus-gateway: {}", tagbus_gateway::VERSION);
    println!("  tagbus-api:     {}", tagbus_api::VERSION);
    println!();
    println!("Build Information:");
    println!("  Target: {}", std::env::consts::ARCH);
    println!("  OS:     {}", std::env::consts::OS);
    println!();
    println!("License: PolyForm Noncommercial License 1.0.0");
    println!("Copyright (c) 2025 Sylvex. All rights reserved.");

    Ok(())
}
