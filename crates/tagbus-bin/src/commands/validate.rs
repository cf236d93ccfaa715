// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::config::load_config;
use crate::error::{BinError, BinResult};

/// Executes the `validate` command to validate configuration.
pub fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config_path = &cli.config;

    if !config_path.exists() {
        return Err(BinError::Configuration(format!(
            "Configuration file not found: {}",
            config_path.display()
        )));
    }

    let config = load_config(config_path).map_err(|e| {
        BinError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    let mut warnings: Vec<String> = Vec::new();

    if !config.database.path.exists() {
        warnings.push(format!(
            "Database file does not exist yet (will be created): {}",
            config.database.path.display()
        ));
    }

    if !config.journal.dir.exists() {
        warnings.push(format!(
            "Journal directory does not exist yet (will be created): {}",
            config.journal.dir.display()
        ));
    }

    if config.modbus.max_retries == 0 {
        warnings.push("Modbus connect retries disabled (max_retries: 0)".to_string());
    }

    match args.format {
        OutputFormat::Text => {
            println!("✓ Configuration is valid: {}", config_path.display());
            println!();
            println!("Summary:");
            println!("  API:      {}", config.api.bind_addr());
            println!("  Database: {}", config.database.path.display());
            println!("  Journal:  {}", config.journal.dir.display());
            println!(
                "  Modbus:   {:?} connect timeout, {} retries",
                config.modbus.connect_timeout, config.modbus.max_retries
            );

            if !warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &warnings {
                    println!("  ⚠ {}", warning);
                }
            }

            if args.show_config {
                println!();
                println!("Parsed configuration:");
                println!(
                    "{}",
                    serde_json::to_string_pretty(&config)
                        .unwrap_or_else(|_| "(serialization error)".to_string())
                );
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": true,
                "config_path": config_path.display().to_string(),
                "summary": {
                    "api": config.api.bind_addr(),
                    "database_path": config.database.path.display().to_string(),
                    "journal_dir": config.journal.dir.display().to_string(),
                    "modbus_max_retries": config.modbus.max_retries,
                },
                "warnings": warnings,
                "config": if args.show_config { Some(&config) } else { None },
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
        }
    }

    if args.strict && !warnings.is_empty() {
        return Err(BinError::Configuration(format!(
            "Strict mode: {} warning(s) found",
            warnings.len()
        )));
    }

    Ok(())
}
