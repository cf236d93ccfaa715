// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Request handlers.

mod autocontrol;
mod config;
mod direct;
mod health;
mod machines;
mod monitor;
mod values;

pub use autocontrol::{configure, execute, status, toggle};
pub use config::{export_config, import_config};
pub use direct::{read_analog, read_digital, test_connection, write_analog, write_digital};
pub use health::health;
pub use machines::{
    add_tag, delete_machine, delete_tag, list_machines, list_tags, update_tag, upsert_machine,
};
pub use monitor::machine_monitor;
pub use values::{read_tag_value, read_tag_values, write_tag_value};
