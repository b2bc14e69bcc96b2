// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! This module provides utility functions for working with configuration
//! settings, including validation and schema management.

use anyhow::{Context, Result};
use log::{debug, warn};

use super::Config;
use crate::register_map::Endianness;

/// Output the embedded JSON schema to the console.
///
/// This function is called when the `--show-config-schema` flag is provided
/// on the command line.
///
/// # Example
///
/// ```bash
/// ./rust_modbus_sim --show-config-schema > config_schema.json
/// ```
pub fn output_config_schema() -> Result<()> {
    let schema_str = include_str!("../../resources/config.schema.json");

    let schema: serde_json::Value =
        serde_json::from_str(schema_str).context("Failed to parse JSON schema")?;

    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;

    println!("{}", formatted_schema);

    Ok(())
}

/// Validates the configuration against additional rules that aren't covered by the JSON schema.
///
/// The schema already bounds individual fields when a file is loaded; these
/// checks also run on configurations built or overridden from the command line.
///
/// # Validation Rules
///
/// - **Serial line**: non-empty port, non-zero baud rate, 5 to 8 data bits,
///   1 or 2 stop bits and a positive timeout
/// - **Unit id**: 1 to 247, broadcast address 0 is never a slave id
/// - **4xxxx base**: must itself read as a 4xxxx address (five or more digits, leading 4)
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    debug!("Performing additional validation checks");

    let modbus = &config.modbus;
    if modbus.port.trim().is_empty() {
        anyhow::bail!("Serial port must not be empty");
    }
    if modbus.baud_rate == 0 {
        anyhow::bail!("Invalid baud rate: {}", modbus.baud_rate);
    }
    if !(5..=8).contains(&modbus.data_bits) {
        anyhow::bail!("Invalid data bits: {}", modbus.data_bits);
    }
    if !matches!(modbus.stop_bits, 1 | 2) {
        anyhow::bail!("Invalid stop bits: {}", modbus.stop_bits);
    }
    if !(modbus.timeout.is_finite() && modbus.timeout > 0.0) {
        anyhow::bail!("Invalid serial timeout: {}", modbus.timeout);
    }
    if !(1..=247).contains(&modbus.slave_id) {
        anyhow::bail!("Invalid slave id: {}", modbus.slave_id);
    }

    let map = &config.register_map;
    let base_digits = map.four_base.to_string();
    if base_digits.len() < 5 || !base_digits.starts_with('4') {
        anyhow::bail!("Invalid 4xxxx base address: {}", map.four_base);
    }
    if map.csv_path.as_os_str().is_empty() {
        anyhow::bail!("Register map CSV path must not be empty");
    }
    if map.order.is_some()
        && (map.byte_order != Endianness::Big || map.word_order != Endianness::Big)
    {
        warn!("register_map.order is set, byte_order and word_order are ignored");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_specific_rules(&Config::default()).is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_serial_settings() {
        let cases: Vec<fn(&mut Config)> = vec![
            |c| c.modbus.port = "  ".to_string(),
            |c| c.modbus.baud_rate = 0,
            |c| c.modbus.data_bits = 9,
            |c| c.modbus.stop_bits = 3,
            |c| c.modbus.timeout = 0.0,
            |c| c.modbus.slave_id = 0,
            |c| c.modbus.slave_id = 248,
            |c| c.register_map.four_base = 1,
        ];
        for mutate in cases {
            let mut config = Config::default();
            mutate(&mut config);
            assert!(validate_specific_rules(&config).is_err(), "{config:?}");
        }
    }
}
