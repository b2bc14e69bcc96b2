// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration management for the Modbus slave simulator
//!
//! This module provides functionality for loading, validating, and applying
//! configuration settings. The configuration is backed by a YAML file and
//! validated against a JSON schema before it is deserialized.
//!
//! ## Configuration Structure
//!
//! - `modbus`: Serial line settings and unit id of the RTU slave
//! - `register_map`: CSV location and the defaults used to compile it
//!
//! ## Usage
//!
//! ```no_run
//! use rust_modbus_sim::config::{Config, ConfigOverrides};
//! use std::path::Path;
//!
//! // Load config from file, creates a default if not found
//! let mut config = Config::from_file(Path::new("config.yaml")).unwrap();
//!
//! // Apply command line overrides if needed
//! config.apply_args(ConfigOverrides {
//!     port: Some("/dev/ttyUSB1".to_string()),
//!     baud_rate: Some(19200),
//!     strict_gaps: Some(true),
//!     ..Default::default()
//! });
//!
//! println!("Serving {:?} on {}", config.register_map.csv_path, config.modbus.port);
//! ```

pub mod modbus;
pub mod register_map;
pub mod utils;

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::register_map::{Endianness, OrderCode};

pub use modbus::{ModbusConfig, Parity};
pub use register_map::RegisterMapConfig;
pub use utils::{output_config_schema, validate_specific_rules};

/// Root configuration structure for the simulator.
///
/// Each section uses default values when not explicitly specified in the
/// configuration file, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Modbus RTU slave settings.
    #[serde(default)]
    pub modbus: ModbusConfig,

    /// Register map source and compile defaults.
    #[serde(default)]
    pub register_map: RegisterMapConfig,
}

/// Command line values overriding the configuration file.
///
/// `None` leaves the loaded value untouched.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port: Option<String>,
    pub baud_rate: Option<u32>,
    pub data_bits: Option<u8>,
    pub parity: Option<Parity>,
    pub stop_bits: Option<u8>,
    pub timeout: Option<f32>,
    pub slave_id: Option<u8>,
    pub csv_path: Option<PathBuf>,
    pub four_base: Option<u32>,
    pub order: Option<OrderCode>,
    pub byte_order: Option<Endianness>,
    pub word_order: Option<Endianness>,
    pub strict_gaps: Option<bool>,
    pub log_reads: Option<bool>,
    pub reload_interval: Option<u64>,
}

impl Config {
    /// Helper method to create a sample config file when validation fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let sample_path = path.with_extension("sample.yaml");
        debug!("Original path: {:?}, Sample path: {:?}", path, sample_path);

        if let Some(parent) = sample_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create parent directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        Self::default()
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        let yaml_value: serde_yml::Value = serde_yml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML configuration from {:?}", path))?;

        // An empty document parses as null; treat it as an empty mapping
        let json_value = match serde_json::to_value(&yaml_value).with_context(|| {
            format!("Failed to convert YAML to JSON for validation: {:?}", path)
        })? {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            value => value,
        };

        let validator = schema_validator()?;

        debug!("Validating {} configuration against schema", path.display());
        if let Err(error) = validator.validate(&json_value) {
            error!("Configuration validation error before deserialization");
            Self::create_sample_config(path)?;
            anyhow::bail!("Configuration validation failed: {}", error);
        }

        debug!("Schema validation passed, deserializing into Config structure");
        let config: Config = match serde_json::from_value(json_value) {
            Ok(config) => config,
            Err(err) => {
                error!("Configuration deserialization error: {}", err);
                if let Err(e) = Self::create_sample_config(path) {
                    error!("Failed to create sample config: {}", e);
                }
                return Err(anyhow::anyhow!(
                    "Failed to deserialize configuration from {}: {}",
                    path.display(),
                    err
                ));
            }
        };

        if let Err(err) = utils::validate_specific_rules(&config) {
            error!("Configuration specific validation error: {}", err);
            Self::create_sample_config(path)?;
            return Err(err);
        }

        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Apply command line arguments to override configuration values.
    ///
    /// Only values explicitly present in `overrides` replace the loaded ones.
    /// A global `order` also resets `byte_order` and `word_order`; an explicit
    /// byte or word order replaces the matching half of the file's `order`.
    pub fn apply_args(&mut self, overrides: ConfigOverrides) {
        let modbus = &mut self.modbus;
        if let Some(port) = overrides.port {
            debug!("Overriding serial port from command line: {}", port);
            modbus.port = port;
        }
        if let Some(baud_rate) = overrides.baud_rate {
            debug!("Overriding baud rate from command line: {}", baud_rate);
            modbus.baud_rate = baud_rate;
        }
        if let Some(data_bits) = overrides.data_bits {
            debug!("Overriding data bits from command line: {}", data_bits);
            modbus.data_bits = data_bits;
        }
        if let Some(parity) = overrides.parity {
            debug!("Overriding parity from command line: {}", parity);
            modbus.parity = parity;
        }
        if let Some(stop_bits) = overrides.stop_bits {
            debug!("Overriding stop bits from command line: {}", stop_bits);
            modbus.stop_bits = stop_bits;
        }
        if let Some(timeout) = overrides.timeout {
            debug!("Overriding serial timeout from command line: {}", timeout);
            modbus.timeout = timeout;
        }
        if let Some(slave_id) = overrides.slave_id {
            debug!("Overriding slave id from command line: {}", slave_id);
            modbus.slave_id = slave_id;
        }

        let map = &mut self.register_map;
        if let Some(csv_path) = overrides.csv_path {
            debug!("Overriding register map path from command line: {:?}", csv_path);
            map.csv_path = csv_path;
        }
        if let Some(four_base) = overrides.four_base {
            debug!("Overriding 4xxxx base from command line: {}", four_base);
            map.four_base = four_base;
        }
        if overrides.byte_order.is_some() || overrides.word_order.is_some() {
            // Unfold the file's order code so the other half keeps its value
            if let Some(code) = map.order.take() {
                map.byte_order = code.byte_order();
                map.word_order = code.word_order();
            }
        }
        if let Some(byte_order) = overrides.byte_order {
            debug!("Overriding byte order from command line: {}", byte_order);
            map.byte_order = byte_order;
        }
        if let Some(word_order) = overrides.word_order {
            debug!("Overriding word order from command line: {}", word_order);
            map.word_order = word_order;
        }
        if let Some(order) = overrides.order {
            debug!("Overriding order code from command line: {}", order);
            map.order = Some(order);
            map.byte_order = order.byte_order();
            map.word_order = order.word_order();
        }
        if let Some(strict_gaps) = overrides.strict_gaps {
            debug!("Overriding strict gaps from command line: {}", strict_gaps);
            map.strict_gaps = strict_gaps;
        }
        if let Some(log_reads) = overrides.log_reads {
            debug!("Overriding read logging from command line: {}", log_reads);
            map.log_reads = log_reads;
        }
        if let Some(reload_interval) = overrides.reload_interval {
            debug!(
                "Overriding reload interval from command line: {}",
                reload_interval
            );
            map.reload_interval = reload_interval;
        }
    }
}

/// Build the draft 2020-12 validator for the embedded configuration schema.
pub fn schema_validator() -> Result<jsonschema::Validator> {
    let schema_str = include_str!("../../resources/config.schema.json");
    let schema: serde_json::Value =
        serde_json::from_str(schema_str).context("Failed to parse JSON schema")?;
    jsonschema::draft202012::options()
        .should_validate_formats(true)
        .build(&schema)
        .map_err(|e| anyhow::anyhow!("Invalid configuration schema: {}", e))
}
