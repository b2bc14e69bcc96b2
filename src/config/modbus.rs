// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Modbus RTU slave configuration
//!
//! This module defines the serial line settings and the unit id the
//! simulated slave answers to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Serial line parity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Parity {
    #[default]
    #[serde(rename = "N")]
    None,
    #[serde(rename = "E")]
    Even,
    #[serde(rename = "O")]
    Odd,
}

impl FromStr for Parity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "N" | "NONE" => Ok(Parity::None),
            "E" | "EVEN" => Ok(Parity::Even),
            "O" | "ODD" => Ok(Parity::Odd),
            _ => Err(format!("invalid parity '{s}', expected N, E or O")),
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parity::None => write!(f, "N"),
            Parity::Even => write!(f, "E"),
            Parity::Odd => write!(f, "O"),
        }
    }
}

/// Configuration for the Modbus RTU slave.
///
/// # Example
///
/// ```
/// use rust_modbus_sim::config::{ModbusConfig, Parity};
///
/// let modbus_config = ModbusConfig {
///     port: "/dev/ttyUSB1".to_string(),
///     baud_rate: 19200,
///     parity: Parity::Even,
///     ..Default::default()
/// };
/// assert_eq!(modbus_config.slave_id, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModbusConfig {
    /// Flag to enable or disable the RTU slave.
    ///
    /// When disabled the daemon still compiles the register map but opens no
    /// serial port.
    pub enabled: bool,

    /// Serial device path, e.g. `/dev/ttyUSB0` or `COM3`
    pub port: String,

    pub baud_rate: u32,

    /// Data bits per character (5 to 8)
    pub data_bits: u8,

    pub parity: Parity,

    /// Stop bits (1 or 2)
    pub stop_bits: u8,

    /// Serial read timeout in seconds
    pub timeout: f32,

    /// Unit id this slave answers to (1 to 247)
    pub slave_id: u8,
}

impl Default for ModbusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: 1,
            timeout: 1.0,
            slave_id: 1,
        }
    }
}
