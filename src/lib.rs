// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Rust Modbus slave simulator library
//!
//! Serves a read-only table of holding registers, compiled from a CSV register
//! map, as a Modbus RTU slave.
//!
//! - [`register_map`]: map compiler and read dispatcher
//! - [`modbus`]: `tokio_modbus` service exposing the map
//! - [`config`]: YAML configuration with schema validation
//! - [`daemon`]: background tasks (RTU server, map reload)

pub mod config;
pub mod daemon;
pub mod modbus;
pub mod register_map;
