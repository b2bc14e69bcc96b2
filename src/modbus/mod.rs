// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Modbus protocol boundary
//!
//! Adapts the register map to `tokio_modbus` requests. Framing, CRC and
//! serial timing are left to `tokio_modbus` and `tokio_serial`.

pub mod modbus_server;

pub use modbus_server::{exception_for, LogObserver, RegisterMapService};
