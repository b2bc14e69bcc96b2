// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Read dispatcher
//!
//! Answers holding register range reads against a [`RegisterMap`]. The
//! dispatcher holds no state; it can be called concurrently from any number
//! of requests sharing the same map.
//!
//! Writes never reach [`read`]. The protocol layer reports them through the
//! [`WriteObserver`] hook and leaves the map untouched.

use std::fmt;

use thiserror::Error;

use super::map::RegisterMap;

/// Maximum quantity of registers a single FC3 request may ask for
pub const MAX_READ_QUANTITY: u16 = 125;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadFaultKind {
    /// Unmapped index under strict gaps, or a range past the register space
    IllegalDataAddress,
    /// Quantity outside `1..=125`
    IllegalDataValue,
}

impl fmt::Display for ReadFaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadFaultKind::IllegalDataAddress => write!(f, "illegal data address"),
            ReadFaultKind::IllegalDataValue => write!(f, "illegal data value"),
        }
    }
}

/// A read that could not be answered. The whole request fails.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{kind} at HR[{address}] (read of {count} from HR[{start}])")]
pub struct ReadFault {
    pub kind: ReadFaultKind,
    /// Offending address
    pub address: u16,
    pub start: u16,
    pub count: u16,
}

/// Read `count` cells starting at `start_address`.
///
/// Unmapped indices read as `0`, unless `strict_gaps` is set, in which case
/// the lowest unmapped index fails the whole request with
/// [`ReadFaultKind::IllegalDataAddress`].
pub fn read(
    map: &RegisterMap,
    start_address: u16,
    count: u16,
    strict_gaps: bool,
) -> Result<Vec<u16>, ReadFault> {
    let fault = |kind, address| ReadFault {
        kind,
        address,
        start: start_address,
        count,
    };

    if count == 0 || count > MAX_READ_QUANTITY {
        return Err(fault(ReadFaultKind::IllegalDataValue, start_address));
    }
    if u32::from(start_address) + u32::from(count) > 0x1_0000 {
        return Err(fault(ReadFaultKind::IllegalDataAddress, start_address));
    }

    let mut values = Vec::with_capacity(count.into());
    for address in start_address..=start_address + (count - 1) {
        match map.get(address) {
            Some(value) => values.push(value),
            None if strict_gaps => return Err(fault(ReadFaultKind::IllegalDataAddress, address)),
            None => values.push(0),
        }
    }
    Ok(values)
}

/// A write request that reached the slave and was ignored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteAttempt {
    pub function_code: u8,
    pub address: u16,
    pub values: Vec<u16>,
}

/// Observation hook for requests the dispatcher sees but does not act on.
///
/// Implementations must be cheap: they run inline with request handling.
pub trait WriteObserver: Send + Sync {
    fn on_write_attempt(&self, attempt: &WriteAttempt);

    /// Called before every read; ignored by default.
    fn on_read(&self, _address: u16, _count: u16) {}
}
