// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Address token resolution
//!
//! A CSV address token is classified by syntax alone:
//!
//! | Token                                   | Scheme    | Index                 |
//! |-----------------------------------------|-----------|-----------------------|
//! | `0x...` / `0X...`                       | hex       | value                 |
//! | five or more digits, first digit is `4` | 4xxxx     | value - `four_base`   |
//! | any other decimal                       | zero-based| value                 |
//!
//! `"4000"` is therefore register index 4000 while `"40001"` is the first
//! holding register under the default base.

use thiserror::Error;

/// Default base subtracted from 4xxxx addresses (`40001` maps to index 0)
pub const DEFAULT_FOUR_BASE: u32 = 40001;

/// How an address token was interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressScheme {
    FourX,
    Hex,
    Decimal,
}

/// A zero-based register index together with the scheme it was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedAddress {
    pub index: u16,
    pub scheme: AddressScheme,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error("address '{0}' is not a decimal or 0x-prefixed hexadecimal integer")]
    NotInteger(String),

    #[error("address '{0}' resolves to a negative index")]
    Negative(String),

    #[error("4xxxx address {address} is below the configured base {four_base}")]
    BelowBase { address: u64, four_base: u32 },

    #[error("index {0} is outside the 16-bit register space")]
    OutOfSpace(u64),

    #[error("entry at index {start} spanning {cell_count} registers runs past index 65535")]
    EntryOverflow { start: u16, cell_count: u16 },
}

/// Classify an address token without resolving it.
pub fn classify(token: &str) -> AddressScheme {
    let token = token.trim();
    if token.starts_with("0x") || token.starts_with("0X") {
        AddressScheme::Hex
    } else if token.len() >= 5 && token.starts_with('4') && token.bytes().all(|b| b.is_ascii_digit())
    {
        AddressScheme::FourX
    } else {
        AddressScheme::Decimal
    }
}

/// Resolve an address token to a zero-based register index.
pub fn resolve_address(token: &str, four_base: u32) -> Result<ResolvedAddress, AddressError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AddressError::Empty);
    }

    let scheme = classify(token);
    let index = match scheme {
        AddressScheme::Hex => {
            let digits = &token[2..];
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(AddressError::NotInteger(token.to_string()));
            }
            u64::from_str_radix(digits, 16).map_err(|_| AddressError::OutOfSpace(u64::MAX))?
        }
        AddressScheme::FourX => {
            // All digits, so the only possible failure is overflow
            let address: u64 = token
                .parse()
                .map_err(|_| AddressError::OutOfSpace(u64::MAX))?;
            address
                .checked_sub(u64::from(four_base))
                .ok_or(AddressError::BelowBase { address, four_base })?
        }
        AddressScheme::Decimal => {
            let value: i64 = token
                .parse()
                .map_err(|_| AddressError::NotInteger(token.to_string()))?;
            u64::try_from(value).map_err(|_| AddressError::Negative(token.to_string()))?
        }
    };

    let index = u16::try_from(index).map_err(|_| AddressError::OutOfSpace(index))?;
    Ok(ResolvedAddress { index, scheme })
}

/// Check that `cell_count` registers starting at `start` stay inside the register space.
pub fn check_span(start: u16, cell_count: u16) -> Result<(), AddressError> {
    let last = u32::from(start) + u32::from(cell_count.max(1)) - 1;
    if last > u32::from(u16::MAX) {
        return Err(AddressError::EntryOverflow { start, cell_count });
    }
    Ok(())
}
