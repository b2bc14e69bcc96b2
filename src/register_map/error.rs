// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Error taxonomy of the register map compiler
//!
//! Every variant except [`CompileError::Overlap`] is tied to a single CSV row.
//! Compilation is all-or-nothing, so the first error aborts the whole pass.

use std::fmt;

use thiserror::Error;

use super::address::AddressError;
use super::row::RegisterType;

/// Identifies the CSV row an error or entry came from.
///
/// `number` is the CSV line number when the row was read from a file,
/// otherwise the 1-based position of the row in the compiled sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowRef {
    pub number: usize,
    pub address: String,
}

impl RowRef {
    pub fn new(number: usize, address: impl Into<String>) -> Self {
        Self {
            number,
            address: address.into(),
        }
    }
}

impl fmt::Display for RowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} (address {})", self.number, self.address)
    }
}

/// Errors raised while compiling raw rows into a [`RegisterMap`](super::RegisterMap)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("{row}: {source}")]
    Address { row: RowRef, source: AddressError },

    #[error("{row}: value '{token}' is not a decimal or 0x-prefixed hexadecimal integer")]
    Value { row: RowRef, token: String },

    #[error("{row}: {register_type} value {value} out of range")]
    Range {
        row: RowRef,
        register_type: RegisterType,
        value: String,
    },

    #[error("{row}: {reason}")]
    Encoding { row: RowRef, reason: String },

    #[error("{row}: unsupported type '{token}'")]
    UnknownType { row: RowRef, token: String },

    #[error("overlap at register {index}: {second} collides with {first}")]
    Overlap {
        index: u16,
        first: RowRef,
        second: RowRef,
    },
}

impl CompileError {
    /// The row that triggered the error. For overlaps this is the later row.
    pub fn row(&self) -> &RowRef {
        match self {
            CompileError::Address { row, .. }
            | CompileError::Value { row, .. }
            | CompileError::Range { row, .. }
            | CompileError::Encoding { row, .. }
            | CompileError::UnknownType { row, .. } => row,
            CompileError::Overlap { second, .. } => second,
        }
    }
}
