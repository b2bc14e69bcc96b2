// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Raw register map rows and the supported register types

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

/// One CSV line before validation.
///
/// Every field is kept as text; the compiler is the only place where tokens
/// are interpreted. Optional fields that are blank count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawRow {
    pub address: String,
    #[serde(rename = "type")]
    pub register_type: String,
    pub value: String,
    #[serde(default)]
    pub len: Option<String>,
    #[serde(default)]
    pub byte_order: Option<String>,
    #[serde(default)]
    pub word_order: Option<String>,
    #[serde(default)]
    pub order_code: Option<String>,
    #[serde(default)]
    pub pad: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    /// CSV line number, when the row was read from a file
    #[serde(skip)]
    pub line: Option<u64>,
}

impl RawRow {
    pub fn new(
        address: impl Into<String>,
        register_type: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            register_type: register_type.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with_len(mut self, len: impl Into<String>) -> Self {
        self.len = Some(len.into());
        self
    }

    pub fn with_order_code(mut self, order_code: impl Into<String>) -> Self {
        self.order_code = Some(order_code.into());
        self
    }

    pub fn with_byte_order(mut self, byte_order: impl Into<String>) -> Self {
        self.byte_order = Some(byte_order.into());
        self
    }

    pub fn with_word_order(mut self, word_order: impl Into<String>) -> Self {
        self.word_order = Some(word_order.into());
        self
    }

    pub fn with_pad(mut self, pad: impl Into<String>) -> Self {
        self.pad = Some(pad.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Returns the trimmed field, or `None` when it is missing or blank.
pub(crate) fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported register type '{0}'")]
pub struct UnknownRegisterType(pub String);

/// Holding register data types a row can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterType {
    Int16,
    Uint16,
    Int32,
    Uint32,
    Ascii,
}

impl RegisterType {
    /// Inclusive numeric range for the integer types.
    pub fn range(self) -> Option<(i128, i128)> {
        match self {
            RegisterType::Int16 => Some((i16::MIN.into(), i16::MAX.into())),
            RegisterType::Uint16 => Some((0, u16::MAX.into())),
            RegisterType::Int32 => Some((i32::MIN.into(), i32::MAX.into())),
            RegisterType::Uint32 => Some((0, u32::MAX.into())),
            RegisterType::Ascii => None,
        }
    }
}

impl FromStr for RegisterType {
    type Err = UnknownRegisterType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int16" => Ok(RegisterType::Int16),
            "uint16" => Ok(RegisterType::Uint16),
            "int32" => Ok(RegisterType::Int32),
            "uint32" => Ok(RegisterType::Uint32),
            "ascii" => Ok(RegisterType::Ascii),
            _ => Err(UnknownRegisterType(s.to_string())),
        }
    }
}

impl fmt::Display for RegisterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegisterType::Int16 => "int16",
            RegisterType::Uint16 => "uint16",
            RegisterType::Int32 => "int32",
            RegisterType::Uint32 => "uint32",
            RegisterType::Ascii => "ascii",
        };
        f.write_str(name)
    }
}
