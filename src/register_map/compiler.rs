// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Register map compiler
//!
//! Turns raw rows into an immutable [`RegisterMap`]. Each row goes through
//! three stages, in row order:
//!
//! 1. **Address resolution** via [`resolve_address`]
//! 2. **Type dispatch**, encoding the value into one or more 16-bit cells
//! 3. **Placement**, claiming the cells' indices and rejecting overlaps
//!
//! The first failing row aborts the compile; no partial map is ever produced.
//!
//! ### Endianness precedence for 32-bit rows
//!
//! `order_code` > the row's `byte_order`/`word_order` > [`EncodingConfig`] defaults.
//! A row may set only one of `byte_order`/`word_order`; the other falls back to
//! the default.

use std::collections::HashMap;

use log::debug;

use super::address::{check_span, resolve_address, AddressError, DEFAULT_FOUR_BASE};
use super::codec::{encode_ascii, encode_u32, Endianness, OrderCode, Pad};
use super::error::{CompileError, RowRef};
use super::map::RegisterMap;
use super::row::{present, RawRow, RegisterType};

/// Two characters per register across the whole 16-bit register space
const MAX_ASCII_LEN: usize = 2 * 65536;

/// Process-wide defaults consumed by the compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingConfig {
    pub four_base: u32,
    pub default_byte_order: Endianness,
    pub default_word_order: Endianness,
    pub strict_gaps: bool,
    pub default_pad: Pad,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            four_base: DEFAULT_FOUR_BASE,
            default_byte_order: Endianness::Big,
            default_word_order: Endianness::Big,
            strict_gaps: false,
            default_pad: Pad::Space,
        }
    }
}

/// The compiled form of a single row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterEntry {
    pub start_index: u16,
    pub cell_count: u16,
    /// Final register values, in index order
    pub cells: Vec<u16>,
    pub register_type: RegisterType,
    pub row: RowRef,
    pub comment: Option<String>,
}

impl RegisterEntry {
    /// Last index occupied by this entry.
    pub fn end_index(&self) -> u16 {
        self.start_index + (self.cell_count - 1)
    }
}

/// Compile `rows` into a register map.
///
/// # Errors
///
/// Returns the first [`CompileError`] encountered. Overlaps are detected
/// against every previously placed row, so the outcome does not depend on
/// whether rows are sorted by address.
pub fn compile(rows: &[RawRow], config: &EncodingConfig) -> Result<RegisterMap, CompileError> {
    let mut entries: Vec<RegisterEntry> = Vec::with_capacity(rows.len());
    let mut claimed: HashMap<u16, usize> = HashMap::new();

    for (position, raw) in rows.iter().enumerate() {
        let number = raw
            .line
            .and_then(|line| usize::try_from(line).ok())
            .unwrap_or(position + 1);
        let entry = compile_row(RowRef::new(number, raw.address.trim()), raw, config)?;

        // Check the whole entry before claiming any of its cells
        for index in entry.start_index..=entry.end_index() {
            if let Some(&owner) = claimed.get(&index) {
                return Err(CompileError::Overlap {
                    index,
                    first: entries[owner].row.clone(),
                    second: entry.row,
                });
            }
        }
        for index in entry.start_index..=entry.end_index() {
            claimed.insert(index, entries.len());
        }

        debug!(
            "Compiled {} as {} at HR[{}..{}]: {:04X?}",
            entry.row,
            entry.register_type,
            entry.start_index,
            entry.end_index(),
            entry.cells
        );
        entries.push(entry);
    }

    Ok(RegisterMap::from_entries(entries))
}

fn compile_row(
    row: RowRef,
    raw: &RawRow,
    config: &EncodingConfig,
) -> Result<RegisterEntry, CompileError> {
    let address = resolve_address(&raw.address, config.four_base).map_err(|source| {
        CompileError::Address {
            row: row.clone(),
            source,
        }
    })?;

    let register_type: RegisterType =
        raw.register_type
            .parse()
            .map_err(|_| CompileError::UnknownType {
                row: row.clone(),
                token: raw.register_type.trim().to_string(),
            })?;

    let cells = match register_type {
        RegisterType::Int16 | RegisterType::Uint16 => {
            let value = checked_integer(&row, raw, register_type)?;
            vec![value as u16]
        }
        RegisterType::Int32 | RegisterType::Uint32 => {
            let value = checked_integer(&row, raw, register_type)?;
            let order = effective_order(&row, raw, config)?;
            encode_u32(value as u32, order).to_vec()
        }
        RegisterType::Ascii => ascii_cells(&row, raw, config)?,
    };

    let cell_count = u16::try_from(cells.len()).map_err(|_| CompileError::Address {
        row: row.clone(),
        source: AddressError::EntryOverflow {
            start: address.index,
            cell_count: u16::MAX,
        },
    })?;
    check_span(address.index, cell_count).map_err(|source| CompileError::Address {
        row: row.clone(),
        source,
    })?;

    Ok(RegisterEntry {
        start_index: address.index,
        cell_count,
        cells,
        register_type,
        row,
        comment: present(&raw.comment).map(str::to_string),
    })
}

/// Why an integer token was rejected.
enum IntegerError {
    Malformed,
    Overflow,
}

/// Parse a decimal (optionally signed) or `0x` hexadecimal integer.
fn parse_integer(token: &str) -> Result<i128, IntegerError> {
    let token = token.trim();
    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };
    let (radix, digits) = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => (16, hex),
        None => (10, digits),
    };
    // from_str_radix would also take a sign here
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(IntegerError::Malformed);
    }
    let magnitude = i128::from_str_radix(digits, radix).map_err(|_| IntegerError::Overflow)?;
    Ok(if negative { -magnitude } else { magnitude })
}

/// Parse the row value and check it against the range of `register_type`.
///
/// Casting the result with `as u16`/`as u32` yields the register bit pattern.
fn checked_integer(
    row: &RowRef,
    raw: &RawRow,
    register_type: RegisterType,
) -> Result<i128, CompileError> {
    let token = raw.value.trim();
    let out_of_range = || CompileError::Range {
        row: row.clone(),
        register_type,
        value: token.to_string(),
    };
    let value = parse_integer(token).map_err(|err| match err {
        IntegerError::Malformed => CompileError::Value {
            row: row.clone(),
            token: token.to_string(),
        },
        IntegerError::Overflow => out_of_range(),
    })?;
    match register_type.range() {
        Some((min, max)) if value < min || value > max => Err(out_of_range()),
        _ => Ok(value),
    }
}

fn effective_order(
    row: &RowRef,
    raw: &RawRow,
    config: &EncodingConfig,
) -> Result<OrderCode, CompileError> {
    let encoding_error = |reason: String| CompileError::Encoding {
        row: row.clone(),
        reason,
    };

    if let Some(code) = present(&raw.order_code) {
        return code
            .parse::<OrderCode>()
            .map_err(|e| encoding_error(e.to_string()));
    }

    let byte_order = match present(&raw.byte_order) {
        Some(token) => token
            .parse::<Endianness>()
            .map_err(|e| encoding_error(format!("byte_order: {e}")))?,
        None => config.default_byte_order,
    };
    let word_order = match present(&raw.word_order) {
        Some(token) => token
            .parse::<Endianness>()
            .map_err(|e| encoding_error(format!("word_order: {e}")))?,
        None => config.default_word_order,
    };
    Ok(OrderCode::from_orders(byte_order, word_order))
}

fn ascii_cells(
    row: &RowRef,
    raw: &RawRow,
    config: &EncodingConfig,
) -> Result<Vec<u16>, CompileError> {
    let encoding_error = |reason: String| CompileError::Encoding {
        row: row.clone(),
        reason,
    };

    let text = raw.value.trim();
    let len = match present(&raw.len) {
        Some(token) => match token.parse::<i64>() {
            Ok(len) if len > 0 => usize::try_from(len)
                .map_err(|_| encoding_error(format!("len {len} is too large")))?,
            Ok(len) => return Err(encoding_error(format!("len must be positive, got {len}"))),
            Err(_) => return Err(encoding_error(format!("len '{token}' is not an integer"))),
        },
        None => text.chars().count(),
    };
    if len == 0 {
        return Err(encoding_error(
            "ascii value is empty and no len was given".to_string(),
        ));
    }
    if len > MAX_ASCII_LEN {
        return Err(encoding_error(format!(
            "ascii length {len} exceeds the register space"
        )));
    }

    let pad = match present(&raw.pad) {
        Some(token) => token
            .parse::<Pad>()
            .map_err(|e| encoding_error(e.to_string()))?,
        None => config.default_pad,
    };

    encode_ascii(text, len, pad).map_err(|c| {
        encoding_error(format!(
            "character '{c}' (U+{:04X}) does not fit in a single byte",
            u32::from(c)
        ))
    })
}
