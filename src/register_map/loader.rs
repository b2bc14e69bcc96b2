// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! CSV register map loading
//!
//! Reads a register map file into [`RawRow`]s. Expected layout:
//!
//! ```text
//! address,type,value,len,order_code,byte_order,word_order,pad,comment
//! 40001,uint16,1234,,,,,,firmware version
//! 120,ascii,INVERTER-A,10,,,,space,model name
//! 40100,uint32,305419896,,ABCD,,,,serial number
//! ```
//!
//! Only `address`, `type` and `value` are required; header names are matched
//! case-insensitively and a UTF-8 byte order mark is ignored. Files that are
//! not valid UTF-8 are decoded as Latin-1.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use super::compiler::{compile, EncodingConfig};
use super::error::CompileError;
use super::map::RegisterMap;
use super::row::RawRow;

/// Columns every register map must provide
pub const REQUIRED_COLUMNS: [&str; 3] = ["address", "type", "value"];

#[derive(Error, Debug)]
pub enum MapLoadError {
    #[error("failed to read register map {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV has no header row")]
    NoHeader,

    #[error("CSV missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Compile(#[from] CompileError),
}

/// Read and compile the register map at `path`.
pub fn load_register_map(
    path: impl AsRef<Path>,
    config: &EncodingConfig,
) -> Result<RegisterMap, MapLoadError> {
    let rows = load_rows(path)?;
    Ok(compile(&rows, config)?)
}

/// Read every row of the register map at `path`.
pub fn load_rows(path: impl AsRef<Path>) -> Result<Vec<RawRow>, MapLoadError> {
    let path = path.as_ref();
    debug!("Loading register map from {:?}", path);
    let bytes = fs::read(path).map_err(|source| MapLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_rows(decode_text(bytes).as_bytes())
}

/// Decode file contents as UTF-8, falling back to Latin-1, without a leading BOM.
pub fn decode_text(bytes: Vec<u8>) -> String {
    let text = String::from_utf8(bytes)
        .unwrap_or_else(|err| err.into_bytes().into_iter().map(char::from).collect());
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

fn normalize_header(header: &str) -> String {
    header.trim().trim_start_matches('\u{feff}').to_lowercase()
}

/// Parse register map rows from CSV text.
pub fn read_rows<R: io::Read>(reader: R) -> Result<Vec<RawRow>, MapLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: csv::StringRecord = reader.headers()?.iter().map(normalize_header).collect();
    if headers.iter().all(str::is_empty) {
        return Err(MapLoadError::NoHeader);
    }

    let mut missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(MapLoadError::MissingColumns(missing));
    }
    reader.set_headers(headers.clone());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let mut row: RawRow = record.deserialize(Some(&headers))?;
        row.line = record.position().map(|position| position.line());
        rows.push(row);
    }

    debug!("Read {} register map rows", rows.len());
    Ok(rows)
}
