// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Register map configuration
//!
//! Where the CSV map lives and the process-wide defaults applied while
//! compiling it.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::register_map::address::DEFAULT_FOUR_BASE;
use crate::register_map::{EncodingConfig, Endianness, OrderCode, Pad};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterMapConfig {
    /// Path to the CSV register map
    pub csv_path: PathBuf,

    /// Base subtracted from 4xxxx style addresses
    pub four_base: u32,

    /// Global order code. When set it replaces both `byte_order` and `word_order`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderCode>,

    pub byte_order: Endianness,

    pub word_order: Endianness,

    /// Pad applied to ascii rows without their own `pad`
    pub default_pad: Pad,

    /// Reject reads that touch unmapped registers instead of returning zeros
    pub strict_gaps: bool,

    /// Log every read request at debug level
    pub log_reads: bool,

    /// Seconds between checks of the CSV modification time, 0 disables reloading
    pub reload_interval: u64,
}

impl Default for RegisterMapConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("map.csv"),
            four_base: DEFAULT_FOUR_BASE,
            order: None,
            byte_order: Endianness::Big,
            word_order: Endianness::Big,
            default_pad: Pad::Space,
            strict_gaps: false,
            log_reads: false,
            reload_interval: 0,
        }
    }
}

impl RegisterMapConfig {
    /// Compiler defaults derived from this section.
    pub fn encoding(&self) -> EncodingConfig {
        let (default_byte_order, default_word_order) = match self.order {
            Some(code) => (code.byte_order(), code.word_order()),
            None => (self.byte_order, self.word_order),
        };
        EncodingConfig {
            four_base: self.four_base,
            default_byte_order,
            default_word_order,
            strict_gaps: self.strict_gaps,
            default_pad: self.default_pad,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_code_seeds_both_orders() {
        let config = RegisterMapConfig {
            order: Some(OrderCode::Badc),
            word_order: Endianness::Little,
            ..Default::default()
        };
        let encoding = config.encoding();
        assert_eq!(encoding.default_byte_order, Endianness::Little);
        assert_eq!(encoding.default_word_order, Endianness::Big);
    }

    #[test]
    fn test_explicit_orders_without_code() {
        let config = RegisterMapConfig {
            word_order: Endianness::Little,
            strict_gaps: true,
            four_base: 40000,
            ..Default::default()
        };
        let encoding = config.encoding();
        assert_eq!(encoding.default_byte_order, Endianness::Big);
        assert_eq!(encoding.default_word_order, Endianness::Little);
        assert!(encoding.strict_gaps);
        assert_eq!(encoding.four_base, 40000);
    }
}
