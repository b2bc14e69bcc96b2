// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Register cell codecs
//!
//! Splitting 32-bit values across two holding registers and packing strings
//! two characters per register. The four canonical 32-bit layouts, for the
//! value `0xAABBCCDD` written as bytes `A B C D`:
//!
//! | Order  | Word order | Byte order | Registers          |
//! |--------|------------|------------|--------------------|
//! | `ABCD` | big        | big        | `0xAABB`, `0xCCDD` |
//! | `BADC` | big        | little     | `0xBBAA`, `0xDDCC` |
//! | `CDAB` | little     | big        | `0xCCDD`, `0xAABB` |
//! | `DCBA` | little     | little     | `0xDDCC`, `0xBBAA` |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a byte order, word order, order code or pad token is not recognised
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{token}'")]
pub struct ParseTokenError {
    pub kind: &'static str,
    pub token: String,
}

impl ParseTokenError {
    fn new(kind: &'static str, token: &str) -> Self {
        Self {
            kind,
            token: token.to_string(),
        }
    }
}

/// Byte order within a register, or word order across a register pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    #[default]
    Big,
    Little,
}

impl FromStr for Endianness {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "big" => Ok(Endianness::Big),
            "little" => Ok(Endianness::Little),
            _ => Err(ParseTokenError::new("endianness", s)),
        }
    }
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endianness::Big => write!(f, "big"),
            Endianness::Little => write!(f, "little"),
        }
    }
}

/// Shorthand naming both the word order and the byte order of a 32-bit value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderCode {
    #[default]
    Abcd,
    Badc,
    Cdab,
    Dcba,
}

impl OrderCode {
    pub fn from_orders(byte_order: Endianness, word_order: Endianness) -> Self {
        match (word_order, byte_order) {
            (Endianness::Big, Endianness::Big) => OrderCode::Abcd,
            (Endianness::Big, Endianness::Little) => OrderCode::Badc,
            (Endianness::Little, Endianness::Big) => OrderCode::Cdab,
            (Endianness::Little, Endianness::Little) => OrderCode::Dcba,
        }
    }

    pub fn byte_order(self) -> Endianness {
        match self {
            OrderCode::Abcd | OrderCode::Cdab => Endianness::Big,
            OrderCode::Badc | OrderCode::Dcba => Endianness::Little,
        }
    }

    pub fn word_order(self) -> Endianness {
        match self {
            OrderCode::Abcd | OrderCode::Badc => Endianness::Big,
            OrderCode::Cdab | OrderCode::Dcba => Endianness::Little,
        }
    }
}

impl FromStr for OrderCode {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ABCD" => Ok(OrderCode::Abcd),
            "BADC" => Ok(OrderCode::Badc),
            "CDAB" => Ok(OrderCode::Cdab),
            "DCBA" => Ok(OrderCode::Dcba),
            _ => Err(ParseTokenError::new("order code", s)),
        }
    }
}

impl fmt::Display for OrderCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            OrderCode::Abcd => "ABCD",
            OrderCode::Badc => "BADC",
            OrderCode::Cdab => "CDAB",
            OrderCode::Dcba => "DCBA",
        };
        f.write_str(code)
    }
}

/// Filler byte used when an ascii value is shorter than its declared length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pad {
    #[default]
    Space,
    Null,
}

impl Pad {
    pub fn byte(self) -> u8 {
        match self {
            Pad::Space => b' ',
            Pad::Null => 0,
        }
    }
}

impl FromStr for Pad {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "space" => Ok(Pad::Space),
            "null" => Ok(Pad::Null),
            _ => Err(ParseTokenError::new("pad", s)),
        }
    }
}

impl fmt::Display for Pad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pad::Space => write!(f, "space"),
            Pad::Null => write!(f, "null"),
        }
    }
}

/// Split a 32-bit value into two registers laid out according to `order`.
pub fn encode_u32(value: u32, order: OrderCode) -> [u16; 2] {
    let high = (value >> 16) as u16;
    let low = value as u16;
    let words = match order.word_order() {
        Endianness::Big => [high, low],
        Endianness::Little => [low, high],
    };
    match order.byte_order() {
        Endianness::Big => words,
        Endianness::Little => words.map(u16::swap_bytes),
    }
}

/// Inverse of [`encode_u32`].
pub fn decode_u32(cells: [u16; 2], order: OrderCode) -> u32 {
    let words = match order.byte_order() {
        Endianness::Big => cells,
        Endianness::Little => cells.map(u16::swap_bytes),
    };
    let (high, low) = match order.word_order() {
        Endianness::Big => (words[0], words[1]),
        Endianness::Little => (words[1], words[0]),
    };
    (u32::from(high) << 16) | u32::from(low)
}

/// Pack `text` into registers, two characters per register, high byte first.
///
/// The text is truncated or padded to `len` characters; an odd length leaves
/// the pad byte in the low half of the last register. Returns the first
/// character that does not fit in a single byte.
pub fn encode_ascii(text: &str, len: usize, pad: Pad) -> Result<Vec<u16>, char> {
    if let Some(c) = text.chars().find(|c| u32::from(*c) > 0xFF) {
        return Err(c);
    }

    let mut bytes: Vec<u8> = text.chars().take(len).map(|c| c as u8).collect();
    bytes.resize(len, pad.byte());
    if bytes.len() % 2 == 1 {
        bytes.push(pad.byte());
    }

    Ok(bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect())
}

/// Unpack the first `len` characters stored in `cells`.
pub fn decode_ascii(cells: &[u16], len: usize) -> String {
    cells
        .iter()
        .flat_map(|cell| cell.to_be_bytes())
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ORDERS: [OrderCode; 4] = [
        OrderCode::Abcd,
        OrderCode::Badc,
        OrderCode::Cdab,
        OrderCode::Dcba,
    ];

    #[test]
    fn test_canonical_layouts() {
        let value = 0xAABB_CCDD;
        assert_eq!(encode_u32(value, OrderCode::Abcd), [0xAABB, 0xCCDD]);
        assert_eq!(encode_u32(value, OrderCode::Badc), [0xBBAA, 0xDDCC]);
        assert_eq!(encode_u32(value, OrderCode::Cdab), [0xCCDD, 0xAABB]);
        assert_eq!(encode_u32(value, OrderCode::Dcba), [0xDDCC, 0xBBAA]);
    }

    #[test]
    fn test_u32_round_trip_for_every_order() {
        for order in ALL_ORDERS {
            for value in [0, 1, 0x1234_5678, 305_419_896, 0x8000_0000, u32::MAX] {
                assert_eq!(decode_u32(encode_u32(value, order), order), value, "{order}");
            }
        }
    }

    #[test]
    fn test_order_code_matches_byte_and_word_orders() {
        for order in ALL_ORDERS {
            assert_eq!(
                OrderCode::from_orders(order.byte_order(), order.word_order()),
                order
            );
        }
        assert_eq!(
            OrderCode::from_orders(Endianness::Little, Endianness::Big),
            OrderCode::Badc
        );
    }

    #[test]
    fn test_token_parsing_is_case_insensitive() {
        assert_eq!("dcba".parse::<OrderCode>().unwrap(), OrderCode::Dcba);
        assert_eq!(" Little ".parse::<Endianness>().unwrap(), Endianness::Little);
        assert_eq!("NULL".parse::<Pad>().unwrap(), Pad::Null);
        assert!("ABDC".parse::<OrderCode>().is_err());
        assert!("middle".parse::<Endianness>().is_err());
        assert!("zero".parse::<Pad>().is_err());
    }

    #[test]
    fn test_ascii_packing() {
        assert_eq!(encode_ascii("AB", 2, Pad::Space).unwrap(), vec![0x4142]);
        assert_eq!(encode_ascii("ABC", 3, Pad::Null).unwrap(), vec![0x4142, 0x4300]);
        assert_eq!(
            encode_ascii("A", 4, Pad::Space).unwrap(),
            vec![0x4120, 0x2020]
        );
        assert_eq!(encode_ascii("ABCDEF", 3, Pad::Space).unwrap(), vec![0x4142, 0x4320]);
    }

    #[test]
    fn test_ascii_rejects_wide_characters() {
        assert_eq!(encode_ascii("temp°C", 6, Pad::Space).unwrap().len(), 3);
        assert_eq!(encode_ascii("Ω", 1, Pad::Space), Err('Ω'));
    }

    #[test]
    fn test_ascii_decode() {
        let cells = encode_ascii("INVERTER-A", 10, Pad::Space).unwrap();
        assert_eq!(cells.len(), 5);
        assert_eq!(decode_ascii(&cells, 10), "INVERTER-A");
        assert_eq!(decode_ascii(&[0x4142, 0x4300], 3), "ABC");
    }
}
