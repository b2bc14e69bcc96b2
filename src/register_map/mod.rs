// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Register Map
//!
//! Compiles a declarative description of holding registers into an immutable
//! table of 16-bit cells and answers range reads against it.
//!
//! ## Pipeline
//!
//! ```text
//! CSV file ──loader──> RawRow[] ──compile──> RegisterMap ──read──> Vec<u16>
//! ```
//!
//! - [`loader`]: CSV parsing, header normalization, text decoding
//! - [`compiler`]: address resolution, type encoding and overlap detection
//! - [`dispatcher`]: FC3-style range reads with gap and limit handling
//! - [`shared`]: the live map handle swapped on reload
//!
//! ## Example
//!
//! ```
//! use rust_modbus_sim::register_map::{compile, read, EncodingConfig, RawRow};
//!
//! let rows = vec![
//!     RawRow::new("40001", "uint16", "1234"),
//!     RawRow::new("0x0002", "uint32", "0x12345678").with_order_code("CDAB"),
//! ];
//! let map = compile(&rows, &EncodingConfig::default()).unwrap();
//! assert_eq!(read(&map, 0, 4, false).unwrap(), vec![1234, 0, 0x5678, 0x1234]);
//! ```

pub mod address;
pub mod codec;
pub mod compiler;
pub mod dispatcher;
pub mod error;
pub mod loader;
pub mod map;
pub mod row;
pub mod shared;

pub use address::{resolve_address, AddressError, AddressScheme, ResolvedAddress};
pub use codec::{Endianness, OrderCode, Pad};
pub use compiler::{compile, EncodingConfig, RegisterEntry};
pub use dispatcher::{read, ReadFault, ReadFaultKind, WriteAttempt, WriteObserver};
pub use error::{CompileError, RowRef};
pub use loader::{load_register_map, load_rows, MapLoadError};
pub use map::RegisterMap;
pub use row::{RawRow, RegisterType};
pub use shared::SharedRegisterMap;
