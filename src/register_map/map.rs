// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use std::collections::BTreeMap;
use std::fmt;

use super::compiler::RegisterEntry;

/// A compiled, immutable table of holding register cells.
///
/// Built once by [`compile`](super::compile) and never mutated afterwards;
/// reloads produce a new map that replaces this one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterMap {
    cells: BTreeMap<u16, u16>,
    entries: Vec<RegisterEntry>,
}

impl RegisterMap {
    /// Flatten entries into their cells. Entries must not overlap.
    pub(crate) fn from_entries(entries: Vec<RegisterEntry>) -> Self {
        let cells = entries
            .iter()
            .flat_map(|entry| {
                entry
                    .cells
                    .iter()
                    .enumerate()
                    .map(move |(offset, value)| (entry.start_index + offset as u16, *value))
            })
            .collect();
        Self { cells, entries }
    }

    /// Value of the cell at `index`, if mapped
    pub fn get(&self, index: u16) -> Option<u16> {
        self.cells.get(&index).copied()
    }

    pub fn contains(&self, index: u16) -> bool {
        self.cells.contains_key(&index)
    }

    /// Number of mapped cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Lowest and highest mapped index, or `None` for an empty map
    pub fn span(&self) -> Option<(u16, u16)> {
        let (first, _) = self.cells.first_key_value()?;
        let (last, _) = self.cells.last_key_value()?;
        Some((*first, *last))
    }

    /// Compiled entries in row order
    pub fn entries(&self) -> &[RegisterEntry] {
        &self.entries
    }

    /// Mapped cells in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = (u16, u16)> + '_ {
        self.cells.iter().map(|(index, value)| (*index, *value))
    }
}

/// Preview table: one line per mapped cell with its decimal and hex value.
impl fmt::Display for RegisterMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>7}  {:>7}  {:>6}", "address", "value", "hex")?;
        for (index, value) in self.iter() {
            writeln!(f, "{index:>7}  {value:>7}  0x{value:04X}")?;
        }
        match self.span() {
            Some((first, last)) => write!(
                f,
                "{} registers populated (sparse), span HR[{first}..{last}]",
                self.len()
            ),
            None => write!(f, "0 registers populated"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::register_map::{compile, EncodingConfig, RawRow};

    #[test]
    fn test_span_and_iteration_are_ordered() {
        let map = compile(
            &[
                RawRow::new("0x20", "uint16", "3"),
                RawRow::new("2", "uint32", "1"),
                RawRow::new("40001", "uint16", "7"),
            ],
            &EncodingConfig::default(),
        )
        .unwrap();

        assert_eq!(map.len(), 4);
        assert_eq!(map.span(), Some((0, 0x20)));
        let indices: Vec<u16> = map.iter().map(|(index, _)| index).collect();
        assert_eq!(indices, vec![0, 2, 3, 0x20]);
        assert_eq!(map.entries().len(), 3);
        assert!(map.contains(3));
        assert!(!map.contains(1));
    }

    #[test]
    fn test_empty_map() {
        let map = compile(&[], &EncodingConfig::default()).unwrap();
        assert!(map.is_empty());
        assert_eq!(map.span(), None);
        assert_eq!(map.to_string().lines().last(), Some("0 registers populated"));
    }

    #[test]
    fn test_preview_lists_hex_values() {
        let map = compile(
            &[RawRow::new("5", "uint16", "4660")],
            &EncodingConfig::default(),
        )
        .unwrap();
        let preview = map.to_string();
        assert!(preview.contains("      5     4660  0x1234"));
        assert!(preview.ends_with("1 registers populated (sparse), span HR[5..5]"));
    }
}
