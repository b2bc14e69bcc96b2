// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use std::sync::{Arc, PoisonError, RwLock};

use super::map::RegisterMap;

/// Owned, swappable handle to the live register map.
///
/// Readers take an `Arc` snapshot and release the lock immediately, so a
/// reload never blocks in-flight reads and a reader never sees a map that is
/// still being built. Clones share the same underlying slot.
#[derive(Debug, Clone, Default)]
pub struct SharedRegisterMap {
    slot: Arc<RwLock<Arc<RegisterMap>>>,
}

impl SharedRegisterMap {
    pub fn new(map: RegisterMap) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Arc::new(map))),
        }
    }

    /// Snapshot of the current map
    pub fn current(&self) -> Arc<RegisterMap> {
        // The slot only ever holds a complete Arc, so a poisoned lock is still consistent
        let guard = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Publish a fully built map and return the previous one.
    pub fn replace(&self, map: RegisterMap) -> Arc<RegisterMap> {
        let mut guard = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register_map::{compile, EncodingConfig, RawRow};

    fn map_with(value: &str) -> RegisterMap {
        compile(
            &[RawRow::new("0", "uint16", value)],
            &EncodingConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_snapshots_survive_replacement() {
        let shared = SharedRegisterMap::new(map_with("1"));
        let before = shared.current();

        let previous = shared.replace(map_with("2"));

        assert_eq!(before.get(0), Some(1));
        assert_eq!(previous.get(0), Some(1));
        assert_eq!(shared.current().get(0), Some(2));
    }

    #[test]
    fn test_clones_share_the_slot() {
        let shared = SharedRegisterMap::new(map_with("1"));
        let other = shared.clone();
        other.replace(map_with("3"));
        assert_eq!(shared.current().get(0), Some(3));
    }
}
