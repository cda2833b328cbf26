//! Compilation units and the address index over them.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;

use super::unit::CompilationUnit;

/// All compilation units of a binary, indexed by their lowest address.
#[derive(Debug, Clone, Default)]
pub struct DebugInfo {
    /// Units in `.debug_info` order
    units: Vec<Arc<CompilationUnit>>,
    /// Compile units by DW_AT_low_pc
    units_by_low_address: BTreeMap<u64, Arc<CompilationUnit>>,
}

impl DebugInfo {
    /// Build the index once all units are decoded.
    ///
    /// Only `DW_TAG_compile_unit` roots with a `DW_AT_low_pc` are indexed by
    /// address; the rest stay reachable by offset or name only. When two units
    /// share a low address the later one wins.
    pub fn new(units: impl IntoIterator<Item = CompilationUnit>) -> Self {
        let units: Vec<Arc<CompilationUnit>> = units.into_iter().map(Arc::new).collect();
        let mut units_by_low_address = BTreeMap::new();

        for unit in &units {
            if unit.tag() != gimli::DW_TAG_compile_unit {
                continue;
            }
            match unit.low_address() {
                Some(low_address) => {
                    units_by_low_address.insert(low_address, Arc::clone(unit));
                }
                None => debug!("{} has no DW_AT_low_pc, not address indexed", unit),
            }
        }

        debug!(
            "Indexed {} of {} compilation units by address",
            units_by_low_address.len(),
            units.len()
        );

        Self {
            units,
            units_by_low_address,
        }
    }

    /// Find the compilation unit covering `address`.
    ///
    /// This is the unit with the greatest low address not above `address`.
    /// High addresses are not tracked, so an address past the real end of a
    /// unit still resolves to it.
    pub fn compilation_unit(&self, address: u64) -> Option<&Arc<CompilationUnit>> {
        self.units_by_low_address
            .range(..=address)
            .next_back()
            .map(|(_, unit)| unit)
    }

    /// Get all units
    pub fn units(&self) -> &[Arc<CompilationUnit>] {
        &self.units
    }

    /// Get the number of address-indexed units
    pub fn indexed_len(&self) -> usize {
        self.units_by_low_address.len()
    }

    /// Find a unit by its `.debug_info` offset
    pub fn unit_at_offset(&self, offset: u64) -> Option<&Arc<CompilationUnit>> {
        self.units.iter().find(|unit| unit.offset() == offset)
    }

    /// Find a unit by DW_AT_name, or by the trailing path components of it.
    pub fn unit_by_name(&self, name: &str) -> Option<&Arc<CompilationUnit>> {
        self.units
            .iter()
            .find(|unit| unit.name() == Some(name))
            .or_else(|| {
                self.units.iter().find(|unit| {
                    unit.name()
                        .is_some_and(|unit_name| unit_name.ends_with(&format!("/{}", name)))
                })
            })
    }
}
