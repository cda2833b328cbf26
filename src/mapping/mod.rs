//! Address to source line mapping backed by DWARF.
//!
//! [`MachineCodeMapping`] answers the four questions a debugger asks of line
//! information: which addresses implement a line, which lines an address
//! came from, and where the next or enclosing statement boundary is.

pub mod merge;
pub mod types;

use std::ops::RangeInclusive;
use std::sync::Arc;

use log::{debug, warn};

use crate::dwarf::{CompilationUnit, DebugInfo, DebugLine, LineNumberProgram, LineNumberRow, LineProgramSource};

pub use types::{Location, SourceLine, SourceLineRange, TranslationUnit};

/// Address returned when no statement boundary was found.
pub const NO_ADDRESS: u64 = 0;

/// A row located inside a shared program.
struct Anchor {
    program: Arc<LineNumberProgram>,
    position: usize,
}

impl Anchor {
    /// The anchor row followed by everything emitted after it.
    fn rows(&self) -> &[LineNumberRow] {
        self.program.rows_from(self.position)
    }
}

/// Maps machine addresses to source lines and back.
///
/// Nothing is mutated by queries apart from the line-program cache of the
/// source, so a mapping can be shared between threads once built.
#[derive(Debug)]
pub struct MachineCodeMapping<S = DebugLine> {
    /// Compilation units and their address index
    debug_info: DebugInfo,
    /// Where line programs come from
    line_programs: S,
}

impl<S: LineProgramSource> MachineCodeMapping<S> {
    /// Create a mapping over decoded units and a line program source
    pub fn new(debug_info: DebugInfo, line_programs: S) -> Self {
        Self {
            debug_info,
            line_programs,
        }
    }

    /// Get the compilation units
    pub fn debug_info(&self) -> &DebugInfo {
        &self.debug_info
    }

    /// Get the line program source
    pub fn line_programs(&self) -> &S {
        &self.line_programs
    }

    /// Line program of a unit, via its DW_AT_stmt_list.
    pub fn line_program(&self, unit: &CompilationUnit) -> Option<Arc<LineNumberProgram>> {
        let Some(offset) = unit.line_program_offset() else {
            debug!("{} has no DW_AT_stmt_list", unit);
            return None;
        };
        self.line_programs.line_number_program(offset)
    }

    /// Resolve a source line's unit to its DWARF line program.
    fn line_program_for(&self, source_line: &SourceLine) -> Option<Arc<LineNumberProgram>> {
        match source_line.unit().compilation_unit() {
            Ok(unit) => self.line_program(unit),
            Err(err) => {
                warn!("Cannot map {}: {}", source_line, err);
                None
            }
        }
    }

    /// Inclusive address ranges generated for a source line, ascending.
    pub fn address_ranges_for_line(&self, source_line: &SourceLine) -> Vec<RangeInclusive<u64>> {
        let Some(program) = self.line_program_for(source_line) else {
            return Vec::new();
        };

        let mut addresses: Vec<u64> = program
            .rows_by_line(source_line.line())
            .iter()
            .map(|row| row.address())
            .collect();
        addresses.sort_unstable();

        merge::address_ranges(addresses)
    }

    /// Source line ranges whose rows sit exactly at `address`, ascending.
    pub fn source_line_ranges_for_address(&self, address: u64) -> Vec<SourceLineRange> {
        let Some(unit) = self.debug_info.compilation_unit(address) else {
            debug!("No compilation unit covers {:#x}", address);
            return Vec::new();
        };
        let Some(program) = self.line_program(unit) else {
            return Vec::new();
        };

        let mut lines: Vec<i64> = program
            .rows_by_address(address)
            .iter()
            .map(|row| row.line())
            .collect();
        lines.sort_unstable();

        let translation_unit = TranslationUnit::Dwarf(Arc::clone(unit));
        merge::line_ranges(lines)
            .into_iter()
            .map(|lines| SourceLineRange::new(translation_unit.clone(), lines))
            .collect()
    }

    /// First matching row for a location, in program order.
    fn anchor(&self, location: &Location) -> Option<Anchor> {
        let (program, position) = match location {
            Location::Address(address) => {
                let unit = self.debug_info.compilation_unit(*address)?;
                let program = self.line_program(unit)?;
                let position = program.rows_by_address(*address).first()?.position();
                (program, position)
            }
            Location::Line(source_line) => {
                let program = self.line_program_for(source_line)?;
                let position = program.rows_by_line(source_line.line()).first()?.position();
                (program, position)
            }
        };

        Some(Anchor { program, position })
    }

    /// Address of the next statement after a location.
    ///
    /// Walks forward in program order from the first matching row and stops
    /// at the first statement row whose address differs from the start.
    /// Returns [`NO_ADDRESS`] when there is none.
    pub fn next_statement_address(&self, location: impl Into<Location>) -> u64 {
        self.anchor(&location.into())
            .and_then(|anchor| {
                let (start, following) = anchor.rows().split_first()?;
                following
                    .iter()
                    .find(|row| row.is_statement() && row.address() != start.address())
                    .map(LineNumberRow::address)
            })
            .unwrap_or(NO_ADDRESS)
    }

    /// Address of the statement a location belongs to.
    ///
    /// The first statement row at or after the first matching row, in program
    /// order. Returns [`NO_ADDRESS`] when there is none.
    pub fn statement_address(&self, location: impl Into<Location>) -> u64 {
        self.anchor(&location.into())
            .and_then(|anchor| {
                anchor
                    .rows()
                    .iter()
                    .find(|row| row.is_statement())
                    .map(LineNumberRow::address)
            })
            .unwrap_or(NO_ADDRESS)
    }
}
