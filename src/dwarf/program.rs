//! Decoded line-number programs.

use std::collections::HashMap;

use gimli::Reader;
use log::debug;

use super::header::{FileEntry, LineNumberProgramHeader};
use super::opcodes::{apply_extended, apply_special, apply_standard, EXTENDED_OPCODE};
use super::state::{LineNumberRow, LineNumberState};
use super::Input;
use crate::error::Result;

/// The row matrix produced by running one unit's line-number program.
///
/// Rows are kept in emission order. Emission order is not address order:
/// optimized code routinely jumps backwards, so "the next row" always means
/// the row emitted after this one.
#[derive(Debug, Clone)]
pub struct LineNumberProgram {
    /// Decoded header
    header: LineNumberProgramHeader,
    /// Rows in emission order
    rows: Vec<LineNumberRow>,
    /// Files added by DW_LNE_define_file
    defined_files: Vec<FileEntry>,
    /// Row positions by exact address
    by_address: HashMap<u64, Vec<usize>>,
    /// Row positions by line
    by_line: HashMap<i64, Vec<usize>>,
}

impl LineNumberProgram {
    /// Run the opcode stream that follows `header` and collect its rows.
    pub fn build(header: LineNumberProgramHeader, mut instructions: Input<'_>) -> Result<Self> {
        let mut state = LineNumberState::new(&header);
        let mut rows = Vec::new();
        let mut defined_files = Vec::new();

        while !instructions.is_empty() {
            let opcode = instructions.read_u8()?;

            let row = if opcode >= header.opcode_base() {
                Some(apply_special(opcode, &header, &mut state)?)
            } else if opcode == EXTENDED_OPCODE {
                apply_extended(&mut state, &mut instructions, &mut defined_files)?
            } else {
                apply_standard(opcode, &header, &mut state, &mut instructions)?
            };

            if let Some(row) = row {
                rows.push(row);
            }
        }

        debug!(
            "Decoded line program at {:#x}: {} rows, {} defined files",
            header.offset(),
            rows.len(),
            defined_files.len()
        );

        Ok(Self::from_rows(header, rows, defined_files))
    }

    /// Assemble a program from rows already in emission order.
    pub(crate) fn from_rows(
        header: LineNumberProgramHeader,
        mut rows: Vec<LineNumberRow>,
        defined_files: Vec<FileEntry>,
    ) -> Self {
        let mut by_address: HashMap<u64, Vec<usize>> = HashMap::new();
        let mut by_line: HashMap<i64, Vec<usize>> = HashMap::new();

        for (position, row) in rows.iter_mut().enumerate() {
            row.set_position(position);
            by_address.entry(row.address()).or_default().push(position);
            by_line.entry(row.line()).or_default().push(position);
        }

        Self {
            header,
            rows,
            defined_files,
            by_address,
            by_line,
        }
    }

    /// Get the program header
    pub fn header(&self) -> &LineNumberProgramHeader {
        &self.header
    }

    /// Get the `.debug_line` offset of this program
    pub fn offset(&self) -> u64 {
        self.header.offset()
    }

    /// Get all rows in emission order
    pub fn rows(&self) -> &[LineNumberRow] {
        &self.rows
    }

    /// Rows whose address is exactly `address`, in emission order.
    pub fn rows_by_address(&self, address: u64) -> Vec<&LineNumberRow> {
        self.rows_at(self.by_address.get(&address))
    }

    /// Rows whose line is exactly `line`, in emission order.
    pub fn rows_by_line(&self, line: i64) -> Vec<&LineNumberRow> {
        self.rows_at(self.by_line.get(&line))
    }

    fn rows_at(&self, positions: Option<&Vec<usize>>) -> Vec<&LineNumberRow> {
        positions
            .map(|positions| {
                positions
                    .iter()
                    .filter_map(|&position| self.rows.get(position))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The row emitted right after `row`, if any.
    pub fn next_row(&self, row: &LineNumberRow) -> Option<&LineNumberRow> {
        self.rows.get(row.position() + 1)
    }

    /// All rows emitted after `row`.
    pub fn rows_after(&self, row: &LineNumberRow) -> &[LineNumberRow] {
        self.rows_from(row.position() + 1)
    }

    /// All rows from `position` onwards (empty past the end).
    pub fn rows_from(&self, position: usize) -> &[LineNumberRow] {
        self.rows.get(position..).unwrap_or(&[])
    }

    /// Look up a file by its 1-based index.
    ///
    /// Header entries come first, then files defined by the program itself.
    pub fn file_entry(&self, file: u64) -> Option<&FileEntry> {
        let index = usize::try_from(file).ok()?.checked_sub(1)?;
        let header_files = self.header.file_names();
        header_files
            .get(index)
            .or_else(|| self.defined_files.get(index - header_files.len()))
    }

    /// Path of a file, joined with its include directory when it has one.
    pub fn file_path(&self, file: u64) -> Option<String> {
        let entry = self.file_entry(file)?;
        let directory = usize::try_from(entry.directory_index)
            .ok()
            .and_then(|index| index.checked_sub(1))
            .and_then(|index| self.header.include_directories().get(index));

        Some(match directory {
            Some(directory) if !entry.path.starts_with('/') => {
                format!("{}/{}", directory, entry.path)
            }
            _ => entry.path.clone(),
        })
    }
}
