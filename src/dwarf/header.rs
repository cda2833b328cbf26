//! `.debug_line` unit header.

use gimli::{Format, Reader};

use super::Input;
use crate::error::{Error, Result};

/// Operand counts of standard opcodes 1..=12 as DWARF 3 defines them.
const DEFAULT_STANDARD_OPCODE_LENGTHS: [u8; 12] = [0, 1, 1, 1, 1, 0, 0, 0, 1, 0, 0, 1];

/// A source file known to a line-number program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// File path as written in the table
    pub path: String,
    /// Index into the include directories (0 = compilation directory)
    pub directory_index: u64,
    /// Last modification time, 0 if unknown
    pub modification_time: u64,
    /// File length in bytes, 0 if unknown
    pub length: u64,
}

impl FileEntry {
    /// Read the ULEB128 attributes that follow a file path.
    pub(crate) fn read_attributes(path: Input<'_>, input: &mut Input<'_>) -> Result<Self> {
        Ok(Self {
            path: String::from_utf8_lossy(path.slice()).into_owned(),
            directory_index: input.read_uleb128()?,
            modification_time: input.read_uleb128()?,
            length: input.read_uleb128()?,
        })
    }
}

/// Decoded header of one line-number program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineNumberProgramHeader {
    offset: u64,
    format: Format,
    version: u16,
    minimum_instruction_length: u8,
    maximum_operations_per_instruction: u8,
    default_is_stmt: bool,
    line_base: i8,
    line_range: u8,
    opcode_base: u8,
    standard_opcode_lengths: Vec<u8>,
    include_directories: Vec<String>,
    file_names: Vec<FileEntry>,
}

impl LineNumberProgramHeader {
    /// Create a header from already-decoded fields.
    ///
    /// Standard opcode lengths default to the DWARF values, `is_stmt`
    /// defaults to true and the file tables start empty.
    pub fn new(
        version: u16,
        opcode_base: u8,
        line_base: i8,
        line_range: u8,
        minimum_instruction_length: u8,
    ) -> Self {
        let standard_opcode_lengths = (1..opcode_base)
            .map(|opcode| {
                DEFAULT_STANDARD_OPCODE_LENGTHS
                    .get(usize::from(opcode) - 1)
                    .copied()
                    .unwrap_or(0)
            })
            .collect();

        Self {
            offset: 0,
            format: Format::Dwarf32,
            version,
            minimum_instruction_length,
            maximum_operations_per_instruction: 1,
            default_is_stmt: true,
            line_base,
            line_range,
            opcode_base,
            standard_opcode_lengths,
            include_directories: Vec::new(),
            file_names: Vec::new(),
        }
    }

    /// Set the `.debug_line` offset this header was found at
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Set the initial `is_stmt` register value
    pub fn with_default_is_stmt(mut self, default_is_stmt: bool) -> Self {
        self.default_is_stmt = default_is_stmt;
        self
    }

    /// Set the operand counts of the standard opcodes (opcode 1 first)
    pub fn with_standard_opcode_lengths(mut self, lengths: Vec<u8>) -> Self {
        self.standard_opcode_lengths = lengths;
        self
    }

    /// Set the file table
    pub fn with_file_names(mut self, file_names: Vec<FileEntry>) -> Self {
        self.file_names = file_names;
        self
    }

    /// Decode a header from the start of a line-program unit.
    ///
    /// Returns the header and the opcode stream that follows it, bounded by
    /// the unit length.
    pub fn parse<'input>(
        mut input: Input<'input>,
        offset: u64,
    ) -> Result<(Self, Input<'input>)> {
        let (unit_length, format) = input.read_initial_length()?;
        let mut unit = input.split(unit_length)?;

        let version = unit.read_u16()?;
        if !(2..=4).contains(&version) {
            return Err(Error::UnsupportedVersion { version });
        }

        let header_length = unit.read_offset(format)?;
        // `unit` keeps the opcode stream once the header fields are split off
        let mut fields = unit.split(header_length)?;

        let minimum_instruction_length = fields.read_u8()?;
        let maximum_operations_per_instruction = if version >= 4 {
            fields.read_u8()?
        } else {
            1
        };
        let default_is_stmt = fields.read_u8()? != 0;
        let line_base = fields.read_i8()?;
        let line_range = fields.read_u8()?;
        let opcode_base = fields.read_u8()?;

        let mut standard_opcode_lengths = Vec::with_capacity(usize::from(opcode_base));
        for _ in 1..opcode_base {
            standard_opcode_lengths.push(fields.read_u8()?);
        }

        let mut include_directories = Vec::new();
        loop {
            let directory = fields.read_null_terminated_slice()?;
            if directory.is_empty() {
                break;
            }
            include_directories.push(String::from_utf8_lossy(directory.slice()).into_owned());
        }

        let mut file_names = Vec::new();
        loop {
            let path = fields.read_null_terminated_slice()?;
            if path.is_empty() {
                break;
            }
            file_names.push(FileEntry::read_attributes(path, &mut fields)?);
        }

        let header = Self {
            offset,
            format,
            version,
            minimum_instruction_length,
            maximum_operations_per_instruction,
            default_is_stmt,
            line_base,
            line_range,
            opcode_base,
            standard_opcode_lengths,
            include_directories,
            file_names,
        };

        Ok((header, unit))
    }

    /// Get the `.debug_line` offset (the program's identity)
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Get the 32/64-bit DWARF format
    pub fn format(&self) -> Format {
        self.format
    }

    /// Get the line program version
    pub fn version(&self) -> u16 {
        self.version
    }

    /// Get the minimum instruction length
    pub fn minimum_instruction_length(&self) -> u32 {
        u32::from(self.minimum_instruction_length)
    }

    /// Get the maximum operations per instruction (1 before DWARF 4)
    pub fn maximum_operations_per_instruction(&self) -> u8 {
        self.maximum_operations_per_instruction
    }

    /// Get the initial `is_stmt` value
    pub fn default_is_stmt(&self) -> bool {
        self.default_is_stmt
    }

    /// Get the line base
    pub fn line_base(&self) -> i8 {
        self.line_base
    }

    /// Get the line range
    pub fn line_range(&self) -> u8 {
        self.line_range
    }

    /// Get the first special opcode
    pub fn opcode_base(&self) -> u8 {
        self.opcode_base
    }

    /// Operand count for a standard opcode, if the header declares one.
    pub fn standard_opcode_length(&self, opcode: u8) -> Option<u8> {
        let index = usize::from(opcode).checked_sub(1)?;
        self.standard_opcode_lengths.get(index).copied()
    }

    /// Get the include directories
    pub fn include_directories(&self) -> &[String] {
        &self.include_directories
    }

    /// Get the header's file table
    pub fn file_names(&self) -> &[FileEntry] {
        &self.file_names
    }
}
