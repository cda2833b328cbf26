//! Line-number program opcode interpreters.
//!
//! Each interpreter mutates the state machine and optionally emits a row.
//! Standard and extended opcodes pull their operands from the opcode stream;
//! special opcodes are a single byte.

use gimli::{DwLne, DwLns, Reader, ReaderOffset};

use super::header::{FileEntry, LineNumberProgramHeader};
use super::state::{LineNumberRow, LineNumberState};
use super::Input;
use crate::error::{Error, Result};

/// Marker byte that introduces an extended opcode.
pub const EXTENDED_OPCODE: u8 = 0;

/// The only line program version special opcodes are interpreted for.
pub const SUPPORTED_SPECIAL_OPCODE_VERSION: u16 = 2;

fn line_range(header: &LineNumberProgramHeader) -> Result<u8> {
    match header.line_range() {
        0 => Err(Error::ZeroLineRange {
            offset: header.offset(),
        }),
        range => Ok(range),
    }
}

fn advance_address(state: &mut LineNumberState, operation_advance: u64, header: &LineNumberProgramHeader) {
    let advance = operation_advance.wrapping_mul(u64::from(header.minimum_instruction_length()));
    state.address = state.address.wrapping_add(advance);
}

/// Apply a special opcode: advance address and line together, then emit a row.
///
/// `opcode` must be at least the header's opcode base.
pub fn apply_special(
    opcode: u8,
    header: &LineNumberProgramHeader,
    state: &mut LineNumberState,
) -> Result<LineNumberRow> {
    if header.version() != SUPPORTED_SPECIAL_OPCODE_VERSION {
        return Err(Error::UnsupportedVersion {
            version: header.version(),
        });
    }
    let line_range = line_range(header)?;

    debug_assert!(opcode >= header.opcode_base());
    let adjusted = opcode.saturating_sub(header.opcode_base());
    let address_advance = adjusted / line_range;
    let line_increment = i64::from(header.line_base()) + i64::from(adjusted % line_range);

    state.line = state.line.wrapping_add(line_increment);
    advance_address(state, u64::from(address_advance), header);

    let row = state.create_row();
    state.reset_after_row();
    Ok(row)
}

/// Apply a standard opcode, reading its operands from `input`.
pub fn apply_standard(
    opcode: u8,
    header: &LineNumberProgramHeader,
    state: &mut LineNumberState,
    input: &mut Input<'_>,
) -> Result<Option<LineNumberRow>> {
    match DwLns(opcode) {
        gimli::DW_LNS_copy => {
            let row = state.create_row();
            state.reset_after_row();
            return Ok(Some(row));
        }
        gimli::DW_LNS_advance_pc => {
            let advance = input.read_uleb128()?;
            advance_address(state, advance, header);
        }
        gimli::DW_LNS_advance_line => {
            let increment = input.read_sleb128()?;
            state.line = state.line.wrapping_add(increment);
        }
        gimli::DW_LNS_set_file => {
            state.file = input.read_uleb128()?;
        }
        gimli::DW_LNS_set_column => {
            state.column = input.read_uleb128()?;
        }
        gimli::DW_LNS_negate_stmt => {
            state.is_statement = !state.is_statement;
        }
        gimli::DW_LNS_set_basic_block => {
            state.basic_block = true;
        }
        gimli::DW_LNS_const_add_pc => {
            // Address advance of special opcode 255, without touching the line
            let adjusted = 255 - header.opcode_base();
            advance_address(state, u64::from(adjusted / line_range(header)?), header);
        }
        gimli::DW_LNS_fixed_advance_pc => {
            let advance = input.read_u16()?;
            state.address = state.address.wrapping_add(u64::from(advance));
        }
        gimli::DW_LNS_set_prologue_end => {
            state.prologue_end = true;
        }
        gimli::DW_LNS_set_epilogue_begin => {
            state.epilogue_begin = true;
        }
        gimli::DW_LNS_set_isa => {
            state.isa = input.read_uleb128()?;
        }
        _ => {
            // Unknown to us, but the header says how many ULEB operands to skip
            for _ in 0..header.standard_opcode_length(opcode).unwrap_or(0) {
                input.read_uleb128()?;
            }
        }
    }

    Ok(None)
}

/// Apply an extended opcode. `input` is positioned just after the marker byte.
///
/// Files introduced with `DW_LNE_define_file` are appended to `files`.
pub fn apply_extended(
    state: &mut LineNumberState,
    input: &mut Input<'_>,
    files: &mut Vec<FileEntry>,
) -> Result<Option<LineNumberRow>> {
    let length = input.read_uleb128()?;
    if length == 0 {
        return Ok(None);
    }

    // Operands are bounded by the declared length, trailing bytes are skipped
    let mut operands = input.split(<usize as ReaderOffset>::from_u64(length)?)?;
    let opcode = operands.read_u8()?;

    match DwLne(opcode) {
        gimli::DW_LNE_end_sequence => {
            state.end_sequence = true;
            let row = state.create_row();
            state.reset();
            return Ok(Some(row));
        }
        gimli::DW_LNE_set_address => {
            let address_size = u8::try_from(operands.len()).unwrap_or(0);
            state.address = operands.read_address(address_size)?;
        }
        gimli::DW_LNE_define_file => {
            let path = operands.read_null_terminated_slice()?;
            files.push(FileEntry::read_attributes(path, &mut operands)?);
        }
        gimli::DW_LNE_set_discriminator => {
            let discriminator = operands.read_uleb128()?;
            state.discriminator = u32::try_from(discriminator).unwrap_or(u32::MAX);
        }
        _ => {}
    }

    Ok(None)
}
