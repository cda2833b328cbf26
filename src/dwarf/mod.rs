//! DWARF line-number programs and the compilation units that own them.

pub mod debug_info;
pub mod debug_line;
pub mod header;
pub mod opcodes;
pub mod program;
pub mod state;
pub mod unit;

/// Byte reader used for `.debug_line` contents.
pub type Input<'input> = gimli::EndianSlice<'input, gimli::RunTimeEndian>;

pub use debug_info::DebugInfo;
pub use debug_line::{DebugLine, LineProgramSource};
pub use header::{FileEntry, LineNumberProgramHeader};
pub use program::LineNumberProgram;
pub use state::{LineNumberRow, LineNumberState};
pub use unit::{Attribute, AttributeValue, CompilationUnit};
