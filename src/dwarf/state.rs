//! Line-number state machine registers and the rows they emit.

use super::header::LineNumberProgramHeader;

/// Mutable register set of the line-number state machine.
///
/// One state exists per program decode. Opcodes mutate it in place and
/// occasionally snapshot it into a [`LineNumberRow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineNumberState {
    /// Machine address of the current instruction
    pub address: u64,
    /// Source line (signed, advance_line may go negative)
    pub line: i64,
    /// Index into the program's file table
    pub file: u64,
    /// Source column, 0 when unknown
    pub column: u64,
    /// Block discriminator
    pub discriminator: u32,
    /// Recommended breakpoint location
    pub is_statement: bool,
    /// Beginning of a basic block
    pub basic_block: bool,
    /// First byte past the end of a sequence
    pub end_sequence: bool,
    /// Where a function breakpoint should go after the prologue
    pub prologue_end: bool,
    /// Where a breakpoint should go before the epilogue
    pub epilogue_begin: bool,
    /// Instruction set architecture
    pub isa: u64,
    default_is_statement: bool,
}

impl LineNumberState {
    /// Create the initial register set for a program with the given header.
    pub fn new(header: &LineNumberProgramHeader) -> Self {
        Self::with_default_is_statement(header.default_is_stmt())
    }

    /// Create the initial register set with an explicit `is_stmt` default.
    pub fn with_default_is_statement(default_is_statement: bool) -> Self {
        Self {
            address: 0,
            line: 1,
            file: 1,
            column: 0,
            discriminator: 0,
            is_statement: default_is_statement,
            basic_block: false,
            end_sequence: false,
            prologue_end: false,
            epilogue_begin: false,
            isa: 0,
            default_is_statement,
        }
    }

    /// Snapshot the current registers into an immutable row.
    ///
    /// The row's position is assigned when the owning program stores it.
    pub fn create_row(&self) -> LineNumberRow {
        LineNumberRow {
            address: self.address,
            line: self.line,
            file: self.file,
            column: self.column,
            discriminator: self.discriminator,
            is_statement: self.is_statement,
            basic_block: self.basic_block,
            end_sequence: self.end_sequence,
            prologue_end: self.prologue_end,
            epilogue_begin: self.epilogue_begin,
            isa: self.isa,
            position: 0,
        }
    }

    /// Clear the per-row flags after a row has been emitted.
    pub fn reset_after_row(&mut self) {
        self.basic_block = false;
        self.prologue_end = false;
        self.epilogue_begin = false;
        self.discriminator = 0;
    }

    /// Return every register to its initial value (after an end of sequence).
    pub fn reset(&mut self) {
        *self = Self::with_default_is_statement(self.default_is_statement);
    }
}

/// Immutable row of the line-number matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineNumberRow {
    address: u64,
    line: i64,
    file: u64,
    column: u64,
    discriminator: u32,
    is_statement: bool,
    basic_block: bool,
    end_sequence: bool,
    prologue_end: bool,
    epilogue_begin: bool,
    isa: u64,
    position: usize,
}

impl LineNumberRow {
    /// Get the machine address
    pub fn address(&self) -> u64 {
        self.address
    }

    /// Get the source line
    pub fn line(&self) -> i64 {
        self.line
    }

    /// Get the file table index
    pub fn file(&self) -> u64 {
        self.file
    }

    /// Get the source column
    pub fn column(&self) -> u64 {
        self.column
    }

    /// Get the block discriminator
    pub fn discriminator(&self) -> u32 {
        self.discriminator
    }

    /// Check if the row is a statement boundary
    pub fn is_statement(&self) -> bool {
        self.is_statement
    }

    /// Check if the row starts a basic block
    pub fn is_basic_block(&self) -> bool {
        self.basic_block
    }

    /// Check if the row terminates a sequence
    pub fn is_end_sequence(&self) -> bool {
        self.end_sequence
    }

    /// Check if the row marks the end of a prologue
    pub fn is_prologue_end(&self) -> bool {
        self.prologue_end
    }

    /// Check if the row marks the start of an epilogue
    pub fn is_epilogue_begin(&self) -> bool {
        self.epilogue_begin
    }

    /// Get the instruction set architecture register
    pub fn isa(&self) -> u64 {
        self.isa
    }

    /// Index of this row in its program's emission order.
    pub fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: usize) {
        self.position = position;
    }
}
