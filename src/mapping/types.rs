//! Value types exchanged with mapping callers.

use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::dwarf::CompilationUnit;
use crate::error::{Error, Result};

/// A translation unit a source line can belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationUnit {
    /// Unit described by DWARF, with a line program
    Dwarf(Arc<CompilationUnit>),
    /// Unit known only from the symbol table, without line information
    SymbolOnly {
        /// Source file the symbol table names
        source_file: String,
    },
}

impl TranslationUnit {
    /// The DWARF compilation unit, or a type mismatch for any other kind.
    pub fn compilation_unit(&self) -> Result<&Arc<CompilationUnit>> {
        match self {
            Self::Dwarf(unit) => Ok(unit),
            Self::SymbolOnly { source_file } => Err(Error::TypeMismatch {
                unit: source_file.clone(),
            }),
        }
    }
}

impl From<Arc<CompilationUnit>> for TranslationUnit {
    fn from(unit: Arc<CompilationUnit>) -> Self {
        Self::Dwarf(unit)
    }
}

impl From<CompilationUnit> for TranslationUnit {
    fn from(unit: CompilationUnit) -> Self {
        Self::Dwarf(Arc::new(unit))
    }
}

impl fmt::Display for TranslationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dwarf(unit) => write!(f, "{}", unit),
            Self::SymbolOnly { source_file } => write!(f, "{} (symbols only)", source_file),
        }
    }
}

/// A line within a translation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    unit: TranslationUnit,
    line: i64,
}

impl SourceLine {
    /// Create a source line
    pub fn new(unit: impl Into<TranslationUnit>, line: i64) -> Self {
        Self {
            unit: unit.into(),
            line,
        }
    }

    /// Get the translation unit
    pub fn unit(&self) -> &TranslationUnit {
        &self.unit
    }

    /// Get the line number
    pub fn line(&self) -> i64 {
        self.line
    }
}

impl fmt::Display for SourceLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.unit, self.line)
    }
}

/// An inclusive run of lines within a translation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLineRange {
    unit: TranslationUnit,
    lines: RangeInclusive<i64>,
}

impl SourceLineRange {
    /// Create a line range
    pub fn new(unit: TranslationUnit, lines: RangeInclusive<i64>) -> Self {
        Self { unit, lines }
    }

    /// Get the translation unit
    pub fn unit(&self) -> &TranslationUnit {
        &self.unit
    }

    /// Get the inclusive line range
    pub fn lines(&self) -> &RangeInclusive<i64> {
        &self.lines
    }
}

/// Where a statement lookup starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A machine address
    Address(u64),
    /// A source line
    Line(SourceLine),
}

impl From<u64> for Location {
    fn from(address: u64) -> Self {
        Self::Address(address)
    }
}

impl From<SourceLine> for Location {
    fn from(line: SourceLine) -> Self {
        Self::Line(line)
    }
}
