//! Compilation units as seen through their root DIE.

use std::fmt;
use std::hash::{Hash, Hasher};

use gimli::{DwAt, DwTag};

/// Decoded value of a root-DIE attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// Target address (DW_FORM_addr and friends)
    Address(u64),
    /// Unsigned constant
    Udata(u64),
    /// Signed constant
    Sdata(i64),
    /// Offset into another debug section
    SectionOffset(u64),
    /// Boolean flag
    Flag(bool),
    /// String, already resolved from any string table
    String(String),
}

impl AttributeValue {
    /// Integer view of integer-like values.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Address(value) | Self::Udata(value) | Self::SectionOffset(value) => Some(*value),
            Self::Sdata(value) => u64::try_from(*value).ok(),
            Self::Flag(flag) => Some(u64::from(*flag)),
            Self::String(_) => None,
        }
    }

    /// String view of string values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }
}

/// One attribute of a root DIE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name
    pub name: DwAt,
    /// Attribute value
    pub value: AttributeValue,
}

/// A compilation unit from `.debug_info`.
///
/// Identity is the unit's offset in `.debug_info`.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    offset: u64,
    tag: DwTag,
    attributes: Vec<Attribute>,
}

impl CompilationUnit {
    /// Create a unit with no attributes
    pub fn new(offset: u64, tag: DwTag) -> Self {
        Self {
            offset,
            tag,
            attributes: Vec::new(),
        }
    }

    /// Add a root attribute, builder style
    pub fn with_attribute(mut self, name: DwAt, value: AttributeValue) -> Self {
        self.push_attribute(name, value);
        self
    }

    /// Add a root attribute
    pub fn push_attribute(&mut self, name: DwAt, value: AttributeValue) {
        self.attributes.push(Attribute { name, value });
    }

    /// Get the `.debug_info` offset
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Get the root DIE tag
    pub fn tag(&self) -> DwTag {
        self.tag
    }

    /// Get all root attributes
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// First value of the named attribute
    pub fn attr(&self, name: DwAt) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name == name)
            .map(|attribute| &attribute.value)
    }

    /// `.debug_line` offset of this unit's line program (DW_AT_stmt_list)
    pub fn line_program_offset(&self) -> Option<u64> {
        self.attr(gimli::DW_AT_stmt_list)?.as_u64()
    }

    /// Lowest instruction address (DW_AT_low_pc)
    pub fn low_address(&self) -> Option<u64> {
        self.attr(gimli::DW_AT_low_pc)?.as_u64()
    }

    /// Source file name (DW_AT_name)
    pub fn name(&self) -> Option<&str> {
        self.attr(gimli::DW_AT_name)?.as_str()
    }
}

impl PartialEq for CompilationUnit {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset
    }
}

impl Eq for CompilationUnit {}

impl Hash for CompilationUnit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.offset.hash(state);
    }
}

impl fmt::Display for CompilationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} (unit {:#x})", name, self.offset),
            None => write!(f, "unit {:#x}", self.offset),
        }
    }
}
