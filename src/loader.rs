//! Build a [`MachineCodeMapping`] straight from an object file.
//!
//! ELF, Mach-O and PE files are read with `object`; compilation unit roots are
//! walked with `gimli`. Only the root DIE of each unit is kept, and only the
//! attribute forms the mapping can use are converted.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use gimli::{EndianSlice, RunTimeEndian, SectionId};
use log::{debug, info};
use object::{Object, ObjectSection};

use crate::dwarf::{AttributeValue, CompilationUnit, DebugInfo, DebugLine};
use crate::mapping::MachineCodeMapping;

type Reader<'data> = EndianSlice<'data, RunTimeEndian>;

/// Load the file at `path` and index its debug information.
pub fn load<P: AsRef<Path>>(path: P) -> Result<MachineCodeMapping> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mapping =
        load_from_bytes(&data).with_context(|| format!("Failed to load debug info from {}", path.display()))?;

    info!(
        "Loaded {} compilation units from {}",
        mapping.debug_info().units().len(),
        path.display()
    );
    Ok(mapping)
}

/// Index the debug information of an in-memory object file.
pub fn load_from_bytes(data: &[u8]) -> Result<MachineCodeMapping> {
    let object = object::File::parse(data).context("Failed to parse object file")?;
    let endian = if object.is_little_endian() {
        RunTimeEndian::Little
    } else {
        RunTimeEndian::Big
    };

    let units = compilation_units(&object, endian)?;
    let debug_line = DebugLine::new(section_data(&object, SectionId::DebugLine)?.into_owned(), endian);
    debug!("{} has {} bytes", SectionId::DebugLine.name(), debug_line.len());

    Ok(MachineCodeMapping::new(DebugInfo::new(units), debug_line))
}

/// Contents of a DWARF section, decompressed, or empty when missing.
fn section_data<'data>(object: &object::File<'data>, id: SectionId) -> Result<Cow<'data, [u8]>> {
    match object.section_by_name(id.name()) {
        Some(section) => section
            .uncompressed_data()
            .with_context(|| format!("Failed to read section {}", id.name())),
        None => Ok(Cow::Borrowed(&[][..])),
    }
}

/// Decode the root DIE of every unit in `.debug_info`.
fn compilation_units(object: &object::File<'_>, endian: RunTimeEndian) -> Result<Vec<CompilationUnit>> {
    let sections = gimli::DwarfSections::load(|id| section_data(object, id))?;
    let dwarf = sections.borrow(|section| EndianSlice::new(Cow::as_ref(section), endian));

    let mut units = Vec::new();
    let mut headers = dwarf.units();
    while let Some(header) = headers.next().context("Failed to read unit header")? {
        let offset = header
            .offset()
            .as_debug_info_offset()
            .map_or(0, |offset| offset.0 as u64);
        let unit = dwarf
            .unit(header)
            .with_context(|| format!("Failed to parse unit at {:#x}", offset))?;

        let mut entries = unit.entries();
        let Some((_, root)) = entries.next_dfs()? else {
            debug!("Unit at {:#x} has no root entry", offset);
            continue;
        };

        let mut compilation_unit = CompilationUnit::new(offset, root.tag());
        let mut attrs = root.attrs();
        while let Some(attr) = attrs.next()? {
            if let Some(value) = convert_value(&dwarf, &unit, attr.value())? {
                compilation_unit.push_attribute(attr.name(), value);
            }
        }
        units.push(compilation_unit);
    }

    Ok(units)
}

/// Convert the attribute forms a unit root can carry. Anything else is dropped.
fn convert_value<'data>(
    dwarf: &gimli::Dwarf<Reader<'data>>,
    unit: &gimli::Unit<Reader<'data>>,
    value: gimli::AttributeValue<Reader<'data>>,
) -> Result<Option<AttributeValue>> {
    use gimli::AttributeValue as Value;

    let converted = match value {
        Value::Addr(_) | Value::DebugAddrIndex(_) => dwarf.attr_address(unit, value)?.map(AttributeValue::Address),
        Value::DebugLineRef(offset) => Some(AttributeValue::SectionOffset(offset.0 as u64)),
        Value::SecOffset(offset) => Some(AttributeValue::SectionOffset(offset as u64)),
        Value::Udata(value) => Some(AttributeValue::Udata(value)),
        Value::Data1(value) => Some(AttributeValue::Udata(u64::from(value))),
        Value::Data2(value) => Some(AttributeValue::Udata(u64::from(value))),
        Value::Data4(value) => Some(AttributeValue::Udata(u64::from(value))),
        Value::Data8(value) => Some(AttributeValue::Udata(value)),
        Value::Sdata(value) => Some(AttributeValue::Sdata(value)),
        Value::Flag(value) => Some(AttributeValue::Flag(value)),
        Value::String(_)
        | Value::DebugStrRef(_)
        | Value::DebugStrRefSup(_)
        | Value::DebugStrOffsetsIndex(_)
        | Value::DebugLineStrRef(_) => {
            let string = dwarf.attr_string(unit, value)?;
            Some(AttributeValue::String(string.to_string_lossy().into_owned()))
        }
        _ => None,
    };

    Ok(converted)
}
