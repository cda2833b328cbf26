use std::sync::Arc;
use std::thread;

use byteorder::LittleEndian;
use dwarfline::dwarf::{AttributeValue, CompilationUnit, DebugInfo, DebugLine};
use dwarfline::{MachineCodeMapping, SourceLine, TranslationUnit, NO_ADDRESS};
use gimli::RunTimeEndian;

use crate::test_helpers::{section, LineProgramBuilder};

fn unit(offset: u64, name: &str, low_pc: Option<u64>, stmt_list: Option<u64>) -> CompilationUnit {
    let mut unit = CompilationUnit::new(offset, gimli::DW_TAG_compile_unit)
        .with_attribute(gimli::DW_AT_name, AttributeValue::String(name.to_string()));
    if let Some(low_pc) = low_pc {
        unit.push_attribute(gimli::DW_AT_low_pc, AttributeValue::Address(low_pc));
    }
    if let Some(stmt_list) = stmt_list {
        unit.push_attribute(gimli::DW_AT_stmt_list, AttributeValue::SectionOffset(stmt_list));
    }
    unit
}

/// Two well-formed units, one unit whose program is corrupt, one without a
/// line program at all.
fn mapping() -> MachineCodeMapping {
    // 0x1000 line 1, 0x1001-0x1002 line 2, 0x1010 line 2 again
    let first = LineProgramBuilder::new()
        .set_address::<LittleEndian>(0x1000)
        .copy()
        .special(1, 1)
        .special(1, 0)
        .advance_pc(0x0e)
        .copy()
        .special(2, 1)
        .end_sequence()
        .build::<LittleEndian>();

    // 0x2010 line 10 (not a statement), 0x2010 line 10, 0x2020 line 20
    let second = LineProgramBuilder::new()
        .set_address::<LittleEndian>(0x2010)
        .advance_line(9)
        .negate_stmt()
        .copy()
        .negate_stmt()
        .copy()
        .advance_pc(0x10)
        .advance_line(10)
        .copy()
        .advance_pc(4)
        .end_sequence()
        .build::<LittleEndian>();

    let mut corrupt = LineProgramBuilder::new();
    corrupt.line_range = 0;
    let corrupt = corrupt.copy().raw(&[0x40]).build::<LittleEndian>();

    let (data, offsets) = section(&[first, second, corrupt]);

    let debug_info = DebugInfo::new([
        unit(0x0, "/src/u1.c", Some(0x1000), Some(offsets[0])),
        unit(0x40, "/src/u2.c", Some(0x2000), Some(offsets[1])),
        unit(0x80, "/src/u3.c", Some(0x3000), Some(offsets[2])),
        unit(0xc0, "/src/u4.c", Some(0x4000), None),
    ]);

    MachineCodeMapping::new(debug_info, DebugLine::new(data, RunTimeEndian::Little))
}

fn line(mapping: &MachineCodeMapping, unit: &str, line: i64) -> SourceLine {
    let unit = mapping.debug_info().unit_by_name(unit).unwrap();
    SourceLine::new(Arc::clone(unit), line)
}

#[test]
fn test_address_ranges_for_line() {
    let mapping = mapping();

    assert_eq!(
        mapping.address_ranges_for_line(&line(&mapping, "u1.c", 2)),
        vec![0x1001..=0x1002, 0x1010..=0x1010]
    );
    assert_eq!(
        mapping.address_ranges_for_line(&line(&mapping, "u1.c", 1)),
        vec![0x1000..=0x1000]
    );
    assert!(mapping.address_ranges_for_line(&line(&mapping, "u1.c", 7)).is_empty());
}

#[test]
fn test_source_line_ranges_for_address() {
    let mapping = mapping();

    let ranges = mapping.source_line_ranges_for_address(0x1010);
    assert_eq!(ranges.len(), 1);
    assert_eq!(ranges[0].lines(), &(2..=2));
    assert_eq!(ranges[0].unit().compilation_unit().unwrap().offset(), 0x0);

    // Two rows at 0x2010, both on line 10
    let ranges = mapping.source_line_ranges_for_address(0x2010);
    assert_eq!(ranges.len(), 1);
    assert_eq!(ranges[0].lines(), &(10..=10));
    assert_eq!(ranges[0].unit().to_string(), "/src/u2.c (unit 0x40)");
}

#[test]
fn test_floor_lookup_picks_owning_unit() {
    let mapping = mapping();

    assert!(mapping.source_line_ranges_for_address(0x0fff).is_empty());
    // 0x1500 resolves to u1, which has no row there
    assert!(mapping.source_line_ranges_for_address(0x1500).is_empty());
    assert_eq!(mapping.debug_info().compilation_unit(0x2500).unwrap().offset(), 0x40);
}

#[test]
fn test_statement_queries() {
    let mapping = mapping();

    assert_eq!(mapping.next_statement_address(0x2010u64), 0x2020);
    assert_eq!(mapping.statement_address(0x2010u64), 0x2010);
    assert_eq!(mapping.next_statement_address(line(&mapping, "u2.c", 10)), 0x2020);
    assert_eq!(mapping.statement_address(line(&mapping, "u2.c", 20)), 0x2020);

    // The end-of-sequence row is the last candidate
    assert_eq!(mapping.next_statement_address(0x2020u64), 0x2024);
    assert_eq!(mapping.next_statement_address(0x2024u64), NO_ADDRESS);
}

#[test]
fn test_statement_queries_without_match() {
    let mapping = mapping();

    assert_eq!(mapping.next_statement_address(0x0u64), NO_ADDRESS);
    assert_eq!(mapping.statement_address(0x2015u64), NO_ADDRESS);
    assert_eq!(mapping.statement_address(line(&mapping, "u2.c", 99)), NO_ADDRESS);
}

#[test]
fn test_corrupt_and_missing_programs_are_empty() {
    let mapping = mapping();

    assert!(mapping.source_line_ranges_for_address(0x3000).is_empty());
    assert!(mapping.address_ranges_for_line(&line(&mapping, "u3.c", 1)).is_empty());
    assert!(mapping.source_line_ranges_for_address(0x4000).is_empty());
    assert_eq!(mapping.statement_address(0x4000u64), NO_ADDRESS);

    // Healthy units still answer afterwards
    assert_eq!(mapping.statement_address(0x1000u64), 0x1000);
}

#[test]
fn test_symbol_only_unit_yields_nothing() {
    let mapping = mapping();
    let line = SourceLine::new(
        TranslationUnit::SymbolOnly {
            source_file: "start.S".to_string(),
        },
        3,
    );

    assert!(mapping.address_ranges_for_line(&line).is_empty());
    assert_eq!(mapping.next_statement_address(line.clone()), NO_ADDRESS);
    assert_eq!(mapping.statement_address(line), NO_ADDRESS);
}

#[test]
fn test_programs_decode_once() {
    let mapping = mapping();

    for _ in 0..3 {
        mapping.address_ranges_for_line(&line(&mapping, "u1.c", 2));
        mapping.source_line_ranges_for_address(0x2010);
    }
    assert_eq!(mapping.line_programs().decoded_count(), 2);
}

#[test]
fn test_shared_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<MachineCodeMapping>();

    let mapping = Arc::new(mapping());
    let expected = mapping.address_ranges_for_line(&line(&mapping, "u1.c", 2));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let mapping = Arc::clone(&mapping);
            thread::spawn(move || {
                let ranges = mapping.address_ranges_for_line(&line(&mapping, "u1.c", 2));
                let next = mapping.next_statement_address(0x2010u64);
                (ranges, next)
            })
        })
        .collect();

    for handle in handles {
        let (ranges, next) = handle.join().unwrap();
        assert_eq!(ranges, expected);
        assert_eq!(next, 0x2020);
    }
    assert_eq!(mapping.line_programs().decoded_count(), 2);
}

#[test]
fn test_mapping_debug_output() {
    let mapping = mapping();
    let debug = format!("{:?}", mapping);

    assert!(debug.contains("MachineCodeMapping"));
    assert!(debug.contains("DebugLine"));
    assert!(dwarfline::loader::load_from_bytes(&[0u8; 8]).is_err());
}
