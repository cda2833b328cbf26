use byteorder::{BigEndian, LittleEndian};
use dwarfline::dwarf::DebugLine;
use dwarfline::Error;
use gimli::RunTimeEndian;
use proptest::prelude::*;
use test_case::test_case;

use crate::test_helpers::{section, LineProgramBuilder};

fn rows(debug_line: &DebugLine, offset: u64) -> Vec<(u64, i64, bool)> {
    debug_line
        .line_number_program(offset)
        .unwrap()
        .rows()
        .iter()
        .map(|row| (row.address(), row.line(), row.is_end_sequence()))
        .collect()
}

fn sample() -> LineProgramBuilder {
    LineProgramBuilder::new()
        .copy()
        .special(1, 1)
        .special(2, 0)
        .end_sequence()
}

#[test]
fn test_decode_little_endian() {
    let unit = LineProgramBuilder::new()
        .set_address::<LittleEndian>(0x1000)
        .copy()
        .special(1, 1)
        .special(2, 0)
        .end_sequence()
        .build::<LittleEndian>();
    let debug_line = DebugLine::new(unit, RunTimeEndian::Little);

    assert_eq!(
        rows(&debug_line, 0),
        vec![
            (0x1000, 1, false),
            (0x1001, 2, false),
            (0x1003, 2, false),
            (0x1003, 2, true),
        ]
    );
}

#[test]
fn test_decode_big_endian() {
    let unit = LineProgramBuilder::new()
        .set_address::<BigEndian>(0x4000_0000)
        .copy()
        .special(1, 1)
        .fixed_advance_pc::<BigEndian>(0x100)
        .copy()
        .build::<BigEndian>();
    let debug_line = DebugLine::new(unit, RunTimeEndian::Big);

    assert_eq!(
        rows(&debug_line, 0),
        vec![
            (0x4000_0000, 1, false),
            (0x4000_0001, 2, false),
            (0x4000_0101, 2, false),
        ]
    );
}

#[test]
fn test_end_sequence_resets_registers() {
    let unit = LineProgramBuilder::new()
        .set_address::<LittleEndian>(0x2000)
        .advance_line(9)
        .set_file(2)
        .set_column(7)
        .copy()
        .end_sequence()
        .copy()
        .build::<LittleEndian>();
    let debug_line = DebugLine::new(unit, RunTimeEndian::Little);
    let program = debug_line.line_number_program(0).unwrap();
    let rows = program.rows();

    assert_eq!(rows.len(), 3);
    assert_eq!((rows[1].address(), rows[1].line(), rows[1].file()), (0x2000, 10, 2));
    assert!(rows[1].is_end_sequence());
    assert_eq!(
        (rows[2].address(), rows[2].line(), rows[2].file(), rows[2].column()),
        (0, 1, 1, 0)
    );
    assert!(!rows[2].is_end_sequence());
}

#[test]
fn test_address_advances_scale_except_fixed() {
    let mut builder = LineProgramBuilder::new();
    builder.minimum_instruction_length = 4;
    let unit = builder
        .const_add_pc()
        .copy()
        .fixed_advance_pc::<LittleEndian>(3)
        .copy()
        .advance_pc(2)
        .copy()
        .build::<LittleEndian>();
    let debug_line = DebugLine::new(unit, RunTimeEndian::Little);

    // (255 - 13) / 14 = 17 operations of 4 bytes, then 3 raw bytes, then 2 * 4
    let addresses: Vec<u64> = rows(&debug_line, 0).iter().map(|row| row.0).collect();
    assert_eq!(addresses, vec![68, 71, 79]);
}

#[test]
fn test_negate_stmt_persists_across_rows() {
    let unit = LineProgramBuilder::new()
        .negate_stmt()
        .copy()
        .special(1, 0)
        .negate_stmt()
        .copy()
        .build::<LittleEndian>();
    let debug_line = DebugLine::new(unit, RunTimeEndian::Little);
    let program = debug_line.line_number_program(0).unwrap();

    let statements: Vec<bool> = program.rows().iter().map(|row| row.is_statement()).collect();
    assert_eq!(statements, vec![false, false, true]);
}

#[test]
fn test_define_file_extends_file_table() {
    let mut builder = LineProgramBuilder::new();
    builder.include_directories = vec!["/usr/include".to_string()];
    let unit = builder
        .define_file("gen.h", 1)
        .set_file(2)
        .copy()
        .build::<LittleEndian>();
    let debug_line = DebugLine::new(unit, RunTimeEndian::Little);
    let program = debug_line.line_number_program(0).unwrap();

    assert_eq!(program.rows()[0].file(), 2);
    assert_eq!(program.file_path(1).as_deref(), Some("main.c"));
    assert_eq!(program.file_path(2).as_deref(), Some("/usr/include/gen.h"));
    assert_eq!(program.file_path(3), None);
}

#[test_case(3 ; "version 3")]
#[test_case(4 ; "version 4")]
fn test_special_opcode_needs_version_2(version: u16) {
    let mut builder = LineProgramBuilder::new();
    builder.version = version;
    let unit = builder.copy().special(1, 1).build::<LittleEndian>();
    let debug_line = DebugLine::new(unit, RunTimeEndian::Little);

    assert_eq!(debug_line.decode(0).unwrap_err(), Error::UnsupportedVersion { version });
    assert!(debug_line.line_number_program(0).is_none());
}

#[test_case(3 ; "version 3")]
#[test_case(4 ; "version 4")]
fn test_later_versions_without_special_opcodes(version: u16) {
    let mut builder = LineProgramBuilder::new();
    builder.version = version;
    let unit = builder
        .set_address::<LittleEndian>(0x10)
        .copy()
        .advance_pc(4)
        .advance_line(2)
        .copy()
        .build::<LittleEndian>();
    let debug_line = DebugLine::new(unit, RunTimeEndian::Little);

    assert_eq!(rows(&debug_line, 0), vec![(0x10, 1, false), (0x14, 3, false)]);
}

#[test_case(1 ; "version 1")]
#[test_case(5 ; "version 5")]
fn test_header_version_out_of_range(version: u16) {
    let mut builder = LineProgramBuilder::new();
    builder.version = version;
    let debug_line = DebugLine::new(builder.copy().build::<LittleEndian>(), RunTimeEndian::Little);

    assert_eq!(debug_line.decode(0).unwrap_err(), Error::UnsupportedVersion { version });
}

#[test]
fn test_truncated_unit_is_malformed() {
    let mut data = sample().build::<LittleEndian>();
    data.truncate(data.len() - 2);
    let debug_line = DebugLine::new(data, RunTimeEndian::Little);

    assert!(matches!(debug_line.decode(0), Err(Error::Malformed(_))));
}

#[test]
fn test_broken_unit_leaves_neighbours_intact() {
    let mut broken = LineProgramBuilder::new();
    broken.line_range = 0;
    let broken = broken.raw(&[0xff]).build::<LittleEndian>();
    let good = sample().build::<LittleEndian>();
    let (data, offsets) = section(&[good.clone(), broken, good]);
    let debug_line = DebugLine::new(data, RunTimeEndian::Little);

    assert!(debug_line.line_number_program(offsets[0]).is_some());
    assert_eq!(
        debug_line.decode(offsets[1]).unwrap_err(),
        Error::ZeroLineRange { offset: offsets[1] }
    );
    assert!(debug_line.line_number_program(offsets[1]).is_none());
    assert_eq!(rows(&debug_line, offsets[2]), rows(&debug_line, offsets[0]));
}

proptest! {
    #[test]
    fn test_arbitrary_opcodes_never_panic(opcodes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let unit = LineProgramBuilder::new().raw(&opcodes).build::<LittleEndian>();
        let debug_line = DebugLine::new(unit, RunTimeEndian::Little);

        if let Ok(program) = debug_line.decode(0) {
            for (position, row) in program.rows().iter().enumerate() {
                prop_assert_eq!(row.position(), position);
            }
        }
    }

    #[test]
    fn test_arbitrary_sections_never_panic(data in proptest::collection::vec(any::<u8>(), 0..128), offset in 0u64..160) {
        let debug_line = DebugLine::new(data, RunTimeEndian::Little);
        let _ = debug_line.line_number_program(offset);
    }
}
