#![no_main]

use arbitrary::Arbitrary;
use dwarfline::dwarf::DebugLine;
use gimli::RunTimeEndian;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    big_endian: bool,
    offset: u16,
    section: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let endian = if input.big_endian {
        RunTimeEndian::Big
    } else {
        RunTimeEndian::Little
    };
    let debug_line = DebugLine::new(input.section, endian);

    // Decoding must fail cleanly on any byte soup
    if let Some(program) = debug_line.line_number_program(u64::from(input.offset)) {
        for row in program.rows() {
            let _ = program.next_row(row);
            let _ = program.file_path(row.file());
        }
    }
});
