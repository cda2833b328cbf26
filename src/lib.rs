//! DWARFLINE - address to source line mapping for native binaries
//!
//! This library decodes DWARF line-number programs and answers the questions
//! a debugger asks of them: which addresses a source line compiled to, which
//! lines an address came from, and where statement boundaries lie.

pub mod dwarf;
pub mod error;
pub mod loader;
pub mod mapping;

/// Re-export key types for easier access in tests
pub use dwarf::{CompilationUnit, DebugInfo, DebugLine, LineNumberProgram, LineNumberRow, LineProgramSource};
pub use error::{Error, Result};
pub use mapping::{Location, MachineCodeMapping, SourceLine, SourceLineRange, TranslationUnit, NO_ADDRESS};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Initialize the logging system
pub fn init_logging(level: log::LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .filter_module("dwarfline", level)
        .format_timestamp_secs()
        .init();
}
