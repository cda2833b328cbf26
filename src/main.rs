use std::env;
use std::process;

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, LevelFilter};

use dwarfline::{loader, LineProgramSource, MachineCodeMapping, SourceLine, NO_ADDRESS};

/// A query to run against the loaded binary
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    /// List compilation units
    Units,
    /// Source lines at an address
    Addr(u64),
    /// Address ranges of a line in a named unit
    Line { unit: String, line: i64 },
    /// Next statement after an address
    Next(u64),
    /// Statement containing an address
    Stmt(u64),
}

/// Parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
struct Invocation {
    level: LevelFilter,
    binary: String,
    command: Command,
}

/// What the command line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Help,
    Version,
    Run(Invocation),
}

/// DWARFLINE - address to source line mapping for native binaries
fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let program_name = args.first().map_or("dwarfline", String::as_str);

    let invocation = match parse_args(args.get(1..).unwrap_or_default()) {
        Ok(Action::Run(invocation)) => invocation,
        Ok(Action::Version) => {
            println!("{} v{}", dwarfline::PKG_NAME, dwarfline::VERSION);
            println!("{}", dwarfline::PKG_DESCRIPTION);
            process::exit(0);
        }
        Ok(Action::Help) => {
            print_usage(program_name);
            process::exit(0);
        }
        Err(err) => {
            eprintln!("error: {}", err);
            print_usage(program_name);
            process::exit(1);
        }
    };

    dwarfline::init_logging(invocation.level);
    debug!("Running {:?} against {}", invocation.command, invocation.binary);

    let mapping = loader::load(&invocation.binary)?;
    for line in run(&mapping, &invocation.command)? {
        println!("{}", line);
    }

    Ok(())
}

/// Split flags from positional arguments
fn parse_args(args: &[String]) -> Result<Action> {
    let mut level = LevelFilter::Info;
    let mut positional = Vec::new();

    for arg in args {
        match arg.as_str() {
            // Version
            "-v" | "-V" | "--version" => return Ok(Action::Version),
            // Help
            "-h" | "--help" => return Ok(Action::Help),
            "-d" | "--debug" => level = LevelFilter::Debug,
            "-q" | "--quiet" => level = LevelFilter::Warn,
            flag if is_flag(flag) => bail!("unknown option: {}", flag),
            _ => positional.push(arg.clone()),
        }
    }

    parse_invocation(level, &positional).map(Action::Run)
}

/// Options start with a dash; `-12` stays a (negative) line number
fn is_flag(arg: &str) -> bool {
    match arg.strip_prefix('-') {
        Some(rest) => rest.starts_with('-') || rest.starts_with(|c: char| c.is_ascii_alphabetic()),
        None => false,
    }
}

/// Turn positional arguments into an invocation
fn parse_invocation(level: LevelFilter, positional: &[String]) -> Result<Invocation> {
    let [binary, command, rest @ ..] = positional else {
        bail!("expected a binary and a command");
    };

    let command = match (command.as_str(), rest) {
        ("units", []) => Command::Units,
        ("addr", [address]) => Command::Addr(parse_address(address)?),
        ("next", [address]) => Command::Next(parse_address(address)?),
        ("stmt", [address]) => Command::Stmt(parse_address(address)?),
        ("line", [unit, line]) => Command::Line {
            unit: unit.clone(),
            line: line
                .parse()
                .with_context(|| format!("invalid line number '{}'", line))?,
        },
        (command, _) => bail!("unknown command or wrong arguments: {}", command),
    };

    Ok(Invocation {
        level,
        binary: binary.clone(),
        command,
    })
}

/// Parse a `0x`-prefixed hex or decimal address
fn parse_address(text: &str) -> Result<u64> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|err| anyhow!("invalid address '{}': {}", text, err))
}

/// Run a command and render its output lines
fn run<S: LineProgramSource>(mapping: &MachineCodeMapping<S>, command: &Command) -> Result<Vec<String>> {
    let output = match command {
        Command::Units => mapping
            .debug_info()
            .units()
            .iter()
            .map(|unit| {
                let low = unit
                    .low_address()
                    .map_or_else(|| "-".to_string(), |low| format!("{:#x}", low));
                let program = unit
                    .line_program_offset()
                    .map_or_else(|| "-".to_string(), |offset| format!("{:#x}", offset));
                format!("{:#010x} low_pc={} stmt_list={} {}", unit.offset(), low, program, unit.name().unwrap_or("<unnamed>"))
            })
            .collect(),
        Command::Addr(address) => mapping
            .source_line_ranges_for_address(*address)
            .iter()
            .map(|range| format!("{}:{}-{}", range.unit(), range.lines().start(), range.lines().end()))
            .collect(),
        Command::Line { unit, line } => {
            let compilation_unit = mapping
                .debug_info()
                .unit_by_name(unit)
                .ok_or_else(|| anyhow!("no compilation unit named '{}'", unit))?;
            let source_line = SourceLine::new(compilation_unit.clone(), *line);
            mapping
                .address_ranges_for_line(&source_line)
                .iter()
                .map(|range| format!("{:#x}-{:#x}", range.start(), range.end()))
                .collect()
        }
        Command::Next(address) => vec![render_address(mapping.next_statement_address(*address))],
        Command::Stmt(address) => vec![render_address(mapping.statement_address(*address))],
    };

    Ok(output)
}

fn render_address(address: u64) -> String {
    if address == NO_ADDRESS {
        "none".to_string()
    } else {
        format!("{:#x}", address)
    }
}

/// Print usage information
fn print_usage(program_name: &str) {
    println!("DWARFLINE - address to source line mapping for native binaries");
    println!("Usage: {} [options] <binary> <command>", program_name);
    println!();
    println!("Options:");
    println!("  -h, --help       Display this help message");
    println!("  -v, --version    Display version information");
    println!("  -d, --debug      Log debug output");
    println!("  -q, --quiet      Log warnings only");
    println!();
    println!("Commands:");
    println!("  units                List compilation units");
    println!("  addr <address>       Source lines at an address");
    println!("  line <unit> <line>   Address ranges of a source line");
    println!("  next <address>       Next statement after an address");
    println!("  stmt <address>       Statement containing an address");
}
