//! acc8 Emulator - CLI Entry Point
//!
//! Commands:
//! - `acc8-emu run <program>` - Run a binary image or assembly source
//! - `acc8-emu asm <source>` - Assemble to a binary image
//! - `acc8-emu disasm <image>` - Disassemble a binary image

use acc8::{AddressPolicy, Cpu, EmuConfig};
use clap::{Args, Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::exit;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "acc8-emu")]
#[command(version)]
#[command(about = "An emulator for a tiny 8-bit accumulator instruction set")]
struct Cli {
    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until the program counter leaves it
    Run {
        /// Binary image, or assembly source ending in .s or .asm
        program: PathBuf,
        #[command(flatten)]
        machine: MachineArgs,
        /// Log every executed instruction
        #[arg(short, long)]
        trace: bool,
        /// Print the final state as JSON instead of the register listing
        #[arg(long)]
        json: bool,
        /// Inspect memory interactively after the run
        #[arg(short, long)]
        inspect: bool,
    },
    /// Assemble source to a binary image
    Asm {
        /// Path to the source file
        source: PathBuf,
        /// Output image (default: <source>.bin)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Disassemble a binary image
    Disasm {
        /// Path to the image
        image: PathBuf,
    },
}

#[derive(Args)]
struct MachineArgs {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Memory size as a power of two, in words
    #[arg(long)]
    address_bits: Option<u8>,
    /// Stop after this many instructions
    #[arg(long, conflicts_with = "unlimited")]
    max_steps: Option<u64>,
    /// Run without an instruction limit
    #[arg(long)]
    unlimited: bool,
    /// Wrap out-of-range load/store addresses instead of failing
    #[arg(long)]
    wrap: bool,
}

impl MachineArgs {
    /// Config file (or defaults) with command-line overrides applied.
    fn resolve(&self) -> Result<EmuConfig, acc8::ConfigError> {
        let mut config = match &self.config {
            Some(path) => EmuConfig::load(path)?,
            None => EmuConfig::default(),
        };
        if let Some(bits) = self.address_bits {
            config.address_bits = bits;
        }
        if let Some(steps) = self.max_steps {
            config.max_steps = Some(steps);
        }
        if self.unlimited {
            config.max_steps = None;
        }
        if self.wrap {
            config.address_policy = AddressPolicy::Wrap;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() {
    let cli = Cli::parse();

    let trace = matches!(cli.command, Commands::Run { trace: true, .. });
    init_logging(cli.verbose, trace);

    match cli.command {
        Commands::Run { program, machine, json, inspect, .. } => {
            run_program(&program, &machine, json, inspect);
        }
        Commands::Asm { source, output } => {
            assemble_file(&source, output);
        }
        Commands::Disasm { image } => {
            disassemble_file(&image);
        }
    }
}

/// Log to stderr so stdout carries only program output.
fn init_logging(verbose: u8, trace: bool) {
    let level = match (trace, verbose) {
        (true, _) | (_, 2..) => Some("trace"),
        (false, 1) => Some("debug"),
        (false, 0) => None,
    };
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("❌ {}", message);
    exit(1);
}

fn is_source(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("s" | "asm")
    )
}

/// Read a program, assembling it first if it is source text.
fn read_program(path: &Path) -> Vec<u8> {
    if is_source(path) {
        let source = std::fs::read_to_string(path)
            .unwrap_or_else(|e| fail(format!("Failed to read {}: {}", path.display(), e)));
        let program = acc8::assemble(&source)
            .unwrap_or_else(|e| fail(format!("Assembly error: {}", e)));
        if program.is_empty() {
            fail(format!("{} contains no instructions", path.display()));
        }
        tracing::debug!(bytes = program.len(), "assembled");
        program
    } else {
        acc8::load_image(path).unwrap_or_else(|e| fail(e))
    }
}

fn run_program(path: &Path, machine: &MachineArgs, json: bool, inspect: bool) {
    let config = machine.resolve().unwrap_or_else(|e| fail(e));
    let program = read_program(path);

    let mut cpu = Cpu::with_config(&config).unwrap_or_else(|e| fail(e));
    if let Err(e) = cpu.load(&program) {
        fail(format!("Failed to load program: {}", e));
    }

    let result = cpu.run();

    let stdin = std::io::stdin();
    let inspector = inspect.then(|| stdin.lock());
    if let Err(e) = report_run(&cpu, json, inspector, std::io::stdout().lock()) {
        fail(e);
    }

    if let Err(e) = result {
        fail(format!("CPU error at PC={}: {}", cpu.pc(), e));
    }
}

/// Print the final state, then open the inspector on `inspector` if given.
///
/// Called whether or not the run succeeded, so a faulted or runaway
/// program can still be examined.
fn report_run<R: BufRead, W: Write>(
    cpu: &Cpu,
    json: bool,
    inspector: Option<R>,
    mut out: W,
) -> Result<(), String> {
    let io_error = |e: std::io::Error| format!("Output error: {}", e);
    if json {
        let text = serde_json::to_string_pretty(&cpu.snapshot())
            .map_err(|e| format!("Failed to encode state: {}", e))?;
        writeln!(out, "{}", text).map_err(io_error)?;
    } else {
        write!(out, "{}", cpu.register_dump()).map_err(io_error)?;
    }

    if let Some(input) = inspector {
        acc8::run_inspector(cpu.memory(), input, &mut out)
            .map_err(|e| format!("Inspector I/O error: {}", e))?;
    }
    Ok(())
}

fn assemble_file(source_path: &Path, output: Option<PathBuf>) {
    let source = std::fs::read_to_string(source_path)
        .unwrap_or_else(|e| fail(format!("Failed to read {}: {}", source_path.display(), e)));

    let program = acc8::assemble(&source)
        .unwrap_or_else(|e| fail(format!("Assembly error: {}", e)));

    let output_path = output.unwrap_or_else(|| {
        let mut name = source_path.as_os_str().to_owned();
        name.push(".bin");
        PathBuf::from(name)
    });

    if let Err(e) = acc8::save_image(&output_path, &program) {
        fail(e);
    }

    println!("✓ Assembled {} bytes to {}", program.len(), output_path.display());
}

fn disassemble_file(image_path: &Path) {
    let program = acc8::load_image(image_path).unwrap_or_else(|e| fail(e));
    print!("{}", acc8::disassemble(&program));
}
