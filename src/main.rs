use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::{fs, io};

use clap::Parser;
use emu::cpu::arm_core::{ArmCore, StepResult};
use emu::cpu::exception::Exception;
use emu::memory::flat_memory::FlatMemory;
use emu::memory::{Endianness, Memory, MemoryError};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
enum HostError {
    #[error("cannot read image {}: {source}", path.display())]
    Image { path: PathBuf, source: io::Error },
    #[error("image does not fit in memory: {0}")]
    Load(#[from] MemoryError),
    #[error("cannot serialize the final state: {0}")]
    Dump(#[from] serde_json::Error),
    #[error("step limit reached after {0} instructions")]
    StepLimit(u64),
}

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Raw binary image of ARM code
    image: PathBuf,

    /// Memory size in bytes
    #[arg(long, default_value = "0x100000", value_parser = parse_number)]
    memory_size: u32,

    /// Assemble halfwords and words big-endian
    #[arg(long)]
    big_endian: bool,

    /// Address the image is copied to
    #[arg(long, default_value = "0", value_parser = parse_number)]
    load_address: u32,

    /// First instruction to execute, defaults to the load address
    #[arg(long, value_parser = parse_number)]
    entry: Option<u32>,

    /// Start from the reset vector instead of the entry point
    #[arg(long)]
    reset: bool,

    /// Give up after this many instructions
    #[arg(long)]
    max_steps: Option<u64>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print the final CPU state as JSON
    #[arg(long)]
    dump_state: bool,
}

/// Accepts decimal or `0x`-prefixed hexadecimal.
fn parse_number(value: &str) -> Result<u32, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(&hex.replace('_', ""), 16),
        None => value.replace('_', "").parse(),
    };

    parsed.map_err(|e| format!("invalid number {value:?}: {e}"))
}

fn init_tracing(log_file: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let directory = path.parent().unwrap_or_else(|| Path::new("."));
            let file_name = path.file_name().unwrap_or_else(|| OsStr::new("armator.log"));
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();

            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();

            None
        }
    }
}

fn run(args: &Args) -> Result<(), HostError> {
    let image = fs::read(&args.image).map_err(|source| HostError::Image {
        path: args.image.clone(),
        source,
    })?;

    let endianness = if args.big_endian {
        Endianness::Big
    } else {
        Endianness::Little
    };
    let mut memory = FlatMemory::new(args.memory_size, endianness);
    memory.load(args.load_address, &image)?;
    tracing::info!(
        "loaded {} bytes at 0x{:08X} ({:?})",
        image.len(),
        args.load_address,
        memory.endianness()
    );

    let mut cpu = ArmCore::new(memory);
    if args.reset {
        cpu.raise(Exception::Reset);
    } else {
        cpu.registers
            .set_program_counter(args.entry.unwrap_or(args.load_address));
    }

    let mut steps: u64 = 0;
    let outcome = loop {
        if args.max_steps.is_some_and(|limit| steps >= limit) {
            break Err(HostError::StepLimit(steps));
        }

        steps += 1;
        match cpu.step() {
            StepResult::Executed => {}
            StepResult::Exception(exception) => {
                tracing::debug!("step {steps}: {exception} (cause {})", exception.code());
            }
            StepResult::Halted => break Ok(()),
        }
    };

    tracing::info!("{steps} instructions executed");

    if args.dump_state {
        println!("{}", serde_json::to_string_pretty(&cpu.snapshot())?);
    }

    outcome
}

fn main() -> ExitCode {
    let args = Args::parse();
    let _guard = init_tracing(args.log_file.as_deref());

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("armator: {error}");
            ExitCode::FAILURE
        }
    }
}
