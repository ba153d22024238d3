//! CLI definitions and argument types.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use shecc_ir::Target;

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "shecc")]
#[command(about = "Self-hosting C subset compiler for ARMv7-A and RV32IM Linux")]
#[command(version)]
pub struct Cli {
    /// C source file to compile
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Output path for the produced ELF executable
    #[arg(short, long, default_value = "a.out")]
    pub output: PathBuf,

    /// Target architecture
    #[arg(long, value_enum, default_value = "arm")]
    pub target: TargetArg,

    /// Print the phase-1 IR for each function before lowering
    #[arg(long)]
    pub dump_ir: bool,

    /// Do not prepend the bundled libc implementation
    #[arg(long)]
    pub no_libc: bool,

    /// Enable verbose output (sets RUST_LOG=debug)
    #[arg(short, long)]
    pub verbose: bool,
}

/// Target architecture argument.
#[derive(Clone, Copy, Debug, ValueEnum, Default)]
pub enum TargetArg {
    /// ARMv7-A (32-bit)
    #[default]
    Arm,
    /// RV32IM (32-bit RISC-V)
    Riscv32,
}

impl From<TargetArg> for Target {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Arm => Target::Arm,
            TargetArg::Riscv32 => Target::RiscV32,
        }
    }
}
