//! shecc — self-hosting C subset compiler for ARMv7-A and RV32IM Linux.

use clap::Parser;
use shecc::cli::{Cli, EXIT_FAILURE, EXIT_SUCCESS};
use shecc::{diagnostics, pipeline};
use shecc_ir::{CompileOptions, Context};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "shecc=debug" } else { "shecc=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_level.parse().unwrap()))
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    let options = CompileOptions {
        target: cli.target.into(),
        output_path: cli.output.clone(),
        dump_ir: cli.dump_ir,
        include_libc: !cli.no_libc,
    };
    let mut ctx = Context::new(options);

    let exit_code = match pipeline::run(&cli.input, &mut ctx) {
        Ok(()) => EXIT_SUCCESS,
        Err(err) => {
            eprintln!("{}", diagnostics::format_error(&err, &ctx));
            EXIT_FAILURE
        }
    };

    std::process::exit(exit_code);
}
