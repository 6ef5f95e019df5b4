//! `lockstep`: drive a candidate and a reference emulator debugger in
//! lockstep and report the first register-state divergence.
//!
//! The run has no success terminus: it steps until the states differ (exit
//! 1, the finding), the user interrupts it (exit 0), or a protocol failure
//! aborts it (exit 2, with both sessions' raw output on stderr).

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use lockstep_harness::{interrupt, run, HarnessConfig, HarnessError, Outcome, ReplDriver};
use lockstep_protocol::{parse_hex16, Origin, RunMode, ToolDialect};
use lockstep_session::Session;

#[derive(Debug, Parser)]
#[command(
    name = "lockstep",
    about = "Step two emulator debuggers in lockstep until their register states diverge"
)]
struct Args {
    /// Candidate emulator executable (the build under test).
    #[arg(long)]
    candidate: PathBuf,

    /// Reference emulator executable (treated as ground truth).
    #[arg(long)]
    reference: PathBuf,

    /// ROM / test image to run on both sides.
    rom: PathBuf,

    /// Start address where both sides align (hex, `0x` optional).
    #[arg(long, value_parser = parse_addr)]
    start_addr: u16,

    /// Candidate-side start address override, for tools that report the
    /// same point differently.
    #[arg(long, value_parser = parse_addr)]
    candidate_start_addr: Option<u16>,

    /// Reference-side start address override.
    #[arg(long, value_parser = parse_addr)]
    reference_start_addr: Option<u16>,

    /// How the candidate brings the image up.
    #[arg(long, value_enum, default_value = "direct")]
    mode: Mode,

    /// Boot ROM image; required with `--mode boot`.
    #[arg(long, required_if_eq("mode", "boot"))]
    boot_rom: Option<PathBuf>,

    /// Known-divergent address (hex) where the candidate's AF is forced to
    /// the reference's before comparing. Repeatable; empty by default, and
    /// an AF mismatch anywhere else is still reported.
    #[arg(long = "reconcile-af", value_name = "ADDR", value_parser = parse_addr)]
    reconcile_af: Vec<u16>,

    /// Seconds to wait for any expected debugger output before aborting.
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Execute the boot ROM first; the image is mapped behind it.
    Boot,
    /// Load the image directly and start from its entry point.
    Direct,
}

impl From<Mode> for RunMode {
    fn from(mode: Mode) -> RunMode {
        match mode {
            Mode::Boot => RunMode::Boot,
            Mode::Direct => RunMode::Direct,
        }
    }
}

fn parse_addr(raw: &str) -> Result<u16, String> {
    parse_hex16(raw, "address").map_err(|err| err.to_string())
}

fn main() -> ExitCode {
    // Product output (the step trace and the divergence report) goes to
    // stdout; diagnostics stay on stderr.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match drive(Args::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("lockstep: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn drive(args: Args) -> anyhow::Result<ExitCode> {
    let mode = RunMode::from(args.mode);
    let timeout = Duration::from_secs(args.timeout_secs);

    let candidate_dialect = ToolDialect::gameboy_emu();
    let reference_dialect = ToolDialect::gddb();

    let config = HarnessConfig {
        candidate_start: args.candidate_start_addr.unwrap_or(args.start_addr),
        reference_start: args.reference_start_addr.unwrap_or(args.start_addr),
        reconcile_af: args.reconcile_af.iter().copied().collect(),
        timeout,
    };

    let candidate_session = Session::spawn(
        launch(
            &args.candidate,
            &candidate_dialect,
            &args.rom,
            mode,
            args.boot_rom.as_deref(),
        ),
        "candidate",
    )
    .context("spawning candidate")?;
    let reference_session = Session::spawn(
        launch(
            &args.reference,
            &reference_dialect,
            &args.rom,
            mode,
            args.boot_rom.as_deref(),
        ),
        "reference",
    )
    .context("spawning reference")?;

    let mut candidate = ReplDriver::new(
        candidate_session,
        candidate_dialect,
        Origin::Candidate,
        timeout,
    );
    let mut reference = ReplDriver::new(
        reference_session,
        reference_dialect,
        Origin::Reference,
        timeout,
    );

    let stop = interrupt::install();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match run(&mut candidate, &mut reference, &config, stop, &mut out) {
        Ok(Outcome::Interrupted) => {
            out.flush()?;
            tracing::info!("interrupted before any divergence");
            Ok(ExitCode::SUCCESS)
        }
        Ok(Outcome::Diverged(divergence)) => {
            write!(out, "{}", divergence.render())?;
            out.flush()?;
            Ok(ExitCode::from(1))
        }
        Err(err) => {
            out.flush()?;
            report_abort(&err, &candidate, &reference);
            Ok(ExitCode::from(2))
        }
    }
}

fn launch(
    exe: &Path,
    dialect: &ToolDialect,
    rom: &Path,
    mode: RunMode,
    boot_rom: Option<&Path>,
) -> Command {
    let mut command = Command::new(exe);
    command.args(dialect.launch_args(rom, mode, boot_rom));
    command
}

/// Aborts surface the full raw output of both sessions so protocol drift
/// can be diagnosed without rerunning.
fn report_abort(
    err: &HarnessError,
    candidate: &ReplDriver<Session>,
    reference: &ReplDriver<Session>,
) {
    eprintln!("lockstep aborted: {err}");
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
    eprintln!("--- candidate raw output ---");
    eprintln!("{}", candidate.buffer_snapshot());
    eprintln!("--- reference raw output ---");
    eprintln!("{}", reference.buffer_snapshot());
}
