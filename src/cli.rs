//! Command-line surfaces of the two binaries.
//!
//! Range checks live in clap's value parsers so bad input is rejected (usage on stderr,
//! exit 1) before a configuration exists.

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::{
    config::{DEFAULT_SECONDS, DEFAULT_THREADS, RunConfiguration, cycles_for_seconds},
    runner::OutputOptions,
};

/// Multi-threaded active/idle workload: every thread alternates Busy and Idle phases
/// until the wall-clock budget runs out.
#[derive(Debug, Parser)]
#[command(name = "active_idle", version)]
pub struct MultiThreadArgs {
    /// Number of phase threads, including the coordinator
    #[arg(
        short = 'p',
        long = "threads",
        default_value_t = DEFAULT_THREADS as u32,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub threads: u32,

    /// Wall-clock budget in seconds
    #[arg(
        short = 't',
        long = "seconds",
        default_value_t = DEFAULT_SECONDS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub seconds: u64,

    /// Write every marker to this CSV trace
    #[arg(long, value_name = "FILE")]
    pub trace: Option<PathBuf>,

    /// Append a one-row run summary to this CSV
    #[arg(long, value_name = "FILE")]
    pub summary: Option<PathBuf>,

    /// Base RNG seed (defaults to the current time)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Pin thread i to core i modulo the core count
    #[arg(long)]
    pub pin_cores: bool,
}

impl MultiThreadArgs {
    pub fn into_config(self) -> (RunConfiguration, OutputOptions) {
        let config = RunConfiguration::wall_clock(
            self.threads as usize,
            Duration::from_secs(self.seconds),
        )
        .with_seed(self.seed)
        .with_core_pinning(self.pin_cores);
        let outputs = OutputOptions {
            trace: self.trace,
            summary: self.summary,
        };
        (config, outputs)
    }
}

/// Single-threaded active/idle workload: a fixed number of short Busy/Idle cycles.
#[derive(Debug, Parser)]
#[command(name = "active_idle_singlet", version)]
pub struct SingleThreadArgs {
    /// Run length in seconds, converted to a cycle count
    #[arg(
        short = 't',
        long = "seconds",
        default_value_t = DEFAULT_SECONDS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub seconds: u64,

    /// Write every marker to this CSV trace
    #[arg(long, value_name = "FILE")]
    pub trace: Option<PathBuf>,

    /// Append a one-row run summary to this CSV
    #[arg(long, value_name = "FILE")]
    pub summary: Option<PathBuf>,

    /// Base RNG seed (defaults to the current time)
    #[arg(long)]
    pub seed: Option<u64>,
}

impl SingleThreadArgs {
    pub fn into_config(self) -> (RunConfiguration, OutputOptions) {
        let config =
            RunConfiguration::iteration(1, cycles_for_seconds(self.seconds)).with_seed(self.seed);
        let outputs = OutputOptions {
            trace: self.trace,
            summary: self.summary,
        };
        (config, outputs)
    }
}
