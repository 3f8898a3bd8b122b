//! # Active/Idle Workload Generator (multi-threaded)
//!
//! `active_idle -p <threads> -t <seconds>`
//!
//! Starts `threads` phase threads that alternate Busy and Idle phases behind a common
//! start barrier. Thread 0 keeps time and raises the shutdown flag once `seconds` have
//! elapsed; the other threads leave at their next cycle boundary.
//!
//! ## Outputs
//! - `--trace FILE`: CSV of every marker (otherwise markers go to the `marker` log target).
//! - `--summary FILE`: one appended CSV row per run.
//! - Per-thread table on stdout.
//!
//! Exit status is 0 on success and 1 on any error, bad arguments included.

use std::process::ExitCode;

use active_idle::{cli::MultiThreadArgs, run};
use clap::Parser;
use log::error;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match MultiThreadArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    println!(
        "Starting Active-Idle simulation with {} threads for {} seconds.",
        args.threads, args.seconds
    );
    let (config, outputs) = args.into_config();

    match run(&config, &outputs) {
        Ok(summary) => {
            summary.print_report();
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Run aborted: {}", e);
            eprintln!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

