//! # Active/Idle Workload Generator (single-threaded)
//!
//! `active_idle_singlet -t <seconds>`
//!
//! One thread, one scan pass per Busy phase and a single one-second nap per Idle phase.
//! `seconds` becomes a fixed cycle count, so the run length does not depend on how fast
//! the host executes the busy kernel.

use std::process::ExitCode;

use active_idle::{cli::SingleThreadArgs, config::cycles_for_seconds, run};
use clap::Parser;
use log::error;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match SingleThreadArgs::try_parse() {
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
    let seconds = args.seconds;
    let (config, outputs) = args.into_config();
    println!(
        "Starting Single-threaded Active-Idle simulation for {} cycles ({} seconds).",
        cycles_for_seconds(seconds),
        seconds
    );

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
