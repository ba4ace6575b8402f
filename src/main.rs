use clap::Parser;
use log::{info, LevelFilter};
use snafu::ErrorCompat;
use std::error::Error;

mod args;
mod survey;

use args::Args;

fn main() {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
    info!("args: {:?}", args);

    if let Err(e) = survey::run(&args) {
        eprintln!("An error occured: {}", e);
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        if let Some(bt) = ErrorCompat::backtrace(&*e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
