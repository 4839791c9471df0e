use env_logger::{Builder, Env};
use log::error;
use std::process::exit;
use whl2conda::cli;

fn main() {
    let args = cli::parse();

    let default_level = if args.verbose {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };

    // Initialize logger, RUST_LOG still takes precedence
    Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .format_target(false)
        .init();

    if let Err(e) = cli::execute(&args) {
        error!("Error: {}", e);
        exit(1);
    }
}
