//! R0N IP filter binary entry point.
//!
//! Usage: `r0n-ipfilter <config.toml> <address>...`

use clap::Parser;
use r0n_ipfilter::config::ConfigLoader;
use r0n_ipfilter::filter::{Decision, RequestInfo};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Check client addresses against an IP filter configuration.
#[derive(Debug, Parser)]
#[command(name = "r0n-ipfilter")]
#[command(version, about = "Check client addresses against an IP filter configuration")]
struct Args {
    /// Path to the TOML configuration file
    config: PathBuf,

    /// Client addresses to check
    #[arg(required = true)]
    addresses: Vec<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

/// Evaluates each address given on the command line against a configuration
/// file. Exits with failure if any address is denied.
fn main() -> ExitCode {
    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    let filter = match ConfigLoader::new().load_filter(&args.config) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        },
    };

    let mut denied = false;
    for address in &args.addresses {
        let request = RequestInfo::new().with_remote_addr(address.as_str());
        match filter.check(&request) {
            Decision::Deny(err) => {
                denied = true;
                println!("{address} denied: {err}");
            },
            Decision::Permit { .. } | Decision::Excluded { .. } => {
                println!("{address} allowed");
            },
        }
    }

    if denied {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
