//! KEL expression tool
//!
//! Checks, completes and types KEL expressions against a domain model.
//!
//! Usage: `kel --registry <FILE> --scope <FILE> <COMMAND>`

use clap::Parser;
use std::process;
use tracing::error;

use kel_tools::commands::{Command, ServiceArgs, run};

#[derive(Parser, Debug)]
#[command(name = "kel")]
#[command(about = "Validate and explore KEL expressions", version = kel::VERSION)]
struct Cli {
    #[command(flatten)]
    service: ServiceArgs,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    kel_tools::init_logging();

    let cli = Cli::parse();

    let service = match cli.service.build() {
        Ok(service) => service,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    match run(&service, &cli.command) {
        Ok(outcome) => {
            if !outcome.output.is_empty() {
                println!("{}", outcome.output.trim_end());
            }
            if outcome.failed {
                process::exit(1);
            }
        }
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }
}
