//! # chat-math - math formulas in chat messages
//!
//! Command-line front end for the segmentation pipeline:
//! - render a message (from `-m` or stdin) and print a JSON summary
//! - optionally write the rendered PNGs to a directory
//! - show the resolved configuration

mod cli;
mod run;

use clap::Parser;
use dotenv::dotenv;

use crate::cli::{Args, Commands};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv().ok();

    let args = Args::parse();
    run::init_logger(&args);

    let result = match &args.command {
        Some(Commands::Config) => run::run_config(&args),
        Some(Commands::Completions { shell }) => {
            run::run_completions(*shell);
            Ok(())
        }
        None => run::run_message(&args).await,
    };

    // User-facing message; exit uses Display not Debug
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
