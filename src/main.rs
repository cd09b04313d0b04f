//! appship - native project configuration and standalone build CLI
//!
//! ## Architecture
//!
//! ```text
//! cli.rs → commands/ → builders/ → service/ (remote build API)
//!                    → ios/      (entitlements, Xcode project)
//! ```

mod builders;
mod cli;
mod commands;
mod config;
mod error;
mod exec;
mod ios;
mod service;
mod utils;
mod warnings;
mod workflow;

use clap::Parser;

use cli::Cli;
use error::AppshipError;
use utils::terminal::print_error;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = cli.execute() {
        match err.downcast_ref::<AppshipError>() {
            Some(appship_err) => appship_err.display_with_hints(),
            None => print_error(&format!("{:#}", err)),
        }
        std::process::exit(1);
    }
}
