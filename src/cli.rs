//! CLI argument parsing using clap derive macros

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{
    apply::ApplyIosCommand, build_android::BuildAndroidCommand, build_ios::BuildIosCommand,
    build_status::BuildStatusCommand, build_web::BuildWebCommand, GlobalOptions,
};

/// appship - configure native app projects and run standalone builds
#[derive(Parser, Debug)]
#[command(name = "appship")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Never prompt; assume the default answer
    #[arg(long, global = true)]
    pub non_interactive: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build and sign a standalone IPA for the Apple App Store
    #[command(name = "build:ios", visible_alias = "bi")]
    BuildIos(BuildIosCommand),

    /// Build a standalone APK or App Bundle for the Google Play Store
    #[command(name = "build:android", visible_alias = "ba")]
    BuildAndroid(BuildAndroidCommand),

    /// Build the web app for production
    #[command(name = "build:web")]
    BuildWeb(BuildWebCommand),

    /// Get the status of the latest build for the project
    #[command(name = "build:status", visible_alias = "bs")]
    BuildStatus(BuildStatusCommand),

    /// Apply iOS entitlements from the app manifest to the native project
    #[command(name = "apply:ios")]
    ApplyIos(ApplyIosCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        if self.no_color {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }

        let global = GlobalOptions {
            verbose: self.verbose,
            non_interactive: self.non_interactive,
        };

        match self.command {
            Commands::BuildIos(cmd) => cmd.execute(&global),
            Commands::BuildAndroid(cmd) => cmd.execute(&global),
            Commands::BuildWeb(cmd) => cmd.execute(&global),
            Commands::BuildStatus(cmd) => cmd.execute(&global),
            Commands::ApplyIos(cmd) => cmd.execute(&global),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_aliases_and_globals() {
        let cli = Cli::parse_from(["appship", "bi", "--non-interactive", "-v"]);
        assert!(matches!(cli.command, Commands::BuildIos(_)));
        assert!(cli.non_interactive);
        assert!(cli.verbose);

        let cli = Cli::parse_from(["appship", "ba", "-t", "app-bundle"]);
        assert!(matches!(cli.command, Commands::BuildAndroid(_)));

        let cli = Cli::parse_from(["appship", "bs", "./app"]);
        match cli.command {
            Commands::BuildStatus(cmd) => assert_eq!(cmd.project_dir, std::path::PathBuf::from("./app")),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
