//! `apply:ios` command implementation
//!
//! Writes the manifest's iOS capabilities into the native project's
//! entitlements file, creating and registering one when missing.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::GlobalOptions;
use crate::config::validation::validate_ios_manifest;
use crate::config::AppManifest;
use crate::ios::entitlements::configure_entitlements;
use crate::utils::terminal::{print_success, print_verbose};
use crate::warnings::WarningAggregator;

/// Apply iOS entitlements from the app manifest to the native project
#[derive(Args, Debug)]
pub struct ApplyIosCommand {
    /// Project directory
    #[arg(default_value = ".")]
    pub project_dir: PathBuf,

    /// Apple Team ID used for team-scoped entitlements
    #[arg(long)]
    pub team_id: Option<String>,
}

impl ApplyIosCommand {
    /// Execute the apply:ios command
    pub fn execute(self, global: &GlobalOptions) -> Result<()> {
        let manifest = AppManifest::load_from_project(&self.project_dir)?;
        let mut warnings = WarningAggregator::default();

        validate_ios_manifest(&manifest, &mut warnings)?;
        let path = configure_entitlements(
            &self.project_dir,
            &manifest,
            self.team_id.as_deref(),
            &mut warnings,
        )?;
        if !warnings.is_empty() {
            print_verbose(global.verbose, &format!("{} warning(s)", warnings.len()));
            warnings.flush();
        }

        print_success(&format!("Updated {}", path.display()));
        Ok(())
    }
}
