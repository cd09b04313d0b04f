//! `build:status` command implementation

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::GlobalOptions;
use crate::builders::BaseBuilder;
use crate::config::validation::validate_optional_public_url;
use crate::service::session::load_session;
use crate::service::{api_base_url, HttpBuildService};

/// Get the status of the latest build for the project
#[derive(Args, Debug)]
pub struct BuildStatusCommand {
    /// Project directory
    #[arg(default_value = ".")]
    pub project_dir: PathBuf,

    /// The URL of an externally hosted manifest (for self-hosted apps)
    #[arg(long)]
    pub public_url: Option<String>,
}

impl BuildStatusCommand {
    /// Execute the build:status command
    pub fn execute(self, global: &GlobalOptions) -> Result<()> {
        validate_optional_public_url(self.public_url.as_deref())?;

        let session = load_session()?;
        let service = HttpBuildService::new(api_base_url(), session)?;
        BaseBuilder::new(&self.project_dir, &service, global.verbose)
            .command_check_status(self.public_url.as_deref())?;
        Ok(())
    }
}
