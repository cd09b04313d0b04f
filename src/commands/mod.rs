//! Command implementations
//!
//! Each command module provides a clap-derived struct and execute method.

pub mod apply;
pub mod build_android;
pub mod build_ios;
pub mod build_status;
pub mod build_web;

use std::path::Path;

use anyhow::Result;

use crate::builders::{BaseBuilder, PlatformBuilder};
use crate::service::session::load_session;
use crate::service::{api_base_url, HttpBuildService, Platform};
use crate::utils::terminal;
use crate::workflow::{maybe_bail_on_workflow_warning, TerminalPrompt};

/// Options shared by every command
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalOptions {
    pub verbose: bool,
    pub non_interactive: bool,
}

impl GlobalOptions {
    /// Non-interactive when asked to be, or when no one is at the terminal
    pub fn is_non_interactive(&self) -> bool {
        self.non_interactive || !terminal::is_interactive()
    }
}

/// Run the workflow check unless skipped. Returns `true` when the user
/// declined to continue.
fn bail_on_workflow(
    project_dir: &Path,
    platform: Platform,
    skip_workflow_check: bool,
    global: &GlobalOptions,
) -> Result<bool> {
    if skip_workflow_check {
        return Ok(false);
    }
    maybe_bail_on_workflow_warning(
        project_dir,
        platform,
        global.is_non_interactive(),
        &mut TerminalPrompt,
    )
}

/// Log in and hand the builder to the remote build service
fn run_remote_build(project_dir: &Path, builder: &dyn PlatformBuilder, global: &GlobalOptions) -> Result<()> {
    let session = load_session()?;
    if let Some(ref username) = session.username {
        terminal::print_verbose(global.verbose, &format!("Logged in as {}", username));
    }
    let service = HttpBuildService::new(api_base_url(), session)?;
    BaseBuilder::new(project_dir, &service, global.verbose).run(builder)?;
    Ok(())
}
