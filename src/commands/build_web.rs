//! `build:web` command implementation
//!
//! Bundles the web app with webpack into `web-build/`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use super::GlobalOptions;
use crate::error::{codes, AppshipError};
use crate::exec::subprocess::{command_exists, run_command};
use crate::utils::terminal::{print_info, print_success, print_verbose};

/// Output directory of the bundler
pub const WEB_BUILD_DIR: &str = "web-build";
/// Persistent bundler cache
pub const WEBPACK_CACHE_DIR: &str = ".webpack-cache";

/// Build the web app for production
#[derive(Args, Debug)]
pub struct BuildWebCommand {
    /// Project directory
    #[arg(default_value = ".")]
    pub project_dir: PathBuf,

    /// Clear all cached build files and assets
    #[arg(short = 'c', long)]
    pub clear: bool,

    /// Prevent the generation of PWA assets
    #[arg(long)]
    pub no_pwa: bool,

    /// Turn dev mode on
    #[arg(short = 'd', long)]
    pub dev: bool,
}

impl BuildWebCommand {
    /// Arguments passed to `npx`
    fn webpack_args(&self) -> Vec<String> {
        let mode = if self.dev { "development" } else { "production" };
        vec![
            "webpack".to_string(),
            "--mode".to_string(),
            mode.to_string(),
            "--env".to_string(),
            format!("mode={}", mode),
            "--env".to_string(),
            format!("pwa={}", !self.no_pwa),
        ]
    }

    /// Execute the build:web command
    pub fn execute(self, global: &GlobalOptions) -> Result<()> {
        if self.clear {
            for removed in clear_web_caches(&self.project_dir)? {
                print_info(&format!("Removed {}", removed.display()));
            }
        }

        if !command_exists("npx") {
            return Err(AppshipError::command_error_with_hint(
                codes::BUILD_FAILED,
                "npx was not found in PATH",
                "Install Node.js (https://nodejs.org) to bundle the web app",
            )
            .into());
        }

        let args = self.webpack_args();
        print_verbose(global.verbose, &format!("Running npx {}", args.join(" ")));

        let node_env = if self.dev { "development" } else { "production" };
        let result = run_command("npx", &args, &self.project_dir, &[("NODE_ENV", node_env)])?;
        if !result.success {
            return Err(AppshipError::command_error(
                codes::BUILD_FAILED,
                format!("webpack exited with code {}", result.exit_code),
            )
            .into());
        }

        print_success(&format!(
            "Web build written to {} in {:.1}s",
            self.project_dir.join(WEB_BUILD_DIR).display(),
            result.duration.as_secs_f64()
        ));
        Ok(())
    }
}

/// Remove the bundler output and cache directories, returning what was removed
pub fn clear_web_caches(project_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for name in [WEB_BUILD_DIR, WEBPACK_CACHE_DIR] {
        let dir = project_dir.join(name);
        if dir.is_dir() {
            fs::remove_dir_all(&dir).with_context(|| format!("Failed to remove {}", dir.display()))?;
            removed.push(dir);
        }
    }
    Ok(removed)
}
