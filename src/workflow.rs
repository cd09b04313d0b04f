//! Managed vs bare workflow detection and the build-service warning

use std::path::Path;

use anyhow::Result;

use crate::service::Platform;
use crate::utils::terminal::{self, print_warning, print_warning_headline};

/// How the native projects of an app are owned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    /// Native projects are generated by the tool and never committed
    Managed,
    /// The developer owns and edits `ios/` and `android/`
    Bare,
}

/// Detect the workflow from the presence of native project directories
pub fn detect_workflow(project_dir: &Path) -> Workflow {
    if project_dir.join("ios").is_dir() || project_dir.join("android").is_dir() {
        Workflow::Bare
    } else {
        Workflow::Managed
    }
}

/// Source of yes/no answers
pub trait Prompt {
    fn confirm(&mut self, message: &str) -> Result<bool>;
}

/// Asks on the terminal
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn confirm(&mut self, message: &str) -> Result<bool> {
        terminal::confirm(message)
    }
}

/// Warn when a bare project is sent to the build service.
///
/// Returns `true` when the command should stop.
pub fn maybe_bail_on_workflow_warning(
    project_dir: &Path,
    platform: Platform,
    non_interactive: bool,
    prompt: &mut dyn Prompt,
) -> Result<bool> {
    if detect_workflow(project_dir) == Workflow::Managed {
        return Ok(false);
    }

    let ide = match platform {
        Platform::Ios => "Xcode",
        Platform::Android => "Android Studio",
    };
    print_warning_headline(&format!(
        "⚠️  appship build:{} currently only supports managed workflow apps.",
        platform
    ));
    print_warning(
        "If you proceed with this command, we can run the build for you but it will not include \
         any custom native modules or changes that you have made to your local native projects.",
    );
    print_warning(&format!(
        "Unless you are sure that you know what you are doing, we recommend aborting the build \
         and doing a native release build through {}.",
        ide
    ));

    if non_interactive {
        print_warning("Skipping confirmation prompt because non-interactive mode is enabled.");
        return Ok(false);
    }

    let proceed = prompt.confirm("Would you like to proceed?")?;
    Ok(!proceed)
}
