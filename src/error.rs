//! Error types and helpers for user-friendly error messages
//!
//! Command errors carry a stable code (e.g. `INVALID_PUBLIC_URL`) so that
//! callers and tests can match on the failure without parsing the message.

use thiserror::Error;

/// Stable codes attached to [`AppshipError::Command`]
pub mod codes {
    pub const INVALID_PUBLIC_URL: &str = "INVALID_PUBLIC_URL";
    pub const INVALID_RELEASE_CHANNEL: &str = "INVALID_RELEASE_CHANNEL";
    pub const CONFLICTING_FLAGS: &str = "CONFLICTING_FLAGS";
    pub const MISSING_CREDENTIAL_FILE: &str = "MISSING_CREDENTIAL_FILE";
    pub const MISSING_ENV_VAR: &str = "MISSING_ENV_VAR";
    pub const MISSING_FLAG: &str = "MISSING_FLAG";
    pub const NOT_LOGGED_IN: &str = "NOT_LOGGED_IN";
    pub const BUILD_FAILED: &str = "BUILD_FAILED";
}

/// Custom error types with helpful context and suggestions
#[derive(Error, Debug)]
pub enum AppshipError {
    /// Invalid user input on the command line
    #[error("{message}")]
    Command {
        code: &'static str,
        message: String,
        hint: Option<String>,
    },

    /// Application manifest errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
        hint: Option<String>,
    },

    /// Native project layout does not match expectations
    #[error("Invalid project structure: {message}")]
    ProjectStructure {
        message: String,
        expected: Vec<String>,
        hint: String,
    },

    /// Remote build service rejected a request
    #[error("Build service error: {message}")]
    Service {
        message: String,
        status: Option<u16>,
        hint: Option<String>,
    },
}

impl AppshipError {
    /// Create a command error
    pub fn command_error(code: &'static str, message: impl Into<String>) -> Self {
        Self::Command {
            code,
            message: message.into(),
            hint: None,
        }
    }

    /// Create a command error with a hint
    pub fn command_error_with_hint(
        code: &'static str,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self::Command {
            code,
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Create a configuration error with source and hint
    pub fn config_error_with_hint(
        message: impl Into<String>,
        source: Option<anyhow::Error>,
        hint: impl Into<String>,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source,
            hint: Some(hint.into()),
        }
    }

    /// Create a project structure error
    pub fn project_structure_error(
        message: impl Into<String>,
        expected: Vec<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self::ProjectStructure {
            message: message.into(),
            expected,
            hint: hint.into(),
        }
    }

    /// Create a build service error
    pub fn service_error(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Service {
            message: message.into(),
            status,
            hint: None,
        }
    }

    /// Stable code for command errors
    pub fn code(&self) -> Option<&'static str> {
        match self {
            AppshipError::Command { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Display error with formatting and hints
    pub fn display_with_hints(&self) {
        use console::style;

        eprintln!("\n{} {}", style("ERROR:").red().bold(), self);
        if let Some(code) = self.code() {
            eprintln!("{} {}", style("CODE:").dim(), code);
        }

        match self {
            AppshipError::Command { hint, .. }
            | AppshipError::Config { hint, .. }
            | AppshipError::Service { hint, .. } => {
                if let Some(h) = hint {
                    eprintln!("\n{} {}", style("HINT:").yellow().bold(), h);
                }
            }
            AppshipError::ProjectStructure { hint, .. } => {
                eprintln!("\n{} {}", style("HINT:").yellow().bold(), hint);
            }
        }

        if let AppshipError::ProjectStructure { expected, .. } = self {
            if !expected.is_empty() {
                eprintln!("\n{}", style("EXPECTED:").cyan().bold());
                for exp in expected {
                    eprintln!("  • {}", exp);
                }
            }
        }

        eprintln!();
    }
}

/// Helper trait for adding hints to Result types
pub trait ResultExt<T> {
    /// Turn the error into a configuration error carrying a hint
    fn with_hint(self, hint: impl Into<String>) -> Result<T, AppshipError>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_hint(self, hint: impl Into<String>) -> Result<T, AppshipError> {
        self.map_err(|e| AppshipError::config_error_with_hint(e.to_string(), Some(e.into()), hint))
    }
}

/// Common hints for frequent errors
pub mod hints {
    /// Hint for a non-HTTPS `--public-url`
    pub fn public_url() -> &'static str {
        "Self-hosted manifests must be served over HTTPS, e.g. --public-url https://example.com/manifest.json"
    }

    /// Hint for an invalid release channel
    pub fn release_channel() -> &'static str {
        "Use a name like 'default', 'prod-1' or 'staging.2'.\n\
         It must start with a lowercase letter or digit."
    }

    /// Hint for a missing app manifest
    pub fn manifest_not_found() -> &'static str {
        "Could not find app.json or app.toml in the project directory.\n\
         \n\
         Run the command from your project root or pass the project path:\n\
         • appship build:ios ./my-app"
    }

    /// Hint for a missing Xcode project
    pub fn xcodeproj_not_found() -> &'static str {
        "The ios/ directory must contain exactly one <Name>.xcodeproj bundle.\n\
         Generate the native project before configuring entitlements."
    }

    /// Hint for a missing session
    pub fn not_logged_in() -> &'static str {
        "Log in to the build service first, or set APPSHIP_SESSION_TOKEN\n\
         when running in CI."
    }
}
