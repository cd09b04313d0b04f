//! User session for the build service
//!
//! The session secret comes from `APPSHIP_SESSION_TOKEN` or from the state
//! file written at login, `~/.appship/state.json`:
//!
//! ```json
//! { "auth": { "username": "jane", "sessionSecret": "..." } }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::{codes, hints, AppshipError};

pub const SESSION_TOKEN_ENV: &str = "APPSHIP_SESSION_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: Option<String>,
    pub secret: String,
}

#[derive(Debug, Default, Deserialize)]
struct StateFile {
    auth: Option<AuthState>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthState {
    username: Option<String>,
    session_secret: Option<String>,
}

/// `~/.appship/state.json`
pub fn state_file_path() -> Result<PathBuf> {
    let base_dirs = directories::BaseDirs::new().context("Failed to get base directories")?;
    Ok(base_dirs.home_dir().join(".appship").join("state.json"))
}

/// Read a session from a state file; `None` when the file or secret is absent
pub fn read_state_file(path: &Path) -> Result<Option<Session>> {
    if !path.is_file() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let state: StateFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    Ok(state.auth.and_then(|auth| {
        auth.session_secret.map(|secret| Session {
            username: auth.username,
            secret,
        })
    }))
}

/// Current session, or a `NOT_LOGGED_IN` command error
pub fn load_session() -> Result<Session> {
    if let Some(secret) = std::env::var(SESSION_TOKEN_ENV).ok().filter(|s| !s.is_empty()) {
        return Ok(Session { username: None, secret });
    }

    read_state_file(&state_file_path()?)?.ok_or_else(|| {
        AppshipError::command_error_with_hint(
            codes::NOT_LOGGED_IN,
            "Not logged in to the build service",
            hints::not_logged_in(),
        )
        .into()
    })
}
