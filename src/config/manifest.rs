//! Application manifest parsing
//!
//! The manifest is read from `app.json` (preferred) or `app.toml` in the
//! project directory. Both formats accept the app fields either at the top
//! level or nested under an `expo` key.
//!
//! ## Example
//!
//! ```json
//! {
//!   "expo": {
//!     "name": "My App",
//!     "slug": "my-app",
//!     "ios": {
//!       "bundleIdentifier": "com.example.myapp",
//!       "usesAppleSignIn": true,
//!       "associatedDomains": ["applinks:example.com"]
//!     }
//!   }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::{hints, AppshipError, ResultExt};

/// File names searched for, in priority order
pub const MANIFEST_FILE_NAMES: &[&str] = &["app.json", "app.toml"];

/// Key under which the app fields may be nested
const NESTED_KEY: &str = "expo";

/// Root application manifest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppManifest {
    /// Display name
    pub name: Option<String>,

    /// URL-friendly project identifier used by the build service
    pub slug: Option<String>,

    /// Runtime SDK version the app targets
    pub sdk_version: Option<String>,

    /// iOS-specific configuration
    #[serde(default)]
    pub ios: IosConfig,

    /// Android-specific configuration
    #[serde(default)]
    pub android: AndroidConfig,
}

/// `ios` section of the manifest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IosConfig {
    /// Bundle identifier, e.g. `com.example.myapp`
    pub bundle_identifier: Option<String>,

    /// Whether the app stores documents in iCloud
    #[serde(default)]
    pub uses_icloud_storage: bool,

    /// Whether the app offers Sign in with Apple
    #[serde(default)]
    pub uses_apple_sign_in: bool,

    /// Whether the app reads the notes field of contacts
    #[serde(default)]
    pub accesses_contact_notes: bool,

    /// Associated domains (`applinks:example.com`, `webcredentials:...`)
    pub associated_domains: Option<Vec<String>>,

    /// Extra entitlements written verbatim into the entitlements plist
    pub entitlements: Option<serde_json::Map<String, serde_json::Value>>,
}

/// `android` section of the manifest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidConfig {
    /// Application id, e.g. `com.example.myapp`
    pub package: Option<String>,

    /// Integer version code
    pub version_code: Option<u32>,
}

impl AppManifest {
    /// Find the manifest file in a project directory
    pub fn find(project_dir: &Path) -> Result<PathBuf> {
        MANIFEST_FILE_NAMES
            .iter()
            .map(|name| project_dir.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| {
                AppshipError::config_error_with_hint(
                    format!("No app manifest found in {}", project_dir.display()),
                    None,
                    hints::manifest_not_found(),
                )
                .into()
            })
    }

    /// Load the manifest of a project directory
    pub fn load_from_project(project_dir: &Path) -> Result<Self> {
        let path = Self::find(project_dir)?;
        Self::load(&path)
    }

    /// Load a manifest file; the format is picked from the extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let manifest = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            _ => Self::from_json_str(&content),
        };

        manifest.with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Parse a JSON manifest
    pub fn from_json_str(content: &str) -> Result<Self> {
        let mut value: serde_json::Value = serde_json::from_str(content)
            .with_hint("app.json must be a valid JSON object")?;

        if let Some(nested) = value.get_mut(NESTED_KEY) {
            value = nested.take();
        }

        Ok(serde_json::from_value(value).with_hint("Check the types of the ios/android fields")?)
    }

    /// Parse a TOML manifest
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut table: toml::Table =
            toml::from_str(content).with_hint("app.toml must be a valid TOML document")?;

        let value = match table.remove(NESTED_KEY) {
            Some(nested) => nested,
            None => toml::Value::Table(table),
        };

        Ok(value
            .try_into()
            .with_hint("Check the types of the ios/android fields")?)
    }

    /// Slug used to identify the project on the build service
    pub fn slug(&self) -> Option<&str> {
        self.slug.as_deref().or(self.name.as_deref())
    }
}
