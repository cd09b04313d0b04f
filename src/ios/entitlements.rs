//! Entitlements plist configuration driven by the app manifest
//!
//! Every `set_*` function takes the whole entitlements document and returns
//! the next one. Each setter owns exactly one key: when the manifest enables
//! the capability the key is written, otherwise it is removed, so turning a
//! capability off in the manifest also clears a previously written value.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use plist::{Dictionary, Value};

use super::paths;
use super::pbxproj::XcodeProject;
use super::plist::{json_to_plist, PlistDocument, ENTITLEMENTS_TEMPLATE};
use crate::config::AppManifest;
use crate::error::AppshipError;
use crate::warnings::WarningAggregator;

pub const APPLE_SIGN_IN_KEY: &str = "com.apple.developer.applesignin";
pub const CONTACTS_NOTES_KEY: &str = "com.apple.developer.contacts.notes";
pub const ASSOCIATED_DOMAINS_KEY: &str = "com.apple.developer.associated-domains";

/// Build setting that points Xcode at the entitlements file
pub const CODE_SIGN_ENTITLEMENTS: &str = "CODE_SIGN_ENTITLEMENTS";

/// Sign in with Apple
pub fn set_apple_sign_in_entitlement(manifest: &AppManifest, plist: PlistDocument) -> PlistDocument {
    let value = manifest
        .ios
        .uses_apple_sign_in
        .then(|| Value::Array(vec![Value::String("Default".to_string())]));
    plist.upsert_or_remove(APPLE_SIGN_IN_KEY, value)
}

/// Access to the notes field of contacts
pub fn set_accesses_contact_notes(manifest: &AppManifest, plist: PlistDocument) -> PlistDocument {
    let value = manifest
        .ios
        .accesses_contact_notes
        .then_some(Value::Boolean(true));
    plist.upsert_or_remove(CONTACTS_NOTES_KEY, value)
}

/// Associated domains; an empty list counts as unset
pub fn set_associated_domains(manifest: &AppManifest, plist: PlistDocument) -> PlistDocument {
    let value = manifest
        .ios
        .associated_domains
        .as_ref()
        .filter(|domains| !domains.is_empty())
        .map(|domains| Value::Array(domains.iter().cloned().map(Value::String).collect()));
    plist.upsert_or_remove(ASSOCIATED_DOMAINS_KEY, value)
}

/// iCloud storage cannot be configured without the signing team's
/// container identifiers, so this only records a warning.
pub fn set_icloud_entitlement(
    manifest: &AppManifest,
    plist: PlistDocument,
    _apple_team_id: Option<&str>,
    warnings: &mut WarningAggregator,
) -> PlistDocument {
    if manifest.ios.uses_icloud_storage {
        warnings.add_warning_ios(
            "ios.usesIcloudStorage",
            "Enable the iCloud Storage Entitlement from the Capabilities tab in your Xcode project.",
        );
    }
    plist
}

/// Raw `ios.entitlements` entries from the manifest, merged last
pub fn set_custom_entitlements_entries(manifest: &AppManifest, plist: PlistDocument) -> PlistDocument {
    let Some(ref entries) = manifest.ios.entitlements else {
        return plist;
    };

    let mut custom = Dictionary::new();
    for (key, value) in entries {
        if let Some(value) = json_to_plist(value) {
            custom.insert(key.clone(), value);
        }
    }
    plist.merge(custom)
}

/// Run every entitlement setter over `plist`
pub fn apply_entitlements(
    manifest: &AppManifest,
    plist: PlistDocument,
    apple_team_id: Option<&str>,
    warnings: &mut WarningAggregator,
) -> PlistDocument {
    let plist = set_icloud_entitlement(manifest, plist, apple_team_id, warnings);
    let plist = set_apple_sign_in_entitlement(manifest, plist);
    let plist = set_accesses_contact_notes(manifest, plist);
    let plist = set_associated_domains(manifest, plist);
    set_custom_entitlements_entries(manifest, plist)
}

/// Path of the entitlements file, creating and registering one if the
/// project has none yet
pub fn get_entitlements_path(project_root: &Path, warnings: &mut WarningAggregator) -> Result<PathBuf> {
    let mut existing = paths::find_entitlements_paths(project_root)?;
    if existing.len() > 1 {
        warnings.add_warning_ios(
            "ios.entitlements",
            format!(
                "Found {} entitlements files, using {}",
                existing.len(),
                existing[0].display()
            ),
        );
    }
    if !existing.is_empty() {
        return Ok(existing.swap_remove(0));
    }

    create_entitlements_file(project_root)
}

/// `ios/<ProjectName>/<ProductName>.entitlements`
fn default_entitlements_path(project_root: &Path, project: &XcodeProject) -> Result<PathBuf> {
    let project_name = paths::get_project_name(project_root)?;
    let product_name = project.product_name().ok_or_else(|| {
        AppshipError::project_structure_error(
            "Could not determine PRODUCT_NAME from the Xcode project",
            vec!["PRODUCT_NAME set on the app target's build configurations".to_string()],
            "Open the project in Xcode and set a Product Name for the app target.",
        )
    })?;

    Ok(paths::ios_dir(project_root)
        .join(project_name)
        .join(format!("{}.entitlements", product_name)))
}

fn create_entitlements_file(project_root: &Path) -> Result<PathBuf> {
    let pbxproj_path = paths::get_pbxproj_path(project_root)?;
    let mut project = XcodeProject::open(&pbxproj_path)?;
    let entitlements_path = default_entitlements_path(project_root, &project)?;

    if let Some(parent) = entitlements_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&entitlements_path, ENTITLEMENTS_TEMPLATE)
        .with_context(|| format!("Failed to write {}", entitlements_path.display()))?;

    let relative = relative_to_ios_dir(project_root, &entitlements_path);
    project.set_build_setting(CODE_SIGN_ENTITLEMENTS, &relative, |config| !config.is_test_host())?;
    project.save()?;

    Ok(entitlements_path)
}

/// Xcode resolves `CODE_SIGN_ENTITLEMENTS` relative to the `ios/` directory
fn relative_to_ios_dir(project_root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(paths::ios_dir(project_root)).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Resolve, update and write the project's entitlements file
pub fn configure_entitlements(
    project_root: &Path,
    manifest: &AppManifest,
    apple_team_id: Option<&str>,
    warnings: &mut WarningAggregator,
) -> Result<PathBuf> {
    let path = get_entitlements_path(project_root, warnings)?;
    let current = PlistDocument::read(&path)?;
    let updated = apply_entitlements(manifest, current, apple_team_id, warnings);
    updated.write(&path)?;
    Ok(path)
}
