//! Locating files inside the native iOS project

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::error::{hints, AppshipError};

/// Directories that never hold the app's own project files
const IGNORED_DIRS: &[&str] = &["Pods", "Carthage", "node_modules"];

/// `<project>/ios`
pub fn ios_dir(project_root: &Path) -> PathBuf {
    project_root.join("ios")
}

fn glob_paths(base: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full = format!("{}/{}", glob::Pattern::escape(&base.to_string_lossy()), pattern);
    let mut paths: Vec<PathBuf> = glob::glob(&full)
        .with_context(|| format!("Invalid glob pattern: {}", full))?
        .filter_map(|entry| entry.ok())
        .filter(|path| !is_ignored(base, path))
        .collect();
    paths.sort();
    Ok(paths)
}

fn is_ignored(base: &Path, path: &Path) -> bool {
    path.strip_prefix(base)
        .unwrap_or(path)
        .components()
        .any(|c| IGNORED_DIRS.iter().any(|ignored| c.as_os_str() == *ignored))
}

/// Find the `.xcodeproj` bundle under `ios/`
pub fn find_xcodeproj(project_root: &Path) -> Result<PathBuf> {
    let ios = ios_dir(project_root);
    let found = glob_paths(&ios, "*.xcodeproj")?;

    found.into_iter().find(|p| p.is_dir()).ok_or_else(|| {
        AppshipError::project_structure_error(
            format!("No Xcode project found in {}", ios.display()),
            vec!["ios/<ProjectName>.xcodeproj/project.pbxproj".to_string()],
            hints::xcodeproj_not_found(),
        )
        .into()
    })
}

/// Path to `project.pbxproj`
pub fn get_pbxproj_path(project_root: &Path) -> Result<PathBuf> {
    Ok(find_xcodeproj(project_root)?.join("project.pbxproj"))
}

/// Project name: the stem of the `.xcodeproj` bundle
pub fn get_project_name(project_root: &Path) -> Result<String> {
    let xcodeproj = find_xcodeproj(project_root)?;
    xcodeproj
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .with_context(|| format!("Invalid Xcode project path: {}", xcodeproj.display()))
}

/// Existing `ios/*/*.entitlements` files, sorted
pub fn find_entitlements_paths(project_root: &Path) -> Result<Vec<PathBuf>> {
    glob_paths(&ios_dir(project_root), "*/*.entitlements")
}
