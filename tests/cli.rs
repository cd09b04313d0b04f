//! End-to-end tests driving the appship binary

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const PBXPROJ: &str = r#"// !$*UTF8*$!
{
	archiveVersion = 1;
	objectVersion = 46;
	objects = {
		13B07F861A680F5B00A75B9A /* Demo */ = {
			isa = PBXNativeTarget;
			buildConfigurationList = 13B07F931A680F5B00A75B9A;
			name = Demo;
		};
		13B07F941A680F5B00A75B9A /* Debug */ = {
			isa = XCBuildConfiguration;
			buildSettings = {
				INFOPLIST_FILE = Demo/Info.plist;
				PRODUCT_NAME = Demo;
			};
			name = Debug;
		};
		13B07F931A680F5B00A75B9A = {
			isa = XCConfigurationList;
			buildConfigurations = (
				13B07F941A680F5B00A75B9A /* Debug */,
			);
		};
	};
	rootObject = 83CBB9F71A601CBA00E9B192;
}
"#;

fn appship() -> Command {
    let mut cmd = Command::cargo_bin("appship").unwrap();
    cmd.env_remove("APPSHIP_SESSION_TOKEN")
        .env("APPSHIP_API_URL", "http://127.0.0.1:9")
        .arg("--no-color");
    cmd
}

fn managed_project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("app.json"),
        r#"{"expo": {"slug": "demo", "ios": {"bundleIdentifier": "com.example.demo"}}}"#,
    )
    .unwrap();
    dir
}

fn bare_ios_project(manifest: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("app.json"), manifest).unwrap();
    let xcodeproj = dir.path().join("ios").join("Demo.xcodeproj");
    fs::create_dir_all(&xcodeproj).unwrap();
    fs::write(xcodeproj.join("project.pbxproj"), PBXPROJ).unwrap();
    dir
}

fn path_arg(dir: &Path) -> &str {
    dir.to_str().unwrap()
}

#[test]
fn test_help_lists_commands() {
    appship()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build:ios"))
        .stdout(predicate::str::contains("build:android"))
        .stdout(predicate::str::contains("build:status"))
        .stdout(predicate::str::contains("apply:ios"));
}

#[test]
fn test_rejects_http_public_url() {
    let dir = managed_project();
    appship()
        .args(["build:ios", path_arg(dir.path()), "--public-url", "http://example.com"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("--public-url must be a valid HTTPS URL."))
        .stderr(predicate::str::contains("INVALID_PUBLIC_URL"));
}

#[test]
fn test_rejects_bad_release_channel() {
    let dir = managed_project();
    appship()
        .args(["ba", path_arg(dir.path()), "--release-channel", "Bad Channel!"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Release channel name can only contain"))
        .stderr(predicate::str::contains("INVALID_RELEASE_CHANNEL"));
}

#[test]
fn test_rejects_conflicting_credential_flags() {
    let dir = managed_project();
    appship()
        .args([
            "build:ios",
            path_arg(dir.path()),
            "--skip-credentials-check",
            "--clear-credentials",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "--skip-credentials-check and --clear-credentials can't be used together",
        ));
}

#[test]
fn test_build_status_rejects_http_public_url() {
    let dir = managed_project();
    appship()
        .args(["build:status", path_arg(dir.path()), "--public-url", "http://example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("HTTPS"));
}

#[test]
fn test_valid_flags_reach_session_check() {
    let dir = managed_project();
    let home = tempfile::tempdir().unwrap();
    appship()
        .env("HOME", home.path())
        .args(["build:ios", path_arg(dir.path()), "--public-url", "https://example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}

#[test]
fn test_bare_project_warns_when_non_interactive() {
    let dir = bare_ios_project(r#"{"slug": "demo"}"#);
    let home = tempfile::tempdir().unwrap();
    appship()
        .env("HOME", home.path())
        .args(["--non-interactive", "build:ios", path_arg(dir.path())])
        .assert()
        .failure()
        .stderr(predicate::str::contains("only supports managed workflow apps"))
        .stderr(predicate::str::contains("Xcode"));
}

#[test]
fn test_apply_ios_creates_entitlements() {
    let dir = bare_ios_project(
        r#"{"expo": {"slug": "demo", "ios": {
            "bundleIdentifier": "com.example.demo",
            "usesAppleSignIn": true,
            "associatedDomains": ["applinks:example.com"]
        }}}"#,
    );

    appship()
        .args(["apply:ios", path_arg(dir.path())])
        .assert()
        .success();

    let entitlements = dir.path().join("ios/Demo/Demo.entitlements");
    let contents = fs::read_to_string(&entitlements).unwrap();
    assert!(contents.contains("com.apple.developer.applesignin"));
    assert!(contents.contains("<string>Default</string>"));
    assert!(contents.contains("applinks:example.com"));

    let pbxproj = fs::read_to_string(dir.path().join("ios/Demo.xcodeproj/project.pbxproj")).unwrap();
    assert!(pbxproj.contains("CODE_SIGN_ENTITLEMENTS = Demo/Demo.entitlements;"));
    assert!(pbxproj.contains("INFOPLIST_FILE = Demo/Info.plist;"));
}

#[test]
fn test_apply_ios_verbose_counts_warnings() {
    let clean = bare_ios_project(
        r#"{"expo": {"slug": "demo", "ios": {"bundleIdentifier": "com.example.demo"}}}"#,
    );
    appship()
        .args(["apply:ios", path_arg(clean.path()), "--verbose"])
        .assert()
        .success()
        .stdout(predicate::str::contains("warning(s)").not());

    let icloud = bare_ios_project(
        r#"{"expo": {"slug": "demo", "ios": {
            "bundleIdentifier": "com.example.demo",
            "usesIcloudStorage": true
        }}}"#,
    );
    appship()
        .args(["apply:ios", path_arg(icloud.path()), "--verbose"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 warning(s)"))
        .stderr(predicate::str::contains("ios.usesIcloudStorage"));
}

#[test]
fn test_apply_ios_without_native_project_fails() {
    let dir = managed_project();
    appship()
        .args(["apply:ios", path_arg(dir.path())])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid project structure"))
        .stderr(predicate::str::contains("CODE:").not());
}
