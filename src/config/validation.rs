//! Validation of command-line flags and manifest values
//!
//! Flag validators return [`AppshipError::Command`] so that a bad invocation
//! fails before any project or network work starts.

use std::sync::OnceLock;

use anyhow::Result;
use regex::Regex;

use super::AppManifest;
use crate::error::{codes, hints, AppshipError};
use crate::warnings::WarningAggregator;

/// Allowed release channel names
pub const RELEASE_CHANNEL_PATTERN: &str = r"^[a-z0-9][a-z0-9._-]*$";

/// Reverse-DNS bundle identifier
const BUNDLE_IDENTIFIER_PATTERN: &str = r"^[a-zA-Z0-9-]+(\.[a-zA-Z0-9-]+)*$";

fn release_channel_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(RELEASE_CHANNEL_PATTERN).expect("release channel pattern is valid"))
}

fn bundle_identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(BUNDLE_IDENTIFIER_PATTERN).expect("bundle identifier pattern is valid"))
}

/// Prefixes Apple accepts for associated domain entries
const ASSOCIATED_DOMAIN_SERVICES: &[&str] =
    &["applinks:", "webcredentials:", "activitycontinuation:", "appclips:"];

/// Validate `--public-url`: it must be an absolute HTTPS URL
pub fn validate_public_url(url: &str) -> Result<()> {
    let is_https = reqwest::Url::parse(url)
        .map(|parsed| parsed.scheme() == "https" && parsed.host_str().is_some())
        .unwrap_or(false);

    if !is_https {
        return Err(AppshipError::command_error_with_hint(
            codes::INVALID_PUBLIC_URL,
            "--public-url must be a valid HTTPS URL.",
            hints::public_url(),
        )
        .into());
    }

    Ok(())
}

/// Validate an optional `--public-url`
pub fn validate_optional_public_url(url: Option<&str>) -> Result<()> {
    match url {
        Some(url) => validate_public_url(url),
        None => Ok(()),
    }
}

/// Validate `--release-channel`
pub fn validate_release_channel(channel: &str) -> Result<()> {
    if !release_channel_re().is_match(channel) {
        return Err(AppshipError::command_error_with_hint(
            codes::INVALID_RELEASE_CHANNEL,
            "Release channel name can only contain lowercase letters, numbers and special characters . _ and -",
            hints::release_channel(),
        )
        .into());
    }

    Ok(())
}

/// `--skip-credentials-check` and `--clear-credentials` cannot be combined
pub fn validate_credentials_flags(skip_credentials_check: bool, clear_credentials: bool) -> Result<()> {
    if skip_credentials_check && clear_credentials {
        return Err(AppshipError::command_error(
            codes::CONFLICTING_FLAGS,
            "--skip-credentials-check and --clear-credentials can't be used together",
        )
        .into());
    }

    Ok(())
}

/// Validate the iOS part of the manifest before touching native files
///
/// Hard errors are returned; questionable values become warnings.
pub fn validate_ios_manifest(manifest: &AppManifest, warnings: &mut WarningAggregator) -> Result<()> {
    let ios = &manifest.ios;

    if let Some(ref bundle_id) = ios.bundle_identifier {
        if !bundle_identifier_re().is_match(bundle_id) {
            return Err(AppshipError::config_error_with_hint(
                format!("ios.bundleIdentifier '{}' is not a valid bundle identifier", bundle_id),
                None,
                "Bundle identifiers may only contain letters, digits, hyphens and periods,\n\
                 e.g. 'com.example.myapp'",
            )
            .into());
        }
    }

    if let Some(ref domains) = ios.associated_domains {
        for domain in domains {
            let known = ASSOCIATED_DOMAIN_SERVICES
                .iter()
                .any(|prefix| domain.starts_with(prefix));
            if !known {
                warnings.add_warning_ios(
                    "ios.associatedDomains",
                    format!(
                        "'{}' has no service prefix; expected one of {}",
                        domain,
                        ASSOCIATED_DOMAIN_SERVICES.join(", ")
                    ),
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_of(result: Result<()>) -> Option<&'static str> {
        result
            .unwrap_err()
            .downcast_ref::<AppshipError>()
            .and_then(|e| e.code())
    }

    #[test]
    fn test_validate_public_url() {
        assert!(validate_public_url("https://example.com").is_ok());
        assert!(validate_public_url("https://example.com/app/manifest.json").is_ok());

        assert_eq!(code_of(validate_public_url("http://example.com")), Some(codes::INVALID_PUBLIC_URL));
        assert!(validate_public_url("example.com").is_err());
        assert!(validate_public_url("https://").is_err());
        assert!(validate_public_url("ftp://example.com").is_err());

        assert!(validate_optional_public_url(None).is_ok());
        assert!(validate_optional_public_url(Some("http://example.com")).is_err());
    }

    #[test]
    fn test_validate_release_channel() {
        assert!(validate_release_channel("default").is_ok());
        assert!(validate_release_channel("prod-1").is_ok());
        assert!(validate_release_channel("0.staging_2").is_ok());

        assert_eq!(
            code_of(validate_release_channel("Bad Channel!")),
            Some(codes::INVALID_RELEASE_CHANNEL)
        );
        assert!(validate_release_channel("").is_err());
        assert!(validate_release_channel("-leading").is_err());
        assert!(validate_release_channel("Upper").is_err());
        assert!(validate_release_channel("\u{663}prod").is_err());
        assert!(validate_release_channel("prod-\u{ff11}").is_err());
    }

    #[test]
    fn test_validate_credentials_flags() {
        assert!(validate_credentials_flags(false, false).is_ok());
        assert!(validate_credentials_flags(true, false).is_ok());
        assert!(validate_credentials_flags(false, true).is_ok());
        assert_eq!(code_of(validate_credentials_flags(true, true)), Some(codes::CONFLICTING_FLAGS));
    }

    #[test]
    fn test_validate_ios_manifest() {
        let mut warnings = WarningAggregator::default();

        let mut manifest = AppManifest::default();
        manifest.ios.bundle_identifier = Some("com.example.app".into());
        manifest.ios.associated_domains =
            Some(vec!["applinks:example.com".into(), "example.org".into()]);
        assert!(validate_ios_manifest(&manifest, &mut warnings).is_ok());
        assert_eq!(warnings.len(), 1);

        manifest.ios.bundle_identifier = Some("com.example app".into());
        assert!(validate_ios_manifest(&manifest, &mut warnings).is_err());
    }
}
