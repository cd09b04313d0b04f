//! iOS standalone builder
//!
//! Produces an App Store archive (`.ipa`) or a simulator build (`.tar.gz`).
//! Simulator builds are unsigned, so they never need credentials.

use std::path::PathBuf;

use anyhow::Result;

use super::{check_credential_file, required_env, PlatformBuilder};
use crate::commands::build_ios::IosBuildType;
use crate::config::AppManifest;
use crate::error::{codes, AppshipError};
use crate::service::{BuildRequest, ClearCredentials, CredentialsUpload, Platform};
use crate::warnings::WarningAggregator;

/// Apple ID password for `--apple-id`
pub const APPLE_PASSWORD_ENV: &str = "APPSHIP_APPLE_PASSWORD";
/// Password of the distribution certificate given with `--dist-p12-path`
pub const DIST_P12_PASSWORD_ENV: &str = "APPSHIP_IOS_DIST_P12_PASSWORD";

/// Options of `build:ios`
#[derive(Debug, Clone)]
pub struct IosBuildOptions {
    pub build_type: IosBuildType,
    pub release_channel: String,
    pub public_url: Option<String>,
    pub publish: bool,
    pub wait: bool,
    pub clear_credentials: bool,
    pub clear_dist_cert: bool,
    pub clear_push_key: bool,
    pub clear_push_cert: bool,
    pub clear_provisioning_profile: bool,
    pub revoke_credentials: bool,
    pub skip_credentials_check: bool,
    pub apple_id: Option<String>,
    pub team_id: Option<String>,
    pub dist_p12_path: Option<PathBuf>,
    pub push_id: Option<String>,
    pub push_p8_path: Option<PathBuf>,
    pub provisioning_profile_path: Option<PathBuf>,
}

impl Default for IosBuildOptions {
    fn default() -> Self {
        Self {
            build_type: IosBuildType::Archive,
            release_channel: "default".to_string(),
            public_url: None,
            publish: true,
            wait: true,
            clear_credentials: false,
            clear_dist_cert: false,
            clear_push_key: false,
            clear_push_cert: false,
            clear_provisioning_profile: false,
            revoke_credentials: false,
            skip_credentials_check: false,
            apple_id: None,
            team_id: None,
            dist_p12_path: None,
            push_id: None,
            push_p8_path: None,
            provisioning_profile_path: None,
        }
    }
}

/// iOS platform builder
pub struct IosBuilder {
    options: IosBuildOptions,
}

impl IosBuilder {
    pub fn new(options: IosBuildOptions) -> Self {
        Self { options }
    }

    fn is_simulator(&self) -> bool {
        self.options.build_type == IosBuildType::Simulator
    }
}

impl PlatformBuilder for IosBuilder {
    fn platform(&self) -> Platform {
        Platform::Ios
    }

    fn validate_inputs(&self) -> Result<()> {
        let o = &self.options;
        check_credential_file("--dist-p12-path", o.dist_p12_path.as_deref())?;
        check_credential_file("--push-p8-path", o.push_p8_path.as_deref())?;
        check_credential_file("--provisioning-profile-path", o.provisioning_profile_path.as_deref())?;

        if o.dist_p12_path.is_some() {
            if o.team_id.is_none() {
                return Err(AppshipError::command_error(
                    codes::MISSING_FLAG,
                    "--team-id is required when using --dist-p12-path",
                )
                .into());
            }
            required_env(DIST_P12_PASSWORD_ENV, "--dist-p12-path")?;
        }

        if o.push_p8_path.is_some() && o.push_id.is_none() {
            return Err(AppshipError::command_error(
                codes::MISSING_FLAG,
                "--push-id is required when using --push-p8-path",
            )
            .into());
        }

        Ok(())
    }

    fn clear_credentials(&self) -> ClearCredentials {
        let o = &self.options;
        ClearCredentials {
            all: o.clear_credentials,
            dist_cert: o.clear_dist_cert,
            push_key: o.clear_push_key,
            push_cert: o.clear_push_cert,
            provisioning_profile: o.clear_provisioning_profile,
            revoke: o.revoke_credentials,
        }
    }

    fn credentials_upload(&self) -> CredentialsUpload {
        let o = &self.options;
        let mut upload = CredentialsUpload::default();
        if self.is_simulator() {
            return upload;
        }

        upload.field("teamId", o.team_id.clone());
        upload.field("appleId", o.apple_id.clone());
        if o.apple_id.is_some() {
            upload.field("applePassword", std::env::var(APPLE_PASSWORD_ENV).ok());
        }
        if o.dist_p12_path.is_some() {
            upload.field("distP12Password", std::env::var(DIST_P12_PASSWORD_ENV).ok());
        }
        upload.field("pushId", o.push_id.clone());
        upload.file("distP12", o.dist_p12_path.clone());
        upload.file("pushP8", o.push_p8_path.clone());
        upload.file("provisioningProfile", o.provisioning_profile_path.clone());
        upload
    }

    fn build_request(
        &self,
        slug: &str,
        manifest: &AppManifest,
        _warnings: &mut WarningAggregator,
    ) -> Result<BuildRequest> {
        let bundle_identifier = manifest.ios.bundle_identifier.clone().ok_or_else(|| {
            AppshipError::config_error_with_hint(
                "ios.bundleIdentifier is required for iOS builds",
                None,
                "Add \"ios\": { \"bundleIdentifier\": \"com.example.myapp\" } to app.json",
            )
        })?;

        Ok(BuildRequest {
            platform: Platform::Ios,
            slug: slug.to_string(),
            build_type: self.options.build_type.to_string(),
            release_channel: self.options.release_channel.clone(),
            public_url: self.options.public_url.clone(),
            app_identifier: Some(bundle_identifier),
            sdk_version: manifest.sdk_version.clone(),
            publish: self.options.publish,
            skip_credentials_check: self.options.skip_credentials_check || self.is_simulator(),
        })
    }

    fn wait(&self) -> bool {
        self.options.wait
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::tests::{fast_poll, project_with_manifest, FakeService};
    use crate::builders::BaseBuilder;
    use crate::service::BuildStatus;
    use std::fs;

    const MANIFEST: &str = r#"{"expo": {"slug": "demo", "sdkVersion": "50.0.0",
        "ios": {"bundleIdentifier": "com.example.demo"}}}"#;

    #[test]
    fn test_run_without_wait() {
        let service = FakeService::default();
        let dir = project_with_manifest(MANIFEST);
        let builder = IosBuilder::new(IosBuildOptions {
            wait: false,
            release_channel: "prod-1".into(),
            ..Default::default()
        });

        let job = BaseBuilder::new(dir.path(), &service, false).run(&builder).unwrap();
        assert_eq!(job.status, BuildStatus::Pending);
        assert_eq!(service.calls.borrow().as_slice(), ["start:demo"]);

        let started = service.started.borrow();
        assert_eq!(started[0].build_type, "archive");
        assert_eq!(started[0].release_channel, "prod-1");
        assert_eq!(started[0].app_identifier.as_deref(), Some("com.example.demo"));
        assert_eq!(started[0].sdk_version.as_deref(), Some("50.0.0"));
    }

    #[test]
    fn test_run_clears_and_waits() {
        let service = FakeService::default();
        *service.statuses.borrow_mut() = vec![BuildStatus::Finished];
        let dir = project_with_manifest(MANIFEST);
        let builder = IosBuilder::new(IosBuildOptions {
            clear_push_key: true,
            ..Default::default()
        });

        let job = BaseBuilder::new(dir.path(), &service, false)
            .with_poll_options(fast_poll())
            .run(&builder)
            .unwrap();
        assert_eq!(job.status, BuildStatus::Finished);
        assert_eq!(
            service.calls.borrow().as_slice(),
            ["clear:demo", "start:demo", "status:demo"]
        );
    }

    #[test]
    fn test_missing_bundle_identifier() {
        let service = FakeService::default();
        let dir = project_with_manifest(r#"{"slug": "demo"}"#);
        let builder = IosBuilder::new(IosBuildOptions {
            clear_credentials: true,
            team_id: Some("ABCDE12345".into()),
            ..Default::default()
        });
        assert!(BaseBuilder::new(dir.path(), &service, false).run(&builder).is_err());
        assert!(service.calls.borrow().is_empty());
    }

    #[test]
    fn test_validate_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let p8 = dir.path().join("push.p8");
        fs::write(&p8, "key").unwrap();

        let missing_push_id = IosBuilder::new(IosBuildOptions {
            push_p8_path: Some(p8.clone()),
            ..Default::default()
        });
        let err = missing_push_id.validate_inputs().unwrap_err();
        assert_eq!(
            err.downcast_ref::<AppshipError>().and_then(|e| e.code()),
            Some(codes::MISSING_FLAG)
        );

        let ok = IosBuilder::new(IosBuildOptions {
            push_p8_path: Some(p8),
            push_id: Some("123AB4C56D".into()),
            ..Default::default()
        });
        assert!(ok.validate_inputs().is_ok());
        let upload = ok.credentials_upload();
        assert_eq!(upload.fields, vec![("pushId".to_string(), "123AB4C56D".to_string())]);
        assert_eq!(upload.files.len(), 1);

        let missing_file = IosBuilder::new(IosBuildOptions {
            dist_p12_path: Some(dir.path().join("missing.p12")),
            team_id: Some("ABCDE12345".into()),
            ..Default::default()
        });
        assert!(missing_file.validate_inputs().is_err());
    }

    #[test]
    fn test_simulator_skips_credentials() {
        let builder = IosBuilder::new(IosBuildOptions {
            build_type: IosBuildType::Simulator,
            team_id: Some("ABCDE12345".into()),
            ..Default::default()
        });
        assert!(builder.credentials_upload().is_empty());

        let manifest = AppManifest::from_json_str(MANIFEST).unwrap();
        let mut warnings = WarningAggregator::default();
        let request = builder.build_request("demo", &manifest, &mut warnings).unwrap();
        assert_eq!(request.build_type, "simulator");
        assert!(request.skip_credentials_check);
    }
}
