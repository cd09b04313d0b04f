//! Android standalone builder
//!
//! Produces an App Bundle (`.aab`) or an APK. When no keystore is given the
//! service generates one on first build and keeps it.

use std::path::PathBuf;

use anyhow::Result;

use super::{check_credential_file, required_env, PlatformBuilder};
use crate::commands::build_android::AndroidBuildType;
use crate::config::AppManifest;
use crate::error::{codes, AppshipError};
use crate::service::{BuildRequest, ClearCredentials, CredentialsUpload, Platform};
use crate::warnings::WarningAggregator;

pub const KEYSTORE_PASSWORD_ENV: &str = "APPSHIP_ANDROID_KEYSTORE_PASSWORD";
pub const KEY_PASSWORD_ENV: &str = "APPSHIP_ANDROID_KEY_PASSWORD";

/// Options of `build:android`
#[derive(Debug, Clone)]
pub struct AndroidBuildOptions {
    pub build_type: AndroidBuildType,
    pub release_channel: String,
    pub public_url: Option<String>,
    pub publish: bool,
    pub wait: bool,
    pub clear_credentials: bool,
    pub keystore_path: Option<PathBuf>,
    pub keystore_alias: Option<String>,
}

impl Default for AndroidBuildOptions {
    fn default() -> Self {
        Self {
            build_type: AndroidBuildType::Apk,
            release_channel: "default".to_string(),
            public_url: None,
            publish: true,
            wait: true,
            clear_credentials: false,
            keystore_path: None,
            keystore_alias: None,
        }
    }
}

/// Android platform builder
pub struct AndroidBuilder {
    options: AndroidBuildOptions,
}

impl AndroidBuilder {
    pub fn new(options: AndroidBuildOptions) -> Self {
        Self { options }
    }
}

impl PlatformBuilder for AndroidBuilder {
    fn platform(&self) -> Platform {
        Platform::Android
    }

    fn validate_inputs(&self) -> Result<()> {
        let o = &self.options;
        check_credential_file("--keystore-path", o.keystore_path.as_deref())?;

        if o.keystore_path.is_some() {
            if o.keystore_alias.is_none() {
                return Err(AppshipError::command_error(
                    codes::MISSING_FLAG,
                    "--keystore-alias is required when using --keystore-path",
                )
                .into());
            }
            required_env(KEYSTORE_PASSWORD_ENV, "--keystore-path")?;
            required_env(KEY_PASSWORD_ENV, "--keystore-path")?;
        }

        Ok(())
    }

    fn clear_credentials(&self) -> ClearCredentials {
        ClearCredentials {
            all: self.options.clear_credentials,
            ..Default::default()
        }
    }

    fn credentials_upload(&self) -> CredentialsUpload {
        let o = &self.options;
        let mut upload = CredentialsUpload::default();
        if o.keystore_path.is_none() {
            return upload;
        }

        upload.field("keystoreAlias", o.keystore_alias.clone());
        upload.field("keystorePassword", std::env::var(KEYSTORE_PASSWORD_ENV).ok());
        upload.field("keyPassword", std::env::var(KEY_PASSWORD_ENV).ok());
        upload.file("keystore", o.keystore_path.clone());
        upload
    }

    fn build_request(
        &self,
        slug: &str,
        manifest: &AppManifest,
        warnings: &mut WarningAggregator,
    ) -> Result<BuildRequest> {
        let package = manifest.android.package.clone().ok_or_else(|| {
            AppshipError::config_error_with_hint(
                "android.package is required for Android builds",
                None,
                "Add \"android\": { \"package\": \"com.example.myapp\" } to app.json",
            )
        })?;

        if manifest.android.version_code.is_none() {
            warnings.add_warning_android(
                "android.versionCode",
                "Not set; the build will use versionCode 1, which Google Play rejects for updates.",
            );
        }

        Ok(BuildRequest {
            platform: Platform::Android,
            slug: slug.to_string(),
            build_type: self.options.build_type.to_string(),
            release_channel: self.options.release_channel.clone(),
            public_url: self.options.public_url.clone(),
            app_identifier: Some(package),
            sdk_version: manifest.sdk_version.clone(),
            publish: self.options.publish,
            skip_credentials_check: false,
        })
    }

    fn wait(&self) -> bool {
        self.options.wait
    }
}
