//! `build:android` command implementation

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};

use super::{bail_on_workflow, run_remote_build, GlobalOptions};
use crate::builders::android::{AndroidBuildOptions, AndroidBuilder};
use crate::config::validation::{validate_optional_public_url, validate_release_channel};
use crate::service::Platform;
use crate::utils::terminal::print_warning;

/// Kind of Android build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum AndroidBuildType {
    /// Android App Bundle (.aab) for Google Play
    AppBundle,
    /// Installable APK
    #[default]
    Apk,
}

impl std::fmt::Display for AndroidBuildType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AndroidBuildType::AppBundle => write!(f, "app-bundle"),
            AndroidBuildType::Apk => write!(f, "apk"),
        }
    }
}

/// Build a standalone APK or App Bundle for the Google Play Store
#[derive(Args, Debug)]
pub struct BuildAndroidCommand {
    /// Project directory
    #[arg(default_value = ".")]
    pub project_dir: PathBuf,

    /// Clear stored credentials
    #[arg(short = 'c', long)]
    pub clear_credentials: bool,

    /// Pull from specified release channel
    #[arg(long, default_value = "default")]
    pub release_channel: String,

    /// Disable automatic publishing before building
    #[arg(long)]
    pub no_publish: bool,

    /// Exit immediately after triggering the build
    #[arg(long)]
    pub no_wait: bool,

    /// Path to your Keystore (passwords are read from APPSHIP_ANDROID_KEYSTORE_PASSWORD and APPSHIP_ANDROID_KEY_PASSWORD)
    #[arg(long)]
    pub keystore_path: Option<PathBuf>,

    /// Keystore Alias
    #[arg(long)]
    pub keystore_alias: Option<String>,

    /// [deprecated] Generate Keystore if one does not exist
    #[arg(long)]
    pub generate_keystore: bool,

    /// The URL of an externally hosted manifest (for self-hosted apps)
    #[arg(long)]
    pub public_url: Option<String>,

    /// Skip warning about the build service only supporting the managed workflow
    #[arg(long)]
    pub skip_workflow_check: bool,

    /// Type of build
    #[arg(short = 't', long = "type", value_enum, default_value_t = AndroidBuildType::Apk)]
    pub build_type: AndroidBuildType,
}

impl BuildAndroidCommand {
    fn validate(&self) -> Result<()> {
        validate_optional_public_url(self.public_url.as_deref())?;
        validate_release_channel(&self.release_channel)
    }

    fn options(&self) -> AndroidBuildOptions {
        AndroidBuildOptions {
            build_type: self.build_type,
            release_channel: self.release_channel.clone(),
            public_url: self.public_url.clone(),
            publish: !self.no_publish,
            wait: !self.no_wait,
            clear_credentials: self.clear_credentials,
            keystore_path: self.keystore_path.clone(),
            keystore_alias: self.keystore_alias.clone(),
        }
    }

    /// Execute the build:android command
    pub fn execute(self, global: &GlobalOptions) -> Result<()> {
        if self.generate_keystore {
            print_warning(
                "The --generate-keystore flag is deprecated and does not do anything. \
                 A Keystore will always be generated by the build service if it's missing.",
            );
        }

        self.validate()?;

        if bail_on_workflow(&self.project_dir, Platform::Android, self.skip_workflow_check, global)? {
            return Ok(());
        }

        let builder = AndroidBuilder::new(self.options());
        run_remote_build(&self.project_dir, &builder, global)
    }
}
