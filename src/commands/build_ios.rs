//! `build:ios` command implementation

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};

use super::{bail_on_workflow, run_remote_build, GlobalOptions};
use crate::builders::ios::{IosBuildOptions, IosBuilder};
use crate::config::validation::{
    validate_credentials_flags, validate_optional_public_url, validate_release_channel,
};
use crate::service::Platform;

/// Kind of iOS build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum IosBuildType {
    /// Signed archive for the App Store
    #[default]
    Archive,
    /// Unsigned build for the iOS simulator
    Simulator,
}

impl std::fmt::Display for IosBuildType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IosBuildType::Archive => write!(f, "archive"),
            IosBuildType::Simulator => write!(f, "simulator"),
        }
    }
}

/// Build and sign a standalone IPA for the Apple App Store
#[derive(Args, Debug)]
pub struct BuildIosCommand {
    /// Project directory
    #[arg(default_value = ".")]
    pub project_dir: PathBuf,

    /// Clear all credentials stored on the build service
    #[arg(short = 'c', long)]
    pub clear_credentials: bool,

    /// Remove the distribution certificate stored on the build service
    #[arg(long)]
    pub clear_dist_cert: bool,

    /// Remove the push notification key stored on the build service
    #[arg(long)]
    pub clear_push_key: bool,

    /// Remove the push notification certificate stored on the build service
    #[arg(long)]
    pub clear_push_cert: bool,

    /// Remove the provisioning profile stored on the build service
    #[arg(long)]
    pub clear_provisioning_profile: bool,

    /// Revoke credentials on the Apple Developer Portal, used with --clear-* flags
    #[arg(short = 'r', long)]
    pub revoke_credentials: bool,

    /// Apple ID username (password is read from APPSHIP_APPLE_PASSWORD)
    #[arg(long)]
    pub apple_id: Option<String>,

    /// Type of build
    #[arg(short = 't', long = "type", value_enum, default_value_t = IosBuildType::Archive)]
    pub build_type: IosBuildType,

    /// Pull from specified release channel
    #[arg(long, default_value = "default")]
    pub release_channel: String,

    /// Disable automatic publishing before building
    #[arg(long)]
    pub no_publish: bool,

    /// Exit immediately after scheduling the build
    #[arg(long)]
    pub no_wait: bool,

    /// Apple Team ID
    #[arg(long)]
    pub team_id: Option<String>,

    /// Path to your Distribution Certificate P12 (password is read from APPSHIP_IOS_DIST_P12_PASSWORD)
    #[arg(long)]
    pub dist_p12_path: Option<PathBuf>,

    /// Push Key ID (ex: 123AB4C56D)
    #[arg(long)]
    pub push_id: Option<String>,

    /// Path to your Push Key .p8 file
    #[arg(long)]
    pub push_p8_path: Option<PathBuf>,

    /// Path to your Provisioning Profile
    #[arg(long)]
    pub provisioning_profile_path: Option<PathBuf>,

    /// The URL of an externally hosted manifest (for self-hosted apps)
    #[arg(long)]
    pub public_url: Option<String>,

    /// Skip checking whether the credentials on the build service are valid
    #[arg(long)]
    pub skip_credentials_check: bool,

    /// Skip warning about the build service only supporting the managed workflow
    #[arg(long)]
    pub skip_workflow_check: bool,
}

impl BuildIosCommand {
    /// Validate every flag before any project or network work
    fn validate(&self) -> Result<()> {
        validate_credentials_flags(self.skip_credentials_check, self.clear_credentials)?;
        validate_optional_public_url(self.public_url.as_deref())?;
        validate_release_channel(&self.release_channel)
    }

    fn options(&self) -> IosBuildOptions {
        IosBuildOptions {
            build_type: self.build_type,
            release_channel: self.release_channel.clone(),
            public_url: self.public_url.clone(),
            publish: !self.no_publish,
            wait: !self.no_wait,
            clear_credentials: self.clear_credentials,
            clear_dist_cert: self.clear_dist_cert,
            clear_push_key: self.clear_push_key,
            clear_push_cert: self.clear_push_cert,
            clear_provisioning_profile: self.clear_provisioning_profile,
            revoke_credentials: self.revoke_credentials,
            skip_credentials_check: self.skip_credentials_check,
            apple_id: self.apple_id.clone(),
            team_id: self.team_id.clone(),
            dist_p12_path: self.dist_p12_path.clone(),
            push_id: self.push_id.clone(),
            push_p8_path: self.push_p8_path.clone(),
            provisioning_profile_path: self.provisioning_profile_path.clone(),
        }
    }

    /// Execute the build:ios command
    pub fn execute(self, global: &GlobalOptions) -> Result<()> {
        self.validate()?;

        if bail_on_workflow(&self.project_dir, Platform::Ios, self.skip_workflow_check, global)? {
            return Ok(());
        }

        let builder = IosBuilder::new(self.options());
        run_remote_build(&self.project_dir, &builder, global)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{codes, AppshipError};
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        cmd: BuildIosCommand,
    }

    fn parse(args: &[&str]) -> BuildIosCommand {
        TestCli::parse_from(std::iter::once("build:ios").chain(args.iter().copied())).cmd
    }

    fn code_of(err: anyhow::Error) -> Option<&'static str> {
        err.downcast_ref::<AppshipError>().and_then(|e| e.code())
    }

    #[test]
    fn test_defaults() {
        let cmd = parse(&[]);
        assert_eq!(cmd.project_dir, PathBuf::from("."));
        assert_eq!(cmd.build_type, IosBuildType::Archive);
        assert_eq!(cmd.release_channel, "default");

        let options = cmd.options();
        assert!(options.publish);
        assert!(options.wait);
    }

    #[test]
    fn test_flags_map_to_options() {
        let cmd = parse(&["./app", "-t", "simulator", "--no-wait", "--no-publish", "-c", "-r"]);
        let options = cmd.options();
        assert_eq!(options.build_type, IosBuildType::Simulator);
        assert!(!options.wait);
        assert!(!options.publish);
        assert!(options.clear_credentials);
        assert!(options.revoke_credentials);
    }

    #[test]
    fn test_validation_failures() {
        let err = parse(&["--public-url", "http://example.com"]).validate().unwrap_err();
        assert_eq!(code_of(err), Some(codes::INVALID_PUBLIC_URL));

        let err = parse(&["--release-channel", "Bad Channel!"]).validate().unwrap_err();
        assert_eq!(code_of(err), Some(codes::INVALID_RELEASE_CHANNEL));

        let err = parse(&["--skip-credentials-check", "--clear-credentials"]).validate().unwrap_err();
        assert_eq!(code_of(err), Some(codes::CONFLICTING_FLAGS));

        assert!(parse(&["--public-url", "https://example.com", "--release-channel", "prod-1"])
            .validate()
            .is_ok());
    }
}
