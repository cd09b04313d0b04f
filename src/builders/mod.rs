//! Standalone app builders backed by the remote build service
//!
//! ## Architecture
//!
//! ```text
//! commands/build_*.rs → BaseBuilder::run → PlatformBuilder (ios/android) → BuildService
//! ```
//!
//! `BaseBuilder` owns the sequence shared by every platform: check local
//! inputs and assemble the request, clear and upload credentials, start the
//! build and optionally wait for it. Platform builders only describe what to send.

pub mod android;
pub mod ios;

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use console::style;

use crate::config::AppManifest;
use crate::error::{codes, AppshipError};
use crate::service::{
    BuildJob, BuildRequest, BuildService, BuildStatus, ClearCredentials, CredentialsUpload, Platform,
};
use crate::utils::terminal::{create_spinner, print_info, print_success, print_verbose};
use crate::warnings::WarningAggregator;

/// Trait implemented by platform-specific builders
pub trait PlatformBuilder {
    fn platform(&self) -> Platform;

    /// Check flags and local files before anything is sent
    fn validate_inputs(&self) -> Result<()>;

    /// Stored credentials to drop before the build
    fn clear_credentials(&self) -> ClearCredentials;

    /// Credentials given on the command line
    fn credentials_upload(&self) -> CredentialsUpload;

    /// Assemble the build request
    fn build_request(
        &self,
        slug: &str,
        manifest: &AppManifest,
        warnings: &mut WarningAggregator,
    ) -> Result<BuildRequest>;

    /// Whether to wait for the build to finish
    fn wait(&self) -> bool;
}

/// Polling behavior while waiting for a build
#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(60 * 60),
        }
    }
}

/// Shared builder logic for one project
pub struct BaseBuilder<'a> {
    project_dir: PathBuf,
    service: &'a dyn BuildService,
    poll: PollOptions,
    verbose: bool,
}

impl<'a> BaseBuilder<'a> {
    pub fn new(project_dir: &Path, service: &'a dyn BuildService, verbose: bool) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
            service,
            poll: PollOptions::default(),
            verbose,
        }
    }

    #[cfg(test)]
    pub fn with_poll_options(mut self, poll: PollOptions) -> Self {
        self.poll = poll;
        self
    }

    fn load_manifest(&self) -> Result<(AppManifest, String)> {
        let manifest = AppManifest::load_from_project(&self.project_dir)?;
        let slug = manifest.slug().map(str::to_string).ok_or_else(|| {
            AppshipError::config_error_with_hint(
                "The app manifest has no slug or name",
                None,
                "Add \"slug\": \"my-app\" to app.json",
            )
        })?;
        Ok((manifest, slug))
    }

    /// Schedule a build and, unless disabled, wait for its result
    pub fn run(&self, builder: &dyn PlatformBuilder) -> Result<BuildJob> {
        builder.validate_inputs()?;

        let (manifest, slug) = self.load_manifest()?;
        let platform = builder.platform();
        print_verbose(self.verbose, &format!("Building {} for {}", slug, platform));

        // The request is complete before the service sees anything
        let mut warnings = WarningAggregator::default();
        let request = builder.build_request(&slug, &manifest, &mut warnings)?;
        warnings.flush();

        let clear = builder.clear_credentials();
        if clear.any() {
            self.service.clear_credentials(platform, &slug, &clear)?;
            print_info("Removed stored credentials");
        }

        let upload = builder.credentials_upload();
        if !upload.is_empty() {
            self.service.upload_credentials(platform, &slug, &upload)?;
            print_info("Uploaded credentials");
        }

        let job = self.service.start_build(&request)?;
        print_success(&format!("Build started (id: {})", job.id));

        if !builder.wait() {
            print_info(&format!(
                "Not waiting for the build to finish. Run {} to check its progress.",
                style(format!("appship build:status {}", self.project_dir.display())).bold()
            ));
            return Ok(job);
        }

        self.wait_for_build(&slug, &job.id, request.public_url.as_deref())
    }

    /// Poll the service until the job reaches a terminal status
    pub fn wait_for_build(&self, slug: &str, job_id: &str, public_url: Option<&str>) -> Result<BuildJob> {
        let start = Instant::now();
        let spinner = create_spinner("Waiting for build to complete...");

        let result = loop {
            let jobs = self.service.build_status(slug, public_url)?;
            if let Some(job) = jobs.into_iter().find(|j| j.id == job_id) {
                spinner.set_message(format!("Build {} is {}", job.id, job.status));
                if job.status.is_terminal() {
                    break job;
                }
            }

            if start.elapsed() >= self.poll.timeout {
                spinner.finish_and_clear();
                return Err(AppshipError::command_error(
                    codes::BUILD_FAILED,
                    format!("Timed out waiting for build {}", job_id),
                )
                .into());
            }
            thread::sleep(self.poll.interval);
        };
        spinner.finish_and_clear();

        match result.status {
            BuildStatus::Finished => {
                print_success("Build finished");
                if let Some(ref url) = result.artifact_url {
                    println!("  Artifact: {}", style(url).underlined());
                }
                Ok(result)
            }
            status => {
                let mut message = format!("Build {} {}", result.id, status);
                if let Some(ref error) = result.error {
                    message.push_str(&format!(": {}", error));
                }
                if let Some(ref logs) = result.logs_url {
                    message.push_str(&format!("\nLogs: {}", logs));
                }
                Err(AppshipError::command_error(codes::BUILD_FAILED, message).into())
            }
        }
    }

    /// Print the latest builds of the project
    pub fn command_check_status(&self, public_url: Option<&str>) -> Result<Vec<BuildJob>> {
        let (_, slug) = self.load_manifest()?;
        let jobs = self.service.build_status(&slug, public_url)?;

        if jobs.is_empty() {
            print_info(&format!("No builds found for {}", slug));
            return Ok(jobs);
        }

        println!("{}", style(format!("Latest builds for {}", slug)).bold());
        for job in &jobs {
            println!("{}", format_job_line(job));
        }
        Ok(jobs)
    }
}

/// One line of the status listing
pub fn format_job_line(job: &BuildJob) -> String {
    let created = job
        .created_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    let mut line = format!(
        "  {:<8} {:<12} {:<17} {}",
        job.platform.to_string(),
        job.status.to_string(),
        created,
        job.id
    );
    if let Some(ref url) = job.artifact_url {
        line.push_str(&format!("  {}", url));
    }
    line
}

/// Error for a credential file given on the command line that does not exist
pub(crate) fn check_credential_file(flag: &str, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        if !path.is_file() {
            return Err(AppshipError::command_error(
                codes::MISSING_CREDENTIAL_FILE,
                format!("{} points to a missing file: {}", flag, path.display()),
            )
            .into());
        }
    }
    Ok(())
}

/// Read a required credential password from the environment
pub(crate) fn required_env(name: &str, needed_for: &str) -> Result<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty()).ok_or_else(|| {
        AppshipError::command_error_with_hint(
            codes::MISSING_ENV_VAR,
            format!("{} is required when using {}", name, needed_for),
            format!("export {}=... before running the command", name),
        )
        .into()
    })
}
