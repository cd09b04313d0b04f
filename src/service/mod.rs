//! Remote build service client
//!
//! Builders talk to the service through the [`BuildService`] trait; the
//! production implementation is [`HttpBuildService`].

pub mod http;
pub mod session;

use std::fmt;
use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use http::HttpBuildService;

/// Environment variable overriding the service endpoint
pub const API_URL_ENV: &str = "APPSHIP_API_URL";
pub const DEFAULT_API_URL: &str = "https://api.appship.dev";

/// Base URL of the build service
pub fn api_base_url() -> String {
    std::env::var(API_URL_ENV)
        .ok()
        .filter(|url| !url.trim().is_empty())
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

/// Target platform of a standalone build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Ios => write!(f, "ios"),
            Platform::Android => write!(f, "android"),
        }
    }
}

/// Request to schedule a standalone build
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    pub platform: Platform,
    pub slug: String,
    #[serde(rename = "type")]
    pub build_type: String,
    pub release_channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdk_version: Option<String>,
    pub publish: bool,
    pub skip_credentials_check: bool,
}

/// Stored credentials to drop before building
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearCredentials {
    pub all: bool,
    pub dist_cert: bool,
    pub push_key: bool,
    pub push_cert: bool,
    pub provisioning_profile: bool,
    /// Also revoke on the Apple developer portal
    pub revoke: bool,
}

impl ClearCredentials {
    pub fn any(&self) -> bool {
        self.all || self.dist_cert || self.push_key || self.push_cert || self.provisioning_profile
    }
}

/// Credentials supplied on the command line, uploaded as a multipart form
#[derive(Debug, Clone, Default)]
pub struct CredentialsUpload {
    /// Plain form fields (ids, aliases, passwords)
    pub fields: Vec<(String, String)>,
    /// Form field name and local file to attach
    pub files: Vec<(String, PathBuf)>,
}

impl CredentialsUpload {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.files.is_empty()
    }

    pub fn field(&mut self, name: &str, value: Option<impl Into<String>>) {
        if let Some(value) = value {
            self.fields.push((name.to_string(), value.into()));
        }
    }

    pub fn file(&mut self, name: &str, path: Option<PathBuf>) {
        if let Some(path) = path {
            self.files.push((name.to_string(), path));
        }
    }
}

/// Status of a build job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildStatus {
    Pending,
    InQueue,
    InProgress,
    Finished,
    Errored,
    Canceled,
}

impl BuildStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BuildStatus::Finished | BuildStatus::Errored | BuildStatus::Canceled)
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildStatus::Pending => "pending",
            BuildStatus::InQueue => "in queue",
            BuildStatus::InProgress => "in progress",
            BuildStatus::Finished => "finished",
            BuildStatus::Errored => "errored",
            BuildStatus::Canceled => "canceled",
        };
        write!(f, "{}", s)
    }
}

/// A build job as reported by the service
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildJob {
    pub id: String,
    pub platform: Platform,
    pub status: BuildStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub artifact_url: Option<String>,
    pub logs_url: Option<String>,
    pub error: Option<String>,
}

/// Remote build service operations
pub trait BuildService {
    /// Drop stored credentials for the app
    fn clear_credentials(&self, platform: Platform, slug: &str, clear: &ClearCredentials) -> Result<()>;

    /// Upload credentials supplied on the command line
    fn upload_credentials(&self, platform: Platform, slug: &str, upload: &CredentialsUpload) -> Result<()>;

    /// Schedule a build
    fn start_build(&self, request: &BuildRequest) -> Result<BuildJob>;

    /// Most recent builds of the project, newest first
    fn build_status(&self, slug: &str, public_url: Option<&str>) -> Result<Vec<BuildJob>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = BuildRequest {
            platform: Platform::Ios,
            slug: "demo".into(),
            build_type: "archive".into(),
            release_channel: "default".into(),
            public_url: None,
            app_identifier: Some("com.example.demo".into()),
            sdk_version: None,
            publish: true,
            skip_credentials_check: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["platform"], "ios");
        assert_eq!(json["type"], "archive");
        assert_eq!(json["releaseChannel"], "default");
        assert_eq!(json["appIdentifier"], "com.example.demo");
        assert!(json.get("publicUrl").is_none());
    }

    #[test]
    fn test_job_deserialization() {
        let job: BuildJob = serde_json::from_str(
            r#"{"id": "42", "platform": "android", "status": "in-progress",
                "createdAt": "2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(job.status, BuildStatus::InProgress);
        assert!(!job.status.is_terminal());
        assert!(job.created_at.is_some());
        assert!(job.artifact_url.is_none());
    }

    #[test]
    fn test_clear_credentials_any() {
        assert!(!ClearCredentials::default().any());
        let revoke_only = ClearCredentials { revoke: true, ..Default::default() };
        assert!(!revoke_only.any());
        assert!(ClearCredentials { push_key: true, ..Default::default() }.any());
    }

    #[test]
    fn test_credentials_upload_skips_missing() {
        let mut upload = CredentialsUpload::default();
        upload.field("teamId", None::<String>);
        upload.file("distP12", None);
        assert!(upload.is_empty());

        upload.field("teamId", Some("ABCDE12345"));
        upload.file("distP12", Some(PathBuf::from("dist.p12")));
        assert_eq!(upload.fields.len(), 1);
        assert_eq!(upload.files.len(), 1);
    }
}
