//! HTTP implementation of [`BuildService`]

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::session::Session;
use super::{BuildJob, BuildRequest, BuildService, ClearCredentials, CredentialsUpload, Platform};
use crate::error::AppshipError;

/// Envelope of every service response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct StatusData {
    #[serde(default)]
    jobs: Vec<BuildJob>,
}

/// Blocking client for the build service REST API
pub struct HttpBuildService {
    client: Client,
    base_url: String,
    session: Session,
}

impl HttpBuildService {
    pub fn new(base_url: impl Into<String>, session: Session) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("appship/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            session,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v2/{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("appship-session", &self.session.secret)
    }

    /// Send a request whose response must carry `data`
    fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = self
            .authorized(request)
            .send()
            .with_context(|| format!("Failed to {}", what))?;
        let status = response.status().as_u16();
        Self::parse(response, what)?.ok_or_else(|| {
            AppshipError::service_error(format!("Failed to {}: empty response", what), Some(status)).into()
        })
    }

    /// Send a request and only check that it succeeded
    fn send_ok(&self, request: RequestBuilder, what: &str) -> Result<()> {
        let response = self
            .authorized(request)
            .send()
            .with_context(|| format!("Failed to {}", what))?;
        Self::parse::<serde_json::Value>(response, what)?;
        Ok(())
    }

    fn parse<T: DeserializeOwned>(response: Response, what: &str) -> Result<Option<T>> {
        let status = response.status();
        let body: Option<ApiResponse<T>> = response.json().ok();

        let (data, errors) = match body {
            Some(body) => (body.data, body.errors),
            None => (None, Vec::new()),
        };

        if !status.is_success() || !errors.is_empty() {
            let message = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            let message = if message.is_empty() {
                format!("Failed to {}: HTTP {}", what, status.as_u16())
            } else {
                format!("Failed to {}: {}", what, message)
            };
            return Err(AppshipError::service_error(message, Some(status.as_u16())).into());
        }

        Ok(data)
    }
}

impl BuildService for HttpBuildService {
    fn clear_credentials(&self, platform: Platform, slug: &str, clear: &ClearCredentials) -> Result<()> {
        let body = serde_json::json!({
            "platform": platform,
            "slug": slug,
            "clear": clear,
        });
        self.send_ok(self.client.post(self.url("credentials/clear")).json(&body), "clear credentials")
    }

    fn upload_credentials(&self, platform: Platform, slug: &str, upload: &CredentialsUpload) -> Result<()> {
        let mut form = multipart::Form::new()
            .text("platform", platform.to_string())
            .text("slug", slug.to_string());
        for (name, value) in &upload.fields {
            form = form.text(name.clone(), value.clone());
        }
        for (name, path) in &upload.files {
            form = form
                .file(name.clone(), path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
        }

        self.send_ok(
            self.client.post(self.url("credentials/upload")).multipart(form),
            "upload credentials",
        )
    }

    fn start_build(&self, request: &BuildRequest) -> Result<BuildJob> {
        self.send(self.client.post(self.url("build/start")).json(request), "start build")
    }

    fn build_status(&self, slug: &str, public_url: Option<&str>) -> Result<Vec<BuildJob>> {
        let mut query = vec![("slug", slug)];
        if let Some(url) = public_url {
            query.push(("publicUrl", url));
        }
        let data: StatusData = self.send(
            self.client.get(self.url("build/status")).query(&query),
            "fetch build status",
        )?;
        Ok(data.jobs)
    }
}
