//! Print job submission and lifecycle over the authenticated session.

pub mod settings;

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use log::info;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

use crate::auth::context::AuthContext;
use crate::error::{Error, Result};
use self::settings::{
    merge_with_defaults, validate_settings, PrintMode, PrintSettings, ResolvedPrintSettings,
};

const VALID_EXTENSIONS: [&str; 13] = [
    "doc", "docx", "xls", "xlsx", "ppt", "pptx", "pdf", "jpeg", "jpg", "bmp", "gif", "png", "tiff",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    User,
    Operator,
}

#[derive(Debug, Deserialize)]
struct JobCreated {
    id: String,
    upload_uri: String,
}

/// A created print job: its remote id, the signed upload URI, and the
/// settings it was created with.
#[derive(Debug, Clone)]
pub struct PrintJob {
    pub id: String,
    pub upload_uri: String,
    pub settings: ResolvedPrintSettings,
}

#[derive(Debug)]
pub struct Printer {
    auth: Arc<AuthContext>,
}

impl Printer {
    pub(crate) fn new(auth: Arc<AuthContext>) -> Self {
        Printer { auth }
    }

    pub async fn device_id(&self) -> String {
        self.auth.device_id().await
    }

    async fn printer_path(&self, suffix: &str) -> Result<String> {
        self.auth.ensure_authenticated().await?;
        Ok(format!(
            "/api/1/printing/printers/{}{}",
            self.auth.device_id().await,
            suffix
        ))
    }

    pub async fn capabilities(&self, mode: PrintMode) -> Result<Value> {
        let path = self
            .printer_path(&format!("/capability/{}", mode.as_str()))
            .await?;
        self.auth.send(Method::GET, &path, None).await
    }

    /// Creates a print job from the given settings, merged with service
    /// defaults and validated locally first.
    pub async fn create_job(&self, settings: PrintSettings) -> Result<PrintJob> {
        let resolved = merge_with_defaults(&settings);
        validate_settings(&resolved)?;

        let path = self.printer_path("/jobs").await?;
        let response = self
            .auth
            .send(Method::POST, &path, Some(serde_json::to_value(&resolved)?))
            .await?;
        let created: JobCreated = serde_json::from_value(response)?;

        Ok(PrintJob {
            id: created.id,
            upload_uri: created.upload_uri,
            settings: resolved,
        })
    }

    /// Uploads the file to print. `file_path` is a local path or an http(s)
    /// URL; the payload is posted to the job's signed upload URI.
    pub async fn upload_file(
        &self,
        upload_uri: &str,
        file_path: &str,
        print_mode: PrintMode,
    ) -> Result<Value> {
        let extension = file_extension(file_path)?;
        let path = upload_path(upload_uri, &extension)?;

        let content_type = match print_mode {
            PrintMode::Photo => "image/jpeg",
            PrintMode::Document => "application/octet-stream",
        };

        let data: Bytes = if file_path.starts_with("http://") || file_path.starts_with("https://")
        {
            self.auth.fetch_bytes(file_path).await?
        } else {
            Bytes::from(tokio::fs::read(file_path).await?)
        };

        self.auth
            .send_octets(Method::POST, &path, data, content_type)
            .await
    }

    pub async fn execute_print(&self, job_id: &str) -> Result<Value> {
        let path = self.printer_path(&format!("/jobs/{job_id}/print")).await?;
        self.auth.send(Method::POST, &path, None).await
    }

    /// Create, upload, print. Returns the job id.
    pub async fn print(&self, file_path: &str, settings: PrintSettings) -> Result<String> {
        let job = self.create_job(settings).await?;
        self.upload_file(&job.upload_uri, file_path, job.settings.print_mode)
            .await?;
        self.execute_print(&job.id).await?;
        info!("submitted print job {}", job.id);
        Ok(job.id)
    }

    /// Cancels a job. Only jobs still pending on the service side may be
    /// cancelled; anything else fails locally after the status lookup.
    pub async fn cancel_print(&self, job_id: &str, operated_by: Operator) -> Result<Value> {
        let status = self
            .job_info(job_id)
            .await?
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if status != "pending" && status != "pending_held" {
            return Err(Error::Printer(format!(
                "can not cancel job with status {status}"
            )));
        }

        let path = self.printer_path(&format!("/jobs/{job_id}/cancel")).await?;
        self.auth
            .send(Method::POST, &path, Some(json!({ "operated_by": operated_by })))
            .await
    }

    pub async fn job_info(&self, job_id: &str) -> Result<Value> {
        let path = self.printer_path(&format!("/jobs/{job_id}")).await?;
        self.auth.send(Method::GET, &path, None).await
    }

    pub async fn info(&self) -> Result<Value> {
        let path = self.printer_path("").await?;
        self.auth.send(Method::GET, &path, None).await
    }

    /// Enables or disables job-state callbacks to `callback_uri`.
    pub async fn notification(&self, callback_uri: &str, enabled: bool) -> Result<Value> {
        let path = self.printer_path("/settings/notifications").await?;
        self.auth
            .send(
                Method::POST,
                &path,
                Some(json!({
                    "notification": enabled,
                    "callback_uri": callback_uri,
                })),
            )
            .await
    }
}

fn file_extension(file_path: &str) -> Result<String> {
    let extension = Path::new(file_path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if !VALID_EXTENSIONS.contains(&extension.as_str()) {
        return Err(Error::Printer(format!(
            "{extension:?} is not a valid printing extension"
        )));
    }
    Ok(extension)
}

/// Rewrites the signed upload URI into a path relative to the API base,
/// keeping the signed query and adding the `File=1.<ext>` name the upload
/// endpoint expects.
fn upload_path(upload_uri: &str, extension: &str) -> Result<String> {
    let mut url =
        Url::parse(upload_uri).map_err(|e| Error::Printer(format!("invalid upload uri: {e}")))?;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    {
        let mut query = url.query_pairs_mut();
        query.clear();
        for (key, value) in &pairs {
            if key != "File" {
                query.append_pair(key, value);
            }
        }
        query.append_pair("File", &format!("1.{extension}"));
    }
    Ok(format!("{}?{}", url.path(), url.query().unwrap_or("")))
}
