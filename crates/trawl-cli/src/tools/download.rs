//! File download tool

use async_trait::async_trait;
use serde_json::{Value, json};
use std::path::{Component, Path, PathBuf};
use trawl_agent::{Tool, ToolError};

use crate::utils::url_file_name;

/// Tool for saving a remote file into the work directory
pub struct DownloadFileTool {
    client: reqwest::Client,
    work_dir: PathBuf,
}

impl DownloadFileTool {
    pub fn new(client: reqwest::Client, work_dir: PathBuf) -> Self {
        Self { client, work_dir }
    }

    /// Resolve where a download lands, keeping it inside the work directory
    fn destination(&self, url: &str, requested: Option<&str>) -> Result<PathBuf, ToolError> {
        let name = match requested {
            Some(name) => name.to_string(),
            None => url_file_name(url).unwrap_or_else(|| "download".to_string()),
        };
        let relative = Path::new(&name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || name.trim().is_empty() {
            return Err(ToolError::invalid(format!(
                "Destination must be a relative path inside the work directory: {}",
                name
            )));
        }
        Ok(self.work_dir.join(relative))
    }
}

#[async_trait]
impl Tool for DownloadFileTool {
    fn name(&self) -> &str {
        "download_file"
    }

    fn description(&self) -> &str {
        "Download a file from a URL into the work directory. Returns the saved path and size. \
         Use run_code to read it afterwards."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Full URL of the file"
                },
                "destination": {
                    "type": "string",
                    "description": "File name to save as (optional, defaults to the URL's file name)"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let url = arguments
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::invalid("Missing 'url' argument"))?;
        let path = self.destination(url, arguments.get("destination").and_then(|v| v.as_str()))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ToolError::failed(format!("Request failed: {}", e)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::failed(format!("HTTP error: {}", status)));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ToolError::failed(format!("Failed to read body: {}", e)))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;
        tracing::debug!(url, path = %path.display(), bytes = bytes.len(), "downloaded file");

        Ok(json!({
            "path": path.display().to_string(),
            "bytes": bytes.len(),
        }))
    }
}
