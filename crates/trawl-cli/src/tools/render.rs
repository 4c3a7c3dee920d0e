//! Page rendering tool

use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::process::Command;
use trawl_agent::{Tool, ToolError};

use super::process::{self, OutputLimits};
use crate::utils::truncate_chars;

/// Maximum HTML characters handed back to the model
const MAX_HTML_CHARS: usize = 100_000;

/// DOM dumps are bounded by size only; a page can span any number of lines
const RENDER_LIMITS: OutputLimits = OutputLimits {
    max_lines: None,
    max_bytes: MAX_HTML_CHARS * 4,
};

/// Tool for fetching a page after its scripts have run.
///
/// Uses a headless browser command (`<renderer...> <url>`, DOM on stdout)
/// when one is configured and falls back to a plain GET otherwise or when
/// the browser fails.
pub struct RenderHtmlTool {
    client: reqwest::Client,
    renderer: Option<Vec<String>>,
    timeout: Duration,
}

impl RenderHtmlTool {
    pub fn new(client: reqwest::Client, renderer: Option<Vec<String>>, timeout: Duration) -> Self {
        Self {
            client,
            renderer,
            timeout,
        }
    }

    async fn render(&self, renderer: &[String], url: &str) -> Result<String, ToolError> {
        let (program, args) = renderer
            .split_first()
            .ok_or_else(|| ToolError::failed("Empty renderer command"))?;
        let mut command = Command::new(program);
        command.args(args).arg(url);

        let output = process::run_with_limits(command, self.timeout, RENDER_LIMITS).await?;
        if !output.success() || output.stdout.trim().is_empty() {
            return Err(ToolError::failed(format!(
                "Renderer produced no page: {}",
                output.combined()
            )));
        }
        Ok(output.stdout)
    }

    async fn fetch(&self, url: &str) -> Result<(String, u16), ToolError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ToolError::failed(format!("Request failed: {}", e)))?;
        let status = response.status().as_u16();
        let html = response
            .text()
            .await
            .map_err(|e| ToolError::failed(format!("Failed to read body: {}", e)))?;
        Ok((html, status))
    }
}

#[async_trait]
impl Tool for RenderHtmlTool {
    fn name(&self) -> &str {
        "get_rendered_html"
    }

    fn description(&self) -> &str {
        "Fetch a web page and return its HTML after JavaScript has run. \
         Use this to read quiz pages."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Full URL of the page"
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

        if let Some(renderer) = &self.renderer {
            match self.render(renderer, url).await {
                Ok(html) => {
                    return Ok(json!({
                        "html": truncate_chars(&html, MAX_HTML_CHARS),
                        "status": Value::Null,
                        "rendered": true,
                    }));
                }
                Err(e) => tracing::warn!(url, "Rendering failed, falling back to plain fetch: {}", e),
            }
        }

        let (html, status) = self.fetch(url).await?;
        if status >= 400 {
            return Err(ToolError::failed(format!(
                "HTTP error {}: {}",
                status,
                truncate_chars(&html, 500)
            )));
        }

        Ok(json!({
            "html": truncate_chars(&html, MAX_HTML_CHARS),
            "status": status,
            "rendered": false,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn page_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/q1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>plain</p>"))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_plain_fetch_without_renderer() {
        let server = page_server().await;
        let tool = RenderHtmlTool::new(reqwest::Client::new(), None, Duration::from_secs(5));
        let result = tool
            .execute(json!({ "url": format!("{}/q1", server.uri()) }))
            .await
            .unwrap();
        assert_eq!(result["html"], "<p>plain</p>");
        assert_eq!(result["status"], 200);
        assert_eq!(result["rendered"], false);
    }

    #[tokio::test]
    async fn test_renderer_output_used() {
        // sh receives the url as $0 and ignores it
        let renderer = vec!["sh".into(), "-c".into(), "echo '<p>rendered</p>'".into()];
        let tool = RenderHtmlTool::new(reqwest::Client::new(), Some(renderer), Duration::from_secs(5));
        let result = tool
            .execute(json!({ "url": "https://quiz.example/q1" }))
            .await
            .unwrap();
        assert_eq!(result["html"], "<p>rendered</p>");
        assert_eq!(result["rendered"], true);
    }

    #[tokio::test]
    async fn test_large_rendered_page_truncated_not_lost() {
        let renderer = vec![
            "sh".into(),
            "-c".into(),
            "printf '<html>%0150000d</html>' 0".into(),
        ];
        let tool = RenderHtmlTool::new(reqwest::Client::new(), Some(renderer), Duration::from_secs(5));
        let result = tool
            .execute(json!({ "url": "https://quiz.example/big" }))
            .await
            .unwrap();
        let html = result["html"].as_str().unwrap();
        assert!(html.starts_with("<html>0000"));
        assert_eq!(html.chars().count(), MAX_HTML_CHARS + 3);
        assert_eq!(result["rendered"], true);
    }

    #[tokio::test]
    async fn test_many_line_page_not_capped_by_lines() {
        let renderer = vec!["sh".into(), "-c".into(), "seq 1 3000".into()];
        let tool = RenderHtmlTool::new(reqwest::Client::new(), Some(renderer), Duration::from_secs(5));
        let result = tool
            .execute(json!({ "url": "https://quiz.example/long" }))
            .await
            .unwrap();
        let html = result["html"].as_str().unwrap();
        assert_eq!(html.lines().count(), 3000);
        assert!(html.ends_with("3000"));
    }

    #[tokio::test]
    async fn test_missing_renderer_falls_back() {
        let server = page_server().await;
        let renderer = vec!["no-such-headless-browser".into()];
        let tool = RenderHtmlTool::new(reqwest::Client::new(), Some(renderer), Duration::from_secs(5));
        let result = tool
            .execute(json!({ "url": format!("{}/q1", server.uri()) }))
            .await
            .unwrap();
        assert_eq!(result["html"], "<p>plain</p>");
        assert_eq!(result["rendered"], false);
    }

    #[tokio::test]
    async fn test_not_found_is_tool_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
            .mount(&server)
            .await;
        let tool = RenderHtmlTool::new(reqwest::Client::new(), None, Duration::from_secs(5));
        let err = tool
            .execute(json!({ "url": format!("{}/gone", server.uri()) }))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("HTTP error 404"));
    }
}
