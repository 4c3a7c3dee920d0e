//! Built-in tools for quiz solving

mod dependencies;
mod download;
mod post;
mod process;
mod render;
mod run_code;
mod transcribe;

pub use dependencies::AddDependenciesTool;
pub use download::DownloadFileTool;
pub use post::PostRequestTool;
pub use render::RenderHtmlTool;
pub use run_code::RunCodeTool;
pub use transcribe::TranscribeAudioTool;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use trawl_agent::BoxedTool;

const USER_AGENT: &str = concat!("trawl/", env!("CARGO_PKG_VERSION"));

/// The closed set of tools a run can use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    GetRenderedHtml,
    DownloadFile,
    PostRequest,
    RunCode,
    AddDependencies,
    TranscribeAudio,
}

impl ToolKind {
    pub const ALL: [ToolKind; 6] = [
        ToolKind::GetRenderedHtml,
        ToolKind::DownloadFile,
        ToolKind::PostRequest,
        ToolKind::RunCode,
        ToolKind::AddDependencies,
        ToolKind::TranscribeAudio,
    ];

    /// Name the model calls the tool by
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::GetRenderedHtml => "get_rendered_html",
            ToolKind::DownloadFile => "download_file",
            ToolKind::PostRequest => "post_request",
            ToolKind::RunCode => "run_code",
            ToolKind::AddDependencies => "add_dependencies",
            ToolKind::TranscribeAudio => "transcribe_audio",
        }
    }

    /// Construct the tool from shared settings
    pub fn build(&self, settings: &ToolSettings) -> BoxedTool {
        match self {
            ToolKind::GetRenderedHtml => Arc::new(RenderHtmlTool::new(
                settings.http.clone(),
                settings.renderer.clone(),
                settings.timeout,
            )),
            ToolKind::DownloadFile => Arc::new(DownloadFileTool::new(
                settings.http.clone(),
                settings.work_dir.clone(),
            )),
            ToolKind::PostRequest => Arc::new(PostRequestTool::new(settings.http.clone())),
            ToolKind::RunCode => Arc::new(RunCodeTool::new(settings.work_dir.clone(), settings.timeout)),
            ToolKind::AddDependencies => Arc::new(AddDependenciesTool::new(
                settings.installer.clone(),
                settings.timeout,
            )),
            ToolKind::TranscribeAudio => Arc::new(TranscribeAudioTool::new(
                settings.http.clone(),
                settings.base_url.clone(),
                settings.api_key.clone(),
            )),
        }
    }
}

/// Settings shared by the built-in tools
#[derive(Debug, Clone)]
pub struct ToolSettings {
    pub http: reqwest::Client,
    pub work_dir: PathBuf,
    pub renderer: Option<Vec<String>>,
    pub installer: Vec<String>,
    pub timeout: Duration,
    pub base_url: String,
    pub api_key: String,
}

/// HTTP client used by every network tool
pub fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(60))
        .build()
}

/// Build every built-in tool
pub fn build_all(settings: &ToolSettings) -> Vec<BoxedTool> {
    ToolKind::ALL
        .iter()
        .map(|kind| {
            tracing::debug!(tool = kind.name(), "registering tool");
            kind.build(settings)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ToolSettings {
        ToolSettings {
            http: reqwest::Client::new(),
            work_dir: std::env::temp_dir(),
            renderer: None,
            installer: vec!["true".into()],
            timeout: Duration::from_secs(5),
            base_url: "http://localhost".into(),
            api_key: "test".into(),
        }
    }

    #[test]
    fn test_built_tools_match_kind_names() {
        let settings = settings();
        for kind in ToolKind::ALL {
            assert_eq!(kind.build(&settings).name(), kind.name());
        }
    }

    #[test]
    fn test_build_all_has_unique_names() {
        let tools = build_all(&settings());
        let mut names: Vec<_> = tools.iter().map(|t| t.name().to_string()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ToolKind::ALL.len());
    }

    #[test]
    fn test_schemas_describe_objects() {
        for tool in build_all(&settings()) {
            let schema = tool.parameters_schema();
            assert_eq!(schema["type"], "object", "{} schema", tool.name());
            assert!(schema["properties"].is_object(), "{} schema", tool.name());
        }
    }
}
