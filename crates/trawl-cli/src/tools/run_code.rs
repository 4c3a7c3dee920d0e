//! Code execution tool

use async_trait::async_trait;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use trawl_agent::{Tool, ToolError};

use super::process;

/// Tool for running model-written Python or bash code
pub struct RunCodeTool {
    work_dir: PathBuf,
    timeout: Duration,
}

impl RunCodeTool {
    pub fn new(work_dir: PathBuf, timeout: Duration) -> Self {
        Self { work_dir, timeout }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Language {
    Python,
    Bash,
}

impl Language {
    /// Names match the `language` enum in the parameters schema
    fn parse(name: &str) -> Option<Self> {
        match name {
            "python" => Some(Language::Python),
            "bash" => Some(Language::Bash),
            _ => None,
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::Bash => "sh",
        }
    }

    fn interpreter(&self) -> &'static str {
        match self {
            Language::Python => "python3",
            Language::Bash => "bash",
        }
    }
}

#[async_trait]
impl Tool for RunCodeTool {
    fn name(&self) -> &str {
        "run_code"
    }

    fn description(&self) -> &str {
        "Run Python or bash code in the work directory and return stdout, stderr and the exit code. \
         Downloaded files are in the same directory. Print the values you need."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "Source code to run"
                },
                "language": {
                    "type": "string",
                    "enum": ["python", "bash"],
                    "description": "Language of the code (default: python)"
                }
            },
            "required": ["code"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let code = arguments
            .get("code")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::invalid("Missing 'code' argument"))?;
        let language = match arguments.get("language").and_then(|v| v.as_str()) {
            Some(name) => Language::parse(name)
                .ok_or_else(|| ToolError::invalid(format!("Unsupported language: {}", name)))?,
            None => Language::Python,
        };

        tokio::fs::create_dir_all(&self.work_dir).await?;
        let script = self.work_dir.join(format!(
            "run_{}.{}",
            uuid::Uuid::new_v4().simple(),
            language.extension()
        ));
        tokio::fs::write(&script, code).await?;

        let mut command = Command::new(language.interpreter());
        command.arg(&script).current_dir(&self.work_dir);
        let result = process::run(command, self.timeout).await;

        if let Err(e) = tokio::fs::remove_file(&script).await {
            tracing::debug!("Failed to remove {}: {}", script.display(), e);
        }

        let output = result?;
        if !output.success() {
            let code = output
                .exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            return Err(ToolError::failed(format!(
                "{}\n\nProcess exited with code {}",
                output.combined(),
                code
            )));
        }

        Ok(json!({
            "stdout": output.stdout,
            "stderr": output.stderr,
            "exit_code": output.exit_code,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(dir: &tempfile::TempDir) -> RunCodeTool {
        RunCodeTool::new(dir.path().to_path_buf(), Duration::from_secs(10))
    }

    #[tokio::test]
    async fn test_bash_runs_in_work_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data.csv"), "a,b\n1,2\n").unwrap();

        let result = tool(&dir)
            .execute(json!({"code": "wc -l < data.csv", "language": "bash"}))
            .await
            .unwrap();
        assert_eq!(result["stdout"].as_str().map(str::trim), Some("2"));
        assert_eq!(result["exit_code"], 0);
    }

    #[tokio::test]
    async fn test_failure_carries_output() {
        let dir = tempfile::tempdir().unwrap();
        let err = tool(&dir)
            .execute(json!({"code": "echo broken >&2; exit 2", "language": "bash"}))
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("broken"));
        assert!(message.contains("exited with code 2"));
    }

    #[tokio::test]
    async fn test_script_is_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        tool(&dir)
            .execute(json!({"code": "true", "language": "bash"}))
            .await
            .unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_language() {
        let dir = tempfile::tempdir().unwrap();
        let err = tool(&dir)
            .execute(json!({"code": "1", "language": "cobol"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn test_parse_accepts_exactly_the_schema_languages() {
        let dir = tempfile::tempdir().unwrap();
        let schema = tool(&dir).parameters_schema();
        let listed = schema["properties"]["language"]["enum"].as_array().unwrap();
        for name in listed {
            assert!(Language::parse(name.as_str().unwrap()).is_some(), "{}", name);
        }
        assert_eq!(Language::parse("py"), None);
        assert_eq!(Language::parse("sh"), None);
    }

    #[test]
    fn test_registry_rejects_unlisted_language() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = trawl_agent::ToolRegistry::new();
        registry.register(std::sync::Arc::new(tool(&dir)));
        assert!(registry.validate("run_code", &json!({"code": "1", "language": "python"})).is_ok());
        assert!(registry.validate("run_code", &json!({"code": "1", "language": "py"})).is_err());
    }
}
