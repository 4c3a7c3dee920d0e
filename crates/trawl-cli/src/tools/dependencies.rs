//! Package installation tool

use async_trait::async_trait;
use regex::Regex;
use serde_json::{Value, json};
use std::sync::LazyLock;
use std::time::Duration;
use tokio::process::Command;
use trawl_agent::{Tool, ToolError};

use super::process;

/// Requirement specifiers like `pandas`, `numpy==1.26` or `httpx[http2]>=0.27`.
/// Anything starting with `-` is refused so the model cannot pass flags.
static PACKAGE_SPEC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._\-]*(\[[A-Za-z0-9._,\-]+\])?([<>=!~]=?[A-Za-z0-9.*+!\-]+,?)*$")
        .unwrap()
});

/// Tool for installing Python packages
pub struct AddDependenciesTool {
    installer: Vec<String>,
    timeout: Duration,
}

impl AddDependenciesTool {
    pub fn new(installer: Vec<String>, timeout: Duration) -> Self {
        Self { installer, timeout }
    }
}

fn parse_packages(arguments: &Value) -> Result<Vec<String>, ToolError> {
    let packages = arguments
        .get("packages")
        .and_then(|v| v.as_array())
        .ok_or_else(|| ToolError::invalid("Missing 'packages' argument"))?;

    let mut names = Vec::with_capacity(packages.len());
    for package in packages {
        let name = package
            .as_str()
            .map(str::trim)
            .ok_or_else(|| ToolError::invalid("Package names must be strings"))?;
        if !PACKAGE_SPEC.is_match(name) {
            return Err(ToolError::invalid(format!("Invalid package name: {}", name)));
        }
        names.push(name.to_string());
    }

    if names.is_empty() {
        return Err(ToolError::invalid("No packages given"));
    }
    Ok(names)
}

#[async_trait]
impl Tool for AddDependenciesTool {
    fn name(&self) -> &str {
        "add_dependencies"
    }

    fn description(&self) -> &str {
        "Install Python packages so run_code can import them."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "packages": {
                    "type": "array",
                    "items": { "type": "string" },
                    "minItems": 1,
                    "description": "Package names, optionally with version specifiers"
                }
            },
            "required": ["packages"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let packages = parse_packages(&arguments)?;
        let (program, args) = self
            .installer
            .split_first()
            .ok_or_else(|| ToolError::failed("No installer configured"))?;

        tracing::info!(packages = ?packages, "installing dependencies");

        let mut command = Command::new(program);
        command.args(args).args(&packages);
        let output = process::run(command, self.timeout).await?;

        if !output.success() {
            return Err(ToolError::failed(format!(
                "Failed to install {}:\n{}",
                packages.join(" "),
                output.combined()
            )));
        }

        Ok(json!({
            "success": true,
            "output": output.combined(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_requirement_specifiers() {
        let packages = parse_packages(&json!({
            "packages": ["pandas", "numpy==1.26.4", "httpx[http2]>=0.27", "scikit-learn"]
        }))
        .unwrap();
        assert_eq!(packages.len(), 4);
    }

    #[test]
    fn test_rejects_flags_and_shell() {
        for bad in ["--index-url=http://evil", "pandas; rm -rf /", "", "a b"] {
            let result = parse_packages(&json!({ "packages": [bad] }));
            assert!(result.is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_rejects_empty_list() {
        assert!(parse_packages(&json!({ "packages": [] })).is_err());
    }

    #[tokio::test]
    async fn test_runs_installer_with_packages() {
        let tool = AddDependenciesTool::new(vec!["echo".into(), "installed".into()], Duration::from_secs(5));
        let result = tool.execute(json!({ "packages": ["pandas"] })).await.unwrap();
        assert_eq!(result["success"], true);
        assert_eq!(result["output"], "installed pandas");
    }

    #[tokio::test]
    async fn test_installer_failure() {
        let tool = AddDependenciesTool::new(vec!["false".into()], Duration::from_secs(5));
        let err = tool.execute(json!({ "packages": ["pandas"] })).await.unwrap_err();
        assert!(err.to_string().contains("Failed to install pandas"));
    }
}
