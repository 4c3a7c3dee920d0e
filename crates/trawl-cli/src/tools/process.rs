//! Subprocess execution shared by run_code and add_dependencies

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use trawl_agent::ToolError;

/// Maximum output size in bytes before truncation
const MAX_OUTPUT_SIZE: usize = 100_000; // 100KB
/// Maximum number of lines before truncation
const MAX_OUTPUT_LINES: usize = 1000;

/// Bounds applied to each captured stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputLimits {
    /// `None` keeps every line up to the byte budget
    pub max_lines: Option<usize>,
    pub max_bytes: usize,
}

impl Default for OutputLimits {
    fn default() -> Self {
        Self {
            max_lines: Some(MAX_OUTPUT_LINES),
            max_bytes: MAX_OUTPUT_SIZE,
        }
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout and stderr joined for error reporting
    pub fn combined(&self) -> String {
        let mut result = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !result.is_empty() {
                result.push('\n');
            }
            result.push_str(&self.stderr);
        }
        if result.is_empty() {
            result = "(no output)".to_string();
        }
        result
    }
}

/// Run a command to completion, killing it once `timeout` elapses
pub async fn run(command: Command, timeout: Duration) -> Result<ProcessOutput, ToolError> {
    run_with_limits(command, timeout, OutputLimits::default()).await
}

/// Like [`run`], with custom output bounds
pub async fn run_with_limits(
    mut command: Command,
    timeout: Duration,
    limits: OutputLimits,
) -> Result<ProcessOutput, ToolError> {
    let program = command.as_std().get_program().to_string_lossy().into_owned();

    let child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ToolError::failed(format!("Failed to spawn {}: {}", program, e)))?;

    // Dropping the child on timeout kills it
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(ToolError::failed(format!("Failed to wait for {}: {}", program, e)));
        }
        Err(_) => {
            return Err(ToolError::failed(format!(
                "{} timed out after {} seconds",
                program,
                timeout.as_secs()
            )));
        }
    };

    Ok(ProcessOutput {
        stdout: limit_output(&output.stdout, "stdout", limits),
        stderr: limit_output(&output.stderr, "stderr", limits),
        exit_code: output.status.code(),
    })
}

fn limit_output(bytes: &[u8], stream: &str, limits: OutputLimits) -> String {
    let text = String::from_utf8_lossy(bytes);
    let mut result = String::new();
    let mut truncated = false;

    for (count, line) in text.lines().enumerate() {
        if limits.max_lines.is_some_and(|max| count >= max) {
            truncated = true;
            break;
        }
        let separator = usize::from(!result.is_empty());
        let remaining = limits.max_bytes.saturating_sub(result.len() + separator);
        if separator == 1 {
            result.push('\n');
        }
        if line.len() > remaining {
            // Keep the prefix that fits rather than dropping the line
            result.push_str(&line[..char_floor(line, remaining)]);
            truncated = true;
            break;
        }
        result.push_str(line);
    }

    if truncated {
        let lines = limits
            .max_lines
            .map(|max| format!("{} lines / ", max))
            .unwrap_or_default();
        result.push_str(&format!(
            "\n\n... ({} truncated at {}{}KB)",
            stream,
            lines,
            limits.max_bytes / 1024
        ));
    }
    result
}

/// Largest char boundary in `s` that is at most `index`
fn char_floor(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    (0..=index).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut command = Command::new("sh");
        command.arg("-c").arg(script);
        command
    }

    #[tokio::test]
    async fn test_captures_both_streams() {
        let output = run(sh("echo out; echo err >&2"), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, "out");
        assert_eq!(output.stderr, "err");
        assert_eq!(output.combined(), "out\nerr");
    }

    #[tokio::test]
    async fn test_non_zero_exit_code() {
        let output = run(sh("exit 3"), Duration::from_secs(5)).await.unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.combined(), "(no output)");
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let err = run(sh("sleep 10"), Duration::from_millis(200)).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let err = run(Command::new("definitely-not-a-real-binary"), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to spawn"));
    }

    #[test]
    fn test_limit_output_truncates_lines() {
        let many: String = (0..2000).map(|i| format!("{}\n", i)).collect();
        let limited = limit_output(many.as_bytes(), "stdout", OutputLimits::default());
        assert!(limited.contains("stdout truncated"));
        assert!(limited.lines().count() < 1010);
    }

    #[test]
    fn test_limit_output_cuts_oversized_line() {
        let long = "x".repeat(150_000);
        let limited = limit_output(long.as_bytes(), "stdout", OutputLimits::default());
        let (content, notice) = limited.split_once("\n\n").unwrap();
        assert_eq!(content.len(), MAX_OUTPUT_SIZE);
        assert!(notice.contains("stdout truncated"));
    }

    #[test]
    fn test_limit_output_cuts_on_char_boundary() {
        let limits = OutputLimits {
            max_lines: None,
            max_bytes: 5,
        };
        let limited = limit_output("ab\u{e9}\u{e9}\u{e9}".as_bytes(), "stdout", limits);
        assert!(limited.starts_with("ab\u{e9}\n\n"));
    }

    #[test]
    fn test_limit_output_without_line_cap() {
        let many: String = (0..2000).map(|i| format!("{}\n", i)).collect();
        let limits = OutputLimits {
            max_lines: None,
            max_bytes: MAX_OUTPUT_SIZE,
        };
        let limited = limit_output(many.as_bytes(), "stdout", limits);
        assert_eq!(limited.lines().count(), 2000);
        assert!(!limited.contains("truncated"));
    }

    #[tokio::test]
    async fn test_large_single_line_output_kept() {
        let output = run(sh("printf '<html>%0150000d</html>' 0"), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(output.stdout.starts_with("<html>000"));
        assert!(output.stdout.len() > MAX_OUTPUT_SIZE);
    }
}
