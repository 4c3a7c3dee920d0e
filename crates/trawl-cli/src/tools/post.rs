//! Answer submission tool

use async_trait::async_trait;
use serde_json::{Value, json};
use trawl_agent::{Tool, ToolError};

const REQUIRED_FIELDS: [&str; 4] = ["email", "secret", "url", "answer"];

/// Tool for POSTing a JSON answer to a submit endpoint
pub struct PostRequestTool {
    client: reqwest::Client,
}

impl PostRequestTool {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Check the submission before it leaves the process
fn validate_payload(payload: &Value) -> Result<(), ToolError> {
    let object = payload
        .as_object()
        .ok_or_else(|| ToolError::invalid("Payload must be a JSON object"))?;

    let missing: Vec<_> = REQUIRED_FIELDS
        .iter()
        .filter(|field| !object.contains_key(**field))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(ToolError::invalid(format!(
            "Payload is missing: {}",
            missing.join(", ")
        )));
    }

    match &object["answer"] {
        Value::Null => Err(ToolError::invalid("answer must not be null")),
        Value::String(s) if s.trim().is_empty() => Err(ToolError::invalid("answer must not be empty")),
        _ => Ok(()),
    }
}

#[async_trait]
impl Tool for PostRequestTool {
    fn name(&self) -> &str {
        "post_request"
    }

    fn description(&self) -> &str {
        "POST a JSON answer to a submit endpoint and return the server's status and response. \
         The payload must contain email, secret, url and a non-empty answer."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Full submit URL starting with https://"
                },
                "payload": {
                    "type": "object",
                    "description": "JSON body with email, secret, url and answer",
                    "properties": {
                        "email": { "type": "string" },
                        "secret": { "type": "string" },
                        "url": { "type": "string" },
                        "answer": {}
                    },
                    "required": ["email", "secret", "url", "answer"]
                }
            },
            "required": ["url", "payload"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let url = arguments
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::invalid("Missing 'url' argument"))?;
        let payload = arguments
            .get("payload")
            .ok_or_else(|| ToolError::invalid("Missing 'payload' argument"))?;
        validate_payload(payload)?;

        tracing::info!(url, answer = %payload["answer"], "submitting answer");

        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| ToolError::failed(format!("Request failed: {}", e)))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ToolError::failed(format!("Failed to read response: {}", e)))?;
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));

        tracing::debug!(status, response = %body, "submission response");

        Ok(json!({
            "status": status,
            "response": body,
        }))
    }
}
