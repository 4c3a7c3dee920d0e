//! Audio transcription tool

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use trawl_agent::{Tool, ToolError};

use crate::utils::{truncate_chars, url_file_name};

const TRANSCRIPTION_MODEL: &str = "openai/whisper-1";

/// Tool that downloads an audio file and sends it to the provider's
/// transcription endpoint
pub struct TranscribeAudioTool {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TranscribeAudioTool {
    pub fn new(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/audio/transcriptions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Tool for TranscribeAudioTool {
    fn name(&self) -> &str {
        "transcribe_audio"
    }

    fn description(&self) -> &str {
        "Download an audio file and return its transcription."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "audio_url": {
                    "type": "string",
                    "description": "Full URL of the audio file"
                }
            },
            "required": ["audio_url"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let audio_url = arguments
            .get("audio_url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::invalid("Missing 'audio_url' argument"))?;

        let audio = self
            .client
            .get(audio_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ToolError::failed(format!("Failed to download audio: {}", e)))?
            .bytes()
            .await
            .map_err(|e| ToolError::failed(format!("Failed to read audio: {}", e)))?;

        let file_name = url_file_name(audio_url).unwrap_or_else(|| "audio.mp3".to_string());
        let form = Form::new()
            .text("model", TRANSCRIPTION_MODEL)
            .part("file", Part::bytes(audio.to_vec()).file_name(file_name));

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ToolError::failed(format!("Transcription request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ToolError::failed(format!("Failed to read response: {}", e)))?;
        if !status.is_success() {
            return Err(ToolError::failed(format!(
                "API Error: {} - {}",
                status.as_u16(),
                truncate_chars(&text, 500)
            )));
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| ToolError::failed(format!("Invalid transcription response: {}", e)))?;
        let transcription = body.get("text").and_then(|v| v.as_str()).unwrap_or_default();

        Ok(json!({ "transcription": transcription }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_endpoint_joins_base() {
        let tool = TranscribeAudioTool::new(
            reqwest::Client::new(),
            "https://aipipe.org/openrouter/v1/".into(),
            "k".into(),
        );
        assert_eq!(tool.endpoint(), "https://aipipe.org/openrouter/v1/audio/transcriptions");
    }

    #[tokio::test]
    async fn test_transcribes_downloaded_audio() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clip.mp3"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/audio/transcriptions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "the answer is 42"})))
            .expect(1)
            .mount(&server)
            .await;

        let tool = TranscribeAudioTool::new(
            reqwest::Client::new(),
            format!("{}/v1", server.uri()),
            "test-key".into(),
        );
        let result = tool
            .execute(json!({ "audio_url": format!("{}/clip.mp3", server.uri()) }))
            .await
            .unwrap();
        assert_eq!(result["transcription"], "the answer is 42");
    }

    #[tokio::test]
    async fn test_api_error_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 4]))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let tool = TranscribeAudioTool::new(reqwest::Client::new(), server.uri(), "k".into());
        let err = tool
            .execute(json!({ "audio_url": format!("{}/a.wav", server.uri()) }))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "API Error: 401 - bad key");
    }
}
