//! OpenAI-compatible Chat Completions API provider
//!
//! Works against OpenAI itself and against proxies that speak the same wire
//! format (OpenRouter and friends); only the base URL and key differ.

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource};
use serde::{Deserialize, Serialize};

use super::LlmProvider;
use crate::{
    error::{Error, Result},
    stream::{MessageEvent, MessageEventStream},
    types::{
        AssistantMetadata, Context, Message, MessageContent, Model, StopReason, ToolCall, Usage,
        tool_result_payload,
    },
};

/// OpenAI-compatible API client
pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: String,
}

impl OpenAIProvider {
    /// Create a new provider with an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Stream a response from the chat-completions endpoint
    pub async fn stream(&self, model: &Model, context: &Context) -> Result<MessageEventStream> {
        let request = build_request(model, context);
        let url = format!("{}/chat/completions", model.base_url);

        let mut headers = reqwest::header::HeaderMap::new();
        let auth = format!("Bearer {}", self.api_key)
            .parse::<reqwest::header::HeaderValue>()
            .map_err(|_| Error::InvalidApiKey)?;
        headers.insert(reqwest::header::AUTHORIZATION, auth);
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        // Add model-specific headers
        for (key, value) in &model.headers {
            if let (Ok(name), Ok(val)) = (
                key.parse::<reqwest::header::HeaderName>(),
                value.parse::<reqwest::header::HeaderValue>(),
            ) {
                headers.insert(name, val);
            }
        }

        tracing::debug!(
            model = %model.id,
            messages = request.messages.len(),
            tools = request.tools.as_ref().map_or(0, Vec::len),
            "sending chat completion request"
        );

        let request_builder = self.client.post(&url).headers(headers).json(&request);

        let event_source = EventSource::new(request_builder)
            .map_err(|e| Error::Sse(format!("Failed to create event source: {}", e)))?;

        Ok(Box::pin(create_stream(event_source, model.clone())))
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    async fn stream(&self, model: &Model, context: &Context) -> Result<MessageEventStream> {
        OpenAIProvider::stream(self, model, context).await
    }
}

fn build_request(model: &Model, context: &Context) -> OpenAIRequest {
    let mut messages = Vec::new();

    // Add system prompt as first message
    if let Some(ref system_prompt) = context.system_prompt {
        messages.push(OpenAIMessage {
            role: "system".to_string(),
            content: Some(WireContent::Text(system_prompt.clone())),
            tool_calls: None,
            tool_call_id: None,
        });
    }

    messages.extend(context.messages.iter().map(convert_message));

    let tools = if context.tools.is_empty() {
        None
    } else {
        Some(
            context
                .tools
                .iter()
                .map(|t| OpenAITool {
                    tool_type: "function".to_string(),
                    function: OpenAIFunction {
                        name: t.name.clone(),
                        description: Some(t.description.clone()),
                        parameters: Some(t.parameters.clone()),
                    },
                })
                .collect(),
        )
    };

    let has_tools = tools.is_some();
    OpenAIRequest {
        model: model.id.clone(),
        messages,
        stream: true,
        stream_options: Some(StreamOptions {
            include_usage: true,
        }),
        max_tokens: model.max_tokens,
        temperature: model.temperature,
        tools,
        tool_choice: if has_tools {
            Some(serde_json::json!("auto"))
        } else {
            None
        },
    }
}

fn convert_content(content: &MessageContent) -> WireContent {
    match content {
        MessageContent::Text(text) => WireContent::Text(text.clone()),
        MessageContent::Blocks(blocks) => WireContent::Parts(
            blocks
                .iter()
                .map(|b| WirePart {
                    part_type: b.kind.clone(),
                    text: b.text.clone(),
                })
                .collect(),
        ),
    }
}

fn convert_message(msg: &Message) -> OpenAIMessage {
    match msg {
        Message::User { content, .. } => OpenAIMessage {
            role: "user".to_string(),
            content: Some(convert_content(content)),
            tool_calls: None,
            tool_call_id: None,
        },
        Message::Assistant {
            content,
            tool_calls,
            ..
        } => {
            let calls: Vec<OpenAIToolCall> = tool_calls
                .iter()
                .map(|call| OpenAIToolCall {
                    id: call.id.clone(),
                    call_type: "function".to_string(),
                    function: OpenAIFunctionCall {
                        name: call.name.clone(),
                        arguments: serde_json::to_string(&call.arguments).unwrap_or_default(),
                    },
                })
                .collect();

            OpenAIMessage {
                role: "assistant".to_string(),
                content: if content.is_empty() {
                    None
                } else {
                    Some(convert_content(content))
                },
                tool_calls: if calls.is_empty() { None } else { Some(calls) },
                tool_call_id: None,
            }
        }
        Message::Tool {
            tool_call_id,
            output,
            error,
            ..
        } => OpenAIMessage {
            role: "tool".to_string(),
            content: Some(WireContent::Text(tool_result_payload(
                output.as_ref(),
                error.as_deref(),
            ))),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.clone()),
        },
    }
}

/// Parse accumulated tool-call argument text.
///
/// Malformed JSON is kept as a string so argument validation can report it
/// back to the model instead of silently dropping it.
fn parse_arguments(raw: &str) -> serde_json::Value {
    if raw.trim().is_empty() {
        return serde_json::json!({});
    }
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

fn create_stream(
    mut event_source: EventSource,
    model: Model,
) -> impl futures::Stream<Item = MessageEvent> {
    stream! {
        let mut accumulated_text = String::new();
        let mut tool_calls: Vec<(String, String, String)> = Vec::new(); // (id, name, args)
        let mut finish_reason: Option<String> = None;
        let mut usage = Usage::default();

        let start_message = Message::Assistant {
            content: MessageContent::default(),
            tool_calls: vec![],
            metadata: AssistantMetadata {
                model: Some(model.id.clone()),
                ..Default::default()
            },
        };
        yield MessageEvent::Start { message: start_message };

        while let Some(event) = event_source.next().await {
            match event {
                Ok(Event::Open) => {}
                Ok(Event::Message(msg)) => {
                    if msg.data == "[DONE]" {
                        break;
                    }

                    let chunk: std::result::Result<StreamChunk, _> = serde_json::from_str(&msg.data);
                    match chunk {
                        Ok(chunk) => {
                            for choice in &chunk.choices {
                                if let Some(ref content) = choice.delta.content {
                                    accumulated_text.push_str(content);
                                    yield MessageEvent::TextDelta { delta: content.clone() };
                                }

                                if let Some(ref tcs) = choice.delta.tool_calls {
                                    for tc in tcs {
                                        let idx = tc.index as usize;

                                        while tool_calls.len() <= idx {
                                            tool_calls.push((String::new(), String::new(), String::new()));
                                        }

                                        if let Some(ref id) = tc.id {
                                            tool_calls[idx].0 = id.clone();
                                        }
                                        if let Some(ref function) = tc.function {
                                            if let Some(ref name) = function.name {
                                                tool_calls[idx].1 = name.clone();
                                                yield MessageEvent::ToolCallStart {
                                                    index: idx,
                                                    id: tool_calls[idx].0.clone(),
                                                    name: name.clone(),
                                                };
                                            }
                                            if let Some(ref args) = function.arguments {
                                                tool_calls[idx].2.push_str(args);
                                                yield MessageEvent::ToolCallDelta {
                                                    index: idx,
                                                    delta: args.clone(),
                                                };
                                            }
                                        }
                                    }
                                }

                                if let Some(ref reason) = choice.finish_reason {
                                    finish_reason = Some(reason.clone());
                                }
                            }

                            // Usage arrives in the final chunk
                            if let Some(ref stream_usage) = chunk.usage {
                                usage.input = stream_usage.prompt_tokens;
                                usage.output = stream_usage.completion_tokens;
                            }
                        }
                        Err(e) => {
                            event_source.close();
                            yield MessageEvent::Error {
                                message: format!("Failed to parse chunk: {}", e),
                                status: None,
                            };
                            return;
                        }
                    }
                }
                Err(reqwest_eventsource::Error::StreamEnded) => break,
                Err(reqwest_eventsource::Error::InvalidStatusCode(status, response)) => {
                    event_source.close();
                    let body = response.text().await.unwrap_or_default();
                    yield MessageEvent::Error {
                        message: format!("HTTP {}: {}", status, body),
                        status: Some(status.as_u16()),
                    };
                    return;
                }
                Err(e) => {
                    event_source.close();
                    yield MessageEvent::Error {
                        message: format!("SSE error: {}", e),
                        status: None,
                    };
                    return;
                }
            }
        }
        event_source.close();

        let calls: Vec<ToolCall> = tool_calls
            .into_iter()
            .filter(|(id, name, _)| !id.is_empty() && !name.is_empty())
            .map(|(id, name, args)| ToolCall::new(id, name, parse_arguments(&args)))
            .collect();

        let stop_reason = match finish_reason.as_deref() {
            Some("length") => StopReason::Length,
            Some("tool_calls") => StopReason::ToolUse,
            Some("content_filter") => StopReason::ContentFilter,
            _ if !calls.is_empty() => StopReason::ToolUse,
            _ => StopReason::Stop,
        };

        let final_message = Message::Assistant {
            content: MessageContent::Text(accumulated_text),
            tool_calls: calls,
            metadata: AssistantMetadata {
                model: Some(model.id.clone()),
                usage,
                stop_reason: Some(stop_reason),
                timestamp: chrono::Utc::now().timestamp_millis(),
            },
        };

        yield MessageEvent::Done {
            message: final_message,
            stop_reason,
            usage,
        };
    }
}

// Request types

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_options: Option<StreamOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct StreamOptions {
    include_usage: bool,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WireContent {
    Text(String),
    Parts(Vec<WirePart>),
}

#[derive(Debug, Serialize)]
struct WirePart {
    #[serde(rename = "type")]
    part_type: String,
    text: String,
}

#[derive(Debug, Serialize)]
struct OpenAITool {
    #[serde(rename = "type")]
    tool_type: String,
    function: OpenAIFunction,
}

#[derive(Debug, Serialize)]
struct OpenAIFunction {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct OpenAIToolCall {
    id: String,
    #[serde(rename = "type")]
    call_type: String,
    function: OpenAIFunctionCall,
}

#[derive(Debug, Serialize)]
struct OpenAIFunctionCall {
    name: String,
    arguments: String,
}

// Streaming response types

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    usage: Option<StreamUsage>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
    tool_calls: Option<Vec<StreamToolCall>>,
}

#[derive(Debug, Deserialize)]
struct StreamToolCall {
    index: i32,
    id: Option<String>,
    function: Option<StreamFunction>,
}

#[derive(Debug, Deserialize)]
struct StreamFunction {
    name: Option<String>,
    arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContentBlock, ToolDefinition};
    use serde_json::json;

    fn model() -> Model {
        Model::new("openai/gpt-4.1-nano")
    }

    #[test]
    fn test_request_puts_system_prompt_first() {
        let mut context = Context::with_system("solve quizzes");
        context.push(Message::user("https://example.com/quiz"));
        let request = serde_json::to_value(build_request(&model(), &context)).unwrap();

        assert_eq!(request["messages"][0]["role"], "system");
        assert_eq!(request["messages"][0]["content"], "solve quizzes");
        assert_eq!(request["messages"][1]["role"], "user");
        assert_eq!(request["messages"][1]["content"], "https://example.com/quiz");
        assert_eq!(request["stream"], true);
        assert!(request.get("tools").is_none());
        assert!(request.get("tool_choice").is_none());
    }

    #[test]
    fn test_request_includes_tools() {
        let mut context = Context::default();
        context.add_tool(ToolDefinition::new(
            "run_code",
            "Run code",
            json!({"type": "object"}),
        ));
        let request = serde_json::to_value(build_request(&model(), &context)).unwrap();
        assert_eq!(request["tools"][0]["type"], "function");
        assert_eq!(request["tools"][0]["function"]["name"], "run_code");
        assert_eq!(request["tool_choice"], "auto");
    }

    #[test]
    fn test_convert_assistant_tool_calls() {
        let msg = Message::assistant_with_tool_calls(
            "",
            vec![ToolCall::new("call_1", "post_request", json!({"url": "https://x"}))],
        );
        let wire = serde_json::to_value(convert_message(&msg)).unwrap();
        assert_eq!(wire["role"], "assistant");
        assert!(wire.get("content").is_none());
        assert_eq!(wire["tool_calls"][0]["id"], "call_1");
        assert_eq!(wire["tool_calls"][0]["function"]["arguments"], r#"{"url":"https://x"}"#);
    }

    #[test]
    fn test_convert_tool_result() {
        let msg = Message::tool_error("call_1", "post_request", "connection refused");
        let wire = serde_json::to_value(convert_message(&msg)).unwrap();
        assert_eq!(wire["role"], "tool");
        assert_eq!(wire["tool_call_id"], "call_1");
        assert_eq!(wire["content"], r#"{"error":"connection refused"}"#);
    }

    #[test]
    fn test_convert_block_content() {
        let msg = Message::user(vec![ContentBlock::text("hello")]);
        let wire = serde_json::to_value(convert_message(&msg)).unwrap();
        assert_eq!(wire["content"][0]["type"], "text");
        assert_eq!(wire["content"][0]["text"], "hello");
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(parse_arguments(""), json!({}));
        assert_eq!(parse_arguments(r#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(parse_arguments("{broken"), json!("{broken"));
    }
}
