//! The loop controller: reasoning, routing and tool execution for one run

use std::sync::Arc;

use tokio::sync::broadcast;
use trawl_ai::{Message, Model, Usage};

use crate::{
    admission::AdmissionGate,
    error::{Error, Result},
    events::AgentEvent,
    executor::ToolExecutor,
    reasoning::ReasoningStep,
    router::{Edge, Router},
    tool::BoxedTool,
    transcript::Transcript,
    transport::{RetryConfig, Transport},
};

/// Default bound on reasoning iterations per run
pub const DEFAULT_MAX_ITERATIONS: u32 = 5000;

/// Default number of consecutive model failures tolerated before giving up
pub const DEFAULT_MODEL_RETRIES: u32 = 3;

/// Agent configuration
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// System directive sent ahead of the transcript
    pub system_prompt: Option<String>,
    /// Model to use
    pub model: Model,
    /// Reasoning iterations allowed before the run fails
    pub max_iterations: u32,
    /// Consecutive retryable model failures tolerated
    pub model_retries: u32,
    /// Backoff between re-invocations after a model failure
    pub retry: RetryConfig,
    /// Termination classifier
    pub router: Router,
}

impl AgentConfig {
    pub fn new(model: Model) -> Self {
        Self {
            system_prompt: None,
            model,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            model_retries: DEFAULT_MODEL_RETRIES,
            retry: RetryConfig::default(),
            router: Router::default(),
        }
    }
}

/// Result of a run that reached the terminal marker
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Full transcript, ending with the terminal assistant message
    pub transcript: Transcript,
    /// Reasoning iterations consumed, including failed attempts
    pub iterations: u32,
    /// Token usage summed over every reply
    pub usage: Usage,
}

impl RunOutcome {
    /// The message that ended the run
    pub fn final_message(&self) -> Option<&Message> {
        self.transcript.last()
    }
}

/// Drives runs: seed in, transcript out.
///
/// An `Agent` holds no per-run state, so one instance (behind an `Arc`) can
/// serve many concurrent runs. Each run owns its transcript; the admission
/// gate is the only thing runs share.
pub struct Agent {
    config: AgentConfig,
    transport: Arc<dyn Transport>,
    gate: Arc<AdmissionGate>,
    executor: ToolExecutor,
    event_tx: broadcast::Sender<AgentEvent>,
}

impl Agent {
    /// Create a new agent
    pub fn new(config: AgentConfig, transport: Arc<dyn Transport>, gate: Arc<AdmissionGate>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            config,
            transport,
            gate,
            executor: ToolExecutor::default(),
            event_tx,
        }
    }

    /// Subscribe to agent events
    pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.event_tx.subscribe()
    }

    /// Get the agent config
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Set the system prompt
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.config.system_prompt = Some(prompt.into());
    }

    /// Add a tool
    pub fn add_tool(&mut self, tool: BoxedTool) {
        self.executor.registry_mut().register(tool);
    }

    /// Get tool names
    pub fn tool_names(&self) -> Vec<&str> {
        self.executor.registry().names()
    }

    /// Run the loop from a seed until the model halts or the bound is hit.
    pub async fn run(&self, seed: &str) -> Result<RunOutcome> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let limit = self.config.max_iterations;
        tracing::info!(%run_id, seed, limit, "starting run");

        let _ = self.event_tx.send(AgentEvent::RunStart {
            run_id: run_id.clone(),
            seed: seed.to_string(),
            started_at: chrono::Utc::now().timestamp_millis(),
        });

        let mut transcript = Transcript::seeded(seed);
        if let Some(first) = transcript.last() {
            self.emit_appended(first);
        }

        let tools = self.executor.registry().definitions();
        let step = ReasoningStep {
            transport: self.transport.as_ref(),
            gate: &self.gate,
            model: &self.config.model,
            system_prompt: self.config.system_prompt.as_deref(),
            tools: &tools,
        };

        let mut usage = Usage::default();
        let mut failures = 0u32;

        for iteration in 1..=limit {
            let _ = self.event_tx.send(AgentEvent::IterationStart { iteration });
            tracing::debug!(%run_id, iteration, "reasoning");

            let reply = match step.run(&mut transcript).await {
                Ok(reply) => {
                    failures = 0;
                    reply.clone()
                }
                Err(e) if e.is_retryable() && failures < self.config.model_retries => {
                    let delay = self.config.retry.delay_for_attempt(failures);
                    failures += 1;
                    tracing::warn!(
                        %run_id,
                        attempt = failures,
                        ?delay,
                        "reasoning step failed, retrying: {}",
                        e
                    );
                    let _ = self.event_tx.send(AgentEvent::RetryScheduled {
                        attempt: failures,
                        delay_ms: delay.as_millis() as u64,
                        error: e.to_string(),
                    });
                    tokio::time::sleep(delay).await;
                    continue;
                }
                Err(e) => return Err(self.fail(&run_id, e)),
            };

            usage.add(&reply.usage());
            self.emit_appended(&reply);

            match self.config.router.route(&reply) {
                Ok(Edge::Halt) => {
                    tracing::info!(%run_id, iterations = iteration, "run halted on terminal marker");
                    let _ = self.event_tx.send(AgentEvent::RunEnd {
                        iterations: iteration,
                        usage,
                    });
                    return Ok(RunOutcome {
                        transcript,
                        iterations: iteration,
                        usage,
                    });
                }
                Ok(Edge::InvokeReasoning) => {}
                Ok(Edge::InvokeTools) => {
                    let results = self
                        .executor
                        .execute(reply.tool_calls(), &self.event_tx)
                        .await;
                    for result in results {
                        self.emit_appended(transcript.append(result));
                    }
                }
                Err(e) => return Err(self.fail(&run_id, e)),
            }
        }

        Err(self.fail(&run_id, Error::IterationLimitExceeded { limit }))
    }

    fn emit_appended(&self, message: &Message) {
        let _ = self.event_tx.send(AgentEvent::MessageAppended {
            message: message.clone(),
        });
    }

    fn fail(&self, run_id: &str, error: Error) -> Error {
        tracing::error!(%run_id, "run failed: {}", error);
        let _ = self.event_tx.send(AgentEvent::Error {
            message: error.to_string(),
        });
        error
    }
}
