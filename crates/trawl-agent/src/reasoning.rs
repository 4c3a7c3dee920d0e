//! The reasoning step: one model call over the whole transcript.

use trawl_ai::{Context, Message, Model, Role, ToolDefinition};

use crate::{
    admission::AdmissionGate,
    error::{Error, Result},
    transcript::Transcript,
    transport::Transport,
};

/// Everything a single model call needs, borrowed from the running agent.
pub struct ReasoningStep<'a> {
    pub transport: &'a dyn Transport,
    pub gate: &'a AdmissionGate,
    pub model: &'a Model,
    pub system_prompt: Option<&'a str>,
    pub tools: &'a [ToolDefinition],
}

impl ReasoningStep<'_> {
    /// Send the transcript to the model and append its reply.
    ///
    /// Waits on the admission gate first. A failed call leaves the
    /// transcript untouched and is not retried here.
    pub async fn run<'t>(&self, transcript: &'t mut Transcript) -> Result<&'t Message> {
        self.gate.admit().await;

        let context = Context {
            system_prompt: self.system_prompt.map(str::to_string),
            messages: transcript.all().to_vec(),
            tools: self.tools.to_vec(),
        };

        tracing::debug!(
            model = %self.model.id,
            messages = context.messages.len(),
            "sending reasoning request"
        );

        let reply = self
            .transport
            .complete(self.model, &context)
            .await
            .map_err(Error::model_unavailable)?;

        if reply.role() != Role::Assistant {
            return Err(Error::model_unavailable(
                trawl_ai::Error::UnexpectedResponse(format!(
                    "expected an assistant reply, got {:?}",
                    reply.role()
                )),
            ));
        }

        Ok(transcript.append(reply))
    }
}
