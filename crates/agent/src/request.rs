//! Builds the model request for the active agent

use baton_provider::{ChatParams, Message, ToolChoice};

use crate::agent::Agent;
use crate::transcript::Transcript;

/// Instructions, then the full transcript, plus the agent's tools and handoffs
pub fn compose_request<C: Send + 'static>(agent: &Agent<C>, transcript: &Transcript) -> ChatParams {
    let mut messages = Vec::with_capacity(transcript.len() + 1);
    if !agent.instructions().is_empty() {
        messages.push(Message::system(agent.instructions()));
    }
    messages.extend(transcript.as_model_input());

    let model = agent.model();
    ChatParams {
        model: model.model_name(),
        messages,
        tools: agent.tool_definitions(),
        max_tokens: model.max_tokens(),
        temperature: model.temperature(),
        tool_choice: ToolChoice::Auto,
    }
}
