//! Turn executor
//!
//! Drives one turn as a small state machine:
//!
//! ```text
//! AwaitingModel --final text--> Done
//!       ^              \
//!       |               tool calls
//!       |                \
//!       +---- Executing (tools and handoffs, in emitted order)
//! ```
//!
//! Every model output, tool result, tool error and handoff marker is appended
//! to the transcript as it happens, so a cancelled or failed turn leaves a
//! valid prefix behind. When a turn aborts partway through a batch, the
//! calls it never ran are answered with an error item so every recorded
//! tool call keeps a matching response.

use std::fmt;
use std::sync::Arc;

use baton_provider::{ModelOutput, ToolCall, Usage};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::agent::{Agent, Handoff, HandoffTrigger};
use crate::request::compose_request;
use crate::tools::{render_output, ToolError};
use crate::transcript::{Item, Transcript};
use crate::{AgentError, Result};

/// Default ceiling on model rounds per turn
pub const DEFAULT_MAX_TURNS: u32 = 20;

const HANDOFF_PREFIX: &str = "transfer_to_";

const NOT_EXECUTED: &str = "not executed: turn aborted";

/// Runner settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Maximum model calls in one turn; `None` never stops the loop
    pub max_turns: Option<u32>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_turns: Some(DEFAULT_MAX_TURNS),
        }
    }
}

impl RunConfig {
    pub fn with_max_turns(max_turns: u32) -> Self {
        Self {
            max_turns: Some(max_turns),
        }
    }

    pub fn unbounded() -> Self {
        Self { max_turns: None }
    }
}

/// Outcome of a completed turn
pub struct RunResult<C> {
    pub final_output: String,
    /// Agent that produced the final answer
    pub last_agent: Arc<Agent<C>>,
    /// Number of model calls made
    pub iterations: u32,
    pub usage: Usage,
    /// Items the runner appended during this turn
    pub new_items: Vec<Item>,
}

impl<C> fmt::Debug for RunResult<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunResult")
            .field("final_output", &self.final_output)
            .field("last_agent", &self.last_agent.name())
            .field("iterations", &self.iterations)
            .field("usage", &self.usage)
            .field("new_items", &self.new_items.len())
            .finish()
    }
}

enum TurnState {
    AwaitingModel,
    Executing(Vec<ToolCall>),
    Done(String),
}

/// A model request resolved against the emitting agent's registered names
enum Action<'a, C> {
    Tool(ToolCall),
    Handoff(ToolCall, &'a Handoff<C>),
    Unknown(ToolCall),
}

impl<C> Action<'_, C> {
    fn into_call(self) -> ToolCall {
        match self {
            Action::Tool(call) | Action::Handoff(call, _) | Action::Unknown(call) => call,
        }
    }
}

fn classify<C: Send + 'static>(agent: &Agent<C>, calls: Vec<ToolCall>) -> Vec<Action<'_, C>> {
    calls
        .into_iter()
        .map(|call| {
            if agent.tools().has(&call.name) {
                Action::Tool(call)
            } else if let Some(handoff) = agent.handoff(&call.name) {
                Action::Handoff(call, handoff)
            } else {
                Action::Unknown(call)
            }
        })
        .collect()
}

/// Executes turns; holds no per-conversation state
#[derive(Debug, Clone, Default)]
pub struct Runner {
    config: RunConfig,
}

impl Runner {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Append the user's message, then run the turn
    pub async fn run_turn<C: Send + 'static>(
        &self,
        agent: &Arc<Agent<C>>,
        transcript: &mut Transcript,
        user_message: impl Into<String>,
        ctx: &mut C,
    ) -> Result<RunResult<C>> {
        transcript.push_user(user_message);
        self.run(agent, transcript, ctx).await
    }

    /// Run until the model produces a final answer
    pub async fn run<C: Send + 'static>(
        &self,
        agent: &Arc<Agent<C>>,
        transcript: &mut Transcript,
        ctx: &mut C,
    ) -> Result<RunResult<C>> {
        self.run_with_cancel(agent, transcript, ctx, &CancellationToken::new())
            .await
    }

    /// Like [`Runner::run`], aborting with [`AgentError::Cancelled`] once
    /// `cancel` fires during a model call or tool invocation.
    pub async fn run_with_cancel<C: Send + 'static>(
        &self,
        agent: &Arc<Agent<C>>,
        transcript: &mut Transcript,
        ctx: &mut C,
        cancel: &CancellationToken,
    ) -> Result<RunResult<C>> {
        let start = transcript.len();
        let mut active = Arc::clone(agent);
        let mut iterations = 0u32;
        let mut usage = Usage::default();
        let mut state = TurnState::AwaitingModel;

        info!("Starting turn with agent {}", active.name());

        loop {
            state = match state {
                TurnState::AwaitingModel => {
                    if let Some(max) = self.config.max_turns {
                        if iterations >= max {
                            warn!("Turn stopped after {} model rounds", max);
                            return Err(AgentError::TurnBudgetExceeded(max));
                        }
                    }
                    iterations += 1;
                    debug!("Model round {} with agent {}", iterations, active.name());

                    let params = compose_request(&active, transcript);
                    let provider = Arc::clone(active.model().provider());
                    let response = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(AgentError::Cancelled),
                        response = provider.chat(params) => response?,
                    };
                    usage.add(&response.usage);

                    match response.into_output() {
                        ModelOutput::FinalText { text } => {
                            transcript.append(Item::assistant_text(active.name(), text.clone()));
                            TurnState::Done(text)
                        }
                        ModelOutput::ToolCalls { content, calls } => {
                            transcript.append(Item::Assistant {
                                agent: active.name().to_string(),
                                content,
                                tool_calls: calls.clone(),
                            });
                            TurnState::Executing(calls)
                        }
                    }
                }
                TurnState::Executing(calls) => {
                    active = execute_batch(active, calls, transcript, ctx, cancel).await?;
                    TurnState::AwaitingModel
                }
                TurnState::Done(final_output) => {
                    info!(
                        "Turn finished by {} after {} model rounds",
                        active.name(),
                        iterations
                    );
                    return Ok(RunResult {
                        final_output,
                        last_agent: active,
                        iterations,
                        usage,
                        new_items: transcript.since(start).to_vec(),
                    });
                }
            };
        }
    }
}

/// Run one batch of model requests in emitted order.
///
/// Returns the agent for the next model round: the first handoff target if
/// a handoff was taken, otherwise the emitting agent.
async fn execute_batch<C: Send + 'static>(
    emitting: Arc<Agent<C>>,
    calls: Vec<ToolCall>,
    transcript: &mut Transcript,
    ctx: &mut C,
    cancel: &CancellationToken,
) -> Result<Arc<Agent<C>>> {
    let mut next: Option<Arc<Agent<C>>> = None;
    let mut actions = classify(&emitting, calls).into_iter();

    while let Some(action) = actions.next() {
        match action {
            Action::Tool(call) => {
                if let Err(err) = execute_tool(&emitting, call, transcript, ctx, cancel).await {
                    // every call in the batch must stay answered for the next turn
                    for skipped in actions.by_ref() {
                        transcript.append(not_executed(skipped.into_call()));
                    }
                    return Err(err);
                }
            }
            Action::Handoff(call, handoff) => {
                if next.is_some() {
                    warn!("Ignoring extra handoff {} in the same response", call.name);
                    transcript.append(Item::ToolError {
                        call_id: call.id,
                        name: call.name,
                        error: "multiple handoffs requested; ignoring this one".to_string(),
                    });
                } else {
                    next = Some(execute_handoff(&emitting, call, handoff, transcript));
                }
            }
            Action::Unknown(call) => {
                let err = if call.name.starts_with(HANDOFF_PREFIX) {
                    ToolError::UnknownHandoffTarget(call.name.clone())
                } else {
                    ToolError::UnknownTool(call.name.clone())
                };
                warn!("Model called unregistered name: {}", err);
                transcript.append(Item::ToolError {
                    call_id: call.id,
                    name: call.name,
                    error: err.to_string(),
                });
            }
        }
    }

    Ok(next.unwrap_or(emitting))
}

async fn execute_tool<C: Send + 'static>(
    agent: &Agent<C>,
    call: ToolCall,
    transcript: &mut Transcript,
    ctx: &mut C,
    cancel: &CancellationToken,
) -> Result<()> {
    debug!("Executing tool: {}", call.name);

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        result = agent.tools().invoke(&call.name, ctx, call.arguments.clone()) => Some(result),
    };
    let Some(result) = result else {
        transcript.append(not_executed(call));
        return Err(AgentError::Cancelled);
    };

    match result {
        Ok(value) => transcript.append(Item::ToolResult {
            call_id: call.id,
            name: call.name,
            output: render_output(&value),
        }),
        Err(err) => {
            transcript.append(Item::ToolError {
                call_id: call.id,
                name: call.name.clone(),
                error: err.to_string(),
            });
            if !err.is_recoverable() {
                return Err(AgentError::ToolFatal {
                    tool: call.name,
                    reason: err.to_string(),
                });
            }
            warn!("Tool {} failed: {}", call.name, err);
        }
    }

    Ok(())
}

/// Answer for a call the aborted turn never ran
fn not_executed(call: ToolCall) -> Item {
    Item::ToolError {
        call_id: call.id,
        name: call.name,
        error: NOT_EXECUTED.to_string(),
    }
}

fn execute_handoff<C>(
    from: &Agent<C>,
    call: ToolCall,
    handoff: &Handoff<C>,
    transcript: &mut Transcript,
) -> Arc<Agent<C>> {
    let target = Arc::clone(handoff.target());
    let reason = call
        .arguments
        .get("reason")
        .and_then(Value::as_str)
        .map(str::to_string);

    let trigger = HandoffTrigger {
        from_agent: from.name().to_string(),
        to_agent: target.name().to_string(),
        reason,
    };
    info!(
        "Handing off from {} to {}",
        trigger.from_agent, trigger.to_agent
    );
    handoff.fire(&trigger);

    transcript.append(Item::Handoff {
        call_id: call.id,
        tool: call.name,
        from: trigger.from_agent,
        to: trigger.to_agent,
    });
    target
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_config_defaults() {
        assert_eq!(RunConfig::default().max_turns, Some(DEFAULT_MAX_TURNS));
        assert_eq!(RunConfig::with_max_turns(3).max_turns, Some(3));
        assert_eq!(RunConfig::unbounded().max_turns, None);
        assert_eq!(Runner::default().config(), &RunConfig::default());
    }
}
