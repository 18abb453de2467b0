//! Multi-agent orchestration core
//!
//! Agents with tools and handoffs, an append-only transcript, and the
//! runner that drives one conversational turn to a final answer.

use thiserror::Error;

pub mod agent;
pub mod request;
pub mod runner;
pub mod tools;
pub mod transcript;

pub use agent::{Agent, AgentBuilder, Handoff, HandoffTrigger, ModelRef};
pub use runner::{RunConfig, RunResult, Runner, DEFAULT_MAX_TURNS};
pub use tools::{parse_args, Tool, ToolError, ToolRegistry};
pub use transcript::{Item, Role, Transcript};

pub use baton_provider::{ModelOutput, Provider, ProviderError, Usage};
pub use tokio_util::sync::CancellationToken;

/// Turn failures surfaced to the host
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("◆ MODEL ENDPOINT FAILED: {0}")]
    Endpoint(#[from] ProviderError),

    #[error("◆ TOOL '{tool}' FAILED: {reason}")]
    ToolFatal { tool: String, reason: String },

    #[error("◆ TURN BUDGET EXCEEDED AFTER {0} MODEL ROUNDS")]
    TurnBudgetExceeded(u32),

    #[error("◆ TURN CANCELLED")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            AgentError::TurnBudgetExceeded(3).to_string(),
            "◆ TURN BUDGET EXCEEDED AFTER 3 MODEL ROUNDS"
        );
        assert_eq!(AgentError::Cancelled.to_string(), "◆ TURN CANCELLED");

        let err = AgentError::ToolFatal {
            tool: "purchase_items".to_string(),
            reason: "payment gateway down".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "◆ TOOL 'purchase_items' FAILED: payment gateway down"
        );
    }

    #[test]
    fn test_endpoint_error_from_provider() {
        let err: AgentError = ProviderError::RateLimited.into();
        assert!(matches!(err, AgentError::Endpoint(ProviderError::RateLimited)));
        assert!(err.to_string().contains("RATE LIMITED"));
    }
}
