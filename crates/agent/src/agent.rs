//! Agent definitions and handoffs
//!
//! An [`Agent`] is fixed once built: its instructions, tools and handoff
//! targets never change. Agents are shared as `Arc<Agent<C>>` so the same
//! definition can serve many conversations, and a [`Handoff`] refers to its
//! target by that shared pointer.

use baton_provider::{Provider, Tool as ToolSpec};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::tools::{Tool, ToolRegistry};

/// A model endpoint plus the settings an agent calls it with
#[derive(Clone)]
pub struct ModelRef {
    provider: Arc<dyn Provider>,
    model: Option<String>,
    temperature: f32,
    max_tokens: u32,
}

impl ModelRef {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            model: None,
            temperature: 0.7,
            max_tokens: 4096,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// Explicit model name, or the provider's default
    pub fn model_name(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

impl fmt::Debug for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRef")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Passed to on-handoff callbacks; carries no conversation context
#[derive(Debug, Clone, PartialEq)]
pub struct HandoffTrigger {
    pub from_agent: String,
    pub to_agent: String,
    pub reason: Option<String>,
}

pub type OnHandoff = Arc<dyn Fn(&HandoffTrigger) + Send + Sync>;

/// A permitted transfer of control to another agent
///
/// Offered to the model as a pseudo-tool with an optional `reason` argument.
pub struct Handoff<C> {
    tool_name: String,
    description: String,
    target: Arc<Agent<C>>,
    on_handoff: Option<OnHandoff>,
}

impl<C> Handoff<C> {
    pub fn new(target: Arc<Agent<C>>) -> Self {
        let tool_name = default_tool_name(target.name());
        let description = match target.handoff_description() {
            Some(desc) => format!(
                "Handoff to the {} agent to handle the request. {}",
                target.name(),
                desc
            ),
            None => format!(
                "Handoff to the {} agent to handle the request.",
                target.name()
            ),
        };
        Self {
            tool_name,
            description,
            target,
            on_handoff: None,
        }
    }

    pub fn with_tool_name(mut self, name: impl Into<String>) -> Self {
        self.tool_name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Register a side effect to run when this handoff is taken
    pub fn on_handoff<F>(mut self, callback: F) -> Self
    where
        F: Fn(&HandoffTrigger) + Send + Sync + 'static,
    {
        self.on_handoff = Some(Arc::new(callback));
        self
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn target(&self) -> &Arc<Agent<C>> {
        &self.target
    }

    pub fn parameters() -> Value {
        json!({
            "type": "object",
            "properties": {
                "reason": {
                    "type": "string",
                    "description": "Why the conversation is being transferred"
                }
            }
        })
    }

    pub fn definition(&self) -> ToolSpec {
        ToolSpec::new(&self.tool_name, &self.description, Self::parameters())
    }

    /// Run the callback, if any
    pub fn fire(&self, trigger: &HandoffTrigger) {
        if let Some(callback) = &self.on_handoff {
            debug!("Running on-handoff callback for {}", self.tool_name);
            callback(trigger);
        }
    }
}

impl<C> fmt::Debug for Handoff<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handoff")
            .field("tool_name", &self.tool_name)
            .field("target", &self.target.name())
            .field("on_handoff", &self.on_handoff.is_some())
            .finish()
    }
}

/// `transfer_to_` followed by the snake-cased agent name
fn default_tool_name(agent_name: &str) -> String {
    let mut snake = String::with_capacity(agent_name.len());
    for c in agent_name.chars() {
        if c.is_ascii_alphanumeric() {
            snake.push(c.to_ascii_lowercase());
        } else if !snake.is_empty() && !snake.ends_with('_') {
            snake.push('_');
        }
    }
    let snake = snake.trim_end_matches('_');
    format!("transfer_to_{}", snake)
}

/// Immutable agent definition
pub struct Agent<C> {
    name: String,
    instructions: String,
    handoff_description: Option<String>,
    tools: ToolRegistry<C>,
    handoffs: Vec<Handoff<C>>,
    handoff_index: HashMap<String, usize>,
    model: ModelRef,
}

impl<C: Send + 'static> Agent<C> {
    pub fn builder(name: impl Into<String>, model: ModelRef) -> AgentBuilder<C> {
        AgentBuilder {
            name: name.into(),
            instructions: String::new(),
            handoff_description: None,
            tools: ToolRegistry::new(),
            handoffs: Vec::new(),
            model,
        }
    }

    /// Everything the model may call: tools first, then handoffs
    pub fn tool_definitions(&self) -> Vec<ToolSpec> {
        let mut defs = self.tools.definitions();
        defs.extend(self.handoffs.iter().map(Handoff::definition));
        defs
    }
}

impl<C> Agent<C> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn handoff_description(&self) -> Option<&str> {
        self.handoff_description.as_deref()
    }

    pub fn tools(&self) -> &ToolRegistry<C> {
        &self.tools
    }

    pub fn handoffs(&self) -> &[Handoff<C>] {
        &self.handoffs
    }

    /// Handoff exposed under `tool_name`
    pub fn handoff(&self, tool_name: &str) -> Option<&Handoff<C>> {
        self.handoff_index
            .get(tool_name)
            .map(|&pos| &self.handoffs[pos])
    }

    pub fn model(&self) -> &ModelRef {
        &self.model
    }
}

impl<C> fmt::Debug for Agent<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handoffs: Vec<&str> = self.handoffs.iter().map(|h| h.tool_name()).collect();
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("tools", &self.tools)
            .field("handoffs", &handoffs)
            .field("model", &self.model)
            .finish()
    }
}

/// Builder for [`Agent`]
pub struct AgentBuilder<C> {
    name: String,
    instructions: String,
    handoff_description: Option<String>,
    tools: ToolRegistry<C>,
    handoffs: Vec<Handoff<C>>,
    model: ModelRef,
}

impl<C: Send + 'static> AgentBuilder<C> {
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Shown to other agents that can hand off to this one
    pub fn handoff_description(mut self, description: impl Into<String>) -> Self {
        self.handoff_description = Some(description.into());
        self
    }

    pub fn tool<T: Tool<C> + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    pub fn shared_tool(mut self, tool: Arc<dyn Tool<C>>) -> Self {
        self.tools.register_shared(tool);
        self
    }

    pub fn handoff(mut self, handoff: Handoff<C>) -> Self {
        self.handoffs.push(handoff);
        self
    }

    pub fn build(self) -> Arc<Agent<C>> {
        let mut handoffs: Vec<Handoff<C>> = Vec::with_capacity(self.handoffs.len());
        let mut handoff_index = HashMap::new();
        for handoff in self.handoffs {
            match handoff_index.get(handoff.tool_name()) {
                Some(&pos) => handoffs[pos] = handoff,
                None => {
                    handoff_index.insert(handoff.tool_name().to_string(), handoffs.len());
                    handoffs.push(handoff);
                }
            }
        }

        Arc::new(Agent {
            name: self.name,
            instructions: self.instructions,
            handoff_description: self.handoff_description,
            tools: self.tools,
            handoffs,
            handoff_index,
            model: self.model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use baton_provider::{ChatParams, ChatResponse};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullProvider;

    #[async_trait]
    impl Provider for NullProvider {
        async fn chat(&self, _params: ChatParams) -> baton_provider::Result<ChatResponse> {
            Ok(ChatResponse::text(""))
        }
        fn default_model(&self) -> String {
            "null-model".to_string()
        }
        fn is_configured(&self) -> bool {
            true
        }
    }

    fn model() -> ModelRef {
        ModelRef::new(Arc::new(NullProvider))
    }

    #[test]
    fn test_default_tool_name() {
        assert_eq!(
            default_tool_name("Customer Support Agent"),
            "transfer_to_customer_support_agent"
        );
        assert_eq!(default_tool_name("  Billing--Desk! "), "transfer_to_billing_desk");
    }

    #[test]
    fn test_model_name_falls_back_to_provider() {
        assert_eq!(model().model_name(), "null-model");
        assert_eq!(model().with_model("gemini-2.0-flash").model_name(), "gemini-2.0-flash");
    }

    #[test]
    fn test_handoff_definition_uses_target_description() {
        let support: Arc<Agent<()>> = Agent::builder("Support", model())
            .handoff_description("Handles account questions")
            .build();
        let handoff = Handoff::new(support);

        let def = handoff.definition();
        assert_eq!(def.function.name, "transfer_to_support");
        assert!(def.function.description.contains("Support agent"));
        assert!(def.function.description.contains("Handles account questions"));
    }

    #[test]
    fn test_tool_definitions_list_handoffs_after_tools() {
        let support: Arc<Agent<()>> = Agent::builder("Support", model()).build();
        let agent = Agent::builder("Front Desk", model())
            .handoff(Handoff::new(support))
            .build();

        let names: Vec<String> = agent
            .tool_definitions()
            .into_iter()
            .map(|t| t.function.name)
            .collect();
        assert_eq!(names, vec!["transfer_to_support".to_string()]);
        assert_eq!(agent.handoff("transfer_to_support").unwrap().target().name(), "Support");
        assert!(agent.handoff("transfer_to_nobody").is_none());
    }

    #[test]
    fn test_fire_runs_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let support: Arc<Agent<()>> = Agent::builder("Support", model()).build();
        let handoff = Handoff::new(support).on_handoff(move |trigger| {
            assert_eq!(trigger.to_agent, "Support");
            seen.fetch_add(1, Ordering::SeqCst);
        });

        handoff.fire(&HandoffTrigger {
            from_agent: "Front Desk".to_string(),
            to_agent: "Support".to_string(),
            reason: None,
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_duplicate_handoff_names_collapse() {
        let a: Arc<Agent<()>> = Agent::builder("Support", model()).build();
        let b: Arc<Agent<()>> = Agent::builder("Support", model())
            .instructions("second")
            .build();
        let agent = Agent::builder("Front Desk", model())
            .handoff(Handoff::new(a))
            .handoff(Handoff::new(b))
            .build();
        assert_eq!(agent.handoffs().len(), 1);
        assert_eq!(agent.handoffs()[0].target().instructions(), "second");
    }
}
