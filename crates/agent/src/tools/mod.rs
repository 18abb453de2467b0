//! Tools and the per-agent tool registry

pub mod schema;

use async_trait::async_trait;
use baton_provider::Tool as ToolSpec;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use schema::ArgumentValidator;

/// Tool call failures
///
/// Everything except `Fatal` is folded back into the transcript so the
/// model can correct itself on the next round.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("tool '{0}' not found")]
    UnknownTool(String),

    #[error("handoff target '{0}' not found")]
    UnknownHandoffTarget(String),

    #[error("handler failed: {0}")]
    Handler(String),

    #[error("fatal tool failure: {0}")]
    Fatal(String),
}

impl ToolError {
    pub fn handler(reason: impl fmt::Display) -> Self {
        ToolError::Handler(reason.to_string())
    }

    pub fn fatal(reason: impl fmt::Display) -> Self {
        ToolError::Fatal(reason.to_string())
    }

    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ToolError::Fatal(_))
    }
}

/// A named, schema-described callable over a conversation context `C`
#[async_trait]
pub trait Tool<C>: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// JSON schema of the arguments object
    fn parameters(&self) -> Value;
    /// Run the handler; arguments have already passed schema validation.
    async fn invoke(&self, ctx: &mut C, args: Value) -> Result<Value, ToolError>;
}

pub fn to_provider_tool<C>(tool: &dyn Tool<C>) -> ToolSpec {
    ToolSpec::new(tool.name(), tool.description(), tool.parameters())
}

/// Deserialize validated arguments into a typed struct
pub fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Text form of a tool result as shown to the model
pub fn render_output(value: &Value) -> String {
    match value {
        Value::Null => "Done".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

struct Entry<C> {
    tool: Arc<dyn Tool<C>>,
    validator: ArgumentValidator,
}

/// Insertion-ordered tool set with O(1) lookup by name
pub struct ToolRegistry<C> {
    entries: Vec<Entry<C>>,
    index: HashMap<String, usize>,
}

impl<C: Send + 'static> ToolRegistry<C> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn register<T: Tool<C> + 'static>(&mut self, tool: T) {
        self.register_shared(Arc::new(tool));
    }

    /// Register a tool that other agents may also hold
    pub fn register_shared(&mut self, tool: Arc<dyn Tool<C>>) {
        let name = tool.name().to_string();
        let validator = ArgumentValidator::compile(&tool.parameters());
        let entry = Entry { tool, validator };

        match self.index.get(&name) {
            Some(&pos) => {
                warn!("Tool '{}' registered twice; keeping the later one", name);
                self.entries[pos] = entry;
            }
            None => {
                self.index.insert(name, self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool<C>>> {
        self.index.get(name).map(|&pos| &self.entries[pos].tool)
    }

    pub fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Schemas in registration order
    pub fn definitions(&self) -> Vec<ToolSpec> {
        self.entries
            .iter()
            .map(|e| to_provider_tool(e.tool.as_ref()))
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.tool.name().to_string())
            .collect()
    }

    /// Validate `args` against the tool's schema, then run it once.
    pub async fn invoke(&self, name: &str, ctx: &mut C, args: Value) -> Result<Value, ToolError> {
        let entry = self
            .index
            .get(name)
            .map(|&pos| &self.entries[pos])
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        // Models commonly send nothing for zero-argument tools
        let args = match args {
            Value::Null => Value::Object(serde_json::Map::new()),
            other => other,
        };

        entry.validator.validate(&args)?;
        debug!("Invoking tool {}", name);
        entry.tool.invoke(ctx, args).await
    }
}

impl<C: Send + 'static> Default for ToolRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for ToolRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.entries.iter().map(|e| e.tool.name()).collect();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}
