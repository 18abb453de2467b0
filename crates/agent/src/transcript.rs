//! Append-only conversation history

use baton_provider::{Message, ToolCall, ToolCallDef};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Kind of transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    ToolResult,
    ToolError,
    Handoff,
}

/// One entry of the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Item {
    User {
        content: String,
    },
    Assistant {
        /// Agent that produced this output
        agent: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    ToolResult {
        call_id: String,
        name: String,
        output: String,
    },
    ToolError {
        call_id: String,
        name: String,
        error: String,
    },
    Handoff {
        call_id: String,
        /// Pseudo-tool name the model called
        tool: String,
        from: String,
        to: String,
    },
}

impl Item {
    pub fn user(content: impl Into<String>) -> Self {
        Item::User {
            content: content.into(),
        }
    }

    pub fn assistant_text(agent: impl Into<String>, content: impl Into<String>) -> Self {
        Item::Assistant {
            agent: agent.into(),
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Item::User { .. } => Role::User,
            Item::Assistant { .. } => Role::Assistant,
            Item::ToolResult { .. } => Role::ToolResult,
            Item::ToolError { .. } => Role::ToolError,
            Item::Handoff { .. } => Role::Handoff,
        }
    }

    /// Wire form of this entry
    pub fn to_message(&self) -> Message {
        match self {
            Item::User { content } => Message::user(content),
            Item::Assistant {
                content,
                tool_calls,
                ..
            } => {
                if tool_calls.is_empty() {
                    Message::assistant(content.clone().unwrap_or_default())
                } else {
                    let defs = tool_calls.iter().map(ToolCallDef::from).collect();
                    Message::assistant_with_calls(content.clone(), defs)
                }
            }
            Item::ToolResult {
                call_id,
                name,
                output,
            } => Message::tool(call_id, name, output),
            Item::ToolError {
                call_id,
                name,
                error,
            } => Message::tool(call_id, name, format!("Error: {}", error)),
            Item::Handoff {
                call_id, tool, to, ..
            } => Message::tool(call_id, tool, json!({ "assistant": to }).to_string()),
        }
    }
}

/// Ordered conversation history
///
/// Items are only ever appended. Hosts that want to shorten history build a
/// new transcript from the items they keep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    items: Vec<Item>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, item: Item) {
        self.items.push(item);
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.append(Item::user(content));
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Items appended at or after position `start`
    pub fn since(&self, start: usize) -> &[Item] {
        &self.items[start.min(self.items.len())..]
    }

    pub fn last(&self) -> Option<&Item> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// One message per item, in conversation order
    pub fn as_model_input(&self) -> Vec<Message> {
        self.items.iter().map(Item::to_message).collect()
    }

    /// Independent copy the host can keep across turns
    pub fn snapshot(&self) -> Transcript {
        self.clone()
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items
    }
}

impl From<Vec<Item>> for Transcript {
    fn from(items: Vec<Item>) -> Self {
        Self { items }
    }
}
