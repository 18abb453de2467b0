//! OpenAI-compatible chat completions endpoint
//!
//! Covers OpenAI itself, OpenRouter and Gemini's OpenAI-compatible surface.

use crate::*;
use reqwest::Client;
use serde_json::json;

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Which hosted service a key or base URL points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    OpenAi,
    OpenRouter,
    Gemini,
}

impl Flavor {
    /// Guess the service from the key prefix, then the base URL
    pub fn detect(api_key: &str, api_base: Option<&str>) -> Self {
        if api_key.starts_with("sk-or-") || api_base.is_some_and(|b| b.contains("openrouter")) {
            Flavor::OpenRouter
        } else if api_key.starts_with("AIza")
            || api_base.is_some_and(|b| b.contains("generativelanguage.googleapis.com"))
        {
            Flavor::Gemini
        } else {
            Flavor::OpenAi
        }
    }

    pub fn default_api_base(self) -> &'static str {
        match self {
            Flavor::OpenAi => OPENAI_API_BASE,
            Flavor::OpenRouter => OPENROUTER_API_BASE,
            Flavor::Gemini => GEMINI_API_BASE,
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Flavor::OpenAi => "gpt-4o-mini",
            Flavor::OpenRouter => "google/gemini-2.0-flash-001",
            Flavor::Gemini => "gemini-2.0-flash",
        }
    }
}

/// HTTP provider speaking the `/chat/completions` protocol
pub struct OpenAiCompatProvider {
    client: Client,
    api_key: String,
    api_base: String,
    default_model: String,
    flavor: Flavor,
}

impl OpenAiCompatProvider {
    pub fn new(
        api_key: impl Into<String>,
        api_base: Option<String>,
        default_model: Option<String>,
    ) -> Self {
        let api_key = api_key.into();
        let flavor = Flavor::detect(&api_key, api_base.as_deref());

        let api_base = api_base
            .map(|b| b.trim_end_matches('/').to_string())
            .unwrap_or_else(|| flavor.default_api_base().to_string());
        let default_model = default_model.unwrap_or_else(|| flavor.default_model().to_string());

        Self {
            client: Client::new(),
            api_key,
            api_base,
            default_model,
            flavor,
        }
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn build_request(&self, params: &ChatParams) -> serde_json::Value {
        let model = if params.model.is_empty() {
            self.default_model.clone()
        } else {
            params.model.clone()
        };

        let messages: Vec<serde_json::Value> = params
            .messages
            .iter()
            .map(|m| {
                let mut obj = json!({ "role": &m.role });
                if let Some(content) = &m.content {
                    obj["content"] = json!(content);
                }
                if let Some(tool_calls) = &m.tool_calls {
                    // The wire format carries arguments as an encoded JSON string
                    let calls: Vec<serde_json::Value> = tool_calls
                        .iter()
                        .map(|tc| {
                            json!({
                                "id": &tc.id,
                                "type": &tc.call_type,
                                "function": {
                                    "name": &tc.function.name,
                                    "arguments": encode_arguments(&tc.function.arguments),
                                }
                            })
                        })
                        .collect();
                    obj["tool_calls"] = json!(calls);
                }
                if let Some(tool_call_id) = &m.tool_call_id {
                    obj["tool_call_id"] = json!(tool_call_id);
                }
                if let Some(name) = &m.name {
                    obj["name"] = json!(name);
                }
                obj
            })
            .collect();

        let mut body = json!({
            "model": model,
            "messages": messages,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
        });

        if !params.tools.is_empty() {
            let tools: Vec<serde_json::Value> = params
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": &t.function.name,
                            "description": &t.function.description,
                            "parameters": &t.function.parameters
                        }
                    })
                })
                .collect();

            body["tools"] = json!(tools);
            body["tool_choice"] = match &params.tool_choice {
                ToolChoice::Auto => json!("auto"),
                ToolChoice::Required(name) => {
                    json!({"type": "function", "function": {"name": name}})
                }
                ToolChoice::None => json!("none"),
            };
        }

        body
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<ChatResponse> {
        let choice = json["choices"]
            .get(0)
            .ok_or(ProviderError::InvalidResponse)?;
        let message = &choice["message"];
        let content = message["content"].as_str().map(|s| s.to_string());
        let finish_reason = choice["finish_reason"]
            .as_str()
            .unwrap_or("stop")
            .to_string();

        let mut tool_calls = Vec::new();
        if let Some(calls) = message["tool_calls"].as_array() {
            for call in calls {
                let function = &call["function"];
                let name = function["name"]
                    .as_str()
                    .ok_or(ProviderError::InvalidResponse)?;
                // Undecodable argument strings are passed through untouched so
                // schema validation can report them back to the model.
                let args = function["arguments"]
                    .as_str()
                    .map(|s| {
                        if s.trim().is_empty() {
                            json!({})
                        } else {
                            serde_json::from_str(s).unwrap_or_else(|_| json!(s))
                        }
                    })
                    .unwrap_or_else(|| function["arguments"].clone());

                tool_calls.push(ToolCall {
                    id: call["id"].as_str().unwrap_or("").to_string(),
                    name: name.to_string(),
                    arguments: args,
                });
            }
        }
        ensure_call_ids(&mut tool_calls);

        let usage = if let Some(usage) = json["usage"].as_object() {
            let field = |k: &str| usage.get(k).and_then(|v| v.as_u64()).unwrap_or(0) as u32;
            Usage {
                prompt_tokens: field("prompt_tokens"),
                completion_tokens: field("completion_tokens"),
                total_tokens: field("total_tokens"),
            }
        } else {
            Usage::default()
        };

        Ok(ChatResponse {
            content,
            tool_calls,
            finish_reason,
            usage,
        })
    }
}

fn encode_arguments(arguments: &serde_json::Value) -> String {
    match arguments {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait::async_trait]
impl Provider for OpenAiCompatProvider {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NoApiKey);
        }

        trace!("◆ POST {}/chat/completions ({:?})", self.api_base, self.flavor);

        let url = format!("{}/chat/completions", self.api_base);
        let body = self.build_request(&params);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited);
        }

        let json: serde_json::Value = response.json().await?;

        if !status.is_success() {
            // Gemini wraps errors in a one-element array
            let error = json["error"]["message"]
                .as_str()
                .or_else(|| json[0]["error"]["message"].as_str())
                .unwrap_or("UNKNOWN ERROR")
                .to_string();
            return Err(ProviderError::Api(format!("{}: {}", status, error)));
        }

        debug!(
            "◆ MODEL RESPONSE: {} TOOL CALLS",
            json["choices"][0]["message"]["tool_calls"]
                .as_array()
                .map(|v| v.len())
                .unwrap_or(0)
        );

        self.parse_response(json)
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}
