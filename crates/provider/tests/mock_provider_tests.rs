//! Mock Provider Tests
//!
//! Verifies the Provider trait can be mocked with mockall and consumed
//! through a trait object, the way the runner uses it.

use async_trait::async_trait;
use baton_provider::{
    ChatParams, ChatResponse, Message, ModelOutput, Provider, ProviderError, Tool, ToolCall,
    ToolChoice, Usage,
};
use mockall::mock;
use serde_json::json;
use std::sync::Arc;

mock! {
    pub Provider {}

    #[async_trait]
    impl Provider for Provider {
        async fn chat(&self, params: ChatParams) -> Result<ChatResponse, ProviderError>;
        fn default_model(&self) -> String;
        fn is_configured(&self) -> bool;
    }
}

#[tokio::test]
async fn test_mock_provider_chat_returns_success() {
    let mut mock = MockProvider::new();

    mock.expect_chat()
        .times(1)
        .returning(|_| Ok(ChatResponse::text("Hello from mock!")));

    let response = mock.chat(ChatParams::default()).await.unwrap();

    assert_eq!(response.content, Some("Hello from mock!".to_string()));
    assert!(!response.has_tool_calls());
}

#[tokio::test]
async fn test_mock_provider_chat_returns_error() {
    let mut mock = MockProvider::new();

    mock.expect_chat()
        .times(1)
        .returning(|_| Err(ProviderError::Api("Mock API error".to_string())));

    match mock.chat(ChatParams::default()).await {
        Err(ProviderError::Api(msg)) => assert_eq!(msg, "Mock API error"),
        other => panic!("Expected Api error, got {:?}", other.map(|r| r.content)),
    }
}

#[tokio::test]
async fn test_mock_provider_tool_calls_classify_as_tool_output() {
    let mut mock = MockProvider::new();

    mock.expect_chat()
        .times(1)
        .withf(|params| {
            params.messages.len() == 2
                && params.instructions() == Some("You are a shopping assistant")
                && params.tool_names() == vec!["get_budget"]
        })
        .returning(|_| {
            Ok(ChatResponse {
                content: None,
                tool_calls: vec![ToolCall::new("call_1", "get_budget", json!({}))],
                finish_reason: "tool_calls".to_string(),
                usage: Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                },
            })
        });

    let params = ChatParams {
        model: "test-model".to_string(),
        messages: vec![
            Message::system("You are a shopping assistant"),
            Message::user("What's my budget?"),
        ],
        tools: vec![Tool::new("get_budget", "Get the budget", json!({}))],
        max_tokens: 100,
        temperature: 0.5,
        tool_choice: ToolChoice::Auto,
    };

    let response = mock.chat(params).await.unwrap();
    assert_eq!(response.usage.total_tokens, 15);

    match response.into_output() {
        ModelOutput::ToolCalls { calls, .. } => assert_eq!(calls[0].name, "get_budget"),
        other => panic!("expected tool calls, got {:?}", other),
    }
}

#[test]
fn test_mock_provider_default_model() {
    let mut mock = MockProvider::new();

    mock.expect_default_model()
        .times(1)
        .returning(|| "mock-model-v1".to_string());

    assert_eq!(mock.default_model(), "mock-model-v1");
}

#[tokio::test]
async fn test_mock_provider_errors_pass_through() {
    let mut mock = MockProvider::new();

    mock.expect_chat()
        .times(1)
        .returning(|_| Err(ProviderError::RateLimited));
    mock.expect_chat()
        .times(1)
        .returning(|_| Err(ProviderError::InvalidResponse));

    assert!(matches!(
        mock.chat(ChatParams::default()).await,
        Err(ProviderError::RateLimited)
    ));
    assert!(matches!(
        mock.chat(ChatParams::default()).await,
        Err(ProviderError::InvalidResponse)
    ));
}

#[tokio::test]
async fn test_mock_provider_shared_as_trait_object() {
    let mut mock = MockProvider::new();

    mock.expect_is_configured().times(1).returning(|| true);
    mock.expect_chat()
        .times(2)
        .returning(|params| {
            let last = params
                .messages
                .last()
                .and_then(|m| m.content.clone())
                .unwrap_or_default();
            Ok(ChatResponse::text(format!("Echo: {}", last)))
        });

    let provider: Arc<dyn Provider> = Arc::new(mock);
    assert!(provider.is_configured());

    for text in ["first", "second"] {
        let params = ChatParams {
            messages: vec![Message::user(text)],
            ..ChatParams::default()
        };
        let response = provider.chat(params).await.unwrap();
        assert_eq!(response.content, Some(format!("Echo: {}", text)));
    }
}
