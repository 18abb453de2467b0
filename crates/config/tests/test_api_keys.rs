//! Tests for API key resolution

use baton_config::Config;

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn test_api_key_none_when_empty() {
    let config = Config::default();
    assert_eq!(config.api_key_with(no_env), None);
}

#[test]
fn test_api_key_priority_order() {
    let mut config = Config::default();
    config.providers.gemini.api_key = "gemini".to_string();
    config.providers.openai.api_key = "openai".to_string();
    config.providers.openrouter.api_key = "openrouter".to_string();

    assert_eq!(config.api_key_with(no_env), Some("gemini".to_string()));

    config.providers.gemini.api_key.clear();
    assert_eq!(config.api_key_with(no_env), Some("openai".to_string()));

    config.providers.openai.api_key.clear();
    assert_eq!(config.api_key_with(no_env), Some("openrouter".to_string()));
}

#[test]
fn test_api_key_falls_back_to_environment() {
    let config = Config::default();
    let env = |name: &str| match name {
        "OPENAI_API_KEY" => Some("sk-env".to_string()),
        "OPENROUTER_API_KEY" => Some("sk-or-env".to_string()),
        _ => None,
    };
    assert_eq!(config.api_key_with(env), Some("sk-env".to_string()));
}

#[test]
fn test_api_key_env_gemini_first_and_skips_empty() {
    let config = Config::default();
    let env = |name: &str| match name {
        "GEMINI_API_KEY" => Some(String::new()),
        "OPENROUTER_API_KEY" => Some("sk-or-env".to_string()),
        _ => None,
    };
    assert_eq!(config.api_key_with(env), Some("sk-or-env".to_string()));
}

#[test]
fn test_config_key_beats_environment() {
    let mut config = Config::default();
    config.providers.openrouter.api_key = "from-file".to_string();
    let env = |_: &str| Some("from-env".to_string());
    assert_eq!(config.api_key_with(env), Some("from-file".to_string()));
}
