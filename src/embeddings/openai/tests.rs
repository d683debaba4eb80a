use super::*;
use crate::config::OpenAiConfig;

#[test]
fn client_configuration() {
    let config = OpenAiConfig {
        api_base: "http://localhost:8080".to_string(),
        embedding_model: "test-embed".to_string(),
        chat_model: "test-chat".to_string(),
        embedding_dimension: 256,
        batch_size: 10,
        batch_delay_ms: 0,
        temperature: 0.5,
        max_tokens: 512,
    };
    let client = OpenAiClient::new(&config).expect("Failed to create client");

    assert_eq!(client.embedding_model, "test-embed");
    assert_eq!(client.chat_model, "test-chat");
    assert_eq!(client.embedding_dimension, 256);
    assert_eq!(client.api_base.host_str(), Some("localhost"));
    assert_eq!(client.api_base.port(), Some(8080));
    assert_eq!(client.retry_attempts, DEFAULT_RETRY_ATTEMPTS);
}

#[test]
fn client_builder_methods() {
    let config = OpenAiConfig::default();
    let client = OpenAiClient::new(&config)
        .expect("Failed to create client")
        .with_timeout(Duration::from_secs(60))
        .with_retry_attempts(5);

    assert_eq!(client.retry_attempts, 5);

    // At least one attempt is always made
    let client = client.with_retry_attempts(0);
    assert_eq!(client.retry_attempts, 1);
}

#[test]
fn invalid_api_base_is_rejected() {
    let config = OpenAiConfig {
        api_base: "not a url".to_string(),
        ..OpenAiConfig::default()
    };
    assert!(OpenAiClient::new(&config).is_err());
}

#[test]
fn empty_batch_is_a_noop() {
    let config = OpenAiConfig::default();
    let client = OpenAiClient::new(&config).expect("Failed to create client");

    let embeddings = client
        .generate_embeddings(&[])
        .expect("empty batch should not hit the network");
    assert!(embeddings.is_empty());
}
