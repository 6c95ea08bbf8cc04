use super::*;
use crate::config::{Credentials, WatsonxConfig};

fn test_credentials() -> Credentials {
    Credentials {
        api_key: "test-key".to_string(),
        project_id: "test-project".to_string(),
    }
}

#[test]
fn client_configuration() {
    let config = WatsonxConfig {
        endpoint: "https://eu-de.ml.cloud.ibm.com".to_string(),
        embedding_model: "ibm/slate-125m-english-rtrvr".to_string(),
        generation_model: "ibm/granite-13b-chat-v2".to_string(),
        embedding_dimension: 768,
        batch_size: 8,
    };
    let embedder =
        WatsonxEmbedder::new(&config, &test_credentials()).expect("client should build");

    assert_eq!(embedder.model, "ibm/slate-125m-english-rtrvr");
    assert_eq!(embedder.project_id, "test-project");
    assert_eq!(embedder.batch_size, 8);
    assert_eq!(embedder.dimension(), 768);
    assert_eq!(embedder.base_url.host_str(), Some("eu-de.ml.cloud.ibm.com"));
}

#[test]
fn invalid_endpoint_is_a_config_error() {
    let config = WatsonxConfig {
        endpoint: "not a url".to_string(),
        ..WatsonxConfig::default()
    };

    assert!(matches!(
        WatsonxEmbedder::new(&config, &test_credentials()),
        Err(crate::SahayError::Config(_))
    ));
}

#[test]
fn empty_text_is_rejected_without_a_network_call() {
    let embedder = WatsonxEmbedder::new(&WatsonxConfig::default(), &test_credentials())
        .expect("client should build");

    assert!(matches!(
        embedder.embed(""),
        Err(crate::SahayError::Embedding(_))
    ));
    assert!(matches!(
        embedder.embed("   \n"),
        Err(crate::SahayError::Embedding(_))
    ));
}

#[test]
fn empty_batch_is_a_no_op() {
    let embedder = WatsonxEmbedder::new(&WatsonxConfig::default(), &test_credentials())
        .expect("client should build");

    let vectors = embedder.embed_batch(&[]).expect("empty batch should succeed");
    assert!(vectors.is_empty());
}

#[test]
fn http_errors_describe_authentication_failures() {
    let message = describe_http_error(&ureq::Error::StatusCode(401));
    assert!(message.contains("Authentication"));

    let message = describe_http_error(&ureq::Error::StatusCode(500));
    assert!(message.contains("500"));
}
