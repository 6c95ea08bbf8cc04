use super::*;
use serial_test::serial;
use tempfile::TempDir;

#[test]
fn default_config_is_valid() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.watsonx.embedding_dimension, 384);
    assert_eq!(config.retrieval.top_k, 3);
    assert_eq!(config.chunking.chunk_size, 1000);
    assert_eq!(config.chunking.overlap, 150);
}

#[test]
fn load_without_config_file_uses_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = Config::load(temp_dir.path()).expect("load should succeed");

    assert_eq!(config.base_dir, temp_dir.path());
    assert_eq!(config.watsonx, WatsonxConfig::default());
    assert_eq!(
        config.document_path(),
        temp_dir.path().join("data/pm_kisan_rules.pdf")
    );
    assert_eq!(config.index_dir(), temp_dir.path().join("data/vector_db"));
    assert_eq!(
        config.log_path(),
        temp_dir.path().join("logs/interactions.jsonl")
    );
}

#[test]
fn load_parses_partial_config_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let toml = r#"
pdf_path = "docs/scheme.pdf"

[watsonx]
endpoint = "https://eu-de.ml.cloud.ibm.com"
batch_size = 4

[retrieval]
top_k = 5
"#;
    std::fs::write(temp_dir.path().join("sahay.toml"), toml).expect("should write config");

    let config = Config::load(temp_dir.path()).expect("load should succeed");

    assert_eq!(config.watsonx.endpoint, "https://eu-de.ml.cloud.ibm.com");
    assert_eq!(config.watsonx.batch_size, 4);
    // Unspecified fields keep their defaults
    assert_eq!(config.watsonx.embedding_model, "ibm/slate-30m-english-rtrvr");
    assert_eq!(config.retrieval.top_k, 5);
    assert_eq!(config.document_path(), temp_dir.path().join("docs/scheme.pdf"));
}

#[test]
fn load_rejects_invalid_config_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let toml = r#"
[chunking]
chunk_size = 100
overlap = 100
"#;
    std::fs::write(temp_dir.path().join("sahay.toml"), toml).expect("should write config");

    assert!(Config::load(temp_dir.path()).is_err());
}

#[test]
fn validate_rejects_overlap_not_smaller_than_chunk_size() {
    let mut config = Config::default();
    config.chunking.chunk_size = 100;
    config.chunking.overlap = 150;

    let err = config.validate().expect_err("validation should fail");
    assert!(matches!(err, ConfigError::OverlapTooLarge(150, 100)));
}

#[test]
fn validate_rejects_zero_top_k() {
    let mut config = Config::default();
    config.retrieval.top_k = 0;

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidTopK(0))
    ));
}

#[test]
fn validate_rejects_bad_endpoint() {
    let mut config = Config::default();
    config.watsonx.endpoint = "not a url".to_string();

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidEndpoint(_))
    ));
}

#[test]
fn validate_rejects_zero_port() {
    let mut config = Config::default();
    config.server.port = 0;

    assert!(matches!(config.validate(), Err(ConfigError::InvalidPort(0))));
}

#[test]
#[serial]
fn credentials_from_env() {
    // SAFETY: `#[serial]` tests are the only environment writers in this process.
    unsafe {
        std::env::set_var(ENV_API_KEY, "test-key");
        std::env::set_var(ENV_PROJECT_ID, "test-project");
    }

    let credentials = Credentials::from_env().expect("credentials should load");
    assert_eq!(credentials.api_key, "test-key");
    assert_eq!(credentials.project_id, "test-project");

    // SAFETY: `#[serial]` tests are the only environment writers in this process.
    unsafe {
        std::env::remove_var(ENV_API_KEY);
        std::env::remove_var(ENV_PROJECT_ID);
    }
}

#[test]
#[serial]
fn credentials_missing_api_key_names_the_variable() {
    // SAFETY: `#[serial]` tests are the only environment writers in this process.
    unsafe {
        std::env::remove_var(ENV_API_KEY);
        std::env::set_var(ENV_PROJECT_ID, "test-project");
    }

    let err = Credentials::from_env().expect_err("should fail without api key");
    assert!(err.to_string().contains(ENV_API_KEY));

    // SAFETY: `#[serial]` tests are the only environment writers in this process.
    unsafe {
        std::env::remove_var(ENV_PROJECT_ID);
    }
}

#[test]
#[serial]
fn credentials_empty_project_id_is_rejected() {
    // SAFETY: `#[serial]` tests are the only environment writers in this process.
    unsafe {
        std::env::set_var(ENV_API_KEY, "test-key");
        std::env::set_var(ENV_PROJECT_ID, "   ");
    }

    let err = Credentials::from_env().expect_err("should fail with blank project id");
    assert!(err.to_string().contains(ENV_PROJECT_ID));

    // SAFETY: `#[serial]` tests are the only environment writers in this process.
    unsafe {
        std::env::remove_var(ENV_API_KEY);
        std::env::remove_var(ENV_PROJECT_ID);
    }
}
