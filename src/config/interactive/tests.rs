use super::{load_existing_config, mask_secret};
use tempfile::TempDir;

#[test]
fn load_existing_config_falls_back_to_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let config = load_existing_config(temp_dir.path());

    assert_eq!(config.get_base_dir(), temp_dir.path());
    assert!(!config.ollama.host.is_empty());
    assert!(config.ollama.port > 0);
    assert!(!config.ollama.model.is_empty());
    assert_eq!(config.retrieval.top_k, 3);
}

#[test]
fn load_existing_config_ignores_invalid_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    std::fs::write(
        temp_dir.path().join("config.toml"),
        "[retrieval]\ntop_k = 0\n",
    )
    .expect("should write config");

    let config = load_existing_config(temp_dir.path());

    assert_eq!(config.retrieval.top_k, 3);
    assert_eq!(config.get_base_dir(), temp_dir.path());
}

#[test]
fn load_existing_config_reads_saved_values() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    std::fs::write(
        temp_dir.path().join("config.toml"),
        "[llm]\nmodel = \"llama-3.1-8b-instant\"\n",
    )
    .expect("should write config");

    let config = load_existing_config(temp_dir.path());

    assert_eq!(config.llm.model, "llama-3.1-8b-instant");
}

#[test]
fn secrets_are_masked() {
    assert_eq!(
        mask_secret("gsk_abcdefghijkl1234"),
        format!("{}1234", "*".repeat(16))
    );
    assert_eq!(mask_secret("short"), "*****");
    assert_eq!(mask_secret(""), "");
}
