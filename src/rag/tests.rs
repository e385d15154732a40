use super::*;
use crate::ingest::Indexer;
use crate::test_support::{
    CannedChatModel, FailingChatModel, FailingEmbedder, HashingEmbedder, write_manuals,
};
use tempfile::TempDir;

async fn ingested_store(temp_dir: &TempDir) -> VectorStore {
    let dataset = temp_dir.path().join("dataset");
    let store_dir = temp_dir.path().join("vector_db");
    write_manuals(&dataset);

    Indexer::new(Arc::new(HashingEmbedder::new()), &store_dir)
        .ingest(&dataset, false)
        .await
        .expect("ingestion should succeed");

    VectorStore::open_existing(&store_dir, "hashing-test-model")
        .await
        .expect("store should open")
}

#[tokio::test]
async fn answer_returns_reply_with_top_k_sources() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store = ingested_store(&temp_dir).await;
    let llm = Arc::new(CannedChatModel::new("Prime the tubing first."));
    let chain = RetrievalChain::new(Arc::new(HashingEmbedder::new()), store, llm.clone());

    let answer = chain
        .answer("How do I prime the infusion pump tubing?")
        .await
        .expect("answer should succeed");

    assert_eq!(chain.top_k(), DEFAULT_TOP_K);
    assert_eq!(answer.answer, "Prime the tubing first.");
    assert_eq!(answer.sources.len(), 3);
    assert_eq!(answer.sources[0].metadata.title, "Infusion Pump Manual");
    assert_eq!(source_file_name(&answer.sources[0].metadata.source), "infusion.json");
}

#[tokio::test]
async fn prompt_carries_context_and_question() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store = ingested_store(&temp_dir).await;
    let llm = Arc::new(CannedChatModel::new("ok"));
    let chain = RetrievalChain::new(Arc::new(HashingEmbedder::new()), store, llm.clone())
        .with_top_k(2);

    let answer = chain
        .answer("What tidal volume should the ventilator use?")
        .await
        .expect("answer should succeed");

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 1);
    let prompt = &prompts[0];
    assert!(prompt.starts_with("You are a helpful AI assistant specialized in medical device support"));
    assert!(prompt.contains("Question: What tidal volume should the ventilator use?"));
    assert!(prompt.ends_with("Helpful Answer:"));

    assert_eq!(answer.sources.len(), 2);
    let expected_context = format!("{}\n\n{}", answer.sources[0].text, answer.sources[1].text);
    assert!(prompt.contains(&expected_context));
    assert!(answer.sources[0].text.starts_with("Title: Ventilator Handbook"));
}

#[tokio::test]
async fn independent_calls_do_not_share_state() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store = ingested_store(&temp_dir).await;
    let llm = Arc::new(CannedChatModel::new("ok"));
    let chain = RetrievalChain::new(Arc::new(HashingEmbedder::new()), store, llm.clone());

    chain.answer("heart monitor electrodes").await.expect("first call");
    chain.answer("ventilator panel").await.expect("second call");

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(!prompts[1].contains("heart monitor electrodes"));
}

#[tokio::test]
async fn empty_store_still_asks_the_model() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store = VectorStore::create(temp_dir.path(), "hashing-test-model")
        .await
        .expect("should create store");
    let llm = Arc::new(CannedChatModel::new("I don't know."));
    let chain = RetrievalChain::new(Arc::new(HashingEmbedder::new()), store, llm.clone());

    let answer = chain.answer("anything").await.expect("answer should succeed");

    assert!(answer.sources.is_empty());
    assert_eq!(answer.answer, "I don't know.");
    assert!(llm.prompts()[0].contains("Context:\n\n\nQuestion: anything"));
}

#[tokio::test]
async fn embedding_failure_is_retrieval_error() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store = ingested_store(&temp_dir).await;
    let llm = Arc::new(CannedChatModel::new("unused"));
    let chain = RetrievalChain::new(Arc::new(FailingEmbedder), store, llm.clone());

    let result = chain.answer("question").await;

    assert!(matches!(result, Err(RagError::Retrieval(_))));
    assert!(llm.prompts().is_empty());
}

#[tokio::test]
async fn llm_failure_is_generation_error() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store = ingested_store(&temp_dir).await;
    let chain = RetrievalChain::new(
        Arc::new(HashingEmbedder::new()),
        store,
        Arc::new(FailingChatModel),
    );

    let result = chain.answer("question").await;

    match result {
        Err(RagError::Generation(message)) => assert!(message.contains("503")),
        other => panic!("expected generation error, got {:?}", other.map(|a| a.answer)),
    }
}

#[tokio::test]
async fn from_config_requires_ingested_store() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = Config::default();
    config.llm.api_key = Some("gsk-test".to_string());
    config.paths.store_dir = temp_dir.path().join("vector_db");

    let result = RetrievalChain::from_config(&config).await;

    match result {
        Err(RagError::Config(message)) => assert!(message.contains("quick-rag ingest")),
        Err(other) => panic!("expected config error, got {:?}", other),
        Ok(_) => panic!("expected config error, got a chain"),
    }
}

#[test]
fn custom_prompt_template() {
    let template = PromptTemplate::new("Q={question}\nC={context}\nQ again={question}");

    let rendered = template.render(&["one", "two"], "why?");

    assert_eq!(rendered, "Q=why?\nC=one\n\ntwo\nQ again=why?");
}

#[test]
fn placeholders_inside_inputs_are_not_expanded() {
    let template = PromptTemplate::default();

    let rendered = template.render(&["doc mentions {question}"], "what is {context}?");

    assert!(rendered.contains("doc mentions {question}"));
    assert!(rendered.contains("Question: what is {context}?"));
}

#[test]
fn preview_truncates_to_limit() {
    let long = "x".repeat(500);
    let preview = content_preview(&long);
    assert_eq!(preview.chars().count(), PREVIEW_CHARS + 3);
    assert!(preview.ends_with("..."));

    assert_eq!(content_preview("short"), "short...");

    let accented = "é".repeat(300);
    assert_eq!(content_preview(&accented).chars().count(), PREVIEW_CHARS + 3);
}

#[test]
fn source_file_name_strips_directories() {
    assert_eq!(source_file_name("dataset/manuals/pump.json"), "pump.json");
    assert_eq!(source_file_name("pump.json"), "pump.json");
    assert_eq!(source_file_name(""), "");
}
