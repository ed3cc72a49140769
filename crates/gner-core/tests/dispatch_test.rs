//! Integration tests for chunked parallel dispatch.
//!
//! The dispatcher must return exactly what the sequential runner returns,
//! whatever the worker count and whatever order workers finish in.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gner_core::ner::{run_ner_on_texts, EntityExtractor, ParallelDispatcher};
use gner_core::traits::{GenerationOptions, Llm, LlmConnector, LlmResponse, TokenUsage};
use gner_core::{GnerError, GnerResult, Message};

/// Echoes the question as its only entity. Questions starting with `q0`
/// are answered slowly so early chunks finish last; `panic` crashes the
/// calling task.
struct EchoLlm;

#[async_trait]
impl Llm for EchoLlm {
    async fn generate(
        &self,
        messages: &[Message],
        _: Option<GenerationOptions>,
    ) -> GnerResult<LlmResponse> {
        let question = messages
            .last()
            .unwrap()
            .content
            .trim_start_matches("Question: ")
            .trim_end()
            .to_string();

        if question.starts_with("q0") {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        if question == "panic" {
            panic!("client crashed mid-request");
        }
        if question == "explode" {
            return Err(GnerError::llm("backend unavailable"));
        }
        if question.ends_with('7') {
            return Ok(LlmResponse::text("no entities").with_usage(TokenUsage::total(1)));
        }

        let body = serde_json::json!({ "named_entities": [question.clone()] });
        Ok(LlmResponse::text(body.to_string())
            .with_usage(TokenUsage::total(question.len() as u32)))
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}

fn counting_connector(counter: Arc<AtomicUsize>) -> Arc<dyn LlmConnector> {
    Arc::new(move || -> GnerResult<Arc<dyn Llm>> {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(EchoLlm))
    })
}

fn questions(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("q{}", i)).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_dispatch_matches_sequential_runner() {
    let extractor = EntityExtractor::new(Arc::new(EchoLlm));

    for len in [0usize, 1, 2, 5, 8, 13] {
        let texts = questions(len);
        let sequential = run_ner_on_texts(&extractor, &texts).await.unwrap();

        for workers in 1..=6 {
            let dispatcher =
                ParallelDispatcher::new(counting_connector(Arc::new(AtomicUsize::new(0))), workers)
                    .unwrap();
            let parallel = dispatcher.run(&texts).await.unwrap();
            assert_eq!(
                parallel, sequential,
                "len={} workers={} diverged from sequential output",
                len, workers
            );
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_order_is_input_order_not_completion_order() {
    // Chunk 0 holds the slow q0* items and finishes last.
    let texts: Vec<String> = vec!["q00", "q01", "a", "b", "c", "d"]
        .into_iter()
        .map(String::from)
        .collect();
    let dispatcher =
        ParallelDispatcher::new(counting_connector(Arc::new(AtomicUsize::new(0))), 3).unwrap();

    let batch = dispatcher.run(&texts).await.unwrap();
    let entities: Vec<String> = batch
        .results
        .iter()
        .map(|r| r.entities()[0].clone())
        .collect();
    assert_eq!(entities, texts);
    assert_eq!(batch.total_tokens, 3 + 3 + 1 + 1 + 1 + 1);
}

#[tokio::test]
async fn test_each_worker_builds_its_own_client() {
    let counter = Arc::new(AtomicUsize::new(0));
    let dispatcher = ParallelDispatcher::new(counting_connector(counter.clone()), 4).unwrap();

    dispatcher.run(&questions(9)).await.unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 4);

    let counter = Arc::new(AtomicUsize::new(0));
    let dispatcher = ParallelDispatcher::new(counting_connector(counter.clone()), 1).unwrap();
    dispatcher.run(&questions(9)).await.unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_parse_failures_do_not_abort() {
    let dispatcher =
        ParallelDispatcher::new(counting_connector(Arc::new(AtomicUsize::new(0))), 2).unwrap();
    let batch = dispatcher.run(&questions(10)).await.unwrap();

    assert_eq!(batch.len(), 10);
    assert_eq!(batch.failure_count(), 1);
    assert!(batch.results[7].entities().is_empty());
}

#[tokio::test]
async fn test_worker_error_aborts_dispatch() {
    let mut texts = questions(6);
    texts[4] = "explode".to_string();
    let dispatcher =
        ParallelDispatcher::new(counting_connector(Arc::new(AtomicUsize::new(0))), 3).unwrap();

    let err = dispatcher.run(&texts).await.unwrap_err();
    assert!(err.to_string().contains("backend unavailable"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_worker_panic_reports_its_chunk() {
    // Chunks of two: index 4 lands in chunk 2.
    let mut texts = questions(6);
    texts[4] = "panic".to_string();
    let dispatcher =
        ParallelDispatcher::new(counting_connector(Arc::new(AtomicUsize::new(0))), 3).unwrap();

    let err = dispatcher.run(&texts).await.unwrap_err();
    assert!(
        matches!(err, GnerError::Worker { chunk: 2, .. }),
        "unexpected error: {:?}",
        err
    );
    assert!(err.to_string().starts_with("Worker 2 failed"));
}

#[tokio::test]
async fn test_connector_failure_aborts_dispatch() {
    let connector: Arc<dyn LlmConnector> = Arc::new(|| -> GnerResult<Arc<dyn Llm>> {
        Err(GnerError::Configuration("missing API key".into()))
    });
    let dispatcher = ParallelDispatcher::new(connector, 2).unwrap();

    let err = dispatcher.run(&questions(4)).await.unwrap_err();
    assert!(matches!(err, GnerError::Configuration(_)));
}
