//! End-to-end tests: document on disk to printed answer.
//!
//! Everything runs offline: the hash embedder stands in for a remote
//! embeddings endpoint and a scripted provider stands in for the model.

use std::io::Write;
use std::sync::Arc;

use ragline_agent::testing::{ScriptedProvider, make_text_response, make_tool_call, make_tool_call_response};
use ragline_agent::{Agent, AgentSettings, Session, run_repl};
use ragline_core::error::AgentError;
use ragline_core::message::Role;
use ragline_core::tool::{Tool, ToolRegistry, ToolSource};
use ragline_ingest::{SplitterConfig, ingest_path};
use ragline_memory::{ConversationMemory, EmbeddingIndex, HashEmbedder};
use ragline_tools::testing::{StaticSource, StubTool};
use ragline_tools::discover;

const PAGE_ONE: &str = "Chapter one is about fats. Butter and animal fats were traditional \
staples. Seed oils oxidise when heated.";
const PAGE_TWO: &str = "Chapter two is about vitamin D. The book says vitamin D is made in the \
skin from sunlight, and that cod liver oil is a traditional source of vitamin D.";

fn two_page_book() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    write!(file, "{PAGE_ONE}\x0C{PAGE_TWO}").unwrap();
    file
}

async fn indexed_book() -> (tempfile::NamedTempFile, Arc<EmbeddingIndex>) {
    let file = two_page_book();
    let segments = ingest_path(file.path(), &SplitterConfig::default()).unwrap();
    let index = EmbeddingIndex::new(Arc::new(HashEmbedder::new(384)));
    let report = index.add(segments).await.unwrap();
    assert_eq!(report.added, 2);
    (file, Arc::new(index))
}

fn session(provider: Arc<ScriptedProvider>, index: Arc<EmbeddingIndex>, tools: ToolRegistry) -> Session {
    let settings = AgentSettings {
        top_k: 1,
        max_tool_hops: 4,
        ..AgentSettings::default()
    };
    let agent = Agent::new(provider, index, Arc::new(tools), settings);
    Session::new(Arc::new(agent), ConversationMemory::new(20))
}

#[tokio::test]
async fn question_about_the_book_retrieves_the_right_page() {
    let (_file, index) = indexed_book().await;
    let provider = Arc::new(ScriptedProvider::single_text(
        "The book says vitamin D comes from sunlight on the skin.",
    ));
    let mut session = session(provider.clone(), index, ToolRegistry::new());

    let mut out = Vec::new();
    let rounds = run_repl(
        &mut session,
        "I am your assistant who is expert in nutrition.",
        "What does the book say about vitamin D?\n".as_bytes(),
        &mut out,
    )
    .await
    .unwrap();
    assert_eq!(rounds, 1);

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    let user = requests[0].messages.last().unwrap();
    assert_eq!(user.role, Role::User);
    assert!(user.content.starts_with("What does the book say about vitamin D?"));
    assert!(user.content.contains("is made in the skin from sunlight"));
    assert!(!user.content.contains("Seed oils"));

    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains("I am your assistant who is expert in nutrition."));
    assert!(printed.contains("\nASSISTANT: The book says vitamin D comes from sunlight on the skin.\n"));
}

#[tokio::test]
async fn tool_round_trip_through_discovery() {
    let (_file, index) = indexed_book().await;
    let lookup = Arc::new(StubTool::new("food_lookup", "Cod liver oil: 450 IU vitamin D per teaspoon"));
    let sources: Vec<Arc<dyn ToolSource>> = vec![Arc::new(StaticSource::new(
        "nutrition-db",
        vec![lookup.clone() as Arc<dyn Tool>],
    ))];
    let outcome = discover(&sources, std::time::Duration::from_secs(5)).await;
    assert!(outcome.failures.is_empty());

    let args = serde_json::json!({"food": "cod liver oil"});
    let provider = Arc::new(ScriptedProvider::new(vec![
        make_tool_call_response(vec![make_tool_call("call_1", "food_lookup", args.clone())]),
        make_text_response("A teaspoon of cod liver oil has about 450 IU."),
    ]));
    let mut session = session(provider.clone(), index, outcome.registry);

    let report = session.run_turn("How much vitamin D is in cod liver oil?").await.unwrap();

    assert_eq!(lookup.calls(), vec![args]);
    assert_eq!(report.hops, 1);
    assert!(report.answer.contains("450 IU"));
    assert_eq!(provider.requests()[0].tools.len(), 1);
    let second = &provider.requests()[1].messages;
    assert!(second.last().unwrap().content.contains("450 IU vitamin D"));
}

#[tokio::test]
async fn runaway_tool_calls_are_bounded() {
    let (_file, index) = indexed_book().await;
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(StubTool::new("again", "call me again")) as Arc<dyn Tool>);
    let provider = Arc::new(ScriptedProvider::always(make_tool_call_response(vec![
        make_tool_call("c", "again", serde_json::json!({})),
    ])));
    let mut session = session(provider.clone(), index, tools);

    let err = session.run_turn("vitamin D?").await.unwrap_err();
    assert!(matches!(err, AgentError::ToolLoopExceeded { hops: 4 }));
    assert_eq!(provider.call_count(), 5);
}

#[tokio::test]
async fn reindexing_the_same_document_adds_nothing() {
    let (file, index) = indexed_book().await;
    let again = ingest_path(file.path(), &SplitterConfig::default()).unwrap();
    let report = index.add(again).await.unwrap();
    assert_eq!(report.added, 0);
    assert_eq!(report.skipped, 2);
    assert_eq!(index.len().await, 2);
}
