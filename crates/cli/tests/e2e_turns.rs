//! End-to-end turns: the agent graph with the real built-in tools and memory
//! store, driven by a scripted completion service.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use blitzcoder_agent::{AgentGraph, AgentStreamEvent, DriverInput, GraphNode, format_search_results};
use blitzcoder_config::ToolsConfig;
use blitzcoder_core::error::{AgentError, ProviderError};
use blitzcoder_core::memory::{DEFAULT_INDEX_FIELDS, MemoryRecord, MemoryStore, Namespace};
use blitzcoder_core::message::{Message, MessageToolCall, Role, Session};
use blitzcoder_core::provider::{Provider, ProviderRequest, ProviderResponse};
use blitzcoder_memory::{FileCheckpointer, FileStore, HashEmbedder, InMemoryStore};
use blitzcoder_tools::{LlmClient, ToolContext, Workspace, build_registry};
use tokio::sync::mpsc;

// ── Scripted completion service ──────────────────────────────────────────

enum Reply {
    Text(String),
    Tools(Vec<MessageToolCall>),
}

/// Replays queued replies in order. With `repeat_last`, the final reply is
/// served forever instead of running out.
struct ScriptedService {
    replies: Mutex<VecDeque<Reply>>,
    repeat_last: Option<Vec<MessageToolCall>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedService {
    fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            repeat_last: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn always_calling(call: MessageToolCall) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            repeat_last: Some(vec![call]),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedService {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let next = self.replies.lock().unwrap().pop_front();
        let message = match (next, &self.repeat_last) {
            (Some(Reply::Text(text)), _) => Message::assistant(text),
            (Some(Reply::Tools(calls)), _) => Message::assistant_tool_calls("", calls),
            (None, Some(calls)) => Message::assistant_tool_calls("", calls.clone()),
            (None, None) => {
                return Err(ProviderError::AuthenticationFailed("script exhausted".into()));
            }
        };
        Ok(ProviderResponse {
            message,
            usage: None,
            model: "scripted".into(),
        })
    }
}

fn call(id: &str, name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: id.into(),
        name: name.into(),
        arguments: args.to_string(),
    }
}

// ── Wiring ───────────────────────────────────────────────────────────────

fn hash_store() -> Arc<dyn MemoryStore> {
    Arc::new(InMemoryStore::new(Arc::new(HashEmbedder::new(128))))
}

fn agent(
    service: Arc<ScriptedService>,
    memory: Arc<dyn MemoryStore>,
    workspace: &std::path::Path,
    user_id: &str,
) -> AgentGraph {
    let config = ToolsConfig {
        shell: false,
        python_exec: false,
        dev_server: false,
        ..ToolsConfig::default()
    };
    agent_with_tools(service, memory, workspace, user_id, &config)
}

fn agent_with_tools(
    service: Arc<ScriptedService>,
    memory: Arc<dyn MemoryStore>,
    workspace: &std::path::Path,
    user_id: &str,
    config: &ToolsConfig,
) -> AgentGraph {
    let ctx = ToolContext {
        workspace: Workspace::new(workspace),
        llm: LlmClient::new(service.clone(), "scripted", 0.0),
        memory: memory.clone(),
        namespace: Namespace::memories(user_id),
    };
    let tools = Arc::new(build_registry(config, &ctx).unwrap());
    AgentGraph::new(service, "scripted", tools, memory)
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[tokio::test]
async fn arithmetic_answer_without_tools() {
    let dir = tempfile::tempdir().unwrap();
    let memory = hash_store();
    let service = ScriptedService::new(vec![Reply::Text("4".into())]);
    let graph = agent(service, memory.clone(), dir.path(), "alice");
    let mut session = Session::new();

    let outcome = graph
        .run_turn(&mut session, "alice", "What is 2+2?", None)
        .await
        .unwrap();

    assert_eq!(outcome.answer, "4");
    assert_eq!(session.len(), 2);
    assert_eq!(session.messages[0].role, Role::User);
    assert_eq!(session.messages[1].role, Role::Assistant);
    assert_eq!(
        outcome.visited,
        [GraphNode::RetrieveContext, GraphNode::ModelCall, GraphNode::Finalize, GraphNode::End]
    );

    let ns = Namespace::memories("alice");
    assert_eq!(memory.count(&ns).await.unwrap(), 1);
    let hits = memory.search(&ns, "2+2", 5).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].record.user_query.contains("2+2"));
    assert_eq!(hits[0].record.context, "conversation");
}

#[tokio::test]
async fn listing_files_through_a_tool() {
    let dir = tempfile::tempdir().unwrap();
    let proj = dir.path().join("proj");
    std::fs::create_dir(&proj).unwrap();
    std::fs::write(proj.join("a.txt"), "a").unwrap();
    std::fs::write(proj.join("b.txt"), "b").unwrap();

    let service = ScriptedService::new(vec![
        Reply::Tools(vec![call(
            "call_1",
            "navigate_codebase",
            serde_json::json!({ "path": proj.to_string_lossy() }),
        )]),
        Reply::Text("The folder contains a.txt and b.txt.".into()),
    ]);
    let graph = agent(service, hash_store(), dir.path(), "alice");
    let mut session = Session::new();

    let outcome = graph
        .run_turn(&mut session, "alice", "list files in proj", None)
        .await
        .unwrap();

    let roles: Vec<Role> = session.messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, [Role::User, Role::Assistant, Role::Tool, Role::Assistant]);
    assert!(session.messages[1].has_tool_calls());
    assert_eq!(session.messages[2].tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(session.messages[2].content, "a.txt\nb.txt");
    assert!(outcome.answer.contains("a.txt") && outcome.answer.contains("b.txt"));
    assert_eq!(outcome.tool_calls, 1);
}

#[tokio::test]
async fn one_tool_result_per_call_across_iterations() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.md"), "# notes").unwrap();

    let service = ScriptedService::new(vec![
        Reply::Tools(vec![
            call("c1", "current_directory", serde_json::json!({})),
            call("c2", "inspect_file", serde_json::json!({ "path": "notes.md" })),
        ]),
        Reply::Tools(vec![call("c3", "inspect_file", serde_json::json!({ "path": "missing.md" }))]),
        Reply::Tools(vec![call("c4", "no_such_tool", serde_json::json!({}))]),
        Reply::Text("done".into()),
    ]);
    let graph = agent(service.clone(), hash_store(), dir.path(), "alice");
    let mut session = Session::new();

    let outcome = graph.run_turn(&mut session, "alice", "look around", None).await.unwrap();

    assert_eq!(outcome.model_calls, 4);
    assert_eq!(outcome.visited.iter().filter(|n| **n == GraphNode::Tools).count(), 3);

    let results: Vec<&Message> = session.messages.iter().filter(|m| m.role == Role::Tool).collect();
    let ids: Vec<_> = results.iter().filter_map(|m| m.tool_call_id.as_deref()).collect();
    assert_eq!(ids, ["c1", "c2", "c3", "c4"]);
    assert_eq!(results[1].content, "# notes");
    assert!(results[2].content.starts_with("Error:"));
    assert!(results[3].content.contains("Tool not found"));
    assert_eq!(service.calls(), 4);
}

#[tokio::test]
async fn recursion_limit_ends_a_runaway_turn() {
    let dir = tempfile::tempdir().unwrap();
    let service = ScriptedService::always_calling(call("loop", "current_directory", serde_json::json!({})));
    let memory = hash_store();
    let graph = agent(service.clone(), memory.clone(), dir.path(), "alice").with_recursion_limit(2);
    let mut session = Session::new();
    let (tx, mut rx) = mpsc::channel(64);

    let err = graph
        .run_turn(&mut session, "alice", "never stop", Some(&tx))
        .await
        .unwrap_err();
    drop(tx);

    assert!(matches!(err, AgentError::RecursionLimitExceeded { limit: 2 }));
    assert_eq!(service.calls(), 2);
    assert_eq!(memory.count(&Namespace::memories("alice")).await.unwrap(), 0);

    let mut last = None;
    while let Some(event) = rx.recv().await {
        last = Some(event);
    }
    assert!(matches!(last, Some(AgentStreamEvent::Error { .. })));
}

#[tokio::test]
async fn search_on_empty_namespace_is_empty() {
    let memory = hash_store();
    let hits = memory.search(&Namespace::memories("nobody"), "anything", 5).await.unwrap();
    assert!(hits.is_empty());
    assert_eq!(
        format_search_results("anything", &hits),
        "Found 0 relevant memories for query: 'anything'\n"
    );
}

#[tokio::test]
async fn namespaces_do_not_leak_between_users() {
    let dir = tempfile::tempdir().unwrap();
    let memory = hash_store();

    let service = ScriptedService::new(vec![Reply::Text("Your locker code is 1234.".into())]);
    let graph = agent(service, memory.clone(), dir.path(), "alice");
    let mut session = Session::new();
    graph
        .run_turn(&mut session, "alice", "remember my locker code", None)
        .await
        .unwrap();

    let bob = memory
        .search(&Namespace::memories("bob"), "remember my locker code", 5)
        .await
        .unwrap();
    assert!(bob.is_empty());

    // Bob's turn is not augmented with Alice's memory.
    let service = ScriptedService::new(vec![Reply::Text("I don't know.".into())]);
    let graph = agent(service.clone(), memory.clone(), dir.path(), "bob");
    let mut session = Session::new();
    graph
        .run_turn(&mut session, "bob", "remember my locker code", None)
        .await
        .unwrap();
    let requests = service.requests.lock().unwrap();
    let user = requests[0].messages.iter().find(|m| m.role == Role::User).unwrap();
    assert_eq!(user.content, "remember my locker code");
}

#[tokio::test]
async fn recalled_memory_shapes_the_first_call_only() {
    let dir = tempfile::tempdir().unwrap();
    let memory = hash_store();
    let service = ScriptedService::new(vec![
        Reply::Text("You prefer tabs.".into()),
        Reply::Tools(vec![call("c1", "current_directory", serde_json::json!({}))]),
        Reply::Text("Still tabs.".into()),
    ]);
    let graph = agent(service.clone(), memory, dir.path(), "alice");
    let mut session = Session::new();

    graph.run_turn(&mut session, "alice", "tabs or spaces?", None).await.unwrap();
    let (tx, mut rx) = mpsc::channel(64);
    graph
        .run_turn(&mut session, "alice", "tabs or spaces again?", Some(&tx))
        .await
        .unwrap();
    drop(tx);

    let first = rx.recv().await.unwrap();
    assert_eq!(first, AgentStreamEvent::MemoryRecalled { count: 1 });

    let requests = service.requests.lock().unwrap();
    let last_user = |req: &ProviderRequest| {
        req.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap()
    };
    let augmented = last_user(&requests[1]);
    assert!(augmented.starts_with("Based on our previous conversations:\nPrevious context: User asked: tabs or spaces?"));
    assert!(augmented.contains("Current question: tabs or spaces again?"));
    assert_eq!(last_user(&requests[2]), "tabs or spaces again?");

    assert!(session.messages.iter().all(|m| !m.content.contains("Based on our previous")));
}

#[tokio::test]
async fn record_found_by_its_query_above_unrelated() {
    let memory = hash_store();
    let ns = Namespace::memories("alice");
    memory
        .put(
            &ns,
            MemoryRecord::new("weekend hiking trip", "travel", "where should I hike", "the alps"),
            &DEFAULT_INDEX_FIELDS,
        )
        .await
        .unwrap();
    memory
        .put(
            &ns,
            MemoryRecord::new("rust borrow checker", "coding", "explain lifetimes in rust", "..."),
            &DEFAULT_INDEX_FIELDS,
        )
        .await
        .unwrap();

    let hits = memory.search(&ns, "explain lifetimes in rust", 2).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].record.user_query, "explain lifetimes in rust");
    assert!(hits[0].score > hits[1].score);
}

#[tokio::test]
async fn fatal_service_error_keeps_session_alive() {
    let dir = tempfile::tempdir().unwrap();
    let service = ScriptedService::new(vec![]);
    let graph = agent(service, hash_store(), dir.path(), "alice");
    let mut session = Session::new();

    let err = graph.run_turn(&mut session, "alice", "hello", None).await.unwrap_err();
    assert!(matches!(err, AgentError::FatalService(_)));

    let service = ScriptedService::new(vec![Reply::Text("hi again".into())]);
    let graph = agent(service, hash_store(), dir.path(), "alice");
    let outcome = graph.run_turn(&mut session, "alice", "hello?", None).await.unwrap();
    assert_eq!(outcome.answer, "hi again");
}

#[tokio::test]
async fn memories_and_sessions_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("memory").join("memories.jsonl");
    let sessions = dir.path().join("sessions");
    let embedder = Arc::new(HashEmbedder::new(128));

    let thread_id = {
        let memory: Arc<dyn MemoryStore> = Arc::new(FileStore::open(store_path.clone(), embedder.clone(), None));
        let service = ScriptedService::new(vec![Reply::Text("Noted: Postgres.".into())]);
        let graph = agent(service, memory, dir.path(), "alice")
            .with_checkpointer(Arc::new(FileCheckpointer::new(sessions.clone())));
        let mut session = Session::new();
        graph
            .run_turn(&mut session, "alice", "we use Postgres", None)
            .await
            .unwrap();
        session.thread_id
    };

    let memory: Arc<dyn MemoryStore> = Arc::new(FileStore::open(store_path, embedder, None));
    let hits = memory
        .search(&Namespace::memories("alice"), "we use Postgres", 5)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);

    let checkpointer = FileCheckpointer::new(sessions);
    let restored = blitzcoder_core::checkpoint::Checkpointer::load(&checkpointer, &thread_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(restored.len(), 2);
    assert_eq!(restored.messages[1].content, "Noted: Postgres.");
}

#[cfg(unix)]
#[tokio::test]
async fn interrupted_shell_turn_leaves_a_clean_transcript() {
    let dir = tempfile::tempdir().unwrap();
    let service = ScriptedService::new(vec![
        Reply::Tools(vec![call("c1", "shell", serde_json::json!({"command": "sleep 30"}))]),
        Reply::Text("ready".into()),
    ]);
    let graph = agent_with_tools(service.clone(), hash_store(), dir.path(), "carol", &ToolsConfig::default());
    let mut session = Session::new();

    let started = std::time::Instant::now();
    let interrupted = tokio::time::timeout(
        std::time::Duration::from_millis(500),
        graph.run_turn(&mut session, "carol", "run sleep 30", None),
    )
    .await;
    assert!(interrupted.is_err());
    assert!(started.elapsed() < std::time::Duration::from_secs(5));
    assert!(session.is_empty());

    let outcome = graph.run_turn(&mut session, "carol", "hello again", None).await.unwrap();
    assert_eq!(outcome.answer, "ready");

    let requests = service.requests.lock().unwrap();
    let second = &requests[1];
    assert!(second.messages.iter().all(|m| m.tool_calls.is_empty()));
    assert!(second.messages.iter().all(|m| m.role != Role::Tool));
    assert_eq!(session.len(), 2);
}

#[test]
fn driver_routes_lines() {
    assert_eq!(DriverInput::parse("Exit"), DriverInput::Exit);
    assert_eq!(DriverInput::parse("search: postgres"), DriverInput::Search("postgres".into()));
    assert_eq!(DriverInput::parse("fix main.rs"), DriverInput::Turn("fix main.rs".into()));
}
