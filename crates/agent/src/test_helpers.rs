//! Shared test helpers for graph tests.

use async_trait::async_trait;
use blitzcoder_core::error::{MemoryError, ProviderError, ToolError};
use blitzcoder_core::memory::{MemoryField, MemoryRecord, MemoryStore, Namespace, ScoredRecord};
use blitzcoder_core::message::{Message, MessageToolCall};
use blitzcoder_core::provider::{ChunkReceiver, Provider, ProviderRequest, ProviderResponse, StreamChunk, Usage};
use blitzcoder_core::tool::{Tool, ToolRegistry, ToolResult, parse_args};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

enum Script {
    Queue(Vec<ProviderResponse>),
    Forever(ProviderResponse),
    Fail(ProviderError),
}

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue and records
/// the request. Panics if more calls are made than responses provided.
pub struct SequentialMockProvider {
    script: Script,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self::with_script(Script::Queue(responses))
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A single text response (no tool calls).
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![make_text_response(text)])
    }

    /// Requests the same tool on every call, never answering.
    pub fn always_tool(name: &str, args: serde_json::Value) -> Self {
        Self::with_script(Script::Forever(make_tool_call_response(
            vec![make_tool_call("call_loop", name, args)],
            "",
        )))
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::with_script(Script::Fail(error))
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let count = requests.len();
        requests.push(request);

        match &self.script {
            Script::Queue(responses) => {
                if count >= responses.len() {
                    panic!(
                        "SequentialMockProvider: no more responses (call #{count}, have {})",
                        responses.len()
                    );
                }
                Ok(responses[count].clone())
            }
            Script::Forever(response) => Ok(response.clone()),
            Script::Fail(error) => Err(error.clone()),
        }
    }
}

/// One scripted stream: content pieces, then an optional error or the final chunk.
pub struct ScriptedStream {
    pub pieces: Vec<&'static str>,
    pub tool_calls: Vec<MessageToolCall>,
    pub error: Option<ProviderError>,
}

impl ScriptedStream {
    pub fn text(pieces: Vec<&'static str>) -> Self {
        Self {
            pieces,
            tool_calls: Vec::new(),
            error: None,
        }
    }
}

/// A mock provider that only streams, one scripted stream per call.
pub struct ChunkedProvider {
    streams: Mutex<VecDeque<ScriptedStream>>,
}

impl ChunkedProvider {
    pub fn new(streams: Vec<ScriptedStream>) -> Self {
        Self {
            streams: Mutex::new(streams.into()),
        }
    }
}

#[async_trait]
impl Provider for ChunkedProvider {
    fn name(&self) -> &str {
        "chunked_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        panic!("ChunkedProvider only streams");
    }

    async fn stream(&self, _request: ProviderRequest) -> Result<ChunkReceiver, ProviderError> {
        let script = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .expect("ChunkedProvider: no more streams");
        let (tx, rx) = tokio::sync::mpsc::channel(script.pieces.len() + 1);
        for piece in &script.pieces {
            tx.try_send(Ok(StreamChunk {
                content: Some(piece.to_string()),
                ..StreamChunk::default()
            }))
            .unwrap();
        }
        let last = match script.error {
            Some(error) => Err(error),
            None => Ok(StreamChunk {
                content: None,
                tool_calls: script.tool_calls,
                done: true,
                usage: Some(Usage {
                    prompt_tokens: 4,
                    completion_tokens: 2,
                    total_tokens: 6,
                }),
            }),
        };
        tx.try_send(last).unwrap();
        Ok(rx)
    }
}

/// Create a simple text response (no tool calls).
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Create a response with tool calls and optional thought content.
pub fn make_tool_call_response(tool_calls: Vec<MessageToolCall>, thought: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant_tool_calls(thought, tool_calls),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

pub fn make_tool_call(id: &str, name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments: serde_json::to_string(&args).unwrap(),
    }
}

#[derive(serde::Deserialize)]
struct EchoArgs {
    text: String,
}

/// Replies with `echo: {text}`.
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echoes back the input"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": { "text": { "type": "string" } },
            "required": ["text"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: EchoArgs = parse_args(arguments)?;
        Ok(ToolResult::ok(format!("echo: {}", args.text)))
    }
}

#[derive(serde::Deserialize)]
struct SleepArgs {
    secs: u64,
}

/// Sleeps for `secs` seconds, then replies `slept`.
pub struct SleepTool;

#[async_trait]
impl Tool for SleepTool {
    fn name(&self) -> &str {
        "sleep"
    }

    fn description(&self) -> &str {
        "Sleeps for a while"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": { "secs": { "type": "integer" } },
            "required": ["secs"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: SleepArgs = parse_args(arguments)?;
        tokio::time::sleep(Duration::from_secs(args.secs)).await;
        Ok(ToolResult::ok("slept"))
    }
}

pub fn registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(EchoTool)).unwrap();
    registry.register(Box::new(SleepTool)).unwrap();
    registry
}

/// A memory store whose every operation fails.
pub struct BrokenStore;

#[async_trait]
impl MemoryStore for BrokenStore {
    fn name(&self) -> &str {
        "broken"
    }

    async fn put(
        &self,
        _namespace: &Namespace,
        _record: MemoryRecord,
        _index: &[MemoryField],
    ) -> Result<String, MemoryError> {
        Err(MemoryError::Storage("disk full".into()))
    }

    async fn search(
        &self,
        _namespace: &Namespace,
        _query: &str,
        _limit: usize,
    ) -> Result<Vec<ScoredRecord>, MemoryError> {
        Err(MemoryError::QueryFailed("index unavailable".into()))
    }

    async fn count(&self, _namespace: &Namespace) -> Result<usize, MemoryError> {
        Ok(0)
    }
}
