//! The orchestration graph: one user turn, driven node by node.
//!
//! ```text
//! RetrieveContext → ModelCall ─┬─ tool calls ──→ Tools ─→ ModelCall
//!                              └─ plain answer → Finalize → End
//! ```
//!
//! Every turn enters at `RetrieveContext` exactly once. The `ModelCall` ↔
//! `Tools` cycle is bounded by the recursion limit, counted in model calls.
//!
//! A turn's messages are staged and only reach the session when the graph
//! stops. A turn whose future is dropped leaves the session as it was.

use std::sync::Arc;

use blitzcoder_core::checkpoint::Checkpointer;
use blitzcoder_core::error::{AgentError, ProviderError, ToolError};
use blitzcoder_core::memory::{DEFAULT_INDEX_FIELDS, MemoryStore, Namespace};
use blitzcoder_core::message::{Message, MessageToolCall, Role, Session};
use blitzcoder_core::provider::{Provider, ProviderRequest, Usage};
use blitzcoder_core::tool::{ToolCall, ToolRegistry, ToolResult};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::context::{augment_query, turn_memory};
use crate::stream_event::AgentStreamEvent;

pub const DEFAULT_RECURSION_LIMIT: usize = 25;
pub const DEFAULT_RECALL_LIMIT: usize = 5;
pub const DEFAULT_PREVIEW_CHARS: usize = 200;

/// Used when the configuration does not supply its own prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = concat!(
    "You are BlitzCoder, a coding assistant working inside the user's project. ",
    "You have tools to read, write and search files, run shell commands and Python scripts, ",
    "scaffold new projects, and look up earlier conversations. ",
    "Use them when they help, explain what you changed, and keep answers short.",
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphNode {
    RetrieveContext,
    ModelCall,
    Tools,
    Finalize,
    End,
}

impl GraphNode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RetrieveContext => "retrieve_context",
            Self::ModelCall => "model_call",
            Self::Tools => "tools",
            Self::Finalize => "finalize",
            Self::End => "end",
        }
    }
}

impl std::fmt::Display for GraphNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a completed turn produced.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Content of the final assistant message
    pub answer: String,

    /// Nodes in the order they ran, ending with `End`
    pub visited: Vec<GraphNode>,

    pub model_calls: usize,

    pub tool_calls: usize,

    /// Id of the stored turn summary, if the write succeeded
    pub memory_id: Option<String>,

    /// Messages this turn appended to the session, user message first
    pub new_messages: Vec<Message>,

    pub usage: Usage,
}

/// Per-turn scratch state.
#[derive(Default)]
struct TurnState {
    /// This turn's messages, user message first, not yet in the session
    messages: Vec<Message>,
    /// Memory-augmented rewrite of the user message, consumed by the first model call
    augmented: Option<String>,
    visited: Vec<GraphNode>,
    model_calls: usize,
    tool_calls: usize,
    memory_id: Option<String>,
    usage: Usage,
    saw_usage: bool,
}

type Events<'a> = Option<&'a mpsc::Sender<AgentStreamEvent>>;

async fn emit(events: Events<'_>, event: AgentStreamEvent) {
    if let Some(tx) = events
        && tx.send(event).await.is_err()
    {
        debug!("Event receiver dropped");
    }
}

/// The agent: a provider, a tool set, and a memory store wired into the graph.
pub struct AgentGraph {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    tools: Arc<ToolRegistry>,
    memory: Arc<dyn MemoryStore>,
    checkpointer: Option<Arc<dyn Checkpointer>>,
    system_prompt: Option<String>,
    recursion_limit: usize,
    recall_limit: usize,
    preview_chars: usize,
}

impl AgentGraph {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
        memory: Arc<dyn MemoryStore>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.2,
            max_tokens: None,
            tools,
            memory,
            checkpointer: None,
            system_prompt: None,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            recall_limit: DEFAULT_RECALL_LIMIT,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Sent ahead of the transcript on every model call; never stored in it.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Maximum model calls per turn. Values below 1 are raised to 1.
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit.max(1);
        self
    }

    pub fn with_recall_limit(mut self, limit: usize) -> Self {
        self.recall_limit = limit;
        self
    }

    pub fn with_preview_chars(mut self, chars: usize) -> Self {
        self.preview_chars = chars;
        self
    }

    pub fn with_checkpointer(mut self, checkpointer: Arc<dyn Checkpointer>) -> Self {
        self.checkpointer = Some(checkpointer);
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn memory(&self) -> &Arc<dyn MemoryStore> {
        &self.memory
    }

    pub fn checkpointer(&self) -> Option<&Arc<dyn Checkpointer>> {
        self.checkpointer.as_ref()
    }

    /// Run one turn for `input` on `session`.
    ///
    /// The turn's messages are appended when the graph stops, whether it
    /// reached `End` or failed. Every assistant tool call committed this way
    /// has its results. If the future is dropped first, nothing is appended.
    pub async fn run_turn(
        &self,
        session: &mut Session,
        user_id: &str,
        input: &str,
        events: Events<'_>,
    ) -> Result<TurnOutcome, AgentError> {
        let namespace = Namespace::memories(user_id);
        let mut state = TurnState::default();

        info!(thread_id = %session.thread_id, user_id, "Turn started");

        let mut node = GraphNode::RetrieveContext;
        let result = loop {
            state.visited.push(node);
            debug!(node = %node, "Entering node");
            node = match node {
                GraphNode::RetrieveContext => {
                    self.retrieve_context(&namespace, input, &mut state, events).await;
                    GraphNode::ModelCall
                }
                GraphNode::ModelCall => match self.model_call(session, &mut state, events).await {
                    Ok(next) => next,
                    Err(e) => break Err(e),
                },
                GraphNode::Tools => {
                    self.run_tools(&mut state, events).await;
                    GraphNode::ModelCall
                }
                GraphNode::Finalize => {
                    self.finalize(&namespace, &mut state, events).await;
                    GraphNode::End
                }
                GraphNode::End => break Ok(()),
            };
        };

        let new_messages = state.messages.clone();
        for message in std::mem::take(&mut state.messages) {
            session.push(message);
        }
        self.checkpoint(session).await;

        match result {
            Ok(()) => {
                let answer = last_with_role(&new_messages, Role::Assistant)
                    .map(|m| m.content.clone())
                    .unwrap_or_default();
                let usage = state.saw_usage.then_some(state.usage);
                emit(
                    events,
                    AgentStreamEvent::Done {
                        thread_id: session.thread_id.to_string(),
                        usage,
                        model_calls: state.model_calls,
                        tool_calls: state.tool_calls,
                    },
                )
                .await;
                info!(
                    thread_id = %session.thread_id,
                    model_calls = state.model_calls,
                    tool_calls = state.tool_calls,
                    "Turn finished"
                );
                Ok(TurnOutcome {
                    answer,
                    visited: state.visited,
                    model_calls: state.model_calls,
                    tool_calls: state.tool_calls,
                    memory_id: state.memory_id,
                    new_messages,
                    usage: state.usage,
                })
            }
            Err(e) => {
                warn!(thread_id = %session.thread_id, error = %e, "Turn failed");
                emit(events, AgentStreamEvent::Error { message: e.to_string() }).await;
                Err(e)
            }
        }
    }

    async fn retrieve_context(
        &self,
        namespace: &Namespace,
        input: &str,
        state: &mut TurnState,
        events: Events<'_>,
    ) {
        state.messages.push(Message::user(input));

        if self.recall_limit == 0 {
            return;
        }
        let memories = match self.memory.search(namespace, input, self.recall_limit).await {
            Ok(found) => found,
            Err(e) => {
                warn!(namespace = %namespace, error = %e, "Memory search failed, continuing without memories");
                Vec::new()
            }
        };
        if let Some(augmented) = augment_query(&memories, input) {
            info!(count = memories.len(), "Enhanced query with relevant memories");
            emit(events, AgentStreamEvent::MemoryRecalled { count: memories.len() }).await;
            state.augmented = Some(augmented);
        }
    }

    fn build_request(&self, session: &Session, staged: &[Message], augmented: Option<String>) -> ProviderRequest {
        let mut messages = Vec::with_capacity(session.len() + staged.len() + 1);
        if let Some(prompt) = &self.system_prompt {
            messages.push(Message::system(prompt.clone()));
        }
        messages.extend(session.messages.iter().cloned());
        messages.extend(staged.iter().cloned());

        if let Some(text) = augmented
            && let Some(last) = messages.last_mut()
            && last.role == Role::User
        {
            last.content = text;
        }

        ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: self.tools.definitions(),
        }
    }

    async fn model_call(
        &self,
        session: &Session,
        state: &mut TurnState,
        events: Events<'_>,
    ) -> Result<GraphNode, AgentError> {
        if state.model_calls >= self.recursion_limit {
            return Err(AgentError::RecursionLimitExceeded {
                limit: self.recursion_limit,
            });
        }
        state.model_calls += 1;

        let request = self.build_request(session, &state.messages, state.augmented.take());
        debug!(
            iteration = state.model_calls,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Calling provider"
        );
        let mut rx = self.provider.stream(request).await?;

        let mut content = String::new();
        let mut tool_calls = Vec::new();
        let mut finished = false;
        while let Some(chunk) = rx.recv().await {
            let chunk = chunk?;
            if let Some(delta) = chunk.content
                && !delta.is_empty()
            {
                content.push_str(&delta);
                emit(events, AgentStreamEvent::Chunk { content: delta }).await;
            }
            tool_calls.extend(chunk.tool_calls);
            if let Some(usage) = &chunk.usage {
                state.usage.add(usage);
                state.saw_usage = true;
            }
            if chunk.done {
                finished = true;
                break;
            }
        }
        if !finished {
            return Err(ProviderError::StreamInterrupted("stream closed before the final chunk".into()).into());
        }

        let message = Message::assistant_tool_calls(content, tool_calls);
        let next = if message.has_tool_calls() {
            GraphNode::Tools
        } else {
            GraphNode::Finalize
        };
        state.messages.push(message);
        Ok(next)
    }

    async fn run_tools(&self, state: &mut TurnState, events: Events<'_>) {
        let calls: Vec<MessageToolCall> = last_with_role(&state.messages, Role::Assistant)
            .map(|m| m.tool_calls.clone())
            .unwrap_or_default();

        for call in &calls {
            state.tool_calls += 1;
            let result = self.invoke(call, events).await;
            if !result.success {
                debug!(tool = %call.name, output = %result.output, "Tool reported failure");
            }
            emit(
                events,
                AgentStreamEvent::ToolResult {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    output: result.output.clone(),
                    success: result.success,
                },
            )
            .await;
            state.messages.push(Message::tool_result(&call.id, result.output));
        }
    }

    /// Run one call; any failure becomes an unsuccessful result.
    async fn invoke(&self, call: &MessageToolCall, events: Events<'_>) -> ToolResult {
        let arguments = match parse_arguments(&call.arguments) {
            Ok(args) => args,
            Err(e) => {
                emit(
                    events,
                    AgentStreamEvent::ToolCall {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        input: serde_json::Value::String(call.arguments.clone()),
                    },
                )
                .await;
                return ToolResult::from_error(&e);
            }
        };

        emit(
            events,
            AgentStreamEvent::ToolCall {
                id: call.id.clone(),
                name: call.name.clone(),
                input: arguments.clone(),
            },
        )
        .await;

        let tool_call = ToolCall {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments,
        };
        match self.tools.invoke(&tool_call).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool call rejected");
                let mut result = ToolResult::from_error(&e);
                result.call_id = call.id.clone();
                result
            }
        }
    }

    async fn finalize(&self, namespace: &Namespace, state: &mut TurnState, events: Events<'_>) {
        let Some(answer) = last_with_role(&state.messages, Role::Assistant) else {
            return;
        };
        let Some(question) = state.messages.first() else {
            return;
        };

        let record = turn_memory(&question.content, &answer.content, self.preview_chars);
        match self.memory.put(namespace, record, &DEFAULT_INDEX_FIELDS).await {
            Ok(id) => {
                info!(namespace = %namespace, memory_id = %id, "Stored turn memory");
                emit(events, AgentStreamEvent::MemoryStored { id: id.clone() }).await;
                state.memory_id = Some(id);
            }
            Err(e) => warn!(namespace = %namespace, error = %e, "Failed to store turn memory"),
        }
    }

    async fn checkpoint(&self, session: &Session) {
        let Some(checkpointer) = &self.checkpointer else {
            return;
        };
        if let Err(e) = checkpointer.save(session).await {
            warn!(thread_id = %session.thread_id, error = %e, "Failed to save checkpoint");
        }
    }
}

fn last_with_role(messages: &[Message], role: Role) -> Option<&Message> {
    messages.iter().rev().find(|m| m.role == role)
}

/// Decode the model's argument string. An empty string means no arguments.
fn parse_arguments(raw: &str) -> Result<serde_json::Value, ToolError> {
    if raw.trim().is_empty() {
        return Ok(serde_json::json!({}));
    }
    serde_json::from_str(raw)
        .map_err(|e| ToolError::InvalidArguments(format!("malformed JSON arguments: {e}")))
}
