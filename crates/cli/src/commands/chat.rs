//! `blitzcoder chat`: interactive or single-message mode.

use std::io::Write;

use blitzcoder_agent::{AgentGraph, AgentStreamEvent, DriverInput, format_search_results};
use blitzcoder_core::memory::Namespace;
use blitzcoder_core::message::{Session, ThreadId};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::runtime;

const RECALL_DISPLAY_LIMIT: usize = 5;

pub async fn run(
    message: Option<String>,
    user_id: String,
    thread_id: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = runtime::load_config()?;
    runtime::require_api_key(&config)?;
    let agent = runtime::agent(&config, &user_id)?;
    let mut session = open_session(&agent, thread_id).await;

    if let Some(msg) = message {
        let (tx, printer) = spawn_printer();
        let result = agent.run_turn(&mut session, &user_id, &msg, Some(&tx)).await;
        drop(tx);
        let _ = printer.await;
        result?;
        return Ok(());
    }

    println!();
    println!("  BlitzCoder: interactive mode");
    println!();
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", config.default_model);
    println!("  Tools:     {} enabled", agent.tools().len());
    println!("  User:      {user_id}");
    println!("  Thread:    {}", session.thread_id);
    println!();
    println!("  Type 'search:<query>' to look through memory directly.");
    println!("  Type 'exit' or 'bye' to quit. Ctrl+C abandons the running turn.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match DriverInput::parse(&line) {
            DriverInput::Empty => continue,
            DriverInput::Exit => {
                info!("Exiting interactive session");
                break;
            }
            DriverInput::Search(query) => {
                let namespace = Namespace::memories(&user_id);
                match agent.memory().search(&namespace, &query, RECALL_DISPLAY_LIMIT).await {
                    Ok(results) => println!("\n{}", format_search_results(&query, &results)),
                    Err(e) => eprintln!("  [Error] memory search failed: {e}"),
                }
            }
            DriverInput::Turn(text) => {
                info!(query = %text, "User query");
                let (tx, printer) = spawn_printer();
                print!("  BlitzCoder > ");
                std::io::stdout().flush()?;

                tokio::select! {
                    result = agent.run_turn(&mut session, &user_id, &text, Some(&tx)) => {
                        if let Err(e) = result {
                            eprintln!("\n  [Error] {e}");
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        eprintln!("\n  [Interrupted] turn abandoned, conversation unchanged");
                    }
                }
                drop(tx);
                let _ = printer.await;
                println!();
            }
        }
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}

/// Resume `thread_id` from the checkpointer when possible, else start fresh.
async fn open_session(agent: &AgentGraph, thread_id: Option<String>) -> Session {
    let Some(id) = thread_id else {
        return Session::new();
    };
    let thread_id = ThreadId::from(id.as_str());
    if let Some(checkpointer) = agent.checkpointer() {
        match checkpointer.load(&thread_id).await {
            Ok(Some(session)) => {
                info!(thread_id = %thread_id, messages = session.len(), "Resumed session");
                return session;
            }
            Ok(None) => {}
            Err(e) => warn!(thread_id = %thread_id, error = %e, "Failed to load checkpoint"),
        }
    }
    Session::with_thread(thread_id)
}

/// Print events as they arrive until the sender is dropped.
fn spawn_printer() -> (mpsc::Sender<AgentStreamEvent>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<AgentStreamEvent>(64);
    let handle = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                AgentStreamEvent::Chunk { content } => {
                    print!("{content}");
                    let _ = std::io::stdout().flush();
                }
                AgentStreamEvent::ToolCall { name, .. } => {
                    eprintln!("\n  [tool] {name}");
                }
                AgentStreamEvent::ToolResult { name, success: false, output, .. } => {
                    eprintln!("  [tool] {name} failed: {}", first_line(&output));
                }
                AgentStreamEvent::MemoryRecalled { count } => {
                    eprintln!("  [memory] recalled {count} related memories");
                }
                AgentStreamEvent::Done { .. } => println!(),
                AgentStreamEvent::Error { .. }
                | AgentStreamEvent::ToolResult { .. }
                | AgentStreamEvent::MemoryStored { .. } => {}
            }
        }
    });
    (tx, handle)
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}
