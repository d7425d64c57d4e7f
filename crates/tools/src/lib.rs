//! Built-in tools for BlitzCoder.
//!
//! Tools give the agent the ability to work on a codebase: read, write and
//! search files, run shell commands, python scripts and dev servers, scaffold whole
//! projects with the model's help, and search its own memory.
//!
//! Every filesystem tool resolves relative paths against a shared
//! [`Workspace`] rather than the process working directory.

pub mod builtin;
pub mod code_assist;
pub mod dev_server;
pub mod directory;
pub mod error_report;
pub mod file_read;
pub mod file_toggle;
pub mod file_write;
pub mod llm;
pub mod memory_search;
pub mod navigate;
pub mod process;
pub mod python;
pub mod scaffold;
pub mod shell;
pub mod workspace;

pub use builtin::{BuiltinTool, ToolContext, build_registry};
pub use llm::LlmClient;
pub use workspace::Workspace;
