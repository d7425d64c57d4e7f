//! The closed set of built-in tools and the registry factory.

use std::sync::Arc;

use blitzcoder_config::ToolsConfig;
use blitzcoder_core::error::ToolError;
use blitzcoder_core::memory::{MemoryStore, Namespace};
use blitzcoder_core::tool::{Tool, ToolRegistry};
use tracing::debug;

use crate::code_assist::{ExplainCodeTool, RefactorCodeTool};
use crate::dev_server::DevServerTool;
use crate::directory::{ChangeDirectoryTool, CurrentDirectoryTool};
use crate::error_report::ErrorDetectionTool;
use crate::file_read::InspectFileTool;
use crate::file_toggle::CreateOrDeleteFileTool;
use crate::file_write::WriteCodeTool;
use crate::llm::LlmClient;
use crate::memory_search::MemorySearchTool;
use crate::navigate::{FindPathTool, NavigateCodebaseTool};
use crate::python::PythonExecTool;
use crate::scaffold::Generator;
use crate::scaffold::create::CreateProjectStructureTool;
use crate::scaffold::generate::{
    GenerateFileContentTool, GenerateFolderScriptTool, GeneratePlanTool, GenerateStructureTool,
};
use crate::scaffold::project::ScaffoldProjectTool;
use crate::shell::ShellTool;
use crate::workspace::Workspace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinTool {
    InspectFile,
    WriteCodeToFile,
    CreateOrDeleteFile,
    NavigateCodebase,
    LookForFileOrDirectory,
    CurrentDirectory,
    ChangeDirectory,
    RunShellCommand,
    ExecutePythonCode,
    RunDevServer,
    ErrorDetection,
    GenerateProjectStructure,
    GenerateArchitecturePlan,
    GenerateFolderCreationScript,
    GenerateFileContent,
    CreateProjectStructure,
    ScaffoldProject,
    ExplainCode,
    RefactorCode,
    MemorySearch,
}

const NAMES: &[(BuiltinTool, &str)] = &[
    (BuiltinTool::InspectFile, "inspect_file"),
    (BuiltinTool::WriteCodeToFile, "write_code_to_file"),
    (BuiltinTool::CreateOrDeleteFile, "create_or_delete_file"),
    (BuiltinTool::NavigateCodebase, "navigate_codebase"),
    (BuiltinTool::LookForFileOrDirectory, "look_for_file_or_directory"),
    (BuiltinTool::CurrentDirectory, "current_directory"),
    (BuiltinTool::ChangeDirectory, "change_directory"),
    (BuiltinTool::RunShellCommand, "run_shell_command"),
    (BuiltinTool::ExecutePythonCode, "execute_python_code"),
    (BuiltinTool::RunDevServer, "run_dev_server"),
    (BuiltinTool::ErrorDetection, "error_detection"),
    (BuiltinTool::GenerateProjectStructure, "generate_project_structure"),
    (BuiltinTool::GenerateArchitecturePlan, "generate_architecture_plan"),
    (BuiltinTool::GenerateFolderCreationScript, "generate_folder_creation_script"),
    (BuiltinTool::GenerateFileContent, "generate_file_content"),
    (BuiltinTool::CreateProjectStructure, "create_project_structure"),
    (BuiltinTool::ScaffoldProject, "scaffold_project"),
    (BuiltinTool::ExplainCode, "explain_code"),
    (BuiltinTool::RefactorCode, "refactor_code"),
    (BuiltinTool::MemorySearch, "memory_search"),
];

impl BuiltinTool {
    pub fn all() -> impl Iterator<Item = BuiltinTool> {
        NAMES.iter().map(|(t, _)| *t)
    }

    pub fn name(self) -> &'static str {
        NAMES
            .iter()
            .find(|(t, _)| *t == self)
            .map(|(_, n)| *n)
            .unwrap_or("unknown")
    }

    pub fn from_name(name: &str) -> Option<Self> {
        NAMES.iter().find(|(_, n)| *n == name).map(|(t, _)| *t)
    }

    /// Tools that spawn subprocesses.
    pub fn is_process(self) -> bool {
        matches!(
            self,
            Self::RunShellCommand | Self::ExecutePythonCode | Self::RunDevServer
        )
    }

    /// Whether `config` switches this tool on.
    pub fn enabled(self, config: &ToolsConfig) -> bool {
        match self {
            Self::RunShellCommand => config.shell,
            Self::ExecutePythonCode => config.python_exec,
            Self::RunDevServer => config.dev_server,
            _ => true,
        }
    }
}

/// What the built-in tools are constructed from.
#[derive(Clone)]
pub struct ToolContext {
    pub workspace: Workspace,
    pub llm: LlmClient,
    pub memory: Arc<dyn MemoryStore>,
    pub namespace: Namespace,
}

impl ToolContext {
    pub fn build(&self, tool: BuiltinTool, config: &ToolsConfig) -> Box<dyn Tool> {
        let ws = self.workspace.clone();
        let generator = || Generator::new(self.llm.clone());
        match tool {
            BuiltinTool::InspectFile => Box::new(InspectFileTool::new(ws)),
            BuiltinTool::WriteCodeToFile => Box::new(WriteCodeTool::new(ws)),
            BuiltinTool::CreateOrDeleteFile => Box::new(CreateOrDeleteFileTool::new(ws)),
            BuiltinTool::NavigateCodebase => Box::new(NavigateCodebaseTool::new(ws)),
            BuiltinTool::LookForFileOrDirectory => Box::new(FindPathTool::new(ws)),
            BuiltinTool::CurrentDirectory => Box::new(CurrentDirectoryTool::new(ws)),
            BuiltinTool::ChangeDirectory => Box::new(ChangeDirectoryTool::new(ws)),
            BuiltinTool::RunShellCommand => Box::new(ShellTool::new(ws, config.shell_timeout_secs)),
            BuiltinTool::ExecutePythonCode => Box::new(PythonExecTool::new(
                ws,
                config.python_bin.clone(),
                config.python_timeout_secs,
            )),
            BuiltinTool::RunDevServer => Box::new(DevServerTool::new(
                ws,
                config.dev_server_wait_secs,
                config.dev_server_max_lines,
            )),
            BuiltinTool::ErrorDetection => Box::new(ErrorDetectionTool::new(ws)),
            BuiltinTool::GenerateProjectStructure => Box::new(GenerateStructureTool::new(generator())),
            BuiltinTool::GenerateArchitecturePlan => Box::new(GeneratePlanTool::new(generator())),
            BuiltinTool::GenerateFolderCreationScript => {
                Box::new(GenerateFolderScriptTool::new(generator()))
            }
            BuiltinTool::GenerateFileContent => Box::new(GenerateFileContentTool::new(generator())),
            BuiltinTool::CreateProjectStructure => Box::new(CreateProjectStructureTool::new(ws)),
            BuiltinTool::ScaffoldProject => Box::new(ScaffoldProjectTool::new(generator(), ws)),
            BuiltinTool::ExplainCode => Box::new(ExplainCodeTool::new(self.llm.clone(), ws)),
            BuiltinTool::RefactorCode => Box::new(RefactorCodeTool::new(self.llm.clone(), ws)),
            BuiltinTool::MemorySearch => {
                Box::new(MemorySearchTool::new(self.memory.clone(), self.namespace.clone()))
            }
        }
    }
}

/// Registry of every built-in tool enabled by `config`.
pub fn build_registry(config: &ToolsConfig, ctx: &ToolContext) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    for tool in BuiltinTool::all().filter(|t| t.enabled(config)) {
        registry.register(ctx.build(tool, config))?;
    }
    debug!(tools = registry.len(), "Built tool registry");
    Ok(registry)
}
