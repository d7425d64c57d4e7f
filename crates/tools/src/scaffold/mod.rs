//! Project scaffolding: structure, plan, per-file content, and writing it out.

pub mod create;
pub mod generate;
pub mod plan;
pub mod project;
pub mod prompts;
pub mod tree;

use blitzcoder_core::error::ToolError;

use crate::llm::{LlmClient, extract_fenced};
pub use plan::{ArchitecturePlan, FileAnalysis, Priority};
pub use prompts::FileBrief;

/// The generation steps, shared by the individual tools and `scaffold_project`.
#[derive(Clone)]
pub struct Generator {
    llm: LlmClient,
}

impl Generator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    pub async fn project_structure(
        &self,
        tool_name: &str,
        framework: &str,
        use_case: &str,
    ) -> Result<String, ToolError> {
        let (system, user) = prompts::project_structure(framework, use_case);
        let text = self.llm.generate(tool_name, &system, &user).await?;
        Ok(extract_fenced(&text))
    }

    pub async fn architecture_plan(
        &self,
        tool_name: &str,
        framework: &str,
        use_case: &str,
        tree_structure: &str,
    ) -> Result<ArchitecturePlan, ToolError> {
        let (system, user) = prompts::architecture_plan(framework, use_case, tree_structure);
        let text = self.llm.generate(tool_name, &system, &user).await?;
        let json = extract_fenced(&text);
        ArchitecturePlan::parse(&json).map_err(|e| {
            ToolError::failed(tool_name, format!("architecture plan is not valid JSON: {e}"))
        })
    }

    /// A Python script that recreates `tree_structure`. Returned as text, never run.
    pub async fn folder_script(&self, tool_name: &str, tree_structure: &str) -> Result<String, ToolError> {
        let (system, user) = prompts::folder_script(tree_structure);
        let text = self.llm.generate(tool_name, &system, &user).await?;
        Ok(extract_fenced(&text))
    }

    pub async fn file_content(&self, tool_name: &str, brief: &FileBrief<'_>) -> Result<String, ToolError> {
        let (system, user) = prompts::file_content(brief);
        let text = self.llm.generate(tool_name, &system, &user).await?;
        Ok(extract_fenced(&text))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use blitzcoder_core::error::ProviderError;
    use blitzcoder_core::message::Message;
    use blitzcoder_core::provider::{Provider, ProviderRequest, ProviderResponse};

    use crate::llm::LlmClient;

    /// Answers with queued texts and records every request.
    pub struct Scripted {
        replies: Mutex<VecDeque<String>>,
        pub requests: Mutex<Vec<ProviderRequest>>,
    }

    impl Scripted {
        pub fn new<I: IntoIterator<Item = S>, S: Into<String>>(replies: I) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Provider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            self.requests.lock().unwrap().push(request);
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ProviderError::ApiError {
                    status_code: 500,
                    message: "script exhausted".into(),
                })?;
            Ok(ProviderResponse {
                message: Message::assistant(reply),
                usage: None,
                model: "scripted".into(),
            })
        }
    }

    pub fn client(provider: Arc<Scripted>) -> LlmClient {
        LlmClient::new(provider, "test-model", 0.2)
    }
}
