//! Prompt text for the generation tools.

pub fn project_structure(framework: &str, use_case: &str) -> (String, String) {
    let system = format!(
        "You are a backend architecture expert. When given a framework and a use case, \
generate a realistic, production-ready project folder structure.

Requirements:
- STRICTLY follow {framework} conventions and file extensions
- Wrap output in triple backticks
- NO explanations, just the folder structure
- Mark directories with a trailing /
- Include all necessary files for a production app
- Medium-to-large scale application

Framework: {framework}
Use Case: {use_case}"
    );
    let user = format!("Generate the complete folder structure for {framework} framework for {use_case}");
    (system, user)
}

pub fn architecture_plan(framework: &str, use_case: &str, tree_structure: &str) -> (String, String) {
    let system = format!(
        r#"You are an expert software architect.

Analyze the given project structure and create a comprehensive architecture plan.

Your task:
1. ANALYZE the folder structure
2. UNDERSTAND the relationships between components
3. PLAN the data flow and dependencies
4. IDENTIFY ALL files that need implementation
5. DETERMINE the content strategy for EACH file

Framework: {framework}
Use Case: {use_case}
Project Structure:
{tree_structure}

CRITICAL REQUIREMENTS:
- Every file in the project structure MUST be included in file_analysis
- Every file MUST have an implementation_priority (high, medium, or low)
- Use the FULL RELATIVE PATH from the project root as each file_analysis key
- Config files and core application files are high priority
- Test files are medium priority
- Documentation files are low priority

Wrap your analysis in triple backticks as JSON with this format:
{{
    "architecture_overview": "...",
    "key_components": [
        {{"name": "...", "purpose": "...", "dependencies": ["..."], "files": ["..."]}}
    ],
    "file_analysis": {{
        "path/to/file": {{
            "purpose": "...",
            "key_features": ["..."],
            "dependencies": ["..."],
            "implementation_priority": "high|medium|low"
        }}
    }},
    "data_flow": "...",
    "implementation_order": ["..."]
}}"#
    );
    let user = "Analyze this project structure and create a detailed architecture plan.".to_string();
    (system, user)
}

pub fn folder_script(tree_structure: &str) -> (String, String) {
    let system = format!(
        "Generate a Python script that creates the given folder structure.

Requirements:
- Define a function create_folder_structure(root_dir) that creates the entire structure inside root_dir
- Call it from an if __name__ == \"__main__\": block with the current directory
- Use os.makedirs(..., exist_ok=True) for directories
- Create files empty, except for a one-line comment naming the file where the syntax allows it
- Handle nested directories properly
- Wrap the script in triple backticks with the python identifier

Tree Structure:
{tree_structure}"
    );
    let user = format!("Generate Python code to create this folder structure:\n{tree_structure}");
    (system, user)
}

pub struct FileBrief<'a> {
    pub framework: &'a str,
    pub use_case: &'a str,
    pub file_path: &'a str,
    pub purpose: &'a str,
    pub features: &'a str,
    pub architecture_overview: &'a str,
    pub data_flow: &'a str,
    pub dependencies: &'a str,
}

pub fn file_content(brief: &FileBrief<'_>) -> (String, String) {
    let FileBrief {
        framework,
        use_case,
        file_path,
        purpose,
        features,
        architecture_overview,
        data_flow,
        dependencies,
    } = brief;
    let system = format!(
        "You are an expert software developer. Generate code for the specified file \
following modern practices for its language and framework.

PROJECT CONTEXT:
Framework: {framework}
Use Case: {use_case}
File: {file_path}
Purpose: {purpose}
Key Features: {features}

PROJECT ARCHITECTURE:
{architecture_overview}

COMPONENT RELATIONSHIPS:
{data_flow}

FILE DEPENDENCIES:
{dependencies}

Generate ONLY the complete code for: {file_path}
Include proper error handling, imports and documentation.
Do not include explanations or text outside the code block."
    );
    let user = format!("Write the complete, production-ready code for {file_path}");
    (system, user)
}

pub fn explain_code(path: &str, code: &str) -> (String, String) {
    let system = "You are a senior engineer. Explain what code does: its purpose, \
the main functions and types, control flow, and anything surprising. Be concise."
        .to_string();
    let user = format!("Explain what the following code in {path} does:\n\n{code}");
    (system, user)
}

pub fn refactor_code(path: &str, code: &str, instructions: Option<&str>) -> (String, String) {
    let system = "You are a senior engineer. Refactor the given code for readability and \
correctness without changing its behaviour. Return the complete refactored file in a \
single fenced code block, followed by a short list of the changes."
        .to_string();
    let goal = instructions.map(|i| format!("Goal: {i}\n\n")).unwrap_or_default();
    let user = format!("{goal}Refactor {path}:\n\n{code}");
    (system, user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_prompt_embeds_tree_and_json_shape() {
        let (system, _) = architecture_plan("FastAPI", "todo app", "app/\n└── main.py");
        assert!(system.contains("└── main.py"));
        assert!(system.contains("\"file_analysis\": {"));
    }

    #[test]
    fn refactor_prompt_includes_optional_goal() {
        let (_, with_goal) = refactor_code("a.py", "x=1", Some("add type hints"));
        assert!(with_goal.starts_with("Goal: add type hints"));
        let (_, without) = refactor_code("a.py", "x=1", None);
        assert!(without.starts_with("Refactor a.py"));
    }
}
