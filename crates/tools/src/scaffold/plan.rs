//! Architecture plan produced by the model before files are generated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchitecturePlan {
    pub architecture_overview: String,
    pub key_components: Vec<Component>,
    /// Keyed by path relative to the project root.
    pub file_analysis: BTreeMap<String, FileAnalysis>,
    pub data_flow: String,
    pub implementation_order: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Component {
    pub name: String,
    pub purpose: String,
    pub dependencies: Vec<String>,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAnalysis {
    pub purpose: String,
    pub key_features: Vec<String>,
    pub dependencies: Vec<String>,
    pub implementation_priority: Priority,
}

impl Default for FileAnalysis {
    fn default() -> Self {
        Self {
            purpose: "Core application file".into(),
            key_features: Vec::new(),
            dependencies: Vec::new(),
            implementation_priority: Priority::Medium,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl ArchitecturePlan {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Files in generation order: `implementation_order` first, then the rest
    /// of `file_analysis` by priority and path.
    pub fn files_in_order(&self) -> Vec<&str> {
        let mut ordered: Vec<&str> = Vec::with_capacity(self.file_analysis.len());
        for path in &self.implementation_order {
            if self.file_analysis.contains_key(path) && !ordered.contains(&path.as_str()) {
                ordered.push(path);
            }
        }
        let mut rest: Vec<(&Priority, &str)> = self
            .file_analysis
            .iter()
            .filter(|(path, _)| !ordered.contains(&path.as_str()))
            .map(|(path, a)| (&a.implementation_priority, path.as_str()))
            .collect();
        rest.sort();
        ordered.extend(rest.into_iter().map(|(_, p)| p));
        ordered
    }
}
