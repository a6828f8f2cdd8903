pub mod orchestrator;
pub mod prompt;
pub mod query;

pub use orchestrator::{ReportOrchestrator, SearchOutcome};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::search::SearchResult;

/// Text material parsed from uploaded files. When composing prompts the
/// bounded `summary` is preferred over the full `text`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub text: String,
    #[serde(default)]
    pub summary: Option<String>,
}

/// Search results the caller already ran and confirmed. Its presence tells
/// the orchestrator to skip its own search step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefetchedSearch {
    pub query: String,
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

/// Immutable input to one orchestration run.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationRequest {
    #[serde(default = "default_task_type")]
    pub task_type: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub outline: Option<String>,
    #[serde(default)]
    pub draft: Option<String>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub user_config: Option<serde_json::Map<String, Value>>,
    #[serde(default)]
    pub search_results: Option<PrefetchedSearch>,
}

fn default_task_type() -> String {
    "open_report".to_string()
}

impl GenerationRequest {
    /// Live search is opted into with a strict JSON boolean; absent means off.
    pub fn web_search_enabled(&self) -> bool {
        self.user_config
            .as_ref()
            .and_then(|config| config.get("web_search_enabled"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// One labeled group of search results rendered as a prompt section. Current
/// policy produces exactly one per run, but prompt assembly accepts many.
#[derive(Debug, Clone)]
pub struct ResearchBundle {
    pub query: String,
    pub reason: String,
    pub results: Vec<SearchResult>,
}

pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
