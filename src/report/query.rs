use super::{GenerationRequest, truncate_chars};

const FRAGMENT_MAX_CHARS: usize = 80;

/// Query used when the request carries nothing searchable.
pub const DEFAULT_QUERY: &str = "智能报告 行业分析";

/// Derive one search query from the request, without calling the model.
/// Sources are tried in priority order and the first non-empty one wins:
/// the title, then `user_config.instruction`, then the first material.
pub fn build_query(request: &GenerationRequest) -> String {
    if let Some(title) = request.title.as_deref() {
        let title = title.trim();
        if !title.is_empty() {
            return title.to_string();
        }
    }

    if let Some(instruction) = request
        .user_config
        .as_ref()
        .and_then(|config| config.get("instruction"))
        .and_then(|value| value.as_str())
    {
        let instruction = truncate_chars(instruction, FRAGMENT_MAX_CHARS);
        let instruction = instruction.trim();
        if !instruction.is_empty() {
            return instruction.to_string();
        }
    }

    if let Some(first) = request.materials.first() {
        let source = match first.summary.as_deref() {
            Some(summary) if !summary.is_empty() => summary,
            _ => first.text.as_str(),
        };
        let snippet = truncate_chars(source, FRAGMENT_MAX_CHARS);
        let snippet = snippet.trim();
        if !snippet.is_empty() {
            return snippet.to_string();
        }
    }

    DEFAULT_QUERY.to_string()
}
