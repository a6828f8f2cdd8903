use std::time::Duration;

use serde::Deserialize;

use super::{SearchError, SearchProvider, SearchResult};

const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);
const SNIPPET_MAX_CHARS: usize = 400;
const UNTITLED: &str = "无标题";

/// Web search via a SearXNG instance's JSON API.
pub struct SearxngProvider {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearxngResponse {
    #[serde(default)]
    results: Vec<SearxngRow>,
}

#[derive(Debug, Deserialize)]
struct SearxngRow {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

impl SearxngProvider {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait::async_trait]
impl SearchProvider for SearxngProvider {
    #[tracing::instrument(name = "search.web", skip(self), fields(search.results_count = tracing::field::Empty))]
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(SEARCH_TIMEOUT)
            .query(&[("q", query), ("format", "json")])
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?
            .error_for_status()
            .map_err(|e| SearchError::Request(e.to_string()))?;

        let parsed: SearxngResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))?;

        let results = map_rows(parsed.results, max_results);
        tracing::Span::current().record("search.results_count", results.len());

        Ok(results)
    }
}

/// Rows missing both title and content carry nothing usable and are dropped;
/// a missing title alone gets a placeholder.
fn map_rows(rows: Vec<SearxngRow>, max_results: usize) -> Vec<SearchResult> {
    let mut results = Vec::new();

    for row in rows {
        let title = row.title.unwrap_or_default().trim().to_string();
        let snippet = row.content.unwrap_or_default().trim().to_string();
        let url = row.url.unwrap_or_default().trim().to_string();

        if title.is_empty() && snippet.is_empty() {
            continue;
        }

        results.push(SearchResult {
            title: if title.is_empty() {
                UNTITLED.to_string()
            } else {
                title
            },
            snippet: snippet.chars().take(SNIPPET_MAX_CHARS).collect(),
            url,
        });

        if results.len() >= max_results {
            break;
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(title: Option<&str>, content: Option<&str>, url: Option<&str>) -> SearxngRow {
        SearxngRow {
            title: title.map(String::from),
            url: url.map(String::from),
            content: content.map(String::from),
        }
    }

    #[test]
    fn test_map_rows_basic() {
        let rows = vec![row(
            Some("行业报告"),
            Some("2025 年行业趋势摘要"),
            Some("https://example.com/a"),
        )];
        let results = map_rows(rows, 5);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "行业报告");
        assert_eq!(results[0].snippet, "2025 年行业趋势摘要");
        assert_eq!(results[0].url, "https://example.com/a");
    }

    #[test]
    fn test_map_rows_missing_title_gets_placeholder() {
        let results = map_rows(vec![row(None, Some("some snippet"), Some("u"))], 5);
        assert_eq!(results[0].title, "无标题");
    }

    #[test]
    fn test_map_rows_drops_empty_rows() {
        let rows = vec![
            row(None, None, Some("https://example.com")),
            row(Some("  "), Some(""), None),
            row(Some("kept"), None, None),
        ];
        let results = map_rows(rows, 5);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "kept");
        assert_eq!(results[0].snippet, "");
    }

    #[test]
    fn test_map_rows_caps_list_length() {
        let rows: Vec<SearxngRow> = (0..10)
            .map(|i| row(Some(&format!("t{i}")), Some("s"), None))
            .collect();
        let results = map_rows(rows, 3);
        assert_eq!(results.len(), 3);
        assert_eq!(results[2].title, "t2");
    }

    #[test]
    fn test_map_rows_caps_snippet_chars() {
        let long = "智".repeat(500);
        let results = map_rows(vec![row(Some("t"), Some(&long), None)], 5);
        assert_eq!(results[0].snippet.chars().count(), 400);
    }

    #[test]
    fn test_response_deserializes_with_missing_fields() {
        let json = r#"{"results": [{"url": "https://example.com"}, {"title": "a", "content": "b"}]}"#;
        let parsed: SearxngResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.results.len(), 2);
        assert!(parsed.results[0].title.is_none());
    }
}
