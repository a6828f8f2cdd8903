use std::sync::Arc;
use std::time::Instant;

use opentelemetry::KeyValue;
use serde::Serialize;

use crate::error::AppError;
use crate::llm::{CompletionMode, CompletionProvider};
use crate::search::{SearchProvider, SearchResult};
use crate::telemetry::metrics::{
    REPORT_FALLBACK_COUNT, REPORT_GENERATION_DURATION, SEARCH_RESULTS,
};

use super::prompt;
use super::query;
use super::{GenerationRequest, PrefetchedSearch, ResearchBundle};

const SEARCH_MAX_RESULTS: usize = 5;
const PREFETCHED_REASON: &str = "用户确认的检索结果";
const SINGLE_PASS_REASON: &str = "单次检索验证";

/// Generation path for one run, resolved exactly once up front.
#[derive(Debug)]
enum GenerationMode {
    /// Caller supplied confirmed search results; no live search happens.
    Prefetched(PrefetchedSearch),
    /// One round of live search feeds the prompt.
    DeepResearch,
    /// Generate from the request material alone.
    Simple,
}

impl GenerationMode {
    fn name(&self) -> &'static str {
        match self {
            GenerationMode::Prefetched(_) => "prefetched",
            GenerationMode::DeepResearch => "deep_research",
            GenerationMode::Simple => "simple",
        }
    }
}

fn select_mode(request: &GenerationRequest) -> GenerationMode {
    if let Some(prefetched) = &request.search_results {
        if !prefetched.results.is_empty() {
            return GenerationMode::Prefetched(prefetched.clone());
        }
        // An empty confirmed set means the caller saw nothing worth keeping;
        // there is nothing to fall back from.
        return GenerationMode::Simple;
    }
    if request.web_search_enabled() {
        GenerationMode::DeepResearch
    } else {
        GenerationMode::Simple
    }
}

/// Query plus results of the pre-confirmation search step.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub query: String,
    pub results: Vec<SearchResult>,
}

pub struct ReportOrchestrator {
    completion: Arc<dyn CompletionProvider>,
    search: Arc<dyn SearchProvider>,
}

impl ReportOrchestrator {
    pub fn new(completion: Arc<dyn CompletionProvider>, search: Arc<dyn SearchProvider>) -> Self {
        Self { completion, search }
    }

    /// Produce the final report text for one request.
    ///
    /// A failed research attempt (prefetched or live) falls back to simple
    /// generation exactly once; a failure in that fallback surfaces unmasked.
    #[tracing::instrument(
        name = "report generate",
        skip_all,
        fields(report.mode = tracing::field::Empty)
    )]
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String, AppError> {
        let start = Instant::now();
        let mode = select_mode(request);
        let mode_name = mode.name();
        tracing::Span::current().record("report.mode", mode_name);

        let result = match mode {
            GenerationMode::Prefetched(prefetched) => {
                let bundle = ResearchBundle {
                    query: prefetched.query,
                    reason: PREFETCHED_REASON.to_string(),
                    results: prefetched.results,
                };
                match self.generate_with_research(request, &[bundle]).await {
                    Ok(content) => Ok(content),
                    Err(err) if err.is_recoverable() => {
                        self.fall_back(request, "prefetched_research", &err).await
                    }
                    Err(err) => Err(err),
                }
            }
            GenerationMode::DeepResearch => self.deep_research(request).await,
            GenerationMode::Simple => self.generate_simple(request).await,
        };

        if result.is_ok() {
            REPORT_GENERATION_DURATION.record(
                start.elapsed().as_secs_f64(),
                &[KeyValue::new("report.mode", mode_name)],
            );
        }

        result
    }

    /// The search half of the deep-research path, exposed so the caller can
    /// confirm results before generation. Never falls back; an empty result
    /// set is a normal outcome, not an error.
    #[tracing::instrument(
        name = "report search_only",
        skip_all,
        fields(search.query = tracing::field::Empty, search.results_count = tracing::field::Empty)
    )]
    pub async fn search_only(&self, request: &GenerationRequest) -> Result<SearchOutcome, AppError> {
        let query = query::build_query(request);
        let results = self.search.search(&query, SEARCH_MAX_RESULTS).await?;

        let span = tracing::Span::current();
        span.record("search.query", query.as_str());
        span.record("search.results_count", results.len());

        Ok(SearchOutcome { query, results })
    }

    async fn deep_research(&self, request: &GenerationRequest) -> Result<String, AppError> {
        let query = query::build_query(request);
        tracing::debug!(query = %query, "built research query");

        let results = match self.search.search(&query, SEARCH_MAX_RESULTS).await {
            Ok(results) => results,
            Err(err) => {
                return self.fall_back(request, "deep_research", &err.into()).await;
            }
        };
        SEARCH_RESULTS.record(results.len() as f64, &[]);

        if results.is_empty() {
            tracing::info!(query = %query, "no search results, generating without research");
            return self.generate_simple(request).await;
        }

        let bundle = ResearchBundle {
            query,
            reason: SINGLE_PASS_REASON.to_string(),
            results,
        };
        match self.generate_with_research(request, &[bundle]).await {
            Ok(content) => Ok(content),
            Err(err) if err.is_recoverable() => {
                self.fall_back(request, "deep_research", &err).await
            }
            Err(err) => Err(err),
        }
    }

    async fn fall_back(
        &self,
        request: &GenerationRequest,
        path: &'static str,
        cause: &AppError,
    ) -> Result<String, AppError> {
        tracing::warn!(
            event = "research_fallback",
            path = path,
            cause = %cause,
            "research generation failed, falling back to simple generation"
        );
        REPORT_FALLBACK_COUNT.add(1, &[KeyValue::new("report.fallback.path", path)]);
        self.generate_simple(request).await
    }

    async fn generate_simple(&self, request: &GenerationRequest) -> Result<String, AppError> {
        let prompt = prompt::build_simple_prompt(request);
        let content = self
            .completion
            .complete(&prompt.system, &prompt.user, CompletionMode::Plain)
            .await?;
        Ok(content)
    }

    async fn generate_with_research(
        &self,
        request: &GenerationRequest,
        bundles: &[ResearchBundle],
    ) -> Result<String, AppError> {
        let prompt = prompt::build_research_prompt(request, bundles);
        let content = self
            .completion
            .complete(&prompt.system, &prompt.user, CompletionMode::Research)
            .await?;
        Ok(content)
    }
}
