use serde_json::Value;

use super::{GenerationRequest, Material, ResearchBundle, truncate_chars};

/// System prompt plus assembled user message for one completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

const SIMPLE_SYSTEM_PROMPT: &str = "\
你是一名专业的技术报告与工作报告写作助手，擅长根据给定材料与草稿，
用规范、清晰、结构化的 Markdown 格式生成或润色“开放报告”类文档。

要求：
- 内容逻辑清晰、结构完整，标题层级合理（使用 #, ##, ### 等）
- 语言正式、专业，但尽量通俗易懂
- 尽量保留用户草稿中的关键信息与专业术语
- 如有表格类结构，可使用 Markdown 表格语法";

const RESEARCH_SYSTEM_PROMPT: &str = "\
你是一名专业的技术报告与工作报告写作助手，
现在需要在综合“用户提供的材料”和“互联网检索结果”的基础上，
生成一篇结构化的“开放报告”（Markdown 格式）。

要求：
- 报告结构完整，标题层级清晰（使用 #, ##, ### 等）
- 语言正式、专业，但尽量通俗易懂
- 明确区分“用户提供的材料信息”和“从外部检索获得的补充信息”
- 当某个结论明显来自检索结果时，可以在句末用 [参考] 标注
- 如有需要，可在文末添加“参考资料”小节，列出主要外部信息来源的标题或简要描述";

/// The two prompt flavors share their section order and differ only in
/// labels, material budget and the research-bundle section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variant {
    Simple,
    Research,
}

struct SectionLabels {
    outline: &'static str,
    draft: &'static str,
    materials_header: &'static str,
    user_config: &'static str,
}

impl Variant {
    fn system_prompt(self) -> &'static str {
        match self {
            Variant::Simple => SIMPLE_SYSTEM_PROMPT,
            Variant::Research => RESEARCH_SYSTEM_PROMPT,
        }
    }

    // Research prompts also carry retrieved content, so user material gets a
    // smaller slice of the prompt budget.
    fn material_max_chars(self) -> usize {
        match self {
            Variant::Simple => 1200,
            Variant::Research => 800,
        }
    }

    fn labels(self) -> SectionLabels {
        match self {
            Variant::Simple => SectionLabels {
                outline: "\n报告大纲(可参考):\n",
                draft: "\n当前草稿内容(需要在此基础上优化/续写):\n",
                materials_header: "\n以下是若干参考材料的摘要，请在内容上尽量与之保持一致：",
                user_config: "\n写作偏好配置(语气/篇幅/侧重点等，可参考但不必逐字遵循):\n",
            },
            Variant::Research => SectionLabels {
                outline: "\n用户提供的大纲(可参考):\n",
                draft: "\n用户提供的草稿(需要在此基础上优化/补充):\n",
                materials_header: "\n以下是用户上传材料的摘要：",
                user_config: "\n用户的写作偏好(语气/篇幅/侧重点等，可适度参考):\n",
            },
        }
    }
}

pub fn build_simple_prompt(request: &GenerationRequest) -> Prompt {
    assemble(Variant::Simple, request, &[])
}

pub fn build_research_prompt(request: &GenerationRequest, bundles: &[ResearchBundle]) -> Prompt {
    assemble(Variant::Research, request, bundles)
}

fn assemble(variant: Variant, request: &GenerationRequest, bundles: &[ResearchBundle]) -> Prompt {
    let labels = variant.labels();
    let mut parts: Vec<String> = Vec::new();

    parts.push(format!("任务类型: {}", request.task_type));

    if let Some(title) = non_empty(request.title.as_deref()) {
        parts.push(format!("\n报告标题(可调整): {title}"));
    }
    if let Some(outline) = non_empty(request.outline.as_deref()) {
        parts.push(format!("{}{outline}", labels.outline));
    }
    if let Some(draft) = non_empty(request.draft.as_deref()) {
        parts.push(format!("{}{draft}", labels.draft));
    }

    if !request.materials.is_empty() {
        parts.push(labels.materials_header.to_string());
        for (idx, material) in request.materials.iter().enumerate() {
            let snippet = material_snippet(material, variant.material_max_chars());
            parts.push(format!(
                "\n[材料 {} - {}]\n{}",
                idx + 1,
                material_label(material),
                snippet
            ));
        }
    }

    if variant == Variant::Research {
        parts.push("\n下面是根据任务自动检索到的外部信息（已按检索任务分组）：".to_string());
        for (i, bundle) in bundles.iter().enumerate() {
            let reason = if bundle.reason.is_empty() {
                "（未说明）"
            } else {
                bundle.reason.as_str()
            };
            parts.push(format!(
                "\n=== 检索任务 {} ===\n查询语句: {}\n目的: {}\n主要检索结果摘要：",
                i + 1,
                bundle.query,
                reason
            ));
            for (j, result) in bundle.results.iter().enumerate() {
                parts.push(format!(
                    "\n- 结果 {}: {}\n  摘要: {}\n  链接: {}",
                    j + 1,
                    result.title,
                    result.snippet,
                    result.url
                ));
            }
        }
    }

    if let Some(config) = &request.user_config {
        let rendered = Value::Object(config.clone()).to_string();
        parts.push(format!("{}{rendered}", labels.user_config));
    }

    Prompt {
        system: variant.system_prompt().to_string(),
        user: parts.join("\n\n"),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Summary preferred over raw text; only the raw text is capped, matching
/// the expectation that summaries are already bounded.
fn material_snippet(material: &Material, max_chars: usize) -> String {
    let source = match material.summary.as_deref() {
        Some(summary) if !summary.is_empty() => summary.to_string(),
        _ => truncate_chars(&material.text, max_chars),
    };
    source.trim().to_string()
}

fn material_label(material: &Material) -> &str {
    match material.name.as_deref() {
        Some(name) if !name.is_empty() => name,
        _ => material.file_id.as_deref().unwrap_or(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchResult;

    fn request(value: serde_json::Value) -> GenerationRequest {
        serde_json::from_value(value).unwrap()
    }

    fn bundle() -> ResearchBundle {
        ResearchBundle {
            query: "新能源汽车 行业分析".to_string(),
            reason: "单次检索验证".to_string(),
            results: vec![
                SearchResult {
                    title: "2025 新能源展望".to_string(),
                    snippet: "销量持续增长".to_string(),
                    url: "https://example.com/a".to_string(),
                },
                SearchResult {
                    title: "电池技术进展".to_string(),
                    snippet: "固态电池量产临近".to_string(),
                    url: "https://example.com/b".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_simple_prompt_idempotent() {
        let req = request(serde_json::json!({
            "title": "Q3 Sales",
            "draft": "草稿内容",
            "materials": [{"text": "材料原文", "name": "notes.txt"}],
            "user_config": {"tone": "formal"}
        }));
        assert_eq!(build_simple_prompt(&req), build_simple_prompt(&req));
    }

    #[test]
    fn test_research_prompt_idempotent() {
        let req = request(serde_json::json!({"title": "Q3 Sales"}));
        let bundles = [bundle()];
        assert_eq!(
            build_research_prompt(&req, &bundles),
            build_research_prompt(&req, &bundles)
        );
    }

    #[test]
    fn test_simple_prompt_sections() {
        let req = request(serde_json::json!({
            "title": "Q3 Sales",
            "draft": "本季度销售额增长 12%",
            "user_config": {"web_search_enabled": false}
        }));
        let prompt = build_simple_prompt(&req);

        assert!(prompt.user.starts_with("任务类型: open_report"));
        assert!(prompt.user.contains("报告标题(可调整): Q3 Sales"));
        assert!(prompt.user.contains("当前草稿内容(需要在此基础上优化/续写):"));
        assert!(!prompt.user.contains("检索任务"));
        assert!(prompt.system.contains("写作助手"));
    }

    #[test]
    fn test_omitted_fields_leave_no_placeholder() {
        let prompt = build_simple_prompt(&request(serde_json::json!({})));
        assert_eq!(prompt.user, "任务类型: open_report");
    }

    #[test]
    fn test_empty_string_fields_skipped() {
        let req = request(serde_json::json!({"title": "", "outline": "", "draft": ""}));
        let prompt = build_simple_prompt(&req);
        assert_eq!(prompt.user, "任务类型: open_report");
    }

    #[test]
    fn test_material_block_uses_name_then_file_id() {
        let req = request(serde_json::json!({
            "materials": [
                {"text": "a", "name": "notes.txt", "file_id": "f-1"},
                {"text": "b", "file_id": "f-2"},
            ]
        }));
        let prompt = build_simple_prompt(&req);
        assert!(prompt.user.contains("[材料 1 - notes.txt]"));
        assert!(prompt.user.contains("[材料 2 - f-2]"));
    }

    #[test]
    fn test_material_caps_differ_by_variant() {
        let long = "材".repeat(2000);
        let req = request(serde_json::json!({"materials": [{"text": long}]}));

        let simple = build_simple_prompt(&req);
        let research = build_research_prompt(&req, &[bundle()]);

        assert!(simple.user.contains(&"材".repeat(1200)));
        assert!(!simple.user.contains(&"材".repeat(1201)));
        assert!(research.user.contains(&"材".repeat(800)));
        assert!(!research.user.contains(&"材".repeat(801)));
    }

    #[test]
    fn test_material_summary_not_capped() {
        let summary = "摘".repeat(1500);
        let req = request(serde_json::json!({
            "materials": [{"text": "原文", "summary": summary}]
        }));
        let prompt = build_simple_prompt(&req);
        assert!(prompt.user.contains(&"摘".repeat(1500)));
    }

    #[test]
    fn test_research_prompt_renders_bundle() {
        let req = request(serde_json::json!({"title": "新能源汽车"}));
        let prompt = build_research_prompt(&req, &[bundle()]);

        assert!(prompt.user.contains("=== 检索任务 1 ==="));
        assert!(prompt.user.contains("查询语句: 新能源汽车 行业分析"));
        assert!(prompt.user.contains("目的: 单次检索验证"));
        assert!(prompt.user.contains("- 结果 1: 2025 新能源展望"));
        assert!(prompt.user.contains("- 结果 2: 电池技术进展"));
        assert!(prompt.user.contains("链接: https://example.com/b"));
        assert!(prompt.system.contains("[参考]"));
    }

    #[test]
    fn test_research_prompt_blank_reason_placeholder() {
        let mut b = bundle();
        b.reason = String::new();
        let prompt = build_research_prompt(&request(serde_json::json!({})), &[b]);
        assert!(prompt.user.contains("目的: （未说明）"));
    }

    #[test]
    fn test_multiple_bundles_numbered() {
        let mut second = bundle();
        second.query = "电池回收".to_string();
        let prompt =
            build_research_prompt(&request(serde_json::json!({})), &[bundle(), second]);
        assert!(prompt.user.contains("=== 检索任务 1 ==="));
        assert!(prompt.user.contains("=== 检索任务 2 ==="));
    }

    #[test]
    fn test_user_config_rendered_deterministically() {
        let req = request(serde_json::json!({
            "user_config": {"tone": "formal", "length": "short"}
        }));
        let first = build_simple_prompt(&req);
        let second = build_simple_prompt(&req);
        assert_eq!(first.user, second.user);
        assert!(first.user.contains("写作偏好配置"));
        assert!(first.user.contains("\"tone\":\"formal\""));
    }
}
