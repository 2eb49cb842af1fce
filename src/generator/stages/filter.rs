use anyhow::Result;

use super::consult;
use crate::generator::context::GeneratorContext;
use crate::generator::parser::TitleVerdictParser;
use crate::generator::types::DocumentSet;
use crate::sources::Document;

/// 扩展检索使用的后缀，空字符串表示行业名本身
const EXPANSION_SUFFIXES: [&str; 4] = ["", "sector", "services", "market"];

/// 相关性筛选：先由模型挑选标题，数量不足时扩展检索补齐
#[derive(Default)]
pub struct RelevanceFilter;

impl RelevanceFilter {
    pub fn build_prompt(&self, industry: &str, titles: &[String], keep: usize) -> String {
        let candidates = titles
            .iter()
            .map(|title| format!("- {}", title))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"You are a source quality filter for a business market research tool.

INDUSTRY:
"{industry}"

TASK:
From the candidate list below, select at most {keep} Wikipedia article titles that:
- describe the "{industry}" industry as a whole
- are useful for business or market analysis
Exclude country-specific, company-specific, and purely historical pages.

RETURN FORMAT:
- Return ONLY the exact titles, separated by commas.
- Do NOT explain your reasoning.

CANDIDATE TITLES:
{candidates}
"#
        )
    }

    /// 扩展检索用的四条查询
    pub fn expansion_queries(&self, industry: &str) -> Vec<String> {
        EXPANSION_SUFFIXES
            .iter()
            .map(|suffix| {
                if suffix.is_empty() {
                    industry.to_string()
                } else {
                    format!("{} {}", industry, suffix)
                }
            })
            .collect()
    }

    pub async fn execute(
        &self,
        context: &GeneratorContext,
        raw: &DocumentSet,
        industry: &str,
    ) -> Result<Vec<Document>> {
        if raw.is_empty() {
            return Ok(Vec::new());
        }

        let keep = context.config.pipeline.max_selected_sources;
        let prompt = self.build_prompt(industry, &raw.titles(), keep);
        let verdict = consult(context, "RelevanceFilter", &prompt, &TitleVerdictParser).await?;

        let mut selected: DocumentSet = raw
            .iter()
            .filter(|doc| verdict.matches(&doc.title))
            .cloned()
            .collect();
        println!("   🧹 模型保留了 {} / {} 篇文档", selected.len(), raw.len());

        if selected.len() < keep {
            let added = self.expand(context, &mut selected, industry).await;
            println!("   🔭 扩展检索补充了 {} 篇文档", added);
        }

        let mut documents = selected.into_documents();
        documents.truncate(keep);
        Ok(documents)
    }

    /// 标题须包含行业名，且不能与已选文档重复
    async fn expand(
        &self,
        context: &GeneratorContext,
        selected: &mut DocumentSet,
        industry: &str,
    ) -> usize {
        let needle = industry.to_lowercase();
        let limit = context.config.wikipedia.expansion_max_results;
        let mut added = 0;

        for query in self.expansion_queries(industry) {
            let found = match context.documents.search(&query, limit).await {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!(query = %query, error = %e, "expansion query failed, skipping");
                    continue;
                }
            };

            for document in found {
                if selected.contains_title(&document.title)
                    || !document.title.to_lowercase().contains(&needle)
                {
                    continue;
                }
                selected.insert(document);
                added += 1;
            }
        }

        added
    }
}

/// 筛选出最多 `max_selected_sources` 篇相关文档
pub async fn filter_documents(
    context: &GeneratorContext,
    raw: &DocumentSet,
    industry: &str,
) -> Result<Vec<Document>> {
    RelevanceFilter.execute(context, raw, industry).await
}
