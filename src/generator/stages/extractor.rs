use futures::stream::{self, StreamExt};

use super::consult;
use crate::generator::context::GeneratorContext;
use crate::generator::parser::FigureBlockParser;
use crate::generator::types::NO_FIGURES_SENTINEL;
use crate::sources::Document;
use crate::utils::text::truncate_chars;

/// 财务数据抽取：只摘录原文明确写出的数字
#[derive(Default)]
pub struct FigureExtractor;

impl FigureExtractor {
    pub fn build_prompt(&self, content: &str) -> String {
        format!(
            r#"You are a financial data extractor.

TASK:
Scan the SOURCE CONTENT below and extract ALL explicit financial or market-scale figures.
Include: market size, revenue, valuations, growth rates (CAGR), investment amounts, market spending.

STRICT RULES:
- Extract ONLY figures explicitly stated in the content below.
- Do NOT calculate, estimate, or infer any number.
- Every bullet MUST follow this exact format:
  • [figure] — [what it refers to, in plain English]
  Example: • US$1.3 billion — Sri Lanka tea industry export revenue in 2021
  Example: • 8.5% CAGR — projected annual growth rate of the global tea market
- Do NOT return bare numbers without context.
- If none are found, return exactly: "{sentinel}"

SOURCE CONTENT:
{content}
"#,
            sentinel = NO_FIGURES_SENTINEL,
        )
    }

    /// 调用失败时返回 [`NO_FIGURES_SENTINEL`]，不中断流程
    pub async fn execute(&self, context: &GeneratorContext, document: &Document) -> String {
        let prefix = truncate_chars(
            &document.content,
            context.config.pipeline.figure_prefix_chars,
        );
        let prompt = self.build_prompt(prefix);

        match consult(context, "FigureExtractor", &prompt, &FigureBlockParser).await {
            Ok(block) => block,
            Err(e) => {
                tracing::warn!(title = %document.title, error = ?e, "figure extraction failed");
                NO_FIGURES_SENTINEL.to_string()
            }
        }
    }

    /// 逐篇抽取，结果顺序与输入一致
    pub async fn execute_all(
        &self,
        context: &GeneratorContext,
        documents: &[Document],
    ) -> Vec<String> {
        let parallels = context.config.pipeline.max_parallels.max(1);
        stream::iter(documents)
            .map(|document| self.execute(context, document))
            .buffered(parallels)
            .collect()
            .await
    }
}

/// 抽取单篇文档的财务数据
pub async fn extract_figures(context: &GeneratorContext, document: &Document) -> String {
    FigureExtractor.execute(context, document).await
}
