use anyhow::Result;

use super::consult;
use crate::generator::context::GeneratorContext;
use crate::generator::parser::QueryPlanParser;

/// 检索规划覆盖的五个分析维度
pub const RESEARCH_DIMENSIONS: [&str; 5] = [
    "Industry definition and scope",
    "Market structure and value chain",
    "Competitive landscape and key players",
    "Economic significance or market size (if available)",
    "Industry trends, regulation, or structural change",
];

/// 检索规划：为行业生成五条 Wikipedia 查询
#[derive(Default)]
pub struct QueryPlanner;

impl QueryPlanner {
    pub fn build_prompt(&self, industry: &str) -> String {
        let dimensions = RESEARCH_DIMENSIONS
            .iter()
            .enumerate()
            .map(|(i, d)| format!("{}. {}", i + 1, d))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"You are the research query planner of a market research assistant.

INDUSTRY:
"{industry}"

OBJECTIVE:
Produce Wikipedia search queries that retrieve pages useful for a business-focused industry report.

STRICT RULES:
- Every query MUST explicitly name the "{industry}" industry or a very close synonym.
- Do NOT target adjacent or parent industries unless the query also names "{industry}".
- Prefer canonical Wikipedia article titles over descriptive phrases.
- Avoid geography-only, company-only, or history-only queries.
- Do NOT ask for forecasts unless Wikipedia commonly covers them.

TASK:
Write exactly 5 queries, one for each business dimension:

{dimensions}

FORMAT (EXACT):
QUERIES:
- <query 1>
- <query 2>
- <query 3>
- <query 4>
- <query 5>
"#
        )
    }

    /// 返回解析出的查询，数量不做强制校验
    pub async fn execute(&self, context: &GeneratorContext, industry: &str) -> Result<Vec<String>> {
        let prompt = self.build_prompt(industry);
        let queries = consult(context, "QueryPlanner", &prompt, &QueryPlanParser).await?;

        if queries.len() != RESEARCH_DIMENSIONS.len() {
            tracing::warn!(
                expected = RESEARCH_DIMENSIONS.len(),
                actual = queries.len(),
                "query planner returned an unexpected number of queries"
            );
        }

        Ok(queries)
    }
}

/// 生成检索查询
pub async fn generate_queries(context: &GeneratorContext, industry: &str) -> Result<Vec<String>> {
    QueryPlanner.execute(context, industry).await
}
