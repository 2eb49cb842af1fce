use anyhow::Result;

use super::consult;
use super::extractor::FigureExtractor;
use crate::generator::context::GeneratorContext;
use crate::generator::parser::ReportParser;
use crate::generator::types::{Report, SourceRecord};
use crate::sources::Document;
use crate::utils::text::truncate_chars;

/// 报告中没有市场规模数据时要求模型使用的原话
pub const NO_MARKET_SIZE_SENTENCE: &str = "No numerical market size data provided in sources.";

/// 报告的八个章节
pub const REPORT_SECTIONS: [&str; 8] = [
    "Industry Overview & Market Value",
    "Market Structure & Value Chain",
    "Industry Scale & Geographic Footprint",
    "Competitive Landscape",
    "Key Industry Drivers",
    "Risks, Constraints & Regulatory Barriers",
    "SWOT Analysis",
    "Industry Outlook",
];

/// 报告生成的产出
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub report: Report,
    /// 按引用序号排列
    pub sources: Vec<SourceRecord>,
    pub figures_text: String,
}

/// 报告生成
#[derive(Default)]
pub struct ReportSynthesizer;

impl ReportSynthesizer {
    /// 为每篇文档编号，序号与 `[SOURCE n]` 一一对应
    pub fn source_records(&self, documents: &[Document], figures: &[String]) -> Vec<SourceRecord> {
        documents
            .iter()
            .zip(figures)
            .enumerate()
            .map(|(i, (document, figures))| SourceRecord {
                ordinal: i + 1,
                title: document.title.clone(),
                url: document.source_url.clone(),
                figures: figures.clone(),
            })
            .collect()
    }

    pub fn build_context(&self, documents: &[Document], prefix_chars: usize) -> String {
        documents
            .iter()
            .enumerate()
            .map(|(i, document)| {
                format!(
                    "[SOURCE {}]\nTITLE: {}\nURL: {}\nCONTENT:\n{}\n\n",
                    i + 1,
                    document.title,
                    document.source_url,
                    truncate_chars(&document.content, prefix_chars)
                )
            })
            .collect()
    }

    pub fn figures_text(&self, sources: &[SourceRecord]) -> String {
        sources
            .iter()
            .map(|s| format!("SOURCE {} — {}:\n{}", s.ordinal, s.title, s.figures))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn build_prompt(
        &self,
        industry: &str,
        context_text: &str,
        figures_text: &str,
        word_cap: usize,
    ) -> String {
        let [overview, structure, scale, competition, drivers, risks, swot, outlook] =
            REPORT_SECTIONS;

        format!(
            r#"ROLE:
You are a Market Research Assistant supporting business analysts at a large corporation.

OBJECTIVE:
Produce a concise, decision-oriented industry briefing that helps a corporate analyst
understand the structure, economics, risks, and strategic outlook of the {industry} industry.

STRICT RULES:
- Use ONLY information explicitly contained in the CONTEXT below.
- Every factual statement MUST end with at least one clickable citation in this format: [SOURCE X](URL).
- Do NOT include assumptions, extrapolations, or forward-looking estimates unless directly supported by the sources.
- Do NOT generalize about market size when exact figures are available.
- Avoid generic business statements that could apply to most industries.
- Use the figures listed in FINANCIAL FIGURES only where appropriate, and quote them accurately.

WRITING STYLE:
- Professional, neutral, and analytical.
- Focus on industry mechanisms and economic structure.
- Prioritise financial scale, capital intensity, and economic impact when available.

FORMATTING RULES (CRITICAL):
- Use ## for each section heading (e.g. ## 1. {overview})
- Leave a blank line between the heading and the paragraph text.
- Put each bullet on its own line with a blank line between bullets.
- In the SWOT section use bold labels: **Strengths**, **Weaknesses**, **Opportunities**, **Threats**
- Never put a section heading and its content on the same line.

REPORT STRUCTURE:

1. {overview}
   - Briefly describe what the industry does and its core economic function.
   - Report any market size, revenue, spending, growth rate, CAGR or year-over-year figures
     from the sources with exact numbers and citations.
   - If the sources contain no numerical figures, state exactly:
     "{no_data}"

2. {structure}
   - Explain how value is created and captured.
   - Identify key participants and their economic roles.

3. {scale}
   - Describe major producing regions, revenue concentration, or geographic dominance.
   - Include regional financial figures if present.

4. {competition}
   - Identify major players.
   - Describe concentration levels and the economic power structure.

5. {drivers}
   - List 3-4 concrete structural, regulatory, technological, or demand-side drivers
     specific to the {industry} industry.

6. {risks}
   - Identify capital requirements, cost structure, supply constraints, regulatory barriers, or systemic risks.

7. {swot}
   - Strengths: structural or economic advantages unique to the industry
   - Weaknesses: structural limitations or inefficiencies
   - Opportunities: changes or trends that could materially improve industry performance
   - Threats: forces that could materially harm the industry
   Ground each point in the sources and avoid generic statements.

8. {outlook}
   - Summarize in 2-3 sentences how the industry is expected to evolve, based on trends described in the sources.

LENGTH:
Maximum {word_cap} words.

CONTEXT:
{context_text}

FINANCIAL FIGURES:
{figures_text}
"#,
            no_data = NO_MARKET_SIZE_SENTENCE,
        )
    }

    pub async fn execute(
        &self,
        context: &GeneratorContext,
        documents: &[Document],
        industry: &str,
    ) -> Result<GeneratedReport> {
        let pipeline = &context.config.pipeline;

        println!("   💰 正在抽取 {} 篇文档中的财务数据...", documents.len());
        let figures = FigureExtractor.execute_all(context, documents).await;
        let sources = self.source_records(documents, &figures);
        let figures_text = self.figures_text(&sources);

        let context_text = self.build_context(documents, pipeline.context_prefix_chars);
        let prompt = self.build_prompt(
            industry,
            &context_text,
            &figures_text,
            pipeline.report_word_cap,
        );

        println!("   ✍️ 正在生成报告...");
        let markdown = consult(context, "ReportSynthesizer", &prompt, &ReportParser).await?;

        Ok(GeneratedReport {
            report: Report { markdown },
            sources,
            figures_text,
        })
    }
}

/// 抽取财务数据并生成报告
pub async fn generate_report(
    context: &GeneratorContext,
    documents: &[Document],
    industry: &str,
) -> Result<GeneratedReport> {
    ReportSynthesizer.execute(context, documents, industry).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::test_support::{ScriptedOracle, StaticSource, doc, test_context};
    use anyhow::anyhow;
    use std::sync::Arc;

    const REPORT: &str = "## 1. Industry Overview & Market Value\n\nTea is a beverage crop [SOURCE 1](https://en.wikipedia.org/wiki/Tea).";

    /// 财务抽取的 prompt 以 "You are a financial data extractor" 开头
    fn routed(figures: Result<&'static str, &'static str>) -> ScriptedOracle {
        ScriptedOracle::new(move |prompt| {
            if prompt.starts_with("You are a financial data extractor") {
                figures.map(String::from).map_err(|e| anyhow!(e))
            } else {
                Ok(REPORT.to_string())
            }
        })
    }

    #[test]
    fn test_context_block_format() {
        let documents = vec![
            Document::new("Tea", "https://en.wikipedia.org/wiki/Tea", "Tea is a drink."),
            Document::new("Tea house", "https://en.wikipedia.org/wiki/Tea_house", "0123456789"),
        ];
        let text = ReportSynthesizer.build_context(&documents, 4);

        assert_eq!(
            text,
            "[SOURCE 1]\nTITLE: Tea\nURL: https://en.wikipedia.org/wiki/Tea\nCONTENT:\nTea \n\n\
             [SOURCE 2]\nTITLE: Tea house\nURL: https://en.wikipedia.org/wiki/Tea_house\nCONTENT:\n0123\n\n"
        );
    }

    #[test]
    fn test_figures_text_format() {
        let sources = ReportSynthesizer.source_records(
            &[doc("Tea"), doc("Coffee")],
            &["• US$1 — x".to_string(), "None".to_string()],
        );
        assert_eq!(
            ReportSynthesizer.figures_text(&sources),
            "SOURCE 1 — Tea:\n• US$1 — x\n\nSOURCE 2 — Coffee:\nNone"
        );
    }

    #[test]
    fn test_prompt_contains_sections_and_cap() {
        let prompt = ReportSynthesizer.build_prompt("Tea", "CTX", "FIGS", 500);
        for section in REPORT_SECTIONS {
            assert!(prompt.contains(section), "missing section {}", section);
        }
        assert!(prompt.contains("Maximum 500 words."));
        assert!(prompt.contains("[SOURCE X](URL)"));
        assert!(prompt.contains(NO_MARKET_SIZE_SENTENCE));
        assert!(prompt.contains("CONTEXT:\nCTX\n"));
        assert!(prompt.ends_with("FINANCIAL FIGURES:\nFIGS\n"));
    }

    #[tokio::test]
    async fn test_generate_report_numbers_sources() {
        let oracle = Arc::new(routed(Ok("• 8.5% CAGR — global tea market growth")));
        let context = test_context(oracle.clone(), Arc::new(StaticSource::new()));

        let generated = generate_report(&context, &[doc("Tea"), doc("Tea house")], "Tea")
            .await
            .unwrap();

        assert_eq!(generated.report.markdown, REPORT);
        assert_eq!(generated.sources.len(), 2);
        assert_eq!(generated.sources[0].ordinal, 1);
        assert_eq!(generated.sources[1].ordinal, 2);
        assert_eq!(generated.sources[1].url, "https://en.wikipedia.org/wiki/Tea_house");
        assert!(generated.figures_text.starts_with("SOURCE 1 — Tea:\n• 8.5% CAGR"));
        // 两次抽取 + 一次报告
        assert_eq!(oracle.calls(), 3);
    }

    #[tokio::test]
    async fn test_figure_failure_still_completes() {
        let context = test_context(Arc::new(routed(Err("boom"))), Arc::new(StaticSource::new()));

        let generated = generate_report(&context, &[doc("Tea")], "Tea").await.unwrap();

        assert_eq!(generated.sources[0].figures, "None");
        assert!(generated.report.markdown.contains("[SOURCE"));
    }

    #[tokio::test]
    async fn test_synthesis_failure_propagates() {
        let oracle = ScriptedOracle::new(|prompt| {
            if prompt.starts_with("ROLE:") {
                Err(anyhow!("service unavailable"))
            } else {
                Ok("None".to_string())
            }
        });
        let context = test_context(Arc::new(oracle), Arc::new(StaticSource::new()));

        assert!(generate_report(&context, &[doc("Tea")], "Tea").await.is_err());
    }
}
