//! 流水线各阶段。每个阶段只依赖上一阶段的产出，按顺序执行。

use anyhow::{Context, Result};

use crate::generator::context::GeneratorContext;
use crate::generator::parser::ResponseParser;

pub mod extractor;
pub mod filter;
pub mod planner;
pub mod retriever;
pub mod synthesizer;
pub mod validator;

pub use extractor::{FigureExtractor, extract_figures};
pub use filter::{RelevanceFilter, filter_documents};
pub use planner::{QueryPlanner, generate_queries};
pub use retriever::retrieve_documents;
pub use synthesizer::{GeneratedReport, ReportSynthesizer, generate_report};
pub use validator::{InputValidator, validate_industry};

/// 调用一次模型并用给定解析器处理回复
pub(crate) async fn consult<P>(
    context: &GeneratorContext,
    stage: &str,
    prompt: &str,
    parser: &P,
) -> Result<P::Output>
where
    P: ResponseParser,
{
    tracing::debug!(stage, prompt_chars = prompt.chars().count(), "consulting oracle");
    let reply = context
        .oracle
        .invoke(prompt)
        .await
        .with_context(|| format!("{} 阶段调用模型失败", stage))?;
    tracing::debug!(stage, reply = %reply, "oracle replied");
    Ok(parser.parse(&reply))
}
