use anyhow::Result;

use super::consult;
use crate::generator::context::GeneratorContext;
use crate::generator::parser::ValidationParser;
use crate::generator::types::ValidationVerdict;

/// 输入校验：判断用户输入是否是一个行业、板块或市场
#[derive(Default)]
pub struct InputValidator;

impl InputValidator {
    pub fn build_prompt(&self, industry: &str) -> String {
        format!(
            r#"You are an input validator for a market research assistant.

TASK:
Decide whether "{industry}" refers to a BUSINESS INDUSTRY, SECTOR, or MARKET.

RULES:
- Accept industry names even when they are informal or simplified.
- Mark the input INVALID only if:
  1. it is a single generic product with no industry context, or
  2. it is not business-related at all (e.g. "my dog", "happiness", "purple").
- Be permissive: if it could reasonably name an industry, it is VALID.

RESPOND IN EXACTLY ONE OF THESE FORMATS:

When the input refers to an industry (even informally):
VALID

When the input is not an industry or is too vague:
INVALID - [one sentence explanation]
SUGGESTIONS: [3-5 specific industry alternatives, comma-separated]
"#
        )
    }

    pub async fn execute(
        &self,
        context: &GeneratorContext,
        industry: &str,
    ) -> Result<ValidationVerdict> {
        let prompt = self.build_prompt(industry);
        consult(context, "InputValidator", &prompt, &ValidationParser).await
    }
}

/// 校验行业名称
pub async fn validate_industry(
    context: &GeneratorContext,
    industry: &str,
) -> Result<ValidationVerdict> {
    InputValidator.execute(context, industry).await
}
