//! 模型回复解析器。
//!
//! 每个阶段对模型输出格式的假设都集中在这里，格式漂移时只需要调整对应的解析器。

use crate::generator::types::{FilterVerdict, NO_FIGURES_SENTINEL, ValidationVerdict};

/// 将模型的自由文本回复转换为结构化结果
pub trait ResponseParser {
    type Output;

    fn parse(&self, response: &str) -> Self::Output;
}

/// 解析 `VALID` / `INVALID - reason` + `SUGGESTIONS: a, b` 格式
#[derive(Debug, Default, Clone, Copy)]
pub struct ValidationParser;

impl ResponseParser for ValidationParser {
    type Output = ValidationVerdict;

    fn parse(&self, response: &str) -> ValidationVerdict {
        let response = response.trim();
        let first_token = response
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_uppercase();

        if first_token == "VALID" {
            return ValidationVerdict {
                accepted: true,
                ..Default::default()
            };
        }

        let mut reason = String::new();
        let mut suggestions = Vec::new();

        for line in response.lines().map(str::trim_start) {
            if let Some(rest) = line.strip_prefix("INVALID") {
                reason = rest
                    .trim_start_matches(|c: char| c == '-' || c == ':' || c.is_whitespace())
                    .trim()
                    .to_string();
            } else if let Some(rest) = line.strip_prefix("SUGGESTIONS:") {
                suggestions = rest
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect();
            }
        }

        ValidationVerdict {
            accepted: false,
            reason,
            suggestions,
        }
    }
}

/// 解析 `QUERIES:` 之后的短横线列表
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryPlanParser;

impl ResponseParser for QueryPlanParser {
    type Output = Vec<String>;

    fn parse(&self, response: &str) -> Vec<String> {
        response
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with('-'))
            .map(|line| {
                line.trim_start_matches(|c: char| c == '-' || c.is_whitespace())
                    .trim_end()
                    .to_string()
            })
            .filter(|query| !query.is_empty())
            .collect()
    }
}

/// 解析逗号分隔的标题列表
#[derive(Debug, Default, Clone, Copy)]
pub struct TitleVerdictParser;

impl ResponseParser for TitleVerdictParser {
    type Output = FilterVerdict;

    fn parse(&self, response: &str) -> FilterVerdict {
        let fragments = response
            .split(',')
            .map(|fragment| {
                fragment
                    .trim()
                    .trim_matches(|c: char| matches!(c, '"' | '\'' | '[' | ']' | '`'))
                    .trim()
                    .to_lowercase()
            })
            // 空片段会命中任何标题
            .filter(|fragment| !fragment.is_empty())
            .collect();

        FilterVerdict { fragments }
    }
}

/// 财务数据原样保留，仅统一"未找到"的写法
#[derive(Debug, Default, Clone, Copy)]
pub struct FigureBlockParser;

impl ResponseParser for FigureBlockParser {
    type Output = String;

    fn parse(&self, response: &str) -> String {
        let block = response.trim();
        let bare = block.trim_matches(|c: char| matches!(c, '"' | '\'' | '.' | '`'));
        if bare.is_empty() || bare.eq_ignore_ascii_case(NO_FIGURES_SENTINEL) {
            NO_FIGURES_SENTINEL.to_string()
        } else {
            block.to_string()
        }
    }
}

/// 报告原文不做任何改写
#[derive(Debug, Default, Clone, Copy)]
pub struct ReportParser;

impl ResponseParser for ReportParser {
    type Output = String;

    fn parse(&self, response: &str) -> String {
        response.trim().to_string()
    }
}
