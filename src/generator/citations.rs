//! 报告引用检查。只做统计和告警，不会拒绝报告。

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::generator::types::SourceRecord;

static CITATION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[SOURCE\s*(\d+)\]").expect("citation pattern is valid"));

/// 引用检查结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationAudit {
    /// `[SOURCE n]` 标记总数
    pub total_markers: usize,
    /// 被引用过的有效序号
    pub cited_ordinals: BTreeSet<usize>,
    /// 超出来源范围的序号
    pub out_of_range: Vec<usize>,
    /// 链接地址与来源不一致的序号
    pub mismatched_urls: Vec<usize>,
    /// 没有附带链接的标记数
    pub unlinked_markers: usize,
}

impl CitationAudit {
    /// 检查报告中的 `[SOURCE n](url)` 标记
    pub fn audit(report: &str, sources: &[SourceRecord]) -> Self {
        let mut audit = CitationAudit::default();

        for captures in CITATION_MARKER.captures_iter(report) {
            audit.total_markers += 1;

            let Some(ordinal) = captures.get(1).and_then(|m| m.as_str().parse::<usize>().ok())
            else {
                continue;
            };
            let marker_end = captures.get(0).map(|m| m.end()).unwrap_or_default();
            let rest = &report[marker_end..];

            let Some(source) = sources.iter().find(|s| s.ordinal == ordinal) else {
                audit.out_of_range.push(ordinal);
                continue;
            };
            audit.cited_ordinals.insert(ordinal);

            match rest.strip_prefix('(').map(link_target) {
                Some(link) if link == source.url => {}
                Some(_) => audit.mismatched_urls.push(ordinal),
                None => audit.unlinked_markers += 1,
            }
        }

        audit
    }

    /// 至少有一个有效引用，且没有越界或错配
    pub fn is_clean(&self) -> bool {
        !self.cited_ordinals.is_empty()
            && self.out_of_range.is_empty()
            && self.mismatched_urls.is_empty()
    }

    /// 未被引用的来源序号
    pub fn uncited(&self, sources: &[SourceRecord]) -> Vec<usize> {
        sources
            .iter()
            .map(|s| s.ordinal)
            .filter(|ordinal| !self.cited_ordinals.contains(ordinal))
            .collect()
    }
}

/// 取出 `(` 之后到与之配对的 `)` 为止的链接地址，URL 本身可能带括号
fn link_target(after_paren: &str) -> &str {
    let mut depth = 0usize;
    for (i, c) in after_paren.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return after_paren[..i].trim(),
            ')' => depth -= 1,
            c if c.is_whitespace() => return &after_paren[..i],
            _ => {}
        }
    }
    after_paren
}
