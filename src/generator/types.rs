use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::generator::citations::CitationAudit;
use crate::sources::Document;
use crate::utils::text::word_count;

/// 财务数据缺失时的占位内容
pub const NO_FIGURES_SENTINEL: &str = "None";

/// 按标题去重的文档集合。
///
/// 保留标题第一次出现的位置；同一标题再次写入时以最新内容为准。
#[derive(Debug, Clone, Default)]
pub struct DocumentSet {
    order: Vec<String>,
    documents: HashMap<String, Document>,
}

impl DocumentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入文档，标题首次出现时返回 true
    pub fn insert(&mut self, document: Document) -> bool {
        let is_new = !self.documents.contains_key(&document.title);
        if is_new {
            self.order.push(document.title.clone());
        }
        self.documents.insert(document.title.clone(), document);
        is_new
    }

    pub fn contains_title(&self, title: &str) -> bool {
        self.documents.contains_key(title)
    }

    pub fn get(&self, title: &str) -> Option<&Document> {
        self.documents.get(title)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// 按首次出现顺序返回标题
    pub fn titles(&self) -> Vec<String> {
        self.order.clone()
    }

    /// 按首次出现顺序遍历文档
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.order.iter().filter_map(|title| self.documents.get(title))
    }

    pub fn into_documents(mut self) -> Vec<Document> {
        self.order
            .iter()
            .filter_map(|title| self.documents.remove(title))
            .collect()
    }
}

impl Extend<Document> for DocumentSet {
    fn extend<I: IntoIterator<Item = Document>>(&mut self, iter: I) {
        for document in iter {
            self.insert(document);
        }
    }
}

impl FromIterator<Document> for DocumentSet {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        let mut set = DocumentSet::new();
        set.extend(iter);
        set
    }
}

/// 行业名称校验结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub accepted: bool,
    pub reason: String,
    pub suggestions: Vec<String>,
}

/// 相关性筛选时模型给出的标题片段（已转小写）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterVerdict {
    pub fragments: Vec<String>,
}

impl FilterVerdict {
    /// 任一片段是标题（忽略大小写）的子串即视为命中
    pub fn matches(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        self.fragments
            .iter()
            .any(|fragment| title.contains(fragment.as_str()))
    }
}

/// 报告引用所需的来源信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// 从 1 开始的序号，与报告中的 `[SOURCE n]` 对应
    pub ordinal: usize,
    pub title: String,
    pub url: String,
    /// 抽取到的财务数据，未找到时为 [`NO_FIGURES_SENTINEL`]
    pub figures: String,
}

impl SourceRecord {
    pub fn has_figures(&self) -> bool {
        self.figures != NO_FIGURES_SENTINEL
    }
}

/// 最终的 Markdown 报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub markdown: String,
}

impl Report {
    pub fn word_count(&self) -> usize {
        word_count(&self.markdown)
    }
}

/// 一次成功运行的全部产出
#[derive(Debug, Clone)]
pub struct Briefing {
    pub industry: String,
    pub queries: Vec<String>,
    pub raw_titles: Vec<String>,
    pub sources: Vec<SourceRecord>,
    /// 汇总后的财务数据文本
    pub figures_text: String,
    pub report: Report,
    pub citation_audit: CitationAudit,
    pub generated_at: DateTime<Local>,
}

/// 流水线结果：提前终止的几种情况与正常完成
#[derive(Debug, Clone)]
pub enum BriefingOutcome {
    /// 输入过短，未发起任何调用
    InputTooShort { industry: String, min_chars: usize },
    /// 模型判断输入不是一个行业
    Rejected {
        industry: String,
        verdict: ValidationVerdict,
    },
    /// 所有检索都没有返回文档
    NoSourcesFound {
        industry: String,
        queries: Vec<String>,
    },
    /// 筛选后没有可用文档
    DataGap {
        industry: String,
        queries: Vec<String>,
        raw_titles: Vec<String>,
    },
    Completed(Box<Briefing>),
}

impl BriefingOutcome {
    pub fn industry(&self) -> &str {
        match self {
            BriefingOutcome::InputTooShort { industry, .. }
            | BriefingOutcome::Rejected { industry, .. }
            | BriefingOutcome::NoSourcesFound { industry, .. }
            | BriefingOutcome::DataGap { industry, .. } => industry,
            BriefingOutcome::Completed(briefing) => &briefing.industry,
        }
    }

    pub fn briefing(&self) -> Option<&Briefing> {
        match self {
            BriefingOutcome::Completed(briefing) => Some(briefing),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, BriefingOutcome::Completed(_))
    }
}
