//! 文档检索服务 - 流水线的证据来源

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod wikipedia;

pub use wikipedia::WikipediaClient;

/// 检索得到的文档，检索后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// 标题，在一次运行中唯一
    pub title: String,
    /// 原文地址
    pub source_url: String,
    /// 正文，使用方只取其前缀
    pub content: String,
}

impl Document {
    pub fn new(
        title: impl Into<String>,
        source_url: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            source_url: source_url.into(),
            content: content.into(),
        }
    }
}

/// 文档服务错误
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("document service returned error {code}: {info}")]
    Api { code: String, info: String },
}

/// 百科类文档检索服务
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// 按查询检索文档，最多返回 `max_results` 篇
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Document>, SourceError>;
}
