//! Wikipedia 检索客户端，基于 MediaWiki action API。
//!
//! 先以 `list=search` 取得候选标题，再逐个以 `prop=extracts` 拉取纯文本正文。
//! 消歧义页和不存在的页面会被跳过。

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;

use super::{Document, DocumentSource, SourceError};
use crate::config::WikipediaConfig;
use crate::utils::text::truncate_chars;

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    info: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: Option<SearchBlock>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct SearchBlock {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    #[serde(default)]
    query: Option<PageBlock>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct PageBlock {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    fullurl: Option<String>,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    pageprops: HashMap<String, serde_json::Value>,
}

/// Wikipedia 文档服务
#[derive(Clone)]
pub struct WikipediaClient {
    http: Client,
    config: WikipediaConfig,
}

impl WikipediaClient {
    pub fn new(config: WikipediaConfig) -> Result<Self, SourceError> {
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { http, config })
    }

    /// 发起一次 action=query 请求并解析JSON
    async fn query<T>(&self, params: &[(&str, &str)]) -> Result<T, SourceError>
    where
        T: DeserializeOwned,
    {
        let endpoint = self.config.endpoint();
        let response = self
            .http
            .get(&endpoint)
            .query(&[("action", "query"), ("format", "json"), ("formatversion", "2")])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: endpoint,
            });
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                SourceError::Decode(e.to_string())
            } else {
                SourceError::Http(e)
            }
        })
    }

    /// 搜索候选标题
    async fn search_titles(&self, query: &str, limit: usize) -> Result<Vec<String>, SourceError> {
        let limit = limit.to_string();
        let response: SearchResponse = self
            .query(&[
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("srprop", ""),
            ])
            .await?;

        if let Some(error) = response.error {
            return Err(SourceError::Api {
                code: error.code,
                info: error.info,
            });
        }

        Ok(response
            .query
            .map(|block| block.search.into_iter().map(|hit| hit.title).collect())
            .unwrap_or_default())
    }

    /// 拉取单个页面的纯文本正文，页面不可用时返回 None
    async fn fetch_page(&self, title: &str) -> Result<Option<Document>, SourceError> {
        let response: PageResponse = self
            .query(&[
                ("prop", "extracts|info|pageprops"),
                ("explaintext", "1"),
                ("inprop", "url"),
                ("ppprop", "disambiguation"),
                ("redirects", "1"),
                ("titles", title),
            ])
            .await?;

        if let Some(error) = response.error {
            return Err(SourceError::Api {
                code: error.code,
                info: error.info,
            });
        }

        let Some(page) = response.query.and_then(|block| block.pages.into_iter().next()) else {
            return Ok(None);
        };

        if page.missing || page.pageprops.contains_key("disambiguation") {
            return Ok(None);
        }

        let source_url = page
            .fullurl
            .unwrap_or_else(|| self.page_url(&page.title));
        let content = page.extract.unwrap_or_default();
        let content = truncate_chars(&content, self.config.content_chars_max).to_string();

        Ok(Some(Document {
            title: page.title,
            source_url,
            content,
        }))
    }

    fn page_url(&self, title: &str) -> String {
        format!(
            "https://{}.wikipedia.org/wiki/{}",
            self.config.language,
            title.replace(' ', "_")
        )
    }
}

#[async_trait]
impl DocumentSource for WikipediaClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Document>, SourceError> {
        let query = query.trim();
        if query.is_empty() || max_results == 0 {
            return Ok(Vec::new());
        }

        let titles = self.search_titles(query, max_results).await?;
        let mut documents = Vec::with_capacity(titles.len());

        for title in titles.iter().take(max_results) {
            match self.fetch_page(title).await {
                Ok(Some(document)) => documents.push(document),
                Ok(None) => tracing::debug!(title = %title, "skipping unavailable page"),
                Err(e) => tracing::warn!(title = %title, error = %e, "failed to fetch page"),
            }
        }

        Ok(documents)
    }
}
