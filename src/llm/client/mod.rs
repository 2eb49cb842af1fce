//! LLM客户端 - 提供统一的LLM服务接口

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::future::Future;

use crate::config::LLMConfig;
use crate::llm::oracle::Oracle;

pub mod factory;
mod providers;

use providers::ProviderClient;

/// LLM客户端 - 提供统一的LLM服务接口
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = ProviderClient::new(&config)
            .with_context(|| format!("无法创建 {} 客户端", config.provider))?;
        Ok(Self { client, config })
    }

    /// 通用重试逻辑：首次调用失败后最多再重试 `retry_attempts` 次
    async fn retry_with_backoff<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, anyhow::Error>>,
    {
        let max_retries = self.config.retry_attempts;
        let retry_delay_ms = self.config.retry_delay_ms;
        let mut retries = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    if retries >= max_retries {
                        return Err(err);
                    }
                    retries += 1;
                    tracing::warn!(
                        "调用模型服务出错，重试中 (第 {} / {} 次重试): {}",
                        retries,
                        max_retries,
                        err
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(retry_delay_ms)).await;
                }
            }
        }
    }

    /// 单轮对话，不使用工具
    pub async fn prompt(&self, user_prompt: &str) -> Result<String> {
        let agent = self.client.create_agent(&self.config);

        tracing::debug!(
            model = %self.config.model,
            prompt_chars = user_prompt.chars().count(),
            "invoking model"
        );

        let reply = self
            .retry_with_backoff(|| async { agent.prompt(user_prompt).await })
            .await
            .with_context(|| {
                format!(
                    "调用模型 {} ({}) 失败",
                    self.config.model, self.config.provider
                )
            })?;

        tracing::debug!(reply_chars = reply.chars().count(), "model replied");
        Ok(reply)
    }
}

#[async_trait]
impl Oracle for LLMClient {
    async fn invoke(&self, prompt: &str) -> Result<String> {
        self.prompt(prompt).await
    }
}
