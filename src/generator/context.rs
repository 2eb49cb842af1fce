use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::llm::{Oracle, OracleFactory};
use crate::sources::{DocumentSource, WikipediaClient};

/// 一次运行所需的外部依赖与配置，由调用方构建后传入流水线
#[derive(Clone)]
pub struct GeneratorContext {
    /// 文本生成服务
    pub oracle: Arc<dyn Oracle>,
    /// 文档检索服务
    pub documents: Arc<dyn DocumentSource>,
    /// 配置
    pub config: Config,
}

impl GeneratorContext {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        documents: Arc<dyn DocumentSource>,
        config: Config,
    ) -> Self {
        Self {
            oracle,
            documents,
            config,
        }
    }

    /// 使用调用方持有的客户端工厂创建上下文
    pub fn from_config(config: Config, factory: &mut OracleFactory) -> Result<Self> {
        let oracle = factory.get_or_create(&config.llm)?;
        let wikipedia = WikipediaClient::new(config.wikipedia.clone())
            .context("无法创建 Wikipedia 客户端")?;

        Ok(Self::new(oracle, Arc::new(wikipedia), config))
    }
}
