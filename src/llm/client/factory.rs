//! 客户端工厂 - 由调用方持有，按配置复用已创建的LLM客户端

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{LLMConfig, LLMProvider};
use crate::llm::client::LLMClient;

/// 客户端复用的键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey {
    pub provider: LLMProvider,
    pub model: String,
    pub api_key: String,
    pub api_base_url: String,
}

impl From<&LLMConfig> for ClientKey {
    fn from(config: &LLMConfig) -> Self {
        Self {
            provider: config.provider,
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            api_base_url: config.api_base_url.clone(),
        }
    }
}

/// 客户端工厂。生命周期由调用方决定，不存放任何文档或调用结果。
#[derive(Default)]
pub struct OracleFactory {
    clients: HashMap<ClientKey, Arc<LLMClient>>,
}

impl OracleFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取与配置匹配的客户端，不存在时创建
    pub fn get_or_create(&mut self, config: &LLMConfig) -> Result<Arc<LLMClient>> {
        let key = ClientKey::from(config);
        if let Some(client) = self.clients.get(&key) {
            return Ok(Arc::clone(client));
        }

        let client = Arc::new(LLMClient::new(config.clone())?);
        self.clients.insert(key, Arc::clone(&client));
        Ok(client)
    }
}
