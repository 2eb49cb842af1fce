//! 单元测试用的模型与文档服务替身

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::generator::context::GeneratorContext;
use crate::llm::Oracle;
use crate::sources::{Document, DocumentSource, SourceError};

type Responder = Box<dyn Fn(&str) -> Result<String> + Send + Sync>;

/// 按脚本回复的模型
pub struct ScriptedOracle {
    responder: Responder,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(reply: &str) -> Self {
        let reply = reply.to_string();
        Self::new(move |_| Ok(reply.clone()))
    }

    pub fn failing(message: &str) -> Self {
        let message = message.to_string();
        Self::new(move |_| Err(anyhow!(message.clone())))
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn invoke(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.responder)(prompt)
    }
}

/// 预置结果的文档服务，未登记的查询返回空列表
#[derive(Default)]
pub struct StaticSource {
    results: HashMap<String, Result<Vec<Document>, String>>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, query: &str, documents: Vec<Document>) -> Self {
        self.results.insert(query.to_string(), Ok(documents));
        self
    }

    pub fn failing(mut self, query: &str) -> Self {
        self.results
            .insert(query.to_string(), Err(format!("search for {} failed", query)));
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(query, _)| query.clone())
            .collect()
    }

    pub fn limits(&self) -> Vec<usize> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, limit)| *limit)
            .collect()
    }
}

#[async_trait]
impl DocumentSource for StaticSource {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Document>, SourceError> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), max_results));
        match self.results.get(query) {
            Some(Ok(documents)) => Ok(documents.iter().take(max_results).cloned().collect()),
            Some(Err(message)) => Err(SourceError::Decode(message.clone())),
            None => Ok(Vec::new()),
        }
    }
}

pub fn doc(title: &str) -> Document {
    Document::new(
        title,
        format!("https://en.wikipedia.org/wiki/{}", title.replace(' ', "_")),
        format!("{} article body.", title),
    )
}

pub fn test_context(oracle: Arc<ScriptedOracle>, source: Arc<StaticSource>) -> GeneratorContext {
    GeneratorContext::new(oracle, source, Config::default())
}
