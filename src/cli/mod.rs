use crate::config::{Config, LLMConfig, LLMProvider};
use anyhow::{Result, anyhow};
use clap::Parser;
use std::path::PathBuf;

/// Market Brief - 基于 Wikipedia 与大模型的行业研究简报生成工具
#[derive(Parser, Debug)]
#[command(name = "market-brief")]
#[command(
    about = "Generates a cited, eight-section market research briefing for an industry from Wikipedia sources."
)]
#[command(version)]
pub struct Args {
    /// 行业名称，如 "Renewable energy"
    pub industry: String,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 报告输出目录
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// LLM Provider (groq, openai, deepseek, anthropic, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// 模型名称
    #[arg(short, long)]
    pub model: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// 检索与财务抽取的最大并发数
    #[arg(long)]
    pub max_parallels: Option<usize>,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,

    /// 不保存报告文件
    #[arg(long)]
    pub no_save: bool,
}

impl Args {
    /// 将CLI参数转换为配置，命令行参数优先于配置文件
    pub fn into_config(&self) -> Result<Config> {
        let mut config = Config::resolve(self.config.as_deref())?;

        if let Some(output_path) = &self.output_path {
            config.output_path = output_path.clone();
        }

        // 切换provider时同时切换其默认模型、地址和tokens上限
        if let Some(provider_str) = &self.llm_provider {
            let provider: LLMProvider = provider_str.parse().map_err(|e: String| anyhow!(e))?;
            if provider != config.llm.provider {
                config.llm = LLMConfig {
                    api_key: config.llm.api_key,
                    temperature: config.llm.temperature,
                    retry_attempts: config.llm.retry_attempts,
                    retry_delay_ms: config.llm.retry_delay_ms,
                    ..LLMConfig::for_provider(provider)
                };
            }
        }
        if let Some(llm_api_base_url) = &self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url.clone();
        }
        if let Some(llm_api_key) = &self.llm_api_key {
            config.llm.api_key = llm_api_key.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }
        if let Some(max_parallels) = self.max_parallels {
            config.pipeline.max_parallels = max_parallels;
        }

        if self.no_save {
            config.save_report = false;
        }
        config.verbose = config.verbose || self.verbose;

        Ok(config)
    }
}
