use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// 默认配置文件名，位于当前工作目录
pub const DEFAULT_CONFIG_FILE: &str = "market-brief.toml";

/// API KEY 的环境变量名
pub const API_KEY_ENV: &str = "MARKET_BRIEF_LLM_API_KEY";

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LLMProvider {
    #[serde(rename = "groq")]
    #[default]
    Groq,
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "ollama")]
    Ollama,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::Groq => write!(f, "groq"),
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "groq" => Ok(LLMProvider::Groq),
            "openai" => Ok(LLMProvider::OpenAI),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

impl LLMProvider {
    /// 该provider的默认模型
    pub fn default_model(&self) -> &'static str {
        match self {
            LLMProvider::Groq => "llama-3.3-70b-versatile",
            LLMProvider::OpenAI => "gpt-4o",
            LLMProvider::DeepSeek => "deepseek-chat",
            LLMProvider::Anthropic => "claude-3-5-sonnet-latest",
            LLMProvider::Ollama => "llama3.1",
        }
    }

    /// 该provider的默认API基地址
    pub fn default_base_url(&self) -> &'static str {
        match self {
            // Groq 提供 OpenAI 兼容接口
            LLMProvider::Groq => "https://api.groq.com/openai/v1",
            LLMProvider::OpenAI => "https://api.openai.com/v1",
            LLMProvider::DeepSeek => "https://api.deepseek.com",
            LLMProvider::Anthropic => "https://api.anthropic.com",
            LLMProvider::Ollama => "http://localhost:11434",
        }
    }

    /// 该provider的默认最大输出tokens
    pub fn default_max_tokens(&self) -> u32 {
        match self {
            LLMProvider::Groq => 1200,
            _ => 3000,
        }
    }

    /// 是否需要API KEY（本地模型不需要）
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, LLMProvider::Ollama)
    }

    /// 获取API KEY的控制台地址，用于提示用户
    pub fn api_key_url(&self) -> &'static str {
        match self {
            LLMProvider::Groq => "https://console.groq.com",
            LLMProvider::OpenAI => "https://platform.openai.com/api-keys",
            LLMProvider::DeepSeek => "https://platform.deepseek.com",
            LLMProvider::Anthropic => "https://console.anthropic.com",
            LLMProvider::Ollama => "https://ollama.com",
        }
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    /// 报告输出目录
    pub output_path: PathBuf,

    /// 是否将报告保存为文本文件
    pub save_report: bool,

    /// 是否启用详细日志
    pub verbose: bool,

    /// LLM模型配置
    pub llm: LLMConfig,

    /// Wikipedia检索配置
    pub wikipedia: WikipediaConfig,

    /// 流水线参数
    pub pipeline: PipelineConfig,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(from = "LLMConfigFile")]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址
    pub api_base_url: String,

    /// 模型名称
    pub model: String,

    /// 最大tokens
    pub max_tokens: u32,

    /// 温度
    pub temperature: f64,

    /// 失败后的重试次数（不含首次调用）
    pub retry_attempts: u32,

    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,
}

/// 配置文件中的 `[llm]` 段，未填写的字段取所选provider的默认值
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct LLMConfigFile {
    provider: LLMProvider,
    api_key: Option<String>,
    api_base_url: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f64>,
    retry_attempts: Option<u32>,
    retry_delay_ms: Option<u64>,
}

impl From<LLMConfigFile> for LLMConfig {
    fn from(file: LLMConfigFile) -> Self {
        let defaults = LLMConfig::for_provider(file.provider);
        Self {
            provider: file.provider,
            api_key: file.api_key.unwrap_or(defaults.api_key),
            api_base_url: file.api_base_url.unwrap_or(defaults.api_base_url),
            model: file.model.unwrap_or(defaults.model),
            max_tokens: file.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: file.temperature.unwrap_or(defaults.temperature),
            retry_attempts: file.retry_attempts.unwrap_or(defaults.retry_attempts),
            retry_delay_ms: file.retry_delay_ms.unwrap_or(defaults.retry_delay_ms),
        }
    }
}

/// Wikipedia检索配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct WikipediaConfig {
    /// 语言，决定默认的API地址
    pub language: String,

    /// 自定义的 MediaWiki action API 地址，未设置时按语言推导
    pub api_base_url: Option<String>,

    /// 每条规划查询返回的最大文档数
    pub max_results: usize,

    /// 扩展检索（Tier 2）每条查询返回的最大文档数
    pub expansion_max_results: usize,

    /// 单篇文档保留的最大字符数
    pub content_chars_max: usize,

    /// 请求超时（秒）
    pub timeout_seconds: u64,

    /// 请求的User-Agent
    pub user_agent: String,
}

/// 流水线参数
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PipelineConfig {
    /// 行业名称的最小字符数
    pub min_input_chars: usize,

    /// 最终保留的来源数量上限
    pub max_selected_sources: usize,

    /// 财务数据抽取时截取的正文字符数
    pub figure_prefix_chars: usize,

    /// 报告上下文中每个来源截取的正文字符数
    pub context_prefix_chars: usize,

    /// 报告字数上限
    pub report_word_cap: usize,

    /// 相互独立的调用（检索、抽取）的最大并发数，1 表示顺序执行
    pub max_parallels: usize,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// 按优先级解析配置：显式路径 > 工作目录下的默认文件 > 内置默认值
    pub fn resolve(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        let default_config_path = std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(DEFAULT_CONFIG_FILE);

        if default_config_path.exists() {
            Self::from_file(&default_config_path)
        } else {
            Ok(Config::default())
        }
    }

    /// 运行前检查配置是否可用
    pub fn validate(&self) -> Result<()> {
        if self.llm.provider.requires_api_key() && self.llm.api_key.trim().is_empty() {
            bail!(
                "缺少 {} 的 API KEY，请通过 --llm-api-key 或环境变量 {} 提供（获取地址: {}）",
                self.llm.provider,
                API_KEY_ENV,
                self.llm.provider.api_key_url()
            );
        }
        if self.llm.model.trim().is_empty() {
            bail!("模型名称不能为空");
        }
        if self.pipeline.max_selected_sources == 0 {
            bail!("pipeline.max_selected_sources 必须大于 0");
        }
        if self.pipeline.max_parallels == 0 {
            bail!("pipeline.max_parallels 必须大于 0");
        }
        Ok(())
    }
}

impl LLMConfig {
    /// 使用某个provider的默认模型、地址和tokens上限
    pub fn for_provider(provider: LLMProvider) -> Self {
        Self {
            provider,
            api_base_url: provider.default_base_url().to_string(),
            model: provider.default_model().to_string(),
            max_tokens: provider.default_max_tokens(),
            ..Self::default()
        }
    }
}

impl WikipediaConfig {
    /// 实际请求的API地址
    pub fn endpoint(&self) -> String {
        match &self.api_base_url {
            Some(url) if !url.trim().is_empty() => url.clone(),
            _ => format!("https://{}.wikipedia.org/w/api.php", self.language),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("./reports"),
            save_report: true,
            verbose: false,
            llm: LLMConfig::default(),
            wikipedia: WikipediaConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        let provider = LLMProvider::default();
        Self {
            provider,
            api_key: std::env::var(API_KEY_ENV).unwrap_or_default(),
            api_base_url: provider.default_base_url().to_string(),
            model: provider.default_model().to_string(),
            max_tokens: provider.default_max_tokens(),
            temperature: 0.2,
            retry_attempts: 2,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            language: String::from("en"),
            api_base_url: None,
            max_results: 12,
            expansion_max_results: 20,
            content_chars_max: 4000,
            timeout_seconds: 30,
            user_agent: format!("market-brief/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_input_chars: 3,
            max_selected_sources: 5,
            figure_prefix_chars: 1500,
            context_prefix_chars: 1500,
            report_word_cap: 500,
            max_parallels: 1,
        }
    }
}
