//! Oracle抽象 - 流水线只依赖"给定prompt，返回文本"这一能力

use anyhow::Result;
use async_trait::async_trait;

/// 外部文本生成服务。
///
/// 实现方需要自行处理重试等细节，流水线不对返回内容的格式做任何假设，
/// 解析工作交由各阶段的 [`ResponseParser`](crate::generator::parser::ResponseParser) 完成。
#[async_trait]
pub trait Oracle: Send + Sync {
    /// 发送prompt并返回模型的完整文本回复
    async fn invoke(&self, prompt: &str) -> Result<String>;
}
