//! 与大模型（Oracle）交互的相关组件

pub mod client;
pub mod oracle;

pub use client::LLMClient;
pub use client::factory::OracleFactory;
pub use oracle::Oracle;
