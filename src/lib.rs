pub mod cli;
pub mod config;
pub mod generator;
pub mod llm;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use generator::context::GeneratorContext;
pub use generator::types::{Briefing, BriefingOutcome};
pub use generator::workflow::{launch, run_pipeline};
pub use llm::{Oracle, OracleFactory};
pub use sources::{Document, DocumentSource};
