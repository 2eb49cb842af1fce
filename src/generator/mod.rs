pub mod citations;
pub mod context;
pub mod outlet;
pub mod parser;
pub mod stages;
pub mod types;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_support;
