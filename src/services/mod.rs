pub mod chunker;
pub mod llm;
pub mod translator;
