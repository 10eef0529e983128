pub mod embedding;
pub mod hr;
pub mod index_cache;
pub mod llm_provider;
pub mod pdf;
pub mod prompts;
pub mod session_store;
pub mod vector;
