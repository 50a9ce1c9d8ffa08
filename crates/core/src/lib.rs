//! Core library: document ingestion, retrieval, letter generation and export.

pub mod chunker;
pub mod config;
pub mod documents;
pub mod embeddings;
pub mod error;
pub mod export;
pub mod letter;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod rag;
pub mod sections;
pub mod service;
pub mod vectorstore;

pub use error::{ServiceError, ServiceResult};
pub use service::LetterService;
