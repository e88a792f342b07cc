//! Data models for Newsdesk

pub mod article;
pub mod source;

// Re-export commonly used types
pub use article::{Article, NewArticle};
pub use source::{Source, SourceConfig, SourceKind};
