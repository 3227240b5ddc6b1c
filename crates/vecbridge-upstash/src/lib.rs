//! Upstash Vector integration for Vecbridge.
//!
//! This crate provides [`UpstashVector`], an implementation of the
//! [`VectorStore`](vecbridge_core::VectorStore) trait backed by
//! [Upstash Vector](https://upstash.com/docs/vector). The store talks to the
//! backend through the [`VectorIndex`] trait: [`HttpIndex`] for the REST API,
//! [`InMemoryIndex`] for tests and local runs.
//!
//! # Example
//!
//! ```rust,no_run
//! use vecbridge_upstash::{UpstashVector, UpstashVectorConfig};
//! use vecbridge_core::{Document, SearchOptions, VectorStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = UpstashVectorConfig::from_env()?;
//! let store = UpstashVector::new("Vector_index_demo_Node", config);
//!
//! store
//!     .create(vec![Document::with_id("a", "alpha")], vec![vec![1.0, 0.0]])
//!     .await?;
//! let hits = store
//!     .search_by_vector(&[1.0, 0.0], SearchOptions::new().with_top_k(2))
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod factory;
mod http;
mod index;
mod memory;
mod vector_store;

pub use config::{UpstashVectorConfig, TOKEN_ENV, URL_ENV};
pub use factory::UpstashVectorFactory;
pub use http::HttpIndex;
pub use index::{
    IndexRecord, MetadataFilter, QueryRequest, ScoredRecord, VectorIndex, MAX_FILTER_QUERY_TOP_K,
};
pub use memory::InMemoryIndex;
pub use vector_store::UpstashVector;

// Re-export core traits for convenience.
pub use vecbridge_core::{Document, SearchOptions, VectorFactory, VectorStore};
