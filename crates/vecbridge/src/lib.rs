//! Vecbridge — a pluggable vector-store contract and its backend adapters.
//!
//! This crate re-exports the Vecbridge sub-crates for single-import usage.
//! Enable features to control which backends are available.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `default` | `upstash` |
//! | `upstash` | Upstash Vector store, REST and in-memory indexes, dataset factory |
//! | `full` | All backends |
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use vecbridge::core::{Dataset, SearchOptions, VectorFactory, VectorStore};
//! use vecbridge::upstash::UpstashVectorFactory;
//! ```

/// Core types and traits: Document, SearchOptions, VectorStore, VectorFactory, VecbridgeError.
/// Always available.
pub use vecbridge_core as core;

/// Upstash Vector store, `VectorIndex` backends, and dataset factory.
#[cfg(feature = "upstash")]
pub use vecbridge_upstash as upstash;
