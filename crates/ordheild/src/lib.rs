//! ordheild - word-level embeddings from wordpiece transformers
//!
//! This crate provides a high-level API for collapsing the wordpiece
//! embeddings produced by a transformer encoder into one embedding per
//! original word, using the tokenizer's word-to-wordpiece offsets.

pub mod embedder;

// Re-export main API
pub use embedder::{WordEmbedder, WordEmbedderBuilder, WordEmbedderError, WordEmbedderResult};

// Re-export core types
pub use ordheild_transformers::{
    batched_span_select, first_pool, max_span_width, mean_pool, pool_spans, EncoderConfig,
    SubTokenMode, WordpieceEncoder,
};

// Prelude
pub mod prelude {
    pub use crate::embedder::{WordEmbedder, WordEmbedderBuilder, WordEmbedderError};
    pub use ordheild_transformers::prelude::*;
}

// ============================================================================
// Version Info
// ============================================================================

/// Get the ordheild version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
