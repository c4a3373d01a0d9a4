//! High-level word embedding API.
//!
//! Runs a wordpiece transformer encoder and pools sub-word embeddings back
//! into one embedding per original token, so sequence labelers and parsers
//! can work word-by-word on top of a wordpiece model.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use ordheild::{SubTokenMode, WordEmbedder};
//!
//! let embedder = WordEmbedder::builder("bert-base-uncased", Arc::new(encoder))
//!     .sub_token_mode(SubTokenMode::Avg)
//!     .max_length(512)
//!     .build()?;
//!
//! // One embedding per original token, zero vectors on padding.
//! let words = embedder.forward(&token_ids, &mask, &offsets, &wordpiece_mask, None, None)?;
//! ```

mod builder;
mod model;
mod types;
mod validation;

pub use builder::WordEmbedderBuilder;
pub use model::WordEmbedder;
pub use types::{WordEmbedderError, WordEmbedderResult};
