//! Core building blocks for word-level transformer embeddings
//!
//! This crate provides span selection and sub-token pooling over wordpiece
//! embeddings, plus the trait seam to the encoder that produces them. The
//! high-level API lives in the `ordheild` crate.

pub mod encoder;
pub mod pooling;
pub mod spans;

// Re-export commonly used items
pub use crate::{
    encoder::{EncoderConfig, WordpieceEncoder},
    pooling::{first_pool, mean_pool, pool_spans, SubTokenMode},
    spans::{batched_span_select, max_span_width},
};

pub mod prelude {
    pub use crate::encoder::{EncoderConfig, WordpieceEncoder};
    pub use crate::pooling::{pool_spans, SubTokenMode};
}
