//! Core WordEmbedder implementation.

use std::sync::Arc;

use ndarray::{Array2, Array3};

use ordheild_transformers::{pool_spans, EncoderConfig, SubTokenMode, WordpieceEncoder};

use super::builder::WordEmbedderBuilder;
use super::types::{WordEmbedderError, WordEmbedderResult};
use super::validation::validate_config;

/// Word-level embedder over a wordpiece transformer encoder.
///
/// The encoder sees wordpieces; downstream layers want one vector per
/// original token. This embedder runs the encoder, then pools each token's
/// sub-word span back into a single embedding.
pub struct WordEmbedder {
    /// The external encoder.
    encoder: Arc<dyn WordpieceEncoder>,

    /// Encoder construction options.
    config: EncoderConfig,

    /// How sub-token embeddings are combined.
    sub_token_mode: SubTokenMode,
}

impl WordEmbedder {
    /// Create a WordEmbedder with default settings.
    pub fn new(
        model_name: impl Into<String>,
        encoder: Arc<dyn WordpieceEncoder>,
    ) -> WordEmbedderResult<Self> {
        Self::builder(model_name, encoder).build()
    }

    /// Internal: construct from builder.
    pub(crate) fn from_builder(builder: WordEmbedderBuilder) -> WordEmbedderResult<Self> {
        // 1. Resolve the sub-token mode
        let sub_token_mode = match &builder.sub_token_mode_raw {
            Some(raw) => raw
                .parse::<SubTokenMode>()
                .map_err(WordEmbedderError::InvalidConfig)?,
            None => builder.sub_token_mode,
        };

        // 2. Validate the encoder options
        validate_config(&builder.config)?;

        log::debug!(
            "WordEmbedder ready: model={}, sub_token_mode={}, dim={}",
            builder.config.model_name,
            sub_token_mode,
            builder.encoder.output_dim()
        );

        Ok(Self {
            encoder: builder.encoder,
            config: builder.config,
            sub_token_mode,
        })
    }

    // =========================================================================
    // Embedding Methods
    // =========================================================================

    /// Embed a wordpiece batch and pool it back to one vector per original token.
    ///
    /// The encoder inputs pass through unmodified; pooling then follows the
    /// configured sub-token mode. Padding tokens and empty spans come out as
    /// zero vectors.
    ///
    /// # Arguments
    /// * `token_ids` - Wordpiece IDs `[batch_size, num_wordpieces]`
    /// * `mask` - Original-token mask `[batch_size, num_orig_tokens]`
    /// * `offsets` - Inclusive wordpiece span per original token `[batch_size, num_orig_tokens, 2]`
    /// * `wordpiece_mask` - Wordpiece attention mask `[batch_size, num_wordpieces]`
    /// * `type_ids` - Optional segment IDs `[batch_size, num_wordpieces]`
    /// * `segment_concat_mask` - Optional mask over the encoder's folded segment layout
    ///
    /// # Returns
    /// Word embeddings `[batch_size, num_orig_tokens, embedding_size]`
    pub fn forward(
        &self,
        token_ids: &Array2<u32>,
        mask: &Array2<f32>,
        offsets: &Array3<i64>,
        wordpiece_mask: &Array2<f32>,
        type_ids: Option<&Array2<u32>>,
        segment_concat_mask: Option<&Array2<f32>>,
    ) -> WordEmbedderResult<Array3<f32>> {
        let wordpiece_embeddings = self
            .encoder
            .forward(token_ids, wordpiece_mask, type_ids, segment_concat_mask)
            .map_err(WordEmbedderError::EmbeddingFailed)?;

        pool_spans(&wordpiece_embeddings, mask, offsets, self.sub_token_mode)
            .map_err(WordEmbedderError::EmbeddingFailed)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the embedding dimension, as declared by the encoder.
    pub fn output_dim(&self) -> usize {
        self.encoder.output_dim()
    }

    /// Get the encoder identifier.
    pub fn model_name(&self) -> &str {
        &self.config.model_name
    }

    /// Get the sub-token combination mode.
    pub fn sub_token_mode(&self) -> SubTokenMode {
        self.sub_token_mode
    }

    /// Get the encoder construction options.
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Get the configured fold length, if any.
    pub fn max_length(&self) -> Option<usize> {
        self.config.max_length
    }
}

impl std::fmt::Debug for WordEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordEmbedder")
            .field("model", &self.config.model_name)
            .field("sub_token_mode", &self.sub_token_mode)
            .field("output_dim", &self.output_dim())
            .finish()
    }
}
