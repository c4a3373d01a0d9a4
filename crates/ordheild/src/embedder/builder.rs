//! Builder pattern for WordEmbedder configuration.

use std::sync::Arc;

use serde_json::Value;

use ordheild_transformers::{EncoderConfig, SubTokenMode, WordpieceEncoder};

use super::model::WordEmbedder;
use super::types::WordEmbedderResult;

/// Builder for configuring and constructing a WordEmbedder.
pub struct WordEmbedderBuilder {
    // Encoder and its construction options
    pub(crate) encoder: Arc<dyn WordpieceEncoder>,
    pub(crate) config: EncoderConfig,

    // Aggregation behavior
    pub(crate) sub_token_mode: SubTokenMode,
    pub(crate) sub_token_mode_raw: Option<String>,
}

impl WordEmbedderBuilder {
    /// Create a new builder for the named encoder.
    pub fn new(model_name: impl Into<String>, encoder: Arc<dyn WordpieceEncoder>) -> Self {
        Self {
            encoder,
            config: EncoderConfig::new(model_name),
            sub_token_mode: SubTokenMode::default(),
            sub_token_mode_raw: None,
        }
    }

    /// Fold inputs longer than this many wordpieces inside the encoder.
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.config.max_length = Some(max_length);
        self
    }

    /// Set whether encoder parameters update during training.
    pub fn train_parameters(mut self, train: bool) -> Self {
        self.config.train_parameters = train;
        self
    }

    /// Use only the encoder's last hidden layer.
    pub fn last_layer_only(mut self, last: bool) -> Self {
        self.config.last_layer_only = last;
        self
    }

    /// Enable gradient checkpointing in the encoder.
    pub fn gradient_checkpointing(mut self, enabled: bool) -> Self {
        self.config.gradient_checkpointing = Some(enabled);
        self
    }

    /// Add an opaque tokenizer option passed through to the encoder.
    pub fn tokenizer_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.tokenizer_options.insert(key.into(), value);
        self
    }

    /// Add an opaque transformer option passed through to the encoder.
    pub fn transformer_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.transformer_options.insert(key.into(), value);
        self
    }

    /// Replace the full encoder configuration.
    pub fn encoder_config(mut self, config: EncoderConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the sub-token combination mode.
    pub fn sub_token_mode(mut self, mode: SubTokenMode) -> Self {
        self.sub_token_mode = mode;
        self.sub_token_mode_raw = None;
        self
    }

    /// Set the sub-token combination mode by name.
    ///
    /// The name is resolved in [`build`](Self::build); an unknown name fails
    /// there with `InvalidConfig`.
    pub fn sub_token_mode_str(mut self, mode: impl Into<String>) -> Self {
        self.sub_token_mode_raw = Some(mode.into());
        self
    }

    /// Build the WordEmbedder.
    pub fn build(self) -> WordEmbedderResult<WordEmbedder> {
        WordEmbedder::from_builder(self)
    }
}

impl WordEmbedder {
    /// Create a builder for the named encoder.
    pub fn builder(
        model_name: impl Into<String>,
        encoder: Arc<dyn WordpieceEncoder>,
    ) -> WordEmbedderBuilder {
        WordEmbedderBuilder::new(model_name, encoder)
    }
}
