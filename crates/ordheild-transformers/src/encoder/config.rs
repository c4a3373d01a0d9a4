//! Encoder construction options.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Options describing how the external wordpiece encoder should be built.
///
/// These are carried for whoever constructs the encoder; none of them change
/// the pooling math. The two option maps pass through opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Identifier of the external encoder (a model repo name, typically).
    pub model_name: String,
    /// Fold inputs longer than this many wordpieces inside the encoder.
    pub max_length: Option<usize>,
    /// Whether encoder parameters update during training.
    pub train_parameters: bool,
    /// Use only the last hidden layer rather than a learned layer mix.
    pub last_layer_only: bool,
    /// Trade compute for memory in the encoder's backward pass.
    pub gradient_checkpointing: Option<bool>,
    /// Opaque options for the tokenizer behind the encoder.
    #[serde(alias = "tokenizer_kwargs")]
    pub tokenizer_options: Map<String, Value>,
    /// Opaque options for the transformer behind the encoder.
    #[serde(alias = "transformer_kwargs")]
    pub transformer_options: Map<String, Value>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            model_name: String::new(),
            max_length: None,
            train_parameters: true,
            last_layer_only: true,
            gradient_checkpointing: None,
            tokenizer_options: Map::new(),
            transformer_options: Map::new(),
        }
    }
}

impl EncoderConfig {
    /// Create a config for the named encoder with default options.
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            ..Default::default()
        }
    }

    // Builder methods
    pub fn with_max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    pub fn with_train_parameters(mut self, train: bool) -> Self {
        self.train_parameters = train;
        self
    }

    pub fn with_last_layer_only(mut self, last: bool) -> Self {
        self.last_layer_only = last;
        self
    }

    pub fn with_gradient_checkpointing(mut self, enabled: bool) -> Self {
        self.gradient_checkpointing = Some(enabled);
        self
    }

    pub fn with_tokenizer_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.tokenizer_options.insert(key.into(), value);
        self
    }

    pub fn with_transformer_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.transformer_options.insert(key.into(), value);
        self
    }
}
