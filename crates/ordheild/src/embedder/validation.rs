//! Configuration validation for word embedding.

use ordheild_transformers::EncoderConfig;

use super::types::{WordEmbedderError, WordEmbedderResult};

/// Validate encoder options before constructing a WordEmbedder.
pub fn validate_config(config: &EncoderConfig) -> WordEmbedderResult<()> {
    if config.max_length == Some(0) {
        return Err(WordEmbedderError::InvalidConfig(
            "max_length must be positive when set".to_string(),
        ));
    }

    if config.gradient_checkpointing == Some(true) && !config.train_parameters {
        log::warn!(
            "gradient_checkpointing is enabled but train_parameters is false; \
             the option will have no effect"
        );
    }

    Ok(())
}
