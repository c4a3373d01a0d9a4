//! Trait seam to the external wordpiece encoder.

use anyhow::Result;
use ndarray::{Array2, Array3};

/// A transformer encoder producing one embedding per wordpiece.
///
/// Implementations own everything wordpiece-level: vocabulary, padding,
/// folding of over-long inputs, layer mixing. Callers pass all inputs
/// through unmodified and trust the declared output dimension.
pub trait WordpieceEncoder: Send + Sync {
    /// Run the encoder over a padded wordpiece batch.
    ///
    /// # Arguments
    /// * `token_ids` - Wordpiece IDs `[batch_size, num_wordpieces]`
    /// * `wordpiece_mask` - Attention mask `[batch_size, num_wordpieces]`
    /// * `type_ids` - Optional segment IDs `[batch_size, num_wordpieces]`
    /// * `segment_concat_mask` - Optional mask over the folded segment layout,
    ///   for encoders that split over-long inputs internally
    ///
    /// # Returns
    /// Wordpiece embeddings `[batch_size, num_wordpieces, embedding_size]`
    fn forward(
        &self,
        token_ids: &Array2<u32>,
        wordpiece_mask: &Array2<f32>,
        type_ids: Option<&Array2<u32>>,
        segment_concat_mask: Option<&Array2<f32>>,
    ) -> Result<Array3<f32>>;

    /// Embedding size of the `forward` output.
    fn output_dim(&self) -> usize;
}
