//! Batched span selection over wordpiece embeddings.

use anyhow::{anyhow, Result};
use ndarray::{s, Array3, Array4, Axis};
use rayon::prelude::*;

/// Gathers each original token's sub-word span from a wordpiece embedding tensor.
///
/// Every original token is described by an inclusive `[start, end]` pair of
/// wordpiece indices. The output is rectangular: spans are padded out to the
/// widest span in the batch, with a mask marking which positions hold real
/// sub-tokens.
///
/// # Arguments
/// * `embeddings` - Wordpiece embeddings `[batch_size, num_wordpieces, embedding_size]`
/// * `offsets` - Inclusive span offsets `[batch_size, num_orig_tokens, 2]`
///
/// # Returns
/// * Span embeddings `[batch_size, num_orig_tokens, max_span_width, embedding_size]`
/// * Span mask `[batch_size, num_orig_tokens, max_span_width]` (1.0 = real sub-token)
///
/// A span with `end < start` (the `[0, -1]` padding sentinel) selects nothing:
/// its rows stay zero and its mask row stays 0.0. Positions falling outside
/// the wordpiece sequence are likewise left masked out.
pub fn batched_span_select(
    embeddings: &Array3<f32>,
    offsets: &Array3<i64>,
) -> Result<(Array4<f32>, Array3<f32>)> {
    let (batch_size, num_wordpieces, embedding_size) = embeddings.dim();
    let (offsets_batch, num_tokens, pair) = offsets.dim();

    if offsets_batch != batch_size {
        return Err(anyhow!(
            "Offsets batch size {} doesn't match embeddings batch size {}",
            offsets_batch,
            batch_size
        ));
    }
    if pair != 2 {
        return Err(anyhow!(
            "Offsets last dimension must be 2 (inclusive [start, end]), got {}",
            pair
        ));
    }

    let max_width = max_span_width(offsets);

    let mut span_embeddings =
        Array4::<f32>::zeros((batch_size, num_tokens, max_width, embedding_size));
    let mut span_mask = Array3::<f32>::zeros((batch_size, num_tokens, max_width));

    span_embeddings
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .zip(span_mask.axis_iter_mut(Axis(0)))
        .zip(embeddings.axis_iter(Axis(0)))
        .zip(offsets.axis_iter(Axis(0)))
        .for_each(|(((mut gathered, mut mask), emb), spans)| {
            for t in 0..num_tokens {
                let start = spans[[t, 0]];
                let end = spans[[t, 1]];
                for k in 0..max_width {
                    let idx = start + k as i64;
                    if idx <= end && idx >= 0 && (idx as usize) < num_wordpieces {
                        gathered
                            .slice_mut(s![t, k, ..])
                            .assign(&emb.row(idx as usize));
                        mask[[t, k]] = 1.0;
                    }
                }
            }
        });

    Ok((span_embeddings, span_mask))
}

/// Widest span in the batch, in wordpieces.
///
/// Sentinel spans with `end < start` count as width 0, so a batch made up
/// entirely of padding yields 0.
pub fn max_span_width(offsets: &Array3<i64>) -> usize {
    let starts = offsets.slice(s![.., .., 0]);
    let ends = offsets.slice(s![.., .., 1]);

    starts
        .iter()
        .zip(ends.iter())
        .map(|(&start, &end)| (end - start + 1).max(0) as usize)
        .fold(0, usize::max)
}
