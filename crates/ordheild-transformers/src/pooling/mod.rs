//! Sub-token pooling: one embedding per original token from wordpiece spans.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use ndarray::{s, Array2, Array3, Array4, Axis};
use serde::{Deserialize, Serialize};

use crate::spans::batched_span_select;

/// How the sub-token embeddings inside one span are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubTokenMode {
    /// Keep the first sub-token embedding of each span.
    First,
    /// Average the sub-token embeddings of each span.
    #[default]
    Avg,
}

impl SubTokenMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubTokenMode::First => "first",
            SubTokenMode::Avg => "avg",
        }
    }
}

impl fmt::Display for SubTokenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SubTokenMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first" => Ok(SubTokenMode::First),
            "avg" => Ok(SubTokenMode::Avg),
            _ => Err(format!("Unknown sub-token mode: '{}'. Use: first, avg", s)),
        }
    }
}

/// Keeps only the first sub-token embedding of each span.
///
/// Every position except the first is zeroed before summing across the span
/// axis, so the shape behavior matches [`mean_pool`]. A span whose mask row
/// is all zero (a padding sentinel) comes out as the zero vector.
pub fn first_pool(span_embeddings: &Array4<f32>, span_mask: &Array3<f32>) -> Result<Array3<f32>> {
    let (batch_size, num_tokens, max_width, _) = span_embeddings.dim();

    let mut first_mask = Array3::<f32>::zeros((batch_size, num_tokens, max_width));
    if max_width > 0 {
        first_mask
            .slice_mut(s![.., .., 0])
            .assign(&span_mask.slice(s![.., .., 0]));
    }

    let mask_expanded = first_mask.view().insert_axis(Axis(3));
    let masked = span_embeddings * &mask_expanded;

    Ok(masked.sum_axis(Axis(2)))
}

/// Averages the sub-token embeddings of each span over its real positions.
///
/// Divisors are the per-span valid counts clamped below at 1; rows whose
/// count is zero are then overwritten outright, so an empty span yields the
/// exact zero vector no matter what the gathered positions hold.
pub fn mean_pool(span_embeddings: &Array4<f32>, span_mask: &Array3<f32>) -> Result<Array3<f32>> {
    let mask_expanded = span_mask.view().insert_axis(Axis(3));
    let masked = span_embeddings * &mask_expanded;
    let sum = masked.sum_axis(Axis(2));

    let count = span_mask.sum_axis(Axis(2)).insert_axis(Axis(2));
    let count_safe = count.mapv(|x| if x == 0.0 { 1.0 } else { x });
    let mut pooled = &sum / &count_safe;

    for ((b, t), &c) in count.index_axis(Axis(2), 0).indexed_iter() {
        if c == 0.0 {
            pooled.slice_mut(s![b, t, ..]).fill(0.0);
        }
    }

    Ok(pooled)
}

/// Pools wordpiece embeddings into one embedding per original token.
///
/// The full aggregation: span gather, mode dispatch, then a multiply by the
/// original-token mask so padding rows are exactly zero even when an indexer
/// hands them a non-empty sentinel span.
///
/// # Arguments
/// * `wordpiece_embeddings` - `[batch_size, num_wordpieces, embedding_size]`
/// * `token_mask` - Original-token mask `[batch_size, num_orig_tokens]` (1.0 = real token)
/// * `offsets` - Inclusive wordpiece spans `[batch_size, num_orig_tokens, 2]`
/// * `mode` - Sub-token combination mode
///
/// # Returns
/// Word embeddings `[batch_size, num_orig_tokens, embedding_size]`
pub fn pool_spans(
    wordpiece_embeddings: &Array3<f32>,
    token_mask: &Array2<f32>,
    offsets: &Array3<i64>,
    mode: SubTokenMode,
) -> Result<Array3<f32>> {
    let batch_size = wordpiece_embeddings.shape()[0];
    let num_tokens = offsets.shape()[1];

    if token_mask.dim() != (batch_size, num_tokens) {
        return Err(anyhow!(
            "Token mask shape {:?} doesn't match expected [{}, {}]",
            token_mask.dim(),
            batch_size,
            num_tokens
        ));
    }

    let (span_embeddings, span_mask) = batched_span_select(wordpiece_embeddings, offsets)?;

    let pooled = match mode {
        SubTokenMode::First => first_pool(&span_embeddings, &span_mask)?,
        SubTokenMode::Avg => mean_pool(&span_embeddings, &span_mask)?,
    };

    let mask_expanded = token_mask.view().insert_axis(Axis(2));
    Ok(pooled * &mask_expanded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array};
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;

    // ==== SubTokenMode ====

    #[test]
    fn test_mode_default_is_avg() {
        assert_eq!(SubTokenMode::default(), SubTokenMode::Avg);
    }

    #[test]
    fn test_mode_as_str() {
        assert_eq!(SubTokenMode::First.as_str(), "first");
        assert_eq!(SubTokenMode::Avg.as_str(), "avg");
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(format!("{}", SubTokenMode::First), "first");
        assert_eq!(format!("{}", SubTokenMode::Avg), "avg");
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("first".parse::<SubTokenMode>().unwrap(), SubTokenMode::First);
        assert_eq!("avg".parse::<SubTokenMode>().unwrap(), SubTokenMode::Avg);
        assert_eq!("AVG".parse::<SubTokenMode>().unwrap(), SubTokenMode::Avg);
        assert_eq!("First".parse::<SubTokenMode>().unwrap(), SubTokenMode::First);
    }

    #[test]
    fn test_mode_from_str_invalid() {
        assert!("max".parse::<SubTokenMode>().is_err());
        assert!("".parse::<SubTokenMode>().is_err());

        let err = "max".parse::<SubTokenMode>().unwrap_err();
        assert!(err.contains("max"));
        assert!(err.contains("first, avg"));
    }

    #[test]
    fn test_mode_serde() {
        assert_eq!(serde_json::to_string(&SubTokenMode::Avg).unwrap(), "\"avg\"");
        assert_eq!(
            serde_json::from_str::<SubTokenMode>("\"first\"").unwrap(),
            SubTokenMode::First
        );
        assert!(serde_json::from_str::<SubTokenMode>("\"mean\"").is_err());
    }

    // ==== Pooling primitives ====

    #[test]
    fn test_first_pool_takes_first_position() {
        let span_embeddings = array![[[[1.0, 10.0], [2.0, 20.0]], [[3.0, 30.0], [4.0, 40.0]]]];
        let span_mask = array![[[1.0, 1.0], [1.0, 0.0]]];

        let pooled = first_pool(&span_embeddings, &span_mask).unwrap();

        assert_eq!(pooled.shape(), &[1, 2, 2]);
        assert_eq!(pooled[[0, 0, 0]], 1.0);
        assert_eq!(pooled[[0, 0, 1]], 10.0);
        assert_eq!(pooled[[0, 1, 0]], 3.0);
        assert_eq!(pooled[[0, 1, 1]], 30.0);
    }

    #[test]
    fn test_first_pool_respects_mask() {
        // Position 0 masked out: nothing is selected, not even garbage content.
        let span_embeddings = array![[[[7.0, 7.0], [8.0, 8.0]]]];
        let span_mask = array![[[0.0, 0.0]]];

        let pooled = first_pool(&span_embeddings, &span_mask).unwrap();

        assert_eq!(pooled[[0, 0, 0]], 0.0);
        assert_eq!(pooled[[0, 0, 1]], 0.0);
    }

    #[test]
    fn test_first_pool_zero_width_axis() {
        let span_embeddings = Array4::<f32>::zeros((1, 2, 0, 3));
        let span_mask = Array3::<f32>::zeros((1, 2, 0));

        let pooled = first_pool(&span_embeddings, &span_mask).unwrap();

        assert_eq!(pooled.shape(), &[1, 2, 3]);
        assert!(pooled.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_mean_pool_averages_valid_positions() {
        let span_embeddings = array![[[[1.0, 1.0], [3.0, 3.0], [5.0, 5.0]]]];
        let span_mask = array![[[1.0, 1.0, 1.0]]];

        let pooled = mean_pool(&span_embeddings, &span_mask).unwrap();

        assert_relative_eq!(pooled[[0, 0, 0]], 3.0, epsilon = 1e-6);
        assert_relative_eq!(pooled[[0, 0, 1]], 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_mean_pool_masked_out_span_ignores_contents() {
        // A fully masked span must come out exactly zero even when the
        // gathered positions hold NaN.
        let span_embeddings = array![[[[f32::NAN, f32::NAN]]]];
        let span_mask = array![[[0.0]]];

        let pooled = mean_pool(&span_embeddings, &span_mask).unwrap();

        assert_eq!(pooled[[0, 0, 0]], 0.0);
        assert_eq!(pooled[[0, 0, 1]], 0.0);
    }

    // ==== Full aggregation ====

    #[test]
    fn test_pool_spans_avg_over_whole_span() {
        let wordpieces = array![[[1.0, 1.0], [3.0, 3.0], [5.0, 5.0]]];
        let token_mask = array![[1.0]];
        let offsets = array![[[0_i64, 2]]];

        let pooled = pool_spans(&wordpieces, &token_mask, &offsets, SubTokenMode::Avg).unwrap();

        assert_eq!(pooled.shape(), &[1, 1, 2]);
        assert_relative_eq!(pooled[[0, 0, 0]], 3.0, epsilon = 1e-6);
        assert_relative_eq!(pooled[[0, 0, 1]], 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_pool_spans_first_over_whole_span() {
        let wordpieces = array![[[1.0, 1.0], [3.0, 3.0], [5.0, 5.0]]];
        let token_mask = array![[1.0]];
        let offsets = array![[[0_i64, 2]]];

        let pooled = pool_spans(&wordpieces, &token_mask, &offsets, SubTokenMode::First).unwrap();

        assert_eq!(pooled[[0, 0, 0]], 1.0);
        assert_eq!(pooled[[0, 0, 1]], 1.0);
    }

    #[test]
    fn test_pool_spans_ragged_spans() {
        let wordpieces = array![[[2.0, 0.0], [4.0, 0.0], [6.0, 0.0]]];
        let token_mask = array![[1.0, 1.0]];
        let offsets = array![[[0_i64, 0], [1, 2]]];

        let avg = pool_spans(&wordpieces, &token_mask, &offsets, SubTokenMode::Avg).unwrap();
        assert_relative_eq!(avg[[0, 0, 0]], 2.0, epsilon = 1e-6);
        assert_relative_eq!(avg[[0, 1, 0]], 5.0, epsilon = 1e-6);
        assert_relative_eq!(avg[[0, 0, 1]], 0.0, epsilon = 1e-6);
        assert_relative_eq!(avg[[0, 1, 1]], 0.0, epsilon = 1e-6);

        let first = pool_spans(&wordpieces, &token_mask, &offsets, SubTokenMode::First).unwrap();
        assert_eq!(first[[0, 0, 0]], 2.0);
        assert_eq!(first[[0, 1, 0]], 4.0);
    }

    #[test]
    fn test_pool_spans_sentinel_span_is_zero_in_both_modes() {
        let wordpieces = array![[[7.0, 8.0], [9.0, 10.0]]];
        let token_mask = array![[1.0, 1.0]];
        let offsets = array![[[0_i64, 1], [0, -1]]];

        for mode in [SubTokenMode::First, SubTokenMode::Avg] {
            let pooled = pool_spans(&wordpieces, &token_mask, &offsets, mode).unwrap();
            assert_eq!(pooled[[0, 1, 0]], 0.0);
            assert_eq!(pooled[[0, 1, 1]], 0.0);
        }
    }

    #[test]
    fn test_pool_spans_padding_rows_are_zeroed() {
        // The padding row points at a real wordpiece; the token mask still
        // forces its output to zero.
        let wordpieces = array![[[7.0, 8.0], [9.0, 10.0]]];
        let token_mask = array![[1.0, 0.0]];
        let offsets = array![[[0_i64, 1], [0, 0]]];

        for mode in [SubTokenMode::First, SubTokenMode::Avg] {
            let pooled = pool_spans(&wordpieces, &token_mask, &offsets, mode).unwrap();
            assert_eq!(pooled[[0, 1, 0]], 0.0);
            assert_eq!(pooled[[0, 1, 1]], 0.0);
        }
    }

    #[test]
    fn test_pool_spans_first_ignores_span_end() {
        let wordpieces = array![[[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]]];
        let token_mask = array![[1.0]];

        let short = array![[[1_i64, 1]]];
        let long = array![[[1_i64, 3]]];

        let pooled_short =
            pool_spans(&wordpieces, &token_mask, &short, SubTokenMode::First).unwrap();
        let pooled_long = pool_spans(&wordpieces, &token_mask, &long, SubTokenMode::First).unwrap();

        assert_eq!(pooled_short, pooled_long);
        assert_eq!(pooled_short[[0, 0, 0]], 2.0);
    }

    #[test]
    fn test_pool_spans_all_sentinel_batch() {
        let wordpieces = array![[[1.0, 2.0], [3.0, 4.0]]];
        let token_mask = array![[1.0, 1.0]];
        let offsets = array![[[0_i64, -1], [0, -1]]];

        for mode in [SubTokenMode::First, SubTokenMode::Avg] {
            let pooled = pool_spans(&wordpieces, &token_mask, &offsets, mode).unwrap();
            assert_eq!(pooled.shape(), &[1, 2, 2]);
            assert!(pooled.iter().all(|&x| x == 0.0));
        }
    }

    #[test]
    fn test_pool_spans_empty_batch() {
        let wordpieces = Array3::<f32>::zeros((0, 4, 3));
        let token_mask = Array2::<f32>::zeros((0, 2));
        let offsets = Array3::<i64>::zeros((0, 2, 2));

        let pooled = pool_spans(&wordpieces, &token_mask, &offsets, SubTokenMode::Avg).unwrap();
        assert_eq!(pooled.shape(), &[0, 2, 3]);
    }

    #[test]
    fn test_pool_spans_bad_token_mask_shape() {
        let wordpieces = array![[[1.0, 2.0], [3.0, 4.0]]];
        let token_mask = array![[1.0, 1.0, 1.0]];
        let offsets = array![[[0_i64, 0], [1, 1]]];

        assert!(pool_spans(&wordpieces, &token_mask, &offsets, SubTokenMode::Avg).is_err());
    }

    #[test]
    fn test_pool_spans_is_deterministic() {
        let wordpieces: Array3<f32> = Array::random((3, 7, 5), Uniform::new(-2.0, 2.0));
        let token_mask = Array2::<f32>::ones((3, 4));
        let offsets = array![
            [[0_i64, 1], [2, 2], [3, 5], [6, 6]],
            [[0, 0], [1, 3], [4, 4], [5, 6]],
            [[0, 2], [3, 3], [4, 5], [0, -1]]
        ];

        let a = pool_spans(&wordpieces, &token_mask, &offsets, SubTokenMode::Avg).unwrap();
        let b = pool_spans(&wordpieces, &token_mask, &offsets, SubTokenMode::Avg).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_single_wordpiece_spans_make_modes_agree() {
        let wordpieces: Array3<f32> = Array::random((2, 6, 4), Uniform::new(-1.0, 1.0));
        let token_mask = Array2::<f32>::ones((2, 6));
        let offsets = Array3::from_shape_fn((2, 6, 2), |(_, t, _)| t as i64);

        let first = pool_spans(&wordpieces, &token_mask, &offsets, SubTokenMode::First).unwrap();
        let avg = pool_spans(&wordpieces, &token_mask, &offsets, SubTokenMode::Avg).unwrap();

        assert_eq!(first, avg);
        assert_eq!(first, wordpieces);
    }

    #[test]
    fn test_pool_spans_avg_matches_manual_mean() {
        let wordpieces: Array3<f32> = Array::random((2, 6, 4), Uniform::new(-1.0, 1.0));
        let token_mask = Array2::<f32>::ones((2, 2));
        let offsets = array![[[0_i64, 1], [2, 5]], [[0, 1], [2, 5]]];

        let pooled = pool_spans(&wordpieces, &token_mask, &offsets, SubTokenMode::Avg).unwrap();

        for b in 0..2 {
            for (t, &(start, end)) in [(0_usize, 1_usize), (2, 5)].iter().enumerate() {
                let width = (end - start + 1) as f32;
                for e in 0..4 {
                    let mut expected = 0.0;
                    for w in start..=end {
                        expected += wordpieces[[b, w, e]];
                    }
                    expected /= width;
                    assert_relative_eq!(pooled[[b, t, e]], expected, epsilon = 1e-6);
                }
            }
        }
    }
}
