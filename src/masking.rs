//! Length masking for variable-length batches.
//!
//! Once a sample's timestep index reaches its valid length, the state the
//! cell computed for that row is discarded and the previous state is carried
//! forward unchanged, so the final state of every sample is the state at its
//! own last valid step.

use ndarray::{Array1, Array2, Axis, Zip};

use crate::error::{Result, RnnError};

/// Length vector used when the caller gives none: every sample spans `max_time` steps.
pub fn full_lengths(max_time: usize, batch_size: usize) -> Vec<usize> {
    vec![max_time; batch_size]
}

/// Per-sample validity at timestep `t`, broadcast across a `width`-wide state.
pub fn time_mask(t: usize, lengths: &[usize], width: usize) -> Array2<bool> {
    let valid: Array1<bool> = lengths.iter().map(|&len| t < len).collect();
    let column = valid.insert_axis(Axis(1));
    let mut mask = Array2::from_elem((lengths.len(), width), false);
    mask.assign(&column);
    mask
}

fn select(mask: &Array2<bool>, next: &Array2<f64>, prev: &Array2<f64>) -> Array2<f64> {
    Zip::from(mask)
        .and(next)
        .and(prev)
        .map_collect(|&keep, &n, &p| if keep { n } else { p })
}

/// Keeps `(h_next, c_next)` for samples with `t < lengths[b]` and `(h_prev, c_prev)` otherwise.
pub fn mask_time(
    t: usize,
    lengths: &[usize],
    h_next: &Array2<f64>,
    c_next: &Array2<f64>,
    h_prev: &Array2<f64>,
    c_prev: &Array2<f64>,
) -> Result<(Array2<f64>, Array2<f64>)> {
    for (what, other) in [("h_prev", h_prev), ("c_next", c_next), ("c_prev", c_prev)] {
        if other.shape() != h_next.shape() {
            return Err(RnnError::shape(what, h_next.shape(), other.shape()));
        }
    }
    if lengths.len() != h_next.nrows() {
        return Err(RnnError::shape("length", &[h_next.nrows()], &[lengths.len()]));
    }

    let mask = time_mask(t, lengths, h_next.ncols());
    Ok((select(&mask, h_next, h_prev), select(&mask, c_next, c_prev)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_mask_keeps_rows_before_length() {
        let h_next = arr2(&[[1.0, 1.0], [2.0, 2.0], [3.0, 3.0]]);
        let c_next = arr2(&[[10.0, 10.0], [20.0, 20.0], [30.0, 30.0]]);
        let h_prev = arr2(&[[-1.0, -1.0], [-2.0, -2.0], [-3.0, -3.0]]);
        let c_prev = arr2(&[[-10.0, -10.0], [-20.0, -20.0], [-30.0, -30.0]]);

        let (h, c) = mask_time(1, &[1, 2, 0], &h_next, &c_next, &h_prev, &c_prev).unwrap();

        assert_eq!(h, arr2(&[[-1.0, -1.0], [2.0, 2.0], [-3.0, -3.0]]));
        assert_eq!(c, arr2(&[[-10.0, -10.0], [20.0, 20.0], [-30.0, -30.0]]));
    }

    #[test]
    fn test_full_lengths_is_noop() {
        let h_next = arr2(&[[0.1, 0.2], [0.3, 0.4]]);
        let c_next = arr2(&[[0.5, 0.6], [0.7, 0.8]]);
        let zeros = Array2::zeros((2, 2));

        for t in 0..4 {
            let (h, c) = mask_time(t, &full_lengths(4, 2), &h_next, &c_next, &zeros, &zeros).unwrap();
            assert_eq!(h, h_next);
            assert_eq!(c, c_next);
        }
    }

    #[test]
    fn test_time_mask_broadcasts_across_width() {
        let mask = time_mask(2, &[3, 2], 4);
        assert_eq!(mask.shape(), &[2, 4]);
        assert!(mask.row(0).iter().all(|&m| m));
        assert!(mask.row(1).iter().all(|&m| !m));
    }

    #[test]
    fn test_wrong_length_width() {
        let state = Array2::zeros((2, 3));
        let err = mask_time(0, &[1, 1, 1], &state, &state, &state, &state).unwrap_err();
        assert!(matches!(err, RnnError::ShapeMismatch { what: "length", .. }));
    }
}
