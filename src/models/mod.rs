//! Sequence drivers that unroll the recurrent cells over time and layers.
//!
//! Both drivers share the same forward contract:
//! - `input`: `(time, batch, input_size)`, or `(batch, time, input_size)` when
//!   the configuration is batch-first
//! - `hx`: optional `(h_0, c_0)`, each `(num_layers, batch, hidden_size)`;
//!   zeros when absent
//! - `lengths`: optional valid length per sample; every sample spans the full
//!   time dimension when absent
//!
//! and return `(output, (h_n, c_n))` with `output` laid out like `input` and
//! `h_n`, `c_n` shaped `(num_layers, batch, hidden_size)`.

use ndarray::{Array2, Array3, ArrayView2, Axis};

use crate::error::{Result, RnnError};
use crate::masking::full_lengths;

/// Module for the stacked Recurrent Additive Network driver.
pub mod ran;

/// Module for the Top-Down LSTM driver.
pub mod top_down_lstm;

/// Per-layer `(h, c)` stacked along the first axis.
pub type LayerStates = (Array3<f64>, Array3<f64>);

/// Driver output: the sequence of the last layer and the final per-layer states.
pub type SequenceOutput = (Array3<f64>, LayerStates);

/// Returns the input in `(time, batch, features)` layout, checking the feature width.
pub(crate) fn time_major(input: &Array3<f64>, batch_first: bool, input_size: usize) -> Result<Array3<f64>> {
    if input.len_of(Axis(2)) != input_size {
        let mut expected = input.shape().to_vec();
        expected[2] = input_size;
        return Err(RnnError::shape("input", &expected, input.shape()));
    }
    Ok(if batch_first {
        input.view().permuted_axes([1, 0, 2]).as_standard_layout().into_owned()
    } else {
        input.clone()
    })
}

/// Converts a time-major output back to the caller's layout.
pub(crate) fn output_layout(output: Array3<f64>, batch_first: bool) -> Array3<f64> {
    if batch_first {
        output.permuted_axes([1, 0, 2]).as_standard_layout().into_owned()
    } else {
        output
    }
}

pub(crate) fn resolve_lengths(lengths: Option<&[usize]>, max_time: usize, batch_size: usize) -> Result<Vec<usize>> {
    match lengths {
        Some(lengths) if lengths.len() != batch_size => {
            Err(RnnError::shape("length", &[batch_size], &[lengths.len()]))
        }
        Some(lengths) => Ok(lengths.to_vec()),
        None => Ok(full_lengths(max_time, batch_size)),
    }
}

/// Splits `(h_0, c_0)` into per-layer matrices, or builds zeros for `num_layers` layers.
pub(crate) fn initial_state(
    hx: Option<(&Array3<f64>, &Array3<f64>)>,
    num_layers: usize,
    batch_size: usize,
    hidden_size: usize,
) -> Result<(Vec<Array2<f64>>, Vec<Array2<f64>>)> {
    let expected = [num_layers, batch_size, hidden_size];
    match hx {
        Some((h0, c0)) => {
            if h0.shape() != &expected[..] {
                return Err(RnnError::shape("h_0", &expected, h0.shape()));
            }
            if c0.shape() != &expected[..] {
                return Err(RnnError::shape("c_0", &expected, c0.shape()));
            }
            let split = |state: &Array3<f64>| -> Vec<Array2<f64>> {
                state.outer_iter().map(|layer| layer.to_owned()).collect()
            };
            Ok((split(h0), split(c0)))
        }
        None => {
            let zeros = vec![Array2::zeros((batch_size, hidden_size)); num_layers];
            Ok((zeros.clone(), zeros))
        }
    }
}

/// Stacks `(batch, width)` matrices along a new leading axis.
pub(crate) fn stack_steps(steps: &[Array2<f64>], batch_size: usize, width: usize) -> Result<Array3<f64>> {
    if steps.is_empty() {
        return Ok(Array3::zeros((0, batch_size, width)));
    }
    let views: Vec<ArrayView2<f64>> = steps.iter().map(|step| step.view()).collect();
    Ok(ndarray::stack(Axis(0), &views)?)
}
