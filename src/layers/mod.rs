//! Recurrent cells and the dropout used between stacked layers.
use ndarray::Array2;
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::Uniform;

pub mod dropout;
pub mod lstm_cell;
pub mod ran_cell;
pub mod top_down_lstm_cell;

/// Draws a `dim`-shaped matrix from U(-1/√hidden_size, 1/√hidden_size).
pub(crate) fn uniform_init<R: Rng + ?Sized>(dim: (usize, usize), hidden_size: usize, rng: &mut R) -> Array2<f64> {
    let stdv = 1.0 / (hidden_size as f64).sqrt();
    Array2::random_using(dim, Uniform::new_inclusive(-stdv, stdv), rng)
}
