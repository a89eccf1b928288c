//! Gate math shared by the recurrent cells.
use ndarray::{s, Array1, Array2, ArrayBase, Axis, Data, Ix2};

/// Sigmoid activation function: σ(x) = 1 / (1 + e^(-x))
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Hyperbolic tangent activation: tanh(x) = (e^x - e^(-x)) / (e^x + e^(-x))
pub fn tanh(x: f64) -> f64 {
    x.tanh()
}

/// Repeats a width-`H` vector into a `(batch, H)` matrix.
pub fn broadcast_row(v: &Array1<f64>, batch: usize) -> Array2<f64> {
    let row = v.view().insert_axis(Axis(0));
    let mut out = Array2::zeros((batch, v.len()));
    out.assign(&row);
    out
}

/// Affine transform `x·w (+ bias)` with the bias broadcast across the batch rows.
pub fn affine<S1, S2>(
    x: &ArrayBase<S1, Ix2>,
    w: &ArrayBase<S2, Ix2>,
    bias: Option<&Array1<f64>>,
) -> Array2<f64>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
{
    let projected = x.dot(w);
    match bias {
        Some(b) => projected + broadcast_row(b, x.nrows()),
        None => projected,
    }
}

/// Splits a `(batch, n * hidden_size)` gate matrix into `n` column chunks.
pub fn split_gates(gates: &Array2<f64>, hidden_size: usize, n: usize) -> Vec<Array2<f64>> {
    (0..n)
        .map(|k| gates.slice(s![.., k * hidden_size..(k + 1) * hidden_size]).to_owned())
        .collect()
}
