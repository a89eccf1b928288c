use std::fmt;

use ndarray::{Array1, Array2, ArrayBase, Data, Ix2};
use rand::Rng;

use crate::layers::uniform_init;
use crate::utils::{affine, sigmoid, split_gates, tanh};

/// Applies the four-gate LSTM update to a `(batch, 4*hidden_size)` pre-activation
/// laid out as [forget, input, output, candidate].
pub(crate) fn lstm_update(gates: &Array2<f64>, cx: &Array2<f64>, hidden_size: usize) -> (Array2<f64>, Array2<f64>) {
    let parts = split_gates(gates, hidden_size, 4);
    let forget_gate = parts[0].mapv(sigmoid);
    let input_gate = parts[1].mapv(sigmoid);
    let output_gate = parts[2].mapv(sigmoid);
    let cell_gate = parts[3].mapv(tanh);

    // Cell state update: f_t ⊙ c_t-1 + i_t ⊙ g_t
    let cy = &forget_gate * cx + &input_gate * &cell_gate;

    // Hidden state: o_t ⊙ tanh(c_t)
    let hy = &output_gate * &cy.mapv(tanh);

    (hy, cy)
}

/// Bottom-only LSTM cell, used as the top layer of a [`TopDownLSTM`](crate::TopDownLSTM) stack.
///
/// - [f_t, i_t, o_t, g_t] = W_ih * x_t + W_hh * h_t-1 + b
/// - c_t = σ(f_t) ⊙ c_t-1 + σ(i_t) ⊙ tanh(g_t)
/// - h_t = σ(o_t) ⊙ tanh(c_t)
#[derive(Clone, Debug)]
pub struct LSTMCell {
    pub w_ih: Array2<f64>,  // input-to-hidden weights (input_size, 4*hidden_size)
    pub w_hh: Array2<f64>,  // hidden-to-hidden weights (hidden_size, 4*hidden_size)
    pub bias: Option<Array1<f64>>,
    pub input_size: usize,
    pub hidden_size: usize,
}

impl LSTMCell {
    pub fn new(input_size: usize, hidden_size: usize, use_bias: bool) -> Self {
        Self::with_rng(input_size, hidden_size, use_bias, &mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(
        input_size: usize,
        hidden_size: usize,
        use_bias: bool,
        rng: &mut R,
    ) -> Self {
        let mut cell = LSTMCell {
            w_ih: Array2::zeros((input_size, 4 * hidden_size)),
            w_hh: Array2::zeros((hidden_size, 4 * hidden_size)),
            bias: use_bias.then(|| Array1::zeros(4 * hidden_size)),
            input_size,
            hidden_size,
        };
        cell.reset_parameters(rng);
        cell
    }

    pub fn reset_parameters<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        tracing::debug!(input_size = self.input_size, hidden_size = self.hidden_size, "init LSTMCell");
        let h = self.hidden_size;
        self.w_ih = uniform_init(self.w_ih.dim(), h, rng);
        self.w_hh = uniform_init(self.w_hh.dim(), h, rng);
        if let Some(ref mut bias) = self.bias {
            bias.fill(0.0);
        }
    }

    pub fn forward<S: Data<Elem = f64>>(
        &self,
        input: &ArrayBase<S, Ix2>,
        hx: &Array2<f64>,
        cx: &Array2<f64>,
    ) -> (Array2<f64>, Array2<f64>) {
        let gates = affine(hx, &self.w_hh, self.bias.as_ref()) + input.dot(&self.w_ih);
        lstm_update(&gates, cx, self.hidden_size)
    }
}

impl fmt::Display for LSTMCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LSTMCell({}, {})", self.input_size, self.hidden_size)
    }
}
