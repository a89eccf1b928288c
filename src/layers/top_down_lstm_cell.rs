use std::fmt;

use ndarray::{Array1, Array2, ArrayBase, Data, Ix2};
use rand::Rng;

use crate::layers::lstm_cell::lstm_update;
use crate::layers::uniform_init;
use crate::utils::affine;

/// LSTM cell with top-down connections (arXiv:1602.08210).
///
/// Gate pre-activations sum three sources: the layer below at the current
/// timestep, the layer above at the previous timestep and the cell's own
/// recurrent state:
/// - [f_t, i_t, o_t, g_t] = W_bh * b_t + W_th * u_t-1 + W_hh * h_t-1 + b
/// - c_t = σ(f_t) ⊙ c_t-1 + σ(i_t) ⊙ tanh(g_t)
/// - h_t = σ(o_t) ⊙ tanh(c_t)
#[derive(Clone, Debug)]
pub struct TopDownLSTMCell {
    pub w_bh: Array2<f64>,  // bottom-to-hidden (input_size, 4*hidden_size)
    pub w_th: Array2<f64>,  // top-to-hidden (hidden_size, 4*hidden_size)
    pub w_hh: Array2<f64>,  // hidden-to-hidden (hidden_size, 4*hidden_size)
    pub bias: Option<Array1<f64>>,
    pub input_size: usize,
    pub hidden_size: usize,
}

impl TopDownLSTMCell {
    pub fn new(input_size: usize, hidden_size: usize, use_bias: bool) -> Self {
        Self::with_rng(input_size, hidden_size, use_bias, &mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(
        input_size: usize,
        hidden_size: usize,
        use_bias: bool,
        rng: &mut R,
    ) -> Self {
        let mut cell = TopDownLSTMCell {
            w_bh: Array2::zeros((input_size, 4 * hidden_size)),
            w_th: Array2::zeros((hidden_size, 4 * hidden_size)),
            w_hh: Array2::zeros((hidden_size, 4 * hidden_size)),
            bias: use_bias.then(|| Array1::zeros(4 * hidden_size)),
            input_size,
            hidden_size,
        };
        cell.reset_parameters(rng);
        cell
    }

    pub fn reset_parameters<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        tracing::debug!(input_size = self.input_size, hidden_size = self.hidden_size, "init TopDownLSTMCell");
        let h = self.hidden_size;
        self.w_bh = uniform_init(self.w_bh.dim(), h, rng);
        self.w_th = uniform_init(self.w_th.dim(), h, rng);
        self.w_hh = uniform_init(self.w_hh.dim(), h, rng);
        if let Some(ref mut bias) = self.bias {
            bias.fill(0.0);
        }
    }

    /// One timestep. `input_bottom` is `(batch, input_size)`, `input_top`,
    /// `hx` and `cx` are `(batch, hidden_size)`.
    pub fn forward<S1, S2>(
        &self,
        input_bottom: &ArrayBase<S1, Ix2>,
        input_top: &ArrayBase<S2, Ix2>,
        hx: &Array2<f64>,
        cx: &Array2<f64>,
    ) -> (Array2<f64>, Array2<f64>)
    where
        S1: Data<Elem = f64>,
        S2: Data<Elem = f64>,
    {
        let gates = affine(hx, &self.w_hh, self.bias.as_ref())
            + input_bottom.dot(&self.w_bh)
            + input_top.dot(&self.w_th);
        lstm_update(&gates, cx, self.hidden_size)
    }
}

impl fmt::Display for TopDownLSTMCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TopDownLSTMCell({}, {})", self.input_size, self.hidden_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::sigmoid;
    use ndarray::arr2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_output_shape_for_any_sizes() {
        let mut rng = StdRng::seed_from_u64(11);
        for &(input_size, hidden_size) in &[(1, 1), (3, 2), (2, 7), (10, 4)] {
            let cell = TopDownLSTMCell::with_rng(input_size, hidden_size, true, &mut rng);
            let batch = 3;
            let bottom = Array2::from_elem((batch, input_size), 0.3);
            let top = Array2::from_elem((batch, hidden_size), -0.2);
            let hx = Array2::zeros((batch, hidden_size));
            let cx = Array2::zeros((batch, hidden_size));

            let (hy, cy) = cell.forward(&bottom, &top, &hx, &cx);

            assert_eq!(hy.shape(), &[batch, hidden_size]);
            assert_eq!(cy.shape(), &[batch, hidden_size]);
        }
    }

    #[test]
    fn test_matches_hand_computed_update() {
        let mut cell = TopDownLSTMCell::new(1, 1, false);
        cell.w_bh = arr2(&[[0.1, 0.2, 0.3, 0.4]]);
        cell.w_th = arr2(&[[-0.5, 0.6, -0.7, 0.8]]);
        cell.w_hh = arr2(&[[0.9, -1.0, 1.1, -1.2]]);

        let (b, u, h0, c0) = (0.5, -0.4, 0.3, 0.2);
        let (hy, cy) = cell.forward(&arr2(&[[b]]), &arr2(&[[u]]), &arr2(&[[h0]]), &arr2(&[[c0]]));

        let pre = |k: usize| cell.w_bh[[0, k]] * b + cell.w_th[[0, k]] * u + cell.w_hh[[0, k]] * h0;
        let expected_c = sigmoid(pre(0)) * c0 + sigmoid(pre(1)) * pre(3).tanh();
        let expected_h = sigmoid(pre(2)) * expected_c.tanh();

        assert!((cy[[0, 0]] - expected_c).abs() < 1e-12);
        assert!((hy[[0, 0]] - expected_h).abs() < 1e-12);
    }

    #[test]
    fn test_top_input_changes_output() {
        let cell = TopDownLSTMCell::with_rng(2, 3, true, &mut StdRng::seed_from_u64(5));
        let bottom = arr2(&[[0.5, -0.5]]);
        let hx = Array2::zeros((1, 3));
        let cx = Array2::zeros((1, 3));

        let (h_a, _) = cell.forward(&bottom, &Array2::<f64>::zeros((1, 3)), &hx, &cx);
        let (h_b, _) = cell.forward(&bottom, &Array2::from_elem((1, 3), 1.0), &hx, &cx);

        assert!(h_a.iter().zip(h_b.iter()).any(|(a, b)| (a - b).abs() > 1e-9));
    }

    #[test]
    fn test_display() {
        assert_eq!(TopDownLSTMCell::new(5, 6, true).to_string(), "TopDownLSTMCell(5, 6)");
    }
}
