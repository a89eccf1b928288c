use std::fmt;

use ndarray::{Array1, Array2, ArrayBase, Data, Ix2};
use rand::Rng;

use crate::layers::uniform_init;
use crate::utils::{affine, sigmoid, split_gates, tanh};

/// Recurrent Additive Network cell (Lee et al., 2017, eq. 1).
///
/// Unlike an LSTM there is no output gate and no candidate nonlinearity:
/// - [f_t, i_t] = W_ih * x_t + W_hh * h_t-1 + b
/// - c_t = σ(i_t) ⊙ (W_ic * x_t) + σ(f_t) ⊙ tanh(c_t-1)
/// - h_t = tanh(c_t)
///
/// The cell only holds parameters; hidden state is passed in and returned.
#[derive(Clone, Debug)]
pub struct RANCell {
    pub w_ih: Array2<f64>, // input-to-gates weights (input_size, 2*hidden_size)
    pub w_hh: Array2<f64>, // hidden-to-gates weights (hidden_size, 2*hidden_size)
    pub w_ic: Array2<f64>, // input-to-content weights (input_size, hidden_size)
    pub bias: Option<Array1<f64>>, // gate bias (2*hidden_size)
    pub input_size: usize,
    pub hidden_size: usize,
    pub layernorm: bool,
}

impl RANCell {
    pub fn new(input_size: usize, hidden_size: usize, use_bias: bool) -> Self {
        Self::with_rng(input_size, hidden_size, use_bias, &mut rand::thread_rng())
    }

    /// Creates a cell whose parameters are drawn from `rng`.
    pub fn with_rng<R: Rng + ?Sized>(
        input_size: usize,
        hidden_size: usize,
        use_bias: bool,
        rng: &mut R,
    ) -> Self {
        let mut cell = RANCell {
            w_ih: Array2::zeros((input_size, 2 * hidden_size)),
            w_hh: Array2::zeros((hidden_size, 2 * hidden_size)),
            w_ic: Array2::zeros((input_size, hidden_size)),
            bias: use_bias.then(|| Array1::zeros(2 * hidden_size)),
            input_size,
            hidden_size,
            layernorm: false,
        };
        cell.reset_parameters(rng);
        cell
    }

    pub fn with_layernorm(mut self, layernorm: bool) -> Self {
        self.layernorm = layernorm;
        self
    }

    /// Re-draws every weight from U(-1/√H, 1/√H) and zeroes the bias.
    pub fn reset_parameters<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        tracing::debug!(input_size = self.input_size, hidden_size = self.hidden_size, "init RANCell");
        let h = self.hidden_size;
        self.w_ih = uniform_init(self.w_ih.dim(), h, rng);
        self.w_hh = uniform_init(self.w_hh.dim(), h, rng);
        self.w_ic = uniform_init(self.w_ic.dim(), h, rng);
        if let Some(ref mut bias) = self.bias {
            bias.fill(0.0);
        }
    }

    /// One timestep: `(batch, input_size)` input and `(batch, hidden_size)` states
    /// in, next `(h, c)` out.
    pub fn forward<S: Data<Elem = f64>>(
        &self,
        input: &ArrayBase<S, Ix2>,
        hx: &Array2<f64>,
        cx: &Array2<f64>,
    ) -> (Array2<f64>, Array2<f64>) {
        let gates = affine(hx, &self.w_hh, self.bias.as_ref()) + input.dot(&self.w_ih);
        let content = input.dot(&self.w_ic);

        let parts = split_gates(&gates, self.hidden_size, 2);
        let forget_gate = parts[0].mapv(sigmoid);
        let input_gate = parts[1].mapv(sigmoid);

        let cy = &input_gate * &content + &forget_gate * &cx.mapv(tanh);
        let hy = cy.mapv(tanh);
        (hy, cy)
    }
}

impl fmt::Display for RANCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RANCell({}, {})", self.input_size, self.hidden_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_ran_cell_forward_shapes() {
        let input_size = 3;
        let hidden_size = 2;
        let cell = RANCell::new(input_size, hidden_size, true);

        let input = arr2(&[[0.5, 0.1, -0.3], [0.2, -0.7, 0.9]]);
        let hx = Array2::zeros((2, hidden_size));
        let cx = Array2::zeros((2, hidden_size));

        let (hy, cy) = cell.forward(&input, &hx, &cx);

        assert_eq!(hy.shape(), &[2, hidden_size]);
        assert_eq!(cy.shape(), &[2, hidden_size]);
    }

    #[test]
    fn test_zero_input_zero_state_gives_zero() {
        let cell = RANCell::with_rng(4, 3, true, &mut StdRng::seed_from_u64(1));
        let input = Array2::<f64>::zeros((5, 4));
        let hx = Array2::zeros((5, 3));
        let cx = Array2::zeros((5, 3));

        let (hy, cy) = cell.forward(&input, &hx, &cx);

        assert!(hy.iter().all(|&x| x == 0.0));
        assert!(cy.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_matches_hand_computed_update() {
        let mut cell = RANCell::new(1, 1, true);
        cell.w_ih = arr2(&[[1.0, 2.0]]);
        cell.w_hh = arr2(&[[0.5, -0.5]]);
        cell.w_ic = arr2(&[[3.0]]);
        cell.bias = Some(ndarray::arr1(&[0.1, -0.1]));

        let x = 0.4;
        let (h0, c0) = (0.2, -0.6);
        let (hy, cy) = cell.forward(&arr2(&[[x]]), &arr2(&[[h0]]), &arr2(&[[c0]]));

        let f = 1.0 * x + 0.5 * h0 + 0.1;
        let i = 2.0 * x - 0.5 * h0 - 0.1;
        let expected_c = sigmoid(i) * (3.0 * x) + sigmoid(f) * f64::tanh(c0);
        assert!((cy[[0, 0]] - expected_c).abs() < 1e-12);
        assert!((hy[[0, 0]] - expected_c.tanh()).abs() < 1e-12);
    }

    #[test]
    fn test_initialization_bounds() {
        let hidden_size = 16;
        let cell = RANCell::with_rng(8, hidden_size, true, &mut StdRng::seed_from_u64(3));
        let bound = 1.0 / (hidden_size as f64).sqrt();

        for w in [&cell.w_ih, &cell.w_hh, &cell.w_ic] {
            assert!(w.iter().all(|&x| x.abs() <= bound));
        }
        assert!(cell.bias.as_ref().unwrap().iter().all(|&x| x == 0.0));
        assert_eq!(cell.w_ih.dim(), (8, 2 * hidden_size));
        assert_eq!(cell.w_hh.dim(), (hidden_size, 2 * hidden_size));
        assert_eq!(cell.w_ic.dim(), (8, hidden_size));
    }

    #[test]
    fn test_without_bias_and_display() {
        let cell = RANCell::new(7, 4, false).with_layernorm(true);
        assert!(cell.bias.is_none());
        assert!(cell.layernorm);
        assert_eq!(cell.to_string(), "RANCell(7, 4)");
    }
}
