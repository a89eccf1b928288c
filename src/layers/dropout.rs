use ndarray::{Array, Dimension};
use rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;

use crate::error::{Result, RnnError};

/// Inverted dropout applied between stacked recurrent layers.
///
/// Keeps each element with probability `1 - dropout_rate` and scales survivors
/// by `1 / (1 - dropout_rate)`. Evaluation mode and a zero rate both make
/// `forward` the identity; a rate of one zeroes everything.
#[derive(Clone, Debug)]
pub struct Dropout {
    pub dropout_rate: f64,
    pub is_training: bool,
}

impl Dropout {
    pub fn new(dropout_rate: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&dropout_rate) {
            return Err(RnnError::Config(format!(
                "dropout rate must be in [0, 1], got {}",
                dropout_rate
            )));
        }
        Ok(Dropout {
            dropout_rate,
            is_training: true,
        })
    }

    pub fn train(&mut self) {
        self.is_training = true;
    }

    pub fn eval(&mut self) {
        self.is_training = false;
    }

    fn is_active(&self) -> bool {
        self.is_training && self.dropout_rate > 0.0
    }

    pub fn forward<D: Dimension>(&self, input: &Array<f64, D>) -> Array<f64, D> {
        self.forward_using(input, &mut rand::thread_rng())
    }

    pub fn forward_using<D, R>(&self, input: &Array<f64, D>, rng: &mut R) -> Array<f64, D>
    where
        D: Dimension,
        R: Rng + ?Sized,
    {
        if !self.is_active() {
            return input.clone();
        }

        let keep_prob = 1.0 - self.dropout_rate;
        if keep_prob <= 0.0 {
            return Array::zeros(input.raw_dim());
        }
        let mask = Array::random_using(input.raw_dim(), Uniform::new(0.0, 1.0), rng)
            .mapv(|x| if x < keep_prob { 1.0 } else { 0.0 });

        input * &mask / keep_prob
    }
}
