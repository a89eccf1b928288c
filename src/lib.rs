//! # Top-Down RNN
//!
//! Recurrent Additive Network (RAN) and Top-Down LSTM cells, with drivers that
//! unroll them over batched, variable-length sequences.
//!
//! ## Core Components
//!
//! - **Cells**: [`RANCell`], [`TopDownLSTMCell`] and the bottom-only [`LSTMCell`];
//!   each is a pure `(h, c) -> (h, c)` step holding only parameters
//! - **Masking**: samples whose sequence has ended keep their last valid state
//! - **Drivers**: [`RAN`] unrolls layer by layer, [`TopDownLSTM`] unrolls the
//!   whole stack timestep by timestep so each layer sees the layer above at `t - 1`
//! - **Configuration**: [`RnnConfig`], loadable from JSON
//!
//! ## Quick Start
//!
//! ```rust
//! use ndarray::Array3;
//! use topdown_rnn::{RnnConfig, TopDownLSTM};
//!
//! // 3-layer stack with 10 input features and 20 hidden units
//! let config = RnnConfig::new(10, 20).with_num_layers(3);
//! let network = TopDownLSTM::new(config).unwrap();
//!
//! // (time, batch, features)
//! let input = Array3::zeros((5, 2, 10));
//! let (output, (h_n, c_n)) = network.forward(&input, None, Some(&[5, 3][..])).unwrap();
//!
//! assert_eq!(output.shape(), &[5, 2, 20]);
//! assert_eq!(h_n.shape(), &[3, 2, 20]);
//! assert_eq!(c_n.shape(), &[3, 2, 20]);
//! ```

pub mod config;
pub mod error;
pub mod layers;
pub mod masking;
pub mod models;
pub mod utils;

// Re-export commonly used items
pub use config::RnnConfig;
pub use error::{Result, RnnError};
pub use layers::dropout::Dropout;
pub use layers::lstm_cell::LSTMCell;
pub use layers::ran_cell::RANCell;
pub use layers::top_down_lstm_cell::TopDownLSTMCell;
pub use masking::mask_time;
pub use models::ran::RAN;
pub use models::top_down_lstm::{LayerRole, StackCell, StackLayer, TopDownLSTM};
pub use models::{LayerStates, SequenceOutput};

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_library_integration() {
        let ran = RAN::new(RnnConfig::new(2, 3).with_num_layers(2)).unwrap();
        let top_down = TopDownLSTM::new(RnnConfig::new(2, 3).with_num_layers(2)).unwrap();
        let input = Array3::from_elem((4, 1, 2), 0.5);

        let (ran_out, _) = ran.forward(&input, None, None).unwrap();
        let (td_out, _) = top_down.forward(&input, None, None).unwrap();

        assert_eq!(ran_out.shape(), &[4, 1, 3]);
        assert_eq!(td_out.shape(), &[4, 1, 3]);
    }
}
