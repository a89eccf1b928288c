use ndarray::{Array2, Array3, Axis};
use rand::Rng;

use crate::config::RnnConfig;
use crate::error::Result;
use crate::layers::dropout::Dropout;
use crate::layers::ran_cell::RANCell;
use crate::masking::mask_time;
use crate::models::{initial_state, output_layout, resolve_lengths, stack_steps, time_major, SequenceOutput};

/// Multi-layer Recurrent Additive Network.
///
/// Layers run one after another: layer `l` is unrolled over the whole
/// sequence before layer `l + 1` starts, consuming the (dropped-out) output
/// sequence of layer `l`. The same length vector masks every layer.
#[derive(Clone, Debug)]
pub struct RAN {
    cells: Vec<RANCell>,
    dropout_layer: Dropout,
    config: RnnConfig,
}

impl RAN {
    pub fn new(config: RnnConfig) -> Result<Self> {
        Self::with_rng(config, &mut rand::thread_rng())
    }

    /// Creates the network drawing every cell's parameters from `rng`.
    ///
    /// First layer accepts `input_size` features, subsequent layers accept
    /// `hidden_size` features from the layer below.
    pub fn with_rng<R: Rng + ?Sized>(config: RnnConfig, rng: &mut R) -> Result<Self> {
        config.validate(1)?;
        let cells: Vec<RANCell> = (0..config.num_layers)
            .map(|layer| {
                let layer_input_size = if layer == 0 { config.input_size } else { config.hidden_size };
                RANCell::with_rng(layer_input_size, config.hidden_size, config.use_bias, &mut *rng)
                    .with_layernorm(config.layernorm)
            })
            .collect();
        let dropout_layer = Dropout::new(config.dropout)?;

        Ok(RAN { cells, dropout_layer, config })
    }

    /// Configuration the network was built from.
    pub fn config(&self) -> &RnnConfig {
        &self.config
    }

    /// Switches between `(batch, time, features)` and `(time, batch, features)` sequences.
    pub fn set_batch_first(&mut self, batch_first: bool) {
        self.config.batch_first = batch_first;
    }

    pub fn cell(&self, layer: usize) -> Option<&RANCell> {
        self.cells.get(layer)
    }

    pub fn cells(&self) -> &[RANCell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [RANCell] {
        &mut self.cells
    }

    pub fn num_layers(&self) -> usize {
        self.cells.len()
    }

    pub fn reset_parameters<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for cell in &mut self.cells {
            cell.reset_parameters(rng);
        }
    }

    /// Enables dropout between layers
    pub fn train(&mut self) {
        self.dropout_layer.train();
    }

    /// Disables dropout between layers
    pub fn eval(&mut self) {
        self.dropout_layer.eval();
    }

    /// Unrolls one cell over a time-major sequence, freezing samples past their length.
    fn forward_rnn(
        cell: &RANCell,
        input: &Array3<f64>,
        h0: Array2<f64>,
        c0: Array2<f64>,
        lengths: &[usize],
    ) -> Result<(Array3<f64>, (Array2<f64>, Array2<f64>))> {
        let (batch_size, hidden_size) = h0.dim();
        let mut hx = h0;
        let mut cx = c0;
        let mut output = Vec::with_capacity(input.len_of(Axis(0)));

        for (time, step_input) in input.outer_iter().enumerate() {
            let (h_next, c_next) = cell.forward(&step_input, &hx, &cx);
            let (h_next, c_next) = mask_time(time, lengths, &h_next, &c_next, &hx, &cx)?;
            output.push(h_next.clone());
            hx = h_next;
            cx = c_next;
        }

        let output = stack_steps(&output, batch_size, hidden_size)?;
        Ok((output, (hx, cx)))
    }

    /// Runs the full stack over `input`. See [`crate::models`] for the layout contract.
    pub fn forward(
        &self,
        input: &Array3<f64>,
        hx: Option<(&Array3<f64>, &Array3<f64>)>,
        lengths: Option<&[usize]>,
    ) -> Result<SequenceOutput> {
        self.forward_using(input, hx, lengths, &mut rand::thread_rng())
    }

    /// Same as [`RAN::forward`], drawing dropout masks from `rng`.
    pub fn forward_using<R: Rng + ?Sized>(
        &self,
        input: &Array3<f64>,
        hx: Option<(&Array3<f64>, &Array3<f64>)>,
        lengths: Option<&[usize]>,
        rng: &mut R,
    ) -> Result<SequenceOutput> {
        let config = &self.config;
        let mut layer_input = time_major(input, config.batch_first, config.input_size)?;
        let (max_time, batch_size, _) = layer_input.dim();
        let lengths = resolve_lengths(lengths, max_time, batch_size)?;
        let (h0, c0) = initial_state(hx, self.num_layers(), batch_size, config.hidden_size)?;

        tracing::trace!(max_time, batch_size, num_layers = self.num_layers(), "RAN forward");

        let mut h_n = Vec::with_capacity(self.num_layers());
        let mut c_n = Vec::with_capacity(self.num_layers());
        let mut layer_output = Array3::zeros((max_time, batch_size, config.hidden_size));

        for (layer, ((cell, h0), c0)) in self.cells.iter().zip(h0).zip(c0).enumerate() {
            let (output, (layer_h_n, layer_c_n)) = Self::forward_rnn(cell, &layer_input, h0, c0, &lengths)?;

            // No dropout on the last layer's output
            if layer + 1 < self.num_layers() {
                layer_input = self.dropout_layer.forward_using(&output, rng);
            }
            layer_output = output;
            h_n.push(layer_h_n);
            c_n.push(layer_c_n);
        }

        let h_n = stack_steps(&h_n, batch_size, config.hidden_size)?;
        let c_n = stack_steps(&c_n, batch_size, config.hidden_size)?;
        Ok((output_layout(layer_output, config.batch_first), (h_n, c_n)))
    }
}
