use std::fmt;

use ndarray::{Array2, Array3, ArrayView2, Axis};
use rand::Rng;

use crate::config::RnnConfig;
use crate::error::{Result, RnnError};
use crate::layers::dropout::Dropout;
use crate::layers::lstm_cell::LSTMCell;
use crate::layers::top_down_lstm_cell::TopDownLSTMCell;
use crate::masking::mask_time;
use crate::models::{initial_state, output_layout, resolve_lengths, stack_steps, time_major, SequenceOutput};

/// Position of a layer in a [`TopDownLSTM`] stack, which decides where its inputs come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerRole {
    /// Layer 0: raw input at `t` from below, layer 1 at `t - 1` from above.
    Bottom,
    /// Dropped-out layer `l - 1` at `t` from below, dropped-out layer `l + 1` at `t - 1` from above.
    Middle,
    /// Highest layer: dropped-out layer `l - 1` at `t` only. Its output is the stack's output.
    Top,
}

impl LayerRole {
    fn for_layer(layer: usize, num_layers: usize) -> Self {
        if layer == 0 {
            LayerRole::Bottom
        } else if layer + 1 == num_layers {
            LayerRole::Top
        } else {
            LayerRole::Middle
        }
    }
}

/// The two cell variants a stack can hold.
#[derive(Clone, Debug)]
pub enum StackCell {
    /// Three-way cell fed from below, from above and recurrently.
    TopDown(TopDownLSTMCell),
    /// Bottom-only cell with no top-down input.
    Plain(LSTMCell),
}

impl StackCell {
    /// Advances the cell one timestep. `top` must be present exactly for the three-way variant.
    pub fn step(
        &self,
        bottom: ArrayView2<f64>,
        top: Option<ArrayView2<f64>>,
        hx: &Array2<f64>,
        cx: &Array2<f64>,
    ) -> Result<(Array2<f64>, Array2<f64>)> {
        match (self, top) {
            (StackCell::TopDown(cell), Some(top)) => Ok(cell.forward(&bottom, &top, hx, cx)),
            (StackCell::Plain(cell), None) => Ok(cell.forward(&bottom, hx, cx)),
            (StackCell::TopDown(_), None) => {
                Err(RnnError::Config("top-down cell stepped without a top input".to_string()))
            }
            (StackCell::Plain(_), Some(_)) => {
                Err(RnnError::Config("bottom-only cell stepped with a top input".to_string()))
            }
        }
    }

    pub fn reset_parameters<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        match self {
            StackCell::TopDown(cell) => cell.reset_parameters(rng),
            StackCell::Plain(cell) => cell.reset_parameters(rng),
        }
    }

    pub fn hidden_size(&self) -> usize {
        match self {
            StackCell::TopDown(cell) => cell.hidden_size,
            StackCell::Plain(cell) => cell.hidden_size,
        }
    }
}

impl fmt::Display for StackCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackCell::TopDown(cell) => fmt::Display::fmt(cell, f),
            StackCell::Plain(cell) => fmt::Display::fmt(cell, f),
        }
    }
}

/// One layer of a [`TopDownLSTM`] stack: its cell and where it sits.
#[derive(Clone, Debug)]
pub struct StackLayer {
    pub role: LayerRole,
    pub cell: StackCell,
}

/// Stacked LSTM with top-down connections.
///
/// All layers below the top are [`TopDownLSTMCell`]s; the top layer is a plain
/// [`LSTMCell`]. The stack is unrolled timestep by timestep: at each `t` every
/// layer advances once, bottom to top, so layer `l` sees layer `l - 1` already
/// at `t` and layer `l + 1` still at `t - 1`.
#[derive(Clone, Debug)]
pub struct TopDownLSTM {
    layers: Vec<StackLayer>,
    dropout_layer: Dropout,
    config: RnnConfig,
}

impl TopDownLSTM {
    pub fn new(config: RnnConfig) -> Result<Self> {
        Self::with_rng(config, &mut rand::thread_rng())
    }

    /// Fails with [`RnnError::Config`] unless the stack has at least two layers.
    pub fn with_rng<R: Rng + ?Sized>(config: RnnConfig, rng: &mut R) -> Result<Self> {
        config.validate(2)?;
        let num_layers = config.num_layers;
        let layers: Vec<StackLayer> = (0..num_layers)
            .map(|layer| {
                let role = LayerRole::for_layer(layer, num_layers);
                let cell = match role {
                    LayerRole::Top => StackCell::Plain(LSTMCell::with_rng(
                        config.hidden_size,
                        config.hidden_size,
                        config.use_bias,
                        &mut *rng,
                    )),
                    LayerRole::Bottom | LayerRole::Middle => {
                        let layer_input_size = if layer == 0 { config.input_size } else { config.hidden_size };
                        StackCell::TopDown(TopDownLSTMCell::with_rng(
                            layer_input_size,
                            config.hidden_size,
                            config.use_bias,
                            &mut *rng,
                        ))
                    }
                };
                StackLayer { role, cell }
            })
            .collect();
        let dropout_layer = Dropout::new(config.dropout)?;

        Ok(TopDownLSTM { layers, dropout_layer, config })
    }

    pub fn config(&self) -> &RnnConfig {
        &self.config
    }

    /// Switches between `(batch, time, features)` and `(time, batch, features)` sequences.
    pub fn set_batch_first(&mut self, batch_first: bool) {
        self.config.batch_first = batch_first;
    }

    pub fn layer(&self, layer: usize) -> Option<&StackLayer> {
        self.layers.get(layer)
    }

    pub fn layers(&self) -> &[StackLayer] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [StackLayer] {
        &mut self.layers
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn reset_parameters<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for layer in &mut self.layers {
            layer.cell.reset_parameters(rng);
        }
    }

    pub fn train(&mut self) {
        self.dropout_layer.train();
    }

    pub fn eval(&mut self) {
        self.dropout_layer.eval();
    }

    /// Runs the stack over `input`; only the top layer's states form the output sequence.
    pub fn forward(
        &self,
        input: &Array3<f64>,
        hx: Option<(&Array3<f64>, &Array3<f64>)>,
        lengths: Option<&[usize]>,
    ) -> Result<SequenceOutput> {
        self.forward_using(input, hx, lengths, &mut rand::thread_rng())
    }

    /// Same as [`TopDownLSTM::forward`], drawing dropout masks from `rng`.
    pub fn forward_using<R: Rng + ?Sized>(
        &self,
        input: &Array3<f64>,
        hx: Option<(&Array3<f64>, &Array3<f64>)>,
        lengths: Option<&[usize]>,
        rng: &mut R,
    ) -> Result<SequenceOutput> {
        let config = &self.config;
        let input = time_major(input, config.batch_first, config.input_size)?;
        let (max_time, batch_size, _) = input.dim();
        let lengths = resolve_lengths(lengths, max_time, batch_size)?;
        // Per-layer state; slot l holds layer l at t once it has stepped, t - 1 before
        let (mut ht, mut c) = initial_state(hx, self.num_layers(), batch_size, config.hidden_size)?;

        tracing::trace!(max_time, batch_size, num_layers = self.num_layers(), "TopDownLSTM forward");

        let mut output = Vec::with_capacity(max_time);
        for (t, step_input) in input.axis_iter(Axis(0)).enumerate() {
            for (l, layer) in self.layers.iter().enumerate() {
                let (h_next, c_next) = match layer.role {
                    LayerRole::Bottom => {
                        layer.cell.step(step_input.view(), Some(ht[l + 1].view()), &ht[l], &c[l])?
                    }
                    LayerRole::Middle => {
                        let bottom = self.dropout_layer.forward_using(&ht[l - 1], rng);
                        let top = self.dropout_layer.forward_using(&ht[l + 1], rng);
                        layer.cell.step(bottom.view(), Some(top.view()), &ht[l], &c[l])?
                    }
                    LayerRole::Top => {
                        let bottom = self.dropout_layer.forward_using(&ht[l - 1], rng);
                        layer.cell.step(bottom.view(), None, &ht[l], &c[l])?
                    }
                };
                let (h_next, c_next) = mask_time(t, &lengths, &h_next, &c_next, &ht[l], &c[l])?;

                if layer.role == LayerRole::Top {
                    output.push(h_next.clone());
                }
                ht[l] = h_next;
                c[l] = c_next;
            }
        }

        let output = stack_steps(&output, batch_size, config.hidden_size)?;
        let h_n = stack_steps(&ht, batch_size, config.hidden_size)?;
        let c_n = stack_steps(&c, batch_size, config.hidden_size)?;
        Ok((output_layout(output, config.batch_first), (h_n, c_n)))
    }
}
