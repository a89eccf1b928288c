use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Result, RnnError};

fn default_num_layers() -> usize {
    1
}

fn default_use_bias() -> bool {
    true
}

/// Hyperparameters shared by the [`RAN`](crate::RAN) and
/// [`TopDownLSTM`](crate::TopDownLSTM) drivers.
///
/// Only `input_size` and `hidden_size` are required when loading from JSON;
/// every other field falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RnnConfig {
    pub input_size: usize,
    pub hidden_size: usize,
    #[serde(default = "default_num_layers")]
    pub num_layers: usize,
    #[serde(default = "default_use_bias")]
    pub use_bias: bool,
    /// Input and output sequences are `(batch, time, features)` instead of `(time, batch, features)`.
    #[serde(default)]
    pub batch_first: bool,
    /// Dropout probability applied between layers, never to the final output.
    #[serde(default)]
    pub dropout: f64,
    /// Carried on RAN cells; does not change the recurrence.
    #[serde(default)]
    pub layernorm: bool,
}

impl RnnConfig {
    pub fn new(input_size: usize, hidden_size: usize) -> Self {
        RnnConfig {
            input_size,
            hidden_size,
            num_layers: default_num_layers(),
            use_bias: default_use_bias(),
            batch_first: false,
            dropout: 0.0,
            layernorm: false,
        }
    }

    pub fn with_num_layers(mut self, num_layers: usize) -> Self {
        self.num_layers = num_layers;
        self
    }

    pub fn with_bias(mut self, use_bias: bool) -> Self {
        self.use_bias = use_bias;
        self
    }

    pub fn with_batch_first(mut self, batch_first: bool) -> Self {
        self.batch_first = batch_first;
        self
    }

    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }

    pub fn with_layernorm(mut self, layernorm: bool) -> Self {
        self.layernorm = layernorm;
        self
    }

    /// Checks sizes, dropout range and that the stack has at least `min_layers` layers.
    pub fn validate(&self, min_layers: usize) -> Result<()> {
        if self.input_size == 0 || self.hidden_size == 0 {
            return Err(RnnError::Config(format!(
                "input_size and hidden_size must be positive, got {} and {}",
                self.input_size, self.hidden_size
            )));
        }
        if self.num_layers < min_layers {
            return Err(RnnError::Config(format!(
                "Number of layers must be >= {}, got {}",
                min_layers, self.num_layers
            )));
        }
        if !(0.0..=1.0).contains(&self.dropout) {
            return Err(RnnError::Config(format!(
                "dropout must be in [0, 1], got {}",
                self.dropout
            )));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
