use crate::util::{InDim, OutDim};
use anyhow::Result;
use reinforced_core::error::RlError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Mlp`](super::Mlp).
pub struct MlpConfig {
    pub(super) in_dim: i64,
    pub(super) units: Vec<i64>,
    pub(super) out_dim: i64,
    pub(super) activation_out: bool,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            in_dim: 1,
            units: vec![64, 64],
            out_dim: 1,
            activation_out: false,
        }
    }
}

impl MlpConfig {
    /// Creates configuration of MLP.
    ///
    /// * `activation_out` - If `true`, activation function is added in the final layer.
    pub fn new(in_dim: i64, units: Vec<i64>, out_dim: i64, activation_out: bool) -> Self {
        Self {
            in_dim,
            units,
            out_dim,
            activation_out,
        }
    }

    /// Input dimension.
    pub fn in_dim(&self) -> i64 {
        self.in_dim
    }

    /// `(in_dim, out_dim)` of every linear layer.
    pub(super) fn layer_dims(&self) -> Vec<(usize, usize)> {
        let mut dims = vec![self.in_dim as usize];
        dims.extend(self.units.iter().map(|&u| u as usize));
        dims.push(self.out_dim as usize);
        dims.windows(2).map(|w| (w[0], w[1])).collect()
    }

    pub(super) fn validate(&self) -> Result<()> {
        if self.in_dim < 1 {
            return Err(RlError::invalid_parameter("in_dim", "must be positive").into());
        }
        if self.out_dim < 1 {
            return Err(RlError::invalid_parameter("out_dim", "must be positive").into());
        }
        if self.units.iter().any(|&u| u < 1) {
            return Err(RlError::invalid_parameter(
                "units",
                format!("every layer must have a positive width, got {:?}", self.units),
            )
            .into());
        }
        Ok(())
    }
}

impl InDim for MlpConfig {
    fn get_in_dim(&self) -> i64 {
        self.in_dim
    }
}

impl OutDim for MlpConfig {
    fn get_out_dim(&self) -> i64 {
        self.out_dim
    }

    fn set_out_dim(&mut self, out_dim: i64) {
        self.out_dim = out_dim;
    }
}
