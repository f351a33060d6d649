//! Utilities.
use crate::opt::{OptState, OptimizerConfig};
use anyhow::Result;
use candle_core::{DType, Device, Tensor, Var};
use reinforced_core::{
    record::{Record, RecordValue},
    replay_buffer::Batch,
};
use serde::{Deserialize, Serialize};
mod named_tensors;
pub use named_tensors::NamedTensors;

/// Critic loss type.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy, Default)]
pub enum CriticLoss {
    /// Mean squared error.
    #[default]
    Mse,

    /// Smooth L1 loss.
    SmoothL1,
}

impl CriticLoss {
    /// Loss between predictions and targets, averaged over the batch.
    pub fn loss(&self, pred: &Tensor, tgt: &Tensor) -> Result<Tensor> {
        match self {
            Self::Mse => Ok(candle_nn::loss::mse(pred, tgt)?),
            Self::SmoothL1 => smooth_l1_loss(pred, tgt),
        }
    }
}

/// See <https://pytorch.org/docs/stable/generated/torch.nn.SmoothL1Loss.html>.
pub fn smooth_l1_loss(x: &Tensor, y: &Tensor) -> Result<Tensor> {
    let d = (x - y)?.abs()?;
    let m1 = d.lt(1.0)?.to_dtype(x.dtype())?;
    let m2 = m1.affine(-1.0, 1.0)?;
    let quad = (m1 * d.sqr()?.affine(0.5, 0.0)?)?;
    let lin = (m2 * d.affine(1.0, -0.5)?)?;
    Ok((quad + lin)?.mean_all()?)
}

/// Interface for handling input dimensions.
pub trait InDim {
    /// Returns the number of input features.
    fn get_in_dim(&self) -> i64;
}

/// Interface for handling output dimensions.
pub trait OutDim {
    /// Returns the output dimension.
    fn get_out_dim(&self) -> i64;

    /// Sets the  output dimension.
    fn set_out_dim(&mut self, v: i64);
}

/// Output of [`gradient_step`].
pub struct GradientStep {
    /// Updated parameters.
    pub params: NamedTensors,

    /// Updated optimizer state.
    pub opt_state: OptState,

    /// Auxiliary output of the loss function, typically the updated network state.
    pub aux: NamedTensors,

    /// Value of the loss before the step.
    pub loss: f32,
}

/// Differentiates `loss_fn` at `params` and applies one optimizer step.
///
/// `loss_fn` receives the parameters as tracked tensors and returns a scalar
/// loss with auxiliary tensors. Parameters the loss does not depend on get a
/// zero gradient.
pub fn gradient_step<F>(
    opt: &OptimizerConfig,
    params: &NamedTensors,
    opt_state: &OptState,
    loss_fn: F,
) -> Result<GradientStep>
where
    F: FnOnce(&NamedTensors) -> Result<(Tensor, NamedTensors)>,
{
    let vars = params
        .iter()
        .map(|(k, t)| Ok((k.clone(), Var::from_tensor(t)?)))
        .collect::<Result<Vec<_>>>()?;
    let tracked = vars
        .iter()
        .map(|(k, v)| (k.clone(), v.as_tensor().clone()))
        .collect::<NamedTensors>();

    let (loss, aux) = loss_fn(&tracked)?;
    let grad_store = loss.backward()?;
    let grads = vars
        .iter()
        .map(|(k, v)| {
            let g = match grad_store.get(v.as_tensor()) {
                Some(g) => g.clone(),
                None => v.as_tensor().zeros_like()?,
            };
            Ok((k.clone(), g))
        })
        .collect::<Result<NamedTensors>>()?;

    let (params, opt_state) = opt.step(params, &grads, opt_state)?;
    let aux = aux.map(|_, t| Ok(t.detach()))?;

    Ok(GradientStep {
        params,
        opt_state,
        aux,
        loss: loss.to_dtype(DType::F32)?.to_scalar::<f32>()?,
    })
}

/// A replay batch moved to a device.
pub struct BatchTensors {
    /// States, `(batch_size, obs_dim)`.
    pub obs: Tensor,

    /// Actions, `(batch_size, 1)`.
    pub act: Tensor,

    /// Rewards, `(batch_size,)`.
    pub reward: Tensor,

    /// `1 - terminal`, `(batch_size,)`.
    pub not_done: Tensor,

    /// Next states, `(batch_size, obs_dim)`.
    pub next_obs: Tensor,
}

impl BatchTensors {
    /// Converts a batch sampled from a replay buffer.
    pub fn from_batch(batch: Batch, device: &Device) -> Result<Self> {
        let n = batch.len();
        let not_done = batch.not_terminated();
        let obs_dim = batch.obs.ncols();
        let obs = batch.obs.iter().cloned().collect::<Vec<f32>>();
        let next_obs = batch.next_obs.iter().cloned().collect::<Vec<f32>>();

        Ok(Self {
            obs: Tensor::from_vec(obs, (n, obs_dim), device)?,
            act: Tensor::from_vec(batch.act.to_vec(), (n, 1), device)?,
            reward: Tensor::from_vec(batch.reward.to_vec(), (n,), device)?,
            not_done: Tensor::from_vec(not_done, (n,), device)?,
            next_obs: Tensor::from_vec(next_obs, (n, obs_dim), device)?,
        })
    }
}

/// Returns the standard deviation of a tensor.
pub fn std(t: &Tensor) -> Result<f32> {
    let t = t.to_dtype(DType::F32)?;
    Ok(t.broadcast_sub(&t.mean_all()?)?
        .sqr()?
        .mean_all()?
        .sqrt()?
        .to_vec0::<f32>()?)
}

/// Returns the mean and standard deviation of the parameters.
pub fn param_stats(params: &NamedTensors) -> Result<Record> {
    let mut record = Record::empty();

    for (k, v) in params.iter() {
        let m: f32 = v.to_dtype(DType::F32)?.mean_all()?.to_vec0()?;
        record.insert(format!("{}_mean", k), RecordValue::Scalar(m));
        record.insert(format!("{}_std", k), RecordValue::Scalar(std(v)?));
    }

    Ok(record)
}
