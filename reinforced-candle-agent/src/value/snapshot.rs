use crate::util::NamedTensors;
use anyhow::Result;

/// A frozen copy of the parameters and network state of a learner.
///
/// Captured once per update, used to compute the bootstrapped targets of every
/// gradient step of that update, then dropped. The tensors are copied, so
/// nothing done to the online parameters afterwards can reach the snapshot.
#[derive(Clone, Debug)]
pub struct TargetSnapshot {
    params: NamedTensors,
    net_state: NamedTensors,
}

impl TargetSnapshot {
    /// Copies `params` and `net_state`.
    pub fn capture(params: &NamedTensors, net_state: &NamedTensors) -> Result<Self> {
        Ok(Self {
            params: params.deep_copy()?,
            net_state: net_state.deep_copy()?,
        })
    }

    /// Frozen parameters.
    pub fn params(&self) -> &NamedTensors {
        &self.params
    }

    /// Frozen network state.
    pub fn net_state(&self) -> &NamedTensors {
        &self.net_state
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::opt::OptimizerConfig;
    use crate::util::gradient_step;
    use candle_core::{Device, Tensor};

    #[test]
    fn test_snapshot_is_isolated_from_updates() -> Result<()> {
        let params = NamedTensors::new().with("w", Tensor::new(&[1f32, 2.0], &Device::Cpu)?);
        let snapshot = TargetSnapshot::capture(&params, &NamedTensors::new())?;

        let opt = OptimizerConfig::Sgd { lr: 0.5 };
        let opt_state = opt.init(&params)?;
        let step = gradient_step(&opt, &params, &opt_state, |p| {
            Ok((p.get("w")?.sqr()?.sum_all()?, NamedTensors::new()))
        })?;

        assert!(step.params.max_abs_diff(&params)? > 0.0);
        assert_eq!(snapshot.params().max_abs_diff(&params)?, 0.0);
        assert_eq!(snapshot.params().get("w")?.to_vec1::<f32>()?, vec![1.0, 2.0]);
        Ok(())
    }
}
