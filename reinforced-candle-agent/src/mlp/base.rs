use super::MlpConfig;
use crate::{model::QNetwork, util::NamedTensors};
use anyhow::Result;
use candle_core::{Device, Tensor};
use rand::Rng;
use rand_distr::Uniform;
use reinforced_core::PrngKey;

/// Multilayer perceptron with ReLU activation function.
///
/// Parameters are named `mlp.ln{i}.weight` with shape `(out_dim, in_dim)` and
/// `mlp.ln{i}.bias`. They are initialized like [`candle_nn::linear`], uniformly
/// in `[-1/sqrt(in_dim), 1/sqrt(in_dim)]`, from the given key.
pub struct Mlp {
    config: MlpConfig,
}

fn weight_name(i: usize) -> String {
    format!("mlp.ln{}.weight", i)
}

fn bias_name(i: usize) -> String {
    format!("mlp.ln{}.bias", i)
}

impl QNetwork for Mlp {
    type Config = MlpConfig;

    fn build(config: Self::Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    fn config(&self) -> &MlpConfig {
        &self.config
    }

    fn init(&self, key: PrngKey, device: &Device) -> Result<(NamedTensors, NamedTensors)> {
        let dims = self.config.layer_dims();
        let keys = key.split_n(dims.len());
        let mut params = NamedTensors::new();

        for (i, (&(in_dim, out_dim), key)) in dims.iter().zip(keys.into_iter()).enumerate() {
            let bound = 1.0 / (in_dim as f32).sqrt();
            let dist = Uniform::new_inclusive(-bound, bound);
            let mut rng = key.rng();
            let w = (0..in_dim * out_dim).map(|_| rng.sample(dist)).collect::<Vec<f32>>();
            let b = (0..out_dim).map(|_| rng.sample(dist)).collect::<Vec<f32>>();
            params = params
                .with(weight_name(i), Tensor::from_vec(w, (out_dim, in_dim), device)?)
                .with(bias_name(i), Tensor::from_vec(b, (out_dim,), device)?);
        }

        Ok((params, NamedTensors::new()))
    }

    fn forward(
        &self,
        params: &NamedTensors,
        net_state: &NamedTensors,
        _key: PrngKey,
        xs: &Tensor,
    ) -> Result<(Tensor, NamedTensors)> {
        let n_layers = self.config.layer_dims().len();
        let mut xs = xs.clone();

        for i in 0..n_layers {
            let w = params.get(&weight_name(i))?;
            let b = params.get(&bias_name(i))?;
            xs = xs.matmul(&w.t()?)?.broadcast_add(b)?;
            if i + 1 < n_layers || self.config.activation_out {
                xs = xs.relu()?;
            }
        }

        Ok((xs, net_state.clone()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_init_is_deterministic() -> Result<()> {
        let mlp = Mlp::build(MlpConfig::new(3, vec![8], 2, false))?;
        let (p1, s1) = mlp.init(PrngKey::new(0), &Device::Cpu)?;
        let (p2, _) = mlp.init(PrngKey::new(0), &Device::Cpu)?;
        let (p3, _) = mlp.init(PrngKey::new(1), &Device::Cpu)?;
        assert_eq!(p1.len(), 4);
        assert!(s1.is_empty());
        assert_eq!(p1.get("mlp.ln0.weight")?.dims(), &[8, 3]);
        assert_eq!(p1.get("mlp.ln1.bias")?.dims(), &[2]);
        assert_eq!(p1.max_abs_diff(&p2)?, 0.0);
        assert!(p1.max_abs_diff(&p3)? > 0.0);
        Ok(())
    }

    #[test]
    fn test_forward_shape() -> Result<()> {
        let mlp = Mlp::build(MlpConfig::new(3, vec![8, 8], 4, false))?;
        let (params, state) = mlp.init(PrngKey::new(0), &Device::Cpu)?;
        let xs = Tensor::zeros((5, 3), candle_core::DType::F32, &Device::Cpu)?;
        let (q, _) = mlp.forward(&params, &state, PrngKey::new(1), &xs)?;
        assert_eq!(q.dims(), &[5, 4]);
        Ok(())
    }

    #[test]
    fn test_invalid_config() {
        assert!(Mlp::build(MlpConfig::new(0, vec![8], 2, false)).is_err());
        assert!(Mlp::build(MlpConfig::new(3, vec![0], 2, false)).is_err());
    }
}
