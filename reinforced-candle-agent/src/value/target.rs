use crate::explorer::Softmax;
use anyhow::Result;
use candle_core::{shape::D, Tensor};
use candle_nn::ops::softmax;

/// Value of the next state used in the bootstrapped target.
///
/// Maps target action values `(batch_size, n_actions)` to `(batch_size,)`.
pub trait BootstrapTarget {
    /// Computes the value of the next states.
    fn next_value(&self, q_next: &Tensor) -> Result<Tensor>;
}

/// `max_a' Q(s', a')`.
#[derive(Clone, Copy, Debug, Default)]
pub struct MaxTarget;

impl BootstrapTarget for MaxTarget {
    fn next_value(&self, q_next: &Tensor) -> Result<Tensor> {
        Ok(q_next.max(D::Minus1)?)
    }
}

/// `sum_a' softmax(Q(s', .) / tau)[a'] * Q(s', a')`.
#[derive(Clone, Copy, Debug)]
pub struct ExpectedTarget(pub Softmax);

impl BootstrapTarget for ExpectedTarget {
    fn next_value(&self, q_next: &Tensor) -> Result<Tensor> {
        let probs = softmax(&q_next.affine(1.0 / self.0.tau, 0.0)?, D::Minus1)?;
        Ok((probs * q_next)?.sum(D::Minus1)?)
    }
}

/// `reward + not_done * discount * next_value`, cut from the computation graph.
pub(super) fn td_target(
    reward: &Tensor,
    not_done: &Tensor,
    discount: f64,
    next_value: &Tensor,
) -> Result<Tensor> {
    let bootstrap = (not_done * next_value)?.affine(discount, 0.0)?;
    Ok((reward + bootstrap)?.detach())
}

#[cfg(test)]
mod test {
    use super::*;
    use candle_core::Device;

    #[test]
    fn test_next_values() -> Result<()> {
        let q = Tensor::new(&[[1f32, 3.0], [2.0, 2.0]], &Device::Cpu)?;
        assert_eq!(MaxTarget.next_value(&q)?.to_vec1::<f32>()?, vec![3.0, 2.0]);

        let v = ExpectedTarget(Softmax::new(1.0)?).next_value(&q)?.to_vec1::<f32>()?;
        let p = 1.0 / (1.0 + (-2f32).exp());
        assert!((v[0] - (p * 3.0 + (1.0 - p) * 1.0)).abs() < 1e-5);
        assert!((v[1] - 2.0).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_td_target_masks_terminal() -> Result<()> {
        let dev = Device::Cpu;
        let reward = Tensor::new(&[1f32, 1.0], &dev)?;
        let not_done = Tensor::new(&[1f32, 0.0], &dev)?;
        let next = Tensor::new(&[10f32, 10.0], &dev)?;
        let tgt = td_target(&reward, &not_done, 0.5, &next)?;
        assert_eq!(tgt.to_vec1::<f32>()?, vec![6.0, 1.0]);
        Ok(())
    }
}
