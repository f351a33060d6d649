use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use log::info;
use std::{
    collections::{btree_map, BTreeMap, HashMap},
    iter::FromIterator,
    path::Path,
};

/// An immutable set of named tensors.
///
/// Parameters, non-trainable state and optimizer moments of a network are held
/// in this form. Every transformation returns a new set; a set handed out
/// before a transformation keeps its values.
#[derive(Clone, Debug, Default)]
pub struct NamedTensors(BTreeMap<String, Tensor>);

impl NamedTensors {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Adds a tensor, builder style.
    pub fn with(mut self, name: impl Into<String>, tensor: Tensor) -> Self {
        self.0.insert(name.into(), tensor);
        self
    }

    /// Returns the tensor of the given name.
    pub fn get(&self, name: &str) -> Result<&Tensor> {
        self.0
            .get(name)
            .ok_or_else(|| anyhow!("Tensor '{}' not found", name))
    }

    /// Names in lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    /// Iterates over the tensors in lexicographic order of their names.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Tensor> {
        self.0.iter()
    }

    /// Number of tensors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of scalars.
    pub fn elem_count(&self) -> usize {
        self.0.values().map(|t| t.elem_count()).sum()
    }

    /// Applies `f` to every tensor.
    pub fn map(&self, mut f: impl FnMut(&str, &Tensor) -> Result<Tensor>) -> Result<Self> {
        self.0
            .iter()
            .map(|(k, t)| Ok((k.clone(), f(k, t)?)))
            .collect()
    }

    /// Applies `f` to the tensors of the same name in `self` and `other`.
    ///
    /// Fails if the two sets do not have the same names.
    pub fn zip_map(
        &self,
        other: &NamedTensors,
        mut f: impl FnMut(&Tensor, &Tensor) -> Result<Tensor>,
    ) -> Result<Self> {
        if self.len() != other.len() {
            return Err(anyhow!(
                "Mismatched tensor sets: {} vs {} tensors",
                self.len(),
                other.len()
            ));
        }
        self.0
            .iter()
            .map(|(k, t)| Ok((k.clone(), f(t, other.get(k)?)?)))
            .collect()
    }

    /// Copies the storage of every tensor, cutting it from any computation graph.
    pub fn deep_copy(&self) -> Result<Self> {
        self.map(|_, t| Ok(t.detach().copy()?))
    }

    /// Tensors of zeros with the same names and shapes.
    pub fn zeros_like(&self) -> Result<Self> {
        self.map(|_, t| Ok(t.zeros_like()?))
    }

    /// Maximum absolute elementwise difference to `other`.
    pub fn max_abs_diff(&self, other: &NamedTensors) -> Result<f32> {
        let diffs = self.zip_map(other, |a, b| Ok((a - b)?.abs()?.flatten_all()?.max(0)?))?;
        let mut max = 0f32;
        for (_, d) in diffs.iter() {
            max = max.max(d.to_scalar::<f32>()?);
        }
        Ok(max)
    }

    /// Saves the tensors in safetensors format.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let tensors: HashMap<String, Tensor> = self.0.clone().into_iter().collect();
        candle_core::safetensors::save(&tensors, path)?;
        info!("Saved {} tensors to {:?}", tensors.len(), path);
        Ok(())
    }

    /// Loads tensors saved with [`NamedTensors::save`] onto `device`.
    pub fn load(path: impl AsRef<Path>, device: &Device) -> Result<Self> {
        let path = path.as_ref();
        let tensors = candle_core::safetensors::load(path, device)?;
        info!("Loaded {} tensors from {:?}", tensors.len(), path);
        Ok(Self(tensors.into_iter().collect()))
    }
}

impl FromIterator<(String, Tensor)> for NamedTensors {
    fn from_iter<T: IntoIterator<Item = (String, Tensor)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    fn tensors() -> Result<NamedTensors> {
        let device = Device::Cpu;
        Ok(NamedTensors::new()
            .with("a", Tensor::new(&[1f32, 2., 3.], &device)?)
            .with("b", Tensor::new(&[[1f32, -1.], [0.5, 0.]], &device)?))
    }

    #[test]
    fn test_deep_copy_is_not_an_alias() -> Result<()> {
        let t1 = tensors()?;
        let t2 = t1.deep_copy()?;
        let t3 = t1.map(|_, t| Ok(t.affine(2.0, 1.0)?))?;
        assert_eq!(t1.max_abs_diff(&t2)?, 0.0);
        assert!(t1.max_abs_diff(&t3)? > 0.0);
        assert_eq!(t2.get("a")?.to_vec1::<f32>()?, vec![1., 2., 3.]);
        Ok(())
    }

    #[test]
    fn test_zip_map_mismatch() -> Result<()> {
        let t1 = tensors()?;
        let t2 = NamedTensors::new().with("a", Tensor::new(&[1f32], &Device::Cpu)?);
        assert!(t1.zip_map(&t2, |a, _| Ok(a.clone())).is_err());
        Ok(())
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let tmp_dir = TempDir::new("named_tensors")?;
        let path = tmp_dir.path().join("params.safetensors");
        let t1 = tensors()?;
        t1.save(&path)?;
        let t2 = NamedTensors::load(&path, &Device::Cpu)?;
        assert_eq!(t2.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(t1.max_abs_diff(&t2)?, 0.0);
        Ok(())
    }
}
