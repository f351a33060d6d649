//! Configuration of the Wi-Fi particle filter.
use anyhow::Result;
use log::info;
use reinforced_core::error::RlError;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

fn default_min_snr_init() -> f64 {
    0.0
}

fn default_max_snr_init() -> f64 {
    40.0
}

fn default_particles_num() -> usize {
    1000
}

fn default_scale() -> f64 {
    10.0
}

/// Configuration of [`WifiParticleFilter`](crate::WifiParticleFilter).
///
/// `default_power` has no default and must be given.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ParticleFilterConfig {
    /// Default transmission power [dBm].
    pub default_power: f64,

    /// Lower bound of the initial SINR [dB].
    #[serde(default = "default_min_snr_init")]
    pub min_snr_init: f64,

    /// Upper bound of the initial SINR [dB].
    #[serde(default = "default_max_snr_init")]
    pub max_snr_init: f64,

    /// Number of particles.
    #[serde(default = "default_particles_num")]
    pub particles_num: usize,

    /// Velocity of the random movement of the particles.
    #[serde(default = "default_scale")]
    pub scale: f64,
}

impl ParticleFilterConfig {
    /// Configuration with the given default transmission power and default values otherwise.
    pub fn new(default_power: f64) -> Self {
        Self {
            default_power,
            min_snr_init: default_min_snr_init(),
            max_snr_init: default_max_snr_init(),
            particles_num: default_particles_num(),
            scale: default_scale(),
        }
    }

    /// Sets the default transmission power.
    pub fn default_power(mut self, v: f64) -> Self {
        self.default_power = v;
        self
    }

    /// Sets the lower bound of the initial SINR.
    pub fn min_snr_init(mut self, v: f64) -> Self {
        self.min_snr_init = v;
        self
    }

    /// Sets the upper bound of the initial SINR.
    pub fn max_snr_init(mut self, v: f64) -> Self {
        self.max_snr_init = v;
        self
    }

    /// Sets the number of particles.
    pub fn particles_num(mut self, v: usize) -> Self {
        self.particles_num = v;
        self
    }

    /// Sets the velocity of the random movement.
    pub fn scale(mut self, v: f64) -> Self {
        self.scale = v;
        self
    }

    /// Checks `particles_num > 0`, a finite `scale > 0` and finite `min_snr_init < max_snr_init`.
    pub fn validate(&self) -> Result<()> {
        if self.particles_num == 0 {
            return Err(RlError::invalid_parameter("particles_num", "must be positive").into());
        }
        if !(self.scale > 0.0 && self.scale.is_finite()) {
            return Err(RlError::invalid_parameter(
                "scale",
                format!("must be positive and finite, got {}", self.scale),
            )
            .into());
        }
        if !self.min_snr_init.is_finite() {
            return Err(RlError::invalid_parameter(
                "min_snr_init",
                format!("must be finite, got {}", self.min_snr_init),
            )
            .into());
        }
        if !(self.max_snr_init - self.min_snr_init).is_finite() {
            return Err(RlError::invalid_parameter(
                "max_snr_init",
                format!("must be finite and within range of min_snr_init, got {}", self.max_snr_init),
            )
            .into());
        }
        if !(self.min_snr_init < self.max_snr_init) {
            return Err(RlError::invalid_parameter(
                "max_snr_init",
                format!(
                    "must be greater than min_snr_init ({} <= {})",
                    self.max_snr_init, self.min_snr_init
                ),
            )
            .into());
        }
        if !self.default_power.is_finite() {
            return Err(RlError::invalid_parameter("default_power", "must be finite").into());
        }
        Ok(())
    }

    /// Loads [`ParticleFilterConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of particle filter agent from {:?}", path_);
        Ok(b)
    }

    /// Saves [`ParticleFilterConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of particle filter agent into {:?}", path_);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_config() -> Result<()> {
        let config = ParticleFilterConfig::new(20.0).particles_num(300).scale(2.5);
        let dir = TempDir::new("particle_filter_config")?;
        let path = dir.path().join("particle_filter.yaml");

        config.save(&path)?;
        assert_eq!(ParticleFilterConfig::load(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_defaults_from_yaml() -> Result<()> {
        let config: ParticleFilterConfig = serde_yaml::from_str("default_power: 16.0")?;
        assert_eq!(config, ParticleFilterConfig::new(16.0));
        assert_eq!(config.min_snr_init, 0.0);
        assert_eq!(config.max_snr_init, 40.0);
        assert_eq!(config.particles_num, 1000);
        assert_eq!(config.scale, 10.0);

        // `default_power` is required.
        assert!(serde_yaml::from_str::<ParticleFilterConfig>("scale: 1.0").is_err());
        Ok(())
    }

    #[test]
    fn test_validate() {
        let name_of = |config: ParticleFilterConfig| match config.validate() {
            Err(e) => match e.downcast_ref::<RlError>() {
                Some(RlError::InvalidParameter { name, .. }) => name.clone(),
                e => panic!("unexpected error: {:?}", e),
            },
            Ok(()) => panic!("config should be rejected"),
        };
        assert!(ParticleFilterConfig::new(0.0).validate().is_ok());
        assert_eq!(name_of(ParticleFilterConfig::new(0.0).particles_num(0)), "particles_num");
        assert_eq!(name_of(ParticleFilterConfig::new(0.0).scale(0.0)), "scale");
        assert_eq!(name_of(ParticleFilterConfig::new(0.0).max_snr_init(-1.0)), "max_snr_init");
        assert_eq!(name_of(ParticleFilterConfig::new(0.0).scale(f64::INFINITY)), "scale");
        assert_eq!(
            name_of(ParticleFilterConfig::new(0.0).min_snr_init(f64::NEG_INFINITY)),
            "min_snr_init"
        );
        assert_eq!(
            name_of(ParticleFilterConfig::new(0.0).min_snr_init(f64::NAN)),
            "min_snr_init"
        );
        assert_eq!(
            name_of(ParticleFilterConfig::new(0.0).max_snr_init(f64::INFINITY)),
            "max_snr_init"
        );
        assert_eq!(
            name_of(ParticleFilterConfig::new(0.0).min_snr_init(-f64::MAX).max_snr_init(f64::MAX)),
            "max_snr_init"
        );
    }
}
