//! Particle-filter agent selecting the MCS of a Wi-Fi link.
use crate::{
    config::ParticleFilterConfig,
    model::{WifiModel, N_MCS},
    obs::{TxContextObs, TxOutcomeObs},
};
use anyhow::Result;
use log::{debug, info};
use reinforced_core::{
    error::RlError,
    particle_filter::{InitialDistribution, ParticleFilter, ParticleFilterState},
    record::{Record, RecordValue},
    util::argmax,
    Agent, Configurable, PrngKey, Space, SpaceDict,
};
use std::{fs, path::Path};

const STATE_FILE: &str = "particle_filter.bin";

/// Largest contention window of IEEE 802.11.
const MAX_CW: usize = 32767;

fn check_power(power: f64) -> Result<()> {
    if !power.is_finite() {
        return Err(RlError::invalid_field("power", format!("must be finite, got {}", power)).into());
    }
    Ok(())
}

/// Particle-filter rate adaptation for IEEE 802.11ax.
///
/// The latent value of a particle is the channel condition
/// `theta = SINR - P_tx` in dB, initially uniform on
/// `[min_snr_init - default_power, max_snr_init - default_power)`. Between
/// updates the particles diffuse as a Brownian motion with velocity `scale`.
/// Actions are MCS indices in `0..12`.
pub struct WifiParticleFilter {
    filter: ParticleFilter<WifiModel>,
    config: ParticleFilterConfig,
}

impl WifiParticleFilter {
    /// The configuration.
    pub fn config(&self) -> &ParticleFilterConfig {
        &self.config
    }

    /// The link model.
    pub fn model(&self) -> &WifiModel {
        self.filter.model()
    }

    /// Expected data rate of every MCS when the channel condition is `theta`.
    pub fn expected_rates(&self, theta: f64, ctx: &TxContextObs) -> Result<Vec<f64>> {
        if ctx.rates.len() != N_MCS {
            return Err(RlError::invalid_field(
                "rates",
                format!("expected {} values, got {}", N_MCS, ctx.rates.len()),
            )
            .into());
        }
        check_power(ctx.power)?;
        let p_s = self.model().success_probabilities(theta + ctx.power);
        Ok(p_s.iter().zip(ctx.rates.iter()).map(|(p, r)| p * r).collect())
    }

    fn check_outcome(obs: &TxOutcomeObs) -> Result<()> {
        if obs.action >= N_MCS {
            return Err(RlError::invalid_field(
                "action",
                format!("expected an MCS in 0..{}, got {}", N_MCS, obs.action),
            )
            .into());
        }
        if !(obs.delta_time >= 0.0 && obs.delta_time.is_finite()) {
            return Err(RlError::invalid_field(
                "delta_time",
                format!("must be non-negative and finite, got {}", obs.delta_time),
            )
            .into());
        }
        check_power(obs.power)?;
        if obs.cw < 1 || obs.cw > MAX_CW {
            return Err(RlError::invalid_field(
                "cw",
                format!("expected a contention window in 1..={}, got {}", MAX_CW, obs.cw),
            )
            .into());
        }
        Ok(())
    }
}

impl Configurable for WifiParticleFilter {
    type Config = ParticleFilterConfig;

    fn build(config: Self::Config) -> Result<Self> {
        config.validate()?;
        let initial_distribution = InitialDistribution::Uniform {
            low: config.min_snr_init - config.default_power,
            high: config.max_snr_init - config.default_power,
        };
        let filter = ParticleFilter::new(config.particles_num, initial_distribution, WifiModel::new()?)?;
        info!("Build particle filter agent with {} particles", config.particles_num);

        Ok(Self { filter, config })
    }
}

impl Agent for WifiParticleFilter {
    type State = ParticleFilterState;
    type UpdateObs = TxOutcomeObs;
    type SampleObs = TxContextObs;
    type Action = usize;

    fn parameter_space() -> SpaceDict {
        SpaceDict::new(vec![
            ("default_power", Space::scalar(f64::NEG_INFINITY, f64::INFINITY)),
            ("min_snr_init", Space::scalar(f64::NEG_INFINITY, f64::INFINITY)),
            ("max_snr_init", Space::scalar(f64::NEG_INFINITY, f64::INFINITY)),
            ("particles_num", Space::int(1.0, f64::INFINITY)),
            ("scale", Space::scalar(0.0, f64::INFINITY)),
        ])
    }

    fn update_observation_space(&self) -> SpaceDict {
        SpaceDict::new(vec![
            ("action", Space::Discrete(N_MCS)),
            ("n_successful", Space::int(0.0, f64::INFINITY)),
            ("n_failed", Space::int(0.0, f64::INFINITY)),
            ("delta_time", Space::scalar(0.0, f64::INFINITY)),
            ("power", Space::scalar(f64::NEG_INFINITY, f64::INFINITY)),
            ("cw", Space::Discrete(MAX_CW)),
        ])
    }

    fn sample_observation_space(&self) -> SpaceDict {
        SpaceDict::new(vec![
            ("power", Space::scalar(f64::NEG_INFINITY, f64::INFINITY)),
            ("rates", Space::array(0.0, f64::INFINITY, &[N_MCS])),
        ])
    }

    fn action_space(&self) -> Space {
        Space::Discrete(N_MCS)
    }

    fn init(&self, key: PrngKey) -> Result<ParticleFilterState> {
        self.filter.init(key)
    }

    fn update_with_record(
        &self,
        state: &ParticleFilterState,
        key: PrngKey,
        obs: &TxOutcomeObs,
    ) -> Result<(ParticleFilterState, Record)> {
        Self::check_outcome(obs)?;
        let state = self
            .filter
            .update(state, key, obs, obs.delta_time, self.config.scale);

        let ess = state.effective_sample_size();
        debug!("Effective sample size: {}", ess);
        let record = Record::from_slice(&[
            ("effective_sample_size", RecordValue::Scalar(ess as f32)),
            ("theta_mean", RecordValue::Scalar(state.mean() as f32)),
        ]);
        Ok((state, record))
    }

    fn sample(&self, state: &ParticleFilterState, key: PrngKey, obs: &TxContextObs) -> Result<usize> {
        let theta = self.filter.sample(state, key)?;
        Ok(argmax(&self.expected_rates(theta, obs)?))
    }

    fn state_record(&self, state: &ParticleFilterState) -> Record {
        Record::from_slice(&[
            ("theta_mean", RecordValue::Scalar(state.mean() as f32)),
            ("effective_sample_size", RecordValue::Scalar(state.effective_sample_size() as f32)),
            ("positions", RecordValue::Array1(state.positions.iter().map(|&x| x as f32).collect())),
        ])
    }

    fn save_state(&self, state: &ParticleFilterState, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        let path = path.join(STATE_FILE);
        fs::write(&path, bincode::serialize(state)?)?;
        info!("Save particle filter state into {:?}", path);
        Ok(())
    }

    fn load_state(&self, path: &Path) -> Result<ParticleFilterState> {
        let path = path.join(STATE_FILE);
        let state: ParticleFilterState = bincode::deserialize(&fs::read(&path)?)?;
        if state.len() != self.filter.n_particles() || state.logit_weights.len() != state.len() {
            return Err(RlError::invalid_field(
                "positions",
                format!(
                    "checkpoint holds {} particles, expected {}",
                    state.len(),
                    self.filter.n_particles()
                ),
            )
            .into());
        }
        info!("Load particle filter state from {:?}", path);
        Ok(state)
    }
}
