//! Link model of IEEE 802.11ax transmissions.
use crate::obs::TxOutcomeObs;
use anyhow::Result;
use reinforced_core::particle_filter::ObservationModel;
use statrs::distribution::{ContinuousCDF, Normal};

/// Number of modulation and coding schemes.
pub const N_MCS: usize = 12;

/// SINR [dB] at which a transmission with each MCS succeeds with probability 1/2.
pub const MCS_SNR_THRESHOLDS: [f64; N_MCS] = [
    4.12, 7.15, 10.05, 13.66, 16.81, 21.58, 22.80, 23.96, 28.66, 29.82, 33.82, 35.30,
];

/// Success probabilities of the MCSs as a function of the SINR.
///
/// The probability for MCS `i` at SINR `snr` is the normal CDF
/// `Phi((snr - MCS_SNR_THRESHOLDS[i]) * sqrt(8))`. A transmission may also fail
/// by collision, with probability `1 / cw`.
#[derive(Clone, Debug)]
pub struct WifiModel {
    std_normal: Normal,
    scale: f64,
}

impl WifiModel {
    /// Creates the model.
    pub fn new() -> Result<Self> {
        Ok(Self {
            std_normal: Normal::new(0.0, 1.0)?,
            scale: 8f64.sqrt(),
        })
    }

    /// Probability that a transmission with MCS `mcs` succeeds at SINR `snr`, ignoring collisions.
    pub fn success_probability(&self, snr: f64, mcs: usize) -> f64 {
        self.std_normal
            .cdf((snr - MCS_SNR_THRESHOLDS[mcs]) * self.scale)
    }

    /// [`WifiModel::success_probability`] of every MCS.
    pub fn success_probabilities(&self, snr: f64) -> [f64; N_MCS] {
        let mut p = [0.0; N_MCS];
        for (mcs, p) in p.iter_mut().enumerate() {
            *p = self.success_probability(snr, mcs);
        }
        p
    }
}

impl ObservationModel for WifiModel {
    type Observation = TxOutcomeObs;

    /// `n_successful * ln(p) + n_failed * ln(1 - p)` with `p = p_s(theta + power) * (1 - 1/cw)`.
    ///
    /// A term whose count is zero contributes nothing.
    fn log_likelihood(&self, theta: f64, obs: &TxOutcomeObs) -> f64 {
        let p = self.success_probability(theta + obs.power, obs.action) * (1.0 - 1.0 / obs.cw as f64);
        let mut ll = 0.0;
        if obs.n_successful > 0 {
            ll += obs.n_successful as f64 * p.ln();
        }
        if obs.n_failed > 0 {
            ll += obs.n_failed as f64 * (1.0 - p).ln();
        }
        ll
    }
}
