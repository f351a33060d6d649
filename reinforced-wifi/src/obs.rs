//! Payloads of the Wi-Fi particle filter.
use reinforced_core::{error::RlError, Observation};
use std::convert::TryFrom;

/// Outcome of the transmissions made since the last update.
///
/// Fields: `action`, `n_successful`, `n_failed`, `delta_time`, `power`, `cw`.
#[derive(Clone, Debug, PartialEq)]
pub struct TxOutcomeObs {
    /// MCS used for the transmissions.
    pub action: usize,

    /// Number of successful transmission attempts.
    pub n_successful: usize,

    /// Number of failed transmission attempts.
    pub n_failed: usize,

    /// Time elapsed since the last transmission [s].
    pub delta_time: f64,

    /// Transmission power [dBm].
    pub power: f64,

    /// Contention window used during the transmissions.
    pub cw: usize,
}

impl TryFrom<&Observation> for TxOutcomeObs {
    type Error = RlError;

    fn try_from(obs: &Observation) -> Result<Self, RlError> {
        Ok(Self {
            action: obs.get_usize("action")?,
            n_successful: obs.get_usize("n_successful")?,
            n_failed: obs.get_usize("n_failed")?,
            delta_time: obs.get_f64("delta_time")?,
            power: obs.get_f64("power")?,
            cw: obs.get_usize("cw")?,
        })
    }
}

/// Context of the next transmission.
///
/// Fields: `power`, `rates`.
#[derive(Clone, Debug, PartialEq)]
pub struct TxContextObs {
    /// Transmission power [dBm].
    pub power: f64,

    /// Data rate of each MCS [Mb/s].
    pub rates: Vec<f64>,
}

impl TryFrom<&Observation> for TxContextObs {
    type Error = RlError;

    fn try_from(obs: &Observation) -> Result<Self, RlError> {
        Ok(Self {
            power: obs.get_f64("power")?,
            rates: obs.get_array("rates")?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tx_outcome_obs() {
        let obs = Observation::new()
            .with("action", 3usize)
            .with("n_successful", 4usize)
            .with("n_failed", 0usize)
            .with("delta_time", 0.1f64)
            .with("power", 16.0f64);
        assert_eq!(
            TxOutcomeObs::try_from(&obs),
            Err(RlError::MissingField("cw".to_string()))
        );

        let obs = obs.with("cw", 15usize);
        let outcome = TxOutcomeObs::try_from(&obs).unwrap();
        assert_eq!(outcome.action, 3);
        assert_eq!(outcome.cw, 15);
    }
}
