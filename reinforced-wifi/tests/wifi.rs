use anyhow::Result;
use ndarray::Array1;
use reinforced_core::{
    error::RlError, particle_filter::ParticleFilterState, Agent, Configurable, Observation, PrngKey,
};
use reinforced_wifi::{ParticleFilterConfig, TxContextObs, TxOutcomeObs, WifiParticleFilter, N_MCS};
use tempdir::TempDir;

// 802.11ax data rates [Mb/s] of a 20 MHz channel with one spatial stream.
const RATES: [f64; N_MCS] = [
    8.6, 17.2, 25.8, 34.4, 51.6, 68.8, 77.4, 86.0, 103.2, 114.7, 129.0, 143.4,
];

fn context(power: f64) -> TxContextObs {
    TxContextObs {
        power,
        rates: RATES.to_vec(),
    }
}

fn outcome(action: usize, n_successful: usize, n_failed: usize) -> TxOutcomeObs {
    TxOutcomeObs {
        action,
        n_successful,
        n_failed,
        delta_time: 0.01,
        power: 16.0,
        cw: 15,
    }
}

fn build_agent(particles_num: usize) -> Result<WifiParticleFilter> {
    WifiParticleFilter::build(ParticleFilterConfig::new(16.0).particles_num(particles_num).scale(1.0))
}

#[test]
fn test_init() -> Result<()> {
    let agent = build_agent(500)?;
    let state = agent.init(PrngKey::new(0))?;
    assert_eq!(state.positions.len(), 500);
    assert_eq!(state.logit_weights.len(), 500);
    // theta = SINR - default_power with SINR uniform on [0, 40).
    assert!(state.positions.iter().all(|&x| (-16.0..24.0).contains(&x)));
    assert!(state.logit_weights.iter().all(|&w| w == 0.0));
    Ok(())
}

#[test_log::test]
fn test_posterior_tracks_channel() -> Result<()> {
    let agent = build_agent(1000)?;
    let mut state = agent.init(PrngKey::new(0))?;

    // Frequent success at MCS 8 (28.66 dB) and failure at MCS 10 (33.82 dB)
    // put SINR between the two thresholds, i.e. theta in (12.66, 17.82).
    for (t, key) in PrngKey::new(1).split_n(20).into_iter().enumerate() {
        let obs = if t % 2 == 0 {
            outcome(8, 10, 0)
        } else {
            outcome(10, 0, 10)
        };
        let (next, record) = agent.update_with_record(&state, key, &obs)?;
        assert_eq!(next.positions.len(), 1000);
        assert!(record.get_scalar("effective_sample_size")? > 0.99);
        state = next;
    }

    let theta = state.mean();
    assert!(theta > 12.0 && theta < 18.5, "theta = {}", theta);

    // Decisions at this channel never pick the failing MCSs.
    for key in PrngKey::new(2).split_n(50) {
        let mcs = agent.sample(&state, key, &context(16.0))?;
        assert!(mcs >= 7 && mcs <= 9, "mcs = {}", mcs);
    }
    Ok(())
}

#[test]
fn test_sample_maximizes_expected_rate() -> Result<()> {
    let agent = build_agent(4)?;
    let state = ParticleFilterState {
        positions: Array1::from(vec![30.0; 4]),
        logit_weights: Array1::zeros(4),
    };

    // SINR 30 dB: MCS 8 is almost surely received, MCS 9 only with p ~ 0.7.
    assert_eq!(agent.sample(&state, PrngKey::new(0), &context(0.0))?, 8);
    // 10 dB less power, SINR 20 dB: MCS 4 (16.81 dB).
    assert_eq!(agent.sample(&state, PrngKey::new(0), &context(-10.0))?, 4);

    let rates = agent.expected_rates(30.0, &context(0.0))?;
    assert!((rates[8] - 103.2).abs() < 0.1);
    assert!(rates[10] < 1e-6);
    Ok(())
}

#[test]
fn test_zero_counts_only_diffuse() -> Result<()> {
    let agent = build_agent(100)?;
    let state = agent.init(PrngKey::new(0))?;
    let next = agent.update(&state, PrngKey::new(1), &outcome(3, 0, 0))?;
    assert_eq!(next.logit_weights, state.logit_weights);
    assert_ne!(next.positions, state.positions);

    let still = TxOutcomeObs {
        delta_time: 0.0,
        ..outcome(3, 0, 0)
    };
    assert_eq!(agent.update(&state, PrngKey::new(1), &still)?, state);
    Ok(())
}

#[test]
fn test_update_is_deterministic() -> Result<()> {
    let agent = build_agent(200)?;
    let state = agent.init(PrngKey::new(0))?;
    let key = PrngKey::new(3);
    assert_eq!(
        agent.update(&state, key, &outcome(5, 3, 1))?,
        agent.update(&state, key, &outcome(5, 3, 1))?
    );
    assert_eq!(
        agent.sample(&state, key, &context(16.0))?,
        agent.sample(&state, key, &context(16.0))?
    );
    Ok(())
}

#[test]
fn test_invalid_payloads() -> Result<()> {
    let agent = build_agent(10)?;
    let state = agent.init(PrngKey::new(0))?;
    let key = PrngKey::new(1);
    let field_of = |e: anyhow::Error| match e.downcast_ref::<RlError>() {
        Some(RlError::InvalidField { name, .. }) => name.clone(),
        e => panic!("unexpected error: {:?}", e),
    };

    assert_eq!(field_of(agent.update(&state, key, &outcome(12, 1, 0)).unwrap_err()), "action");
    let no_cw = TxOutcomeObs {
        cw: 0,
        ..outcome(0, 1, 0)
    };
    assert_eq!(field_of(agent.update(&state, key, &no_cw).unwrap_err()), "cw");
    let back_in_time = TxOutcomeObs {
        delta_time: -1.0,
        ..outcome(0, 1, 0)
    };
    assert_eq!(field_of(agent.update(&state, key, &back_in_time).unwrap_err()), "delta_time");
    let endless = TxOutcomeObs {
        delta_time: f64::INFINITY,
        ..outcome(0, 1, 0)
    };
    assert_eq!(field_of(agent.update(&state, key, &endless).unwrap_err()), "delta_time");
    let no_power = TxOutcomeObs {
        power: f64::NAN,
        ..outcome(0, 1, 0)
    };
    assert_eq!(field_of(agent.update(&state, key, &no_power).unwrap_err()), "power");
    let no_power = TxContextObs {
        power: f64::INFINITY,
        rates: vec![1.0; 12],
    };
    assert_eq!(field_of(agent.sample(&state, key, &no_power).unwrap_err()), "power");

    let short_rates = TxContextObs {
        power: 0.0,
        rates: vec![1.0; 3],
    };
    assert_eq!(field_of(agent.sample(&state, key, &short_rates).unwrap_err()), "rates");

    let obs = Observation::new().with("power", 16.0f64);
    let err = agent.sample_from(&state, key, &obs).unwrap_err();
    assert_eq!(
        err.downcast_ref::<RlError>(),
        Some(&RlError::MissingField("rates".to_string()))
    );
    Ok(())
}

#[test]
fn test_untyped_payloads() -> Result<()> {
    let agent = build_agent(50)?;
    let state = agent.init(PrngKey::new(0))?;
    let key = PrngKey::new(1);

    let obs = Observation::new()
        .with("action", 2usize)
        .with("n_successful", 3usize)
        .with("n_failed", 1usize)
        .with("delta_time", 0.01f64)
        .with("power", 16.0f64)
        .with("cw", 15usize);
    assert_eq!(agent.update_from(&state, key, &obs)?, agent.update(&state, key, &outcome(2, 3, 1))?);

    let obs = Observation::new().with("power", 16.0f64).with("rates", RATES.to_vec());
    assert_eq!(agent.sample_from(&state, key, &obs)?, agent.sample(&state, key, &context(16.0))?);
    Ok(())
}

#[test]
fn test_checkpoint_round_trip() -> Result<()> {
    let agent = build_agent(100)?;
    let mut state = agent.init(PrngKey::new(0))?;
    for key in PrngKey::new(1).split_n(5) {
        state = agent.update(&state, key, &outcome(6, 4, 2))?;
    }

    let tmp_dir = TempDir::new("particle_filter")?;
    agent.save_state(&state, tmp_dir.path())?;
    let restored = agent.load_state(tmp_dir.path())?;
    assert_eq!(restored, state);

    // A checkpoint of another particle count is rejected.
    assert!(build_agent(10)?.load_state(tmp_dir.path()).is_err());
    Ok(())
}

#[test]
fn test_state_record() -> Result<()> {
    let agent = build_agent(20)?;
    let state = agent.init(PrngKey::new(0))?;
    let record = agent.state_record(&state);
    assert_eq!(record.get_array1("positions")?.len(), 20);
    assert!((record.get_scalar("effective_sample_size")? - 20.0).abs() < 1e-3);
    Ok(())
}
