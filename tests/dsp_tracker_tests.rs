use pmucore::core::{AlgorithmConfig, PhasorEstimate};
use pmucore::dsp::{fuse_frequency, unwrap_phase_step, validate, ChannelHistory, Rejection};
use std::f64::consts::PI;

#[test]
fn test_unwrap_lands_in_half_open_interval() {
    for i in -400..=400 {
        let dphase = i as f64 * 0.0157;
        let unwrapped = unwrap_phase_step(dphase);
        // Inputs within (-3 pi, 3 pi) need at most one correction
        assert!(unwrapped > -PI && unwrapped <= PI, "{} -> {}", dphase, unwrapped);
        let turns = (dphase - unwrapped) / (2.0 * PI);
        assert!((turns - turns.round()).abs() < 1e-9);
    }
}

#[test]
fn test_fusion_weights() {
    for &(interpolated, from_phase) in &[(50.3, 49.9), (60.0, 61.0), (45.0, 45.0)] {
        assert_eq!(fuse_frequency(interpolated, from_phase, 1.0), interpolated);
        assert_eq!(fuse_frequency(interpolated, from_phase, 0.0), from_phase);
    }
}

#[test]
fn test_phase_ramp_tracks_off_nominal_frequency() {
    // A 50.5 Hz tone advances 0.5 * 2 pi * 0.02 rad per 20 ms frame
    // relative to a 50 Hz reference; pure phase tracking follows it.
    let config = AlgorithmConfig {
        tracking_alpha: 0.0,
        ..Default::default()
    };
    let mut history = ChannelHistory::new(50.0);
    let step = 2.0 * PI * 0.5 * 0.02;

    let mut phase: f64 = 0.0;
    let mut last = None;
    for _ in 0..5 {
        phase += step;
        let wrapped = phase.sin().atan2(phase.cos());
        last = Some(history.advance(50.0, wrapped, 0.02, &config));
    }

    let tracked = last.unwrap();
    assert!(tracked.frequency > 50.0);
    assert_eq!(history.frames_tracked, 5);
}

#[test]
fn test_rocof_is_frequency_step_over_period() {
    let config = AlgorithmConfig {
        tracking_alpha: 1.0,
        ..Default::default()
    };
    let mut history = ChannelHistory::new(50.0);

    let tracked = history.advance(50.1, 0.0, 0.02, &config);
    assert!((tracked.frequency - 50.1).abs() < 1e-12);
    assert!((tracked.rocof - 5.0).abs() < 1e-9);
}

#[test]
fn test_validator_uses_configured_band() {
    let config = AlgorithmConfig {
        nominal_frequency: 60.0,
        outlier_threshold: 1.0,
        ..Default::default()
    };
    let mut estimate = PhasorEstimate {
        frequency: 60.9,
        amplitude: 120.0,
        phase: 0.0,
        rocof: 0.0,
        valid: false,
    };
    assert!(validate(&estimate, &config).is_ok());

    estimate.frequency = 61.1;
    assert!(matches!(
        validate(&estimate, &config),
        Err(Rejection::FrequencyOutOfBand { .. })
    ));
}
