use crate::core::{AlgorithmConfig, PhasorEstimate};
use std::fmt;

/// Largest plausible amplitude, in engineering units.
pub const AMPLITUDE_CEILING: f64 = 1000.0;

/// Largest plausible rate of change of frequency (Hz/s).
pub const ROCOF_CEILING: f64 = 10.0;

/// Why an estimate was flagged invalid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    FrequencyOutOfBand { deviation: f64 },
    AmplitudeOutOfRange { amplitude: f64 },
    RocofTooHigh { rocof: f64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrequencyOutOfBand { deviation } => {
                write!(f, "frequency {:+.3} Hz from nominal", deviation)
            }
            Self::AmplitudeOutOfRange { amplitude } => write!(f, "amplitude {:.3} out of range", amplitude),
            Self::RocofTooHigh { rocof } => write!(f, "rocof {:.3} Hz/s too high", rocof),
        }
    }
}

/// Plausibility check. Non-finite values fail the matching bound.
pub fn validate(estimate: &PhasorEstimate, config: &AlgorithmConfig) -> Result<(), Rejection> {
    let deviation = estimate.frequency - config.nominal_frequency;
    if !(deviation.abs() <= config.outlier_threshold) {
        return Err(Rejection::FrequencyOutOfBand { deviation });
    }

    if !(estimate.amplitude > 0.0 && estimate.amplitude <= AMPLITUDE_CEILING) {
        return Err(Rejection::AmplitudeOutOfRange {
            amplitude: estimate.amplitude,
        });
    }

    if !(estimate.rocof.abs() <= ROCOF_CEILING) {
        return Err(Rejection::RocofTooHigh { rocof: estimate.rocof });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimate(frequency: f64, amplitude: f64, rocof: f64) -> PhasorEstimate {
        PhasorEstimate {
            frequency,
            amplitude,
            phase: 0.0,
            rocof,
            valid: false,
        }
    }

    #[test]
    fn test_accepts_nominal() {
        let config = AlgorithmConfig::default();
        assert_eq!(validate(&estimate(50.0, 230.0, 0.0), &config), Ok(()));
    }

    #[test]
    fn test_frequency_band_edges() {
        let config = AlgorithmConfig::default();
        assert!(validate(&estimate(55.0 - 1e-9, 1.0, 0.0), &config).is_ok());
        assert!(matches!(
            validate(&estimate(55.0 + 1e-9, 1.0, 0.0), &config),
            Err(Rejection::FrequencyOutOfBand { .. })
        ));
        assert!(validate(&estimate(45.0 + 1e-9, 1.0, 0.0), &config).is_ok());
        assert!(validate(&estimate(45.0 - 1e-9, 1.0, 0.0), &config).is_err());
    }

    #[test]
    fn test_amplitude_bounds() {
        let config = AlgorithmConfig::default();
        assert!(matches!(
            validate(&estimate(50.0, 0.0, 0.0), &config),
            Err(Rejection::AmplitudeOutOfRange { .. })
        ));
        assert!(validate(&estimate(50.0, 1000.0, 0.0), &config).is_ok());
        assert!(validate(&estimate(50.0, 1000.1, 0.0), &config).is_err());
    }

    #[test]
    fn test_rocof_bound() {
        let config = AlgorithmConfig::default();
        assert!(validate(&estimate(50.0, 1.0, -10.0), &config).is_ok());
        assert!(matches!(
            validate(&estimate(50.0, 1.0, 10.5), &config),
            Err(Rejection::RocofTooHigh { .. })
        ));
    }

    #[test]
    fn test_nan_is_rejected() {
        let config = AlgorithmConfig::default();
        assert!(validate(&estimate(f64::NAN, 1.0, 0.0), &config).is_err());
        assert!(validate(&estimate(50.0, f64::NAN, 0.0), &config).is_err());
        assert!(validate(&estimate(50.0, 1.0, f64::NAN), &config).is_err());
    }
}
