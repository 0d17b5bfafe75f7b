use std::path::PathBuf;
use std::time::Duration;

/// UART 8N1 framing spends ten line bits per byte.
const UART_BITS_PER_BYTE: u64 = 10;

/// Configuration for a capture session.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfiguration {
    /// PCM sample rate in Hz written to the WAV header (default: 16000).
    pub sample_rate: u32,

    /// Capture length in seconds. `None` or a non-positive value records
    /// until the source closes or the session is cancelled.
    pub target_duration_secs: Option<f64>,

    /// Output WAV file. Parent directories are created on open.
    pub output_path: PathBuf,

    /// How long one synchronization attempt may hunt for the magic marker
    /// before it is reported as a sync timeout (default: 5s).
    pub sync_timeout: Duration,

    /// Bound passed to every individual byte source read (default: 1s).
    pub read_timeout: Duration,

    /// Write a `<file>.metadata.json` sidecar next to the recording.
    pub write_metadata: bool,

    /// Line rate of the transport, if known. Used to reject sample rates the
    /// link cannot carry.
    pub baud_rate: Option<u32>,
}

impl CaptureConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if self.sync_timeout.is_zero() {
            return Err("sync timeout must be positive".into());
        }
        if self.read_timeout.is_zero() {
            return Err("read timeout must be positive".into());
        }
        if let Some(secs) = self.target_duration_secs {
            if !secs.is_finite() {
                return Err(format!("invalid target duration: {}", secs));
            }
        }
        if let Some(baud) = self.baud_rate {
            let required = self.sample_rate as u64 * 2 * UART_BITS_PER_BYTE;
            if required > baud as u64 {
                return Err(format!(
                    "baud rate {} cannot carry {} Hz mono 16-bit audio (needs {})",
                    baud, self.sample_rate, required
                ));
            }
        }
        Ok(())
    }

    /// Number of samples after which the capture is complete.
    ///
    /// `floor(secs * rate)`; a duration that rounds down to zero samples
    /// means no target, the same as leaving it unset.
    pub fn target_samples(&self) -> Option<u64> {
        let secs = self.target_duration_secs.filter(|secs| *secs > 0.0)?;
        let samples = (secs * self.sample_rate as f64).floor() as u64;
        (samples > 0).then_some(samples)
    }
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            target_duration_secs: None,
            output_path: PathBuf::from("capture.wav"),
            sync_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(1),
            write_metadata: false,
            baud_rate: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(CaptureConfiguration::default().validate().is_ok());
    }

    #[test]
    fn zero_sample_rate_rejected() {
        let config = CaptureConfiguration {
            sample_rate: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_timeouts_rejected() {
        let config = CaptureConfiguration {
            sync_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CaptureConfiguration {
            read_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn baud_budget() {
        // 44096 Hz * 2 bytes * 10 bits = 881920 bps fits in 921600.
        let config = CaptureConfiguration {
            sample_rate: 44096,
            baud_rate: Some(921_600),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let config = CaptureConfiguration {
            sample_rate: 48000,
            baud_rate: Some(921_600),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("921600"));
    }

    #[test]
    fn target_samples_from_duration() {
        let config = CaptureConfiguration {
            sample_rate: 16000,
            target_duration_secs: Some(2.5),
            ..Default::default()
        };
        assert_eq!(config.target_samples(), Some(40000));
    }

    #[test]
    fn non_positive_duration_is_indefinite() {
        for secs in [None, Some(0.0), Some(-3.0)] {
            let config = CaptureConfiguration {
                target_duration_secs: secs,
                ..Default::default()
            };
            assert_eq!(config.target_samples(), None);
        }
    }

    #[test]
    fn duration_below_one_sample_is_indefinite() {
        let config = CaptureConfiguration {
            sample_rate: 8,
            target_duration_secs: Some(0.01),
            ..Default::default()
        };
        assert_eq!(config.target_samples(), None);

        let config = CaptureConfiguration {
            sample_rate: 8,
            target_duration_secs: Some(0.125),
            ..Default::default()
        };
        assert_eq!(config.target_samples(), Some(1));
    }

    #[test]
    fn unbounded_timeouts_are_valid() {
        let config = CaptureConfiguration {
            sync_timeout: Duration::MAX,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
