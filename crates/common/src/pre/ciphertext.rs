use time::OffsetDateTime;

use super::error::PreError;
use crate::crypto::{IntegrityTag, Point};

/// Default maximum age of a timestamped message, in seconds
pub const FRESHNESS_WINDOW_SECS: f64 = 10.0;

/// Seconds since the Unix epoch, fractional
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Timestamp(f64);

impl Timestamp {
    pub fn now() -> Self {
        let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
        Self(nanos as f64 / 1e9)
    }

    pub fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> f64 {
        self.0
    }

    /// Shift by `secs` (negative moves into the past)
    pub fn offset(&self, secs: f64) -> Self {
        Self(self.0 + secs)
    }
}

/// Replay window check applied by the edge and by destinations.
///
/// Inclusive: a message exactly `window` seconds old is still accepted.
/// Skew in either direction counts, so future-dated messages are held to
/// the same bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Freshness {
    window: f64,
}

impl Default for Freshness {
    fn default() -> Self {
        Self {
            window: FRESHNESS_WINDOW_SECS,
        }
    }
}

impl Freshness {
    /// A window must be a positive, finite number of seconds.
    pub fn new(window_secs: f64) -> Result<Self, PreError> {
        if !window_secs.is_finite() || window_secs <= 0.0 {
            return Err(PreError::InvalidWindow(window_secs));
        }
        Ok(Self {
            window: window_secs,
        })
    }

    pub fn window(&self) -> f64 {
        self.window
    }

    pub fn check(&self, stamped: Timestamp, now: Timestamp) -> Result<(), PreError> {
        let age = (now.as_secs() - stamped.as_secs()).abs();
        // NaN never passes
        if age.is_nan() || age > self.window {
            return Err(PreError::StaleMessage {
                age,
                window: self.window,
            });
        }
        Ok(())
    }
}

/// Output of [`super::Encryptor`]: `c_t = r * pk_origin`, `c_m = r*P + M`
#[derive(Debug, Clone, PartialEq)]
pub struct Ciphertext {
    pub c_t: Point,
    pub c_m: Point,
    pub integrity_tag: IntegrityTag,
    pub origin_timestamp: Timestamp,
}

/// Output of [`super::ReEncryptor`]: `c_t_prime = rk * c_t`, `c_m` untouched
#[derive(Debug, Clone, PartialEq)]
pub struct ReEncryptedCiphertext {
    pub c_t_prime: Point,
    pub c_m: Point,
    pub integrity_tag: IntegrityTag,
    pub proxy_timestamp: Timestamp,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_freshness_boundary() {
        let freshness = Freshness::default();
        let now = Timestamp::now();

        assert!(freshness.check(now.offset(-9.9999), now).is_ok());
        assert!(matches!(
            freshness.check(now.offset(-10.0001), now),
            Err(PreError::StaleMessage { .. })
        ));
    }

    #[test]
    fn test_freshness_window_is_inclusive() {
        let freshness = Freshness::new(10.0).unwrap();
        let now = Timestamp::from_secs(1_000.0);
        assert!(freshness.check(Timestamp::from_secs(990.0), now).is_ok());
        assert!(freshness.check(Timestamp::from_secs(1_010.0), now).is_ok());
        assert!(freshness.check(Timestamp::from_secs(1_010.5), now).is_err());
    }

    #[test]
    fn test_unusable_windows_rejected() {
        for window in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -1.0, 0.0] {
            assert!(matches!(
                Freshness::new(window),
                Err(PreError::InvalidWindow(_))
            ));
        }
        assert_eq!(Freshness::new(0.5).unwrap().window(), 0.5);
    }

    #[test]
    fn test_nan_timestamp_is_stale() {
        let freshness = Freshness::default();
        let result = freshness.check(Timestamp::from_secs(f64::NAN), Timestamp::now());
        assert!(result.is_err());
    }

    #[test]
    fn test_now_is_after_2020() {
        assert!(Timestamp::now().as_secs() > 1_577_836_800.0);
    }
}
