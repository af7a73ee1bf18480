use super::{MAX_FRAME, MAX_RATIO};
use crate::{Error, Result};

/// Fixed-point output time. The integer part counts output samples.
#[cfg(not(feature = "fixed32"))]
pub type Fixed = u64;
#[cfg(feature = "fixed32")]
pub type Fixed = u32;

/// Extra precision kept in the factor, dropped before phase lookup.
#[cfg(not(feature = "fixed32"))]
pub(crate) const PRE_SHIFT: u32 = 32;
#[cfg(feature = "fixed32")]
pub(crate) const PRE_SHIFT: u32 = 0;

pub(crate) const FRAC_BITS: u32 = 20;
pub(crate) const TIME_BITS: u32 = PRE_SHIFT + FRAC_BITS;
pub(crate) const TIME_UNIT: Fixed = 1 << TIME_BITS;

/// Clock rate to sample rate ratio, as output time per input clock.
///
/// The factor is always rounded up, so a second of input clocks never
/// produces fewer than `sample_rate` samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    factor: Fixed,
}

impl Default for Rate {
    /// `MAX_RATIO` clocks per sample.
    fn default() -> Self {
        Self {
            factor: TIME_UNIT / MAX_RATIO as Fixed,
        }
    }
}

impl Rate {
    pub fn new(clock_rate: f64, sample_rate: f64) -> Result<Self> {
        for rate in [clock_rate, sample_rate] {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(Error::InvalidRate(rate));
            }
        }

        if clock_rate > sample_rate * MAX_RATIO as f64 {
            return Err(Error::RatioTooLarge {
                clock_rate,
                sample_rate,
            });
        }

        let factor = (TIME_UNIT as f64 * sample_rate / clock_rate).ceil();
        // a single clock must not span more than one frame
        if factor > TIME_UNIT as f64 * MAX_FRAME as f64 {
            return Err(Error::RatioTooSmall {
                clock_rate,
                sample_rate,
            });
        }

        Ok(Self {
            factor: (factor as Fixed).max(1),
        })
    }

    pub fn factor(&self) -> Fixed {
        self.factor
    }

    /// Offset a cleared buffer starts at: half a clock, capped below one
    /// sample so an empty frame stays empty.
    pub fn start_offset(&self) -> Fixed {
        (self.factor / 2).min(TIME_UNIT / 2)
    }

    /// Output time of `clocks` input clocks after `offset`, `None` on overflow.
    pub fn clocks_to_time(&self, clocks: u32, offset: Fixed) -> Option<Fixed> {
        (clocks as Fixed)
            .checked_mul(self.factor)?
            .checked_add(offset)
    }

    /// Fewest clocks after `offset` that reach `samples` whole samples.
    pub fn clocks_needed(&self, samples: usize, offset: Fixed) -> u32 {
        let needed = (samples as Fixed).saturating_mul(TIME_UNIT);
        if needed < offset {
            return 0;
        }

        let clocks = (needed - offset).div_ceil(self.factor);
        u32::try_from(clocks).unwrap_or(u32::MAX)
    }

    /// Whole samples covered by `time`.
    pub fn samples(time: Fixed) -> usize {
        (time >> TIME_BITS) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rate() {
        let rate = Rate::default();
        assert_eq!(rate.factor() as u64 * MAX_RATIO as u64, TIME_UNIT as u64);
        assert_eq!(rate.clocks_needed(1, 0), MAX_RATIO);
    }

    #[test]
    fn test_rounds_up() {
        let rate = Rate::new(1_000_000.0, 44_100.0).unwrap();
        let exact = TIME_UNIT as f64 * 44_100.0 / 1_000_000.0;
        assert!(rate.factor() as f64 >= exact);
        assert!((rate.factor() as f64) < exact + 1.0);

        // one second of clocks never comes up short
        let time = rate.clocks_to_time(1_000_000 / 25, 0).unwrap();
        assert!(Rate::samples(time) >= 44_100 / 25);
    }

    #[test]
    fn test_ratio_limits() {
        assert!(Rate::new(MAX_RATIO as f64 * 100.0, 100.0).is_ok());
        assert_eq!(
            Rate::new(MAX_RATIO as f64 * 100.0 + 1000.0, 100.0),
            Err(Error::RatioTooLarge {
                clock_rate: MAX_RATIO as f64 * 100.0 + 1000.0,
                sample_rate: 100.0,
            })
        );
        assert!(matches!(
            Rate::new(1.0, 1e9),
            Err(Error::RatioTooSmall { .. })
        ));
    }

    #[test]
    fn test_invalid_rates() {
        assert_eq!(Rate::new(0.0, 44_100.0), Err(Error::InvalidRate(0.0)));
        assert_eq!(Rate::new(1e6, -1.0), Err(Error::InvalidRate(-1.0)));
        assert!(matches!(
            Rate::new(f64::NAN, 44_100.0),
            Err(Error::InvalidRate(_))
        ));
        assert!(matches!(
            Rate::new(1e6, f64::INFINITY),
            Err(Error::InvalidRate(_))
        ));
    }

    #[test]
    fn test_clocks_to_time_overflow() {
        let rate = Rate::new(1_000.0, 48_000.0).unwrap();
        assert_eq!(rate.clocks_to_time(u32::MAX, Fixed::MAX), None);
        assert_eq!(rate.clocks_to_time(0, 7), Some(7));
    }

    #[test]
    fn test_start_offset() {
        let down = Rate::new(1_789_773.0, 48_000.0).unwrap();
        assert_eq!(down.start_offset(), down.factor() / 2);

        let up = Rate::new(1_000.0, 48_000.0).unwrap();
        assert!(up.factor() > TIME_UNIT);
        assert_eq!(up.start_offset(), TIME_UNIT / 2);
        assert_eq!(Rate::samples(up.start_offset()), 0);
        assert_eq!(up.clocks_needed(48, up.start_offset()), 1);
    }

    #[test]
    fn test_clocks_needed_inverse() {
        let rate = Rate::new(1_789_773.0, 48_000.0).unwrap();
        let offset = rate.start_offset();
        for samples in [1, 2, 3, 100, 735, 4000] {
            let clocks = rate.clocks_needed(samples, offset);
            let time = rate.clocks_to_time(clocks, offset).unwrap();
            assert_eq!(Rate::samples(time), samples);

            let short = rate.clocks_to_time(clocks - 1, offset).unwrap();
            assert_eq!(Rate::samples(short), samples - 1);
        }
        assert_eq!(rate.clocks_needed(0, offset), 0);
    }
}
