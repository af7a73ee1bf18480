use crate::{Blip, Quality, Result};

/// Clock-stepped front end for [`Blip`].
///
/// Takes the output level at each input clock and only passes changes on
/// as deltas, for emulation code that is ticked one clock at a time.
pub struct Resampler {
    blip: Blip,
    quality: Quality,
    level: i32,
    clocks: u32,
}

impl Resampler {
    pub fn new(size: usize) -> Result<Self> {
        Ok(Self {
            blip: Blip::new(size)?,
            quality: Quality::Standard,
            level: 0,
            clocks: 0,
        })
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn set_rates(&mut self, clock_rate: f64, sample_rate: f64) -> Result<()> {
        self.blip.set_rates(clock_rate, sample_rate)
    }

    pub fn set_high_pass(&mut self, enabled: bool) {
        self.blip.set_high_pass(enabled);
    }

    /// Level for the clock at the cursor.
    pub fn add_sample(&mut self, level: i32) {
        self.hold(level, 1);
    }

    /// Holds `level` for `clocks` clocks starting at the cursor.
    pub fn hold(&mut self, level: i32, clocks: u32) {
        if level != self.level {
            self.blip
                .add(self.clocks, level.wrapping_sub(self.level), self.quality);
            self.level = level;
        }

        self.clocks = self.clocks.saturating_add(clocks);
    }

    /// Clocks run in the current frame.
    pub fn clocks(&self) -> u32 {
        self.clocks
    }

    pub fn clocks_needed(&self, samples: usize) -> u32 {
        self.blip.clocks_needed(samples)
    }

    /// Ends the frame at the cursor. On error the frame stays open.
    pub fn end_frame(&mut self) -> Result<()> {
        self.blip.end_frame(self.clocks)?;
        self.clocks = 0;
        Ok(())
    }

    pub fn read_samples(&mut self, buf: &mut [i16], stereo: bool) -> usize {
        self.blip.read_samples(buf, buf.len(), stereo)
    }

    pub fn clear(&mut self) {
        self.clocks = 0;
        self.level = 0;
        self.blip.clear();
    }

    pub fn avail(&self) -> usize {
        self.blip.samples_avail()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    const CPU_FREQUENCY: f64 = 1_789_773.0;

    fn resampler(quality: Quality) -> Resampler {
        let mut res = Resampler::new(2048).unwrap().with_quality(quality);
        res.set_rates(CPU_FREQUENCY, 48_000.0).unwrap();
        res.clear();
        res
    }

    fn blip() -> Blip {
        let mut blip = Blip::new(2048).unwrap();
        blip.set_rates(CPU_FREQUENCY, 48_000.0).unwrap();
        blip.clear();
        blip
    }

    #[test]
    fn test_matches_direct_deltas() {
        for quality in [Quality::Standard, Quality::Fast] {
            let mut res = resampler(quality);
            let mut blip = blip();

            let levels = [(0, 120), (1000, 4000), (2500, 4000), (3100, -2500), (7000, 0)];
            let mut last = 0;
            for &(clock, level) in levels.iter() {
                res.hold(last, clock - res.clocks());
                res.add_sample(level);
                if level != last {
                    blip.add(clock, level - last, quality);
                }
                last = level;
            }
            res.hold(last, 20_000 - res.clocks());

            assert_eq!(res.clocks(), 20_000);
            res.end_frame().unwrap();
            blip.end_frame(20_000).unwrap();
            assert_eq!(res.clocks(), 0);
            assert_eq!(res.avail(), blip.samples_avail());

            let mut a = vec![0i16; res.avail()];
            let mut b = vec![0i16; blip.samples_avail()];
            res.read_samples(&mut a, false);
            blip.read_samples(&mut b, usize::MAX, false);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_constant_level_is_silent() {
        let mut res = resampler(Quality::Standard);
        for _ in 0..5000 {
            res.add_sample(0);
        }
        res.end_frame().unwrap();

        let mut out = vec![1i16; res.avail()];
        assert!(!out.is_empty());
        res.read_samples(&mut out, false);
        assert!(out.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_clocks_needed() {
        let mut res = resampler(Quality::Standard);
        let clocks = res.clocks_needed(800);
        res.hold(1000, clocks);
        res.end_frame().unwrap();
        assert_eq!(res.avail(), 800);

        let mut out = vec![0i16; 800];
        assert_eq!(res.read_samples(&mut out, false), 800);
        assert_eq!(out[799], 1000);
    }

    #[test]
    fn test_frame_too_long_keeps_cursor() {
        let mut res = resampler(Quality::Standard);
        res.hold(0, 1_000_000);
        assert!(matches!(
            res.end_frame(),
            Err(Error::FrameTooLong { clocks: 1_000_000 })
        ));
        assert_eq!(res.clocks(), 1_000_000);
    }

    #[test]
    fn test_clear() {
        let mut res = resampler(Quality::Fast);
        res.hold(9000, 400);
        res.end_frame().unwrap();
        res.hold(9000, 400);

        res.clear();
        assert_eq!(res.avail(), 0);
        assert_eq!(res.clocks(), 0);

        // level restarts from zero, so this is a fresh step
        res.hold(500, 4000);
        res.end_frame().unwrap();
        let mut out = vec![0i16; res.avail()];
        res.read_samples(&mut out, false);
        assert_eq!(out.last(), Some(&500));
    }
}
