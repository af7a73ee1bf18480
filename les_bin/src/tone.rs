use les_blip::Resampler;

/// Square wave voice, timed in input clocks.
#[derive(Debug)]
pub struct Tone {
    half_period: u32,
    amplitude: i32,
    countdown: u32,
    high: bool,
}

impl Tone {
    pub fn new(clock_rate: f64, freq: f64, amplitude: i32) -> Self {
        let half_period = (clock_rate / freq / 2.0).round().max(1.0) as u32;
        Self {
            half_period,
            amplitude,
            countdown: half_period,
            high: true,
        }
    }

    pub fn half_period(&self) -> u32 {
        self.half_period
    }

    fn level(&self) -> i32 {
        if self.high {
            self.amplitude
        } else {
            self.amplitude.wrapping_neg()
        }
    }

    /// Runs the tone for `clocks` clocks from the resampler's cursor.
    pub fn run(&mut self, res: &mut Resampler, mut clocks: u32) {
        while clocks > 0 {
            let step = self.countdown.min(clocks);
            res.hold(self.level(), step);

            clocks -= step;
            self.countdown -= step;
            if self.countdown == 0 {
                self.high = !self.high;
                self.countdown = self.half_period;
            }
        }
    }
}
