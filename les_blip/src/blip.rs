//! Band-limited synthesis buffer, after blargg's blip_buf.
//!
//! Deltas are added at input clock times, spread over the output samples
//! by a band-limited step kernel, and summed back into a waveform when
//! samples are read out.

mod kernel;
mod rate;

use crate::{Error, Result};
use bit_field::BitField;
use kernel::{DELTA_BITS, WIDTH};
use rate::{Fixed, FRAC_BITS, PRE_SHIFT, TIME_UNIT};

pub use kernel::Quality;
pub use rate::Rate;

/// Maximum clock rate / sample rate ratio. For a given sample rate, the
/// clock rate must not be greater than `sample_rate * MAX_RATIO`.
pub const MAX_RATIO: u32 = 1 << 20;
/// Maximum number of samples a single time frame can produce.
pub const MAX_FRAME: usize = 4000;
/// Output samples past the end of a frame at which deltas are still
/// accepted, even when the buffer is full.
pub const END_FRAME_EXTRA: usize = 2;

/// Breakpoint of the optional DC-blocking filter.
const BASS_SHIFT: u32 = 9;
const BUF_EXTRA: usize = WIDTH + END_FRAME_EXTRA;

pub struct Blip {
    rate: Rate,
    offset: Fixed,
    avail: usize,
    size: usize,
    /// One past the last cell a kernel has been added to.
    extent: usize,
    integrator: i32,
    high_pass: bool,
    buf: Box<[i32]>,
}

impl Blip {
    /// Creates a buffer that holds at most `size` unread samples, with
    /// `MAX_RATIO` clocks per sample until [`Blip::set_rates`] is called.
    pub fn new(size: usize) -> Result<Self> {
        let len = size.checked_add(BUF_EXTRA).ok_or(Error::Alloc { size })?;

        let mut buf = Vec::new();
        buf.try_reserve_exact(len).map_err(|_| Error::Alloc { size })?;
        buf.resize(len, 0i32);

        let rate = Rate::default();
        Ok(Self {
            rate,
            offset: rate.start_offset(),
            avail: 0,
            size,
            extent: 0,
            integrator: 0,
            high_pass: false,
            buf: buf.into_boxed_slice(),
        })
    }

    /// Sets the input clock rate and output sample rate. For every
    /// `clock_rate` input clocks, approximately `sample_rate` samples are
    /// generated. Buffered samples are kept; on error nothing changes.
    pub fn set_rates(&mut self, clock_rate: f64, sample_rate: f64) -> Result<()> {
        self.rate = Rate::new(clock_rate, sample_rate)?;
        log::debug!(
            "blip rates set: {} clocks/s -> {} samples/s (factor {})",
            clock_rate,
            sample_rate,
            self.rate.factor()
        );
        Ok(())
    }

    pub fn rate(&self) -> Rate {
        self.rate
    }

    /// Enables the DC-blocking high-pass filter applied while reading.
    pub fn set_high_pass(&mut self, enabled: bool) {
        self.high_pass = enabled;
    }

    /// Discards buffered samples, pending deltas and the running sum.
    pub fn clear(&mut self) {
        // half a clock tolerates the factor having been rounded either way
        self.offset = self.rate.start_offset();
        self.avail = 0;
        self.extent = 0;
        self.integrator = 0;
        self.buf.fill(0);
    }

    pub fn capacity(&self) -> usize {
        self.size
    }

    /// Length of time frame, in clocks, needed to make `samples` more
    /// samples available.
    pub fn clocks_needed(&self, samples: usize) -> u32 {
        self.rate.clocks_needed(samples, self.offset)
    }

    /// Makes input clocks before `clock_duration` available as output
    /// samples and starts a new time frame there.
    ///
    /// Fails without changing anything if the frame would produce more than
    /// [`MAX_FRAME`] samples or overflow the buffer; read samples out and
    /// end the frame again.
    pub fn end_frame(&mut self, clock_duration: u32) -> Result<()> {
        let off = self
            .rate
            .clocks_to_time(clock_duration, self.offset)
            .ok_or(Error::FrameTooLong {
                clocks: clock_duration,
            })?;

        let samples = Rate::samples(off);
        if samples > MAX_FRAME {
            log::warn!("blip frame of {} clocks rejected: too long", clock_duration);
            return Err(Error::FrameTooLong {
                clocks: clock_duration,
            });
        }
        if self.avail + samples > self.size {
            log::warn!(
                "blip frame of {} samples rejected: {} of {} already buffered",
                samples,
                self.avail,
                self.size
            );
            return Err(Error::BufferFull {
                samples,
                avail: self.avail,
                capacity: self.size,
            });
        }

        self.avail += samples;
        self.offset = off & (TIME_UNIT - 1);
        Ok(())
    }

    /// Number of buffered samples available for reading.
    pub fn samples_avail(&self) -> usize {
        self.avail
    }

    /// Reads and removes at most `count` samples into `out`, returning the
    /// number read. With `stereo`, writes every other element of `out`, so
    /// two buffers can be interleaved into one stereo stream.
    pub fn read_samples(&mut self, out: &mut [i16], count: usize, stereo: bool) -> usize {
        let step = if stereo { 2 } else { 1 };
        let count = count.min(self.avail).min(out.len().div_ceil(step));

        if count > 0 {
            let mut sum = self.integrator;

            for (&cell, o) in self.buf[..count].iter().zip(out.iter_mut().step_by(step)) {
                let s = (sum >> DELTA_BITS).clamp(i16::MIN as i32, i16::MAX as i32);
                sum = sum.wrapping_add(cell);
                *o = s as i16;

                if self.high_pass {
                    sum = sum.wrapping_sub(s << (DELTA_BITS - BASS_SHIFT));
                }
            }

            self.integrator = sum;
            self.remove_samples(count);
        }

        count
    }

    fn remove_samples(&mut self, count: usize) {
        self.avail -= count;

        // cells past the extent are all zero, so only the pending span moves
        let end = self.extent.max(count);
        let remain = end - count;
        self.buf.copy_within(count..end, 0);
        self.buf[remain..end].fill(0);
        self.extent = remain;
    }

    /// Adds a positive or negative delta at the given clock time.
    pub fn add_delta(&mut self, time: u32, delta: i32) {
        self.add(time, delta, Quality::Standard);
    }

    /// Same as [`Blip::add_delta`], with faster, lower quality synthesis.
    pub fn add_delta_fast(&mut self, time: u32, delta: i32) {
        self.add(time, delta, Quality::Fast);
    }

    /// Adds a delta using the kernel of the given quality.
    ///
    /// Deltas whose kernel span falls outside the buffer are dropped.
    pub fn add(&mut self, time: u32, delta: i32, quality: Quality) {
        let Some(fixed) = self.rate.clocks_to_time(time, self.offset) else {
            log::warn!("blip delta at clock {} dropped: time overflow", time);
            return;
        };

        let fixed = fixed >> PRE_SHIFT;
        let pos = self.avail + (fixed >> FRAC_BITS) as usize;
        let frac = (fixed as u32).get_bits(0..FRAC_BITS as usize);

        let Some(out) = self
            .buf
            .get_mut(pos..pos + WIDTH)
            .and_then(|out| <&mut [i32; WIDTH]>::try_from(out).ok())
        else {
            log::warn!(
                "blip delta at clock {} dropped: sample {} past buffer end",
                time,
                pos
            );
            return;
        };

        quality.spread(out, frac, delta);
        self.extent = self.extent.max(pos + WIDTH);
    }
}
