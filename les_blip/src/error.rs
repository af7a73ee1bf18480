use thiserror::Error;

use crate::blip::{MAX_FRAME, MAX_RATIO};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("blip: cannot allocate buffer for {size} samples")]
    Alloc { size: usize },

    #[error("blip: invalid rate {0}, must be finite and positive")]
    InvalidRate(f64),

    #[error("blip: clock rate {clock_rate} exceeds {} times sample rate {sample_rate}", MAX_RATIO)]
    RatioTooLarge { clock_rate: f64, sample_rate: f64 },

    #[error("blip: sample rate {sample_rate} too high for clock rate {clock_rate}")]
    RatioTooSmall { clock_rate: f64, sample_rate: f64 },

    #[error("blip: frame of {clocks} clocks yields more than {} samples", MAX_FRAME)]
    FrameTooLong { clocks: u32 },

    /// Unread samples must be drained before the frame can end.
    #[error("blip: frame of {samples} samples overflows buffer ({avail} of {capacity} unread)")]
    BufferFull {
        samples: usize,
        avail: usize,
        capacity: usize,
    },
}
