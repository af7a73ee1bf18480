pub mod blip;
pub mod error;
pub mod resampler;

pub use blip::{Blip, Quality, Rate, END_FRAME_EXTRA, MAX_FRAME, MAX_RATIO};
pub use error::{Error, Result};
pub use resampler::Resampler;
