use clap::{Args, Parser, Subcommand};
use les_blip::{Quality, Resampler};
use std::path::PathBuf;

#[cfg(feature = "playback")]
mod audio;
mod render;
mod tone;

use tone::Tone;

/// NES NTSC master clock
pub const MASTER_CLOCK: f64 = 21_477_272.0;

/// cpu frequency
pub const CPU_FREQUENCY: f64 = MASTER_CLOCK / 12.0;

/// Audio frames per second, one per video frame.
pub const FRAME_RATE: f64 = 60.0;

#[derive(Parser, Debug)]
#[command(name = "les_bin", about = "Band-limited square wave synthesis demo")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render tones to a 16-bit WAV file
    Render {
        /// Output WAV path
        #[arg(short, long)]
        out: PathBuf,
        #[arg(long, default_value_t = 2.0)]
        seconds: f64,
        #[command(flatten)]
        tone: ToneArgs,
    },
    /// Play tones on the default output device
    #[cfg(feature = "playback")]
    Play {
        #[arg(long, default_value_t = 2.0)]
        seconds: f64,
        #[command(flatten)]
        tone: ToneArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ToneArgs {
    /// Input clock rate in Hz
    #[arg(long, default_value_t = CPU_FREQUENCY)]
    pub clock_rate: f64,
    /// Output sample rate in Hz (playback uses the device rate)
    #[arg(long, default_value_t = 44_100)]
    pub sample_rate: u32,
    /// Tone frequency in Hz
    #[arg(long, default_value_t = 440.0)]
    pub freq: f64,
    #[arg(long, default_value_t = 8000)]
    pub amplitude: i32,
    /// Use the cheaper two-tap kernel
    #[arg(long)]
    pub fast: bool,
    /// Add a second voice a fifth up on the right channel
    #[arg(long)]
    pub stereo: bool,
    /// Enable the DC-blocking filter
    #[arg(long)]
    pub high_pass: bool,
}

impl ToneArgs {
    pub fn channels(&self) -> usize {
        if self.stereo {
            2
        } else {
            1
        }
    }

    /// One tone and resampler per channel, running at `sample_rate`.
    pub fn voices(
        &self,
        sample_rate: u32,
        size: usize,
    ) -> anyhow::Result<Vec<(Tone, Resampler)>> {
        let quality = if self.fast {
            Quality::Fast
        } else {
            Quality::Standard
        };

        [1.0, 1.5][..self.channels()]
            .iter()
            .map(|&ratio| -> anyhow::Result<(Tone, Resampler)> {
                let mut res = Resampler::new(size)?.with_quality(quality);
                res.set_rates(self.clock_rate, sample_rate as f64)?;
                res.set_high_pass(self.high_pass);
                res.clear();

                let tone = Tone::new(self.clock_rate, self.freq * ratio, self.amplitude);
                tracing::debug!(
                    "voice at {:.1} Hz, half period {} clocks",
                    self.freq * ratio,
                    tone.half_period()
                );
                Ok((tone, res))
            })
            .collect()
    }
}

/// Runs every voice for `samples` more samples and reads them into `buf`,
/// interleaved when there are two voices.
pub fn run_frame(
    voices: &mut [(Tone, Resampler)],
    samples: usize,
    buf: &mut [i16],
) -> anyhow::Result<()> {
    let stereo = voices.len() > 1;
    let channels = voices.len();

    for (ch, (tone, res)) in voices.iter_mut().enumerate() {
        let clocks = res.clocks_needed(samples);
        tone.run(res, clocks);
        res.end_frame()?;

        let read = res.read_samples(&mut buf[ch..samples * channels], stereo);
        anyhow::ensure!(read == samples, "short read: {} of {} samples", read, samples);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Render { out, seconds, tone } => render::render(&out, seconds, &tone),
        #[cfg(feature = "playback")]
        Command::Play { seconds, tone } => audio::play(seconds, &tone),
    }
}
