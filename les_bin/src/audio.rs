use crate::{run_frame, tone::Tone, ToneArgs, FRAME_RATE};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use les_blip::Resampler;
use std::sync::{Arc, Mutex};

/// Pulls frames from the voices as the output device drains them.
struct AudioRunner {
    voices: Vec<(Tone, Resampler)>,
    frame_samples: usize,
    queue_buf: Box<[i16]>,
    pos: usize,
    len: usize,
}

impl AudioRunner {
    fn new(voices: Vec<(Tone, Resampler)>, frame_samples: usize) -> Self {
        let channels = voices.len();
        Self {
            voices,
            frame_samples,
            queue_buf: vec![0i16; frame_samples * channels].into_boxed_slice(),
            pos: 0,
            len: 0,
        }
    }

    /// Next left/right pair, mono voices play on both sides.
    fn next_frame(&mut self) -> [i16; 2] {
        let channels = self.voices.len();
        if self.pos == self.len {
            self.pos = 0;
            self.len = 0;
            match run_frame(&mut self.voices, self.frame_samples, &mut self.queue_buf) {
                Ok(()) => self.len = self.frame_samples * channels,
                Err(err) => {
                    tracing::error!("audio frame failed: {}", err);
                    return [0; 2];
                }
            }
        }

        let left = self.queue_buf[self.pos];
        let right = self.queue_buf[self.pos + channels - 1];
        self.pos += channels;
        [left, right]
    }
}

fn build<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    runner: Arc<Mutex<AudioRunner>>,
) -> anyhow::Result<cpal::Stream>
where
    T: SizedSample + FromSample<i16>,
{
    let channels = config.channels as usize;
    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let Ok(mut runner) = runner.lock() else {
                return;
            };
            data.chunks_exact_mut(channels).for_each(|frame| {
                let pair = runner.next_frame();
                frame
                    .iter_mut()
                    .enumerate()
                    .for_each(|(i, s)| *s = T::from_sample(pair[i % 2]));
            });
        },
        |err| tracing::error!("an error occurred on stream: {}", err),
        None,
    )?;
    Ok(stream)
}

/// Plays the configured tones on the default output device.
pub fn play(seconds: f64, args: &ToneArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        seconds.is_finite() && seconds >= 0.0,
        "invalid duration {}",
        seconds
    );

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow::anyhow!("no default output device"))?;
    let supported = device.default_output_config()?;
    let sample_rate = supported.sample_rate().0;
    tracing::info!("playing at {} Hz, {:?}", sample_rate, supported.sample_format());

    // short frames keep latency low
    let frame_samples = (sample_rate as f64 / FRAME_RATE / 4.0).ceil() as usize;
    anyhow::ensure!(
        frame_samples <= les_blip::MAX_FRAME,
        "device rate {} Hz too high",
        sample_rate
    );
    let voices = args.voices(sample_rate, frame_samples * 2)?;
    let runner = Arc::new(Mutex::new(AudioRunner::new(voices, frame_samples)));

    let config: cpal::StreamConfig = supported.config();
    let stream = match supported.sample_format() {
        cpal::SampleFormat::I16 => build::<i16>(&device, &config, runner)?,
        cpal::SampleFormat::U16 => build::<u16>(&device, &config, runner)?,
        cpal::SampleFormat::F32 => build::<f32>(&device, &config, runner)?,
        format => anyhow::bail!("unsupported sample format {:?}", format),
    };
    stream.play()?;

    std::thread::sleep(std::time::Duration::from_secs_f64(seconds));
    Ok(())
}
