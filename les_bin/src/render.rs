use crate::{run_frame, ToneArgs, FRAME_RATE};
use std::path::Path;

/// Renders `seconds` of the configured tones into a WAV file.
pub fn render(path: &Path, seconds: f64, args: &ToneArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        seconds.is_finite() && seconds >= 0.0,
        "invalid duration {}",
        seconds
    );

    let channels = args.channels();
    let total = (seconds * args.sample_rate as f64).round() as usize;
    let frame_samples = (args.sample_rate as f64 / FRAME_RATE).ceil() as usize;
    anyhow::ensure!(
        frame_samples <= les_blip::MAX_FRAME,
        "sample rate {} too high for {} frames per second",
        args.sample_rate,
        FRAME_RATE
    );

    let mut voices = args.voices(args.sample_rate, frame_samples * 2)?;

    let spec = hound::WavSpec {
        channels: channels as u16,
        sample_rate: args.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;

    let mut buf = vec![0i16; frame_samples * channels];
    let mut written = 0;
    while written < total {
        let samples = frame_samples.min(total - written);
        run_frame(&mut voices, samples, &mut buf)?;

        for &s in buf[..samples * channels].iter() {
            writer.write_sample(s)?;
        }
        written += samples;
    }
    writer.finalize()?;

    tracing::info!(
        "rendered {} samples x {} channels to {}",
        written,
        channels,
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(stereo: bool) -> ToneArgs {
        ToneArgs {
            clock_rate: crate::CPU_FREQUENCY,
            sample_rate: 44_100,
            freq: 440.0,
            amplitude: 8000,
            fast: false,
            stereo,
            high_pass: false,
        }
    }

    fn read_wav(path: &Path) -> (hound::WavSpec, Vec<i16>) {
        let mut reader = hound::WavReader::open(path).unwrap();
        let samples = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        (reader.spec(), samples)
    }

    #[test]
    fn test_render_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        render(&path, 0.5, &args(false)).unwrap();

        let (spec, samples) = read_wav(&path);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 44_100);
        assert_eq!(samples.len(), 22_050);
        assert!(samples.iter().any(|&s| s == 8000));
        assert!(samples.iter().any(|&s| s == -8000));
    }

    #[test]
    fn test_render_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        render(&path, 0.25, &args(true)).unwrap();

        let (spec, samples) = read_wav(&path);
        assert_eq!(spec.channels, 2);
        assert_eq!(samples.len(), 2 * 11_025);

        let left: Vec<_> = samples.iter().step_by(2).copied().collect();
        let right: Vec<_> = samples.iter().skip(1).step_by(2).copied().collect();
        assert_ne!(left, right);
        assert!(right.iter().any(|&s| s == 8000));
    }

    #[test]
    fn test_render_rejects_bad_duration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        assert!(render(&path, f64::NAN, &args(false)).is_err());
    }
}
