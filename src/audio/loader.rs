// Click sample loading - WAV (hound) and FLAC (claxon), mixed down to mono

use crate::audio::error::AudioError;
use crate::config::ClickSamplePaths;
use crate::sequencer::ClickKit;
use claxon::FlacReader;
use hound::{SampleFormat, WavReader};
use std::path::Path;

/// Decoded mono sample
#[derive(Debug, Clone)]
pub struct Sample {
    pub name: String,
    pub data: Vec<f32>,
    pub sample_rate: u32,
}

pub fn load_sample(path: &Path) -> Result<Sample, AudioError> {
    let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

    let sample = match extension.to_lowercase().as_str() {
        "wav" => load_wav(path)?,
        "flac" => load_flac(path)?,
        _ => {
            return Err(AudioError::UnsupportedFormat(format!(
                "{} (expected .wav or .flac)",
                path.display()
            )));
        }
    };

    if sample.data.is_empty() {
        return Err(AudioError::EmptySample(path.display().to_string()));
    }
    Ok(sample)
}

fn sample_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

/// Average interleaved frames into one channel
fn mix_to_mono(interleaved: Vec<f32>, channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved;
    }
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

fn load_wav(path: &Path) -> Result<Sample, AudioError> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    Ok(Sample {
        name: sample_name(path),
        data: mix_to_mono(interleaved, spec.channels as usize),
        sample_rate: spec.sample_rate,
    })
}

fn load_flac(path: &Path) -> Result<Sample, AudioError> {
    let mut reader = FlacReader::open(path)?;
    let info = reader.streaminfo();
    let scale = (1i64 << (info.bits_per_sample - 1)) as f32;

    let interleaved: Vec<f32> = reader
        .samples()
        .map(|s| s.map(|s| s as f32 / scale))
        .collect::<Result<_, _>>()?;

    Ok(Sample {
        name: sample_name(path),
        data: mix_to_mono(interleaved, info.channels as usize),
        sample_rate: info.sample_rate,
    })
}

impl ClickKit {
    /// Load the three click sounds
    ///
    /// Samples are played back at the output rate as-is; a rate mismatch is
    /// only reported.
    pub fn from_files(paths: &ClickSamplePaths, output_rate: u32) -> Result<Self, AudioError> {
        let load = |path: &Path| -> Result<Vec<f32>, AudioError> {
            let sample = load_sample(path)?;
            if sample.sample_rate != output_rate {
                log::warn!(
                    "Click sample {} is {} Hz, output runs at {} Hz",
                    sample.name,
                    sample.sample_rate,
                    output_rate
                );
            }
            log::debug!("Loaded click sample {} ({} frames)", sample.name, sample.data.len());
            Ok(sample.data)
        };

        Ok(ClickKit::new(
            load(&paths.downbeat)?,
            load(&paths.beat)?,
            load(&paths.subdivision)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    fn write_wav(path: &Path, channels: u16, frames: &[i16]) {
        let spec = WavSpec {
            channels,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for sample in frames {
            writer.write_sample(*sample).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_load_wav_mixes_to_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("click.wav");
        write_wav(&path, 2, &[16384, 0, -16384, -16384]);

        let sample = load_sample(&path).unwrap();
        assert_eq!(sample.name, "click.wav");
        assert_eq!(sample.sample_rate, 44100);
        assert_eq!(sample.data.len(), 2);
        assert!((sample.data[0] - 0.25).abs() < 1e-4);
        assert!((sample.data[1] + 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_unsupported_format() {
        let result = load_sample(Path::new("click.aif"));
        assert!(matches!(result, Err(AudioError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_empty_wav_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        write_wav(&path, 1, &[]);
        assert!(matches!(load_sample(&path), Err(AudioError::EmptySample(_))));
    }

    #[test]
    fn test_kit_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ClickSamplePaths {
            downbeat: dir.path().join("a.wav"),
            beat: dir.path().join("b.wav"),
            subdivision: dir.path().join("c.wav"),
        };
        write_wav(&paths.downbeat, 1, &[1000; 10]);
        write_wav(&paths.beat, 1, &[1000; 20]);
        write_wav(&paths.subdivision, 1, &[1000; 30]);

        let kit = ClickKit::from_files(&paths, 44100).unwrap();
        assert_eq!(kit.max_click_len(), 30);
        assert_eq!(kit.get_click(crate::sequencer::ClickType::BeatStart).len(), 20);

        std::fs::remove_file(&paths.subdivision).unwrap();
        assert!(ClickKit::from_files(&paths, 44100).is_err());
    }
}
