//! Mono 8-bit PCM output.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::{Error, Result};

/// Truncates a sample rate reported by the scope to a WAV frame rate, which must be at least 1.
pub fn frame_rate(sample_rate: f64) -> Result<u32> {
    if !sample_rate.is_finite() || sample_rate.trunc() < 1.0 || sample_rate.trunc() > u32::MAX as f64 {
        return Err(Error::InvalidResponse {
            command: crate::commands::QUERY_SAMPLE_RATE.to_owned(),
            reply: sample_rate.to_string(),
        })
    }
    Ok(sample_rate as u32)
}

fn write_frames<W: Write + Seek>(writer: W, frame_rate: u32, payload: &[u8]) -> hound::Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: frame_rate,
        bits_per_sample: 8,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::new(writer, spec)?;
    // 8-bit WAV samples are stored offset by 0x80; undo the offset hound applies so the
    // scope's bytes land in the file unchanged
    for &byte in payload {
        writer.write_sample((byte ^ 0x80) as i8)?;
    }
    writer.finalize()
}

/// Writes `payload` verbatim as the frames of a mono 8-bit WAV file, replacing any existing file.
///
/// A partially written file is removed before the error is returned.
pub fn write_wav(path: &Path, frame_rate: u32, payload: &[u8]) -> Result<()> {
    if frame_rate == 0 {
        return Err(hound::Error::FormatError("frame rate must be nonzero").into())
    }
    let file = File::create(path).map_err(hound::Error::IoError)?;
    match write_frames(BufWriter::new(file), frame_rate, payload) {
        Ok(()) => {
            log::debug!("wrote {} frames at {} Hz to {}", payload.len(), frame_rate, path.display());
            Ok(())
        }
        Err(error) => {
            if let Err(remove_error) = std::fs::remove_file(path) {
                log::warn!("cannot remove partial output {}: {}", path.display(), remove_error);
            }
            Err(error.into())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn read_back(path: &Path) -> (WavSpec, u32, Vec<u8>) {
        let mut reader = hound::WavReader::open(path).unwrap();
        let spec = reader.spec();
        let frames = reader.duration();
        let payload = reader.samples::<i8>().map(|sample| (sample.unwrap() as u8) ^ 0x80).collect();
        (spec, frames, payload)
    }

    #[test]
    fn test_frame_rate() {
        assert_eq!(frame_rate(1000000.0).unwrap(), 1000000);
        assert_eq!(frame_rate(2.5e8).unwrap(), 250000000);
        assert_eq!(frame_rate(44100.9).unwrap(), 44100);
        assert_eq!(frame_rate(1.0).unwrap(), 1);
        for invalid in [f64::NAN, f64::INFINITY, -1.0, 0.0, 0.5, 0.999, 1e10] {
            assert!(matches!(frame_rate(invalid), Err(Error::InvalidResponse { .. })), "{}", invalid);
        }
    }

    #[test]
    fn test_payload_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channel1.wav");
        let payload = (0..=255u8).cycle().take(1000).collect::<Vec<_>>();
        write_wav(&path, 1000000, &payload).unwrap();

        let (spec, frames, samples) = read_back(&path);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 8);
        assert_eq!(spec.sample_format, SampleFormat::Int);
        assert_eq!(spec.sample_rate, 1000000);
        assert_eq!(frames, 1000);
        assert_eq!(samples, payload);
        assert!(std::fs::read(&path).unwrap().ends_with(&payload));
    }

    #[test]
    fn test_empty_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        write_wav(&path, 500, &[]).unwrap();

        let (spec, frames, samples) = read_back(&path);
        assert_eq!(spec.sample_rate, 500);
        assert_eq!(frames, 0);
        assert!(samples.is_empty());
    }

    #[test]
    fn test_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channel1.wav");
        write_wav(&path, 100, &[7; 4096]).unwrap();
        let long_len = std::fs::metadata(&path).unwrap().len();
        write_wav(&path, 200, &[1, 2, 3, 4]).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() < long_len);

        let (spec, frames, samples) = read_back(&path);
        assert_eq!(spec.sample_rate, 200);
        assert_eq!(frames, 4);
        assert_eq!(samples, [1, 2, 3, 4]);
    }

    #[test]
    fn test_zero_frame_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channel1.wav");
        assert!(matches!(write_wav(&path, 0, &[1, 2, 3]), Err(Error::Output(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("channel1.wav");
        assert!(matches!(write_wav(&path, 100, &[1]), Err(Error::Output(_))));
        assert!(!path.exists());
    }
}
