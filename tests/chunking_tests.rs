// Integration tests for decoding recordings and planning transcription windows

mod common;

use anyhow::Result;
use common::{wav_bytes, SAMPLE_RATE};
use loqa_transcribe::audio::{plan_windows, AudioFile};
use std::time::Duration;
use tempfile::TempDir;

fn write_wav(dir: &TempDir, name: &str, seconds: f64, sample_rate: u32, channels: u16) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, wav_bytes(seconds, sample_rate, channels)).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_ninety_seconds_splits_into_three_full_windows() {
    let windows = plan_windows(90 * SAMPLE_RATE as usize, SAMPLE_RATE, Duration::from_secs(30));

    assert_eq!(windows.len(), 3);
    for (i, window) in windows.iter().enumerate() {
        assert_eq!(window.index, i);
        assert_eq!(window.duration(), Duration::from_secs(30));
    }
    assert_eq!(windows[2].end(), Duration::from_secs(90));
}

#[test]
fn test_remainder_becomes_short_last_window() {
    let windows = plan_windows(100 * SAMPLE_RATE as usize, SAMPLE_RATE, Duration::from_secs(30));

    let lengths: Vec<u64> = windows.iter().map(|w| w.duration().as_secs()).collect();
    assert_eq!(lengths, vec![30, 30, 30, 10]);
    assert_eq!(windows[3].start(), Duration::from_secs(90));
    assert_eq!(windows[3].end(), Duration::from_secs(100));
}

#[test]
fn test_windows_cover_every_sample_once() {
    let total = 61 * SAMPLE_RATE as usize + 123;
    let windows = plan_windows(total, SAMPLE_RATE, Duration::from_secs(30));

    assert_eq!(windows.first().map(|w| w.start_sample), Some(0));
    assert_eq!(windows.last().map(|w| w.end_sample), Some(total));
    for pair in windows.windows(2) {
        assert_eq!(pair[0].end_sample, pair[1].start_sample);
    }
}

#[test]
fn test_recording_shorter_than_window() {
    let windows = plan_windows(5 * SAMPLE_RATE as usize, SAMPLE_RATE, Duration::from_secs(30));
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].duration(), Duration::from_secs(5));
}

#[test]
fn test_empty_recording_has_no_windows() {
    assert!(plan_windows(0, SAMPLE_RATE, Duration::from_secs(30)).is_empty());
}

#[test]
fn test_audio_file_open_mono_wav() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_wav(&dir, "visit.wav", 2.5, SAMPLE_RATE, 1);

    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.sample_rate, SAMPLE_RATE);
    assert_eq!(audio.channels, 1);
    assert_eq!(audio.samples.len(), 40000);
    assert!((audio.duration_seconds - 2.5).abs() < 0.01);
    assert!(audio.path.contains("visit.wav"));

    // Already at the target format
    assert_eq!(audio.to_mono_16khz(), audio.samples);

    Ok(())
}

#[test]
fn test_stereo_48k_is_normalized_to_16k_mono() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_wav(&dir, "stereo.wav", 1.0, 48000, 2);

    let audio = AudioFile::open(&path)?;
    assert_eq!(audio.channels, 2);
    assert_eq!(audio.sample_rate, 48000);

    let mono = audio.to_mono_16khz();
    assert_eq!(mono.len(), SAMPLE_RATE as usize);

    Ok(())
}

#[test]
fn test_open_rejects_non_audio() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("notes.wav");
    std::fs::write(&path, b"this is not a wav file")?;

    assert!(AudioFile::open(&path).is_err());
    Ok(())
}

#[test]
fn test_open_missing_file_fails() {
    assert!(AudioFile::open("/nonexistent/recording.wav").is_err());
}
