use std::ops::Range;
use std::time::Duration;

/// One fixed-length slice of a recording, addressed by sample offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkWindow {
    /// Window number (0-indexed)
    pub index: usize,
    pub start_sample: usize,
    pub end_sample: usize,
    pub sample_rate: u32,
}

impl ChunkWindow {
    pub fn samples(&self) -> Range<usize> {
        self.start_sample..self.end_sample
    }

    pub fn start(&self) -> Duration {
        samples_to_duration(self.start_sample, self.sample_rate)
    }

    pub fn end(&self) -> Duration {
        samples_to_duration(self.end_sample, self.sample_rate)
    }

    pub fn duration(&self) -> Duration {
        samples_to_duration(self.end_sample - self.start_sample, self.sample_rate)
    }
}

/// Partition `[0, total_samples)` into windows of `window` length.
///
/// Produces `ceil(total / window)` windows; the last one holds the remainder,
/// or a full window when the total divides evenly.
pub fn plan_windows(total_samples: usize, sample_rate: u32, window: Duration) -> Vec<ChunkWindow> {
    let window_samples = (window.as_nanos() * sample_rate as u128 / 1_000_000_000) as usize;
    if window_samples == 0 || total_samples == 0 {
        return Vec::new();
    }

    let count = total_samples.div_ceil(window_samples);
    (0..count)
        .map(|index| {
            let start_sample = index * window_samples;
            ChunkWindow {
                index,
                start_sample,
                end_sample: (start_sample + window_samples).min(total_samples),
                sample_rate,
            }
        })
        .collect()
}

fn samples_to_duration(samples: usize, sample_rate: u32) -> Duration {
    if sample_rate == 0 {
        return Duration::ZERO;
    }
    Duration::from_nanos((samples as u128 * 1_000_000_000 / sample_rate as u128) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_last_window() {
        let windows = plan_windows(16000 * 5 + 8000, 16000, Duration::from_secs(2));

        assert_eq!(windows.len(), 3);
        assert_eq!(windows[2].start(), Duration::from_secs(4));
        assert_eq!(windows[2].duration(), Duration::from_millis(1500));
    }

    #[test]
    fn test_sub_second_window() {
        let windows = plan_windows(16000, 16000, Duration::from_millis(250));
        assert_eq!(windows.len(), 4);
        assert!(windows.iter().all(|w| w.samples().len() == 4000));
    }

    #[test]
    fn test_empty_inputs() {
        assert!(plan_windows(0, 16000, Duration::from_secs(30)).is_empty());
        assert!(plan_windows(16000, 16000, Duration::ZERO).is_empty());
    }
}
