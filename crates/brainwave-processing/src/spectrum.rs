//! Windowed FFT power spectrum of the combined multi-channel signal

use brainwave_core::ChannelHistory;
use num_complex::Complex32;
use rustfft::FftPlanner;
use std::f32::consts::PI;

/// Power at one non-negative frequency bin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralPoint {
    /// Bin frequency in Hz
    pub frequency: f32,
    /// Squared magnitude of the bin's transform coefficient
    pub power: f32,
}

/// Non-negative half of a power spectrum, covering [0, fs/2)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PowerSpectrum {
    points: Vec<SpectralPoint>,
}

impl PowerSpectrum {
    pub fn empty() -> Self {
        PowerSpectrum { points: Vec::new() }
    }

    pub fn points(&self) -> &[SpectralPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Frequency spacing between bins, 0 when fewer than two bins exist
    pub fn resolution(&self) -> f32 {
        match self.points.as_slice() {
            [first, second, ..] => second.frequency - first.frequency,
            _ => 0.0,
        }
    }

    /// Bin with the highest power
    pub fn peak(&self) -> Option<SpectralPoint> {
        self.points
            .iter()
            .copied()
            .max_by(|a, b| a.power.total_cmp(&b.power))
    }

    pub fn total_power(&self) -> f32 {
        self.points.iter().map(|p| p.power).sum()
    }
}

/// Why a set of channel buffers cannot be analyzed this cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsufficientData {
    /// At least one channel holds no samples
    EmptyChannel,
    /// Channels hold different numbers of samples
    UnequalLengths,
    /// Fewer than two samples per channel
    TooShort,
}

impl std::fmt::Display for InsufficientData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InsufficientData::EmptyChannel => write!(f, "empty channel buffer"),
            InsufficientData::UnequalLengths => write!(f, "channel buffers differ in length"),
            InsufficientData::TooShort => write!(f, "fewer than 2 samples"),
        }
    }
}

/// Symmetric Hann window of `len` points
pub fn hann_window(len: usize) -> Vec<f32> {
    match len {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => {
            let denom = (len - 1) as f32;
            (0..len)
                .map(|k| 0.5 - 0.5 * (2.0 * PI * k as f32 / denom).cos())
                .collect()
        }
    }
}

/// Computes power spectra at a fixed sampling rate.
///
/// FFT plans are cached by the planner and the window is cached for the
/// last series length, so steady-state cycles allocate only the transform
/// buffer.
pub struct SpectralAnalyzer {
    sample_rate: f32,
    planner: FftPlanner<f32>,
    window: Vec<f32>,
}

impl SpectralAnalyzer {
    pub fn new(sample_rate: f32) -> Self {
        SpectralAnalyzer {
            sample_rate,
            planner: FftPlanner::new(),
            window: Vec::new(),
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Per-index mean across channels.
    ///
    /// Channels must be non-empty and of equal length.
    pub fn combine_channels(channels: &[Vec<f32>]) -> Result<Vec<f32>, InsufficientData> {
        let Some(first) = channels.first() else {
            return Err(InsufficientData::EmptyChannel);
        };
        if channels.iter().any(Vec::is_empty) {
            return Err(InsufficientData::EmptyChannel);
        }
        let len = first.len();
        if channels.iter().any(|channel| channel.len() != len) {
            return Err(InsufficientData::UnequalLengths);
        }

        let scale = 1.0 / channels.len() as f32;
        let mut combined = vec![0.0f32; len];
        for channel in channels {
            for (acc, &value) in combined.iter_mut().zip(channel) {
                *acc += value;
            }
        }
        for value in &mut combined {
            *value *= scale;
        }

        Ok(combined)
    }

    /// Combine a buffer snapshot and compute its spectrum
    pub fn analyze(&mut self, history: &ChannelHistory) -> Result<PowerSpectrum, InsufficientData> {
        let combined = Self::combine_channels(history.channels())?;
        if combined.len() < 2 {
            return Err(InsufficientData::TooShort);
        }
        Ok(self.power_spectrum(&combined))
    }

    /// Hann-windowed power spectrum of a single series.
    ///
    /// Returns an empty spectrum for series shorter than 2 samples.
    pub fn power_spectrum(&mut self, series: &[f32]) -> PowerSpectrum {
        let n = series.len();
        if n < 2 {
            return PowerSpectrum::empty();
        }

        if self.window.len() != n {
            self.window = hann_window(n);
        }

        let mut buffer: Vec<Complex32> = series
            .iter()
            .zip(&self.window)
            .map(|(&x, &w)| Complex32::new(x * w, 0.0))
            .collect();

        let fft = self.planner.plan_fft_forward(n);
        fft.process(&mut buffer);

        let bin_width = self.sample_rate / n as f32;
        let points = buffer[..n / 2]
            .iter()
            .enumerate()
            .map(|(k, coefficient)| SpectralPoint {
                frequency: k as f32 * bin_width,
                power: coefficient.norm_sqr(),
            })
            .collect();

        PowerSpectrum { points }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainwave_core::ChannelLayout;

    fn sine(frequency: f32, sample_rate: f32, len: usize, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * PI * frequency * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_hann_window_shape() {
        let window = hann_window(5);
        assert_eq!(window.len(), 5);
        assert!(window[0].abs() < 1e-6);
        assert!(window[4].abs() < 1e-6);
        assert!((window[2] - 1.0).abs() < 1e-6);
        assert_eq!(hann_window(1), vec![1.0]);
        assert!(hann_window(0).is_empty());
    }

    #[test]
    fn test_spectrum_bins() {
        let mut analyzer = SpectralAnalyzer::new(256.0);
        let spectrum = analyzer.power_spectrum(&sine(10.0, 256.0, 256, 1.0));

        assert_eq!(spectrum.len(), 128);
        assert_eq!(spectrum.points()[0].frequency, 0.0);
        assert!((spectrum.resolution() - 1.0).abs() < 1e-6);
        assert!(spectrum.points().last().unwrap().frequency < 128.0);
        assert!(spectrum.points().iter().all(|p| p.power >= 0.0));

        let peak = spectrum.peak().unwrap();
        assert!((peak.frequency - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_odd_length_keeps_floor_half() {
        let mut analyzer = SpectralAnalyzer::new(100.0);
        let spectrum = analyzer.power_spectrum(&sine(5.0, 100.0, 101, 1.0));
        assert_eq!(spectrum.len(), 50);
    }

    #[test]
    fn test_too_short_series() {
        let mut analyzer = SpectralAnalyzer::new(256.0);
        assert!(analyzer.power_spectrum(&[]).is_empty());
        assert!(analyzer.power_spectrum(&[1.0]).is_empty());
        assert_eq!(analyzer.power_spectrum(&[1.0, -1.0]).len(), 1);
    }

    #[test]
    fn test_combine_channels_mean() {
        let combined = SpectralAnalyzer::combine_channels(&[
            vec![1.0, 2.0, 3.0],
            vec![3.0, 4.0, 5.0],
        ])
        .unwrap();
        assert_eq!(combined, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_combine_rejects_bad_input() {
        assert_eq!(
            SpectralAnalyzer::combine_channels(&[]),
            Err(InsufficientData::EmptyChannel)
        );
        assert_eq!(
            SpectralAnalyzer::combine_channels(&[vec![1.0], vec![]]),
            Err(InsufficientData::EmptyChannel)
        );
        assert_eq!(
            SpectralAnalyzer::combine_channels(&[vec![1.0, 2.0], vec![1.0]]),
            Err(InsufficientData::UnequalLengths)
        );
    }

    #[test]
    fn test_analyze_history() {
        let mut analyzer = SpectralAnalyzer::new(256.0);
        let layout = ChannelLayout::muse();

        let empty = ChannelHistory::empty(layout.clone());
        assert_eq!(analyzer.analyze(&empty), Err(InsufficientData::EmptyChannel));

        let single = ChannelHistory::new(layout.clone(), vec![vec![1.0]; 4]);
        assert_eq!(analyzer.analyze(&single), Err(InsufficientData::TooShort));

        let signal = sine(10.0, 256.0, 256, 1.0);
        let full = ChannelHistory::new(layout, vec![signal; 4]);
        let spectrum = analyzer.analyze(&full).unwrap();
        assert_eq!(spectrum.len(), 128);
    }
}
