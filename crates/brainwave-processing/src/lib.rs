//! Brainwave-Processing: Spectral analysis chain for EEG buffers
//!
//! Bounded channel buffers, windowed FFT power spectrum, band power
//! aggregation and mental-state classification.

pub mod buffer;
pub mod spectrum;
pub mod bands;
pub mod classifier;
pub mod processor;
pub mod config;

pub use buffer::ChannelBufferStore;
pub use spectrum::{hann_window, InsufficientData, PowerSpectrum, SpectralAnalyzer, SpectralPoint};
pub use bands::{aggregate, band_percentages, band_power, BandAnalysis};
pub use classifier::{StateClassifier, DEFAULT_ACTIVITY_THRESHOLD};
pub use processor::{BrainwaveProcessor, CycleMetrics, CycleOutput};
pub use config::AnalysisConfig;
