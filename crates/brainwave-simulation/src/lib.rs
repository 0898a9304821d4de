//! Brainwave-Simulation: Synthetic EEG sources
//!
//! Simulated headset for development without hardware, and scripted
//! sources for deterministic playback in tests.

pub mod signal_patterns;
pub mod headset;
pub mod scripted;

pub use signal_patterns::*;
pub use headset::*;
pub use scripted::*;
