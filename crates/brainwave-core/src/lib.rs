//! Brainwave-Core: Foundation types for brainwave monitoring
//!
//! Channel layouts, frequency bands, mental-state labels, snapshot types
//! and the acquisition collaborator interface shared by every crate.

pub mod channel;
pub mod band;
pub mod state;
pub mod snapshot;
pub mod source;
pub mod error;

pub use channel::{ChannelId, ChannelLayout};
pub use band::{Band, BandRanking, BandValues};
pub use state::MentalState;
pub use snapshot::{AnalysisSnapshot, ChannelHistory, PublishedSnapshot};
pub use source::{SampleInlet, StreamInfo, StreamResolver};
pub use error::{BrainwaveError, BrainwaveResult};
