//! Error handling for the brainwave monitor
//!
//! Every failure a component can report is a variant here. Analysis code
//! never returns these for degenerate input; it degrades to zero/Unknown
//! results instead. The variants are reserved for configuration, channel
//! addressing, and the acquisition/delivery collaborators.

use thiserror::Error;

/// Result type alias for brainwave operations
pub type BrainwaveResult<T> = Result<T, BrainwaveError>;

/// Error type shared by all brainwave crates
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum BrainwaveError {
    /// A configuration value failed validation
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the configuration error
        reason: String,
    },

    /// A write addressed a channel outside the layout
    #[error("Unknown channel {channel}: layout has {channel_count} channels")]
    UnknownChannel {
        /// Requested channel index
        channel: usize,
        /// Number of channels in the layout
        channel_count: usize,
    },

    /// Discovery finished without finding a stream
    #[error("No EEG stream found within {timeout_ms}ms")]
    SourceNotFound {
        /// Discovery timeout that elapsed
        timeout_ms: u64,
    },

    /// The connected stream went away
    #[error("Source disconnected: {reason}")]
    SourceDisconnected {
        /// Description of the disconnect
        reason: String,
    },

    /// A sample could not be read from the stream
    #[error("Acquisition error: {reason}")]
    Acquisition {
        /// Description of the acquisition failure
        reason: String,
    },

    /// A snapshot could not be handed to the delivery collaborator
    #[error("Delivery error: {reason}")]
    Delivery {
        /// Description of the delivery failure
        reason: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {reason}")]
    Serialization {
        /// Serialization error description
        reason: String,
    },

    /// A background loop panicked or was cancelled
    #[error("Worker '{name}' failed: {reason}")]
    Worker {
        /// Loop name
        name: String,
        /// Join failure description
        reason: String,
    },
}

impl BrainwaveError {
    /// True when the error means the acquisition source is gone and the
    /// pipeline must fall back to the not-connected state.
    pub fn is_connection_loss(&self) -> bool {
        matches!(self, BrainwaveError::SourceDisconnected { .. })
    }
}

/// Convenience macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)+) => {
        $crate::error::BrainwaveError::InvalidConfiguration {
            reason: format!($($arg)+),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = BrainwaveError::UnknownChannel {
            channel: 7,
            channel_count: 4,
        };
        let display = format!("{}", error);
        assert!(display.contains("Unknown channel"));
        assert!(display.contains('7'));
        assert!(display.contains('4'));
    }

    #[test]
    fn test_config_error_macro() {
        let error = config_error!("buffer capacity must be at least {}", 2);
        assert_eq!(
            error,
            BrainwaveError::InvalidConfiguration {
                reason: "buffer capacity must be at least 2".to_string()
            }
        );
    }

    #[test]
    fn test_connection_loss() {
        let lost = BrainwaveError::SourceDisconnected {
            reason: "headband powered off".to_string(),
        };
        let transient = BrainwaveError::Acquisition {
            reason: "short read".to_string(),
        };
        assert!(lost.is_connection_loss());
        assert!(!transient.is_connection_loss());
    }
}
