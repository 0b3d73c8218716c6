//! # Error Types
//!
//! All errors raised while transforming a score. Every processing error
//! carries the 1-based measure number so the offending spot in the source
//! can be located.
//!
//! ## Error Types
//! - `ChannelAlreadyOpen` / `ChannelNotOpen` - unbalanced slur or tie
//! - `VoiceCountMismatch` - a measure with a different number of voices
//! - `ConfigError` - invalid YAML configuration
//! - `ModelError` - invalid YAML score document
//!
//! ## Usage
//! ```rust,ignore
//! use scoretex::{process, ScoreError};
//!
//! match process(score) {
//!     Ok(notation) => println!("{} elements", notation.elements.len()),
//!     Err(ScoreError::ChannelAlreadyOpen { measure, voice, channel }) => {
//!         eprintln!("{} opened twice in measure {} (voice {})", channel, measure, voice);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

use crate::model::ChannelKind;

#[derive(Error, Debug, PartialEq)]
pub enum ScoreError {
    /// A slur or tie start was found while the same channel was still open.
    ///
    /// # Example
    /// ```
    /// # use scoretex::{ChannelKind, ScoreError};
    /// let err = ScoreError::ChannelAlreadyOpen {
    ///     measure: 3,
    ///     voice: 1,
    ///     channel: ChannelKind::Slur,
    /// };
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Unbalanced connection at measure 3, voice 1: slur started while already open"
    /// );
    /// ```
    #[error("Unbalanced connection at measure {measure}, voice {voice}: {channel} started while already open")]
    ChannelAlreadyOpen {
        measure: usize,
        voice: usize,
        channel: ChannelKind,
    },

    /// A slur or tie end was found while the channel was closed.
    #[error("Unbalanced connection at measure {measure}, voice {voice}: {channel} ended while not open")]
    ChannelNotOpen {
        measure: usize,
        voice: usize,
        channel: ChannelKind,
    },

    /// Every measure of a score must hold the same number of voices.
    ///
    /// # Example
    /// ```
    /// # use scoretex::ScoreError;
    /// let err = ScoreError::VoiceCountMismatch { measure: 2, expected: 2, found: 1 };
    /// assert_eq!(err.to_string(), "Voice count mismatch at measure 2: expected 2 voices, found 1");
    /// ```
    #[error("Voice count mismatch at measure {measure}: expected {expected} voices, found {found}")]
    VoiceCountMismatch {
        measure: usize,
        expected: usize,
        found: usize,
    },

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Invalid score document: {0}")]
    ModelError(String),
}
