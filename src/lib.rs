//! # scoretex
//!
//! Turns a parsed multi-voice score into the flat element sequence a
//! MusiXTeX renderer prints line by line.
//!
//! ## Pipeline
//! 1. [`beams`] - beam numbers, slants and stem directions
//! 2. [`connections`] - slur/tie channels, curve directions, lyric suppression
//! 3. [`endings`] - double bars and right repeats moved to the next measure
//! 4. [`divisions`] - one boundary element per measure, volta brackets
//! 5. [`straighten`] - simultaneous voices merged into time-aligned rows
//!
//! Stages 1-3 annotate the score in place, stages 4-5 build the [`Notation`].
//!
//! ## Example
//! ```rust
//! use scoretex::{process, Duration, Measure, Note, Score, Voice};
//!
//! let score = Score::new(vec![Measure::new(vec![Voice::new(vec![
//!     Duration::Note(Note::new(12, 8)),
//!     Duration::Note(Note::new(14, 8)),
//! ])])]);
//!
//! let notation = process(score)?;
//! assert_eq!(notation.rows().count(), 2);
//! # Ok::<(), scoretex::ScoreError>(())
//! ```

pub mod beams;
pub mod config;
pub mod connections;
pub mod divisions;
pub mod endings;
pub mod error;
pub mod model;
pub mod notation;
pub mod straighten;

pub use config::ProcessorConfig;
pub use error::*;
pub use model::*;
pub use notation::*;

use log::debug;

use crate::beams::resolve_beams;
use crate::connections::track_connections;
use crate::divisions::DivisionBuilder;
use crate::endings::{normalize_repeats, relocate_double_bars};
use crate::straighten::straighten_measure;

/// Process a score with the default configuration
pub fn process(score: Score) -> Result<Notation, ScoreError> {
    process_with_config(score, &ProcessorConfig::default())
}

/// Process a score.
///
/// # Errors
/// Returns [`ScoreError`] when measures differ in voice count or a slur or
/// tie channel is opened twice or closed while not open. No partial output
/// is returned.
pub fn process_with_config(
    mut score: Score,
    config: &ProcessorConfig,
) -> Result<Notation, ScoreError> {
    let voice_count = score.check_voice_count()?;
    debug!(
        "processing {} measure(s) with {} voice(s)",
        score.measures.len(),
        voice_count
    );

    for measure in score.measures.iter_mut() {
        resolve_beams(measure, config.up_limit);
    }
    track_connections(&mut score, config.up_limit)?;
    relocate_double_bars(&mut score);
    let trailing_repeats = normalize_repeats(&mut score);

    let trailing_repeat = if config.reverse_voices {
        trailing_repeats.last()
    } else {
        trailing_repeats.first()
    };
    let trailing_repeat = trailing_repeat.copied().unwrap_or(false);
    if trailing_repeat && !config.close_final_repeat {
        debug!("right repeat on the last measure has no following boundary");
    }

    let mut notation = Notation::default();
    let mut divisions = DivisionBuilder::new();
    let mut last_endings = Vec::new();

    for measure in score.measures {
        let mut voices = measure.voices;
        if config.reverse_voices {
            voices.reverse();
        }
        let endings = voices
            .first()
            .map(|voice| voice.endings.clone())
            .unwrap_or_default();

        divisions.open_voltas(&endings, &mut notation);
        {
            let ordered: Vec<&Voice> = voices.iter().collect();
            divisions.add_division(&endings, &ordered, &mut notation);
        }

        let queues = voices.into_iter().map(|voice| voice.durations).collect();
        straighten_measure(queues, config.max_steps, &mut notation);
        divisions.close_voltas(&endings, &mut notation);

        last_endings = endings;
    }

    divisions.finish(
        &last_endings,
        trailing_repeat && config.close_final_repeat,
        &mut notation,
    );
    Ok(notation)
}
