//! # Connection Channels
//!
//! Tracks open slurs and ties across the whole score and annotates their
//! endpoints for the renderer.
//!
//! ## Channels
//! Each voice owns a tie channel and a slur channel. A start opens its
//! channel and an end closes it; opening an open channel or closing a closed
//! one is a fatal [`ScoreError`]. The table is not reset between measures, so
//! a tie may cross a bar line.
//!
//! ## Annotations
//! - every connection records its flat channel number (`2 * voice + 1` for
//!   slurs, `2 * voice` for ties)
//! - starts record their curve direction: up when the owning pitch sits at
//!   or above the configured limit
//! - notes and beam members record `lyric_suppressed` when either channel of
//!   their voice was already open before the event's own connections
//! - chord notes are tracked on the channels of their carrier, after the
//!   carrier's own connections

use log::debug;

use crate::error::ScoreError;
use crate::model::{ChannelKind, ChordNote, Connection, Duration, Measure, Score};

/// Open/closed state of every (voice, channel) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelTable {
    open: Vec<[bool; 2]>,
}

impl ChannelTable {
    /// A table for `voices` voices with every channel closed
    pub fn new(voices: usize) -> Self {
        Self {
            open: vec![[false; 2]; voices],
        }
    }

    pub fn voices(&self) -> usize {
        self.open.len()
    }

    pub fn is_open(&self, voice: usize, channel: ChannelKind) -> bool {
        self.open
            .get(voice)
            .map_or(false, |channels| channels[channel.offset()])
    }

    /// True when a tie or a slur of the voice is open
    pub fn is_voice_open(&self, voice: usize) -> bool {
        self.is_open(voice, ChannelKind::Tie) || self.is_open(voice, ChannelKind::Slur)
    }

    /// True when no channel is open
    pub fn is_balanced(&self) -> bool {
        self.open.iter().all(|channels| !channels[0] && !channels[1])
    }

    fn set(
        &mut self,
        measure: usize,
        voice: usize,
        channel: ChannelKind,
        start: bool,
    ) -> Result<(), ScoreError> {
        let state = &mut self.open[voice][channel.offset()];
        if start && *state {
            return Err(ScoreError::ChannelAlreadyOpen {
                measure,
                voice: voice + 1,
                channel,
            });
        }
        if !start && !*state {
            return Err(ScoreError::ChannelNotOpen {
                measure,
                voice: voice + 1,
                channel,
            });
        }
        *state = start;
        Ok(())
    }
}

/// Track connections over the whole score, returning the final channel state
pub fn track_connections(score: &mut Score, up_limit: i32) -> Result<ChannelTable, ScoreError> {
    let mut table = ChannelTable::new(score.voice_count());
    for (i, measure) in score.measures.iter_mut().enumerate() {
        track_measure(measure, i + 1, &mut table, up_limit)?;
    }
    if !table.is_balanced() {
        debug!("score ends with open connections");
    }
    Ok(table)
}

/// Track the connections of one measure (`number` is 1-based)
pub fn track_measure(
    measure: &mut Measure,
    number: usize,
    table: &mut ChannelTable,
    up_limit: i32,
) -> Result<(), ScoreError> {
    if measure.voices.len() != table.voices() {
        return Err(ScoreError::VoiceCountMismatch {
            measure: number,
            expected: table.voices(),
            found: measure.voices.len(),
        });
    }

    for (voice_index, voice) in measure.voices.iter_mut().enumerate() {
        for duration in voice.durations.iter_mut() {
            let under = table.is_voice_open(voice_index);
            let (height, connections, chord_notes) = match duration {
                Duration::Note(note) => {
                    note.lyric_suppressed = under;
                    (note.height, &mut note.connections, &mut note.chord_notes)
                }
                Duration::BeamStart(beam)
                | Duration::BeamContinue(beam)
                | Duration::BeamEnd(beam) => {
                    beam.lyric_suppressed = under;
                    (beam.height, &mut beam.connections, &mut beam.chord_notes)
                }
                Duration::Pause(_) | Duration::Unsupported(_) => continue,
            };

            let mut tracker = Tracker {
                table: &mut *table,
                measure: number,
                voice: voice_index,
                up_limit,
            };
            tracker.annotate(connections, height)?;
            tracker.annotate_chords(chord_notes)?;
        }
    }
    Ok(())
}

struct Tracker<'a> {
    table: &'a mut ChannelTable,
    measure: usize,
    voice: usize,
    up_limit: i32,
}

impl Tracker<'_> {
    fn annotate(&mut self, connections: &mut [Connection], height: i32) -> Result<(), ScoreError> {
        for connection in connections.iter_mut() {
            let channel = connection.kind.channel();
            let start = connection.kind.is_start();
            self.table.set(self.measure, self.voice, channel, start)?;
            if start {
                connection.up = Some(height >= self.up_limit);
            }
            connection.channel = Some(channel.number(self.voice));
        }
        Ok(())
    }

    fn annotate_chords(&mut self, chord_notes: &mut [ChordNote]) -> Result<(), ScoreError> {
        for chord in chord_notes.iter_mut() {
            self.annotate(&mut chord.connections, chord.height)?;
        }
        Ok(())
    }
}
