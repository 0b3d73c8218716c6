//! # Score Model
//!
//! Input types handed over by the parsing stage. The processing stages
//! annotate these values in place; the optional fields on [`Beam`] and
//! [`Connection`] stay `None` until the corresponding stage has run.
//!
//! ## Type Hierarchy
//! ```text
//! Score
//!   └── Vec<Measure>
//!         └── Vec<Voice>            (same count in every measure)
//!               ├── Vec<Duration>   (Note | Pause | BeamStart | BeamContinue | BeamEnd | Unsupported)
//!               │     ├── Vec<Connection>  (SlurStart | SlurEnd | TieStart | TieEnd)
//!               │     └── Vec<ChordNote>
//!               ├── Vec<Attribute>  (Meter | Signature)
//!               └── Vec<Ending>     (Repeat | DoubleBar | Volta | Unsupported)
//! ```
//!
//! ## Key Concepts
//!
//! ### Length codes
//! Durations use relative length codes from [`LENGTH_CODES`]; one unit is
//! one step of the voice synchronizer. A quarter note is `4`, a dotted
//! quarter `6`, a half note `8`.
//!
//! ### Heights
//! Pitches are staff positions counted upwards from 1. Heights at or above
//! [`UP_LIMIT`] sit in the upper half of the staff.
//!
//! ### Channels
//! Every voice owns two connection channels, one for ties and one for slurs.
//! Only one connection may be open on a channel at a time.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ScoreError;

/// Pitch threshold separating stem-up from stem-down placement
pub const UP_LIMIT: i32 = 21;

/// Valid duration-length codes
pub const LENGTH_CODES: [u8; 9] = [1, 2, 3, 4, 6, 8, 12, 16, 24];

/// Per-voice connection track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Tie,
    Slur,
}

impl ChannelKind {
    /// Offset of this channel inside a voice's pair of channels
    pub fn offset(self) -> usize {
        match self {
            ChannelKind::Tie => 0,
            ChannelKind::Slur => 1,
        }
    }

    /// Flat channel number used by the renderer: `2 * voice + offset`
    pub fn number(self, voice: usize) -> usize {
        2 * voice + self.offset()
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Tie => write!(f, "tie"),
            ChannelKind::Slur => write!(f, "slur"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionKind {
    SlurStart,
    SlurEnd,
    TieStart,
    TieEnd,
}

impl ConnectionKind {
    pub fn channel(self) -> ChannelKind {
        match self {
            ConnectionKind::SlurStart | ConnectionKind::SlurEnd => ChannelKind::Slur,
            ConnectionKind::TieStart | ConnectionKind::TieEnd => ChannelKind::Tie,
        }
    }

    pub fn is_start(self) -> bool {
        match self {
            ConnectionKind::SlurStart | ConnectionKind::TieStart => true,
            ConnectionKind::SlurEnd | ConnectionKind::TieEnd => false,
        }
    }
}

/// A slur or tie endpoint attached to a pitched event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub kind: ConnectionKind,
    /// Flat channel number, filled by the connection tracker
    #[serde(default)]
    pub channel: Option<usize>,
    /// Curve direction for starts, filled by the connection tracker
    #[serde(default)]
    pub up: Option<bool>,
}

impl Connection {
    pub fn new(kind: ConnectionKind) -> Self {
        Self {
            kind,
            channel: None,
            up: None,
        }
    }
}

/// An auxiliary pitch sounding together with its carrier event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordNote {
    pub height: i32,
    #[serde(default)]
    pub alteration: Option<i8>,
    pub length: u8,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

/// A single unbeamed note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub height: i32,
    #[serde(default)]
    pub alteration: Option<i8>,
    pub length: u8,
    #[serde(default)]
    pub lyric_suppressed: bool,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub chord_notes: Vec<ChordNote>,
}

impl Note {
    pub fn new(height: i32, length: u8) -> Self {
        Self {
            height,
            alteration: None,
            length,
            lyric_suppressed: false,
            connections: Vec::new(),
            chord_notes: Vec::new(),
        }
    }

    pub fn with_connection(mut self, kind: ConnectionKind) -> Self {
        self.connections.push(Connection::new(kind));
        self
    }
}

/// A member of a beamed group.
///
/// `multiplicity`, `partial` and `change` come from the parser. `number`,
/// `slant` and `stem_up` are computed by the beam resolver: `number` on every
/// member, `slant` on the start only, `stem_up` on the start and the end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beam {
    pub height: i32,
    #[serde(default)]
    pub alteration: Option<i8>,
    pub length: u8,
    #[serde(default = "default_multiplicity")]
    pub multiplicity: u8,
    #[serde(default)]
    pub partial: i8,
    #[serde(default)]
    pub change: i8,
    #[serde(default)]
    pub lyric_suppressed: bool,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub chord_notes: Vec<ChordNote>,
    #[serde(default)]
    pub number: Option<usize>,
    #[serde(default)]
    pub slant: Option<i32>,
    #[serde(default)]
    pub stem_up: Option<bool>,
}

fn default_multiplicity() -> u8 {
    1
}

impl Beam {
    pub fn new(height: i32, length: u8) -> Self {
        Self {
            height,
            alteration: None,
            length,
            multiplicity: default_multiplicity(),
            partial: 0,
            change: 0,
            lyric_suppressed: false,
            connections: Vec::new(),
            chord_notes: Vec::new(),
            number: None,
            slant: None,
            stem_up: None,
        }
    }

    pub fn with_connection(mut self, kind: ConnectionKind) -> Self {
        self.connections.push(Connection::new(kind));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pause {
    pub length: u8,
}

/// Input the parser could not map, carried through verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unsupported {
    pub info: String,
}

impl Unsupported {
    pub fn new(info: impl Into<String>) -> Self {
        Self { info: info.into() }
    }
}

/// A timed event inside a voice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Duration {
    Note(Note),
    Pause(Pause),
    BeamStart(Beam),
    BeamContinue(Beam),
    BeamEnd(Beam),
    Unsupported(Unsupported),
}

impl Duration {
    /// Length code of the event; `None` for unsupported input
    pub fn length(&self) -> Option<u8> {
        match self {
            Duration::Note(note) => Some(note.length),
            Duration::Pause(pause) => Some(pause.length),
            Duration::BeamStart(beam) | Duration::BeamContinue(beam) | Duration::BeamEnd(beam) => {
                Some(beam.length)
            }
            Duration::Unsupported(_) => None,
        }
    }

    /// Staff height of pitched events
    pub fn height(&self) -> Option<i32> {
        match self {
            Duration::Note(note) => Some(note.height),
            Duration::BeamStart(beam) | Duration::BeamContinue(beam) | Duration::BeamEnd(beam) => {
                Some(beam.height)
            }
            Duration::Pause(_) | Duration::Unsupported(_) => None,
        }
    }
}

/// A context change effective from the measure it is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Attribute {
    Meter { beats: u8, unit: u8 },
    Signature { fifths: i8 },
}

/// A marker attached to the trailing boundary of a measure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Ending {
    Repeat {
        left: bool,
        right: bool,
    },
    DoubleBar {
        /// Set once the bar has been moved to the following measure
        #[serde(default)]
        relocated: bool,
    },
    Volta {
        start: bool,
        number: u32,
    },
    Unsupported(Unsupported),
}

impl Ending {
    pub fn double_bar() -> Self {
        Ending::DoubleBar { relocated: false }
    }
}

/// One concurrent line of music within a measure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    #[serde(default)]
    pub durations: Vec<Duration>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub endings: Vec<Ending>,
}

impl Voice {
    pub fn new(durations: Vec<Duration>) -> Self {
        Self {
            durations,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub voices: Vec<Voice>,
}

impl Measure {
    pub fn new(voices: Vec<Voice>) -> Self {
        Self { voices }
    }
}

/// A complete score
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub measures: Vec<Measure>,
}

impl Score {
    pub fn new(measures: Vec<Measure>) -> Self {
        Self { measures }
    }

    /// Load a score from a YAML document
    pub fn from_yaml(content: &str) -> Result<Self, ScoreError> {
        serde_yaml::from_str(content).map_err(|e| ScoreError::ModelError(e.to_string()))
    }

    /// Voice count of the score, taken from the first measure
    pub fn voice_count(&self) -> usize {
        self.measures.first().map_or(0, |m| m.voices.len())
    }

    /// Check that every measure holds the same number of voices
    pub fn check_voice_count(&self) -> Result<usize, ScoreError> {
        let expected = self.voice_count();
        for (i, measure) in self.measures.iter().enumerate() {
            if measure.voices.len() != expected {
                return Err(ScoreError::VoiceCountMismatch {
                    measure: i + 1,
                    expected,
                    found: measure.voices.len(),
                });
            }
        }
        Ok(expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_numbers() {
        assert_eq!(ChannelKind::Tie.number(0), 0);
        assert_eq!(ChannelKind::Slur.number(0), 1);
        assert_eq!(ChannelKind::Tie.number(2), 4);
        assert_eq!(ChannelKind::Slur.number(2), 5);
    }

    #[test]
    fn test_duration_length_and_height() {
        let note = Duration::Note(Note::new(15, 4));
        assert_eq!(note.length(), Some(4));
        assert_eq!(note.height(), Some(15));

        let pause = Duration::Pause(Pause { length: 8 });
        assert_eq!(pause.length(), Some(8));
        assert_eq!(pause.height(), None);

        let other = Duration::Unsupported(Unsupported::new("grace"));
        assert_eq!(other.length(), None);
    }

    #[test]
    fn test_voice_count_mismatch() {
        let score = Score::new(vec![
            Measure::new(vec![Voice::default(), Voice::default()]),
            Measure::new(vec![Voice::default()]),
        ]);
        assert_eq!(
            score.check_voice_count(),
            Err(ScoreError::VoiceCountMismatch {
                measure: 2,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_score_from_yaml() {
        let yaml = r#"
measures:
  - voices:
      - durations:
          - kind: note
            height: 12
            length: 4
            connections:
              - kind: slur-start
          - kind: beam-start
            height: 10
            length: 2
          - kind: beam-end
            height: 12
            length: 2
          - kind: pause
            length: 8
        attributes:
          - kind: meter
            beats: 4
            unit: 4
        endings:
          - kind: double-bar
"#;
        let score = Score::from_yaml(yaml).unwrap();
        let voice = &score.measures[0].voices[0];
        assert_eq!(voice.durations.len(), 4);
        assert_eq!(voice.attributes, vec![Attribute::Meter { beats: 4, unit: 4 }]);
        assert_eq!(voice.endings, vec![Ending::double_bar()]);
        match &voice.durations[1] {
            Duration::BeamStart(beam) => {
                assert_eq!(beam.multiplicity, 1);
                assert_eq!(beam.slant, None);
            }
            other => panic!("Expected beam start, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_yaml_is_model_error() {
        let result = Score::from_yaml("measures: 12");
        assert!(matches!(result, Err(ScoreError::ModelError(_))));
    }
}
