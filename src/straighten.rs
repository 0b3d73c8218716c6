//! # Voice Synchronization
//!
//! Merges the event streams of a measure's voices into time-aligned rows.
//!
//! ## Single voice
//! Every event becomes its own row with the event's length. Unsupported
//! events are emitted as standalone elements.
//!
//! ## Several voices
//! The measure is walked in fixed steps of one length unit. Each voice keeps
//! a forward counter of the steps its current event still covers:
//!
//! ```text
//! step      1    2    3    4    5    6    7    8
//! voice A   A1   ·    ·    ·    A2   ·    ·    ·      A = [4, 4]
//! voice B   B1   ·    ·    ·    ·    ·    ·    ·      B = [8]
//! rows      [A1, B1] len 4      [A2, Nil] len 4
//! ```
//!
//! A voice whose counter is exhausted starts its next event (unsupported
//! events ahead of it are emitted on the spot); other voices contribute
//! `Nil`. A row is emitted only when at least one voice starts an event, with
//! the shortest starting length. The walk stops after `max_steps` steps.

use std::collections::VecDeque;

use log::warn;

use crate::model::{Duration, LENGTH_CODES};
use crate::notation::{Element, Notation, Notes, Slot};

struct VoiceState {
    forward: u8,
    queue: VecDeque<Duration>,
}

impl VoiceState {
    fn new(durations: Vec<Duration>) -> Self {
        Self {
            forward: 0,
            queue: durations.into(),
        }
    }

    /// Pop the next timed event, emitting unsupported ones met on the way
    fn next_onset(&mut self, notation: &mut Notation) -> Option<(Duration, u8)> {
        while let Some(duration) = self.queue.pop_front() {
            match duration.length() {
                Some(length) => return Some((duration, length)),
                None => {
                    if let Duration::Unsupported(unsupported) = duration {
                        notation.push(Element::Unsupported(unsupported));
                    }
                }
            }
        }
        None
    }
}

/// Append the rows of one measure; `voices` holds each voice's events in output order
pub fn straighten_measure(voices: Vec<Vec<Duration>>, max_steps: usize, notation: &mut Notation) {
    if voices.len() > 1 {
        straighten_voices(voices, max_steps, notation);
    } else if let Some(durations) = voices.into_iter().next() {
        straighten_single(durations, notation);
    }
}

fn check_length(length: u8) {
    if !LENGTH_CODES.contains(&length) {
        warn!("unexpected length code {}", length);
    }
}

fn straighten_single(durations: Vec<Duration>, notation: &mut Notation) {
    for duration in durations {
        match duration.length() {
            Some(length) => {
                check_length(length);
                notation.push(Element::Notes(Notes {
                    length,
                    voices: vec![Slot::Event(duration)],
                }));
            }
            None => {
                if let Duration::Unsupported(unsupported) = duration {
                    notation.push(Element::Unsupported(unsupported));
                }
            }
        }
    }
}

fn straighten_voices(voices: Vec<Vec<Duration>>, max_steps: usize, notation: &mut Notation) {
    let mut states: Vec<VoiceState> = voices.into_iter().map(VoiceState::new).collect();

    for _ in 0..max_steps {
        let mut shortest: Option<u8> = None;
        let mut slots = Vec::with_capacity(states.len());

        for state in states.iter_mut() {
            if state.forward > 0 {
                state.forward -= 1;
                slots.push(Slot::Nil);
                continue;
            }
            match state.next_onset(notation) {
                Some((duration, length)) => {
                    check_length(length);
                    state.forward = length.saturating_sub(1);
                    shortest = Some(shortest.map_or(length, |s| s.min(length)));
                    slots.push(Slot::Event(duration));
                }
                None => slots.push(Slot::Nil),
            }
        }

        if let Some(length) = shortest {
            notation.push(Element::Notes(Notes {
                length,
                voices: slots,
            }));
        }
    }

    let dropped: usize = states.iter().map(|state| state.queue.len()).sum();
    if dropped > 0 {
        warn!(
            "measure exceeds {} steps, {} event(s) not emitted",
            max_steps, dropped
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_STEPS;
    use crate::model::{Beam, Note, Pause, Unsupported};
    use pretty_assertions::assert_eq;

    fn note(height: i32, length: u8) -> Duration {
        Duration::Note(Note::new(height, length))
    }

    fn rows(notation: &Notation) -> Vec<&Notes> {
        notation.rows().collect()
    }

    #[test]
    fn test_single_voice_one_row_per_event() {
        let mut notation = Notation::default();
        let durations = vec![
            note(10, 4),
            Duration::Pause(Pause { length: 2 }),
            Duration::BeamStart(Beam::new(11, 1)),
            Duration::BeamEnd(Beam::new(12, 1)),
        ];
        straighten_measure(vec![durations.clone()], MAX_STEPS, &mut notation);

        let rows = rows(&notation);
        assert_eq!(rows.len(), 4);
        for (row, duration) in rows.iter().zip(durations.iter()) {
            assert_eq!(Some(row.length), duration.length());
            assert_eq!(row.voices, vec![Slot::Event(duration.clone())]);
        }
    }

    #[test]
    fn test_single_voice_unsupported_standalone() {
        let mut notation = Notation::default();
        let other = Unsupported::new("grace note");
        straighten_measure(
            vec![vec![Duration::Unsupported(other.clone()), note(10, 16)]],
            MAX_STEPS,
            &mut notation,
        );
        assert_eq!(notation.elements.len(), 2);
        assert_eq!(notation.elements[0], Element::Unsupported(other));
        assert!(matches!(notation.elements[1], Element::Notes(_)));
    }

    #[test]
    fn test_two_voices_continuation() {
        let mut notation = Notation::default();
        straighten_measure(
            vec![vec![note(10, 4), note(11, 4)], vec![note(20, 8)]],
            MAX_STEPS,
            &mut notation,
        );

        assert_eq!(
            notation.elements,
            vec![
                Element::Notes(Notes {
                    length: 4,
                    voices: vec![Slot::Event(note(10, 4)), Slot::Event(note(20, 8))],
                }),
                Element::Notes(Notes {
                    length: 4,
                    voices: vec![Slot::Event(note(11, 4)), Slot::Nil],
                }),
            ]
        );
    }

    #[test]
    fn test_row_length_is_shortest_onset() {
        let mut notation = Notation::default();
        straighten_measure(
            vec![
                vec![note(10, 8), note(10, 8)],
                vec![note(20, 2), note(21, 2), note(22, 4), note(23, 8)],
            ],
            MAX_STEPS,
            &mut notation,
        );

        let lengths: Vec<u8> = notation.rows().map(|row| row.length).collect();
        assert_eq!(lengths, vec![2, 2, 4, 8]);
        let nils: Vec<usize> = notation
            .rows()
            .map(|row| row.voices.iter().filter(|s| **s == Slot::Nil).count())
            .collect();
        assert_eq!(nils, vec![0, 1, 1, 0]);
    }

    #[test]
    fn test_exhausted_voice_contributes_nil() {
        let mut notation = Notation::default();
        straighten_measure(
            vec![vec![note(10, 4)], vec![note(20, 4), note(21, 4)], vec![]],
            MAX_STEPS,
            &mut notation,
        );
        let rows = rows(&notation);
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[1].voices,
            vec![Slot::Nil, Slot::Event(note(21, 4)), Slot::Nil]
        );
    }

    #[test]
    fn test_unsupported_emitted_before_row() {
        let mut notation = Notation::default();
        let other = Unsupported::new("dynamics");
        straighten_measure(
            vec![
                vec![note(10, 4), Duration::Unsupported(other.clone()), note(11, 4)],
                vec![note(20, 8)],
            ],
            MAX_STEPS,
            &mut notation,
        );
        assert_eq!(notation.elements.len(), 3);
        assert!(matches!(notation.elements[0], Element::Notes(_)));
        assert_eq!(notation.elements[1], Element::Unsupported(other));
        assert!(matches!(notation.elements[2], Element::Notes(_)));
    }

    #[test]
    fn test_walk_stops_after_max_steps() {
        let mut notation = Notation::default();
        straighten_measure(
            vec![vec![note(10, 16), note(11, 4)], vec![note(20, 16)]],
            MAX_STEPS,
            &mut notation,
        );
        assert_eq!(rows(&notation).len(), 1);
    }

    #[test]
    fn test_empty_measure() {
        let mut notation = Notation::default();
        straighten_measure(vec![], MAX_STEPS, &mut notation);
        straighten_measure(vec![vec![], vec![]], MAX_STEPS, &mut notation);
        assert!(notation.elements.is_empty());
    }
}
