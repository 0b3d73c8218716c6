//! # Ending Propagation
//!
//! Double bars and right repeats belong to the boundary a measure is entered
//! through, while the parser attaches them to the measure they close. Both
//! passes below move them one measure forward, voice by voice.
//!
//! - [`relocate_double_bars`] moves every double bar to the same voice of the
//!   following measure. Moved bars are flagged `relocated` and never move
//!   again. Bars on the last measure have nowhere to go and are dropped.
//! - [`normalize_repeats`] strips the right half of every repeat and merges it
//!   into the following measure's repeat of the same voice, appending a
//!   right-only repeat when there is none. Right repeats on the last measure
//!   are returned to the caller.

use log::debug;

use crate::model::{Ending, Score};

/// Move double bars to the following measure
pub fn relocate_double_bars(score: &mut Score) {
    let mut carry: Vec<usize> = Vec::new();

    for measure in score.measures.iter_mut() {
        let mut moving = vec![0; measure.voices.len()];

        for (voice, count) in measure.voices.iter_mut().zip(moving.iter_mut()) {
            voice.endings.retain(|ending| match ending {
                Ending::DoubleBar { relocated: false } => {
                    *count += 1;
                    false
                }
                _ => true,
            });
        }

        for (voice, incoming) in measure.voices.iter_mut().zip(carry.drain(..)) {
            for _ in 0..incoming {
                voice.endings.push(Ending::DoubleBar { relocated: true });
            }
        }

        carry = moving;
    }

    let dropped: usize = carry.iter().sum();
    if dropped > 0 {
        debug!("dropping {} double bar(s) after the last measure", dropped);
    }
}

/// Move right repeats to the following measure.
///
/// Returns, per voice, whether the last measure closed with a right repeat.
pub fn normalize_repeats(score: &mut Score) -> Vec<bool> {
    let mut carry: Vec<bool> = Vec::new();

    for measure in score.measures.iter_mut() {
        let mut moving = vec![false; measure.voices.len()];

        for (voice, closes) in measure.voices.iter_mut().zip(moving.iter_mut()) {
            voice.endings.retain_mut(|ending| match ending {
                Ending::Repeat { left, right } => {
                    if *right {
                        *closes = true;
                    }
                    *right = false;
                    *left
                }
                _ => true,
            });
        }

        for (voice, incoming) in measure.voices.iter_mut().zip(carry.drain(..)) {
            if !incoming {
                continue;
            }
            let mut merged = false;
            for ending in voice.endings.iter_mut() {
                if let Ending::Repeat { right, .. } = ending {
                    *right = true;
                    merged = true;
                }
            }
            if !merged {
                voice.endings.push(Ending::Repeat {
                    left: false,
                    right: true,
                });
            }
        }

        carry = moving;
    }

    carry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Measure, Unsupported, Voice};
    use pretty_assertions::assert_eq;

    fn score(endings: Vec<Vec<Vec<Ending>>>) -> Score {
        Score::new(
            endings
                .into_iter()
                .map(|voices| {
                    Measure::new(
                        voices
                            .into_iter()
                            .map(|endings| Voice {
                                endings,
                                ..Default::default()
                            })
                            .collect(),
                    )
                })
                .collect(),
        )
    }

    fn endings(score: &Score, measure: usize, voice: usize) -> &[Ending] {
        &score.measures[measure].voices[voice].endings
    }

    const MOVED: Ending = Ending::DoubleBar { relocated: true };

    #[test]
    fn test_double_bar_moves_one_measure() {
        let mut score = score(vec![
            vec![vec![Ending::double_bar()], vec![]],
            vec![vec![], vec![]],
            vec![vec![], vec![]],
        ]);
        relocate_double_bars(&mut score);

        assert!(endings(&score, 0, 0).is_empty());
        assert_eq!(endings(&score, 1, 0), &[MOVED]);
        assert!(endings(&score, 1, 1).is_empty());
        assert!(endings(&score, 2, 0).is_empty());
    }

    #[test]
    fn test_double_bar_moves_exactly_once() {
        let mut score = score(vec![
            vec![vec![Ending::double_bar()]],
            vec![vec![Ending::double_bar()]],
            vec![vec![]],
        ]);
        relocate_double_bars(&mut score);

        assert!(endings(&score, 0, 0).is_empty());
        assert_eq!(endings(&score, 1, 0), &[MOVED]);
        assert_eq!(endings(&score, 2, 0), &[MOVED]);
    }

    #[test]
    fn test_double_bar_on_last_measure_is_dropped() {
        let mut score = score(vec![vec![vec![]], vec![vec![Ending::double_bar()]]]);
        relocate_double_bars(&mut score);
        assert!(endings(&score, 0, 0).is_empty());
        assert!(endings(&score, 1, 0).is_empty());
    }

    #[test]
    fn test_other_endings_stay() {
        let volta = Ending::Volta {
            start: true,
            number: 1,
        };
        let other = Ending::Unsupported(Unsupported::new("segno"));
        let mut score = score(vec![
            vec![vec![volta.clone(), Ending::double_bar(), other.clone()]],
            vec![vec![]],
        ]);
        relocate_double_bars(&mut score);
        assert_eq!(endings(&score, 0, 0), &[volta, other]);
    }

    #[test]
    fn test_right_repeat_creates_synthetic_repeat() {
        let mut score = score(vec![
            vec![vec![Ending::Repeat {
                left: false,
                right: true,
            }]],
            vec![vec![]],
        ]);
        let trailing = normalize_repeats(&mut score);

        assert!(endings(&score, 0, 0).is_empty());
        assert_eq!(
            endings(&score, 1, 0),
            &[Ending::Repeat {
                left: false,
                right: true
            }]
        );
        assert_eq!(trailing, vec![false]);
    }

    #[test]
    fn test_right_repeat_merges_into_left_repeat() {
        let mut score = score(vec![
            vec![vec![Ending::Repeat {
                left: true,
                right: true,
            }]],
            vec![vec![Ending::Repeat {
                left: true,
                right: false,
            }]],
        ]);
        normalize_repeats(&mut score);

        assert_eq!(
            endings(&score, 0, 0),
            &[Ending::Repeat {
                left: true,
                right: false
            }]
        );
        assert_eq!(
            endings(&score, 1, 0),
            &[Ending::Repeat {
                left: true,
                right: true
            }]
        );
    }

    #[test]
    fn test_right_repeat_moves_per_voice() {
        let mut score = score(vec![
            vec![
                vec![],
                vec![Ending::Repeat {
                    left: false,
                    right: true,
                }],
            ],
            vec![vec![], vec![]],
        ]);
        normalize_repeats(&mut score);
        assert!(endings(&score, 1, 0).is_empty());
        assert_eq!(endings(&score, 1, 1).len(), 1);
    }

    #[test]
    fn test_right_repeat_on_last_measure_is_returned() {
        let mut score = score(vec![
            vec![vec![], vec![]],
            vec![
                vec![Ending::Repeat {
                    left: false,
                    right: true,
                }],
                vec![],
            ],
        ]);
        let trailing = normalize_repeats(&mut score);
        assert!(endings(&score, 1, 0).is_empty());
        assert_eq!(trailing, vec![true, false]);
    }
}
