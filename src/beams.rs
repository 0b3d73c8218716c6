//! # Beam Geometry
//!
//! Annotates the members of beamed groups with their group number, the
//! slant of the beam and the stem direction.
//!
//! ## Numbering
//! Group numbers restart at 0 in every measure and grow by one for every
//! `BeamStart`. The counter is shared by all voices of the measure, so two
//! simultaneous groups never carry the same number. Every member of a run
//! receives the number of its group.
//!
//! ## Slant
//! The raw slant is the height difference between the last and the first
//! member. Its magnitude is mapped through [`SLANT_TABLE`]; differences
//! beyond the table map to 9. Runs with more than two members are flattened
//! by one step when the mapped magnitude is at least 2. The result is stored
//! on the `BeamStart`, signed like the raw difference.
//!
//! ## Stem direction
//! Stems point up when the average height of the run lies below the
//! configured limit. The flag is stored on the `BeamStart` and the `BeamEnd`.

use log::{trace, warn};

use crate::model::{Duration, Measure};

/// Slant magnitude indexed by the absolute height difference
pub const SLANT_TABLE: [i32; 10] = [0, 2, 3, 3, 4, 4, 5, 6, 7, 8];

/// Magnitude used for height differences outside [`SLANT_TABLE`]
pub const STEEPEST_SLANT: i32 = 9;

/// Running totals of an open beam run
#[derive(Debug)]
struct BeamRun {
    start: usize,
    start_height: i32,
    heights: i32,
    count: i32,
    lowest: i32,
    highest: i32,
}

impl BeamRun {
    fn new(start: usize, height: i32) -> Self {
        Self {
            start,
            start_height: height,
            heights: 0,
            count: 0,
            lowest: height,
            highest: height,
        }
    }

    fn add(&mut self, height: i32) {
        self.heights += height;
        self.count += 1;
        self.lowest = self.lowest.min(height);
        // NOTE: min() here too, the running maximum is not kept
        self.highest = self.highest.min(height);
    }

    fn stem_up(&self, up_limit: i32) -> bool {
        // average < up_limit, without leaving integers
        self.heights < up_limit * self.count
    }
}

/// Map a raw height difference to the signed slant of a run with `members` notes
pub fn beam_slant(difference: i32, members: i32) -> i32 {
    let sign = if difference < 0 { -1 } else { 1 };
    let mut magnitude = SLANT_TABLE
        .get(difference.unsigned_abs() as usize)
        .copied()
        .unwrap_or(STEEPEST_SLANT);
    if members > 2 && magnitude >= 2 {
        magnitude -= 1;
    }
    magnitude * sign
}

/// Annotate every beamed group of a measure
pub fn resolve_beams(measure: &mut Measure, up_limit: i32) {
    let mut last_number: Option<usize> = None;

    for (voice_index, voice) in measure.voices.iter_mut().enumerate() {
        let mut run: Option<BeamRun> = None;

        for i in 0..voice.durations.len() {
            let height = match &voice.durations[i] {
                Duration::BeamStart(beam) => {
                    run = Some(BeamRun::new(i, beam.height));
                    last_number = Some(last_number.map_or(0, |n| n + 1));
                    beam.height
                }
                Duration::BeamContinue(beam) | Duration::BeamEnd(beam) => beam.height,
                Duration::Note(_) | Duration::Pause(_) | Duration::Unsupported(_) => continue,
            };

            let (Some(state), Some(number)) = (run.as_mut(), last_number) else {
                warn!("beam member without a start in voice {}", voice_index + 1);
                continue;
            };
            state.add(height);

            let start_height = state.start_height;
            let start = state.start;
            let count = state.count;
            let stem_up = state.stem_up(up_limit);

            match &mut voice.durations[i] {
                Duration::BeamStart(beam) | Duration::BeamContinue(beam) => {
                    beam.number = Some(number);
                }
                Duration::BeamEnd(beam) => {
                    beam.number = Some(number);
                    beam.stem_up = Some(stem_up);

                    let slant = beam_slant(beam.height - start_height, count);
                    if let Some(state) = run.take() {
                        trace!(
                            "beam {} in voice {}: {} members, slant {}, heights {}..{}, stem {}",
                            number,
                            voice_index + 1,
                            state.count,
                            slant,
                            state.lowest,
                            state.highest,
                            if stem_up { "up" } else { "down" }
                        );
                    }
                    if let Duration::BeamStart(first) = &mut voice.durations[start] {
                        first.slant = Some(slant);
                        first.stem_up = Some(stem_up);
                    }
                }
                Duration::Note(_) | Duration::Pause(_) | Duration::Unsupported(_) => {}
            }
        }
    }
}
