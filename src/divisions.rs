//! # Structural Divisions
//!
//! Emits one boundary element per measure plus the terminal element, and
//! the volta brackets around measure bodies.
//!
//! ## State machine
//! ```text
//! START ──first measure──▶ BAR ──every further measure──▶ BAR
//!                           │
//!                           └──after the last measure──▶ END
//! ```
//! - `START` produces a [`StartPiece`] carrying the voice count and the
//!   initial attributes.
//! - `BAR` produces a [`ChangeContext`] when any voice changes meter or
//!   signature in the measure, a plain [`Bar`] otherwise.
//! - `END` produces the [`EndPiece`].
//!
//! Division numbers start at 1 and grow by one per boundary element.
//!
//! ## Attribute directives
//! Meter and signature are resolved independently. When every voice ends up
//! with the same value as the first voice, one directive addressed to all
//! voices ([`ALL_VOICES`]) is emitted; otherwise every voice gets its own
//! directives, addressed by 1-based voice index.

use log::debug;

use crate::model::{Attribute, Ending, Voice};
use crate::notation::{
    AttributeDirective, Bar, BarFlags, ChangeContext, Element, EndPiece, Notation, StartPiece,
    Volta, ALL_VOICES,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivisionStatus {
    Start,
    Bar,
    End,
}

#[derive(Debug, Clone)]
pub struct DivisionBuilder {
    status: DivisionStatus,
    number: usize,
}

impl Default for DivisionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DivisionBuilder {
    pub fn new() -> Self {
        Self {
            status: DivisionStatus::Start,
            number: 1,
        }
    }

    pub fn status(&self) -> DivisionStatus {
        self.status
    }

    /// Emit the volta brackets opened by a measure
    pub fn open_voltas(&self, endings: &[Ending], notation: &mut Notation) {
        push_voltas(endings, true, notation);
    }

    /// Emit the volta brackets closed by a measure
    pub fn close_voltas(&self, endings: &[Ending], notation: &mut Notation) {
        push_voltas(endings, false, notation);
    }

    /// Emit the boundary element a measure is entered through.
    ///
    /// `endings` are the endings of the first voice; `voices` are in output order.
    pub fn add_division(&mut self, endings: &[Ending], voices: &[&Voice], notation: &mut Notation) {
        let flags = scan_endings(endings, Some(&mut *notation));
        let attributes_per_voice: Vec<Vec<Attribute>> =
            voices.iter().map(|voice| voice.attributes.clone()).collect();
        let changed = attributes_per_voice.iter().any(|a| !a.is_empty());
        let number = self.number;

        let element = match self.status {
            DivisionStatus::Start => {
                self.status = DivisionStatus::Bar;
                Element::StartPiece(StartPiece {
                    voice_count: voices.len(),
                    directives: attribute_directives(&attributes_per_voice),
                    attributes_per_voice,
                    flags,
                    number,
                })
            }
            DivisionStatus::Bar if changed => Element::ChangeContext(ChangeContext {
                directives: attribute_directives(&attributes_per_voice),
                attributes_per_voice,
                flags,
                number,
            }),
            DivisionStatus::Bar => Element::Bar(Bar { flags, number }),
            DivisionStatus::End => {
                debug!("division {} requested after the end of the piece", number);
                Element::EndPiece(EndPiece { flags, number })
            }
        };

        debug!("division {}: {:?}", number, flags);
        notation.push(element);
        self.number += 1;
    }

    /// Emit the terminal element.
    ///
    /// `endings` are the first voice's endings of the last measure, scanned
    /// again the same way as for the last boundary: unsupported ones are
    /// emitted a second time. `right_repeat` adds a repeat closing the last
    /// measure, which repeat normalization otherwise leaves out.
    pub fn finish(&mut self, endings: &[Ending], right_repeat: bool, notation: &mut Notation) {
        self.status = DivisionStatus::End;
        let mut flags = scan_endings(endings, Some(&mut *notation));
        flags.right_repeat |= right_repeat;

        debug!("division {}: end of piece", self.number);
        notation.push(Element::EndPiece(EndPiece {
            flags,
            number: self.number,
        }));
        self.number += 1;
    }
}

fn push_voltas(endings: &[Ending], opening: bool, notation: &mut Notation) {
    for ending in endings {
        if let Ending::Volta { start, number } = ending {
            if *start == opening {
                notation.push(Element::Volta(Volta {
                    start: *start,
                    number: *number,
                }));
            }
        }
    }
}

/// Collect repeat and double-bar flags; unsupported endings go to `notation`
fn scan_endings(endings: &[Ending], mut notation: Option<&mut Notation>) -> BarFlags {
    let mut flags = BarFlags::default();
    for ending in endings {
        match ending {
            Ending::Repeat { left, right } => {
                flags.left_repeat = *left;
                flags.right_repeat = *right;
            }
            Ending::DoubleBar { .. } => flags.double = true,
            Ending::Unsupported(unsupported) => {
                if let Some(notation) = notation.as_deref_mut() {
                    notation.push(Element::Unsupported(unsupported.clone()));
                }
            }
            Ending::Volta { .. } => {}
        }
    }
    flags
}

/// Resolve per-voice attributes into meter and signature directives
pub fn attribute_directives(attributes_per_voice: &[Vec<Attribute>]) -> Vec<AttributeDirective> {
    let mut directives = Vec::new();
    directives_for(
        attributes_per_voice,
        |a| matches!(a, Attribute::Meter { .. }),
        &mut directives,
    );
    directives_for(
        attributes_per_voice,
        |a| matches!(a, Attribute::Signature { .. }),
        &mut directives,
    );
    directives
}

fn directives_for(
    attributes_per_voice: &[Vec<Attribute>],
    is_kind: impl Fn(&Attribute) -> bool,
    directives: &mut Vec<AttributeDirective>,
) {
    let last_of_kind =
        |attributes: &Vec<Attribute>| attributes.iter().rev().find(|a| is_kind(a)).copied();

    let first = attributes_per_voice.first().and_then(|a| last_of_kind(a));
    let single = attributes_per_voice
        .iter()
        .all(|attributes| last_of_kind(attributes) == first);

    if single {
        if let Some(attribute) = first {
            directives.push(AttributeDirective {
                voice: ALL_VOICES,
                attribute,
            });
        }
        return;
    }

    for (index, attributes) in attributes_per_voice.iter().enumerate() {
        for attribute in attributes.iter().filter(|a| is_kind(a)) {
            directives.push(AttributeDirective {
                voice: index + 1,
                attribute: *attribute,
            });
        }
    }
}
