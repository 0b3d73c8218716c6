//! Output element sequence consumed by the renderer.
//!
//! The renderer walks [`Notation::elements`] strictly in order and prints
//! one macro group per element.

use serde::Serialize;

use crate::model::{Attribute, Duration, Unsupported};

/// Voice address of an attribute directive: `0` applies to all voices,
/// otherwise the 1-based voice index.
pub const ALL_VOICES: usize = 0;

/// A meter or signature directive addressed to one voice or to all of them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttributeDirective {
    pub voice: usize,
    pub attribute: Attribute,
}

impl AttributeDirective {
    pub fn is_global(&self) -> bool {
        self.voice == ALL_VOICES
    }
}

/// Repeat and double-bar flags of a boundary element
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BarFlags {
    pub left_repeat: bool,
    pub right_repeat: bool,
    pub double: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartPiece {
    pub voice_count: usize,
    pub attributes_per_voice: Vec<Vec<Attribute>>,
    pub directives: Vec<AttributeDirective>,
    pub flags: BarFlags,
    pub number: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub flags: BarFlags,
    pub number: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeContext {
    pub attributes_per_voice: Vec<Vec<Attribute>>,
    pub directives: Vec<AttributeDirective>,
    pub flags: BarFlags,
    pub number: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndPiece {
    pub flags: BarFlags,
    pub number: usize,
}

/// Column content of a row: an onset or a continuation of an earlier one
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Slot {
    Event(Duration),
    Nil,
}

/// One time-aligned row with one slot per voice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notes {
    pub length: u8,
    pub voices: Vec<Slot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Volta {
    pub start: bool,
    pub number: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "element", rename_all = "kebab-case")]
pub enum Element {
    StartPiece(StartPiece),
    Bar(Bar),
    ChangeContext(ChangeContext),
    EndPiece(EndPiece),
    Notes(Notes),
    Volta(Volta),
    Unsupported(Unsupported),
}

impl Element {
    /// Division number of boundary elements
    pub fn division_number(&self) -> Option<usize> {
        match self {
            Element::StartPiece(start) => Some(start.number),
            Element::Bar(bar) => Some(bar.number),
            Element::ChangeContext(context) => Some(context.number),
            Element::EndPiece(end) => Some(end.number),
            Element::Notes(_) | Element::Volta(_) | Element::Unsupported(_) => None,
        }
    }

    pub fn notes(&self) -> Option<&Notes> {
        match self {
            Element::Notes(notes) => Some(notes),
            _ => None,
        }
    }
}

/// The flat, ordered result of processing a score
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Notation {
    pub elements: Vec<Element>,
}

impl Notation {
    pub fn push(&mut self, element: Element) {
        self.elements.push(element);
    }

    /// All `Notes` rows in order
    pub fn rows(&self) -> impl Iterator<Item = &Notes> {
        self.elements.iter().filter_map(Element::notes)
    }

    /// Serialize the element sequence as YAML
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
