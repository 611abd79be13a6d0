use serde::{Deserialize, Serialize};

use crate::common::config::{CellSize, LayoutSettings};

/// Thumbnail size class, a step function of the thumbnail count.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SizeClass {
    Single,
    Pair,
    Quad,
    Many,
}

impl SizeClass {
    pub fn for_count(count: usize) -> SizeClass {
        match count {
            0 | 1 => SizeClass::Single,
            2 => SizeClass::Pair,
            3 | 4 => SizeClass::Quad,
            _ => SizeClass::Many,
        }
    }

    pub fn columns(self) -> usize {
        match self {
            SizeClass::Single => 1,
            SizeClass::Pair | SizeClass::Quad => 2,
            SizeClass::Many => 3,
        }
    }

    /// Small grids use fixed gaps and are centred; `Many` keeps a fixed side
    /// margin and derives the gap instead.
    pub fn has_fixed_gaps(self) -> bool { !matches!(self, SizeClass::Many) }

    pub fn cell(self, settings: &LayoutSettings) -> CellSize {
        match self {
            SizeClass::Single => settings.single,
            SizeClass::Pair => settings.pair,
            SizeClass::Quad => settings.quad,
            SizeClass::Many => settings.many,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteColumn {
    Left,
    Right,
}

impl NoteColumn {
    /// Column of the `index`th of `count` notification cards.
    ///
    /// A card without a partner sits in the right column; it moves left once
    /// the next card pairs up with it.
    pub fn for_index(index: usize, count: usize) -> NoteColumn {
        if index % 2 == 1 || index + 1 == count {
            NoteColumn::Right
        } else {
            NoteColumn::Left
        }
    }
}
