use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SaveError;
use crate::gen3::types::{SECTION_COUNT, SECTION_SIZE, SLOT_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// One of the two redundant save slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotId {
    A,
    B,
}

impl SlotId {
    pub const ALL: [SlotId; 2] = [SlotId::A, SlotId::B];

    pub fn base_offset(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => SLOT_SIZE,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => f.write_str("A"),
            Self::B => f.write_str("B"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionLayout {
    pub id: u16,
    pub physical_index: usize,
    pub range: ByteRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotLayout {
    pub slot: SlotId,
    pub counter: u32,
    /// Physical index of the section with id 0.
    pub rotation: usize,
    pub sections: Vec<SectionLayout>,
}

impl SlotLayout {
    pub fn section(&self, id: u16) -> Option<&SectionLayout> {
        self.sections.iter().find(|section| section.id == id)
    }

    pub fn validate(&self) -> Result<(), SaveError> {
        if self.sections.len() != SECTION_COUNT {
            return Err(SaveError::UnknownFormatVersion(format!(
                "slot {} has {} sections, expected {SECTION_COUNT}",
                self.slot,
                self.sections.len()
            )));
        }

        let mut seen = [false; SECTION_COUNT];
        let mut expected = self.slot.base_offset();
        for section in &self.sections {
            if section.range.start != expected || section.range.len() != SECTION_SIZE {
                return Err(SaveError::UnknownFormatVersion(format!(
                    "slot {} section at physical index {} spans {}..{}, expected start {expected}",
                    self.slot, section.physical_index, section.range.start, section.range.end
                )));
            }
            let id = section.id as usize;
            if id >= SECTION_COUNT || seen[id] {
                return Err(SaveError::UnknownFormatVersion(format!(
                    "slot {} has duplicate or out-of-range section id {}",
                    self.slot, section.id
                )));
            }
            seen[id] = true;
            expected = section.range.end;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLayout {
    pub file_len: usize,
    pub current: SlotId,
    pub slot_a: Option<SlotLayout>,
    pub slot_b: Option<SlotLayout>,
}

impl FileLayout {
    pub fn slot(&self, id: SlotId) -> Option<&SlotLayout> {
        match id {
            SlotId::A => self.slot_a.as_ref(),
            SlotId::B => self.slot_b.as_ref(),
        }
    }

    pub fn current_slot(&self) -> Result<&SlotLayout, SaveError> {
        self.slot(self.current).ok_or_else(|| {
            SaveError::UnknownFormatVersion(format!(
                "current slot {} is missing from the layout",
                self.current
            ))
        })
    }

    pub fn backup_slot(&self) -> Option<&SlotLayout> {
        self.slot(self.current.other())
    }

    pub fn validate(&self) -> Result<(), SaveError> {
        self.current_slot()?;
        for slot in [&self.slot_a, &self.slot_b].into_iter().flatten() {
            slot.validate()?;
        }
        Ok(())
    }
}
