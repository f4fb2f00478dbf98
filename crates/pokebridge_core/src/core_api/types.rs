use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::gen3::save::PlayTime;
use crate::gen3::types::{BADGE_COUNT, BOX_CAPACITY, BOX_COUNT, PARTY_CAPACITY};
use crate::gen3::variant::{FormatVariant, Title};
use crate::gender::Gender;
use crate::layout::SlotId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub title: Title,
    pub variant: FormatVariant,
    pub trainer_name: String,
    pub gender: Gender,
    pub public_id: u16,
    pub secret_id: u16,
    pub play_time: PlayTime,
    pub money: u32,
    pub party_count: usize,
    pub boxed_count: usize,
    pub current_box: u32,
    pub badges: [bool; BADGE_COUNT],
    pub champion: bool,
    pub national_dex: bool,
    pub dex_owned: usize,
    pub dex_seen: usize,
    pub current_slot: SlotId,
    pub save_counter: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapabilityIssue {
    BackupSlotBlank,
    BadEggPresent,
    RecordChecksumMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Capabilities {
    pub can_query: bool,
    pub can_transfer: bool,
    pub issues: Vec<CapabilityIssue>,
}

impl Capabilities {
    pub fn editable(issues: Vec<CapabilityIssue>) -> Self {
        Self {
            can_query: true,
            can_transfer: true,
            issues,
        }
    }
}

/// Where a record sits inside one save. Indices are zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Location {
    Party(u8),
    Box { box_index: u8, slot: u8 },
}

impl Location {
    pub fn validate(self) -> Result<Self, String> {
        match self {
            Self::Party(index) if (index as usize) < PARTY_CAPACITY => Ok(self),
            Self::Box { box_index, slot }
                if (box_index as usize) < BOX_COUNT && (slot as usize) < BOX_CAPACITY =>
            {
                Ok(self)
            }
            _ => Err(format!("location {self} is out of range")),
        }
    }

    pub fn container(self) -> Container {
        match self {
            Self::Party(_) => Container::Party,
            Self::Box { box_index, .. } => Container::Box(box_index),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Party(index) => write!(f, "party:{index}"),
            Self::Box { box_index, slot } => write!(f, "box:{box_index}:{slot}"),
        }
    }
}

impl FromStr for Location {
    type Err = String;

    /// `party:N` or `box:B:S`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = value.trim().split(':').collect();
        let number = |raw: &str| {
            raw.parse::<u8>()
                .map_err(|_| format!("invalid index '{raw}' in location '{value}'"))
        };
        let location = match parts.as_slice() {
            [kind, index] if kind.eq_ignore_ascii_case("party") => Self::Party(number(index)?),
            [kind, box_index, slot] if kind.eq_ignore_ascii_case("box") => Self::Box {
                box_index: number(box_index)?,
                slot: number(slot)?,
            },
            _ => {
                return Err(format!(
                    "invalid location '{value}', expected party:N or box:B:S"
                ));
            }
        };
        location.validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Container {
    Party,
    Box(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StorageSlot {
    pub title: Title,
    pub location: Location,
}

impl StorageSlot {
    pub fn new(title: Title, location: Location) -> Self {
        Self { title, location }
    }
}

impl fmt::Display for StorageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.title, self.location)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub from: StorageSlot,
    /// Final resting place. Differs from the requested slot when a party
    /// index was normalised to the next free position.
    pub to: StorageSlot,
    pub species: u16,
    pub pid: u32,
}
