use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::types::{EMERALD_ONLY_RANGE, GAME_CODE_OFFSET};
use crate::reader::u32_at;

/// The five supported titles. The launcher knows which ROM a save belongs
/// to; the save itself only distinguishes the three layouts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Title {
    Ruby,
    Sapphire,
    Emerald,
    FireRed,
    LeafGreen,
}

pub const TITLE_COUNT: usize = 5;

impl Title {
    pub const ALL: [Title; TITLE_COUNT] = [
        Title::Ruby,
        Title::Sapphire,
        Title::Emerald,
        Title::FireRed,
        Title::LeafGreen,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Ruby => 0,
            Self::Sapphire => 1,
            Self::Emerald => 2,
            Self::FireRed => 3,
            Self::LeafGreen => 4,
        }
    }

    pub fn variant(self) -> FormatVariant {
        match self {
            Self::Ruby | Self::Sapphire => FormatVariant::RubySapphire,
            Self::Emerald => FormatVariant::Emerald,
            Self::FireRed | Self::LeafGreen => FormatVariant::FireRedLeafGreen,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ruby => "Ruby",
            Self::Sapphire => "Sapphire",
            Self::Emerald => "Emerald",
            Self::FireRed => "FireRed",
            Self::LeafGreen => "LeafGreen",
        }
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Title {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace(['-', '_', ' '], "");
        match normalized.as_str() {
            "ruby" | "r" => Ok(Self::Ruby),
            "sapphire" | "s" => Ok(Self::Sapphire),
            "emerald" | "e" => Ok(Self::Emerald),
            "firered" | "fr" => Ok(Self::FireRed),
            "leafgreen" | "lg" => Ok(Self::LeafGreen),
            _ => Err(format!(
                "invalid title '{value}', expected ruby|sapphire|emerald|firered|leafgreen"
            )),
        }
    }
}

/// Section layout family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatVariant {
    RubySapphire,
    Emerald,
    FireRedLeafGreen,
}

/// Per-variant offsets. Section-0 offsets are relative to the trainer
/// payload; party and money to section 1; flags to the concatenated
/// SaveBlock1 buffer (sections 1-4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantOffsets {
    pub party_count: usize,
    pub party: usize,
    pub money: usize,
    pub security_key: Option<usize>,
    pub national_magic: (usize, u8),
    pub event_flags: usize,
    pub first_badge_flag: u16,
    pub game_clear_flag: u16,
}

const RUBY_SAPPHIRE: VariantOffsets = VariantOffsets {
    party_count: 0x234,
    party: 0x238,
    money: 0x490,
    security_key: None,
    national_magic: (0x1A, 0xDA),
    event_flags: 0x1220,
    first_badge_flag: 0x807,
    game_clear_flag: 0x804,
};

const EMERALD: VariantOffsets = VariantOffsets {
    party_count: 0x234,
    party: 0x238,
    money: 0x490,
    security_key: Some(0xAC),
    national_magic: (0x1A, 0xDA),
    event_flags: 0x1270,
    first_badge_flag: 0x867,
    game_clear_flag: 0x864,
};

const FIRERED_LEAFGREEN: VariantOffsets = VariantOffsets {
    party_count: 0x34,
    party: 0x38,
    money: 0x290,
    security_key: Some(0xF20),
    national_magic: (0x1B, 0xB9),
    event_flags: 0x0EE0,
    first_badge_flag: 0x820,
    game_clear_flag: 0x82C,
};

impl FormatVariant {
    pub fn offsets(self) -> &'static VariantOffsets {
        match self {
            Self::RubySapphire => &RUBY_SAPPHIRE,
            Self::Emerald => &EMERALD,
            Self::FireRedLeafGreen => &FIRERED_LEAFGREEN,
        }
    }

    pub fn titles(self) -> &'static [Title] {
        match self {
            Self::RubySapphire => &[Title::Ruby, Title::Sapphire],
            Self::Emerald => &[Title::Emerald],
            Self::FireRedLeafGreen => &[Title::FireRed, Title::LeafGreen],
        }
    }

    /// Guess the layout from the trainer section payload.
    ///
    /// The word at 0xAC is 1 in FireRed/LeafGreen, 0 in Ruby/Sapphire without
    /// battle tower data, and Emerald's security key otherwise. Only Emerald
    /// writes past 0x890 in the trainer section.
    pub fn detect(trainer_payload: &[u8]) -> Self {
        match u32_at(trainer_payload, GAME_CODE_OFFSET) {
            1 => Self::FireRedLeafGreen,
            0 => Self::RubySapphire,
            _ => {
                let emerald_only = &trainer_payload[EMERALD_ONLY_RANGE];
                if emerald_only.iter().any(|&b| b != 0) {
                    Self::Emerald
                } else {
                    Self::RubySapphire
                }
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RubySapphire => "Ruby/Sapphire",
            Self::Emerald => "Emerald",
            Self::FireRedLeafGreen => "FireRed/LeafGreen",
        }
    }
}

impl fmt::Display for FormatVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
