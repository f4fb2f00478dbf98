use std::fmt;

use serde::{Deserialize, Serialize};

/// Trainer gender as stored in the trainer block (a whole byte) or in a
/// creature's origin word (a single bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    /// Trainer block byte outside 0/1; kept so it can be written back.
    Other(u8),
}

impl Gender {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Male,
            1 => Self::Female,
            other => Self::Other(other),
        }
    }

    pub fn from_bit(female: bool) -> Self {
        if female { Self::Female } else { Self::Male }
    }

    pub fn raw(self) -> u8 {
        match self {
            Self::Male => 0,
            Self::Female => 1,
            Self::Other(raw) => raw,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Male => "♂",
            Self::Female => "♀",
            Self::Other(_) => "?",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Male => f.write_str("Male"),
            Self::Female => f.write_str("Female"),
            Self::Other(raw) => write!(f, "Unknown ({raw})"),
        }
    }
}
