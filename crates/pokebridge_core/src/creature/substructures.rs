use serde::{Deserialize, Serialize};

use crate::gender::Gender;
use crate::reader::{put_u16, put_u32, u16_at, u32_at};

use super::codec::Substructure;

const IV_BITS: u32 = 5;
const IV_MASK: u32 = 0x1F;
const EGG_BIT: u32 = 30;
const ABILITY_BIT: u32 = 31;
const MET_LEVEL_MASK: u16 = 0x7F;
const ORIGIN_GAME_SHIFT: u16 = 7;
const BALL_SHIFT: u16 = 11;
const OT_GENDER_BIT: u16 = 15;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Growth {
    pub species: u16,
    pub held_item: u16,
    pub experience: u32,
    pub pp_bonuses: u8,
    pub friendship: u8,
    pub unknown: u16,
}

impl Growth {
    pub fn parse(raw: &Substructure) -> Self {
        Self {
            species: u16_at(raw, 0),
            held_item: u16_at(raw, 2),
            experience: u32_at(raw, 4),
            pp_bonuses: raw[8],
            friendship: raw[9],
            unknown: u16_at(raw, 10),
        }
    }

    pub fn to_bytes(&self) -> Substructure {
        let mut raw = [0u8; 12];
        put_u16(&mut raw, 0, self.species);
        put_u16(&mut raw, 2, self.held_item);
        put_u32(&mut raw, 4, self.experience);
        raw[8] = self.pp_bonuses;
        raw[9] = self.friendship;
        put_u16(&mut raw, 10, self.unknown);
        raw
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attacks {
    pub moves: [u16; 4],
    pub pp: [u8; 4],
}

impl Attacks {
    pub fn parse(raw: &Substructure) -> Self {
        Self {
            moves: [
                u16_at(raw, 0),
                u16_at(raw, 2),
                u16_at(raw, 4),
                u16_at(raw, 6),
            ],
            pp: [raw[8], raw[9], raw[10], raw[11]],
        }
    }

    pub fn to_bytes(&self) -> Substructure {
        let mut raw = [0u8; 12];
        for (i, mv) in self.moves.iter().enumerate() {
            put_u16(&mut raw, i * 2, *mv);
        }
        raw[8..12].copy_from_slice(&self.pp);
        raw
    }
}

/// Effort values and contest condition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// HP, Attack, Defense, Speed, Sp. Attack, Sp. Defense.
    pub evs: [u8; 6],
    /// Coolness, Beauty, Cuteness, Smartness, Toughness, Feel (sheen).
    pub contest: [u8; 6],
}

impl Condition {
    pub fn parse(raw: &Substructure) -> Self {
        let mut evs = [0u8; 6];
        let mut contest = [0u8; 6];
        evs.copy_from_slice(&raw[0..6]);
        contest.copy_from_slice(&raw[6..12]);
        Self { evs, contest }
    }

    pub fn to_bytes(&self) -> Substructure {
        let mut raw = [0u8; 12];
        raw[0..6].copy_from_slice(&self.evs);
        raw[6..12].copy_from_slice(&self.contest);
        raw
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Misc {
    pub pokerus: u8,
    pub met_location: u8,
    pub origins: u16,
    pub iv_egg_ability: u32,
    pub ribbons: u32,
}

impl Misc {
    pub fn parse(raw: &Substructure) -> Self {
        Self {
            pokerus: raw[0],
            met_location: raw[1],
            origins: u16_at(raw, 2),
            iv_egg_ability: u32_at(raw, 4),
            ribbons: u32_at(raw, 8),
        }
    }

    pub fn to_bytes(&self) -> Substructure {
        let mut raw = [0u8; 12];
        raw[0] = self.pokerus;
        raw[1] = self.met_location;
        put_u16(&mut raw, 2, self.origins);
        put_u32(&mut raw, 4, self.iv_egg_ability);
        put_u32(&mut raw, 8, self.ribbons);
        raw
    }

    /// HP, Attack, Defense, Speed, Sp. Attack, Sp. Defense.
    pub fn ivs(&self) -> [u8; 6] {
        let mut out = [0u8; 6];
        for (i, iv) in out.iter_mut().enumerate() {
            *iv = ((self.iv_egg_ability >> (i as u32 * IV_BITS)) & IV_MASK) as u8;
        }
        out
    }

    pub fn is_egg(&self) -> bool {
        self.iv_egg_ability & (1 << EGG_BIT) != 0
    }

    pub fn ability_slot(&self) -> u8 {
        ((self.iv_egg_ability >> ABILITY_BIT) & 1) as u8
    }

    pub fn met_level(&self) -> u8 {
        (self.origins & MET_LEVEL_MASK) as u8
    }

    pub fn origin_game(&self) -> u8 {
        ((self.origins >> ORIGIN_GAME_SHIFT) & 0xF) as u8
    }

    pub fn ball(&self) -> u8 {
        ((self.origins >> BALL_SHIFT) & 0xF) as u8
    }

    pub fn ot_gender(&self) -> Gender {
        Gender::from_bit(self.origins & (1 << OT_GENDER_BIT) != 0)
    }
}
