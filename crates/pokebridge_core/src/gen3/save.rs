use std::io::Cursor;

use serde::{Deserialize, Serialize};

use crate::creature::{BOX_RECORD_SIZE, CreatureRecord, PARTY_RECORD_SIZE};
use crate::error::SaveError;
use crate::gender::Gender;
use crate::reader::{LittleEndianReader, u32_at};
use crate::text;

use super::types::{
    BADGE_COUNT, BOX_CAPACITY, BOX_COUNT, BOX_NAME_LEN, DEX_FLAGS_LEN, DEX_OWNED_OFFSET,
    DEX_SEEN_OFFSET, EVENT_FLAGS_LEN, PARTY_CAPACITY, PLAY_TIME_OFFSET, STORAGE_BOX_NAMES_OFFSET,
    STORAGE_BOXES_OFFSET, STORAGE_CURRENT_BOX_OFFSET, STORAGE_WALLPAPERS_OFFSET,
    TRAINER_GENDER_OFFSET, TRAINER_ID_OFFSET, TRAINER_NAME_LEN, TRAINER_NAME_OFFSET,
};
use super::variant::FormatVariant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayTime {
    pub hours: u16,
    pub minutes: u8,
    pub seconds: u8,
    pub frames: u8,
}

impl PlayTime {
    pub fn total_seconds(&self) -> u64 {
        self.hours as u64 * 3600 + self.minutes as u64 * 60 + self.seconds as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainerRecord {
    pub name: String,
    pub gender: Gender,
    pub public_id: u16,
    pub secret_id: u16,
    pub play_time: PlayTime,
    pub money: u32,
}

impl TrainerRecord {
    /// The 32-bit id creatures caught by this trainer carry as OTID.
    pub fn transfer_key(&self) -> u32 {
        self.public_id as u32 | ((self.secret_id as u32) << 16)
    }
}

/// The 300-byte event flag array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFlags {
    bytes: Vec<u8>,
}

impl EventFlags {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    pub fn is_set(&self, flag: u16) -> bool {
        let byte = flag as usize / 8;
        self.bytes
            .get(byte)
            .is_some_and(|value| value & (1 << (flag % 8)) != 0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pokedex {
    pub owned: [u8; DEX_FLAGS_LEN],
    pub seen: [u8; DEX_FLAGS_LEN],
    pub national_enabled: bool,
}

impl Pokedex {
    /// `national` is 1-based.
    pub fn is_owned(&self, national: u16) -> bool {
        dex_bit(&self.owned, national)
    }

    pub fn is_seen(&self, national: u16) -> bool {
        dex_bit(&self.seen, national)
    }

    pub fn owned_numbers(&self) -> Vec<u16> {
        let max = (DEX_FLAGS_LEN * 8) as u16;
        (1..=max).filter(|&n| self.is_owned(n)).collect()
    }
}

fn dex_bit(bits: &[u8], national: u16) -> bool {
    if national == 0 {
        return false;
    }
    let index = (national - 1) as usize;
    bits.get(index / 8)
        .is_some_and(|byte| byte & (1 << (index % 8)) != 0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcBox {
    pub name: String,
    pub wallpaper: u8,
    /// Always `BOX_CAPACITY` entries; `None` for an empty slot.
    pub slots: Vec<Option<CreatureRecord>>,
}

impl PcBox {
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        self.occupied() == BOX_CAPACITY
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveGame {
    pub variant: FormatVariant,
    pub trainer: TrainerRecord,
    pub party: Vec<CreatureRecord>,
    pub current_box: u32,
    pub boxes: Vec<PcBox>,
    pub flags: EventFlags,
    pub dex: Pokedex,
}

impl SaveGame {
    pub fn badges(&self) -> [bool; BADGE_COUNT] {
        let first = self.variant.offsets().first_badge_flag;
        std::array::from_fn(|i| self.flags.is_set(first + i as u16))
    }

    pub fn is_champion(&self) -> bool {
        self.flags.is_set(self.variant.offsets().game_clear_flag)
    }

    pub fn creature_count(&self) -> usize {
        self.party.len() + self.boxes.iter().map(PcBox::occupied).sum::<usize>()
    }
}

pub(super) fn security_key(variant: FormatVariant, trainer: &[u8]) -> u32 {
    variant
        .offsets()
        .security_key
        .map(|offset| u32_at(trainer, offset))
        .unwrap_or(0)
}

pub(super) fn parse_trainer(
    variant: FormatVariant,
    trainer: &[u8],
    save_block1: &[u8],
) -> Result<TrainerRecord, SaveError> {
    let mut r = LittleEndianReader::new(Cursor::new(trainer));
    r.seek_to(TRAINER_NAME_OFFSET as u64)?;
    let name = r.read_array::<TRAINER_NAME_LEN>()?;
    r.seek_to(TRAINER_GENDER_OFFSET as u64)?;
    let gender = Gender::from_raw(r.read_u8()?);
    r.seek_to(TRAINER_ID_OFFSET as u64)?;
    let public_id = r.read_u16()?;
    let secret_id = r.read_u16()?;
    r.seek_to(PLAY_TIME_OFFSET as u64)?;
    let play_time = PlayTime {
        hours: r.read_u16()?,
        minutes: r.read_u8()?,
        seconds: r.read_u8()?,
        frames: r.read_u8()?,
    };

    let money = u32_at(save_block1, variant.offsets().money) ^ security_key(variant, trainer);

    Ok(TrainerRecord {
        name: text::decode(&name),
        gender,
        public_id,
        secret_id,
        play_time,
        money,
    })
}

pub(super) fn parse_dex(variant: FormatVariant, trainer: &[u8]) -> Pokedex {
    let mut owned = [0u8; DEX_FLAGS_LEN];
    owned.copy_from_slice(&trainer[DEX_OWNED_OFFSET..DEX_OWNED_OFFSET + DEX_FLAGS_LEN]);
    let mut seen = [0u8; DEX_FLAGS_LEN];
    seen.copy_from_slice(&trainer[DEX_SEEN_OFFSET..DEX_SEEN_OFFSET + DEX_FLAGS_LEN]);
    let (magic_offset, magic) = variant.offsets().national_magic;
    Pokedex {
        owned,
        seen,
        national_enabled: trainer[magic_offset] == magic,
    }
}

pub(super) fn parse_party(
    variant: FormatVariant,
    save_block1: &[u8],
) -> Result<Vec<CreatureRecord>, SaveError> {
    let offsets = variant.offsets();
    let count = u32_at(save_block1, offsets.party_count) as usize;
    if count > PARTY_CAPACITY {
        return Err(SaveError::UnknownFormatVersion(format!(
            "party count {count} exceeds {PARTY_CAPACITY}"
        )));
    }
    (0..count)
        .map(|i| {
            let start = offsets.party + i * PARTY_RECORD_SIZE;
            CreatureRecord::from_bytes(&save_block1[start..start + PARTY_RECORD_SIZE])
        })
        .collect()
}

pub(super) fn parse_flags(variant: FormatVariant, save_block1: &[u8]) -> EventFlags {
    let start = variant.offsets().event_flags;
    EventFlags::from_bytes(&save_block1[start..start + EVENT_FLAGS_LEN])
}

pub(crate) fn box_record_offset(box_index: usize, slot: usize) -> usize {
    STORAGE_BOXES_OFFSET + (box_index * BOX_CAPACITY + slot) * BOX_RECORD_SIZE
}

pub(super) fn parse_storage(storage: &[u8]) -> Result<(u32, Vec<PcBox>), SaveError> {
    let current_box = u32_at(storage, STORAGE_CURRENT_BOX_OFFSET);
    let mut boxes = Vec::with_capacity(BOX_COUNT);
    for box_index in 0..BOX_COUNT {
        let mut slots = Vec::with_capacity(BOX_CAPACITY);
        for slot in 0..BOX_CAPACITY {
            let start = box_record_offset(box_index, slot);
            let record = CreatureRecord::from_bytes(&storage[start..start + BOX_RECORD_SIZE])?;
            slots.push((!record.is_empty()).then_some(record));
        }
        let name_start = STORAGE_BOX_NAMES_OFFSET + box_index * BOX_NAME_LEN;
        boxes.push(PcBox {
            name: text::decode(&storage[name_start..name_start + BOX_NAME_LEN]),
            wallpaper: storage[STORAGE_WALLPAPERS_OFFSET + box_index],
            slots,
        });
    }
    Ok((current_box, boxes))
}
