//! Synthetic save images for tests and demos.
//!
//! Real cartridge dumps cannot ship with the repository, so tests across the
//! workspace build their inputs here.

use crate::creature::codec::SubstructureKind;
use crate::creature::substructures::{Attacks, Condition, Growth, Misc};
use crate::creature::{BOX_RECORD_SIZE, CreatureRecord, PARTY_RECORD_SIZE, PartyStats};
use crate::error::SaveError;
use crate::gen3::save::{PlayTime, box_record_offset};
use crate::gen3::sections::{
    SAVE_BLOCK1_SECTIONS, STORAGE_SECTIONS, SectionBlob, region_read, region_write, write_section,
};
use crate::gen3::types::{
    BOX_CAPACITY, BOX_COUNT, BOX_NAME_LEN, DEX_FLAGS_LEN, DEX_OWNED_OFFSET, DEX_SEEN_OFFSET,
    EMERALD_ONLY_RANGE, FOOTER_ID_OFFSET, GAME_CODE_OFFSET, PARTY_CAPACITY, PLAY_TIME_OFFSET,
    SAVE_SIZE, SECTION_COUNT, SECTION_SIZE, STORAGE_BOX_NAMES_OFFSET, STORAGE_CURRENT_BOX_OFFSET,
    STORAGE_WALLPAPERS_OFFSET, TRAINER_GENDER_OFFSET, TRAINER_ID_OFFSET, TRAINER_NAME_LEN,
    TRAINER_NAME_OFFSET,
};
use crate::gen3::variant::{FormatVariant, Title};
use crate::layout::SlotId;
use crate::reader::{put_u16, put_u32};
use crate::text;

const EGG_BIT: u32 = 1 << 30;

/// A box record with plausible growth/attack/misc data.
pub fn creature(species: u16, pid: u32, otid: u32, nickname: &str) -> CreatureRecord {
    build_creature(species, pid, otid, nickname, false)
}

/// A party record: `creature` plus level and battle stats.
pub fn party_creature(
    species: u16,
    pid: u32,
    otid: u32,
    nickname: &str,
    level: u8,
) -> CreatureRecord {
    creature(species, pid, otid, nickname).with_party_stats(PartyStats {
        status: 0,
        level,
        mail_id: 0xFF,
        hp: 20 + level as u16,
        stats: [20 + level as u16; 6],
    })
}

/// A party-sized egg.
pub fn party_egg(species: u16, pid: u32, otid: u32) -> CreatureRecord {
    build_creature(species, pid, otid, "EGG", true).with_party_stats(PartyStats {
        level: 5,
        mail_id: 0xFF,
        ..PartyStats::default()
    })
}

fn build_creature(
    species: u16,
    pid: u32,
    otid: u32,
    nickname: &str,
    egg: bool,
) -> CreatureRecord {
    let mut subs = [[0u8; 12]; 4];
    subs[SubstructureKind::Growth.index()] = Growth {
        species,
        held_item: 0,
        experience: 135,
        pp_bonuses: 0,
        friendship: 70,
        unknown: 0,
    }
    .to_bytes();
    subs[SubstructureKind::Attacks.index()] = Attacks {
        moves: [33, 45, 0, 0],
        pp: [35, 40, 0, 0],
    }
    .to_bytes();
    subs[SubstructureKind::Condition.index()] = Condition::default().to_bytes();
    let ivs = (pid % 32) | ((otid % 32) << 5) | (31 << 10);
    subs[SubstructureKind::Misc.index()] = Misc {
        pokerus: 0,
        met_location: 16,
        origins: 5 | (4 << 11),
        iv_egg_ability: if egg { ivs | EGG_BIT } else { ivs },
        ribbons: 0,
    }
    .to_bytes();

    match CreatureRecord::build(pid, otid, nickname, "ASH", &subs) {
        Ok(record) => record,
        Err(e) => panic!("fixture creature could not be built: {e}"),
    }
}

/// Builder for a complete 128 KiB image.
#[derive(Debug, Clone)]
pub struct SaveBuilder {
    variant: FormatVariant,
    trainer_name: String,
    gender: u8,
    public_id: u16,
    secret_id: u16,
    play_time: PlayTime,
    money: u32,
    security_key: u32,
    party: Vec<CreatureRecord>,
    boxed: Vec<(usize, usize, CreatureRecord)>,
    badges: usize,
    champion: bool,
    national_dex: bool,
    owned: Vec<u16>,
    slot_a: Option<(u32, usize)>,
    slot_b: Option<(u32, usize)>,
}

impl SaveBuilder {
    pub fn new(variant: FormatVariant) -> Self {
        let security_key = match variant {
            FormatVariant::RubySapphire => 0,
            FormatVariant::Emerald => 0x5A5A_1234,
            FormatVariant::FireRedLeafGreen => 0x0BAD_F00D,
        };
        Self {
            variant,
            trainer_name: "ASH".to_string(),
            gender: 0,
            public_id: 12345,
            secret_id: 54321,
            play_time: PlayTime {
                hours: 10,
                minutes: 20,
                seconds: 30,
                frames: 0,
            },
            money: 3000,
            security_key,
            party: Vec::new(),
            boxed: Vec::new(),
            badges: 0,
            champion: false,
            national_dex: false,
            owned: Vec::new(),
            slot_a: Some((10, 0)),
            slot_b: Some((9, 5)),
        }
    }

    pub fn for_title(title: Title) -> Self {
        Self::new(title.variant())
    }

    pub fn trainer(mut self, name: &str, public_id: u16, secret_id: u16) -> Self {
        self.trainer_name = name.to_string();
        self.public_id = public_id;
        self.secret_id = secret_id;
        self
    }

    pub fn gender(mut self, raw: u8) -> Self {
        self.gender = raw;
        self
    }

    pub fn play_time(mut self, hours: u16, minutes: u8, seconds: u8) -> Self {
        self.play_time = PlayTime {
            hours,
            minutes,
            seconds,
            frames: 0,
        };
        self
    }

    pub fn money(mut self, money: u32) -> Self {
        self.money = money;
        self
    }

    pub fn party_member(mut self, record: CreatureRecord) -> Self {
        self.party.push(record);
        self
    }

    pub fn boxed(mut self, box_index: usize, slot: usize, record: CreatureRecord) -> Self {
        self.boxed.push((box_index, slot, record));
        self
    }

    pub fn badges(mut self, count: usize) -> Self {
        self.badges = count.min(8);
        self
    }

    pub fn champion(mut self, champion: bool) -> Self {
        self.champion = champion;
        self
    }

    pub fn national_dex(mut self, enabled: bool) -> Self {
        self.national_dex = enabled;
        self
    }

    pub fn owned(mut self, numbers: impl IntoIterator<Item = u16>) -> Self {
        self.owned.extend(numbers);
        self
    }

    /// Save counter and rotation of each slot; `None` leaves the slot blank.
    pub fn slots(mut self, slot_a: Option<(u32, usize)>, slot_b: Option<(u32, usize)>) -> Self {
        self.slot_a = slot_a;
        self.slot_b = slot_b;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        match self.try_build() {
            Ok(bytes) => bytes,
            Err(e) => panic!("fixture save could not be built: {e}"),
        }
    }

    pub fn try_build(&self) -> Result<Vec<u8>, SaveError> {
        let mut blobs: Vec<SectionBlob> = (0..SECTION_COUNT as u16)
            .map(|id| {
                let mut bytes = vec![0u8; SECTION_SIZE];
                put_u16(&mut bytes, FOOTER_ID_OFFSET, id);
                SectionBlob { bytes }
            })
            .collect();

        self.write_trainer(blobs[0].payload_mut())?;

        let mut save_block1 = region_read(&blobs, SAVE_BLOCK1_SECTIONS);
        self.write_save_block1(&mut save_block1)?;
        region_write(&mut blobs, SAVE_BLOCK1_SECTIONS, &save_block1)?;

        let mut storage = region_read(&blobs, STORAGE_SECTIONS);
        self.write_storage(&mut storage)?;
        region_write(&mut blobs, STORAGE_SECTIONS, &storage)?;

        let mut image = vec![0u8; SAVE_SIZE];
        for (slot, setup) in [(SlotId::A, self.slot_a), (SlotId::B, self.slot_b)] {
            let Some((counter, rotation)) = setup else {
                continue;
            };
            for blob in &blobs {
                let physical = (blob.id() as usize + rotation) % SECTION_COUNT;
                write_section(
                    &mut image,
                    slot.base_offset() + physical * SECTION_SIZE,
                    blob,
                    counter,
                );
            }
        }
        Ok(image)
    }

    fn write_trainer(&self, trainer: &mut [u8]) -> Result<(), SaveError> {
        let name = text::encode(&self.trainer_name, TRAINER_NAME_LEN)
            .ok_or_else(|| SaveError::UnencodableText(self.trainer_name.clone()))?;
        trainer[TRAINER_NAME_OFFSET..TRAINER_NAME_OFFSET + TRAINER_NAME_LEN]
            .copy_from_slice(&name);
        trainer[TRAINER_GENDER_OFFSET] = self.gender;
        put_u16(trainer, TRAINER_ID_OFFSET, self.public_id);
        put_u16(trainer, TRAINER_ID_OFFSET + 2, self.secret_id);
        put_u16(trainer, PLAY_TIME_OFFSET, self.play_time.hours);
        trainer[PLAY_TIME_OFFSET + 2] = self.play_time.minutes;
        trainer[PLAY_TIME_OFFSET + 3] = self.play_time.seconds;
        trainer[PLAY_TIME_OFFSET + 4] = self.play_time.frames;

        if self.national_dex {
            let (offset, magic) = self.variant.offsets().national_magic;
            trainer[offset] = magic;
        }
        for &national in &self.owned {
            set_dex_bit(&mut trainer[DEX_OWNED_OFFSET..DEX_OWNED_OFFSET + DEX_FLAGS_LEN], national);
            set_dex_bit(&mut trainer[DEX_SEEN_OFFSET..DEX_SEEN_OFFSET + DEX_FLAGS_LEN], national);
        }

        match self.variant {
            FormatVariant::RubySapphire => put_u32(trainer, GAME_CODE_OFFSET, 0),
            FormatVariant::Emerald => {
                put_u32(trainer, GAME_CODE_OFFSET, self.security_key);
                trainer[EMERALD_ONLY_RANGE.start] = 1;
            }
            FormatVariant::FireRedLeafGreen => {
                put_u32(trainer, GAME_CODE_OFFSET, 1);
                if let Some(offset) = self.variant.offsets().security_key {
                    put_u32(trainer, offset, self.security_key);
                }
            }
        }
        Ok(())
    }

    fn write_save_block1(&self, block: &mut [u8]) -> Result<(), SaveError> {
        let offsets = self.variant.offsets();
        if self.party.len() > PARTY_CAPACITY {
            return Err(SaveError::Full("party".to_string()));
        }
        put_u32(block, offsets.party_count, self.party.len() as u32);
        for (i, record) in self.party.iter().enumerate() {
            let start = offsets.party + i * PARTY_RECORD_SIZE;
            let bytes = record.as_bytes();
            block[start..start + bytes.len()].copy_from_slice(bytes);
        }

        let key = match self.variant {
            FormatVariant::RubySapphire => 0,
            _ => self.security_key,
        };
        put_u32(block, offsets.money, self.money ^ key);

        let flags = &mut block[offsets.event_flags..];
        let mut set_flag = |flag: u16| flags[flag as usize / 8] |= 1 << (flag % 8);
        for i in 0..self.badges {
            set_flag(offsets.first_badge_flag + i as u16);
        }
        if self.champion {
            set_flag(offsets.game_clear_flag);
        }
        Ok(())
    }

    fn write_storage(&self, storage: &mut [u8]) -> Result<(), SaveError> {
        put_u32(storage, STORAGE_CURRENT_BOX_OFFSET, 0);
        for box_index in 0..BOX_COUNT {
            let label = format!("BOX{}", box_index + 1);
            let name = text::encode(&label, BOX_NAME_LEN)
                .ok_or_else(|| SaveError::UnencodableText(label.clone()))?;
            let start = STORAGE_BOX_NAMES_OFFSET + box_index * BOX_NAME_LEN;
            storage[start..start + BOX_NAME_LEN].copy_from_slice(&name);
            storage[STORAGE_WALLPAPERS_OFFSET + box_index] = (box_index % 16) as u8;
        }
        for (box_index, slot, record) in &self.boxed {
            if *box_index >= BOX_COUNT || *slot >= BOX_CAPACITY {
                return Err(SaveError::InvalidLocation(format!("box {box_index} slot {slot}")));
            }
            let start = box_record_offset(*box_index, *slot);
            storage[start..start + BOX_RECORD_SIZE].copy_from_slice(record.box_bytes());
        }
        Ok(())
    }
}

fn set_dex_bit(bits: &mut [u8], national: u16) {
    if national == 0 {
        return;
    }
    let index = (national - 1) as usize;
    if let Some(byte) = bits.get_mut(index / 8) {
        *byte |= 1 << (index % 8);
    }
}
