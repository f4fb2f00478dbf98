pub mod codec;
pub mod substructures;

use serde::{Deserialize, Serialize};

use crate::error::SaveError;
use crate::reader::{put_u16, put_u32, u16_at, u32_at};
use crate::text;
use codec::{ENCRYPTED_LEN, SUBSTRUCTURE_COUNT, Substructure, SubstructureKind};
use substructures::{Attacks, Condition, Growth, Misc};

pub const BOX_RECORD_SIZE: usize = 80;
pub const PARTY_RECORD_SIZE: usize = 100;
pub const NICKNAME_LEN: usize = 10;
pub const OT_NAME_LEN: usize = 7;

const PID_OFFSET: usize = 0x00;
const OTID_OFFSET: usize = 0x04;
const NICKNAME_OFFSET: usize = 0x08;
const LANGUAGE_OFFSET: usize = 0x12;
const FLAGS_OFFSET: usize = 0x13;
const OT_NAME_OFFSET: usize = 0x14;
const MARKINGS_OFFSET: usize = 0x1B;
const CHECKSUM_OFFSET: usize = 0x1C;
const DATA_OFFSET: usize = 0x20;

const STATUS_OFFSET: usize = 0x50;
const LEVEL_OFFSET: usize = 0x54;
const MAIL_OFFSET: usize = 0x55;
const HP_OFFSET: usize = 0x56;
const STATS_OFFSET: usize = 0x58;

const FLAG_BAD_EGG: u8 = 1 << 0;
const FLAG_HAS_SPECIES: u8 = 1 << 1;
const FLAG_USE_EGG_NAME: u8 = 1 << 2;

pub const LANGUAGE_ENGLISH: u8 = 2;

/// Battle values carried only by party records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyStats {
    pub status: u32,
    pub level: u8,
    pub mail_id: u8,
    pub hp: u16,
    /// Max HP, Attack, Defense, Speed, Sp. Attack, Sp. Defense.
    pub stats: [u16; 6],
}

impl PartyStats {
    fn parse(raw: &[u8]) -> Self {
        let mut stats = [0u16; 6];
        for (i, stat) in stats.iter_mut().enumerate() {
            *stat = u16_at(raw, STATS_OFFSET + i * 2);
        }
        Self {
            status: u32_at(raw, STATUS_OFFSET),
            level: raw[LEVEL_OFFSET],
            mail_id: raw[MAIL_OFFSET],
            hp: u16_at(raw, HP_OFFSET),
            stats,
        }
    }

    fn write(&self, raw: &mut [u8]) {
        put_u32(raw, STATUS_OFFSET, self.status);
        raw[LEVEL_OFFSET] = self.level;
        raw[MAIL_OFFSET] = self.mail_id;
        put_u16(raw, HP_OFFSET, self.hp);
        for (i, stat) in self.stats.iter().enumerate() {
            put_u16(raw, STATS_OFFSET + i * 2, *stat);
        }
    }
}

/// A creature record exactly as stored: 80 bytes in a box, 100 in the party.
///
/// The bytes are the source of truth. Accessors decode on demand and nothing
/// here rewrites the record unless a caller builds a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatureRecord {
    bytes: Vec<u8>,
}

impl CreatureRecord {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SaveError> {
        match bytes.len() {
            BOX_RECORD_SIZE | PARTY_RECORD_SIZE => Ok(Self {
                bytes: bytes.to_vec(),
            }),
            actual => Err(SaveError::MalformedBlock {
                expected: BOX_RECORD_SIZE,
                actual,
            }),
        }
    }

    /// Build a fresh box record. The checksum and species flag are derived
    /// from `substructures`.
    pub fn build(
        pid: u32,
        otid: u32,
        nickname: &str,
        ot_name: &str,
        substructures: &[Substructure; SUBSTRUCTURE_COUNT],
    ) -> Result<Self, SaveError> {
        let mut bytes = vec![0u8; BOX_RECORD_SIZE];
        put_u32(&mut bytes, PID_OFFSET, pid);
        put_u32(&mut bytes, OTID_OFFSET, otid);

        let nickname = text::encode(nickname, NICKNAME_LEN).ok_or_else(|| {
            SaveError::UnencodableText(nickname.to_string())
        })?;
        bytes[NICKNAME_OFFSET..NICKNAME_OFFSET + NICKNAME_LEN].copy_from_slice(&nickname);
        let ot_name = text::encode(ot_name, OT_NAME_LEN).ok_or_else(|| {
            SaveError::UnencodableText(ot_name.to_string())
        })?;
        bytes[OT_NAME_OFFSET..OT_NAME_OFFSET + OT_NAME_LEN].copy_from_slice(&ot_name);

        bytes[LANGUAGE_OFFSET] = LANGUAGE_ENGLISH;
        let species = Growth::parse(&substructures[SubstructureKind::Growth.index()]).species;
        let mut flags = 0u8;
        if species != 0 {
            flags |= FLAG_HAS_SPECIES;
        }
        if Misc::parse(&substructures[SubstructureKind::Misc.index()]).is_egg() {
            flags |= FLAG_USE_EGG_NAME;
        }
        bytes[FLAGS_OFFSET] = flags;

        put_u16(&mut bytes, CHECKSUM_OFFSET, codec::checksum(substructures));
        let encrypted = codec::encrypt(substructures, pid, otid);
        bytes[DATA_OFFSET..DATA_OFFSET + ENCRYPTED_LEN].copy_from_slice(&encrypted);

        Ok(Self { bytes })
    }

    /// Extend a box record with party battle values.
    pub fn with_party_stats(&self, stats: PartyStats) -> Self {
        let mut bytes = self.box_bytes().to_vec();
        bytes.resize(PARTY_RECORD_SIZE, 0);
        stats.write(&mut bytes);
        Self { bytes }
    }

    /// The box form of this record: the first 80 bytes, verbatim.
    pub fn to_box_record(&self) -> Self {
        Self {
            bytes: self.box_bytes().to_vec(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn box_bytes(&self) -> &[u8] {
        &self.bytes[..BOX_RECORD_SIZE]
    }

    pub fn is_party(&self) -> bool {
        self.bytes.len() == PARTY_RECORD_SIZE
    }

    pub fn pid(&self) -> u32 {
        u32_at(&self.bytes, PID_OFFSET)
    }

    pub fn otid(&self) -> u32 {
        u32_at(&self.bytes, OTID_OFFSET)
    }

    pub fn nickname(&self) -> String {
        text::decode(&self.bytes[NICKNAME_OFFSET..NICKNAME_OFFSET + NICKNAME_LEN])
    }

    pub fn ot_name(&self) -> String {
        text::decode(&self.bytes[OT_NAME_OFFSET..OT_NAME_OFFSET + OT_NAME_LEN])
    }

    pub fn language(&self) -> u8 {
        self.bytes[LANGUAGE_OFFSET]
    }

    pub fn markings(&self) -> u8 {
        self.bytes[MARKINGS_OFFSET]
    }

    pub fn is_bad_egg(&self) -> bool {
        self.bytes[FLAGS_OFFSET] & FLAG_BAD_EGG != 0
    }

    pub fn stored_checksum(&self) -> u16 {
        u16_at(&self.bytes, CHECKSUM_OFFSET)
    }

    fn encrypted(&self) -> &[u8; ENCRYPTED_LEN] {
        self.bytes[DATA_OFFSET..DATA_OFFSET + ENCRYPTED_LEN]
            .try_into()
            .unwrap_or(&[0u8; ENCRYPTED_LEN])
    }

    pub fn substructures(&self) -> [Substructure; SUBSTRUCTURE_COUNT] {
        codec::decrypt_block(self.encrypted(), self.pid(), self.otid())
    }

    pub fn growth(&self) -> Growth {
        Growth::parse(&self.substructures()[SubstructureKind::Growth.index()])
    }

    pub fn attacks(&self) -> Attacks {
        Attacks::parse(&self.substructures()[SubstructureKind::Attacks.index()])
    }

    pub fn condition(&self) -> Condition {
        Condition::parse(&self.substructures()[SubstructureKind::Condition.index()])
    }

    pub fn misc(&self) -> Misc {
        Misc::parse(&self.substructures()[SubstructureKind::Misc.index()])
    }

    pub fn species(&self) -> u16 {
        self.growth().species
    }

    /// Empty slots are zero-filled, which decrypts to species 0.
    pub fn is_empty(&self) -> bool {
        self.species() == 0
    }

    pub fn is_egg(&self) -> bool {
        self.misc().is_egg()
    }

    /// Diagnostic only: a mismatch marks a bad egg in game, but the record is
    /// still moved verbatim.
    pub fn checksum_valid(&self) -> bool {
        codec::checksum(&self.substructures()) == self.stored_checksum()
    }

    pub fn party_stats(&self) -> Option<PartyStats> {
        self.is_party().then(|| PartyStats::parse(&self.bytes))
    }

    pub fn summary(&self) -> CreatureSummary {
        let subs = self.substructures();
        let growth = Growth::parse(&subs[SubstructureKind::Growth.index()]);
        let attacks = Attacks::parse(&subs[SubstructureKind::Attacks.index()]);
        let condition = Condition::parse(&subs[SubstructureKind::Condition.index()]);
        let misc = Misc::parse(&subs[SubstructureKind::Misc.index()]);

        CreatureSummary {
            pid: self.pid(),
            otid: self.otid(),
            nickname: self.nickname(),
            ot_name: self.ot_name(),
            species: growth.species,
            held_item: growth.held_item,
            experience: growth.experience,
            friendship: growth.friendship,
            moves: attacks.moves,
            pp: attacks.pp,
            evs: condition.evs,
            ivs: misc.ivs(),
            is_egg: misc.is_egg(),
            ability_slot: misc.ability_slot(),
            met_level: misc.met_level(),
            origin_game: misc.origin_game(),
            ball: misc.ball(),
            checksum_valid: codec::checksum(&subs) == self.stored_checksum(),
            party: self.party_stats(),
        }
    }
}

/// Decoded, read-only view of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureSummary {
    pub pid: u32,
    pub otid: u32,
    pub nickname: String,
    pub ot_name: String,
    pub species: u16,
    pub held_item: u16,
    pub experience: u32,
    pub friendship: u8,
    pub moves: [u16; 4],
    pub pp: [u8; 4],
    pub evs: [u8; 6],
    pub ivs: [u8; 6],
    pub is_egg: bool,
    pub ability_slot: u8,
    pub met_level: u8,
    pub origin_game: u8,
    pub ball: u8,
    pub checksum_valid: bool,
    pub party: Option<PartyStats>,
}
