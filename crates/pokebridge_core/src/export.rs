//! Read-only projection of every open save, in a stable order.

use serde::{Deserialize, Serialize};

use crate::bridge::StorageBridge;
use crate::core_api::{Location, Session, StorageSlot};
use crate::creature::CreatureRecord;
use crate::gen3::save::PlayTime;
use crate::gen3::variant::Title;
use crate::gender::Gender;
use crate::species;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainerExport {
    pub title: Title,
    pub name: String,
    pub gender: Gender,
    pub public_id: u16,
    pub secret_id: u16,
    pub play_time: PlayTime,
    pub money: u32,
    pub badges: u8,
    pub champion: bool,
    pub national_dex: bool,
    pub dex_owned: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub slot: StorageSlot,
    pub species: u16,
    pub species_name: String,
    pub nickname: String,
    pub level: Option<u8>,
    pub pid: u32,
    pub otid: u32,
    pub ot_name: String,
    pub is_egg: bool,
    pub held_item: u16,
    pub experience: u32,
    pub moves: [u16; 4],
    pub ivs: [u8; 6],
    pub evs: [u8; 6],
    pub checksum_valid: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Export {
    pub trainers: Vec<TrainerExport>,
    pub creatures: Vec<ExportRecord>,
}

impl ExportRecord {
    pub fn new(slot: StorageSlot, record: &CreatureRecord) -> Self {
        let summary = record.summary();
        Self {
            slot,
            species: summary.species,
            species_name: species::display_name(summary.species),
            nickname: summary.nickname,
            level: summary.party.map(|stats| stats.level),
            pid: summary.pid,
            otid: summary.otid,
            ot_name: summary.ot_name,
            is_egg: summary.is_egg,
            held_item: summary.held_item,
            experience: summary.experience,
            moves: summary.moves,
            ivs: summary.ivs,
            evs: summary.evs,
            checksum_valid: summary.checksum_valid,
        }
    }
}

pub fn trainer(session: &Session) -> TrainerExport {
    let snapshot = session.snapshot();
    TrainerExport {
        title: session.title(),
        name: snapshot.trainer_name.clone(),
        gender: snapshot.gender,
        public_id: snapshot.public_id,
        secret_id: snapshot.secret_id,
        play_time: snapshot.play_time,
        money: snapshot.money,
        badges: snapshot.badges.iter().filter(|&&b| b).count() as u8,
        champion: snapshot.champion,
        national_dex: snapshot.national_dex,
        dex_owned: snapshot.dex_owned,
    }
}

/// Party first, then boxes in box/slot order.
pub fn session_records(session: &Session) -> Vec<ExportRecord> {
    let title = session.title();
    let party = session.party().iter().enumerate().map(|(index, record)| {
        ExportRecord::new(StorageSlot::new(title, Location::Party(index as u8)), record)
    });
    let boxed = session
        .boxes()
        .iter()
        .enumerate()
        .flat_map(|(box_index, pc_box)| {
            pc_box
                .slots
                .iter()
                .enumerate()
                .filter_map(move |(slot, record)| {
                    record.as_ref().map(|record| {
                        let location = Location::Box {
                            box_index: box_index as u8,
                            slot: slot as u8,
                        };
                        ExportRecord::new(StorageSlot::new(title, location), record)
                    })
                })
        });
    party.chain(boxed).collect()
}

/// Every record across the open saves, ordered by title, then party, then box.
pub fn records(bridge: &StorageBridge) -> Vec<ExportRecord> {
    bridge
        .sessions()
        .flat_map(|(_, session)| session_records(session))
        .collect()
}

pub fn collect(bridge: &StorageBridge) -> Export {
    Export {
        trainers: bridge.sessions().map(|(_, session)| trainer(session)).collect(),
        creatures: records(bridge),
    }
}

pub fn from_session(session: &Session) -> Export {
    Export {
        trainers: vec![trainer(session)],
        creatures: session_records(session),
    }
}
