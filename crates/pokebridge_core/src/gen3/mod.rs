pub mod save;
pub mod sections;
pub mod types;
pub mod variant;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::creature::{BOX_RECORD_SIZE, CreatureRecord, PARTY_RECORD_SIZE};
use crate::error::SaveError;
use crate::layout::{FileLayout, SlotId, SlotLayout};
use crate::reader::put_u32;
use save::{EventFlags, PcBox, Pokedex, SaveGame, TrainerRecord};
use sections::{
    Footer, SAVE_BLOCK1_SECTIONS, STORAGE_SECTIONS, SectionBlob, capture_blobs, newer_counter,
    region_read, region_write, scan_slot, verify_checksums, write_section,
};
use types::{BOX_CAPACITY, BOX_COUNT, PARTY_CAPACITY, SAVE_SIZE, SECTION_COUNT, SECTION_SIZE};
use variant::FormatVariant;

/// Which slot wins when both carry the same save counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotTieBreak {
    #[default]
    PreferSlotA,
    PreferSlotB,
}

impl SlotTieBreak {
    fn slot(self) -> SlotId {
        match self {
            Self::PreferSlotA => SlotId::A,
            Self::PreferSlotB => SlotId::B,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    pub tie_break: SlotTieBreak,
    /// Expected layout. Decoding fails when detection disagrees.
    pub variant: Option<FormatVariant>,
}

#[derive(Debug, Clone)]
pub struct Document {
    pub save: SaveGame,
    layout: FileLayout,
    section_blobs: Vec<SectionBlob>,
    original_section_blobs: Vec<SectionBlob>,
    original: Vec<u8>,
}

impl Document {
    pub fn decode(bytes: &[u8], options: DecodeOptions) -> Result<Self, SaveError> {
        if bytes.len() != SAVE_SIZE {
            return Err(SaveError::UnknownFormatVersion(format!(
                "save image is {} bytes, expected {SAVE_SIZE}",
                bytes.len()
            )));
        }

        let slot_a = scan_slot(bytes, SlotId::A)?;
        let slot_b = scan_slot(bytes, SlotId::B)?;
        let current = select_current(slot_a.as_ref(), slot_b.as_ref(), options.tie_break)?;

        let mut current_blobs = None;
        for layout in [&slot_a, &slot_b].into_iter().flatten() {
            let blobs = capture_blobs(bytes, layout)?;
            verify_checksums(layout, &blobs)?;
            if layout.slot == current {
                current_blobs = Some(blobs);
            }
        }
        let section_blobs = current_blobs.ok_or_else(|| {
            SaveError::UnknownFormatVersion(format!("slot {current} could not be captured"))
        })?;

        let layout = FileLayout {
            file_len: bytes.len(),
            current,
            slot_a,
            slot_b,
        };
        layout.validate()?;

        let detected = FormatVariant::detect(section_blobs[0].payload());
        if let Some(expected) = options.variant
            && expected != detected
        {
            return Err(SaveError::UnknownFormatVersion(format!(
                "save looks like {detected}, expected {expected}"
            )));
        }
        debug!("decoded slot {current} as {detected}");

        let save = parse_save(detected, &section_blobs)?;
        Ok(Self {
            save,
            layout,
            original_section_blobs: section_blobs.clone(),
            section_blobs,
            original: bytes.to_vec(),
        })
    }

    pub fn layout(&self) -> &FileLayout {
        &self.layout
    }

    pub fn variant(&self) -> FormatVariant {
        self.save.variant
    }

    pub fn trainer(&self) -> &TrainerRecord {
        &self.save.trainer
    }

    pub fn party(&self) -> &[CreatureRecord] {
        &self.save.party
    }

    pub fn boxes(&self) -> &[PcBox] {
        &self.save.boxes
    }

    pub fn flags(&self) -> &EventFlags {
        &self.save.flags
    }

    pub fn dex(&self) -> &Pokedex {
        &self.save.dex
    }

    pub fn dex_owned(&self) -> Vec<u16> {
        self.save.dex.owned_numbers()
    }

    pub fn is_modified(&self) -> bool {
        self.section_blobs != self.original_section_blobs
    }

    pub fn original_bytes(&self) -> &[u8] {
        &self.original
    }

    /// Serialize the document. An unmodified document returns the decoded
    /// bytes verbatim; otherwise the backup slot is overwritten and becomes
    /// the current one.
    pub fn encode(&self) -> Result<Vec<u8>, SaveError> {
        if !self.is_modified() {
            return Ok(self.original.clone());
        }

        let current = self.layout.current_slot()?;
        let target = current.slot.other();
        let counter = current.counter.wrapping_add(1);
        let rotation = (current.rotation + 1) % SECTION_COUNT;

        let mut out = self.original.clone();
        for blob in &self.section_blobs {
            let physical = (blob.id() as usize + rotation) % SECTION_COUNT;
            let start = target.base_offset() + physical * SECTION_SIZE;
            write_section(&mut out, start, blob, counter);
        }
        debug!("encoded into slot {target} with counter {counter}");
        Ok(out)
    }

    /// Write a party record at `index`. `index == party.len()` appends.
    pub fn set_party_record(
        &mut self,
        index: usize,
        record: &CreatureRecord,
    ) -> Result<(), SaveError> {
        let count = self.save.party.len();
        if index > count || index >= PARTY_CAPACITY {
            return Err(if count == PARTY_CAPACITY {
                SaveError::Full("party".to_string())
            } else {
                SaveError::InvalidLocation(format!(
                    "party index {index} with {count} members"
                ))
            });
        }
        if !record.is_party() {
            return Err(SaveError::MalformedBlock {
                expected: PARTY_RECORD_SIZE,
                actual: record.as_bytes().len(),
            });
        }

        let offsets = *self.save.variant.offsets();
        self.edit_region(SAVE_BLOCK1_SECTIONS, |block| {
            let start = offsets.party + index * PARTY_RECORD_SIZE;
            block[start..start + PARTY_RECORD_SIZE].copy_from_slice(record.as_bytes());
            if index == count {
                put_u32(block, offsets.party_count, (count + 1) as u32);
            }
            Ok(())
        })
    }

    /// Remove a party member, shifting later members up.
    pub fn remove_party_record(&mut self, index: usize) -> Result<(), SaveError> {
        let count = self.save.party.len();
        if index >= count {
            return Err(SaveError::InvalidLocation(format!(
                "party index {index} with {count} members"
            )));
        }

        let offsets = *self.save.variant.offsets();
        self.edit_region(SAVE_BLOCK1_SECTIONS, |block| {
            let party = &mut block[offsets.party..offsets.party + PARTY_CAPACITY * PARTY_RECORD_SIZE];
            let removed = index * PARTY_RECORD_SIZE;
            party.copy_within(removed + PARTY_RECORD_SIZE..count * PARTY_RECORD_SIZE, removed);
            party[(count - 1) * PARTY_RECORD_SIZE..count * PARTY_RECORD_SIZE].fill(0);
            put_u32(block, offsets.party_count, (count - 1) as u32);
            Ok(())
        })
    }

    /// Write the box form of `record` into a PC slot, replacing any occupant.
    pub fn set_box_record(
        &mut self,
        box_index: usize,
        slot: usize,
        record: &CreatureRecord,
    ) -> Result<(), SaveError> {
        check_box_location(box_index, slot)?;
        self.edit_region(STORAGE_SECTIONS, |storage| {
            let start = save::box_record_offset(box_index, slot);
            storage[start..start + BOX_RECORD_SIZE].copy_from_slice(record.box_bytes());
            Ok(())
        })
    }

    pub fn clear_box_record(&mut self, box_index: usize, slot: usize) -> Result<(), SaveError> {
        check_box_location(box_index, slot)?;
        self.edit_region(STORAGE_SECTIONS, |storage| {
            let start = save::box_record_offset(box_index, slot);
            storage[start..start + BOX_RECORD_SIZE].fill(0);
            Ok(())
        })
    }

    fn edit_region<F>(
        &mut self,
        ids: std::ops::RangeInclusive<u16>,
        edit: F,
    ) -> Result<(), SaveError>
    where
        F: FnOnce(&mut [u8]) -> Result<(), SaveError>,
    {
        let mut region = region_read(&self.section_blobs, ids.clone());
        edit(&mut region)?;
        let mut blobs = self.section_blobs.clone();
        region_write(&mut blobs, ids, &region)?;
        let save = parse_save(self.save.variant, &blobs)?;
        self.section_blobs = blobs;
        self.save = save;
        Ok(())
    }
}

fn check_box_location(box_index: usize, slot: usize) -> Result<(), SaveError> {
    if box_index >= BOX_COUNT || slot >= BOX_CAPACITY {
        return Err(SaveError::InvalidLocation(format!(
            "box {box_index} slot {slot}, expected box < {BOX_COUNT} and slot < {BOX_CAPACITY}"
        )));
    }
    Ok(())
}

fn select_current(
    slot_a: Option<&SlotLayout>,
    slot_b: Option<&SlotLayout>,
    tie_break: SlotTieBreak,
) -> Result<SlotId, SaveError> {
    let current = match (slot_a, slot_b) {
        (None, None) => {
            return Err(SaveError::UnknownFormatVersion(
                "blank or uninitialized save".to_string(),
            ));
        }
        (Some(_), None) => {
            warn!("backup slot B is blank");
            SlotId::A
        }
        (None, Some(_)) => {
            warn!("backup slot A is blank");
            SlotId::B
        }
        (Some(a), Some(b)) => match newer_counter(a.counter, b.counter) {
            Some(slot) => slot,
            None => {
                debug!(
                    "slots A and B share counter {}, using {:?}",
                    a.counter, tie_break
                );
                tie_break.slot()
            }
        },
    };
    debug!("current slot is {current}");
    Ok(current)
}

fn parse_save(variant: FormatVariant, blobs: &[SectionBlob]) -> Result<SaveGame, SaveError> {
    let trainer = blobs
        .first()
        .map(SectionBlob::payload)
        .ok_or_else(|| SaveError::UnknownFormatVersion("missing trainer section".to_string()))?;
    let save_block1 = region_read(blobs, SAVE_BLOCK1_SECTIONS);
    let storage = region_read(blobs, STORAGE_SECTIONS);

    let (current_box, boxes) = save::parse_storage(&storage)?;
    Ok(SaveGame {
        variant,
        trainer: save::parse_trainer(variant, trainer, &save_block1)?,
        party: save::parse_party(variant, &save_block1)?,
        current_box,
        boxes,
        flags: save::parse_flags(variant, &save_block1),
        dex: save::parse_dex(variant, trainer),
    })
}

/// True when neither slot carries a complete, signed set of sections.
pub fn is_blank(bytes: &[u8]) -> bool {
    if bytes.len() != SAVE_SIZE {
        return false;
    }
    SlotId::ALL
        .iter()
        .all(|&slot| matches!(scan_slot(bytes, slot), Ok(None)))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionCheck {
    pub id: u16,
    pub physical_index: usize,
    pub stored: u16,
    pub computed: u16,
}

impl SectionCheck {
    pub fn is_valid(&self) -> bool {
        self.stored == self.computed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotReport {
    pub slot: SlotId,
    pub present: bool,
    pub counter: Option<u32>,
    pub sections: Vec<SectionCheck>,
    pub missing: Vec<u16>,
}

/// Non-failing diagnostics over a raw image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub file_len: usize,
    pub slots: Vec<SlotReport>,
    pub current: Option<SlotId>,
    pub variant: Option<FormatVariant>,
}

impl ValidationReport {
    pub fn is_blank(&self) -> bool {
        self.slots.iter().all(|slot| !slot.present)
    }

    pub fn is_valid(&self) -> bool {
        self.current.is_some()
            && self
                .slots
                .iter()
                .filter(|slot| slot.present)
                .all(|slot| slot.sections.iter().all(SectionCheck::is_valid))
    }
}

pub fn validate(bytes: &[u8], tie_break: SlotTieBreak) -> ValidationReport {
    let mut report = ValidationReport {
        file_len: bytes.len(),
        slots: Vec::new(),
        current: None,
        variant: None,
    };
    if bytes.len() != SAVE_SIZE {
        return report;
    }

    for slot in SlotId::ALL {
        let layout = scan_slot(bytes, slot).ok().flatten();
        let mut seen = [false; SECTION_COUNT];
        let mut sections = Vec::new();
        for physical_index in 0..SECTION_COUNT {
            let start = slot.base_offset() + physical_index * SECTION_SIZE;
            let raw = &bytes[start..start + SECTION_SIZE];
            let Ok(footer) = Footer::parse(raw) else {
                continue;
            };
            if !footer.is_signed() {
                continue;
            }
            seen[footer.id as usize] = true;
            let blob = SectionBlob {
                bytes: raw.to_vec(),
            };
            sections.push(SectionCheck {
                id: footer.id,
                physical_index,
                stored: footer.checksum,
                computed: blob.computed_checksum(),
            });
        }
        report.slots.push(SlotReport {
            slot,
            present: layout.is_some(),
            counter: layout.as_ref().map(|layout| layout.counter),
            sections,
            missing: (0..SECTION_COUNT as u16)
                .filter(|&id| !seen[id as usize])
                .collect(),
        });
    }

    let slot_a = scan_slot(bytes, SlotId::A).ok().flatten();
    let slot_b = scan_slot(bytes, SlotId::B).ok().flatten();
    if let Ok(current) = select_current(slot_a.as_ref(), slot_b.as_ref(), tie_break) {
        report.current = Some(current);
        let layout = match current {
            SlotId::A => slot_a.as_ref(),
            SlotId::B => slot_b.as_ref(),
        };
        report.variant = layout
            .and_then(|layout| capture_blobs(bytes, layout).ok())
            .map(|blobs| FormatVariant::detect(blobs[0].payload()));
    }
    report
}
