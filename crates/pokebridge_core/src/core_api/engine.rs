use crate::creature::CreatureRecord;
use crate::gen3::save::{PcBox, Pokedex, TrainerRecord};
use crate::gen3::variant::{FormatVariant, Title};
use crate::gen3::{DecodeOptions, Document, SlotTieBreak};

use super::error::{CoreError, CoreErrorCode};
use super::types::{Capabilities, CapabilityIssue, Location, Snapshot};

#[derive(Debug, Default, Clone, Copy)]
pub struct Engine {
    tie_break: SlotTieBreak,
}

#[derive(Debug, Clone)]
pub struct Session {
    title: Title,
    snapshot: Snapshot,
    capabilities: Capabilities,
    document: Box<Document>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tie_break(tie_break: SlotTieBreak) -> Self {
        Self { tie_break }
    }

    pub fn tie_break(&self) -> SlotTieBreak {
        self.tie_break
    }

    /// Decode a save image. The image only identifies its layout, so a
    /// `hint` is required unless the layout belongs to a single title.
    pub fn open_bytes<B: AsRef<[u8]>>(
        &self,
        bytes: B,
        hint: Option<Title>,
    ) -> Result<Session, CoreError> {
        let bytes = bytes.as_ref();
        let options = DecodeOptions {
            tie_break: self.tie_break,
            variant: hint.map(Title::variant),
        };
        let document = Document::decode(bytes, options)?;

        let title = match hint {
            Some(title) => title,
            None => match document.variant().titles() {
                [title] => *title,
                titles => {
                    return Err(CoreError::new(
                        CoreErrorCode::GameDetectionAmbiguous,
                        format!(
                            "{} layout is shared by {}; supply a title",
                            document.variant(),
                            titles
                                .iter()
                                .map(|t| t.as_str())
                                .collect::<Vec<_>>()
                                .join(" and ")
                        ),
                    ));
                }
            },
        };

        Ok(Session::new(title, document))
    }
}

impl Session {
    fn new(title: Title, document: Document) -> Self {
        Self {
            title,
            snapshot: build_snapshot(title, &document),
            capabilities: build_capabilities(&document),
            document: Box::new(document),
        }
    }

    pub fn title(&self) -> Title {
        self.title
    }

    pub fn variant(&self) -> FormatVariant {
        self.document.variant()
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn trainer(&self) -> &TrainerRecord {
        self.document.trainer()
    }

    pub fn party(&self) -> &[CreatureRecord] {
        self.document.party()
    }

    pub fn boxes(&self) -> &[PcBox] {
        self.document.boxes()
    }

    pub fn dex(&self) -> &Pokedex {
        self.document.dex()
    }

    pub fn national_dex(&self) -> bool {
        self.document.dex().national_enabled
    }

    /// The record at `location`, or `None` for an empty or out-of-range slot.
    pub fn record_at(&self, location: Location) -> Option<&CreatureRecord> {
        match location {
            Location::Party(index) => self.party().get(index as usize),
            Location::Box { box_index, slot } => self
                .boxes()
                .get(box_index as usize)
                .and_then(|pc_box| pc_box.slots.get(slot as usize))
                .and_then(Option::as_ref),
        }
    }

    pub fn is_modified(&self) -> bool {
        self.document.is_modified()
    }

    pub fn to_bytes_unmodified(&self) -> Vec<u8> {
        self.document.original_bytes().to_vec()
    }

    pub fn to_bytes_modified(&self) -> Result<Vec<u8>, CoreError> {
        Ok(self.document.encode()?)
    }

    pub(crate) fn replace_document(&mut self, document: Document) {
        *self = Self::new(self.title, document);
    }
}

fn build_snapshot(title: Title, document: &Document) -> Snapshot {
    let save = &document.save;
    let layout = document.layout();
    let (current_slot, save_counter) = match layout.current_slot() {
        Ok(slot) => (slot.slot, slot.counter),
        Err(_) => (layout.current, 0),
    };
    let dex = &save.dex;

    Snapshot {
        title,
        variant: save.variant,
        trainer_name: save.trainer.name.clone(),
        gender: save.trainer.gender,
        public_id: save.trainer.public_id,
        secret_id: save.trainer.secret_id,
        play_time: save.trainer.play_time,
        money: save.trainer.money,
        party_count: save.party.len(),
        boxed_count: save.boxes.iter().map(PcBox::occupied).sum(),
        current_box: save.current_box,
        badges: save.badges(),
        champion: save.is_champion(),
        national_dex: dex.national_enabled,
        dex_owned: count_bits(&dex.owned),
        dex_seen: count_bits(&dex.seen),
        current_slot,
        save_counter,
    }
}

fn build_capabilities(document: &Document) -> Capabilities {
    let mut issues = Vec::new();
    if document.layout().backup_slot().is_none() {
        issues.push(CapabilityIssue::BackupSlotBlank);
    }

    let records = document
        .party()
        .iter()
        .chain(document.boxes().iter().flat_map(|b| b.slots.iter().flatten()));
    let mut bad_egg = false;
    let mut checksum_mismatch = false;
    for record in records {
        bad_egg |= record.is_bad_egg();
        checksum_mismatch |= !record.checksum_valid();
    }
    if bad_egg {
        issues.push(CapabilityIssue::BadEggPresent);
    }
    if checksum_mismatch {
        issues.push(CapabilityIssue::RecordChecksumMismatch);
    }

    Capabilities::editable(issues)
}

fn count_bits(bits: &[u8]) -> usize {
    bits.iter().map(|byte| byte.count_ones() as usize).sum()
}
