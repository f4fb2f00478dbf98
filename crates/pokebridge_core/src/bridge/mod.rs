//! The storage bridge: up to five open saves, one per title, and the
//! operations that move records between them.

mod lock;
mod write;

pub use lock::SaveLock;
pub use write::write_atomic;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::core_api::{
    Container, CoreError, CoreErrorCode, Engine, Location, Session, StorageSlot, TransferOutcome,
};
use crate::creature::CreatureRecord;
use crate::error::SaveError;
use crate::gen3::Document;
use crate::gen3::types::{BOX_CAPACITY, PARTY_CAPACITY};
use crate::gen3::variant::{TITLE_COUNT, Title};
use crate::species;

/// Identifies one `open` of a title. Closing and reopening the title
/// invalidates earlier handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SaveHandle {
    pub title: Title,
    generation: u64,
}

impl fmt::Display for SaveHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.title, self.generation)
    }
}

#[derive(Debug)]
enum Origin {
    Memory,
    File {
        path: PathBuf,
        lock: SaveLock,
        /// Bytes last read from or written to `path`.
        baseline: Vec<u8>,
    },
}

#[derive(Debug)]
struct OpenSave {
    generation: u64,
    session: Session,
    origin: Origin,
}

#[derive(Debug, Default)]
pub struct StorageBridge {
    engine: Engine,
    saves: [Option<OpenSave>; TITLE_COUNT],
    next_generation: u64,
}

impl StorageBridge {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            saves: Default::default(),
            next_generation: 0,
        }
    }

    /// Lock, read, and decode the save at `path`.
    pub fn open(&mut self, path: impl AsRef<Path>, title: Title) -> Result<SaveHandle, CoreError> {
        let path = path.as_ref();
        self.ensure_closed(title)?;

        let lock = SaveLock::acquire(path)?;
        let bytes = fs::read(path)?;
        let session = self.engine.open_bytes(&bytes, Some(title))?;
        info!("opened {title} from {}", path.display());

        Ok(self.insert(
            title,
            session,
            Origin::File {
                path: path.to_path_buf(),
                lock,
                baseline: bytes,
            },
        ))
    }

    /// Decode an in-memory image. Commit returns the bytes without writing.
    pub fn open_bytes(&mut self, bytes: &[u8], title: Title) -> Result<SaveHandle, CoreError> {
        self.ensure_closed(title)?;
        let session = self.engine.open_bytes(bytes, Some(title))?;
        debug!("opened {title} from memory");
        Ok(self.insert(title, session, Origin::Memory))
    }

    /// Encode the handle's document, write it back atomically when it came
    /// from a file, and adopt the written bytes as the new baseline.
    pub fn commit(&mut self, handle: SaveHandle) -> Result<Vec<u8>, CoreError> {
        let bytes = self.prepare_commit(handle)?;
        self.finish_commit(handle, &bytes)?;
        Ok(bytes)
    }

    /// Commit several saves as one step. Every lock and on-disk baseline is
    /// checked and every document encoded before the first write, then the
    /// files are written in the order given. Pass the save receiving records
    /// first: a failure between writes then leaves a duplicate, not a loss.
    pub fn commit_all(&mut self, handles: &[SaveHandle]) -> Result<Vec<Vec<u8>>, CoreError> {
        let mut prepared: Vec<(SaveHandle, Vec<u8>)> = Vec::with_capacity(handles.len());
        for &handle in handles {
            if prepared.iter().any(|(seen, _)| *seen == handle) {
                continue;
            }
            prepared.push((handle, self.prepare_commit(handle)?));
        }
        for (handle, bytes) in &prepared {
            self.finish_commit(*handle, bytes)?;
        }
        Ok(prepared.into_iter().map(|(_, bytes)| bytes).collect())
    }

    fn prepare_commit(&self, handle: SaveHandle) -> Result<Vec<u8>, CoreError> {
        let open = self.live(handle)?;
        let bytes = open.session.to_bytes_modified()?;

        if let Origin::File {
            path,
            lock,
            baseline,
        } = &open.origin
        {
            if !lock.verify() {
                return Err(CoreError::new(
                    CoreErrorCode::StaleHandle,
                    format!("lock for {} is no longer held", path.display()),
                ));
            }
            let on_disk = fs::read(path)?;
            if on_disk != *baseline {
                return Err(CoreError::new(
                    CoreErrorCode::StaleHandle,
                    format!("{} changed on disk since it was opened", path.display()),
                ));
            }
        }
        Ok(bytes)
    }

    fn finish_commit(&mut self, handle: SaveHandle, bytes: &[u8]) -> Result<(), CoreError> {
        let engine = self.engine;
        let open = self.live_mut(handle)?;
        if let Origin::File { path, baseline, .. } = &mut open.origin {
            if bytes != baseline.as_slice() {
                write_atomic(path.as_path(), bytes)?;
            }
            *baseline = bytes.to_vec();
            info!("committed {} to {}", handle.title, path.display());
        }

        open.session = engine.open_bytes(bytes, Some(handle.title))?;
        Ok(())
    }

    /// Release the handle. Uncommitted changes are dropped.
    pub fn close(&mut self, handle: SaveHandle) -> Result<(), CoreError> {
        self.live(handle)?;
        let open = self.saves[handle.title.index()].take();
        if let Some(OpenSave {
            origin: Origin::File { lock, .. },
            ..
        }) = open
        {
            lock.release()?;
        }
        debug!("closed {}", handle.title);
        Ok(())
    }

    pub fn handle(&self, title: Title) -> Option<SaveHandle> {
        self.saves[title.index()].as_ref().map(|open| SaveHandle {
            title,
            generation: open.generation,
        })
    }

    pub fn session(&self, title: Title) -> Option<&Session> {
        self.saves[title.index()].as_ref().map(|open| &open.session)
    }

    /// Open sessions in title order.
    pub fn sessions(&self) -> impl Iterator<Item = (Title, &Session)> {
        Title::ALL
            .into_iter()
            .filter_map(|title| self.session(title).map(|session| (title, session)))
    }

    pub fn creature_count(&self) -> usize {
        self.sessions()
            .map(|(_, session)| session.document().save.creature_count())
            .sum()
    }

    /// First free location in `container`. Party locations are compact, so
    /// the party answer is always the next index past the last member.
    pub fn first_empty(&self, title: Title, container: Container) -> Option<Location> {
        let session = self.session(title)?;
        match container {
            Container::Party => {
                let len = session.party().len();
                (len < PARTY_CAPACITY).then_some(Location::Party(len as u8))
            }
            Container::Box(box_index) => {
                let pc_box = session.boxes().get(box_index as usize)?;
                pc_box
                    .slots
                    .iter()
                    .position(Option::is_none)
                    .map(|slot| Location::Box {
                        box_index,
                        slot: slot as u8,
                    })
            }
        }
    }

    /// Move one record. Every check runs before anything is staged, and the
    /// affected documents are replaced together, so a failed transfer
    /// changes nothing.
    pub fn transfer(
        &mut self,
        source: StorageSlot,
        dest_title: Title,
        dest: Location,
    ) -> Result<TransferOutcome, CoreError> {
        let from = source.location.validate().map_err(invalid_slot)?;
        let dest = dest.validate().map_err(invalid_slot)?;
        let src_session = self.live_session(source.title)?;
        let dst_session = self.live_session(dest_title)?;
        let same_save = source.title == dest_title;

        let record = src_session
            .record_at(from)
            .cloned()
            .ok_or_else(|| slot_empty(source))?;
        if !same_save {
            check_compatible(&record, dst_session, dest_title)?;
        }
        let to = resolve_destination(dst_session, dest_title, dest)?;

        if matches!(from, Location::Box { .. }) && matches!(to, Location::Party(_)) {
            return Err(CoreError::new(
                CoreErrorCode::UnsupportedOperation,
                "moving a boxed record into the party needs battle stats it does not carry",
            ));
        }
        if let Location::Party(index) = from
            && !(same_save && matches!(to, Location::Party(_)))
        {
            ensure_party_keeps_member(src_session, index, None)?;
        }

        let outcome = TransferOutcome {
            from: source,
            to: StorageSlot::new(dest_title, to),
            species: record.species(),
            pid: record.pid(),
        };

        if same_save {
            let mut doc = src_session.document().clone();
            let to = match to {
                // Compaction shifts the appended index down by one.
                Location::Party(_) => {
                    take(&mut doc, from)?;
                    place(&mut doc, to, &record)?
                }
                Location::Box { .. } => {
                    let placed = place(&mut doc, to, &record)?;
                    take(&mut doc, from)?;
                    placed
                }
            };
            self.commit_staged(&[(source.title, doc)]);
            info!("moved {} within {} to {to}", from, source.title);
            return Ok(TransferOutcome {
                to: StorageSlot::new(dest_title, to),
                ..outcome
            });
        }

        let mut src_doc = src_session.document().clone();
        let mut dst_doc = dst_session.document().clone();
        let record = match to {
            Location::Party(_) => record,
            Location::Box { .. } => record.to_box_record(),
        };
        place(&mut dst_doc, to, &record)?;
        take(&mut src_doc, from)?;
        self.commit_staged(&[(source.title, src_doc), (dest_title, dst_doc)]);

        info!("transferred {} to {}", outcome.from, outcome.to);
        Ok(outcome)
    }

    /// Exchange two occupied slots of the same container kind.
    pub fn swap(&mut self, a: StorageSlot, b: StorageSlot) -> Result<(), CoreError> {
        let loc_a = a.location.validate().map_err(invalid_slot)?;
        let loc_b = b.location.validate().map_err(invalid_slot)?;
        let session_a = self.live_session(a.title)?;
        let session_b = self.live_session(b.title)?;

        let record_a = session_a
            .record_at(loc_a)
            .cloned()
            .ok_or_else(|| slot_empty(a))?;
        let record_b = session_b
            .record_at(loc_b)
            .cloned()
            .ok_or_else(|| slot_empty(b))?;
        if a == b {
            return Ok(());
        }

        let party_a = matches!(loc_a, Location::Party(_));
        let party_b = matches!(loc_b, Location::Party(_));
        if party_a != party_b {
            return Err(CoreError::new(
                CoreErrorCode::UnsupportedOperation,
                "cannot swap a party member with a boxed record",
            ));
        }

        if a.title != b.title {
            check_compatible(&record_a, session_b, b.title)?;
            check_compatible(&record_b, session_a, a.title)?;
            if let (Location::Party(index_a), Location::Party(index_b)) = (loc_a, loc_b) {
                ensure_party_keeps_member(session_a, index_a, Some(&record_b))?;
                ensure_party_keeps_member(session_b, index_b, Some(&record_a))?;
            }
        }

        if a.title == b.title {
            let mut doc = session_a.document().clone();
            place_at(&mut doc, loc_a, &record_b)?;
            place_at(&mut doc, loc_b, &record_a)?;
            self.commit_staged(&[(a.title, doc)]);
        } else {
            let mut doc_a = session_a.document().clone();
            let mut doc_b = session_b.document().clone();
            place_at(&mut doc_a, loc_a, &record_b)?;
            place_at(&mut doc_b, loc_b, &record_a)?;
            self.commit_staged(&[(a.title, doc_a), (b.title, doc_b)]);
        }

        info!("swapped {a} with {b}");
        Ok(())
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    pub fn path(&self, title: Title) -> Option<&Path> {
        match &self.saves[title.index()].as_ref()?.origin {
            Origin::File { path, .. } => Some(path),
            Origin::Memory => None,
        }
    }

    fn insert(&mut self, title: Title, session: Session, origin: Origin) -> SaveHandle {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.saves[title.index()] = Some(OpenSave {
            generation,
            session,
            origin,
        });
        SaveHandle { title, generation }
    }

    fn ensure_closed(&self, title: Title) -> Result<(), CoreError> {
        if self.saves[title.index()].is_some() {
            return Err(CoreError::new(
                CoreErrorCode::UnsupportedOperation,
                format!("{title} is already open"),
            ));
        }
        Ok(())
    }

    fn live(&self, handle: SaveHandle) -> Result<&OpenSave, CoreError> {
        match &self.saves[handle.title.index()] {
            Some(open) if open.generation == handle.generation => Ok(open),
            _ => Err(stale(handle.title)),
        }
    }

    fn live_mut(&mut self, handle: SaveHandle) -> Result<&mut OpenSave, CoreError> {
        match &mut self.saves[handle.title.index()] {
            Some(open) if open.generation == handle.generation => Ok(open),
            _ => Err(stale(handle.title)),
        }
    }

    /// The session for an open title whose lock, if any, is still held.
    fn live_session(&self, title: Title) -> Result<&Session, CoreError> {
        let open = self.saves[title.index()]
            .as_ref()
            .ok_or_else(|| stale(title))?;
        if let Origin::File { lock, path, .. } = &open.origin
            && !lock.verify()
        {
            return Err(CoreError::new(
                CoreErrorCode::StaleHandle,
                format!("lock for {} is no longer held", path.display()),
            ));
        }
        Ok(&open.session)
    }

    fn commit_staged(&mut self, staged: &[(Title, Document)]) {
        for (title, document) in staged {
            if let Some(open) = self.saves[title.index()].as_mut() {
                open.session.replace_document(document.clone());
            }
        }
    }
}

fn stale(title: Title) -> CoreError {
    CoreError::new(
        CoreErrorCode::StaleHandle,
        format!("{title} is not open under this handle"),
    )
}

fn invalid_slot(message: String) -> CoreError {
    CoreError::new(CoreErrorCode::InvalidSlot, message)
}

fn slot_empty(slot: StorageSlot) -> CoreError {
    CoreError::new(CoreErrorCode::SlotEmpty, format!("{slot} is empty"))
}

fn check_compatible(
    record: &CreatureRecord,
    dest: &Session,
    dest_title: Title,
) -> Result<(), CoreError> {
    if record.is_bad_egg() {
        return Err(CoreError::new(
            CoreErrorCode::IncompatibleSpecies,
            "bad eggs cannot be transferred",
        ));
    }
    let species = record.species();
    if !species::available_in(dest_title, species, dest.national_dex()) {
        return Err(CoreError::new(
            CoreErrorCode::IncompatibleSpecies,
            format!(
                "{} cannot be stored in {dest_title}",
                species::display_name(species)
            ),
        ));
    }
    Ok(())
}

fn resolve_destination(
    dest: &Session,
    dest_title: Title,
    location: Location,
) -> Result<Location, CoreError> {
    match location {
        Location::Party(index) => {
            let len = dest.party().len();
            if len >= PARTY_CAPACITY {
                return Err(CoreError::new(
                    CoreErrorCode::DestinationFull,
                    format!("{dest_title} party is full"),
                ));
            }
            if (index as usize) < len {
                return Err(CoreError::new(
                    CoreErrorCode::SlotOccupied,
                    format!("{dest_title}:{location} is occupied"),
                ));
            }
            Ok(Location::Party(len as u8))
        }
        Location::Box { box_index, slot } => {
            let pc_box = dest.boxes().get(box_index as usize).ok_or_else(|| {
                invalid_slot(format!("{dest_title} has no box {box_index}"))
            })?;
            if pc_box.occupied() >= BOX_CAPACITY {
                return Err(CoreError::new(
                    CoreErrorCode::DestinationFull,
                    format!("{dest_title} box {box_index} is full"),
                ));
            }
            if pc_box.slots.get(slot as usize).is_some_and(Option::is_some) {
                return Err(CoreError::new(
                    CoreErrorCode::SlotOccupied,
                    format!("{dest_title}:{location} is occupied"),
                ));
            }
            Ok(location)
        }
    }
}

/// The party must still hold a non-egg member once `leaving` is gone and
/// `arriving`, if any, has taken its place.
fn ensure_party_keeps_member(
    session: &Session,
    leaving: u8,
    arriving: Option<&CreatureRecord>,
) -> Result<(), CoreError> {
    let staying = session
        .party()
        .iter()
        .enumerate()
        .filter(|(index, record)| *index != leaving as usize && !record.is_egg())
        .count();
    let arriving = usize::from(arriving.is_some_and(|record| !record.is_egg()));
    if staying + arriving == 0 {
        return Err(CoreError::new(
            CoreErrorCode::UnsupportedOperation,
            format!("{} must keep at least one non-egg party member", session.title()),
        ));
    }
    Ok(())
}

/// Append to the party or write into a box slot. Returns where it landed.
fn place(
    doc: &mut Document,
    location: Location,
    record: &CreatureRecord,
) -> Result<Location, SaveError> {
    match location {
        Location::Party(_) => {
            let index = doc.party().len();
            doc.set_party_record(index, record)?;
            Ok(Location::Party(index as u8))
        }
        Location::Box { box_index, slot } => {
            doc.set_box_record(box_index as usize, slot as usize, record)?;
            Ok(location)
        }
    }
}

/// Overwrite an occupied location in place.
fn place_at(
    doc: &mut Document,
    location: Location,
    record: &CreatureRecord,
) -> Result<(), SaveError> {
    match location {
        Location::Party(index) => doc.set_party_record(index as usize, record),
        Location::Box { box_index, slot } => {
            doc.set_box_record(box_index as usize, slot as usize, record)
        }
    }
}

fn take(doc: &mut Document, location: Location) -> Result<(), SaveError> {
    match location {
        Location::Party(index) => doc.remove_party_record(index as usize),
        Location::Box { box_index, slot } => {
            doc.clear_box_record(box_index as usize, slot as usize)
        }
    }
}
