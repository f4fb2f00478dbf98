use std::fs;
use std::path::{Path, PathBuf};

use pokebridge_core::bridge::SaveLock;
use pokebridge_core::core_api::{Container, CoreErrorCode, Engine, Location, StorageSlot};
use pokebridge_core::creature::CreatureRecord;
use pokebridge_core::fixture::{self, SaveBuilder};
use pokebridge_core::{StorageBridge, Title};
use tempfile::TempDir;

fn boxed(box_index: u8, slot: u8) -> Location {
    Location::Box { box_index, slot }
}

fn at(title: Title, location: Location) -> StorageSlot {
    StorageSlot::new(title, location)
}

fn emerald_save() -> Vec<u8> {
    SaveBuilder::for_title(Title::Emerald)
        .trainer("MAY", 1111, 2222)
        .party_member(fixture::party_creature(280, 100, 7, "TORCHIC", 12))
        .party_member(fixture::party_creature(25, 101, 7, "PIKA", 15))
        .boxed(0, 0, fixture::creature(25, 102, 7, "SPARKY"))
        .boxed(0, 1, fixture::creature(300, 103, 7, "SKITTY"))
        .build()
}

fn firered_save() -> Vec<u8> {
    SaveBuilder::for_title(Title::FireRed)
        .trainer("RED", 3333, 4444)
        .party_member(fixture::party_creature(4, 200, 8, "CHAR", 9))
        .boxed(0, 0, fixture::creature(129, 201, 8, "CARP"))
        .build()
}

fn bridge_with(saves: &[(Title, Vec<u8>)]) -> StorageBridge {
    let mut bridge = StorageBridge::new(Engine::new());
    for (title, bytes) in saves {
        bridge
            .open_bytes(bytes, *title)
            .unwrap_or_else(|e| panic!("failed to open {title}: {e}"));
    }
    bridge
}

fn write_save(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap_or_else(|e| panic!("failed to write {:?}: {}", path, e));
    path
}

fn record(bridge: &StorageBridge, slot: StorageSlot) -> Option<CreatureRecord> {
    bridge
        .session(slot.title)
        .and_then(|session| session.record_at(slot.location))
        .cloned()
}

#[test]
fn box_to_box_transfer_moves_bytes_verbatim() {
    let mut bridge = bridge_with(&[
        (Title::Emerald, emerald_save()),
        (Title::FireRed, firered_save()),
    ]);
    let source = at(Title::Emerald, boxed(0, 0));
    let before = record(&bridge, source).expect("source record");
    let total = bridge.creature_count();

    let outcome = bridge
        .transfer(source, Title::FireRed, boxed(3, 4))
        .expect("transfer failed");
    assert_eq!(outcome.to, at(Title::FireRed, boxed(3, 4)));
    assert_eq!(outcome.species, 25);
    assert_eq!(outcome.pid, 102);

    assert!(record(&bridge, source).is_none());
    let moved = record(&bridge, outcome.to).expect("destination record");
    assert_eq!(moved.as_bytes(), before.as_bytes());
    assert_eq!(bridge.creature_count(), total);
    assert!(bridge.session(Title::Emerald).is_some_and(|s| s.is_modified()));
    assert!(bridge.session(Title::FireRed).is_some_and(|s| s.is_modified()));
}

#[test]
fn party_to_box_keeps_the_box_prefix() {
    let mut bridge = bridge_with(&[
        (Title::Emerald, emerald_save()),
        (Title::FireRed, firered_save()),
    ]);
    let source = at(Title::Emerald, Location::Party(1));
    let before = record(&bridge, source).expect("party record");

    let outcome = bridge
        .transfer(source, Title::FireRed, boxed(0, 5))
        .expect("transfer failed");
    let moved = record(&bridge, outcome.to).expect("destination record");
    assert_eq!(moved.as_bytes(), &before.as_bytes()[..80]);

    let party: Vec<u32> = bridge
        .session(Title::Emerald)
        .expect("emerald open")
        .party()
        .iter()
        .map(CreatureRecord::pid)
        .collect();
    assert_eq!(party, vec![100], "remaining members stay compact");
}

#[test]
fn party_destination_is_normalised_to_next_free_index() {
    let mut bridge = bridge_with(&[
        (Title::Emerald, emerald_save()),
        (Title::FireRed, firered_save()),
    ]);

    let err = bridge
        .transfer(
            at(Title::Emerald, Location::Party(1)),
            Title::FireRed,
            Location::Party(0),
        )
        .expect_err("occupied party index");
    assert_eq!(err.code, CoreErrorCode::SlotOccupied);

    let outcome = bridge
        .transfer(
            at(Title::Emerald, Location::Party(1)),
            Title::FireRed,
            Location::Party(5),
        )
        .expect("transfer failed");
    assert_eq!(outcome.to, at(Title::FireRed, Location::Party(1)));
    let moved = record(&bridge, outcome.to).expect("party record");
    assert!(moved.is_party());
    assert_eq!(moved.nickname(), "PIKA");
}

#[test]
fn regional_species_needs_national_dex() {
    let mut bridge = bridge_with(&[
        (Title::Emerald, emerald_save()),
        (Title::FireRed, firered_save()),
    ]);
    let skitty = at(Title::Emerald, boxed(0, 1));

    let err = bridge
        .transfer(skitty, Title::FireRed, boxed(0, 1))
        .expect_err("Hoenn species without national dex");
    assert_eq!(err.code, CoreErrorCode::IncompatibleSpecies);
    assert!(err.is_recoverable());
    assert!(record(&bridge, skitty).is_some());
    assert!(!bridge.session(Title::FireRed).is_some_and(|s| s.is_modified()));

    let national = SaveBuilder::for_title(Title::LeafGreen)
        .party_member(fixture::party_creature(1, 300, 9, "BULBA", 5))
        .national_dex(true)
        .build();
    bridge
        .open_bytes(&national, Title::LeafGreen)
        .expect("failed to open LeafGreen");
    bridge
        .transfer(skitty, Title::LeafGreen, boxed(0, 0))
        .expect("national dex accepts every species");
}

#[test]
fn kanto_species_cannot_enter_hoenn_dex_without_national() {
    let mut bridge = bridge_with(&[
        (Title::Emerald, emerald_save()),
        (Title::FireRed, firered_save()),
    ]);
    let err = bridge
        .transfer(at(Title::FireRed, Location::Party(0)), Title::Emerald, boxed(1, 0))
        .expect_err("Charmander is outside the Hoenn dex");
    assert_eq!(err.code, CoreErrorCode::IncompatibleSpecies);

    bridge
        .transfer(at(Title::FireRed, boxed(0, 0)), Title::Emerald, boxed(1, 0))
        .expect("Magikarp is in the Hoenn dex");
}

#[test]
fn bad_eggs_never_cross_saves() {
    let mut bytes = fixture::creature(25, 55, 7, "PIKA").as_bytes().to_vec();
    bytes[0x13] |= 0x01;
    let bad = CreatureRecord::from_bytes(&bytes).expect("80-byte record");
    assert!(bad.is_bad_egg());

    let save = SaveBuilder::for_title(Title::Ruby)
        .party_member(fixture::party_creature(280, 1, 7, "TORCHIC", 5))
        .boxed(0, 0, bad)
        .build();
    let mut bridge = bridge_with(&[(Title::Ruby, save), (Title::Emerald, emerald_save())]);

    let err = bridge
        .transfer(at(Title::Ruby, boxed(0, 0)), Title::Emerald, boxed(5, 5))
        .expect_err("bad egg");
    assert_eq!(err.code, CoreErrorCode::IncompatibleSpecies);
}

#[test]
fn last_non_egg_party_member_stays() {
    let save = SaveBuilder::for_title(Title::Sapphire)
        .party_member(fixture::party_creature(280, 1, 7, "TORCHIC", 5))
        .party_member(fixture::party_egg(174, 2, 7))
        .build();
    let mut bridge = bridge_with(&[(Title::Sapphire, save), (Title::Emerald, emerald_save())]);

    let err = bridge
        .transfer(
            at(Title::Sapphire, Location::Party(0)),
            Title::Emerald,
            boxed(2, 0),
        )
        .expect_err("only non-egg member");
    assert_eq!(err.code, CoreErrorCode::UnsupportedOperation);

    bridge
        .transfer(
            at(Title::Sapphire, Location::Party(1)),
            Title::Emerald,
            boxed(2, 0),
        )
        .expect("eggs may leave");
}

#[test]
fn boxed_records_cannot_join_a_party() {
    let mut bridge = bridge_with(&[
        (Title::Emerald, emerald_save()),
        (Title::FireRed, firered_save()),
    ]);
    let err = bridge
        .transfer(at(Title::FireRed, boxed(0, 0)), Title::Emerald, Location::Party(2))
        .expect_err("box to party");
    assert_eq!(err.code, CoreErrorCode::UnsupportedOperation);
}

#[test]
fn policy_checks_run_in_order() {
    let mut bridge = bridge_with(&[(Title::Emerald, emerald_save())]);

    let err = bridge
        .transfer(at(Title::Emerald, boxed(14, 0)), Title::Emerald, boxed(0, 9))
        .expect_err("box 14");
    assert_eq!(err.code, CoreErrorCode::InvalidSlot);

    let err = bridge
        .transfer(at(Title::Emerald, boxed(0, 0)), Title::FireRed, boxed(0, 0))
        .expect_err("FireRed is not open");
    assert_eq!(err.code, CoreErrorCode::StaleHandle);

    let err = bridge
        .transfer(at(Title::Emerald, boxed(0, 9)), Title::Emerald, boxed(0, 10))
        .expect_err("empty source");
    assert_eq!(err.code, CoreErrorCode::SlotEmpty);

    let err = bridge
        .transfer(at(Title::Emerald, boxed(0, 0)), Title::Emerald, boxed(0, 1))
        .expect_err("occupied destination");
    assert_eq!(err.code, CoreErrorCode::SlotOccupied);

    assert!(!bridge.session(Title::Emerald).is_some_and(|s| s.is_modified()));
}

#[test]
fn full_box_is_reported_before_occupancy() {
    let mut builder = SaveBuilder::for_title(Title::FireRed)
        .party_member(fixture::party_creature(4, 1, 8, "CHAR", 9));
    for slot in 0..30 {
        builder = builder.boxed(2, slot, fixture::creature(129, 1000 + slot as u32, 8, "CARP"));
    }
    let mut bridge = bridge_with(&[
        (Title::FireRed, builder.build()),
        (Title::Emerald, emerald_save()),
    ]);

    assert_eq!(bridge.first_empty(Title::FireRed, Container::Box(2)), None);
    assert_eq!(
        bridge.first_empty(Title::FireRed, Container::Box(3)),
        Some(boxed(3, 0))
    );
    assert_eq!(
        bridge.first_empty(Title::FireRed, Container::Party),
        Some(Location::Party(1))
    );

    let err = bridge
        .transfer(at(Title::Emerald, boxed(0, 0)), Title::FireRed, boxed(2, 0))
        .expect_err("full box");
    assert_eq!(err.code, CoreErrorCode::DestinationFull);
}

#[test]
fn same_save_moves() {
    let mut bridge = bridge_with(&[(Title::Emerald, emerald_save())]);

    let outcome = bridge
        .transfer(at(Title::Emerald, boxed(0, 0)), Title::Emerald, boxed(7, 29))
        .expect("box move");
    assert_eq!(outcome.to, at(Title::Emerald, boxed(7, 29)));
    assert!(record(&bridge, at(Title::Emerald, boxed(0, 0))).is_none());

    let outcome = bridge
        .transfer(
            at(Title::Emerald, Location::Party(0)),
            Title::Emerald,
            Location::Party(5),
        )
        .expect("party reorder");
    assert_eq!(outcome.to, at(Title::Emerald, Location::Party(1)));
    let session = bridge.session(Title::Emerald).expect("emerald open");
    let pids: Vec<u32> = session.party().iter().map(CreatureRecord::pid).collect();
    assert_eq!(pids, vec![101, 100]);

    bridge
        .transfer(at(Title::Emerald, Location::Party(0)), Title::Emerald, boxed(0, 0))
        .expect("party to box");
    assert_eq!(
        bridge.session(Title::Emerald).expect("open").party().len(),
        1
    );
}

#[test]
fn swap_exchanges_boxed_records_across_saves() {
    let mut bridge = bridge_with(&[
        (Title::Emerald, emerald_save()),
        (Title::FireRed, firered_save()),
    ]);
    let a = at(Title::Emerald, boxed(0, 0));
    let b = at(Title::FireRed, boxed(0, 0));
    let record_a = record(&bridge, a).expect("a");
    let record_b = record(&bridge, b).expect("b");

    bridge.swap(a, b).expect("swap failed");
    assert_eq!(record(&bridge, a), Some(record_b));
    assert_eq!(record(&bridge, b), Some(record_a));

    let err = bridge
        .swap(a, at(Title::FireRed, Location::Party(0)))
        .expect_err("box with party");
    assert_eq!(err.code, CoreErrorCode::UnsupportedOperation);

    let err = bridge
        .swap(a, at(Title::FireRed, boxed(9, 9)))
        .expect_err("empty partner");
    assert_eq!(err.code, CoreErrorCode::SlotEmpty);

    let err = bridge
        .swap(at(Title::Emerald, boxed(0, 1)), b)
        .expect_err("Skitty cannot enter FireRed");
    assert_eq!(err.code, CoreErrorCode::IncompatibleSpecies);
}

#[test]
fn commit_of_memory_save_returns_decodable_bytes() {
    let mut bridge = bridge_with(&[
        (Title::Emerald, emerald_save()),
        (Title::FireRed, firered_save()),
    ]);
    bridge
        .transfer(at(Title::Emerald, boxed(0, 0)), Title::FireRed, boxed(0, 1))
        .expect("transfer");

    let handle = bridge.handle(Title::FireRed).expect("handle");
    let bytes = bridge.commit(handle).expect("commit");
    let reopened = Engine::new()
        .open_bytes(&bytes, Some(Title::FireRed))
        .expect("committed bytes decode");
    assert_eq!(
        reopened.record_at(boxed(0, 1)).map(CreatureRecord::pid),
        Some(102)
    );
    assert_eq!(reopened.snapshot().save_counter, 11);
    assert!(!bridge.session(Title::FireRed).is_some_and(|s| s.is_modified()));
}

#[test]
fn file_backed_saves_lock_commit_and_release() {
    let dir = TempDir::new().expect("temp dir");
    let emerald_path = write_save(dir.path(), "emerald.sav", &emerald_save());
    let firered_path = write_save(dir.path(), "firered.sav", &firered_save());

    let mut bridge = StorageBridge::default();
    let emerald = bridge.open(&emerald_path, Title::Emerald).expect("open emerald");
    let firered = bridge.open(&firered_path, Title::FireRed).expect("open firered");
    assert!(SaveLock::lock_path(&emerald_path).exists());
    assert_eq!(bridge.path(Title::Emerald), Some(emerald_path.as_path()));

    let mut rival = StorageBridge::default();
    let err = rival
        .open(&emerald_path, Title::Emerald)
        .expect_err("lock is held");
    assert_eq!(err.code, CoreErrorCode::Io);

    let err = bridge
        .open(&emerald_path, Title::Emerald)
        .expect_err("already open");
    assert_eq!(err.code, CoreErrorCode::UnsupportedOperation);

    bridge
        .transfer(at(Title::Emerald, boxed(0, 0)), Title::FireRed, boxed(1, 0))
        .expect("transfer");
    let untouched = fs::read(&firered_path).expect("read firered");
    assert_eq!(untouched, firered_save(), "nothing is written before commit");

    let written = bridge.commit(firered).expect("commit firered");
    assert_eq!(fs::read(&firered_path).expect("read firered"), written);
    bridge.commit(emerald).expect("commit emerald");

    bridge.close(emerald).expect("close emerald");
    bridge.close(firered).expect("close firered");
    assert!(!SaveLock::lock_path(&emerald_path).exists());
    assert!(!SaveLock::lock_path(&firered_path).exists());

    let mut verify = StorageBridge::default();
    verify.open(&emerald_path, Title::Emerald).expect("reopen emerald");
    verify.open(&firered_path, Title::FireRed).expect("reopen firered");
    assert!(record(&verify, at(Title::Emerald, boxed(0, 0))).is_none());
    assert_eq!(
        record(&verify, at(Title::FireRed, boxed(1, 0))).map(|r| r.pid()),
        Some(102)
    );
}

#[test]
fn unmodified_commit_leaves_file_alone() {
    let dir = TempDir::new().expect("temp dir");
    let bytes = firered_save();
    let path = write_save(dir.path(), "firered.sav", &bytes);

    let mut bridge = StorageBridge::default();
    let handle = bridge.open(&path, Title::FireRed).expect("open");
    assert_eq!(bridge.commit(handle).expect("commit"), bytes);
    assert_eq!(fs::read(&path).expect("read"), bytes);
}

#[test]
fn stale_handles_and_external_changes_are_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_save(dir.path(), "emerald.sav", &emerald_save());

    let mut bridge = StorageBridge::default();
    let old = bridge.open(&path, Title::Emerald).expect("open");
    bridge.close(old).expect("close");
    let current = bridge.open(&path, Title::Emerald).expect("reopen");
    assert_ne!(old, current);

    let err = bridge.commit(old).expect_err("closed handle");
    assert_eq!(err.code, CoreErrorCode::StaleHandle);

    fs::write(&path, firered_save()).expect("external write");
    let err = bridge.commit(current).expect_err("file changed on disk");
    assert_eq!(err.code, CoreErrorCode::StaleHandle);
}

#[test]
fn lost_lock_makes_the_session_stale() {
    let dir = TempDir::new().expect("temp dir");
    let emerald_path = write_save(dir.path(), "emerald.sav", &emerald_save());

    let mut bridge = StorageBridge::default();
    bridge.open(&emerald_path, Title::Emerald).expect("open");
    fs::remove_file(SaveLock::lock_path(&emerald_path)).expect("remove lock");

    let err = bridge
        .transfer(at(Title::Emerald, boxed(0, 0)), Title::Emerald, boxed(0, 5))
        .expect_err("lock is gone");
    assert_eq!(err.code, CoreErrorCode::StaleHandle);
}

fn encoded(bridge: &StorageBridge, title: Title) -> Vec<u8> {
    bridge
        .session(title)
        .unwrap_or_else(|| panic!("{title} is not open"))
        .to_bytes_modified()
        .unwrap_or_else(|e| panic!("failed to encode {title}: {e}"))
}

fn creatures_on_disk(path: &Path, title: Title) -> usize {
    let bytes = fs::read(path).unwrap_or_else(|e| panic!("failed to read {:?}: {}", path, e));
    Engine::new()
        .open_bytes(&bytes, Some(title))
        .unwrap_or_else(|e| panic!("failed to decode {title}: {e}"))
        .document()
        .save
        .creature_count()
}

#[test]
fn failed_transfers_leave_both_saves_byte_identical() {
    let mut full = SaveBuilder::for_title(Title::FireRed)
        .party_member(fixture::party_creature(4, 1, 8, "CHAR", 9))
        .boxed(0, 0, fixture::creature(129, 2, 8, "CARP"));
    for slot in 0..30 {
        full = full.boxed(2, slot, fixture::creature(129, 1000 + slot as u32, 8, "CARP"));
    }
    let mut bridge = bridge_with(&[
        (Title::Emerald, emerald_save()),
        (Title::FireRed, full.build()),
    ]);

    let cases = [
        (
            at(Title::Emerald, boxed(0, 1)),
            boxed(0, 5),
            CoreErrorCode::IncompatibleSpecies,
        ),
        (
            at(Title::Emerald, boxed(0, 0)),
            boxed(0, 0),
            CoreErrorCode::SlotOccupied,
        ),
        (
            at(Title::Emerald, boxed(0, 0)),
            boxed(2, 7),
            CoreErrorCode::DestinationFull,
        ),
    ];
    for (source, dest, code) in cases {
        let emerald_before = encoded(&bridge, Title::Emerald);
        let firered_before = encoded(&bridge, Title::FireRed);

        let err = bridge
            .transfer(source, Title::FireRed, dest)
            .expect_err("transfer must fail");
        assert_eq!(err.code, code);

        assert_eq!(encoded(&bridge, Title::Emerald), emerald_before, "{code:?}");
        assert_eq!(encoded(&bridge, Title::FireRed), firered_before, "{code:?}");
    }
}

#[test]
fn cross_save_party_swap_keeps_a_non_egg_member() {
    let sapphire = SaveBuilder::for_title(Title::Sapphire)
        .party_member(fixture::party_creature(280, 1, 7, "TORCHIC", 5))
        .build();
    let ruby = SaveBuilder::for_title(Title::Ruby)
        .party_member(fixture::party_creature(280, 2, 7, "TORCHIC", 6))
        .party_member(fixture::party_egg(174, 3, 7))
        .build();
    let mut bridge = bridge_with(&[(Title::Sapphire, sapphire), (Title::Ruby, ruby)]);
    let sapphire_before = encoded(&bridge, Title::Sapphire);
    let ruby_before = encoded(&bridge, Title::Ruby);

    let err = bridge
        .swap(
            at(Title::Sapphire, Location::Party(0)),
            at(Title::Ruby, Location::Party(1)),
        )
        .expect_err("Sapphire would keep only an egg");
    assert_eq!(err.code, CoreErrorCode::UnsupportedOperation);
    assert_eq!(encoded(&bridge, Title::Sapphire), sapphire_before);
    assert_eq!(encoded(&bridge, Title::Ruby), ruby_before);

    bridge
        .swap(
            at(Title::Sapphire, Location::Party(0)),
            at(Title::Ruby, Location::Party(0)),
        )
        .expect("non-egg for non-egg");
    let pids: Vec<u32> = bridge
        .session(Title::Sapphire)
        .expect("sapphire open")
        .party()
        .iter()
        .map(CreatureRecord::pid)
        .collect();
    assert_eq!(pids, vec![2]);
}

#[test]
fn paired_commit_checks_every_file_before_writing() {
    let dir = TempDir::new().expect("temp dir");
    let emerald_path = write_save(dir.path(), "emerald.sav", &emerald_save());
    let firered_path = write_save(dir.path(), "firered.sav", &firered_save());
    let total = creatures_on_disk(&emerald_path, Title::Emerald)
        + creatures_on_disk(&firered_path, Title::FireRed);

    let mut bridge = StorageBridge::default();
    let emerald = bridge.open(&emerald_path, Title::Emerald).expect("open emerald");
    let firered = bridge.open(&firered_path, Title::FireRed).expect("open firered");
    bridge
        .transfer(at(Title::Emerald, boxed(0, 0)), Title::FireRed, boxed(1, 0))
        .expect("transfer");

    // Touch a byte past both slots so only the baseline check notices.
    let mut touched = firered_save();
    let last = touched.len() - 1;
    touched[last] ^= 0xFF;
    fs::write(&firered_path, &touched).expect("external write");

    let err = bridge
        .commit_all(&[firered, emerald])
        .expect_err("destination changed on disk");
    assert_eq!(err.code, CoreErrorCode::StaleHandle);
    assert_eq!(fs::read(&emerald_path).expect("read emerald"), emerald_save());
    assert_eq!(fs::read(&firered_path).expect("read firered"), touched);
    drop(bridge);

    assert_eq!(
        creatures_on_disk(&emerald_path, Title::Emerald)
            + creatures_on_disk(&firered_path, Title::FireRed),
        total
    );
}

#[test]
fn paired_commit_writes_both_saves() {
    let dir = TempDir::new().expect("temp dir");
    let emerald_path = write_save(dir.path(), "emerald.sav", &emerald_save());
    let firered_path = write_save(dir.path(), "firered.sav", &firered_save());

    let mut bridge = StorageBridge::default();
    let emerald = bridge.open(&emerald_path, Title::Emerald).expect("open emerald");
    let firered = bridge.open(&firered_path, Title::FireRed).expect("open firered");
    bridge
        .transfer(at(Title::Emerald, boxed(0, 0)), Title::FireRed, boxed(1, 0))
        .expect("transfer");

    let written = bridge
        .commit_all(&[firered, emerald, firered])
        .expect("commit both");
    assert_eq!(written.len(), 2);
    assert_eq!(fs::read(&firered_path).expect("read firered"), written[0]);
    assert_eq!(fs::read(&emerald_path).expect("read emerald"), written[1]);
    assert!(!bridge.session(Title::Emerald).is_some_and(|s| s.is_modified()));
    drop(bridge);

    assert_eq!(creatures_on_disk(&emerald_path, Title::Emerald), 3);
    assert_eq!(creatures_on_disk(&firered_path, Title::FireRed), 3);
}
