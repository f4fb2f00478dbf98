use pokebridge_core::creature::codec::{self, ENCRYPTED_LEN, Substructure, SubstructureKind};
use pokebridge_core::creature::{BOX_RECORD_SIZE, CreatureRecord, PARTY_RECORD_SIZE};
use pokebridge_core::error::SaveError;
use pokebridge_core::fixture;
use pokebridge_core::text;
use proptest::prelude::*;

fn substructures() -> impl Strategy<Value = [Substructure; 4]> {
    proptest::array::uniform4(proptest::array::uniform12(any::<u8>()))
}

proptest! {
    #[test]
    fn decrypt_inverts_encrypt(pid: u32, otid: u32, subs in substructures()) {
        let block = codec::encrypt(&subs, pid, otid);
        let decoded = codec::decrypt(&block, pid, otid).expect("48-byte block");
        prop_assert_eq!(decoded, subs);
    }

    #[test]
    fn key_stream_applied_twice_is_identity(
        key: u32,
        raw in proptest::collection::vec(any::<u8>(), ENCRYPTED_LEN),
    ) {
        let original: [u8; ENCRYPTED_LEN] = raw.as_slice().try_into().expect("sized vec");
        let mut block = original;
        codec::apply_key_stream(&mut block, key);
        codec::apply_key_stream(&mut block, key);
        prop_assert_eq!(block, original);
    }

    #[test]
    fn wrong_order_with_right_key_keeps_checksum(
        pid: u32,
        otid: u32,
        shift in 1u32..24,
        subs in substructures(),
    ) {
        // A different pid with the same key only permutes the substructures.
        let other_pid = pid.wrapping_add(shift);
        prop_assume!(other_pid % 24 != pid % 24);
        let other_otid = pid ^ otid ^ other_pid;

        let block = codec::encrypt(&subs, pid, otid);
        let scrambled = codec::decrypt(&block, other_pid, other_otid).expect("48-byte block");
        prop_assert_eq!(codec::checksum(&scrambled), codec::checksum(&subs));
    }
}

#[test]
fn permutation_table_follows_pid_mod_24() {
    use SubstructureKind::{Attacks, Condition, Growth, Misc};

    assert_eq!(codec::order(0), [Growth, Attacks, Condition, Misc]);
    assert_eq!(codec::order(24), codec::order(0));
    assert_eq!(codec::order(1), [Growth, Attacks, Misc, Condition]);
    assert_eq!(codec::order(6), [Attacks, Growth, Condition, Misc]);
    assert_eq!(codec::order(23), [Misc, Condition, Attacks, Growth]);

    for pid in 0..24u32 {
        let mut kinds = codec::order(pid).map(SubstructureKind::index);
        kinds.sort_unstable();
        assert_eq!(kinds, [0, 1, 2, 3], "order {pid} is not a permutation");
    }
}

#[test]
fn decrypt_rejects_wrong_block_size() {
    let err = codec::decrypt(&[0u8; 47], 1, 2).expect_err("47 bytes must be rejected");
    assert!(matches!(
        err,
        SaveError::MalformedBlock {
            expected: 48,
            actual: 47
        }
    ));
}

#[test]
fn zeroed_record_is_empty() {
    let record = CreatureRecord::from_bytes(&[0u8; BOX_RECORD_SIZE]).expect("80 bytes");
    assert!(record.is_empty());
    assert_eq!(record.species(), 0);
}

#[test]
fn record_rejects_other_sizes() {
    let err = CreatureRecord::from_bytes(&[0u8; 81]).expect_err("81 bytes must be rejected");
    assert!(matches!(err, SaveError::MalformedBlock { actual: 81, .. }));
}

#[test]
fn built_record_decodes_its_fields() {
    let record = fixture::creature(280, 0xDEAD_BEEF, 0x1234_5678, "RALTS");
    assert_eq!(record.as_bytes().len(), BOX_RECORD_SIZE);
    assert_eq!(record.species(), 280);
    assert_eq!(record.pid(), 0xDEAD_BEEF);
    assert_eq!(record.otid(), 0x1234_5678);
    assert_eq!(record.nickname(), "RALTS");
    assert_eq!(record.ot_name(), "ASH");
    assert!(record.checksum_valid());
    assert!(!record.is_egg());
    assert!(!record.is_empty());
    assert_eq!(record.attacks().moves, [33, 45, 0, 0]);
}

#[test]
fn party_record_keeps_box_prefix_verbatim() {
    let party = fixture::party_creature(25, 77, 99, "PIKA", 12);
    assert_eq!(party.as_bytes().len(), PARTY_RECORD_SIZE);
    assert_eq!(party.party_stats().map(|s| s.level), Some(12));

    let boxed = party.to_box_record();
    assert_eq!(boxed.as_bytes(), &party.as_bytes()[..BOX_RECORD_SIZE]);
    assert!(boxed.party_stats().is_none());
    assert_eq!(boxed.species(), 25);
}

#[test]
fn corrupted_data_fails_checksum_but_still_decodes() {
    let record = fixture::creature(1, 500, 600, "BULBA");
    let mut bytes = record.as_bytes().to_vec();
    bytes[0x30] ^= 0xFF;
    let corrupted = CreatureRecord::from_bytes(&bytes).expect("80 bytes");
    assert!(!corrupted.checksum_valid());
    assert_eq!(corrupted.pid(), 500);
}

#[test]
fn egg_flag_comes_from_misc_word() {
    let egg = fixture::party_egg(175, 1, 2);
    assert!(egg.is_egg());
    assert!(egg.summary().is_egg);
}

#[test]
fn text_round_trips_supported_characters() {
    let encoded = text::encode("Ash 2-B.", 10).expect("encodable");
    assert_eq!(encoded.len(), 10);
    assert_eq!(encoded[8], text::TERMINATOR);
    assert_eq!(text::decode(&encoded), "Ash 2-B.");
}

#[test]
fn text_rejects_overlong_or_unknown_input() {
    assert!(text::encode("ABCDEFGHIJK", 10).is_none());
    assert!(text::encode("é", 10).is_none());
    assert_eq!(text::decode(&[0xBB, 0x01, 0xFF, 0xBC]), "A*");
}
