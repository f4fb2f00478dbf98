use pokebridge_core::error::SaveError;
use pokebridge_core::fixture::{self, SaveBuilder};
use pokebridge_core::gen3::types::{SAVE_SIZE, SECTION_SIZE, SLOT_SIZE};
use pokebridge_core::gen3::sections::{checksum, newer_counter, payload_len};
use pokebridge_core::gen3::{self, DecodeOptions, Document, SlotTieBreak};
use pokebridge_core::gender::Gender;
use pokebridge_core::layout::SlotId;
use pokebridge_core::{FormatVariant, Title};
use proptest::prelude::*;

fn decode(bytes: &[u8]) -> Document {
    Document::decode(bytes, DecodeOptions::default())
        .unwrap_or_else(|e| panic!("failed to decode fixture: {e}"))
}

#[test]
fn unmodified_document_emits_identical_bytes() {
    for variant in [
        FormatVariant::RubySapphire,
        FormatVariant::Emerald,
        FormatVariant::FireRedLeafGreen,
    ] {
        let bytes = SaveBuilder::new(variant)
            .party_member(fixture::party_creature(25, 1, 2, "PIKA", 10))
            .build();
        let doc = decode(&bytes);
        doc.layout().validate().expect("invalid slot layout");
        assert!(!doc.is_modified());
        assert_eq!(doc.encode().expect("failed to encode"), bytes);
    }
}

#[test]
fn detects_each_layout_family() {
    for variant in [
        FormatVariant::RubySapphire,
        FormatVariant::Emerald,
        FormatVariant::FireRedLeafGreen,
    ] {
        let doc = decode(&SaveBuilder::new(variant).build());
        assert_eq!(doc.variant(), variant);
    }
}

#[test]
fn variant_hint_must_match_detection() {
    let bytes = SaveBuilder::new(FormatVariant::Emerald).build();
    let err = Document::decode(
        &bytes,
        DecodeOptions {
            variant: Some(FormatVariant::FireRedLeafGreen),
            ..DecodeOptions::default()
        },
    )
    .expect_err("hint mismatch must fail");
    assert!(matches!(err, SaveError::UnknownFormatVersion(_)));
}

#[test]
fn parses_trainer_block_with_encrypted_money() {
    for title in [Title::Ruby, Title::Emerald, Title::LeafGreen] {
        let bytes = SaveBuilder::for_title(title)
            .trainer("May", 4242, 777)
            .gender(1)
            .play_time(123, 4, 5)
            .money(987_654)
            .build();
        let trainer = decode(&bytes).trainer().clone();
        assert_eq!(trainer.name, "May");
        assert_eq!(trainer.gender, Gender::Female);
        assert_eq!(trainer.public_id, 4242);
        assert_eq!(trainer.secret_id, 777);
        assert_eq!(trainer.play_time.hours, 123);
        assert_eq!(trainer.play_time.total_seconds(), 123 * 3600 + 4 * 60 + 5);
        assert_eq!(trainer.money, 987_654, "money for {title}");
        assert_eq!(trainer.transfer_key(), 4242 | (777 << 16));
    }
}

#[test]
fn parses_party_boxes_dex_and_flags() {
    let bytes = SaveBuilder::new(FormatVariant::Emerald)
        .party_member(fixture::party_creature(280, 10, 20, "TORCHIC", 5))
        .party_member(fixture::party_egg(175, 11, 20))
        .boxed(0, 0, fixture::creature(25, 30, 20, "PIKA"))
        .boxed(13, 29, fixture::creature(129, 31, 20, "CARP"))
        .badges(3)
        .champion(true)
        .national_dex(true)
        .owned([1, 25, 386])
        .build();
    let doc = decode(&bytes);

    assert_eq!(doc.party().len(), 2);
    assert_eq!(doc.party()[0].species(), 280);
    assert!(doc.party()[1].is_egg());
    assert_eq!(doc.boxes().len(), 14);
    assert_eq!(doc.boxes()[0].name, "BOX1");
    assert_eq!(doc.boxes()[0].occupied(), 1);
    assert_eq!(
        doc.boxes()[13].slots[29].as_ref().map(|r| r.nickname()),
        Some("CARP".to_string())
    );
    assert_eq!(doc.save.creature_count(), 4);

    assert_eq!(doc.dex_owned(), vec![1, 25, 386]);
    assert!(doc.dex().is_seen(386));
    assert!(doc.dex().national_enabled);
    assert_eq!(
        doc.save.badges(),
        [true, true, true, false, false, false, false, false]
    );
    assert!(doc.save.is_champion());
}

#[test]
fn newer_counter_selects_current_slot() {
    let bytes = SaveBuilder::new(FormatVariant::RubySapphire)
        .slots(Some((4, 2)), Some((5, 9)))
        .build();
    assert_eq!(decode(&bytes).layout().current, SlotId::B);

    let bytes = SaveBuilder::new(FormatVariant::RubySapphire)
        .slots(Some((u32::MAX, 0)), Some((0, 3)))
        .build();
    assert_eq!(
        decode(&bytes).layout().current,
        SlotId::B,
        "counter 0 follows u32::MAX"
    );
}

#[test]
fn equal_counters_follow_tie_break_policy() {
    let bytes = SaveBuilder::new(FormatVariant::RubySapphire)
        .slots(Some((7, 0)), Some((7, 1)))
        .build();
    let prefer_b = DecodeOptions {
        tie_break: SlotTieBreak::PreferSlotB,
        ..DecodeOptions::default()
    };
    assert_eq!(decode(&bytes).layout().current, SlotId::A);
    assert_eq!(
        Document::decode(&bytes, prefer_b)
            .expect("failed to decode")
            .layout()
            .current,
        SlotId::B
    );
}

#[test]
fn rotation_does_not_change_decoded_state() {
    let builder = SaveBuilder::new(FormatVariant::FireRedLeafGreen)
        .party_member(fixture::party_creature(4, 1, 2, "CHAR", 8));
    let plain = decode(&builder.clone().slots(Some((1, 0)), None).build());
    let rotated = decode(&builder.slots(Some((1, 11)), None).build());
    assert_eq!(plain.save, rotated.save);
    assert_eq!(rotated.layout().current_slot().expect("current").rotation, 11);
}

#[test]
fn checksum_mismatch_is_fatal() {
    let mut bytes = SaveBuilder::new(FormatVariant::Emerald).build();
    // Slot A rotation 0: section 0 sits at offset 0.
    bytes[0x100] ^= 0x55;
    let err = Document::decode(&bytes, DecodeOptions::default())
        .expect_err("corrupted section must be rejected");
    assert!(matches!(
        err,
        SaveError::ChecksumMismatch {
            slot: SlotId::A,
            section_id: 0,
            ..
        }
    ));

    let report = gen3::validate(&bytes, SlotTieBreak::default());
    assert!(!report.is_valid());
    let bad: Vec<_> = report.slots[0]
        .sections
        .iter()
        .filter(|check| !check.is_valid())
        .map(|check| check.id)
        .collect();
    assert_eq!(bad, vec![0]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn any_flipped_payload_byte_is_a_checksum_mismatch(
        section_id in 0u16..14,
        offset_seed in any::<usize>(),
        in_slot_b in any::<bool>(),
        mask in 1u8..=255,
    ) {
        let mut bytes = SaveBuilder::new(FormatVariant::FireRedLeafGreen)
            .party_member(fixture::party_creature(4, 1, 2, "CHAR", 8))
            .slots(Some((10, 0)), Some((9, 5)))
            .build();
        let (slot, rotation) = if in_slot_b { (SlotId::B, 5) } else { (SlotId::A, 0) };
        let len = payload_len(section_id);
        let physical = (section_id as usize + rotation) % 14;
        let start = slot.base_offset() + physical * SECTION_SIZE;

        let before = checksum(&bytes[start..start + len]);
        bytes[start + offset_seed % len] ^= mask;
        prop_assume!(checksum(&bytes[start..start + len]) != before);

        let err = Document::decode(&bytes, DecodeOptions::default())
            .expect_err("corrupted section must be rejected");
        match err {
            SaveError::ChecksumMismatch { slot: reported, section_id: id, .. } => {
                prop_assert_eq!(reported, slot);
                prop_assert_eq!(id, section_id);
            }
            other => prop_assert!(false, "unexpected error: {other}"),
        }
    }
}

#[test]
fn counters_half_the_range_apart_prefer_the_larger_value() {
    assert_eq!(newer_counter(0x8000_0005, 5), Some(SlotId::A));
    assert_eq!(newer_counter(5, 0x8000_0005), Some(SlotId::B));
    assert_eq!(newer_counter(0x8000_0000, 0), Some(SlotId::A));
    assert_eq!(newer_counter(7, 7), None);
}

#[test]
fn rejects_wrong_size_and_blank_images() {
    let err = Document::decode(&[0u8; 1024], DecodeOptions::default())
        .expect_err("short image must be rejected");
    assert!(matches!(err, SaveError::UnknownFormatVersion(_)));

    let blank = vec![0u8; SAVE_SIZE];
    assert!(gen3::is_blank(&blank));
    assert!(gen3::validate(&blank, SlotTieBreak::default()).is_blank());
    let err = Document::decode(&blank, DecodeOptions::default())
        .expect_err("blank image must be rejected");
    assert!(matches!(err, SaveError::UnknownFormatVersion(_)));
}

#[test]
fn single_populated_slot_decodes() {
    let bytes = SaveBuilder::new(FormatVariant::RubySapphire)
        .slots(None, Some((3, 4)))
        .build();
    let doc = decode(&bytes);
    assert_eq!(doc.layout().current, SlotId::B);
    assert!(doc.layout().backup_slot().is_none());
}

#[test]
fn modified_document_writes_backup_slot_with_next_counter() {
    let bytes = SaveBuilder::new(FormatVariant::Emerald)
        .party_member(fixture::party_creature(280, 10, 20, "TORCHIC", 5))
        .build();
    let mut doc = decode(&bytes);
    doc.set_box_record(2, 7, &fixture::creature(25, 99, 20, "PIKA"))
        .expect("failed to place record");
    assert!(doc.is_modified());

    let out = doc.encode().expect("failed to encode");
    assert_eq!(out.len(), SAVE_SIZE);
    assert_eq!(&out[..SLOT_SIZE], &bytes[..SLOT_SIZE], "slot A must be untouched");
    assert_eq!(&out[2 * SLOT_SIZE..], &bytes[2 * SLOT_SIZE..], "tail must be untouched");

    let report = gen3::validate(&out, SlotTieBreak::default());
    assert!(report.is_valid());
    assert_eq!(report.current, Some(SlotId::B));

    let reopened = decode(&out);
    let current = reopened.layout().current_slot().expect("current slot");
    assert_eq!(current.slot, SlotId::B);
    assert_eq!(current.counter, 11);
    assert_eq!(current.rotation, 1);
    assert_eq!(
        reopened.boxes()[2].slots[7].as_ref().map(|r| r.pid()),
        Some(99)
    );
    assert_eq!(reopened.party().len(), 1);
    assert_eq!(reopened.trainer(), doc.trainer());
}

#[test]
fn bytes_outside_payload_survive_reencode() {
    let mut bytes = SaveBuilder::new(FormatVariant::RubySapphire).build();
    // Section 1 in slot A (rotation 0), first byte past its 3968-byte payload.
    let padding = SECTION_SIZE + 0xF80;
    bytes[padding] = 0xA7;

    let mut doc = decode(&bytes);
    doc.set_party_record(0, &fixture::party_creature(25, 1, 2, "PIKA", 10))
        .expect("failed to append party member");
    let out = doc.encode().expect("failed to encode");

    // The new slot B uses rotation 1, so section 1 lands at physical index 2.
    assert_eq!(out[SLOT_SIZE + 2 * SECTION_SIZE + 0xF80], 0xA7);
}

#[test]
fn party_edits_keep_records_compact() {
    let bytes = SaveBuilder::new(FormatVariant::FireRedLeafGreen)
        .party_member(fixture::party_creature(1, 1, 9, "ONE", 5))
        .party_member(fixture::party_creature(4, 2, 9, "TWO", 5))
        .party_member(fixture::party_creature(7, 3, 9, "THREE", 5))
        .build();
    let mut doc = decode(&bytes);

    doc.remove_party_record(0).expect("failed to remove");
    let pids: Vec<u32> = doc.party().iter().map(|r| r.pid()).collect();
    assert_eq!(pids, vec![2, 3]);

    let err = doc
        .set_party_record(4, &fixture::party_creature(1, 4, 9, "FOUR", 5))
        .expect_err("gap in party must be rejected");
    assert!(matches!(err, SaveError::InvalidLocation(_)));

    let err = doc
        .set_party_record(2, &fixture::creature(1, 4, 9, "FOUR"))
        .expect_err("box-sized record cannot join the party");
    assert!(matches!(err, SaveError::MalformedBlock { .. }));

    let reopened = decode(&doc.encode().expect("failed to encode"));
    assert_eq!(reopened.party().len(), 2);
    assert_eq!(reopened.party()[1].nickname(), "THREE");
}

#[test]
fn full_party_rejects_append() {
    let mut builder = SaveBuilder::new(FormatVariant::RubySapphire);
    for pid in 0..6 {
        builder = builder.party_member(fixture::party_creature(25, pid, 9, "PIKA", 5));
    }
    let mut doc = decode(&builder.build());
    let err = doc
        .set_party_record(6, &fixture::party_creature(25, 6, 9, "PIKA", 5))
        .expect_err("seventh member must be rejected");
    assert!(matches!(err, SaveError::Full(_)));
}

#[test]
fn box_locations_are_bounds_checked() {
    let mut doc = decode(&SaveBuilder::new(FormatVariant::Emerald).build());
    let record = fixture::creature(25, 1, 2, "PIKA");
    assert!(matches!(
        doc.set_box_record(14, 0, &record),
        Err(SaveError::InvalidLocation(_))
    ));
    assert!(matches!(
        doc.clear_box_record(0, 30),
        Err(SaveError::InvalidLocation(_))
    ));
    assert!(!doc.is_modified());
}
