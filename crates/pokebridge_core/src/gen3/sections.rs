use std::io::Cursor;

use crate::error::SaveError;
use crate::layout::{ByteRange, SectionLayout, SlotId, SlotLayout};
use crate::reader::{LittleEndianReader, put_u16, put_u32};

use super::types::{
    FOOTER_CHECKSUM_OFFSET, FOOTER_COUNTER_OFFSET, FOOTER_ID_OFFSET, FOOTER_SIGNATURE_OFFSET,
    SECTION_COUNT, SECTION_PAYLOAD_SIZES, SECTION_SIGNATURE, SECTION_SIZE,
};

/// Section ids whose payloads concatenate into SaveBlock1.
pub const SAVE_BLOCK1_SECTIONS: std::ops::RangeInclusive<u16> = 1..=4;
/// Section ids whose payloads concatenate into PC storage.
pub const STORAGE_SECTIONS: std::ops::RangeInclusive<u16> = 5..=13;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    pub id: u16,
    pub checksum: u16,
    pub signature: u32,
    pub counter: u32,
}

impl Footer {
    pub fn parse(section: &[u8]) -> Result<Self, SaveError> {
        if section.len() != SECTION_SIZE {
            return Err(SaveError::MalformedBlock {
                expected: SECTION_SIZE,
                actual: section.len(),
            });
        }
        let mut r = LittleEndianReader::new(Cursor::new(section));
        r.seek_to(FOOTER_ID_OFFSET as u64)?;
        let id = r.read_u16()?;
        let checksum = r.read_u16()?;
        let signature = r.read_u32()?;
        let counter = r.read_u32()?;
        Ok(Self {
            id,
            checksum,
            signature,
            counter,
        })
    }

    pub fn is_signed(&self) -> bool {
        self.signature == SECTION_SIGNATURE && (self.id as usize) < SECTION_COUNT
    }
}

/// One section's full 4 KiB, footer included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionBlob {
    pub bytes: Vec<u8>,
}

impl SectionBlob {
    pub fn id(&self) -> u16 {
        crate::reader::u16_at(&self.bytes, FOOTER_ID_OFFSET)
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes[..payload_len(self.id())]
    }

    pub fn payload_mut(&mut self) -> &mut [u8] {
        let len = payload_len(self.id());
        &mut self.bytes[..len]
    }

    pub fn stored_checksum(&self) -> u16 {
        crate::reader::u16_at(&self.bytes, FOOTER_CHECKSUM_OFFSET)
    }

    pub fn computed_checksum(&self) -> u16 {
        checksum(self.payload())
    }
}

pub fn payload_len(id: u16) -> usize {
    SECTION_PAYLOAD_SIZES
        .get(id as usize)
        .copied()
        .unwrap_or(0)
}

/// Word-sum of the payload folded to 16 bits.
pub fn checksum(payload: &[u8]) -> u16 {
    let sum = payload
        .chunks(4)
        .map(|chunk| {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            u32::from_le_bytes(word)
        })
        .fold(0u32, u32::wrapping_add);
    ((sum >> 16).wrapping_add(sum & 0xFFFF)) as u16
}

/// Scan one slot. Returns `None` for a blank slot: a missing signature or a
/// set of ids that is not a permutation of 0..14.
pub fn scan_slot(image: &[u8], slot: SlotId) -> Result<Option<SlotLayout>, SaveError> {
    let base = slot.base_offset();
    let mut sections = Vec::with_capacity(SECTION_COUNT);
    let mut seen = [false; SECTION_COUNT];
    let mut counter = None;
    let mut rotation = 0;

    for physical_index in 0..SECTION_COUNT {
        let start = base + physical_index * SECTION_SIZE;
        let end = start + SECTION_SIZE;
        let footer = Footer::parse(&image[start..end])?;
        if !footer.is_signed() || seen[footer.id as usize] {
            return Ok(None);
        }
        seen[footer.id as usize] = true;
        if footer.id == 0 {
            rotation = physical_index;
            counter = Some(footer.counter);
        }
        sections.push(SectionLayout {
            id: footer.id,
            physical_index,
            range: ByteRange { start, end },
        });
    }

    let Some(counter) = counter else {
        return Ok(None);
    };
    Ok(Some(SlotLayout {
        slot,
        counter,
        rotation,
        sections,
    }))
}

/// Capture a slot's sections indexed by id.
pub fn capture_blobs(image: &[u8], layout: &SlotLayout) -> Result<Vec<SectionBlob>, SaveError> {
    (0..SECTION_COUNT as u16)
        .map(|id| {
            let section = layout.section(id).ok_or_else(|| {
                SaveError::UnknownFormatVersion(format!(
                    "slot {} is missing section {id}",
                    layout.slot
                ))
            })?;
            Ok(SectionBlob {
                bytes: image[section.range.start..section.range.end].to_vec(),
            })
        })
        .collect()
}

/// Verify every section of a slot against its stored checksum.
pub fn verify_checksums(layout: &SlotLayout, blobs: &[SectionBlob]) -> Result<(), SaveError> {
    for blob in blobs {
        let stored = blob.stored_checksum();
        let computed = blob.computed_checksum();
        if stored != computed {
            return Err(SaveError::ChecksumMismatch {
                slot: layout.slot,
                section_id: blob.id(),
                stored,
                computed,
            });
        }
    }
    Ok(())
}

/// Concatenate the payloads of a run of sections.
pub fn region_read(blobs: &[SectionBlob], ids: std::ops::RangeInclusive<u16>) -> Vec<u8> {
    let mut out = Vec::new();
    for id in ids {
        if let Some(blob) = blobs.get(id as usize) {
            out.extend_from_slice(blob.payload());
        }
    }
    out
}

/// Scatter a concatenated region back into its sections' payloads.
pub fn region_write(
    blobs: &mut [SectionBlob],
    ids: std::ops::RangeInclusive<u16>,
    region: &[u8],
) -> Result<(), SaveError> {
    let expected: usize = ids.clone().map(payload_len).sum();
    if region.len() != expected {
        return Err(SaveError::MalformedBlock {
            expected,
            actual: region.len(),
        });
    }

    let mut cursor = 0;
    for id in ids {
        let blob = blobs.get_mut(id as usize).ok_or_else(|| {
            SaveError::UnknownFormatVersion(format!("missing section {id}"))
        })?;
        let len = payload_len(id);
        blob.payload_mut()
            .copy_from_slice(&region[cursor..cursor + len]);
        cursor += len;
    }
    Ok(())
}

/// Write one section into `out` at its physical position, refreshing the
/// footer. Bytes between the payload and the footer are kept from `blob`.
pub fn write_section(out: &mut [u8], start: usize, blob: &SectionBlob, counter: u32) {
    let section = &mut out[start..start + SECTION_SIZE];
    section.copy_from_slice(&blob.bytes);
    put_u16(section, FOOTER_ID_OFFSET, blob.id());
    put_u16(section, FOOTER_CHECKSUM_OFFSET, blob.computed_checksum());
    put_u32(section, FOOTER_SIGNATURE_OFFSET, SECTION_SIGNATURE);
    put_u32(section, FOOTER_COUNTER_OFFSET, counter);
}

/// Newer of two save counters, accounting for 32-bit wraparound.
/// Returns `None` when they are equal. Counters exactly half the range
/// apart are ambiguous; the larger raw value wins.
pub fn newer_counter(a: u32, b: u32) -> Option<SlotId> {
    if a == b {
        return None;
    }
    let distance = a.wrapping_sub(b);
    let a_ahead = distance < 0x8000_0000 || (distance == 0x8000_0000 && a > b);
    Some(if a_ahead { SlotId::A } else { SlotId::B })
}
