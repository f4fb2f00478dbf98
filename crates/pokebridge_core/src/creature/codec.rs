//! Encryption and substructure ordering for the 48-byte data region of a
//! creature record.
//!
//! The four 12-byte substructures are stored in one of 24 orders selected by
//! `pid % 24`, and every 32-bit little-endian word is XORed with
//! `pid ^ otid`. Both directions are total for a correctly sized block. The
//! codec never validates what it decrypts: a wrong key or order yields
//! garbage, which callers detect from the decoded values.

use serde::{Deserialize, Serialize};

use crate::error::SaveError;

pub const SUBSTRUCTURE_LEN: usize = 12;
pub const SUBSTRUCTURE_COUNT: usize = 4;
pub const ENCRYPTED_LEN: usize = SUBSTRUCTURE_LEN * SUBSTRUCTURE_COUNT;

pub type Substructure = [u8; SUBSTRUCTURE_LEN];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubstructureKind {
    Growth,
    Attacks,
    Condition,
    Misc,
}

impl SubstructureKind {
    pub const ALL: [SubstructureKind; SUBSTRUCTURE_COUNT] = [
        SubstructureKind::Growth,
        SubstructureKind::Attacks,
        SubstructureKind::Condition,
        SubstructureKind::Misc,
    ];

    /// Index of this substructure in logical (decoded) order.
    pub fn index(self) -> usize {
        match self {
            Self::Growth => 0,
            Self::Attacks => 1,
            Self::Condition => 2,
            Self::Misc => 3,
        }
    }
}

mod orders {
    use super::SubstructureKind::{Attacks as A, Condition as E, Growth as G, Misc as M};
    use super::{SUBSTRUCTURE_COUNT, SubstructureKind};

    pub(super) const TABLE: [[SubstructureKind; SUBSTRUCTURE_COUNT]; 24] = [
        [G, A, E, M],
        [G, A, M, E],
        [G, E, A, M],
        [G, E, M, A],
        [G, M, A, E],
        [G, M, E, A],
        [A, G, E, M],
        [A, G, M, E],
        [A, E, G, M],
        [A, E, M, G],
        [A, M, G, E],
        [A, M, E, G],
        [E, G, A, M],
        [E, G, M, A],
        [E, A, G, M],
        [E, A, M, G],
        [E, M, G, A],
        [E, M, A, G],
        [M, G, A, E],
        [M, G, E, A],
        [M, A, G, E],
        [M, A, E, G],
        [M, E, G, A],
        [M, E, A, G],
    ];
}

pub fn permutation_index(pid: u32) -> usize {
    (pid % 24) as usize
}

/// On-disk order of the substructures for a given personality value.
pub fn order(pid: u32) -> [SubstructureKind; SUBSTRUCTURE_COUNT] {
    orders::TABLE[permutation_index(pid)]
}

pub fn key(pid: u32, otid: u32) -> u32 {
    pid ^ otid
}

/// XOR every 32-bit word of the block with `key`. Applying it twice with the
/// same key restores the input.
pub fn apply_key_stream(block: &mut [u8; ENCRYPTED_LEN], key: u32) {
    for word in block.chunks_exact_mut(4) {
        let value = u32::from_le_bytes([word[0], word[1], word[2], word[3]]) ^ key;
        word.copy_from_slice(&value.to_le_bytes());
    }
}

pub fn decrypt(
    raw_block: &[u8],
    pid: u32,
    otid: u32,
) -> Result<[Substructure; SUBSTRUCTURE_COUNT], SaveError> {
    let block: &[u8; ENCRYPTED_LEN] =
        raw_block
            .try_into()
            .map_err(|_| SaveError::MalformedBlock {
                expected: ENCRYPTED_LEN,
                actual: raw_block.len(),
            })?;
    Ok(decrypt_block(block, pid, otid))
}

pub fn decrypt_block(
    raw_block: &[u8; ENCRYPTED_LEN],
    pid: u32,
    otid: u32,
) -> [Substructure; SUBSTRUCTURE_COUNT] {
    let mut block = *raw_block;
    apply_key_stream(&mut block, key(pid, otid));

    let mut out = [[0u8; SUBSTRUCTURE_LEN]; SUBSTRUCTURE_COUNT];
    for (position, kind) in order(pid).iter().enumerate() {
        let start = position * SUBSTRUCTURE_LEN;
        out[kind.index()].copy_from_slice(&block[start..start + SUBSTRUCTURE_LEN]);
    }
    out
}

pub fn encrypt(
    substructures: &[Substructure; SUBSTRUCTURE_COUNT],
    pid: u32,
    otid: u32,
) -> [u8; ENCRYPTED_LEN] {
    let mut block = [0u8; ENCRYPTED_LEN];
    for (position, kind) in order(pid).iter().enumerate() {
        let start = position * SUBSTRUCTURE_LEN;
        block[start..start + SUBSTRUCTURE_LEN].copy_from_slice(&substructures[kind.index()]);
    }
    apply_key_stream(&mut block, key(pid, otid));
    block
}

/// Record checksum: wrapping sum of the decrypted data as u16 words. The sum
/// does not depend on substructure order.
pub fn checksum(substructures: &[Substructure; SUBSTRUCTURE_COUNT]) -> u16 {
    substructures
        .iter()
        .flat_map(|sub| sub.chunks_exact(2))
        .fold(0u16, |acc, word| {
            acc.wrapping_add(u16::from_le_bytes([word[0], word[1]]))
        })
}
