// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Compacts a dense per-code-point value array into the fixed 3-level trie
//! of the table format.
//!
//! The entire point of the trie is block deduplication: the code point space
//! has 0x110000 entries but very little property variety, so the huge
//! contiguous unassigned ranges all collapse onto shared blocks. A flat table
//! would be ~1.1 MB per property family; deduplicated it is low tens of KB.

use std::collections::HashMap;
use std::hash::Hash;

use anyhow::{Result, bail};
use unicore::tables::{CODE_POINT_COUNT, LEVEL2_BLOCK_LEN, LEVEL3_BLOCK_LEN};

/// The compacted trie plus its deduplicated value records, ready to be split
/// into the parallel values arrays of the table format.
pub struct CompiledTrie<T> {
    pub level1: Vec<u8>,
    pub level2: Vec<u16>,
    pub level3: Vec<u8>,
    /// Unique value records in first-seen order; `level3` holds indices into
    /// this.
    pub values: Vec<T>,
}

/// Builds the trie from a dense array covering the full code point space.
///
/// All three deduplication passes are first-seen-wins: iteration is in code
/// point order and insertion order decides which earlier identical block an
/// index points at, which also makes the output deterministic.
pub fn compile<T: Copy + Eq + Hash>(dense: &[T]) -> Result<CompiledTrie<T>> {
    assert_eq!(dense.len(), CODE_POINT_COUNT);

    // Deduplicate the value records themselves, leaving one index per
    // code point.
    let mut values = Vec::new();
    let mut seen = HashMap::new();
    let mut indices = Vec::with_capacity(dense.len());
    for &value in dense {
        let next = values.len();
        let index = *seen.entry(value).or_insert(next);
        if index == next {
            values.push(value);
        }
        indices.push(index);
    }
    if values.len() > 0x100 {
        bail!("{} unique value records exceed the 256 a level-3 byte can address", values.len());
    }
    let indices: Vec<u8> = indices.into_iter().map(|i| i as u8).collect();

    // Level 3: blocks of 16 value indices. Level-2 entries are u16, capping
    // the unique block count at 65536.
    let (level3, level3_blocks) = dedup_blocks(&indices, LEVEL3_BLOCK_LEN);
    let unique = level3.len() / LEVEL3_BLOCK_LEN;
    if unique > usize::from(u16::MAX) + 1 {
        bail!("{unique} unique level-3 blocks exceed the level-2 index range");
    }
    let level3_blocks: Vec<u16> = level3_blocks.into_iter().map(|i| i as u16).collect();

    // Level 2: blocks of 32 level-3 block indices. Level-1 entries are u8.
    let (level2, level2_blocks) = dedup_blocks(&level3_blocks, LEVEL2_BLOCK_LEN);
    let unique = level2.len() / LEVEL2_BLOCK_LEN;
    if unique > 0x100 {
        bail!("{unique} unique level-2 blocks exceed the 256 a level-1 byte can address");
    }
    let level1: Vec<u8> = level2_blocks.into_iter().map(|i| i as u8).collect();

    Ok(CompiledTrie { level1, level2, level3, values })
}

/// Splits `flat` into fixed-size blocks, deduplicates byte-identical blocks
/// (first-seen-wins) and returns the concatenated unique blocks plus the
/// per-block index sequence.
fn dedup_blocks<T: Copy + Eq + Hash>(flat: &[T], block_len: usize) -> (Vec<T>, Vec<usize>) {
    debug_assert_eq!(flat.len() % block_len, 0);

    let mut unique = Vec::new();
    let mut seen: HashMap<&[T], usize> = HashMap::new();
    let mut blocks = Vec::with_capacity(flat.len() / block_len);

    for chunk in flat.chunks_exact(block_len) {
        let next = seen.len();
        let index = *seen.entry(chunk).or_insert(next);
        if index == next {
            unique.extend_from_slice(chunk);
        }
        blocks.push(index);
    }

    (unique, blocks)
}

/// Walks the trie for every code point and compares the result against the
/// dense input. Run after every build; a mismatch means the builder is
/// broken, not the data.
pub fn verify<T: Copy + Eq>(trie: &CompiledTrie<T>, dense: &[T]) -> Result<()> {
    for (cp, &expected) in dense.iter().enumerate() {
        let i = trie.level1[cp >> 9] as usize;
        let i = trie.level2[(i << 5) | ((cp >> 4) & 0x1F)] as usize;
        let v = trie.level3[(i << 4) | (cp & 0xF)] as usize;
        if trie.values[v] != expected {
            bail!("trie self-check failed for U+{cp:04X}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(trie: &CompiledTrie<u32>, cp: usize) -> u32 {
        let i = trie.level1[cp >> 9] as usize;
        let i = trie.level2[(i << 5) | ((cp >> 4) & 0x1F)] as usize;
        let v = trie.level3[(i << 4) | (cp & 0xF)] as usize;
        trie.values[v]
    }

    #[test]
    fn uniform_input_collapses_to_single_blocks() {
        let dense = vec![7u32; CODE_POINT_COUNT];
        let trie = compile(&dense).unwrap();
        assert_eq!(trie.values, vec![7]);
        assert_eq!(trie.level3.len(), LEVEL3_BLOCK_LEN);
        assert_eq!(trie.level2.len(), LEVEL2_BLOCK_LEN);
        assert_eq!(trie.level1.len(), CODE_POINT_COUNT >> 9);
        assert!(trie.level1.iter().all(|&b| b == 0));
        verify(&trie, &dense).unwrap();
    }

    #[test]
    fn sparse_input_roundtrips() {
        let mut dense = vec![0u32; CODE_POINT_COUNT];
        // A few scattered ranges with distinct values, crossing block and
        // plane boundaries.
        for cp in 0x41..0x5B {
            dense[cp] = 1;
        }
        for cp in 0xAC00..0xD7A4 {
            dense[cp] = 2;
        }
        for cp in 0x10400..0x10450 {
            dense[cp] = 3;
        }
        dense[0x10FFFF] = 4;

        let trie = compile(&dense).unwrap();
        verify(&trie, &dense).unwrap();
        for &cp in &[0x0usize, 0x40, 0x41, 0x5A, 0x5B, 0xABFF, 0xAC00, 0xD7A3, 0x10400, 0x10FFFF]
        {
            assert_eq!(lookup(&trie, cp), dense[cp], "U+{cp:04X}");
        }
        // Far smaller than the flat mapping, or the dedup did nothing.
        assert!(trie.level3.len() < 0x1000);
    }

    #[test]
    fn dedup_is_first_seen_wins() {
        let (unique, blocks) = dedup_blocks(&[1, 1, 2, 2, 1, 1, 3, 3], 2);
        assert_eq!(unique, vec![1, 1, 2, 2, 3, 3]);
        assert_eq!(blocks, vec![0, 1, 0, 2]);
    }

    #[test]
    fn rebuilds_are_byte_identical() {
        let mut dense = vec![0u32; CODE_POINT_COUNT];
        for (cp, v) in dense.iter_mut().enumerate() {
            *v = match cp {
                0x100..0x200 => 1,
                0x20000..0x2F000 => 2,
                _ => 0,
            };
        }
        let a = compile(&dense).unwrap();
        let b = compile(&dense).unwrap();
        assert_eq!(a.level1, b.level1);
        assert_eq!(a.level2, b.level2);
        assert_eq!(a.level3, b.level3);
        assert_eq!(a.values, b.values);
    }

    #[test]
    fn rejects_too_many_values() {
        let mut dense = vec![0u32; CODE_POINT_COUNT];
        for (cp, v) in dense.iter_mut().enumerate().take(0x101) {
            *v = cp as u32;
        }
        assert!(compile(&dense).is_err());
    }
}
