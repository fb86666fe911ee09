// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Turns the merged database into the two runtime table families and emits
//! them, either as the raw binary blob or wrapped in Rust source for
//! embedding.

use std::fmt::Write as _;
use std::hash::Hash;

use anyhow::{Context, Result};
use indoc::writedoc;
use unicore::tables::{
    CODE_POINT_COUNT, CategoryCasingTable, NumericGraphemeTable, PropertyTrie, UnicodeTables,
};

use crate::db::{CodePointDatabase, CodePointRecord};
use crate::trie::{self, CompiledTrie};

/// Builds both table families from the database. The families are
/// independent, so they compile in parallel.
pub fn build_tables(db: &CodePointDatabase) -> Result<UnicodeTables> {
    let unassigned = CodePointRecord::UNASSIGNED;
    let mut cc = vec![unassigned.category_casing(); CODE_POINT_COUNT];
    let mut ng = vec![unassigned.numeric_grapheme(); CODE_POINT_COUNT];
    for &(cp, ref record) in db.records() {
        cc[cp as usize] = record.category_casing();
        ng[cp as usize] = record.numeric_grapheme();
    }

    let (cc_trie, ng_trie) = rayon::join(
        || compile_checked(&cc, "category/casing"),
        || compile_checked(&ng, "numeric/grapheme"),
    );
    let cc_trie = cc_trie?;
    let ng_trie = ng_trie?;

    let category_casing = CategoryCasingTable::new(
        PropertyTrie::new(cc_trie.level1, cc_trie.level2, cc_trie.level3),
        cc_trie.values.iter().map(|r| r.packed).collect(),
        cc_trie.values.iter().map(|r| r.upper).collect(),
        cc_trie.values.iter().map(|r| r.lower).collect(),
        cc_trie.values.iter().map(|r| r.title).collect(),
        cc_trie.values.iter().map(|r| r.fold).collect(),
    );
    let numeric_grapheme = NumericGraphemeTable::new(
        PropertyTrie::new(ng_trie.level1, ng_trie.level2, ng_trie.level3),
        ng_trie.values.iter().map(|r| r.digits).collect(),
        ng_trie.values.iter().map(|r| f64::from_bits(r.numeric_bits)).collect(),
        ng_trie.values.iter().map(|r| r.grapheme).collect(),
    );
    Ok(UnicodeTables::new(category_casing, numeric_grapheme))
}

fn compile_checked<T: Copy + Eq + Hash>(dense: &[T], what: &str) -> Result<CompiledTrie<T>> {
    let trie = trie::compile(dense).with_context(|| format!("{what} table"))?;
    trie::verify(&trie, dense).with_context(|| format!("{what} table"))?;
    Ok(trie)
}

/// Wraps the serialized blob in a Rust source file for embedding, with the
/// usual generated-file banner.
pub fn generate_rust(blob: &[u8], description: &str, args: &str) -> String {
    let mut buf = String::new();

    _ = writedoc!(
        buf,
        "
        // BEGIN: Generated by ucd-table-gen on {}, from {}, with {}, {} bytes
        #[rustfmt::skip]
        pub static UCD_TABLES: &[u8] = &[",
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        description,
        args,
        blob.len(),
    );
    for (j, &b) in blob.iter().enumerate() {
        if j % 16 == 0 {
            buf.push_str("\n   ");
        }
        _ = write!(buf, " 0x{b:02x},");
    }
    buf.push_str("\n];\n// END: Generated by ucd-table-gen\n");
    buf
}
