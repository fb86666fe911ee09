// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Folds the primary UnicodeData records and the ancillary property files
//! into one ordered sequence of per-code-point records.

use std::ops::RangeInclusive;

use anyhow::{Context, Result, bail};
use unicore::tables::CODE_POINT_COUNT;
use unicore::ucd::{
    BidiClass, GraphemeClusterBreak, UnicodeCategory, pack_digit_values, pack_properties,
};

use crate::parse::UnicodeDataRow;

/// The canonical per-code-point record, merged from all source files.
/// Code points absent from UnicodeData.txt implicitly carry
/// [`CodePointRecord::UNASSIGNED`] and are never materialized.
#[derive(Clone, Copy)]
pub struct CodePointRecord {
    pub category: UnicodeCategory,
    pub bidi: BidiClass,
    pub whitespace: bool,
    /// Signed deltas; 0 means no mapping. The mapping target is
    /// `code point + offset` and never crosses a plane boundary.
    pub upper_offset: i32,
    pub lower_offset: i32,
    pub title_offset: i32,
    pub fold_offset: i32,
    pub decimal_digit: i8,
    pub digit: i8,
    pub numeric: f64,
    pub grapheme: GraphemeClusterBreak,
}

impl CodePointRecord {
    pub const UNASSIGNED: Self = Self {
        category: UnicodeCategory::OtherNotAssigned,
        bidi: BidiClass::Other,
        whitespace: false,
        upper_offset: 0,
        lower_offset: 0,
        title_offset: 0,
        fold_offset: 0,
        decimal_digit: -1,
        digit: -1,
        numeric: -1.0,
        grapheme: GraphemeClusterBreak::Other,
    };

    /// The value record this code point contributes to the category/casing
    /// table family.
    pub fn category_casing(&self) -> CategoryCasingRecord {
        CategoryCasingRecord {
            packed: pack_properties(self.category, self.bidi, self.whitespace),
            upper: self.upper_offset,
            lower: self.lower_offset,
            title: self.title_offset,
            fold: self.fold_offset,
        }
    }

    /// The value record this code point contributes to the numeric/grapheme
    /// table family.
    pub fn numeric_grapheme(&self) -> NumericGraphemeRecord {
        NumericGraphemeRecord {
            digits: pack_digit_values(self.decimal_digit, self.digit),
            // Stored as bits so the record is hashable.
            numeric_bits: self.numeric.to_bits(),
            grapheme: self.grapheme as u8,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CategoryCasingRecord {
    pub packed: u8,
    pub upper: i32,
    pub lower: i32,
    pub title: i32,
    pub fold: i32,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NumericGraphemeRecord {
    pub digits: u8,
    pub numeric_bits: u64,
    pub grapheme: u8,
}

/// The ancillary property maps folded into the primary records.
#[derive(Default)]
pub struct AncillaryData {
    pub whitespace: Vec<RangeInclusive<u32>>,
    /// `(code point, absolute fold target)` from CaseFolding.txt.
    pub case_folds: Vec<(u32, u32)>,
    pub graphemes: Vec<(RangeInclusive<u32>, GraphemeClusterBreak)>,
    /// Extended_Pictographic ranges; these override any grapheme class
    /// previously assigned to the same code point.
    pub extended_pictographic: Vec<RangeInclusive<u32>>,
}

pub struct CodePointDatabase {
    records: Vec<(u32, CodePointRecord)>,
}

impl CodePointDatabase {
    /// Merges the sources into one record per primary-file code point,
    /// ordered by code point. Validates the case-mapping plane invariant and
    /// that the primary file is sorted.
    pub fn build(primary: &[UnicodeDataRow], ancillary: &AncillaryData) -> Result<Self> {
        let mut whitespace = vec![false; CODE_POINT_COUNT];
        for range in &ancillary.whitespace {
            whitespace[*range.start() as usize..=*range.end() as usize].fill(true);
        }

        let mut fold = vec![None; CODE_POINT_COUNT];
        for &(cp, target) in &ancillary.case_folds {
            fold[cp as usize] = Some(target);
        }

        let mut grapheme = vec![GraphemeClusterBreak::Other; CODE_POINT_COUNT];
        for (range, class) in &ancillary.graphemes {
            grapheme[*range.start() as usize..=*range.end() as usize].fill(*class);
        }
        for range in &ancillary.extended_pictographic {
            grapheme[*range.start() as usize..=*range.end() as usize]
                .fill(GraphemeClusterBreak::ExtPic);
        }

        let mut records = Vec::with_capacity(primary.len());
        let mut prev = None;
        for row in primary {
            let cp = row.code_point;
            if prev >= Some(cp) {
                bail!("UnicodeData.txt is not sorted at U+{cp:04X}");
            }
            prev = Some(cp);

            let record = CodePointRecord {
                category: row.category,
                bidi: row.bidi,
                whitespace: whitespace[cp as usize],
                upper_offset: case_offset(cp, row.upper)
                    .with_context(|| format!("uppercase mapping of U+{cp:04X}"))?,
                lower_offset: case_offset(cp, row.lower)
                    .with_context(|| format!("lowercase mapping of U+{cp:04X}"))?,
                title_offset: case_offset(cp, row.title)
                    .with_context(|| format!("titlecase mapping of U+{cp:04X}"))?,
                fold_offset: case_offset(cp, fold[cp as usize])
                    .with_context(|| format!("case folding of U+{cp:04X}"))?,
                decimal_digit: row.decimal_digit,
                digit: row.digit,
                numeric: row.numeric,
                grapheme: grapheme[cp as usize],
            };
            records.push((cp, record));
        }

        Ok(Self { records })
    }

    /// The merged records, sorted by code point.
    pub fn records(&self) -> &[(u32, CodePointRecord)] {
        &self.records
    }
}

/// Turns an absolute mapping target into a signed offset, enforcing that the
/// mapping never leaves the 64K plane of its source code point. The runtime
/// relies on this when it adds offsets without re-validating the result.
fn case_offset(cp: u32, target: Option<u32>) -> Result<i32> {
    let Some(target) = target else {
        return Ok(0);
    };
    if target >> 16 != cp >> 16 {
        bail!("mapping target U+{target:04X} is not in the plane of U+{cp:04X}");
    }
    Ok(target as i32 - cp as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code_point: u32, category: UnicodeCategory) -> UnicodeDataRow {
        UnicodeDataRow {
            code_point,
            category,
            bidi: BidiClass::Other,
            decimal_digit: -1,
            digit: -1,
            numeric: -1.0,
            upper: None,
            lower: None,
            title: None,
        }
    }

    #[test]
    fn overlays_merge_in_order() {
        let primary = [
            row(0x20, UnicodeCategory::SpaceSeparator),
            row(0x41, UnicodeCategory::UppercaseLetter),
            row(0x1F600, UnicodeCategory::OtherSymbol),
        ];
        let ancillary = AncillaryData {
            whitespace: vec![0x20..=0x20],
            case_folds: vec![(0x41, 0x61)],
            // Extended_Pictographic wins over the plain grapheme class.
            graphemes: vec![(0x1F600..=0x1F600, GraphemeClusterBreak::Extend)],
            extended_pictographic: vec![0x1F600..=0x1F600],
        };
        let db = CodePointDatabase::build(&primary, &ancillary).unwrap();
        let records = db.records();

        assert_eq!(records.len(), 3);
        assert!(records[0].1.whitespace);
        assert!(!records[1].1.whitespace);
        assert_eq!(records[1].1.fold_offset, 0x20);
        assert_eq!(records[2].1.grapheme, GraphemeClusterBreak::ExtPic);
    }

    #[test]
    fn rejects_unsorted_primary() {
        let primary =
            [row(0x42, UnicodeCategory::UppercaseLetter), row(0x41, UnicodeCategory::UppercaseLetter)];
        assert!(CodePointDatabase::build(&primary, &AncillaryData::default()).is_err());
    }

    #[test]
    fn rejects_plane_crossing_mappings() {
        let mut bad = row(0xFFFF, UnicodeCategory::UppercaseLetter);
        bad.lower = Some(0x10000);
        assert!(CodePointDatabase::build(&[bad], &AncillaryData::default()).is_err());

        // Within one plane, even a large offset is fine.
        let mut ok = row(0x10400, UnicodeCategory::UppercaseLetter);
        ok.lower = Some(0x10428);
        let db = CodePointDatabase::build(&[ok], &AncillaryData::default()).unwrap();
        assert_eq!(db.records()[0].1.lower_offset, 0x28);
    }
}
