// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Runtime code point property queries on top of [`crate::tables`].
//!
//! All lookups are three array derefs into immutable tables and never
//! allocate. Malformed *arguments* (out-of-range index or code point) panic;
//! malformed *data* never reaches this module, because blobs are validated
//! on load.

use std::sync::OnceLock;

use crate::tables::{MAX_CODE_POINT, TableError, UnicodeTables};

/// The 30 Unicode general categories, in the order they are packed into the
/// category/casing table (low 5 bits of the packed byte).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum UnicodeCategory {
    UppercaseLetter,          // Lu
    LowercaseLetter,          // Ll
    TitlecaseLetter,          // Lt
    ModifierLetter,           // Lm
    OtherLetter,              // Lo
    NonSpacingMark,           // Mn
    SpacingCombiningMark,     // Mc
    EnclosingMark,            // Me
    DecimalDigitNumber,       // Nd
    LetterNumber,             // Nl
    OtherNumber,              // No
    SpaceSeparator,           // Zs
    LineSeparator,            // Zl
    ParagraphSeparator,       // Zp
    Control,                  // Cc
    Format,                   // Cf
    Surrogate,                // Cs
    PrivateUse,               // Co
    ConnectorPunctuation,     // Pc
    DashPunctuation,          // Pd
    OpenPunctuation,          // Ps
    ClosePunctuation,         // Pe
    InitialQuotePunctuation,  // Pi
    FinalQuotePunctuation,    // Pf
    OtherPunctuation,         // Po
    MathSymbol,               // Sm
    CurrencySymbol,           // Sc
    ModifierSymbol,           // Sk
    OtherSymbol,              // So
    OtherNotAssigned,         // Cn
}

impl UnicodeCategory {
    /// Maps a UnicodeData.txt general category abbreviation.
    pub fn from_ucd(abbr: &str) -> Option<Self> {
        use UnicodeCategory::*;
        Some(match abbr {
            "Lu" => UppercaseLetter,
            "Ll" => LowercaseLetter,
            "Lt" => TitlecaseLetter,
            "Lm" => ModifierLetter,
            "Lo" => OtherLetter,
            "Mn" => NonSpacingMark,
            "Mc" => SpacingCombiningMark,
            "Me" => EnclosingMark,
            "Nd" => DecimalDigitNumber,
            "Nl" => LetterNumber,
            "No" => OtherNumber,
            "Zs" => SpaceSeparator,
            "Zl" => LineSeparator,
            "Zp" => ParagraphSeparator,
            "Cc" => Control,
            "Cf" => Format,
            "Cs" => Surrogate,
            "Co" => PrivateUse,
            "Pc" => ConnectorPunctuation,
            "Pd" => DashPunctuation,
            "Ps" => OpenPunctuation,
            "Pe" => ClosePunctuation,
            "Pi" => InitialQuotePunctuation,
            "Pf" => FinalQuotePunctuation,
            "Po" => OtherPunctuation,
            "Sm" => MathSymbol,
            "Sc" => CurrencySymbol,
            "Sk" => ModifierSymbol,
            "So" => OtherSymbol,
            "Cn" => OtherNotAssigned,
            _ => return None,
        })
    }

    fn from_bits(bits: u8) -> Self {
        // Loaded tables are validated to hold only 0..=29.
        debug_assert!(bits <= 29);
        unsafe { std::mem::transmute(bits.min(29)) }
    }
}

/// The strong-direction classification of a code point.
///
/// Deliberately lossy: only {LeftToRight, RightToLeft, Other} is kept, since
/// only strong-direction queries are needed. R and AL both map to
/// [`BidiClass::RightToLeft`]. The numeric encoding is private to the table
/// format; only the three-way split is meaningful.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum BidiClass {
    Other,
    LeftToRight,
    RightToLeft,
}

impl BidiClass {
    /// Maps a UnicodeData.txt bidi class abbreviation.
    pub fn from_ucd(abbr: &str) -> Self {
        match abbr {
            "L" => BidiClass::LeftToRight,
            "R" | "AL" => BidiClass::RightToLeft,
            _ => BidiClass::Other,
        }
    }

    fn from_bits(bits: u8) -> Self {
        debug_assert!(bits <= 2);
        match bits {
            1 => BidiClass::LeftToRight,
            2 => BidiClass::RightToLeft,
            _ => BidiClass::Other,
        }
    }
}

/// Grapheme cluster boundary classes per UAX #29, plus Extended_Pictographic.
/// `Other` is the default for unlisted and unassigned code points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
#[allow(clippy::upper_case_acronyms)]
pub enum GraphemeClusterBreak {
    Other,
    CR,
    LF,
    Control,
    Extend,
    RI,
    Prepend,
    SpacingMark,
    HangulL,
    HangulV,
    HangulT,
    HangulLV,
    HangulLVT,
    ExtPic,
    ZWJ,
}

impl GraphemeClusterBreak {
    /// Maps a GraphemeBreakProperty.txt property value name.
    pub fn from_ucd(name: &str) -> Option<Self> {
        use GraphemeClusterBreak::*;
        Some(match name {
            "CR" => CR,
            "LF" => LF,
            "Control" => Control,
            "Extend" => Extend,
            "Regional_Indicator" => RI,
            "Prepend" => Prepend,
            "SpacingMark" => SpacingMark,
            "L" => HangulL,
            "V" => HangulV,
            "T" => HangulT,
            "LV" => HangulLV,
            "LVT" => HangulLVT,
            "ZWJ" => ZWJ,
            _ => return None,
        })
    }

    fn from_bits(bits: u8) -> Self {
        debug_assert!(bits <= 14);
        unsafe { std::mem::transmute(bits.min(14)) }
    }
}

/// Packs category, bidi class and the whitespace flag into the table's value
/// byte. Used by the generator; the layout is part of the data contract.
pub fn pack_properties(category: UnicodeCategory, bidi: BidiClass, whitespace: bool) -> u8 {
    (category as u8) | ((whitespace as u8) << 5) | ((bidi as u8) << 6)
}

/// Packs the decimal digit and digit values (-1..=9 each) into the table's
/// digit byte. Each nibble stores `value + 1` so 0 means "no value".
pub fn pack_digit_values(decimal: i8, digit: i8) -> u8 {
    assert!((-1..=9).contains(&decimal) && (-1..=9).contains(&digit));
    (((decimal + 1) as u8) << 4) | ((digit + 1) as u8)
}

/// Decodes the code point starting at `text[index]` in a UTF-16 code unit
/// slice, combining surrogate pairs. Returns the code point and the number of
/// code units it occupies.
///
/// Never fails on lone or out-of-order surrogates: the code unit is returned
/// as-is (a technically invalid, surrogate-range code point) with length 1.
/// Panics if `index` is out of range.
#[inline]
pub fn decode_code_point(text: &[u16], index: usize) -> (u32, usize) {
    let unit = text[index];
    if (0xD800..0xDC00).contains(&unit)
        && let Some(&low) = text.get(index + 1)
        && (0xDC00..0xE000).contains(&low)
    {
        let cp = ((unit as u32 - 0xD800) << 10) + (low as u32 - 0xDC00) + 0x10000;
        return (cp, 2);
    }
    (unit as u32, 1)
}

#[track_caller]
#[inline]
fn check_code_point(cp: u32) {
    assert!(cp <= MAX_CODE_POINT, "code point out of range: {cp:#x}");
}

impl UnicodeTables {
    #[inline]
    fn packed(&self, cp: u32) -> u8 {
        check_code_point(cp);
        self.category_casing.packed[self.category_casing.trie.value_index(cp)]
    }

    #[inline]
    fn numeric_index(&self, cp: u32) -> usize {
        check_code_point(cp);
        self.numeric_grapheme.trie.value_index(cp)
    }

    /// The general category of `cp`. Unassigned code points report
    /// [`UnicodeCategory::OtherNotAssigned`].
    #[inline]
    pub fn general_category(&self, cp: u32) -> UnicodeCategory {
        UnicodeCategory::from_bits(self.packed(cp) & 0x1F)
    }

    /// The strong-direction class of `cp`.
    #[inline]
    pub fn bidi_class(&self, cp: u32) -> BidiClass {
        BidiClass::from_bits(self.packed(cp) >> 6)
    }

    /// Whether `cp` has the White_Space property.
    #[inline]
    pub fn is_whitespace(&self, cp: u32) -> bool {
        self.packed(cp) & 0x20 != 0
    }

    /// The decimal digit value of `cp`, or -1 if it has none.
    #[inline]
    pub fn decimal_digit_value(&self, cp: u32) -> i32 {
        let digits = self.numeric_grapheme.digits[self.numeric_index(cp)];
        (digits >> 4) as i32 - 1
    }

    /// The digit value of `cp`, or -1 if it has none.
    #[inline]
    pub fn digit_value(&self, cp: u32) -> i32 {
        let digits = self.numeric_grapheme.digits[self.numeric_index(cp)];
        (digits & 0xF) as i32 - 1
    }

    /// The numeric value of `cp`, or -1.0 if it has none.
    /// May be non-integral (e.g. vulgar fractions like U+00BD).
    #[inline]
    pub fn numeric_value(&self, cp: u32) -> f64 {
        self.numeric_grapheme.numeric[self.numeric_index(cp)]
    }

    /// The grapheme cluster boundary class of `cp`.
    #[inline]
    pub fn grapheme_cluster_break(&self, cp: u32) -> GraphemeClusterBreak {
        GraphemeClusterBreak::from_bits(self.numeric_grapheme.grapheme[self.numeric_index(cp)])
    }

    /// The simple uppercase mapping of `cp`, or `cp` itself if it has none.
    /// The generator guarantees the result lies in the same plane as `cp`.
    #[inline]
    pub fn to_uppercase(&self, cp: u32) -> u32 {
        self.case_map(cp, &self.category_casing.upper)
    }

    /// The simple lowercase mapping of `cp`, or `cp` itself if it has none.
    #[inline]
    pub fn to_lowercase(&self, cp: u32) -> u32 {
        self.case_map(cp, &self.category_casing.lower)
    }

    /// The simple titlecase mapping of `cp`, or `cp` itself if it has none.
    #[inline]
    pub fn to_titlecase(&self, cp: u32) -> u32 {
        self.case_map(cp, &self.category_casing.title)
    }

    /// The simple case folding of `cp`, or `cp` itself if it has none.
    #[inline]
    pub fn case_fold(&self, cp: u32) -> u32 {
        self.case_map(cp, &self.category_casing.fold)
    }

    #[inline]
    fn case_map(&self, cp: u32, offsets: &[i32]) -> u32 {
        check_code_point(cp);
        let offset = offsets[self.category_casing.trie.value_index(cp)];
        cp.wrapping_add_signed(offset)
    }

    /// [`Self::general_category`] of the code point at `text[index]`.
    #[inline]
    pub fn general_category_at(&self, text: &[u16], index: usize) -> UnicodeCategory {
        self.general_category(decode_code_point(text, index).0)
    }

    /// [`Self::is_whitespace`] of the code point at `text[index]`.
    #[inline]
    pub fn is_whitespace_at(&self, text: &[u16], index: usize) -> bool {
        self.is_whitespace(decode_code_point(text, index).0)
    }

    /// [`Self::decimal_digit_value`] of the code point at `text[index]`.
    #[inline]
    pub fn decimal_digit_value_at(&self, text: &[u16], index: usize) -> i32 {
        self.decimal_digit_value(decode_code_point(text, index).0)
    }

    /// [`Self::digit_value`] of the code point at `text[index]`.
    #[inline]
    pub fn digit_value_at(&self, text: &[u16], index: usize) -> i32 {
        self.digit_value(decode_code_point(text, index).0)
    }

    /// [`Self::numeric_value`] of the code point at `text[index]`.
    #[inline]
    pub fn numeric_value_at(&self, text: &[u16], index: usize) -> f64 {
        self.numeric_value(decode_code_point(text, index).0)
    }
}

static TABLES: OnceLock<UnicodeTables> = OnceLock::new();

/// Installs the process-wide property tables from a serialized blob.
///
/// The first successful install wins; later calls validate their argument and
/// then return the already-installed tables. The tables are immutable and may
/// be read from any thread without locking.
pub fn install_tables(blob: &[u8]) -> Result<&'static UnicodeTables, TableError> {
    let parsed = UnicodeTables::from_bytes(blob)?;
    Ok(TABLES.get_or_init(|| parsed))
}

/// The process-wide property tables, if [`install_tables`] has been called.
pub fn tables() -> Option<&'static UnicodeTables> {
    TABLES.get()
}
