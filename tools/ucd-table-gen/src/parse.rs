// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Line-level parsers for the plain-text UCD files.
//!
//! Every parser here is fatal on malformed input: a corrupt data file must
//! never silently produce a corrupt runtime table.

use std::ops::RangeInclusive;

use anyhow::{Context, Result, bail};
use unicore::tables::MAX_CODE_POINT;
use unicore::ucd::{BidiClass, UnicodeCategory};

/// One parsed UnicodeData.txt record. Case mappings are kept as absolute
/// targets; [`crate::db`] turns them into validated offsets.
#[derive(Clone, Copy)]
pub struct UnicodeDataRow {
    pub code_point: u32,
    pub category: UnicodeCategory,
    pub bidi: BidiClass,
    pub decimal_digit: i8,
    pub digit: i8,
    pub numeric: f64,
    pub upper: Option<u32>,
    pub lower: Option<u32>,
    pub title: Option<u32>,
}

/// Parses UnicodeData.txt: 15 `;`-delimited fields per line, with
/// `<Name, First>`/`<Name, Last>` pairs expanded to one row per code point.
pub fn parse_unicode_data(text: &str) -> Result<Vec<UnicodeDataRow>> {
    let mut rows = Vec::new();
    let mut pending: Option<(String, UnicodeDataRow)> = None;

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let loc = || format!("UnicodeData.txt line {}", lineno + 1);

        let fields: Vec<&str> = line.split(';').collect();
        if fields.len() != 15 {
            bail!("{}: expected 15 fields, found {}", loc(), fields.len());
        }
        let row = parse_row(&fields).with_context(loc)?;
        let name = fields[1];

        // A `, First>` record must be closed by the immediately following
        // record, which repeats the base name with `, Last>`.
        if let Some((base, first)) = pending.take() {
            let Some(last_base) = name.strip_suffix(", Last>") else {
                bail!("{}: expected the `{base}, Last>` record", loc());
            };
            if last_base != base {
                bail!("{}: `{last_base}, Last>` does not match `{base}, First>`", loc());
            }
            if row.code_point < first.code_point {
                bail!("{}: range ends before U+{:04X}", loc(), first.code_point);
            }
            for code_point in first.code_point..=row.code_point {
                rows.push(UnicodeDataRow { code_point, ..first });
            }
            continue;
        }

        if let Some(base) = name.strip_suffix(", First>") {
            pending = Some((base.to_string(), row));
        } else if name.ends_with(", Last>") {
            bail!("{}: `Last` record without a matching `First` record", loc());
        } else {
            rows.push(row);
        }
    }

    if let Some((base, _)) = pending {
        bail!("UnicodeData.txt: `{base}, First>` record was never closed");
    }
    Ok(rows)
}

fn parse_row(fields: &[&str]) -> Result<UnicodeDataRow> {
    let category = fields[2];
    Ok(UnicodeDataRow {
        code_point: parse_hex(fields[0])?,
        category: UnicodeCategory::from_ucd(category)
            .with_context(|| format!("unrecognized general category {category:?}"))?,
        bidi: BidiClass::from_ucd(fields[4]),
        decimal_digit: parse_digit(fields[6]).context("decimal digit value")?,
        digit: parse_digit(fields[7]).context("digit value")?,
        numeric: parse_numeric(fields[8])?,
        upper: parse_mapping(fields[12]).context("uppercase mapping")?,
        lower: parse_mapping(fields[13]).context("lowercase mapping")?,
        title: parse_mapping(fields[14]).context("titlecase mapping")?,
    })
}

fn parse_hex(s: &str) -> Result<u32> {
    let cp = u32::from_str_radix(s.trim(), 16)
        .ok()
        .with_context(|| format!("invalid hex code point {s:?}"))?;
    if cp > MAX_CODE_POINT {
        bail!("code point U+{cp:04X} is out of range");
    }
    Ok(cp)
}

fn parse_digit(field: &str) -> Result<i8> {
    if field.is_empty() {
        return Ok(-1);
    }
    match field.parse::<i8>() {
        Ok(v @ 0..=9) => Ok(v),
        _ => bail!("invalid digit value {field:?}"),
    }
}

/// Parses the numeric value field: empty means none (-1), `num/den` fractions
/// are stored as their quotient. More than one `/` is malformed.
fn parse_numeric(field: &str) -> Result<f64> {
    if field.is_empty() {
        return Ok(-1.0);
    }
    let parse = |s: &str| {
        s.parse::<f64>().ok().with_context(|| format!("invalid numeric value {field:?}"))
    };
    match field.split('/').collect::<Vec<_>>()[..] {
        [value] => parse(value),
        [numerator, denominator] => {
            let denominator = parse(denominator)?;
            if denominator == 0.0 {
                bail!("zero denominator in numeric value {field:?}");
            }
            Ok(parse(numerator)? / denominator)
        }
        _ => bail!("more than one `/` in numeric value {field:?}"),
    }
}

fn parse_mapping(field: &str) -> Result<Option<u32>> {
    if field.is_empty() { Ok(None) } else { parse_hex(field).map(Some) }
}

/// Parses a range-property file (PropList.txt, GraphemeBreakProperty.txt,
/// emoji-data.txt): `XXXX[..YYYY] ; propName [# comment]` per line.
pub fn parse_property_ranges<'a>(
    text: &'a str,
    file: &str,
) -> Result<Vec<(RangeInclusive<u32>, &'a str)>> {
    let mut ranges = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap().trim();
        if line.is_empty() {
            continue;
        }
        let loc = || format!("{file} line {}", lineno + 1);

        let Some((range, property)) = line.split_once(';') else {
            bail!("{}: expected `code points ; property`", loc());
        };
        let property = property.trim();
        if property.is_empty() {
            bail!("{}: empty property name", loc());
        }

        let range = range.trim();
        let (first, last) = match range.split_once("..") {
            Some((first, last)) => (parse_hex(first), parse_hex(last)),
            None => (parse_hex(range), parse_hex(range)),
        };
        let (first, last) = (first.with_context(loc)?, last.with_context(loc)?);
        if first > last {
            bail!("{}: range U+{first:04X}..U+{last:04X} is inverted", loc());
        }
        ranges.push((first..=last, property));
    }

    Ok(ranges)
}

/// Parses CaseFolding.txt. Only rows with status `C` (common) or `S` (simple)
/// are one-to-one fold mappings; `F` (full) and `T` (Turkic) rows are skipped.
/// Returns `(code point, absolute fold target)` pairs.
pub fn parse_case_folding(text: &str) -> Result<Vec<(u32, u32)>> {
    let mut folds = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap().trim();
        if line.is_empty() {
            continue;
        }
        let loc = || format!("CaseFolding.txt line {}", lineno + 1);

        let fields: Vec<&str> = line.split(';').map(str::trim).collect();
        if fields.len() < 3 {
            bail!("{}: expected `code; status; mapping;`", loc());
        }
        match fields[1] {
            "C" | "S" => {
                let code_point = parse_hex(fields[0]).with_context(loc)?;
                let target = parse_hex(fields[2]).with_context(loc)?;
                folds.push((code_point, target));
            }
            "F" | "T" => {}
            status => bail!("{}: unrecognized fold status {status:?}", loc()),
        }
    }

    Ok(folds)
}
