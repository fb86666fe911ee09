// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Compiles the plain-text Unicode Character Database files into the compact
//! 3-level trie tables consumed by the `unicore` runtime.

mod db;
mod emit;
mod parse;
mod trie;

use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use unicore::ucd::GraphemeClusterBreak;

use crate::db::{AncillaryData, CodePointDatabase};

#[derive(Clone, Copy, Default)]
enum Format {
    #[default]
    Binary,
    Rust,
}

const HELP: &str = "\
Usage: ucd-table-gen [options...] <ucd-directory>
  -h, --help            Prints help information
  --lang=<bin|rust>     Output format (default: bin)
  -o, --out <path>      Output path (default: ucd_tables.bin, or stdout for rust)

<ucd-directory> must contain UnicodeData.txt, PropList.txt, CaseFolding.txt,
GraphemeBreakProperty.txt and emoji-data.txt. The latter two are also found in
the auxiliary/ and emoji/ subdirectories, matching the UCD zip layout.

Download the UCD at:
  https://www.unicode.org/Public/UCD/latest/ucd/
";

fn main() -> anyhow::Result<()> {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        eprint!("{HELP}");
        return Ok(());
    }

    let arg_lang = args
        .opt_value_from_fn("--lang", |arg| match arg {
            "bin" => Ok(Format::Binary),
            "rust" => Ok(Format::Rust),
            l => bail!("invalid output format: \"{}\"", l),
        })?
        .unwrap_or_default();
    let arg_out: Option<PathBuf> =
        args.opt_value_from_os_str(["-o", "--out"], |s| -> Result<PathBuf, &'static str> {
            Ok(s.into())
        })?;
    let arg_dir =
        args.free_from_os_str(|s| -> Result<PathBuf, &'static str> { Ok(s.into()) })?;
    let arg_remaining = args.finish();
    if !arg_remaining.is_empty() {
        bail!("unrecognized arguments: {:?}", arg_remaining);
    }

    let unicode_data = read_ucd_file(&arg_dir, "UnicodeData.txt", &[])?;
    let prop_list = read_ucd_file(&arg_dir, "PropList.txt", &[])?;
    let case_folding = read_ucd_file(&arg_dir, "CaseFolding.txt", &[])?;
    let grapheme_break = read_ucd_file(&arg_dir, "GraphemeBreakProperty.txt", &["auxiliary"])?;
    let emoji_data = read_ucd_file(&arg_dir, "emoji-data.txt", &["emoji"])?;

    // Ancillary files first, then the primary file, then the merge.
    let whitespace = parse::parse_property_ranges(&prop_list, "PropList.txt")?
        .into_iter()
        .filter(|(_, property)| *property == "White_Space")
        .map(|(range, _)| range)
        .collect();
    let case_folds = parse::parse_case_folding(&case_folding)?;
    let mut graphemes = Vec::new();
    for (range, name) in
        parse::parse_property_ranges(&grapheme_break, "GraphemeBreakProperty.txt")?
    {
        let Some(class) = GraphemeClusterBreak::from_ucd(name) else {
            bail!(
                "GraphemeBreakProperty.txt: unrecognized class {:?} for U+{:04X} to U+{:04X}",
                name,
                range.start(),
                range.end()
            );
        };
        graphemes.push((range, class));
    }
    let extended_pictographic = parse::parse_property_ranges(&emoji_data, "emoji-data.txt")?
        .into_iter()
        .filter(|(_, property)| *property == "Extended_Pictographic")
        .map(|(range, _)| range)
        .collect();

    let primary = parse::parse_unicode_data(&unicode_data)?;
    let ancillary = AncillaryData { whitespace, case_folds, graphemes, extended_pictographic };
    let database = CodePointDatabase::build(&primary, &ancillary)?;
    let tables = emit::build_tables(&database)?;
    let blob = tables.to_bytes();

    eprintln!("{} code point records, {} bytes serialized", database.records().len(), blob.len());

    match arg_lang {
        Format::Binary => {
            let path = arg_out.unwrap_or_else(|| PathBuf::from("ucd_tables.bin"));
            std::fs::write(&path, &blob)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        Format::Rust => {
            let buf = emit::generate_rust(&blob, &ucd_description(&prop_list), "--lang=rust");
            match arg_out {
                Some(path) => std::fs::write(&path, buf)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => std::io::stdout().write_all(buf.as_bytes())?,
            }
        }
    }
    Ok(())
}

/// Reads one UCD file, trying the given subdirectories after the root, so
/// both a flattened directory and the official zip layout work.
fn read_ucd_file(dir: &Path, name: &str, subdirs: &[&str]) -> anyhow::Result<String> {
    let mut path = dir.join(name);
    for sub in subdirs {
        if path.exists() {
            break;
        }
        path = dir.join(sub).join(name);
    }
    std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))
}

/// The UCD identifies its version in the leading comment of every ancillary
/// file, e.g. `# PropList-16.0.0.txt`.
fn ucd_description(prop_list: &str) -> String {
    prop_list
        .lines()
        .next()
        .and_then(|line| line.strip_prefix('#'))
        .map(|line| line.trim().to_string())
        .unwrap_or_else(|| "unknown UCD version".to_string())
}
