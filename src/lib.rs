// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Compact Unicode property tables plus UTF-8 validation and transcoding.
//!
//! The tables consumed by [`ucd`] are produced by the offline `ucd-table-gen`
//! tool in this repository, which compiles the plain-text Unicode Character
//! Database files into the 3-level trie format defined in [`tables`].

pub mod tables;
pub mod transcode;
pub mod ucd;
pub mod utf8;
