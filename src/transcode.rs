// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Chunked, resumable UTF-8 <-> UTF-16 transcoding.
//!
//! Both directions operate on caller-supplied fixed-capacity buffers and
//! report how far they got, so a caller can stream arbitrarily large inputs
//! through small buffers: on [`Status::NeedMoreData`] the unconsumed tail of
//! the source must be prepended to the next chunk; on
//! [`Status::DestinationTooSmall`] the destination must be drained and the
//! call repeated with the unconsumed source. Ill-formed input is an expected
//! data condition, reported as a status or substituted with U+FFFD, never a
//! panic.

use crate::utf8::{Seq, decode_sequence};

/// How a transcoding call ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// The entire source was consumed.
    Done,
    /// The destination filled up before the source ran out.
    DestinationTooSmall,
    /// The source ended inside a so-far-valid sequence and `is_final_chunk`
    /// was false. Never returned for final chunks.
    NeedMoreData,
    /// An ill-formed sequence was hit with `replace_invalid` off. Never
    /// returned when replacement is on.
    InvalidData,
}

/// Result of one transcoding call. `read`/`written` always describe a
/// well-formed (or well-substituted) prefix that was fully transcoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transcode {
    pub status: Status,
    /// Source elements consumed (bytes for UTF-8 sources, units for UTF-16).
    pub read: usize,
    /// Destination elements written.
    pub written: usize,
}

const REPLACEMENT: u32 = 0xFFFD;

/// Transcodes UTF-8 bytes into UTF-16 code units.
///
/// With `replace_invalid`, every maximal ill-formed subpart becomes one
/// U+FFFD and the scan continues. Without it, the first defect stops the
/// scan with [`Status::InvalidData`] and `read`/`written` describe exactly
/// the well-formed prefix transcoded so far.
pub fn from_utf8(
    src: &[u8],
    dst: &mut [u16],
    replace_invalid: bool,
    is_final_chunk: bool,
) -> Transcode {
    let mut read = 0;
    let mut written = 0;

    while read < src.len() {
        let (cp, len) = match decode_sequence(&src[read..]) {
            Seq::Valid { cp, len } => (cp, len),
            Seq::Invalid { len } => {
                if !replace_invalid {
                    return Transcode { status: Status::InvalidData, read, written };
                }
                (REPLACEMENT, len)
            }
            Seq::Truncated => {
                if !is_final_chunk {
                    return Transcode { status: Status::NeedMoreData, read, written };
                }
                if !replace_invalid {
                    return Transcode { status: Status::InvalidData, read, written };
                }
                // The whole truncated tail is one maximal subpart.
                (REPLACEMENT, src.len() - read)
            }
        };

        let need = if cp >= 0x10000 { 2 } else { 1 };
        if dst.len() - written < need {
            return Transcode { status: Status::DestinationTooSmall, read, written };
        }
        if cp >= 0x10000 {
            let v = cp - 0x10000;
            dst[written] = 0xD800 | (v >> 10) as u16;
            dst[written + 1] = 0xDC00 | (v & 0x3FF) as u16;
        } else {
            dst[written] = cp as u16;
        }
        read += len;
        written += need;
    }

    Transcode { status: Status::Done, read, written }
}

/// Transcodes UTF-16 code units into UTF-8 bytes.
///
/// The ill-formed case here is a lone surrogate. A high surrogate at the end
/// of a non-final chunk is [`Status::NeedMoreData`], since its low half may
/// arrive with the next chunk.
pub fn to_utf8(
    src: &[u16],
    dst: &mut [u8],
    replace_invalid: bool,
    is_final_chunk: bool,
) -> Transcode {
    let mut read = 0;
    let mut written = 0;

    while read < src.len() {
        let unit = src[read];
        let (mut cp, len) = if (0xD800..0xDC00).contains(&unit) {
            match src.get(read + 1) {
                Some(&low) if (0xDC00..0xE000).contains(&low) => {
                    let cp = ((unit as u32 - 0xD800) << 10) + (low as u32 - 0xDC00) + 0x10000;
                    (cp, 2)
                }
                Some(_) => (u32::MAX, 1), // high surrogate followed by a non-low unit
                None if !is_final_chunk => {
                    return Transcode { status: Status::NeedMoreData, read, written };
                }
                None => (u32::MAX, 1), // truncated pair in the final chunk
            }
        } else if (0xDC00..0xE000).contains(&unit) {
            (u32::MAX, 1) // unpaired low surrogate
        } else {
            (unit as u32, 1)
        };

        if cp == u32::MAX {
            if !replace_invalid {
                return Transcode { status: Status::InvalidData, read, written };
            }
            cp = REPLACEMENT;
        }

        let need = utf8_len(cp);
        if dst.len() - written < need {
            return Transcode { status: Status::DestinationTooSmall, read, written };
        }
        encode_utf8(cp, &mut dst[written..written + need]);
        read += len;
        written += need;
    }

    Transcode { status: Status::Done, read, written }
}

#[inline]
fn utf8_len(cp: u32) -> usize {
    match cp {
        ..0x80 => 1,
        ..0x800 => 2,
        ..0x10000 => 3,
        _ => 4,
    }
}

#[inline]
fn encode_utf8(cp: u32, dst: &mut [u8]) {
    match dst.len() {
        1 => dst[0] = cp as u8,
        2 => {
            dst[0] = 0xC0 | (cp >> 6) as u8;
            dst[1] = 0x80 | (cp & 0x3F) as u8;
        }
        3 => {
            dst[0] = 0xE0 | (cp >> 12) as u8;
            dst[1] = 0x80 | ((cp >> 6) & 0x3F) as u8;
            dst[2] = 0x80 | (cp & 0x3F) as u8;
        }
        _ => {
            dst[0] = 0xF0 | (cp >> 18) as u8;
            dst[1] = 0x80 | ((cp >> 12) & 0x3F) as u8;
            dst[2] = 0x80 | ((cp >> 6) & 0x3F) as u8;
            dst[3] = 0x80 | (cp & 0x3F) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "ascii caf\u{E9} \u{05D0}\u{4E2D}\u{6587} \u{10400}\u{1F600} end";

    fn decode_all(src: &[u8]) -> Vec<u16> {
        let mut dst = vec![0; src.len() + 1];
        let r = from_utf8(src, &mut dst, false, true);
        assert_eq!(r.status, Status::Done);
        assert_eq!(r.read, src.len());
        dst.truncate(r.written);
        dst
    }

    #[test]
    fn roundtrip() {
        let units = decode_all(SAMPLE.as_bytes());
        assert_eq!(units, SAMPLE.encode_utf16().collect::<Vec<_>>());

        let mut bytes = vec![0; SAMPLE.len()];
        let r = to_utf8(&units, &mut bytes, false, true);
        assert_eq!(r.status, Status::Done);
        assert_eq!(r.read, units.len());
        assert_eq!(&bytes[..r.written], SAMPLE.as_bytes());
    }

    #[test]
    fn chunked_equals_unsplit() {
        let bytes = SAMPLE.as_bytes();
        let whole = decode_all(bytes);

        for split in 0..=bytes.len() {
            let mut out = Vec::new();
            let mut carry: Vec<u8> = Vec::new();

            for (chunk, is_final) in [(&bytes[..split], false), (&bytes[split..], true)] {
                carry.extend_from_slice(chunk);
                let mut dst = vec![0; carry.len() + 1];
                let r = from_utf8(&carry, &mut dst, false, is_final);
                assert_ne!(r.status, Status::InvalidData);
                out.extend_from_slice(&dst[..r.written]);
                // Per the NeedMoreData contract the unconsumed tail is
                // prepended to the next chunk by the caller.
                carry.drain(..r.read);
            }
            assert!(carry.is_empty());
            assert_eq!(out, whole, "split at {split}");
        }
    }

    #[test]
    fn strict_stops_at_defect() {
        let src = b"ok\xC3\xA9\xED\xA0\x80rest";
        let mut dst = [0u16; 16];
        let r = from_utf8(src, &mut dst, false, true);
        assert_eq!(r.status, Status::InvalidData);
        assert_eq!(r.read, 4); // "ok" + U+00E9
        assert_eq!(r.written, 3);
        assert_eq!(&dst[..3], &[0x6F, 0x6B, 0xE9]);
    }

    // Replacement mode must agree with the standard library's lossy decoding,
    // which also substitutes maximal subparts.
    #[test]
    fn replacement_agrees_with_std() {
        let samples: &[&[u8]] = &[
            b"\xC0\x80",
            b"a\xED\xA0\x80b",
            b"\xE1\x80\x41",
            b"\xF0\x90\x28\xBC",
            b"\xF4\x90\x80\x80",
            b"abc\xE4\xB8",
            b"\x80\xBF\x80",
        ];
        for &sample in samples {
            let expected: Vec<u16> =
                String::from_utf8_lossy(sample).encode_utf16().collect();
            let mut dst = vec![0; sample.len() + 1];
            let r = from_utf8(sample, &mut dst, true, true);
            assert_eq!(r.status, Status::Done, "sample {sample:x?}");
            assert_eq!(r.read, sample.len());
            assert_eq!(&dst[..r.written], expected, "sample {sample:x?}");
        }
    }

    #[test]
    fn need_more_data_only_when_not_final() {
        let src = b"abc\xF0\x90\x80"; // truncated U+10000
        let mut dst = [0u16; 8];

        let r = from_utf8(src, &mut dst, false, false);
        assert_eq!(r.status, Status::NeedMoreData);
        assert_eq!(r.read, 3);
        assert_eq!(r.written, 3);

        let r = from_utf8(src, &mut dst, false, true);
        assert_eq!(r.status, Status::InvalidData);
        assert_eq!(r.read, 3);

        let r = from_utf8(src, &mut dst, true, true);
        assert_eq!(r.status, Status::Done);
        assert_eq!(&dst[..r.written], &[0x61, 0x62, 0x63, 0xFFFD]);
    }

    #[test]
    fn destination_too_small_is_resumable() {
        let src = "\u{10400}\u{4E2D}ab".as_bytes();
        let mut out = Vec::new();
        let mut read = 0;
        loop {
            let mut dst = [0u16; 2];
            let r = from_utf8(&src[read..], &mut dst, false, true);
            out.extend_from_slice(&dst[..r.written]);
            read += r.read;
            match r.status {
                Status::Done => break,
                Status::DestinationTooSmall => {}
                s => panic!("unexpected status {s:?}"),
            }
        }
        assert_eq!(read, src.len());
        assert_eq!(out, "\u{10400}\u{4E2D}ab".encode_utf16().collect::<Vec<_>>());
    }

    #[test]
    fn lone_surrogates_to_utf8() {
        let src = [0x41, 0xD800, 0x42];
        let mut dst = [0u8; 8];

        let r = to_utf8(&src, &mut dst, false, true);
        assert_eq!(r.status, Status::InvalidData);
        assert_eq!(r.read, 1);
        assert_eq!(r.written, 1);

        let r = to_utf8(&src, &mut dst, true, true);
        assert_eq!(r.status, Status::Done);
        assert_eq!(&dst[..r.written], b"A\xEF\xBF\xBDB");
    }

    #[test]
    fn trailing_high_surrogate() {
        let src = [0x41, 0xD801];
        let mut dst = [0u8; 8];

        let r = to_utf8(&src, &mut dst, false, false);
        assert_eq!(r.status, Status::NeedMoreData);
        assert_eq!(r.read, 1);

        // Completing the pair on the next chunk yields U+10400.
        let carry = [src[1], 0xDC00];
        let r = to_utf8(&carry, &mut dst, false, true);
        assert_eq!(r.status, Status::Done);
        assert_eq!(&dst[..r.written], "\u{10400}".as_bytes());

        // In a final chunk the same tail is a defect.
        let r = to_utf8(&src, &mut dst, false, true);
        assert_eq!(r.status, Status::InvalidData);
        assert_eq!(r.read, 1);
    }
}
