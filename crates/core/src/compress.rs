//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: stegowire — Payloads hidden in carrier images.
//

//! Adaptive payload compression.
//!
//! Two encoders run on every payload: raw deflate (the LZ77 arm, delegated to
//! `flate2`) and a from-scratch LZ78. The smaller output wins and is prefixed
//! with a 5-byte signature so [`decompress`] can dispatch without external
//! state. Ties, and any LZ78 failure, fall back to LZ77.
//!
//! LZ78 wire format, after the signature:
//!
//! ```text
//! 0: big-endian u32 plaintext length
//! 4: trailing-byte flag (1 = last pair carries a sentinel literal)
//! 5: pairs, each a LEB128 varint dictionary index then one literal byte
//! ```

use std::collections::HashMap;
use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::RuntimeError;

/// Length of the method signature prefixed to every compressed blob.
pub const SIGNATURE_LEN: usize = 5;

const LZ77_SIGNATURE: &[u8; SIGNATURE_LEN] = b"LZ77\0";
const LZ78_SIGNATURE: &[u8; SIGNATURE_LEN] = b"LZ78\0";

// Offsets into the LZ78 body (relative to the start of the blob).
const LZ78_LEN_OFFSET: usize = SIGNATURE_LEN;
const LZ78_FLAG_OFFSET: usize = SIGNATURE_LEN + 4;
const LZ78_PAIRS_OFFSET: usize = SIGNATURE_LEN + 5;

/// Compression method recorded in the metadata record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionMethod {
    Lz77,
    Lz78,
}

impl CompressionMethod {
    pub fn signature(self) -> &'static [u8; SIGNATURE_LEN] {
        match self {
            CompressionMethod::Lz77 => LZ77_SIGNATURE,
            CompressionMethod::Lz78 => LZ78_SIGNATURE,
        }
    }
}

/// Output of [`compress_auto`].
pub struct Compressed {
    /// Self-describing blob, signature included.
    pub blob: Vec<u8>,
    pub method: CompressionMethod,
    /// Fractional savings, `1 - |blob| / |plain|`. Display-only.
    pub ratio: f64,
}

/// Compress `input` with both encoders and keep the strictly smaller output.
pub fn compress_auto(input: &[u8]) -> Result<Compressed, RuntimeError> {
    if input.is_empty() {
        return Err(RuntimeError::EmptyPayload);
    }

    let lz77 = lz77_compress(input)?;
    let lz78 = lz78_compress(input);

    if let Err(ref err) = lz78 {
        debug!("lz78 encoder unavailable for this input ({err}), using lz77");
    }

    let (blob, method) = match lz78 {
        Ok(lz78) if lz78.len() < lz77.len() => (lz78, CompressionMethod::Lz78),
        _ => (lz77, CompressionMethod::Lz77),
    };

    let ratio = 1.0 - blob.len() as f64 / input.len() as f64;
    debug!(
        "compressed {} -> {} bytes ({:?}, ratio {:.3})",
        input.len(),
        blob.len(),
        method,
        ratio
    );

    Ok(Compressed { blob, method, ratio })
}

/// Decompress a blob produced by [`compress_auto`], dispatching on signature.
pub fn decompress(blob: &[u8]) -> Result<Vec<u8>, RuntimeError> {
    if blob.len() < SIGNATURE_LEN {
        return Err(RuntimeError::BadSignature);
    }
    match &blob[..SIGNATURE_LEN] {
        sig if sig == LZ77_SIGNATURE => inflate(&blob[SIGNATURE_LEN..]),
        sig if sig == LZ78_SIGNATURE => lz78_decode(blob),
        _ => Err(RuntimeError::BadSignature),
    }
}

/// Method recorded in a blob's signature, if recognized.
pub fn sniff_method(blob: &[u8]) -> Option<CompressionMethod> {
    if blob.len() < SIGNATURE_LEN {
        return None;
    }
    match &blob[..SIGNATURE_LEN] {
        sig if sig == LZ77_SIGNATURE => Some(CompressionMethod::Lz77),
        sig if sig == LZ78_SIGNATURE => Some(CompressionMethod::Lz78),
        _ => None,
    }
}

fn lz77_compress(input: &[u8]) -> Result<Vec<u8>, RuntimeError> {
    let mut encoder = DeflateEncoder::new(
        Vec::from(LZ77_SIGNATURE.as_slice()),
        Compression::default(),
    );
    encoder
        .write_all(input)
        .and_then(|_| encoder.finish())
        .map_err(|e| RuntimeError::Deflate(e.to_string()))
}

fn inflate(body: &[u8]) -> Result<Vec<u8>, RuntimeError> {
    let mut out = Vec::new();
    DeflateDecoder::new(body)
        .read_to_end(&mut out)
        .map_err(|e| RuntimeError::Deflate(e.to_string()))?;
    Ok(out)
}

fn lz78_compress(input: &[u8]) -> Result<Vec<u8>, RuntimeError> {
    if input.len() > u32::MAX as usize {
        return Err(RuntimeError::InvalidStream("input exceeds u32 length"));
    }

    let mut out = Vec::from(LZ78_SIGNATURE.as_slice());
    out.extend_from_slice(&(input.len() as u32).to_be_bytes());
    out.push(0); // trailing-byte flag, patched below when needed

    // Dictionary of phrases keyed by (prefix index, extension byte).
    // Index 0 is the empty phrase.
    let mut dict: HashMap<(u32, u8), u32> = HashMap::new();
    let mut next_index: u32 = 1;
    let mut prefix: u32 = 0;

    for &byte in input {
        match dict.get(&(prefix, byte)) {
            Some(&idx) => prefix = idx,
            None => {
                write_varint(&mut out, prefix);
                out.push(byte);
                if next_index == u32::MAX {
                    return Err(RuntimeError::InvalidStream("dictionary overflow"));
                }
                dict.insert((prefix, byte), next_index);
                next_index += 1;
                prefix = 0;
            }
        }
    }

    // Input exhausted mid-phrase: emit the prefix with a sentinel literal and
    // flag it so the decoder drops the sentinel.
    if prefix != 0 {
        write_varint(&mut out, prefix);
        out.push(0x00);
        out[LZ78_FLAG_OFFSET] = 1;
    }

    Ok(out)
}

fn lz78_decode(blob: &[u8]) -> Result<Vec<u8>, RuntimeError> {
    if blob.len() < LZ78_PAIRS_OFFSET {
        return Err(RuntimeError::InvalidStream("truncated lz78 header"));
    }

    let expected = u32::from_be_bytes(
        blob[LZ78_LEN_OFFSET..LZ78_LEN_OFFSET + 4]
            .try_into()
            .expect("fixed-width slice"),
    ) as usize;
    let trailing = match blob[LZ78_FLAG_OFFSET] {
        0 => false,
        1 => true,
        _ => return Err(RuntimeError::InvalidStream("invalid trailing flag")),
    };

    let mut out: Vec<u8> = Vec::new();
    out.try_reserve_exact(expected)
        .map_err(|_| RuntimeError::AllocationFailed(expected))?;

    // Every decoded phrase is a slice of the output already produced, so the
    // dictionary stores (offset, len) spans instead of owned strings.
    let mut spans: Vec<(usize, usize)> = vec![(0, 0)];
    let mut cursor = LZ78_PAIRS_OFFSET;

    while cursor < blob.len() {
        let (index, read) = read_varint(&blob[cursor..])?;
        cursor += read;
        let &literal = blob
            .get(cursor)
            .ok_or(RuntimeError::InvalidStream("pair missing literal byte"))?;
        cursor += 1;

        let index = index as usize;
        if index >= spans.len() {
            return Err(RuntimeError::IndexOutOfRange {
                index: index as u64,
                max: spans.len() as u64 - 1,
            });
        }

        let (start, len) = spans[index];
        let phrase_start = out.len();
        out.extend_from_within(start..start + len);
        out.push(literal);
        spans.push((phrase_start, len + 1));
    }

    if trailing {
        out.pop();
    }

    if out.len() != expected {
        return Err(RuntimeError::LengthMismatch {
            expected,
            actual: out.len(),
        });
    }

    Ok(out)
}

fn write_varint(out: &mut Vec<u8>, mut value: u32) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

fn read_varint(input: &[u8]) -> Result<(u32, usize), RuntimeError> {
    let mut value: u32 = 0;
    for (i, &byte) in input.iter().enumerate() {
        if i == 5 {
            return Err(RuntimeError::InvalidStream("varint overflow"));
        }
        value |= u32::from(byte & 0x7f) << (7 * i as u32);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(RuntimeError::InvalidStream("truncated varint"))
}
