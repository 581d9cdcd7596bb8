//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: stegowire — Payloads hidden in carrier images.
//

//! Framing and integrity metadata.
//!
//! A framed blob is `MARKER || meta_len (u32 BE) || meta JSON || payload blob`.
//! The marker is the sole anchor used to find the frame inside a stego
//! container; everything else is length-prefixed from there. The metadata's
//! SHA-256 is always computed over the recovered *plaintext*, which keeps
//! integrity independent of codec and encryption choices.

use serde::{Deserialize, Serialize};

use crate::compress::CompressionMethod;
use crate::config::{ChannelPreset, EmbedMode, FORMAT_VERSION};
use crate::crypto::sha256_hex;
use crate::error::{IntegrityError, Result, RuntimeError};

/// ASCII sentinel anchoring the framed blob inside a stego container.
pub const MARKER: &[u8; 23] = b"::STEGA_PAYLOAD_START::";

/// What the payload path pointed at, deciding how extraction materializes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    File,
    Dir,
}

/// Metadata record written between the marker and the payload blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Metadata {
    pub v: u32,
    /// Copy of the marker, doubling as a parse sanity check.
    pub marker: String,
    pub mode: EmbedMode,
    pub encrypted: bool,
    pub comp: CompressionMethod,
    /// Fractional savings of the compressor. Display-only.
    pub comp_ratio: f64,
    pub plain_size: u64,
    /// Size of the stored blob: ciphertext if encrypted, else compressed.
    pub blob_size: u64,
    /// Hex SHA-256 of the plaintext payload.
    pub sha256: String,
    pub source_kind: SourceKind,
    pub source_name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub block_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub used_coefs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub channel_preset: Option<ChannelPreset>,
}

impl Metadata {
    /// Metadata for an append-mode embed.
    pub fn for_append(common: FrameCommon) -> Self {
        Self::from_common(EmbedMode::Append, common, None)
    }

    /// Metadata for a DCT-mode embed.
    pub fn for_dct(common: FrameCommon, dct: DctFields) -> Self {
        Self::from_common(EmbedMode::Dct, common, Some(dct))
    }

    fn from_common(mode: EmbedMode, common: FrameCommon, dct: Option<DctFields>) -> Self {
        Metadata {
            v: FORMAT_VERSION,
            marker: String::from_utf8_lossy(MARKER).into_owned(),
            mode,
            encrypted: common.encrypted,
            comp: common.comp,
            comp_ratio: common.comp_ratio,
            plain_size: common.plain_size,
            blob_size: common.blob_size,
            sha256: common.sha256,
            source_kind: common.source_kind,
            source_name: common.source_name,
            rate: dct.as_ref().map(|d| d.rate),
            block_count: dct.as_ref().map(|d| d.block_count),
            used_coefs: dct.as_ref().map(|d| d.used_coefs),
            channel_preset: dct.as_ref().map(|d| d.channel_preset),
        }
    }
}

/// Mode-independent metadata fields gathered by the pipeline.
pub struct FrameCommon {
    pub encrypted: bool,
    pub comp: CompressionMethod,
    pub comp_ratio: f64,
    pub plain_size: u64,
    pub blob_size: u64,
    pub sha256: String,
    pub source_kind: SourceKind,
    pub source_name: String,
}

/// DCT-specific metadata fields.
pub struct DctFields {
    pub rate: f64,
    pub block_count: u64,
    pub used_coefs: u64,
    pub channel_preset: ChannelPreset,
}

/// A frame parsed back out of a container.
#[derive(Debug)]
pub struct ParsedFrame {
    pub meta: Metadata,
    pub blob: Vec<u8>,
}

/// Serialize metadata and assemble the frame around a payload blob.
pub fn build_frame(meta: &Metadata, blob: &[u8]) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(meta)
        .map_err(|e| RuntimeError::Internal(format!("metadata serialization: {e}")))?;

    let mut frame = Vec::with_capacity(MARKER.len() + 4 + json.len() + blob.len());
    frame.extend_from_slice(MARKER);
    frame.extend_from_slice(&(json.len() as u32).to_be_bytes());
    frame.extend_from_slice(&json);
    frame.extend_from_slice(blob);
    Ok(frame)
}

/// First or last occurrence of the marker in `haystack`.
pub fn find_marker(haystack: &[u8], last: bool) -> Option<usize> {
    let mut windows = haystack.windows(MARKER.len());
    if last {
        windows.rposition(|w| w == MARKER)
    } else {
        windows.position(|w| w == MARKER)
    }
}

/// Parse the frame starting at a known marker offset.
pub fn parse_frame_at(container: &[u8], marker_pos: usize) -> Result<ParsedFrame> {
    let header_start = marker_pos + MARKER.len();
    let meta_start = header_start + 4;
    if container.len() < meta_start {
        return Err(malformed("length field truncated"));
    }

    let meta_len = u32::from_be_bytes(
        container[header_start..meta_start]
            .try_into()
            .expect("fixed-width slice"),
    ) as usize;
    let blob_start = meta_start
        .checked_add(meta_len)
        .ok_or_else(|| malformed("metadata length overflow"))?;
    if container.len() < blob_start {
        return Err(malformed("metadata region truncated"));
    }

    let meta: Metadata = serde_json::from_slice(&container[meta_start..blob_start])
        .map_err(|e| malformed(&e.to_string()))?;
    if meta.marker.as_bytes() != MARKER {
        return Err(malformed("marker field mismatch"));
    }

    let blob_len = meta.blob_size as usize;
    let blob_end = blob_start
        .checked_add(blob_len)
        .filter(|&end| end <= container.len())
        .ok_or_else(|| malformed("payload blob truncated"))?;

    Ok(ParsedFrame {
        meta,
        blob: container[blob_start..blob_end].to_vec(),
    })
}

/// Locate the marker and parse the frame around it.
///
/// Append containers are scanned from the back (defensive against covers that
/// coincidentally contain the marker); DCT-recovered bitstreams from the
/// front, where the frame begins.
pub fn extract_frame(container: &[u8], last: bool) -> Result<ParsedFrame> {
    let pos = find_marker(container, last).ok_or(IntegrityError::MarkerNotFound)?;
    parse_frame_at(container, pos)
}

/// Compare the recovered plaintext digest against the metadata record.
pub fn verify_digest(meta: &Metadata, plain: &[u8]) -> Result<()> {
    let found = sha256_hex(plain);
    if found != meta.sha256 {
        return Err(IntegrityError::DigestMismatch {
            expected: meta.sha256.clone(),
            found,
        }
        .into());
    }
    Ok(())
}

fn malformed(detail: &str) -> crate::error::StegoError {
    IntegrityError::MalformedMetadata(detail.to_string()).into()
}
