//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: stegowire — Payloads hidden in carrier images.
//

//! End-to-end embed and extract orchestration.
//!
//! Each entry point performs a strict stage sequence with early exit on the
//! first error. Every call builds fresh buffers and key material; nothing is
//! shared across calls, so batch harnesses may run calls in parallel over
//! distinct paths.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::append;
use crate::archive::{pack_dir, unpack_dir};
use crate::carrier::{self, decode_rgb, rgb_to_ycbcr, ycbcr_to_rgb};
use crate::compress::{self, compress_auto, CompressionMethod};
use crate::config::{validate_rate, ChannelPreset, EmbedMode, EmbedOptions, ExtractOptions};
use crate::crypto::{decrypt, derive_key, encrypt, sha256_hex};
use crate::dct;
use crate::error::{ArgError, IntegrityError, IoError, Result, RuntimeError};
use crate::frame::{
    build_frame, extract_frame, verify_digest, DctFields, FrameCommon, Metadata, ParsedFrame,
    SourceKind,
};

/// DCT placement figures reported after a DCT embed.
#[derive(Debug, Clone, Copy)]
pub struct DctStats {
    /// Effective rate after preset clamping.
    pub rate: f64,
    pub block_count: u64,
    /// Coefficients available at the effective rate.
    pub used_coefs: u64,
    /// All eligible coefficients, before the rate was applied.
    pub eligible: u64,
}

/// Outcome of a successful embed.
#[derive(Debug, Clone)]
pub struct EmbedSummary {
    pub mode: EmbedMode,
    pub plain_size: u64,
    pub blob_size: u64,
    pub comp: CompressionMethod,
    pub comp_ratio: f64,
    pub stego_size: u64,
    pub dct: Option<DctStats>,
}

/// Outcome of a successful extract.
#[derive(Debug)]
pub struct ExtractSummary {
    pub meta: Metadata,
    /// The recovered file, or the directory the archive was unpacked into.
    pub written: PathBuf,
}

/// Read a payload file, or pack a payload directory into archive bytes.
pub fn load_payload(path: &Path) -> Result<(Vec<u8>, SourceKind, String)> {
    let meta = std::fs::metadata(path).map_err(|_| ArgError::MissingPath(path.to_path_buf()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "payload.bin".to_string());

    if meta.is_dir() {
        let bytes = pack_dir(path)?;
        Ok((bytes, SourceKind::Dir, name))
    } else {
        let bytes = read_file(path)?;
        Ok((bytes, SourceKind::File, name))
    }
}

/// Embed a payload into a cover image, writing the stego container to `out`.
pub fn embed(cover: &Path, payload: &Path, out: &Path, opts: &EmbedOptions) -> Result<EmbedSummary> {
    validate_rate(opts.rate)?;
    if !cover.exists() {
        return Err(ArgError::MissingPath(cover.to_path_buf()).into());
    }

    let (plain, source_kind, source_name) = load_payload(payload)?;
    let digest = sha256_hex(&plain);
    info!(
        "payload '{}': {} bytes, sha256 {}",
        source_name,
        plain.len(),
        &digest[..12]
    );

    let compressed = compress_auto(&plain)?;
    info!(
        "compression: {:?}, {} -> {} bytes",
        compressed.method,
        plain.len(),
        compressed.blob.len()
    );

    let encrypted = opts.password.is_some();
    let blob = match &opts.password {
        Some(password) => {
            let key = derive_key(password);
            encrypt(&key, &compressed.blob)?
        }
        None => compressed.blob,
    };

    let blob_size = blob.len() as u64;
    let common = FrameCommon {
        encrypted,
        comp: compressed.method,
        comp_ratio: compressed.ratio,
        plain_size: plain.len() as u64,
        blob_size,
        sha256: digest,
        source_kind,
        source_name,
    };

    let cover_bytes = read_file(cover)?;
    let (stego, dct_stats) = match opts.mode {
        EmbedMode::Append => {
            let meta = Metadata::for_append(common);
            let framed = build_frame(&meta, &blob)?;
            (append::embed(&cover_bytes, &framed)?, None)
        }
        EmbedMode::Dct => {
            let (stego, stats) =
                dct_embed(&cover_bytes, cover, common, &blob, opts.rate, opts.channel)?;
            (stego, Some(stats))
        }
    };

    write_file(out, &stego)?;
    info!("stego container written to {} ({} bytes)", out.display(), stego.len());

    Ok(EmbedSummary {
        mode: opts.mode,
        plain_size: plain.len() as u64,
        blob_size,
        comp: compressed.method,
        comp_ratio: compressed.ratio,
        stego_size: stego.len() as u64,
        dct: dct_stats,
    })
}

/// Recover a payload from a stego container into `out_dir`.
pub fn extract(stego: &Path, out_dir: &Path, opts: &ExtractOptions) -> Result<ExtractSummary> {
    let container = if stego.exists() {
        read_file(stego)?
    } else {
        return Err(ArgError::MissingPath(stego.to_path_buf()).into());
    };

    let ParsedFrame { meta, blob } = locate_frame(&container)?;
    info!(
        "frame located: mode {}, {} byte blob, source '{}'",
        meta.mode,
        blob.len(),
        meta.source_name
    );

    let compressed = if meta.encrypted {
        // No password still attempts decryption: the tag check is the
        // authoritative failure, keeping wrong and missing passwords on the
        // same error path.
        let password = opts.password.as_ref().map(|p| p.as_str()).unwrap_or("");
        let key = derive_key(password);
        decrypt(&key, &blob)?
    } else {
        blob
    };

    if let Some(method) = compress::sniff_method(&compressed) {
        if method != meta.comp {
            warn!(
                "metadata says {:?} but blob is {:?}; trusting the blob",
                meta.comp, method
            );
        }
    }

    let plain = compress::decompress(&compressed)
        .map_err(|e| IntegrityError::CorruptBlob(e.to_string()))?;
    verify_digest(&meta, &plain)?;
    info!("digest verified over {} plaintext bytes", plain.len());

    std::fs::create_dir_all(out_dir).map_err(|e| IoError::Write {
        path: out_dir.to_path_buf(),
        source: e,
    })?;

    let written = match meta.source_kind {
        SourceKind::File => {
            let name = Path::new(&meta.source_name)
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("payload.bin"));
            let target = out_dir.join(name);
            write_file(&target, &plain)?;
            target
        }
        SourceKind::Dir => {
            unpack_dir(&plain, out_dir)?;
            out_dir.to_path_buf()
        }
    };

    Ok(ExtractSummary { meta, written })
}

/// Parse a stego container's metadata without touching the payload blob.
pub fn inspect(stego: &Path) -> Result<Metadata> {
    if !stego.exists() {
        return Err(ArgError::MissingPath(stego.to_path_buf()).into());
    }
    let container = read_file(stego)?;
    locate_frame(&container).map(|frame| frame.meta)
}

/// Find the frame in a container of either mode.
///
/// Raw bytes are scanned first (append mode); if no marker is present the
/// container is decoded as an image and probed through each channel preset's
/// coefficient band.
fn locate_frame(container: &[u8]) -> Result<ParsedFrame> {
    if crate::frame::find_marker(container, true).is_some() {
        return append::extract(container);
    }

    let rgb = match decode_rgb(container) {
        Ok(rgb) => rgb,
        // Not an image and no marker: there is no frame here.
        Err(_) => return Err(IntegrityError::MarkerNotFound.into()),
    };
    let planes = rgb_to_ycbcr(&rgb)?;

    let mut probed: Vec<(usize, usize)> = Vec::new();
    for preset in ChannelPreset::all() {
        let tuning = preset.tuning();
        let band = (tuning.band_lo, tuning.band_hi);
        if probed.contains(&band) {
            continue;
        }
        probed.push(band);

        let analysis = dct::analyze(
            &planes.y,
            planes.width,
            planes.height,
            tuning.band_lo,
            tuning.band_hi,
        );
        match dct::recover_frame(&analysis) {
            Ok(bits) => match extract_frame(&bits, false) {
                Ok(frame) => return Ok(frame),
                Err(err) => info!("band {:?} held no parseable frame: {err}", band),
            },
            Err(err) => info!("band {:?} held no frame: {err}", band),
        }
    }

    Err(IntegrityError::MarkerNotFound.into())
}

fn dct_embed(
    cover_bytes: &[u8],
    cover_path: &Path,
    common: FrameCommon,
    blob: &[u8],
    rate: f64,
    channel: ChannelPreset,
) -> Result<(Vec<u8>, DctStats)> {
    let rgb = decode_rgb(cover_bytes).map_err(|e| IoError::ImageDecode {
        path: cover_path.to_path_buf(),
        source: e,
    })?;
    let mut planes = rgb_to_ycbcr(&rgb)?;

    let tuning = channel.tuning();
    let rate = rate.min(tuning.rate_cap);

    let mut analysis = dct::analyze(
        &planes.y,
        planes.width,
        planes.height,
        tuning.band_lo,
        tuning.band_hi,
    );
    let eligible = analysis.eligible();
    let used = dct::capacity(eligible, rate);

    let meta = Metadata::for_dct(
        common,
        DctFields {
            rate,
            block_count: analysis.blocks.len() as u64,
            used_coefs: used as u64,
            channel_preset: channel,
        },
    );
    let framed = build_frame(&meta, blob)?;

    let required = dct::LENGTH_PREFIX_BITS + 8 * framed.len();
    if required > used {
        return Err(RuntimeError::NotEnoughCapacity {
            required: required as u64,
            available: used as u64,
        }
        .into());
    }
    info!(
        "dct placement: {} of {} usable coefficients ({} eligible, rate {:.4})",
        required, used, eligible, rate
    );

    dct::embed_frame(&mut analysis, &framed)?;
    planes.y = dct::synthesize(&analysis);

    let stego_rgb = ycbcr_to_rgb(&planes);
    let jpeg = carrier::encode_jpeg(&stego_rgb, tuning.quality)?;

    Ok((
        jpeg,
        DctStats {
            rate,
            block_count: analysis.blocks.len() as u64,
            used_coefs: used as u64,
            eligible: eligible as u64,
        },
    ))
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        IoError::Read {
            path: path.to_path_buf(),
            source: e,
        }
        .into()
    })
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).map_err(|e| {
        IoError::Write {
            path: path.to_path_buf(),
            source: e,
        }
        .into()
    })
}
