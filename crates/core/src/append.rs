//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: stegowire — Payloads hidden in carrier images.
//

//! Structure-preserving append codec.
//!
//! The framed blob is concatenated after the carrier's end-of-image bytes;
//! no byte of the cover changes, so PSNR is infinite by construction. This
//! survives transports that preserve byte content (document send), not ones
//! that re-encode pixels (photo send).

use crate::error::{IntegrityError, Result};
use crate::frame::{self, ParsedFrame};

/// Attach the frame after the cover bytes.
///
/// Fails if the cover already contains the marker: extraction anchors on the
/// marker, so a colliding cover is unusable.
pub fn embed(cover: &[u8], framed: &[u8]) -> Result<Vec<u8>> {
    if frame::find_marker(cover, false).is_some() {
        return Err(IntegrityError::MarkerCollision.into());
    }

    let mut stego = Vec::with_capacity(cover.len() + framed.len());
    stego.extend_from_slice(cover);
    stego.extend_from_slice(framed);
    Ok(stego)
}

/// Recover the frame from an append-mode container.
///
/// The *last* marker occurrence wins, tolerating covers that coincidentally
/// contain the marker sequence ahead of the real frame.
pub fn extract(stego: &[u8]) -> Result<ParsedFrame> {
    frame::extract_frame(stego, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::CompressionMethod;
    use crate::crypto::sha256_hex;
    use crate::frame::{build_frame, FrameCommon, Metadata, SourceKind, MARKER};

    fn framed(blob: &[u8]) -> Vec<u8> {
        let meta = Metadata::for_append(FrameCommon {
            encrypted: false,
            comp: CompressionMethod::Lz77,
            comp_ratio: 0.0,
            plain_size: blob.len() as u64,
            blob_size: blob.len() as u64,
            sha256: sha256_hex(blob),
            source_kind: SourceKind::File,
            source_name: "payload.bin".to_string(),
        });
        build_frame(&meta, blob).unwrap()
    }

    #[test]
    fn test_cover_bytes_are_untouched() {
        let cover = b"\xff\xd8 jpeg-ish bytes \xff\xd9";
        let stego = embed(cover, &framed(b"secret")).unwrap();
        assert_eq!(&stego[..cover.len()], cover);
    }

    #[test]
    fn test_embed_extract_round_trip() {
        let cover = b"\xff\xd8 cover \xff\xd9";
        let stego = embed(cover, &framed(b"secret")).unwrap();
        let parsed = extract(&stego).unwrap();
        assert_eq!(parsed.blob, b"secret");
    }

    #[test]
    fn test_marker_collision_rejected() {
        let mut cover = b"cover ".to_vec();
        cover.extend_from_slice(MARKER);
        let err = embed(&cover, &framed(b"x")).unwrap_err();
        assert!(matches!(
            err,
            crate::error::StegoError::Integrity(IntegrityError::MarkerCollision)
        ));
    }

    #[test]
    fn test_extract_without_frame_fails() {
        assert!(extract(b"plain cover bytes").is_err());
    }
}
