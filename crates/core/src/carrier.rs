//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: stegowire — Payloads hidden in carrier images.
//

//! Carrier image access: decoding, BT.601 color planes, JPEG re-encoding.
//!
//! The DCT codec works on float planes. Planes are f32 to bound memory on
//! large carriers; transform math upgrades to f64 per block.

use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{ImageReader, RgbImage};

use crate::error::{IoError, Result, RuntimeError};

/// Y, Cb, Cr planes of a carrier, in image geometry (unpadded).
pub struct Planes {
    pub width: usize,
    pub height: usize,
    pub y: Vec<f32>,
    pub cb: Vec<f32>,
    pub cr: Vec<f32>,
}

/// Decode a carrier image file to RGB8.
///
/// The format is sniffed from the content, not the extension: stego
/// containers routinely travel under renamed or extensionless paths.
pub fn load_rgb(path: &Path) -> Result<RgbImage> {
    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| IoError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
    let img = reader.decode().map_err(|e| IoError::ImageDecode {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(img.to_rgb8())
}

/// Decode a carrier already held in memory.
pub fn decode_rgb(bytes: &[u8]) -> std::result::Result<RgbImage, image::ImageError> {
    image::load_from_memory(bytes).map(|img| img.to_rgb8())
}

/// Convert an RGB image to BT.601 YCbCr planes.
pub fn rgb_to_ycbcr(img: &RgbImage) -> Result<Planes> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    let len = width * height;

    let mut y = alloc_plane(len)?;
    let mut cb = alloc_plane(len)?;
    let mut cr = alloc_plane(len)?;

    for pixel in img.pixels() {
        let [r, g, b] = pixel.0;
        let (r, g, b) = (f32::from(r), f32::from(g), f32::from(b));
        y.push(0.299 * r + 0.587 * g + 0.114 * b);
        cb.push(128.0 - 0.168_736 * r - 0.331_264 * g + 0.5 * b);
        cr.push(128.0 + 0.5 * r - 0.418_688 * g - 0.081_312 * b);
    }

    Ok(Planes {
        width,
        height,
        y,
        cb,
        cr,
    })
}

/// Convert planes back to an RGB image, clamping to the 8-bit range.
pub fn ycbcr_to_rgb(planes: &Planes) -> RgbImage {
    let mut img = RgbImage::new(planes.width as u32, planes.height as u32);

    for (i, pixel) in img.pixels_mut().enumerate() {
        let y = planes.y[i];
        let cb = planes.cb[i] - 128.0;
        let cr = planes.cr[i] - 128.0;

        let r = y + 1.402 * cr;
        let g = y - 0.344_136 * cb - 0.714_136 * cr;
        let b = y + 1.772 * cb;

        pixel.0 = [clamp_u8(r), clamp_u8(g), clamp_u8(b)];
    }

    img
}

/// Encode an RGB image as baseline JPEG at the given quality.
pub fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(img)
        .map_err(IoError::ImageEncode)?;
    Ok(out)
}

fn alloc_plane(len: usize) -> Result<Vec<f32>> {
    let mut plane: Vec<f32> = Vec::new();
    plane
        .try_reserve_exact(len)
        .map_err(|_| RuntimeError::AllocationFailed(len * std::mem::size_of::<f32>()))?;
    Ok(plane)
}

fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
