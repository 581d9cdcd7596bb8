//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: stegowire — Payloads hidden in carrier images.
//

//! Cover/stego fidelity metrics over the RGB pixel grid.

use std::path::Path;

use image::RgbImage;

use crate::carrier::load_rgb;
use crate::error::{ArgError, Result};

const PEAK: f64 = 255.0;

/// Fidelity of a stego image relative to its cover.
#[derive(Debug, Clone, Copy)]
pub struct Fidelity {
    /// Mean squared error over all three channels.
    pub mse: f64,
    /// Root of `mse`.
    pub rmse: f64,
    /// Peak signal-to-noise ratio in dB; infinite when `mse` is zero.
    pub psnr: f64,
}

/// Compare two images of identical geometry.
pub fn compare(cover: &RgbImage, stego: &RgbImage) -> Result<Fidelity> {
    if cover.dimensions() != stego.dimensions() {
        let (cover_w, cover_h) = cover.dimensions();
        let (stego_w, stego_h) = stego.dimensions();
        return Err(ArgError::DimensionMismatch {
            cover_w,
            cover_h,
            stego_w,
            stego_h,
        }
        .into());
    }

    let mut sum = 0.0f64;
    for (a, b) in cover.pixels().zip(stego.pixels()) {
        for c in 0..3 {
            let delta = f64::from(a.0[c]) - f64::from(b.0[c]);
            sum += delta * delta;
        }
    }

    let samples = f64::from(cover.width()) * f64::from(cover.height()) * 3.0;
    let mse = sum / samples;
    let psnr = if mse == 0.0 {
        f64::INFINITY
    } else {
        10.0 * (PEAK * PEAK / mse).log10()
    };

    Ok(Fidelity {
        mse,
        rmse: mse.sqrt(),
        psnr,
    })
}

/// Compare two image files on disk.
pub fn compare_files(cover: &Path, stego: &Path) -> Result<Fidelity> {
    let cover = load_rgb(cover)?;
    let stego = load_rgb(stego)?;
    compare(&cover, &stego)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_identical_images_have_infinite_psnr() {
        let img = RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]));
        let fidelity = compare(&img, &img.clone()).unwrap();
        assert_eq!(fidelity.mse, 0.0);
        assert_eq!(fidelity.rmse, 0.0);
        assert!(fidelity.psnr.is_infinite());
    }

    #[test]
    fn test_known_difference() {
        let a = RgbImage::from_pixel(2, 2, Rgb([10, 10, 10]));
        let b = RgbImage::from_pixel(2, 2, Rgb([13, 10, 10]));
        // One channel off by 3 in every pixel: MSE = 9 / 3 = 3.
        let fidelity = compare(&a, &b).unwrap();
        assert!((fidelity.mse - 3.0).abs() < 1e-12);
        assert!((fidelity.rmse - 3.0f64.sqrt()).abs() < 1e-12);
        let expected_psnr = 10.0 * (255.0f64 * 255.0 / 3.0).log10();
        assert!((fidelity.psnr - expected_psnr).abs() < 1e-9);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let a = RgbImage::new(4, 4);
        let b = RgbImage::new(4, 5);
        assert!(matches!(
            compare(&a, &b).unwrap_err(),
            crate::error::StegoError::Arg(ArgError::DimensionMismatch { .. })
        ));
    }
}
