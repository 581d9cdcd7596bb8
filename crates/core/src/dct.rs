//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: stegowire — Payloads hidden in carrier images.
//

//! Content-adaptive DCT codec.
//!
//! The luminance plane is split into 8x8 blocks, transformed with a separable
//! orthonormal DCT-II, and the framed blob's bits are written into the least
//! significant bit of the quantized magnitude of selected mid-frequency AC
//! coefficients. Selection prefers high-magnitude (textured) coefficients via
//! a `1/|q|` cost map, with a total order fixed by the carrier alone.
//!
//! Ordering must survive modulation, otherwise the extractor desynchronizes.
//! Two rules guarantee that:
//!
//! * carriers require quantized magnitude >= 2, so a written coefficient can
//!   never fall out of the eligible set (`(m & !1) | bit >= 2` for `m >= 2`);
//! * the order's primary key is the pair class `m / 2`, which LSB writes
//!   cannot change.
//!
//! The first 32 positions of the order hold a big-endian bit length of the
//! frame, so the extractor can size its read before scanning further.

use std::cmp::Reverse;
use std::f64::consts::PI;

use log::debug;

use crate::error::{IntegrityError, Result, RuntimeError};

/// An 8x8 tile, in samples or coefficients depending on context.
pub type Block = [[f64; 8]; 8];

const BLOCK_DIM: usize = 8;

/// Bits reserved in front of the frame for its byte length.
pub const LENGTH_PREFIX_BITS: usize = 32;

/// Zig-zag scan order: index -> (row, col).
#[rustfmt::skip]
pub const ZIGZAG: [(usize, usize); 64] = [
    (0, 0),
    (0, 1), (1, 0),
    (2, 0), (1, 1), (0, 2),
    (0, 3), (1, 2), (2, 1), (3, 0),
    (4, 0), (3, 1), (2, 2), (1, 3), (0, 4),
    (0, 5), (1, 4), (2, 3), (3, 2), (4, 1), (5, 0),
    (6, 0), (5, 1), (4, 2), (3, 3), (2, 4), (1, 5), (0, 6),
    (0, 7), (1, 6), (2, 5), (3, 4), (4, 3), (5, 2), (6, 1), (7, 0),
    (7, 1), (6, 2), (5, 3), (4, 4), (3, 5), (2, 6), (1, 7),
    (2, 7), (3, 6), (4, 5), (5, 4), (6, 3), (7, 2),
    (7, 3), (6, 4), (5, 5), (4, 6), (3, 7),
    (4, 7), (5, 6), (6, 5), (7, 4),
    (7, 5), (6, 6), (5, 7),
    (6, 7), (7, 6),
    (7, 7),
];

/// Precomputed orthonormal DCT-II basis for N = 8.
pub struct Dct8 {
    basis: [[f64; 8]; 8],
}

impl Dct8 {
    pub fn new() -> Self {
        let n = BLOCK_DIM as f64;
        let mut basis = [[0.0; 8]; 8];
        for (k, row) in basis.iter_mut().enumerate() {
            let alpha = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
            for (i, cell) in row.iter_mut().enumerate() {
                *cell = alpha * ((PI / n) * (i as f64 + 0.5) * k as f64).cos();
            }
        }
        Self { basis }
    }

    /// 2-D forward transform, `B * X * B^T`.
    pub fn forward(&self, block: &Block) -> Block {
        let tmp = mat_mul(&self.basis, block);
        mat_mul_transposed(&tmp, &self.basis)
    }

    /// 2-D inverse transform, `B^T * Y * B`.
    pub fn inverse(&self, coefs: &Block) -> Block {
        let tmp = transposed_mat_mul(&self.basis, coefs);
        mat_mul(&tmp, &self.basis)
    }
}

impl Default for Dct8 {
    fn default() -> Self {
        Self::new()
    }
}

// out = a * b
fn mat_mul(a: &Block, b: &Block) -> Block {
    let mut out = [[0.0; 8]; 8];
    for i in 0..BLOCK_DIM {
        for j in 0..BLOCK_DIM {
            let mut acc = 0.0;
            for (k, b_row) in b.iter().enumerate() {
                acc += a[i][k] * b_row[j];
            }
            out[i][j] = acc;
        }
    }
    out
}

// out = a * b^T
fn mat_mul_transposed(a: &Block, b: &Block) -> Block {
    let mut out = [[0.0; 8]; 8];
    for i in 0..BLOCK_DIM {
        for (j, b_row) in b.iter().enumerate() {
            let mut acc = 0.0;
            for k in 0..BLOCK_DIM {
                acc += a[i][k] * b_row[k];
            }
            out[i][j] = acc;
        }
    }
    out
}

// out = a^T * b
fn transposed_mat_mul(a: &Block, b: &Block) -> Block {
    let mut out = [[0.0; 8]; 8];
    for i in 0..BLOCK_DIM {
        for j in 0..BLOCK_DIM {
            let mut acc = 0.0;
            for (k, a_row) in a.iter().enumerate() {
                acc += a_row[i] * b[k][j];
            }
            out[i][j] = acc;
        }
    }
    out
}

/// One carrier coefficient in the embedding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// Pair class `|q| / 2`; invariant under LSB modulation.
    class: u32,
    /// Row-major block index; ascending matches (block-row, block-col).
    block: u32,
    /// Zig-zag index within the block.
    zz: u8,
}

/// Coefficient-domain view of a luminance plane plus its embedding order.
pub struct DctAnalysis {
    pub blocks: Vec<Block>,
    pub blocks_w: usize,
    pub blocks_h: usize,
    width: usize,
    height: usize,
    band_lo: usize,
    band_hi: usize,
    order: Vec<Candidate>,
}

impl DctAnalysis {
    /// Number of coefficients eligible to carry bits.
    pub fn eligible(&self) -> usize {
        self.order.len()
    }

    /// Whether a block contains no replicated padding.
    fn is_full(&self, idx: usize) -> bool {
        is_full_block(idx, self.blocks_w, self.width, self.height)
    }
}

/// Transform a luminance plane into coefficient blocks and derive the
/// embedding order for the given mid-frequency band.
pub fn analyze(y: &[f32], width: usize, height: usize, band_lo: usize, band_hi: usize) -> DctAnalysis {
    let band_lo = band_lo.max(1); // never touch DC
    let band_hi = band_hi.min(63);

    let dct = Dct8::new();
    let (mut blocks, blocks_w, blocks_h) = blockify(y, width, height);
    for block in &mut blocks {
        *block = dct.forward(block);
    }

    let mut analysis = DctAnalysis {
        blocks,
        blocks_w,
        blocks_h,
        width,
        height,
        band_lo,
        band_hi,
        order: Vec::new(),
    };
    // Blocks containing replicated padding are excluded: their padded samples
    // are regenerated from the cropped plane on extraction, which would not
    // reproduce the modulated coefficients.
    analysis.order = eligible_order(&analysis.blocks, band_lo, band_hi, |idx| {
        is_full_block(idx, blocks_w, width, height)
    });
    debug!(
        "analyzed {}x{} plane: {} blocks, {} eligible coefficients in band [{}, {}]",
        width,
        height,
        analysis.blocks.len(),
        analysis.order.len(),
        band_lo,
        band_hi
    );
    analysis
}

fn is_full_block(idx: usize, blocks_w: usize, width: usize, height: usize) -> bool {
    let (by, bx) = (idx / blocks_w, idx % blocks_w);
    (bx + 1) * BLOCK_DIM <= width && (by + 1) * BLOCK_DIM <= height
}

/// Invert an analysis back into a luminance plane of the original geometry.
pub fn synthesize(analysis: &DctAnalysis) -> Vec<f32> {
    let dct = Dct8::new();
    let spatial: Vec<Block> = analysis.blocks.iter().map(|b| dct.inverse(b)).collect();
    deblockify(&spatial, analysis.blocks_w, analysis.width, analysis.height)
}

/// Number of coefficients usable at `rate`, `ceil(rate * eligible)`.
pub fn capacity(eligible: usize, rate: f64) -> usize {
    (rate * eligible as f64).ceil() as usize
}

/// Write the 32-bit length prefix and the frame's bits into the carrier
/// coefficients. The caller has already verified capacity.
pub fn embed_frame(analysis: &mut DctAnalysis, frame: &[u8]) -> Result<()> {
    let required = LENGTH_PREFIX_BITS + 8 * frame.len();
    if required > analysis.order.len() {
        return Err(RuntimeError::Internal(
            "embed_frame called beyond verified capacity".to_string(),
        )
        .into());
    }

    // Commit every band coefficient of every full block to its quantized
    // value. The extractor recomputes coefficients from pixels and rounds;
    // a coefficient left at, say, 1.4999 could round the other way after
    // reconstruction noise and corrupt the derived order. Integers round
    // back to themselves with a wide margin.
    for idx in 0..analysis.blocks.len() {
        if !analysis.is_full(idx) {
            continue;
        }
        for zz in analysis.band_lo..=analysis.band_hi {
            let (row, col) = ZIGZAG[zz];
            let cell = &mut analysis.blocks[idx][row][col];
            *cell = cell.round();
        }
    }

    let len_bits = be_u32_bits(frame.len() as u32);
    let frame_bits = frame
        .iter()
        .flat_map(|&byte| (0..8).map(move |i| (byte >> (7 - i)) & 1 == 1));

    for (candidate, bit) in analysis.order.iter().zip(len_bits.chain(frame_bits)) {
        let (row, col) = ZIGZAG[candidate.zz as usize];
        let cell = &mut analysis.blocks[candidate.block as usize][row][col];
        *cell = modulate(*cell, bit);
    }

    Ok(())
}

/// Re-derive the order from a stego plane's analysis and read the frame back.
pub fn recover_frame(analysis: &DctAnalysis) -> Result<Vec<u8>> {
    let order = &analysis.order;
    if order.len() < LENGTH_PREFIX_BITS {
        return Err(IntegrityError::MarkerNotFound.into());
    }

    let mut frame_len: u32 = 0;
    for candidate in &order[..LENGTH_PREFIX_BITS] {
        frame_len = (frame_len << 1) | u32::from(read_bit(analysis, candidate));
    }

    let frame_bits = (frame_len as usize).checked_mul(8);
    let total = frame_bits.and_then(|b| b.checked_add(LENGTH_PREFIX_BITS));
    let total = match total {
        Some(total) if total <= order.len() => total,
        // A length that cannot fit this carrier means there is no frame.
        _ => return Err(IntegrityError::MarkerNotFound.into()),
    };

    let mut frame = Vec::with_capacity(frame_len as usize);
    let mut acc: u8 = 0;
    for (i, candidate) in order[LENGTH_PREFIX_BITS..total].iter().enumerate() {
        acc = (acc << 1) | u8::from(read_bit(analysis, candidate));
        if i % 8 == 7 {
            frame.push(acc);
            acc = 0;
        }
    }

    Ok(frame)
}

/// Collect and order every eligible coefficient.
///
/// Cost is `1/|q|`: larger magnitudes (textured regions) sort first. Ties are
/// broken by block position and zig-zag index, yielding a total order fixed
/// by the carrier.
fn eligible_order(
    blocks: &[Block],
    band_lo: usize,
    band_hi: usize,
    full: impl Fn(usize) -> bool,
) -> Vec<Candidate> {
    let band_lo = band_lo.max(1); // never touch DC
    let band_hi = band_hi.min(63);

    let mut order = Vec::new();
    for (block_idx, block) in blocks.iter().enumerate() {
        if !full(block_idx) {
            continue;
        }
        for zz in band_lo..=band_hi {
            let (row, col) = ZIGZAG[zz];
            let magnitude = block[row][col].round().abs() as u64;
            if magnitude >= 2 {
                order.push(Candidate {
                    class: (magnitude / 2) as u32,
                    block: block_idx as u32,
                    zz: zz as u8,
                });
            }
        }
    }

    order.sort_unstable_by_key(|c| (Reverse(c.class), c.block, c.zz));
    order
}

/// Set the LSB of the quantized magnitude, preserving sign.
fn modulate(value: f64, bit: bool) -> f64 {
    let q = value.round();
    let magnitude = q.abs() as u64;
    debug_assert!(magnitude >= 2, "selection admitted a sub-threshold coefficient");
    let written = (magnitude & !1) | u64::from(bit);
    if q < 0.0 {
        -(written as f64)
    } else {
        written as f64
    }
}

fn read_bit(analysis: &DctAnalysis, candidate: &Candidate) -> bool {
    let (row, col) = ZIGZAG[candidate.zz as usize];
    let q = analysis.blocks[candidate.block as usize][row][col].round();
    (q.abs() as u64) & 1 == 1
}

fn be_u32_bits(value: u32) -> impl Iterator<Item = bool> {
    (0..LENGTH_PREFIX_BITS).map(move |i| (value >> (31 - i)) & 1 == 1)
}

/// Split a plane into level-shifted 8x8 blocks, replicating the right and
/// bottom edges out to a multiple of 8.
fn blockify(plane: &[f32], width: usize, height: usize) -> (Vec<Block>, usize, usize) {
    let blocks_w = width.div_ceil(BLOCK_DIM);
    let blocks_h = height.div_ceil(BLOCK_DIM);

    let mut blocks = Vec::with_capacity(blocks_w * blocks_h);
    for by in 0..blocks_h {
        for bx in 0..blocks_w {
            let mut block = [[0.0; 8]; 8];
            for (r, row) in block.iter_mut().enumerate() {
                let src_y = (by * BLOCK_DIM + r).min(height - 1);
                for (c, cell) in row.iter_mut().enumerate() {
                    let src_x = (bx * BLOCK_DIM + c).min(width - 1);
                    *cell = f64::from(plane[src_y * width + src_x]) - 128.0;
                }
            }
            blocks.push(block);
        }
    }

    (blocks, blocks_w, blocks_h)
}

/// Reassemble a plane from spatial blocks, dropping the replicated padding.
fn deblockify(blocks: &[Block], blocks_w: usize, width: usize, height: usize) -> Vec<f32> {
    let mut plane = vec![0.0f32; width * height];
    for (y, x) in (0..height).flat_map(|y| (0..width).map(move |x| (y, x))) {
        let block = &blocks[(y / BLOCK_DIM) * blocks_w + x / BLOCK_DIM];
        plane[y * width + x] = (block[y % BLOCK_DIM][x % BLOCK_DIM] + 128.0) as f32;
    }
    plane
}
