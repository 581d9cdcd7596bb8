//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: stegowire — Payloads hidden in carrier images.
//

//! # Stegowire Core
//!
//! Hides arbitrary payloads (files or whole directories) inside carrier
//! images and recovers them bit-exactly, targeting transport over messaging
//! channels that re-wrap files but preserve their bytes.
//!
//! ## Key Features
//!
//! - **Append codec**: attaches the framed payload after the carrier's
//!   end-of-image bytes; zero pixel distortion (PSNR = inf)
//! - **DCT codec**: modulates mid-frequency AC coefficients of the luminance
//!   plane on an 8x8 block grid, with per-channel presets for WhatsApp and
//!   Telegram transports
//! - **Adaptive compression**: races deflate against a from-scratch LZ78 and
//!   commits to the smaller, self-describing output
//! - **Optional encryption**: AES-256-GCM over the compressed payload
//! - **Integrity**: SHA-256 of the plaintext verified on every extract
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use stegowire_core::{embed, extract, EmbedMode, EmbedOptions, ExtractOptions};
//!
//! # fn main() -> Result<(), stegowire_core::StegoError> {
//! let opts = EmbedOptions {
//!     mode: EmbedMode::Append,
//!     ..EmbedOptions::default()
//! };
//! embed(
//!     Path::new("cover.jpg"),
//!     Path::new("notes.txt"),
//!     Path::new("stego.jpg"),
//!     &opts,
//! )?;
//!
//! extract(Path::new("stego.jpg"), Path::new("out/"), &ExtractOptions::default())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`compress`] - adaptive LZ77/LZ78 compressor
//! - [`crypto`] - AES-256-GCM wrapper and key derivation
//! - [`frame`] - marker, metadata record, and frame assembly
//! - [`append`] - structure-preserving append codec
//! - [`dct`] - content-adaptive DCT codec
//! - [`carrier`] - image decoding and BT.601 color planes
//! - [`archive`] - deterministic directory archives
//! - [`metrics`] - PSNR/RMSE fidelity metrics
//! - [`pipeline`] - embed/extract orchestration

pub mod append;
pub mod archive;
pub mod carrier;
pub mod compress;
pub mod config;
pub mod crypto;
pub mod dct;
pub mod error;
pub mod frame;
pub mod metrics;
pub mod pipeline;

pub use compress::{compress_auto, decompress, Compressed, CompressionMethod};
pub use config::{
    validate_rate, ChannelPreset, ChannelTuning, EmbedMode, EmbedOptions, ExtractOptions,
    FORMAT_VERSION,
};
pub use error::{ArgError, IntegrityError, IoError, Result, RuntimeError, StegoError};
pub use frame::{Metadata, SourceKind, MARKER};
pub use metrics::{compare_files, Fidelity};
pub use pipeline::{embed, extract, inspect, DctStats, EmbedSummary, ExtractSummary};
