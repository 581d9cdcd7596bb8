//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: stegowire — Payloads hidden in carrier images.
//

//! Embed modes, channel presets, and call-time option records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::ArgError;

/// Version of the metadata record written into every frame.
pub const FORMAT_VERSION: u32 = 2;

/// Embedding mode selected per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedMode {
    /// Concatenate the framed blob after the carrier bytes.
    Append,
    /// Modulate mid-frequency AC coefficients of the luminance plane.
    Dct,
}

impl FromStr for EmbedMode {
    type Err = ArgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "append" => Ok(EmbedMode::Append),
            "dct" => Ok(EmbedMode::Dct),
            other => Err(ArgError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for EmbedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbedMode::Append => f.write_str("append"),
            EmbedMode::Dct => f.write_str("dct"),
        }
    }
}

/// Named parameter bundle tuning the DCT codec for a transport channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelPreset {
    None,
    Whatsapp,
    Telegram,
}

impl ChannelPreset {
    /// Resolve the preset to its concrete tuning values.
    pub fn tuning(self) -> ChannelTuning {
        match self {
            ChannelPreset::None => ChannelTuning {
                quality: 95,
                band_lo: 6,
                band_hi: 28,
                rate_cap: 1.0,
            },
            ChannelPreset::Whatsapp => ChannelTuning {
                quality: 85,
                band_lo: 10,
                band_hi: 24,
                rate_cap: 0.05,
            },
            ChannelPreset::Telegram => ChannelTuning {
                quality: 87,
                band_lo: 10,
                band_hi: 26,
                rate_cap: 0.08,
            },
        }
    }

    /// All recognized presets, in extraction probe order.
    pub fn all() -> [ChannelPreset; 3] {
        [
            ChannelPreset::None,
            ChannelPreset::Whatsapp,
            ChannelPreset::Telegram,
        ]
    }
}

impl FromStr for ChannelPreset {
    type Err = ArgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(ChannelPreset::None),
            "whatsapp" => Ok(ChannelPreset::Whatsapp),
            "telegram" => Ok(ChannelPreset::Telegram),
            other => Err(ArgError::UnknownChannel(other.to_string())),
        }
    }
}

impl fmt::Display for ChannelPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelPreset::None => f.write_str("none"),
            ChannelPreset::Whatsapp => f.write_str("whatsapp"),
            ChannelPreset::Telegram => f.write_str("telegram"),
        }
    }
}

/// Concrete tuning values behind a [`ChannelPreset`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelTuning {
    /// JPEG quality of the persisted stego image.
    pub quality: u8,
    /// Lowest zig-zag index of the mid-frequency band (inclusive).
    pub band_lo: usize,
    /// Highest zig-zag index of the mid-frequency band (inclusive).
    pub band_hi: usize,
    /// Upper bound applied to a user-supplied rate.
    pub rate_cap: f64,
}

/// Call-time options for an embed.
pub struct EmbedOptions {
    pub mode: EmbedMode,
    /// Fraction of eligible coefficients usable as carriers, in (0, 1].
    pub rate: f64,
    pub channel: ChannelPreset,
    /// `Some` enables AES-256-GCM over the compressed payload.
    pub password: Option<Zeroizing<String>>,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            mode: EmbedMode::Append,
            rate: 1.0,
            channel: ChannelPreset::None,
            password: None,
        }
    }
}

/// Call-time options for an extract.
#[derive(Default)]
pub struct ExtractOptions {
    pub password: Option<Zeroizing<String>>,
}

/// Reject rates outside (0, 1].
pub fn validate_rate(rate: f64) -> Result<(), ArgError> {
    if rate.is_finite() && rate > 0.0 && rate <= 1.0 {
        Ok(())
    } else {
        Err(ArgError::BadRate(rate))
    }
}
