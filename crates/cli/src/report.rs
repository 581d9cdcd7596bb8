//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: stegowire — Payloads hidden in carrier images.
//

//! CSV report rows for the bench subcommand.

use std::fs::{File, OpenOptions};
use std::path::Path;

use serde::Serialize;
use stegowire_core::{IoError, StegoError};

/// One row per (cover, outcome). Failed embeds leave the measurement
/// columns empty and describe the failure in `status`.
#[derive(Serialize, Debug)]
pub struct BenchRow {
    pub cover_path: String,
    pub plain_size: Option<u64>,
    pub comp_method: Option<String>,
    pub comp_ratio: Option<f64>,
    pub stego_size: Option<u64>,
    pub latency_ms: u64,
    pub psnr: Option<f64>,
    pub rmse: Option<f64>,
    pub status: String,
}

/// Open a report for appending. The header row is written only when the
/// file is created by this call.
pub fn open_report(path: &Path) -> Result<csv::Writer<File>, StegoError> {
    let new_file = !path.exists();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| IoError::Write {
            path: path.to_path_buf(),
            source: e,
        })?;
    Ok(csv::WriterBuilder::new()
        .has_headers(new_file)
        .from_writer(file))
}

/// Serialize one row, mapping csv failures onto the report path.
pub fn append_row(
    writer: &mut csv::Writer<File>,
    path: &Path,
    row: &BenchRow,
) -> Result<(), StegoError> {
    writer.serialize(row).map_err(|e| {
        IoError::Write {
            path: path.to_path_buf(),
            source: std::io::Error::other(e),
        }
        .into()
    })
}
