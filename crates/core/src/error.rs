//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: stegowire — Payloads hidden in carrier images.
//

//! Unified error hierarchy for the stegowire workspace.
//!
//! Four error kinds, each mapped to a process exit code: argument errors (2),
//! I/O errors (4), runtime errors (3), and integrity errors (5).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level unified error type for stegowire operations
#[derive(Error, Debug)]
pub enum StegoError {
    #[error(transparent)]
    Arg(#[from] ArgError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

impl StegoError {
    /// Process exit code for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            StegoError::Arg(_) => 2,
            StegoError::Runtime(_) => 3,
            StegoError::Io(_) => 4,
            StegoError::Integrity(_) => 5,
        }
    }
}

/// Errors caused by inconsistent user-provided arguments
#[derive(Error, Debug)]
pub enum ArgError {
    #[error("unknown embed mode: '{0}' (expected 'append' or 'dct')")]
    UnknownMode(String),

    #[error("unknown channel preset: '{0}' (expected 'none', 'whatsapp' or 'telegram')")]
    UnknownChannel(String),

    #[error("rate must lie in (0, 1], got {0}")]
    BadRate(f64),

    #[error("path does not exist: {0}")]
    MissingPath(PathBuf),

    #[error("--encrypt requires a password (--password or --pass-env)")]
    MissingPassword,

    #[error("--password/--pass-env has no effect without --encrypt")]
    PasswordWithoutEncrypt,

    #[error("environment variable '{0}' is not set")]
    MissingEnvVar(String),

    #[error("image dimensions differ: {cover_w}x{cover_h} vs {stego_w}x{stego_h}")]
    DimensionMismatch {
        cover_w: u32,
        cover_h: u32,
        stego_w: u32,
        stego_h: u32,
    },
}

/// Errors at the file and image boundaries
#[derive(Error, Debug)]
pub enum IoError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode stego image: {0}")]
    ImageEncode(#[source] image::ImageError),

    #[error("archive error: {0}")]
    Archive(#[source] std::io::Error),
}

/// Errors raised by the compressor, the codecs, or violated internal invariants
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("not enough capacity: payload needs {required} bits, carrier offers {available}")]
    NotEnoughCapacity { required: u64, available: u64 },

    #[error("unrecognized compression signature")]
    BadSignature,

    #[error("invalid compressed stream: {0}")]
    InvalidStream(&'static str),

    #[error("dictionary index {index} out of range (max {max})")]
    IndexOutOfRange { index: u64, max: u64 },

    #[error("decompressed length {actual} does not match header length {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("deflate stream error: {0}")]
    Deflate(String),

    #[error("payload is empty")]
    EmptyPayload,

    #[error("allocation of {0} bytes failed")]
    AllocationFailed(usize),

    #[error("encryption failed")]
    EncryptionFailed,

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

/// Errors detected while verifying a recovered payload
#[derive(Error, Debug)]
pub enum IntegrityError {
    #[error("payload marker not found in container")]
    MarkerNotFound,

    #[error("cover already contains the payload marker; choose a different cover")]
    MarkerCollision,

    #[error("metadata header is malformed: {0}")]
    MalformedMetadata(String),

    #[error("sha-256 digest mismatch: expected {expected}, found {found}")]
    DigestMismatch { expected: String, found: String },

    #[error("payload blob is corrupt: {0}")]
    CorruptBlob(String),

    #[error("ciphertext shorter than nonce and authentication tag")]
    CiphertextTruncated,

    #[error("decryption failed: authentication tag mismatch")]
    TagMismatch,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StegoError>;
