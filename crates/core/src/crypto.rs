//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: stegowire — Payloads hidden in carrier images.
//

//! Optional AEAD layer over the compressed payload.
//!
//! AES-256-GCM with a fresh 96-bit nonce per embed and an empty AAD. The key
//! is SHA-256 of the password bytes — deliberately weak against brute force
//! but kept for bit-compatibility with stego files already in the wild.
//! Ciphertext blob layout: `nonce || ciphertext || tag`.

use aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::{IntegrityError, RuntimeError, StegoError};

/// AES-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;
/// AES-GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Derive the AES-256 key from a password.
///
/// The digest lives in a zeroizing buffer so key material does not linger
/// after the call that used it.
pub fn derive_key(password: &str) -> Zeroizing<[u8; 32]> {
    Zeroizing::new(Sha256::digest(password.as_bytes()).into())
}

/// Encrypt a compressed blob. The nonce is drawn from the OS CSPRNG.
pub fn encrypt(key: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>, StegoError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| RuntimeError::EncryptionFailed)?;

    let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypt a blob produced by [`encrypt`]. A bad key or any tampering
/// surfaces as a tag mismatch.
pub fn decrypt(key: &[u8; 32], blob: &[u8]) -> Result<Vec<u8>, StegoError> {
    if blob.len() < NONCE_LEN + TAG_LEN {
        return Err(IntegrityError::CiphertextTruncated.into());
    }
    let (nonce, ciphertext) = blob.split_at(NONCE_LEN);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| IntegrityError::TagMismatch.into())
}

/// Hex-encoded SHA-256 digest, used for plaintext integrity metadata.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_derivation_is_deterministic() {
        let a = derive_key("correct horse");
        let b = derive_key("correct horse");
        assert_eq!(*a, *b);
        assert_ne!(*a, *derive_key("battery staple"));
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let key = derive_key("pw");
        let plaintext = b"compressed payload bytes";

        let blob = encrypt(&key, plaintext).unwrap();
        assert_eq!(blob.len(), NONCE_LEN + plaintext.len() + TAG_LEN);
        assert_ne!(&blob[NONCE_LEN..NONCE_LEN + plaintext.len()], plaintext);

        let decrypted = decrypt(&key, &blob).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_nonce_is_fresh_per_call() {
        let key = derive_key("pw");
        let a = encrypt(&key, b"same input").unwrap();
        let b = encrypt(&key, b"same input").unwrap();
        assert_ne!(a[..NONCE_LEN], b[..NONCE_LEN]);
    }

    #[test]
    fn test_wrong_key_fails_with_tag_mismatch() {
        let blob = encrypt(&derive_key("pw"), b"secret").unwrap();
        let err = decrypt(&derive_key("not-pw"), &blob).unwrap_err();
        assert!(matches!(
            err,
            StegoError::Integrity(IntegrityError::TagMismatch)
        ));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = derive_key("pw");
        let mut blob = encrypt(&key, b"secret").unwrap();
        let mid = blob.len() / 2;
        blob[mid] ^= 0x40;
        assert!(decrypt(&key, &blob).is_err());
    }

    #[test]
    fn test_truncated_blob_rejected() {
        let key = derive_key("pw");
        let err = decrypt(&key, &[0u8; NONCE_LEN]).unwrap_err();
        assert!(matches!(
            err,
            StegoError::Integrity(IntegrityError::CiphertextTruncated)
        ));
    }

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
