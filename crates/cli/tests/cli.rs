//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: stegowire — Payloads hidden in carrier images.
//

//! Integration tests for the stegowire binary: exit codes, output shape,
//! and end-to-end recovery through the real subcommand surface.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn stegowire() -> Command {
    Command::cargo_bin("stegowire").expect("binary builds")
}

/// Textured cover image; deterministic, no RNG needed.
fn write_cover(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let mut img = image::RgbImage::new(width, height);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let a = (x.wrapping_mul(97).wrapping_add(y.wrapping_mul(211)) % 256) as u8;
        let b = ((x ^ y).wrapping_mul(53) % 256) as u8;
        let c = (x.wrapping_add(y).wrapping_mul(31) % 256) as u8;
        pixel.0 = [a ^ b, b.wrapping_add(c), c ^ a];
    }
    let path = dir.join(name);
    img.save(&path).unwrap();
    path
}

#[test]
fn embed_and_extract_append_round_trip() {
    let tmp = TempDir::new().unwrap();
    let cover = write_cover(tmp.path(), "cover.png", 64, 48);
    let payload = tmp.path().join("note.txt");
    fs::write(&payload, vec![b'a'; 1024]).unwrap();
    let stego = tmp.path().join("stego.png");

    stegowire()
        .args(["embed", "-m", "append"])
        .arg("-c").arg(&cover)
        .arg("-p").arg(&payload)
        .arg("-o").arg(&stego)
        .assert()
        .success()
        .stdout(predicate::str::contains("Mode: append"));

    // The stego begins with the untouched cover bytes.
    let cover_bytes = fs::read(&cover).unwrap();
    let stego_bytes = fs::read(&stego).unwrap();
    assert_eq!(&stego_bytes[..cover_bytes.len()], &cover_bytes[..]);

    let out = tmp.path().join("out");
    stegowire()
        .args(["extract"])
        .arg("-s").arg(&stego)
        .arg("-o").arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("sha256 verified"));

    assert_eq!(fs::read(out.join("note.txt")).unwrap(), vec![b'a'; 1024]);
}

#[test]
fn embed_and_extract_directory_payload() {
    let tmp = TempDir::new().unwrap();
    let cover = write_cover(tmp.path(), "cover.png", 32, 32);

    let tree = tmp.path().join("bundle");
    fs::create_dir(&tree).unwrap();
    fs::write(tree.join("a.txt"), b"hi\n").unwrap();
    fs::create_dir(tree.join("b")).unwrap();
    fs::write(tree.join("b/bin"), [0x00, 0x01, 0x02, 0x03]).unwrap();

    let stego = tmp.path().join("stego.bin");
    stegowire()
        .args(["embed", "-m", "append"])
        .arg("-c").arg(&cover)
        .arg("-p").arg(&tree)
        .arg("-o").arg(&stego)
        .assert()
        .success();

    let out = tmp.path().join("out");
    stegowire()
        .args(["extract"])
        .arg("-s").arg(&stego)
        .arg("-o").arg(&out)
        .assert()
        .success();

    assert_eq!(fs::read(out.join("a.txt")).unwrap(), b"hi\n");
    assert_eq!(fs::read(out.join("b/bin")).unwrap(), [0x00, 0x01, 0x02, 0x03]);
}

#[test]
fn encrypted_round_trip_and_wrong_password() {
    let tmp = TempDir::new().unwrap();
    let cover = write_cover(tmp.path(), "cover.png", 32, 32);
    let payload = tmp.path().join("secret.bin");
    fs::write(&payload, b"meet at the usual place").unwrap();
    let stego = tmp.path().join("stego.bin");

    stegowire()
        .args(["embed", "-m", "append", "--encrypt", "--password", "pw"])
        .arg("-c").arg(&cover)
        .arg("-p").arg(&payload)
        .arg("-o").arg(&stego)
        .assert()
        .success();

    // Wrong password: integrity failure, exit 5.
    stegowire()
        .args(["extract", "--password", "wrong"])
        .arg("-s").arg(&stego)
        .arg("-o").arg(tmp.path().join("w"))
        .assert()
        .failure()
        .code(5);

    // No password at all also fails the tag check.
    stegowire()
        .args(["extract"])
        .arg("-s").arg(&stego)
        .arg("-o").arg(tmp.path().join("n"))
        .assert()
        .failure()
        .code(5);

    let out = tmp.path().join("ok");
    stegowire()
        .args(["extract", "--password", "pw"])
        .arg("-s").arg(&stego)
        .arg("-o").arg(&out)
        .assert()
        .success();
    assert_eq!(
        fs::read(out.join("secret.bin")).unwrap(),
        b"meet at the usual place"
    );
}

#[test]
fn password_from_environment_variable() {
    let tmp = TempDir::new().unwrap();
    let cover = write_cover(tmp.path(), "cover.png", 32, 32);
    let payload = tmp.path().join("p.txt");
    fs::write(&payload, b"env secret").unwrap();
    let stego = tmp.path().join("stego.bin");

    stegowire()
        .args(["embed", "-m", "append", "--encrypt", "--pass-env", "STEGOWIRE_TEST_PW"])
        .env("STEGOWIRE_TEST_PW", "hunter2")
        .arg("-c").arg(&cover)
        .arg("-p").arg(&payload)
        .arg("-o").arg(&stego)
        .assert()
        .success();

    let out = tmp.path().join("out");
    stegowire()
        .args(["extract", "--pass-env", "STEGOWIRE_TEST_PW"])
        .env("STEGOWIRE_TEST_PW", "hunter2")
        .arg("-s").arg(&stego)
        .arg("-o").arg(&out)
        .assert()
        .success();
    assert_eq!(fs::read(out.join("p.txt")).unwrap(), b"env secret");
}

#[test]
fn missing_pass_env_variable_is_an_argument_error() {
    let tmp = TempDir::new().unwrap();
    let cover = write_cover(tmp.path(), "cover.png", 16, 16);
    let payload = tmp.path().join("p.txt");
    fs::write(&payload, b"x").unwrap();

    stegowire()
        .args(["embed", "-m", "append", "--encrypt", "--pass-env", "STEGOWIRE_ABSENT_VAR"])
        .env_remove("STEGOWIRE_ABSENT_VAR")
        .arg("-c").arg(&cover)
        .arg("-p").arg(&payload)
        .arg("-o").arg(tmp.path().join("s.bin"))
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("STEGOWIRE_ABSENT_VAR"));
}

#[test]
fn unknown_mode_is_an_argument_error() {
    let tmp = TempDir::new().unwrap();
    let cover = write_cover(tmp.path(), "cover.png", 16, 16);
    let payload = tmp.path().join("p.txt");
    fs::write(&payload, b"x").unwrap();

    stegowire()
        .args(["embed", "-m", "lsb"])
        .arg("-c").arg(&cover)
        .arg("-p").arg(&payload)
        .arg("-o").arg(tmp.path().join("s.bin"))
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("unknown embed mode"));
}

#[test]
fn tampering_inside_metadata_exits_with_integrity_code() {
    let tmp = TempDir::new().unwrap();
    let cover = write_cover(tmp.path(), "cover.png", 32, 32);
    let payload = tmp.path().join("p.bin");
    fs::write(&payload, vec![b'a'; 1024]).unwrap();
    let stego = tmp.path().join("stego.bin");

    stegowire()
        .args(["embed", "-m", "append"])
        .arg("-c").arg(&cover)
        .arg("-p").arg(&payload)
        .arg("-o").arg(&stego)
        .assert()
        .success();

    let mut bytes = fs::read(&stego).unwrap();
    let offset = bytes.len() - 40;
    bytes[offset] ^= 0xff;
    fs::write(&stego, &bytes).unwrap();

    stegowire()
        .args(["extract"])
        .arg("-s").arg(&stego)
        .arg("-o").arg(tmp.path().join("out"))
        .assert()
        .failure()
        .code(5);
}

#[test]
fn dct_capacity_exhaustion_exits_with_runtime_code() {
    let tmp = TempDir::new().unwrap();
    let cover = write_cover(tmp.path(), "cover.png", 128, 128);
    let payload = tmp.path().join("big.bin");
    let body: Vec<u8> = (0..100_000u32).map(|i| (i.wrapping_mul(2654435761) >> 24) as u8).collect();
    fs::write(&payload, &body).unwrap();

    stegowire()
        .args(["embed", "-m", "dct", "--rate", "0.04"])
        .arg("-c").arg(&cover)
        .arg("-p").arg(&payload)
        .arg("-o").arg(tmp.path().join("s.jpg"))
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("not enough capacity"));
}

#[test]
fn dct_embed_writes_a_jpeg() {
    let tmp = TempDir::new().unwrap();
    let cover = write_cover(tmp.path(), "cover.png", 256, 256);
    let payload = tmp.path().join("p.bin");
    fs::write(&payload, b"short secret payload").unwrap();
    let stego = tmp.path().join("stego.jpg");

    stegowire()
        .args(["embed", "-m", "dct"])
        .arg("-c").arg(&cover)
        .arg("-p").arg(&payload)
        .arg("-o").arg(&stego)
        .assert()
        .success()
        .stdout(predicate::str::contains("Coefficients:"));

    let bytes = fs::read(&stego).unwrap();
    assert_eq!(&bytes[..2], &[0xff, 0xd8]);
}

#[test]
fn metrics_of_identical_images_reports_infinite_psnr() {
    let tmp = TempDir::new().unwrap();
    let cover = write_cover(tmp.path(), "cover.png", 32, 32);

    stegowire()
        .args(["metrics"])
        .arg("--cover").arg(&cover)
        .arg("--stego").arg(&cover)
        .assert()
        .success()
        .stdout(predicate::str::contains("PSNR: inf dB"))
        .stdout(predicate::str::contains("RMSE: 0.0000"));
}

#[test]
fn inspect_prints_metadata_json() {
    let tmp = TempDir::new().unwrap();
    let cover = write_cover(tmp.path(), "cover.png", 32, 32);
    let payload = tmp.path().join("doc.pdf");
    fs::write(&payload, b"%PDF-1.4 pretend").unwrap();
    let stego = tmp.path().join("stego.bin");

    stegowire()
        .args(["embed", "-m", "append"])
        .arg("-c").arg(&cover)
        .arg("-p").arg(&payload)
        .arg("-o").arg(&stego)
        .assert()
        .success();

    let output = stegowire()
        .args(["inspect", "--json"])
        .arg("-s").arg(&stego)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let meta: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(meta["mode"], "append");
    assert_eq!(meta["source_name"], "doc.pdf");
    assert_eq!(meta["encrypted"], false);
}

#[test]
fn bench_appends_csv_rows() {
    let tmp = TempDir::new().unwrap();
    let covers = tmp.path().join("covers");
    fs::create_dir(&covers).unwrap();
    write_cover(&covers, "one.png", 48, 48);
    write_cover(&covers, "two.png", 64, 64);
    fs::write(covers.join("ignored.txt"), b"not an image").unwrap();

    let payload = tmp.path().join("p.bin");
    fs::write(&payload, vec![b'z'; 256]).unwrap();
    let report = tmp.path().join("bench.csv");

    stegowire()
        .args(["bench", "-m", "append"])
        .arg("--covers").arg(&covers)
        .arg("--payload").arg(&payload)
        .arg("--report").arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 covers"));

    let contents = fs::read_to_string(&report).unwrap();
    let mut lines = contents.lines();
    assert!(lines.next().unwrap().starts_with("cover_path"));
    assert_eq!(contents.lines().count(), 3);
    assert!(contents.contains("one.png"));
    assert!(contents.contains(",ok"));
}

#[test]
fn extract_from_missing_file_is_an_argument_error() {
    let tmp = TempDir::new().unwrap();
    stegowire()
        .args(["extract"])
        .arg("-s").arg(tmp.path().join("absent.bin"))
        .arg("-o").arg(tmp.path().join("out"))
        .assert()
        .failure()
        .code(2);
}

#[test]
fn extract_from_plain_file_is_an_integrity_error() {
    let tmp = TempDir::new().unwrap();
    let plain = tmp.path().join("plain.txt");
    fs::write(&plain, b"there is nothing hidden in this file").unwrap();

    stegowire()
        .args(["extract"])
        .arg("-s").arg(&plain)
        .arg("-o").arg(tmp.path().join("out"))
        .assert()
        .failure()
        .code(5)
        .stderr(predicate::str::contains("marker not found"));
}
