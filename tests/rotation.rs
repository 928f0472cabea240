// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs;
use std::io;
use std::io::Read;
use std::io::Write;
use std::path::Path;

use cyclefile::ErrorKind;
use cyclefile::OpenMode;
use cyclefile::RotatingWriter;
use tempfile::TempDir;

fn fresh_writer(path: &Path, max_length: u64, max_backups: usize) -> RotatingWriter {
    RotatingWriter::builder(path, max_length, max_backups)
        .mode(OpenMode::CreateOrTruncate)
        .build()
        .unwrap()
}

#[test]
fn test_writes_within_capacity_do_not_rotate() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let path = temp_dir.path().join("log.txt");
    let mut writer = fresh_writer(&path, 100, 3);

    let mut expected = 0;
    for chunk in [&b"0123456789"[..], b"abc", b"", b"0123456789012345678901234567890123456789"] {
        writer.write_all(chunk).unwrap();
        expected += chunk.len() as u64;
        assert_eq!(writer.position(), expected);
        assert_eq!(writer.next_slot(), 0);
    }

    // filling up to the limit exactly is still within capacity
    let rest = vec![b'z'; (100 - expected) as usize];
    writer.write_all(&rest).unwrap();
    writer.flush().unwrap();

    assert_eq!(writer.next_slot(), 0);
    assert_eq!(fs::metadata(&path).unwrap().len(), 100);
    assert!(!writer.config().backup_path(0).exists());
}

#[test]
fn test_split_write_across_rotation() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let path = temp_dir.path().join("log.txt");
    let mut writer = fresh_writer(&path, 10, 2);

    writer.write_all(b"ABCDEFGHIJKL").unwrap();
    writer.flush().unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"KL");
    assert_eq!(fs::read(temp_dir.path().join("log0.txt")).unwrap(), b"ABCDEFGHIJ");
    assert_eq!(writer.next_slot(), 1);
    assert_eq!(writer.position(), 2);
}

#[test]
fn test_backup_matches_content_before_rotation() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let path = temp_dir.path().join("trace.log");
    let mut writer = fresh_writer(&path, 32, 4);

    writer.write_all(b"first line of the trace\n").unwrap();
    writer.flush().unwrap();
    let before = fs::read(&path).unwrap();

    writer.write_all(b"second line of the trace\n").unwrap();
    writer.flush().unwrap();

    // 24 bytes on disk, 8 more fit before the rotation
    let mut archived = before.clone();
    archived.extend_from_slice(b"second l");
    assert_eq!(fs::read(writer.config().backup_path(0)).unwrap(), archived);
    assert_eq!(fs::read(&path).unwrap(), b"ine of the trace\n");
}

#[test]
fn test_slots_are_reused_round_robin() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let path = temp_dir.path().join("log.txt");
    let mut writer = fresh_writer(&path, 10, 2);

    for fill in [b'a', b'b', b'c', b'd'] {
        writer.write_all(&[fill; 10]).unwrap();
    }
    writer.flush().unwrap();

    assert_eq!(writer.next_slot(), 1);
    assert_eq!(fs::read(temp_dir.path().join("log0.txt")).unwrap(), [b'c'; 10]);
    assert_eq!(fs::read(temp_dir.path().join("log1.txt")).unwrap(), [b'b'; 10]);
    assert_eq!(fs::read(&path).unwrap(), [b'd'; 10]);
    assert!(!temp_dir.path().join("log2.txt").exists());
}

#[test]
fn test_large_write_spans_several_rotations() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let path = temp_dir.path().join("log.txt");
    let mut writer = fresh_writer(&path, 4, 5);

    writer.write_all(b"aaaabbbbccccdd").unwrap();
    writer.flush().unwrap();

    assert_eq!(writer.next_slot(), 3);
    assert_eq!(fs::read(temp_dir.path().join("log0.txt")).unwrap(), b"aaaa");
    assert_eq!(fs::read(temp_dir.path().join("log1.txt")).unwrap(), b"bbbb");
    assert_eq!(fs::read(temp_dir.path().join("log2.txt")).unwrap(), b"cccc");
    assert_eq!(fs::read(&path).unwrap(), b"dd");
}

#[test]
fn test_reject_oversized_unsplit_write() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let path = temp_dir.path().join("log.txt");
    let mut writer = RotatingWriter::builder(&path, 100, 3)
        .mode(OpenMode::CreateOrTruncate)
        .split_writes(false)
        .build()
        .unwrap();

    writer.write_all(&[b'x'; 20]).unwrap();
    writer.flush().unwrap();

    let err = writer.write_slice(&[b'y'; 150], 0, 150).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BufferExceedsCapacity);

    let err = writer.write(&[b'y'; 150]).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

    writer.flush().unwrap();
    assert_eq!(fs::read(&path).unwrap(), [b'x'; 20]);
    assert_eq!(writer.position(), 20);
    assert_eq!(writer.next_slot(), 0);
    assert!(!writer.config().backup_path(0).exists());

    // a write of exactly the maximum length still fits after a rotation
    writer.write_all(&[b'z'; 100]).unwrap();
    writer.flush().unwrap();
    assert_eq!(fs::read(writer.config().backup_path(0)).unwrap(), [b'x'; 20]);
    assert_eq!(fs::read(&path).unwrap(), [b'z'; 100]);
}

#[test]
fn test_backup_names_use_construction_width() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let path = temp_dir.path().join("log.txt");
    let mut writer = fresh_writer(&path, 1, 150);

    writer.write_all(b"012345678").unwrap();
    writer.flush().unwrap();

    assert_eq!(writer.config().decimal_width(), 3);
    assert_eq!(writer.next_slot(), 8);
    assert_eq!(fs::read(temp_dir.path().join("log007.txt")).unwrap(), b"7");
    assert_eq!(fs::read(temp_dir.path().join("log000.txt")).unwrap(), b"0");
    assert_eq!(fs::read(&path).unwrap(), b"8");
}

#[test]
fn test_count_is_clamped_to_buffer() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let path = temp_dir.path().join("log.txt");
    let mut writer = fresh_writer(&path, 100, 2);

    writer.write_slice(b"hello", 1, 100).unwrap();
    writer.write_slice(b"world", 9, 3).unwrap();
    writer.write_slice(b"!?", 0, 1).unwrap();
    writer.flush().unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"ello!");
    assert_eq!(writer.position(), 5);
}

#[test]
fn test_create_or_truncate_clears_backups() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let dir = temp_dir.path();
    fs::write(dir.join("log.txt"), b"stale current").unwrap();
    fs::write(dir.join("log0.txt"), b"stale 0").unwrap();
    fs::write(dir.join("log1.txt"), b"stale 1").unwrap();
    // outside the configured slot range
    fs::write(dir.join("log2.txt"), b"stale 2").unwrap();

    let writer = fresh_writer(&dir.join("log.txt"), 10, 2);
    assert_eq!(writer.next_slot(), 0);
    assert_eq!(writer.position(), 0);
    writer.close().unwrap();

    assert_eq!(fs::read(dir.join("log.txt")).unwrap(), b"");
    assert!(!dir.join("log0.txt").exists());
    assert!(!dir.join("log1.txt").exists());
    assert!(dir.join("log2.txt").exists());
}

#[test]
fn test_create_new_fails_on_existing_file() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let path = temp_dir.path().join("log.txt");
    fs::write(&path, b"keep me").unwrap();

    let err = RotatingWriter::builder(&path, 10, 2)
        .mode(OpenMode::CreateNew)
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(io::Error::from(err).kind(), io::ErrorKind::AlreadyExists);
    assert_eq!(fs::read(&path).unwrap(), b"keep me");
}

#[test]
fn test_invalid_configuration() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let path = temp_dir.path().join("log.txt");

    let err = RotatingWriter::builder(&path, 0, 2).build().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);

    let err = RotatingWriter::builder(&path, 10, 0).build().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);

    // nothing is created for a rejected configuration
    assert!(!path.exists());
}

#[test]
fn test_reads_are_unsupported() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let path = temp_dir.path().join("log.txt");
    let mut writer = fresh_writer(&path, 10, 2);
    writer.write_all(b"data").unwrap();

    assert!(!writer.can_read());
    let mut buf = [0; 4];
    let err = writer.read(&mut buf).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::Unsupported);
}
