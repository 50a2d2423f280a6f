use std::collections::BTreeMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use obbkit_core::{ObbError, RewriteJob};
use zip::CompressionMethod;
use zip::ZipArchive;
use zip::unstable::write::FileOptionsExt;
use zip::write::{SimpleFileOptions, ZipWriter};

const PASSWORD: &str = "p4ssw0rd!";

fn build_encrypted(path: &Path, entries: &[(&str, &[u8])]) {
    let file = fs::File::create(path).expect("create archive");
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .with_deprecated_encryption(PASSWORD.as_bytes());
    for (name, body) in entries {
        writer.start_file(*name, options.clone()).expect("start_file");
        writer.write_all(body).expect("write entry");
    }
    writer.finish().expect("finish");
}

fn read_back(path: &Path, password: &str) -> BTreeMap<String, Vec<u8>> {
    let file = fs::File::open(path).expect("open archive");
    let mut archive = ZipArchive::new(file).expect("read archive");
    let mut out = BTreeMap::new();
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index_decrypt(index, password.as_bytes())
            .expect("decrypt entry");
        let mut body = Vec::new();
        entry.read_to_end(&mut body).expect("read entry");
        out.insert(entry.name().to_string(), body);
    }
    out
}

fn job(archive: &Path, scratch: &Path, password: &str, content: &[u8]) -> RewriteJob {
    RewriteJob {
        archive_path: archive.to_path_buf(),
        password: password.to_string(),
        scratch_dir: scratch.to_path_buf(),
        entry_name: "setting.cfg".to_string(),
        entry_content: content.to_vec(),
    }
}

fn temp_archive(archive: &Path) -> PathBuf {
    let mut name = archive.file_name().expect("file name").to_os_string();
    name.push(".tmp");
    archive.with_file_name(name)
}

#[test]
fn rewrite_replaces_target_and_keeps_every_other_entry() {
    let dir = tempfile::tempdir().expect("tempdir");
    let archive = dir.path().join("main.obb");
    let level: Vec<u8> = (0..40_000u32).map(|i| (i % 256) as u8).collect();
    build_encrypted(
        &archive,
        &[
            ("setting.cfg", b"serverUrl = \"http://old/\"".as_slice()),
            ("data/level1.bin", level.as_slice()),
            ("music/bgm.dat", b"0123456789".as_slice()),
        ],
    );

    // A realistic replacement block, padded to a fixed size.
    let mut replacement = b"[server]\nserverUrl = \"http://localhost:8080/\"\n".to_vec();
    replacement.resize(500, b'#');

    let scratch = dir.path().join("scratch");
    job(&archive, &scratch, PASSWORD, &replacement)
        .run()
        .expect("rewrite");

    let tree = read_back(&archive, PASSWORD);
    assert_eq!(tree["setting.cfg"], replacement);
    assert_eq!(tree["data/level1.bin"], level);
    assert_eq!(tree["music/bgm.dat"], b"0123456789".to_vec());
    assert_eq!(tree.len(), 3);

    assert!(!scratch.exists());
    assert!(!temp_archive(&archive).exists());
}

#[test]
fn wrong_password_fails_and_leaves_everything_untouched() {
    let dir = tempfile::tempdir().expect("tempdir");
    let archive = dir.path().join("main.obb");
    build_encrypted(&archive, &[("setting.cfg", b"original".as_slice())]);
    let before = fs::read(&archive).expect("read original");

    let scratch = dir.path().join("scratch");
    let err = job(&archive, &scratch, "not-the-password", b"new")
        .run()
        .expect_err("must fail");

    assert!(matches!(err, ObbError::Extract(_)));
    assert_eq!(fs::read(&archive).expect("re-read original"), before);
    assert!(!scratch.exists());
    assert!(!temp_archive(&archive).exists());
}

#[test]
fn missing_archive_is_source_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let archive = dir.path().join("absent.obb");
    let scratch = dir.path().join("scratch");

    let err = job(&archive, &scratch, PASSWORD, b"new")
        .run()
        .expect_err("must fail");
    assert!(matches!(err, ObbError::SourceNotFound(_)));
    assert!(!scratch.exists());
}

#[test]
fn absent_entry_is_synthesized_at_the_root() {
    let dir = tempfile::tempdir().expect("tempdir");
    let archive = dir.path().join("main.obb");
    build_encrypted(&archive, &[("data/level1.bin", b"payload".as_slice())]);

    let scratch = dir.path().join("scratch");
    let content = b"[server]\nserverUrl = \"http://localhost/\"\n";
    job(&archive, &scratch, PASSWORD, content)
        .run()
        .expect("rewrite");

    let tree = read_back(&archive, PASSWORD);
    assert_eq!(tree["setting.cfg"], content.to_vec());
    assert_eq!(tree["data/level1.bin"], b"payload".to_vec());
}

#[test]
fn nested_entry_is_patched_in_place() {
    let dir = tempfile::tempdir().expect("tempdir");
    let archive = dir.path().join("main.obb");
    build_encrypted(
        &archive,
        &[
            ("cfg/setting.cfg", b"old".as_slice()),
            ("data/level1.bin", b"payload".as_slice()),
        ],
    );

    let scratch = dir.path().join("scratch");
    job(&archive, &scratch, PASSWORD, b"new body")
        .run()
        .expect("rewrite");

    let tree = read_back(&archive, PASSWORD);
    assert_eq!(tree["cfg/setting.cfg"], b"new body".to_vec());
    assert!(!tree.contains_key("setting.cfg"));
}

#[test]
fn rerunning_the_same_job_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let archive = dir.path().join("main.obb");
    build_encrypted(
        &archive,
        &[
            ("setting.cfg", b"old".as_slice()),
            ("data/level1.bin", b"payload".as_slice()),
        ],
    );

    let scratch = dir.path().join("scratch");
    let content = b"replacement body";

    job(&archive, &scratch, PASSWORD, content)
        .run()
        .expect("first rewrite");
    let first = read_back(&archive, PASSWORD);

    job(&archive, &scratch, PASSWORD, content)
        .run()
        .expect("second rewrite");
    let second = read_back(&archive, PASSWORD);

    assert_eq!(first, second);
    assert_eq!(second["setting.cfg"], content.to_vec());
}

#[test]
fn stale_scratch_content_is_cleared_before_extraction() {
    let dir = tempfile::tempdir().expect("tempdir");
    let archive = dir.path().join("main.obb");
    build_encrypted(&archive, &[("setting.cfg", b"old".as_slice())]);

    // Leftovers from a crashed earlier run must not leak into the rewrite.
    let scratch = dir.path().join("scratch");
    fs::create_dir_all(&scratch).expect("mkdir scratch");
    fs::write(scratch.join("stale.bin"), b"junk").expect("seed stale file");

    job(&archive, &scratch, PASSWORD, b"new")
        .run()
        .expect("rewrite");

    let tree = read_back(&archive, PASSWORD);
    assert!(!tree.contains_key("stale.bin"));
    assert_eq!(tree["setting.cfg"], b"new".to_vec());
}
