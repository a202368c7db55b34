//! Integration tests for recursive encryption and decryption of directory trees.

use std::num::NonZeroU64;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

use roe_core::config::KeySchedule;
use roe_crypto::{derive_key_from_bytes, Key};
use roe_engine::{decrypt_tree, encrypt_inputs, encrypt_tree, ProgressFn};

fn test_key() -> Key {
    derive_key_from_bytes(b"tree-secret", KeySchedule::Rehash)
}

fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

#[test]
fn tree_layout_is_mirrored_both_ways() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("docs");
    write(&src, "readme.txt", b"top level file");
    write(&src, "a/b/deep.bin", &[0x5a; 250]);
    write(&src, "a/empty.log", b"");

    let key = test_key();
    let mut rng = StdRng::seed_from_u64(11);
    let enc_dir = tmp.path().join("enc");
    let summary = encrypt_tree(&src, &enc_dir, &key, NonZeroU64::new(100).unwrap(), &mut rng, None)
        .unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.containers, 4);
    assert!(enc_dir.join("readme.txt.bmp").is_file());
    assert!(enc_dir.join("a/b/deep.bin.1-3.bmp").is_file());
    assert!(enc_dir.join("a/b/deep.bin.3-3.bmp").is_file());
    assert!(!enc_dir.join("a/empty.log.bmp").exists());

    // Stray files in the container tree are ignored on decrypt.
    write(&enc_dir, "a/notes.txt", b"not a container");

    let out_dir = tmp.path().join("out");
    let summary = decrypt_tree(&enc_dir, &out_dir, &key, None).unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.bytes, 14 + 250);

    assert_eq!(std::fs::read(out_dir.join("readme.txt")).unwrap(), b"top level file");
    assert_eq!(std::fs::read(out_dir.join("a/b/deep.bin")).unwrap(), vec![0x5a; 250]);
    assert!(!out_dir.join("a/notes.txt").exists());
}

#[test]
fn progress_reports_every_input() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "one.txt", b"1");
    write(tmp.path(), "two.txt", b"22");
    let inputs = vec![tmp.path().join("one.txt"), tmp.path().join("two.txt")];

    let calls = Arc::new(AtomicU64::new(0));
    let seen = Arc::clone(&calls);
    let progress: ProgressFn = Box::new(move |_done, total, _msg| {
        assert_eq!(total, 2);
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let mut rng = StdRng::seed_from_u64(13);
    let out_dir = tmp.path().join("enc");
    let summary = encrypt_inputs(
        &inputs,
        &out_dir,
        &test_key(),
        NonZeroU64::new(1000).unwrap(),
        &mut rng,
        Some(&progress),
    )
    .unwrap();

    assert_eq!(summary.processed, 2);
    // One call per input plus the final "done".
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn non_container_input_fails_decrypt() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "plain.txt", b"hello");
    let err = roe_engine::decrypt_inputs(
        &[tmp.path().join("plain.txt")],
        &tmp.path().join("out"),
        &test_key(),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, roe_core::RoeError::NotAContainer(_)), "unexpected error: {err}");
}
