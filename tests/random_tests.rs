//! Tests for the random-access table reader
//!
//! These tests verify:
//! - Key lookup via scp and via archive scanning
//! - The called-sorted (`cs`) and access-once (`o`) assertions
//! - Background prefetch (`bg`) equivalence
//! - Lifecycle rules (close, get-after-close)

use std::path::{Path, PathBuf};

use arkio::{ArkError, RandomAccessTableReader, SequentialTableReader, TableWriter};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_dir() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().to_path_buf();
    (temp, dir)
}

fn write_pair(dir: &Path, entries: &[(&str, i32)]) -> (PathBuf, PathBuf) {
    let ark = dir.join("data.ark");
    let scp = dir.join("data.scp");
    let mut writer =
        TableWriter::<i32>::new(&format!("ark,scp:{},{}", ark.display(), scp.display())).unwrap();
    for (key, value) in entries {
        writer.write(key, value).unwrap();
    }
    writer.close().unwrap();
    (ark, scp)
}

// =============================================================================
// Lookup
// =============================================================================

#[test]
fn test_lookup_via_index() {
    let (_temp, dir) = setup_dir();
    let (_ark, scp) = write_pair(&dir, &[("a", 10), ("b", 20)]);

    let reader = RandomAccessTableReader::<i32>::new(&format!("scp:{}", scp.display())).unwrap();

    assert_eq!(reader.len(), 2);
    assert!(reader.contains("b"));
    assert!(!reader.contains("z"));
    assert_eq!(reader.get("b").unwrap(), 20);
    assert_eq!(reader.get("a").unwrap(), 10);
    assert!(matches!(reader.get("z"), Err(ArkError::KeyNotFound(k)) if k == "z"));
}

#[test]
fn test_lookup_via_archive_scan() {
    let (_temp, dir) = setup_dir();
    let (ark, _scp) = write_pair(&dir, &[("a", 10), ("b", 20), ("c", 30)]);

    let reader = RandomAccessTableReader::<i32>::new(&format!("ark:{}", ark.display())).unwrap();
    assert_eq!(reader.get("c").unwrap(), 30);
    assert_eq!(reader.get("a").unwrap(), 10);
}

#[test]
fn test_open_rejects_duplicate_keys() {
    let (_temp, dir) = setup_dir();
    let (ark, _scp) = write_pair(&dir, &[("a", 1), ("a", 2)]);

    let result = RandomAccessTableReader::<i32>::new(&format!("ark:{}", ark.display()));
    assert!(matches!(result, Err(ArkError::DuplicateKey(_))));
}

#[test]
fn test_contains_has_no_side_effects() {
    let (_temp, dir) = setup_dir();
    let (_ark, scp) = write_pair(&dir, &[("a", 1), ("b", 2)]);

    // contains() on a later key must not advance the cs tracker
    let reader =
        RandomAccessTableReader::<i32>::new(&format!("scp,cs:{}", scp.display())).unwrap();
    assert!(reader.contains("b"));
    assert_eq!(reader.get("a").unwrap(), 1);
}

#[test]
fn test_repeat_lookup_allowed_by_default() {
    let (_temp, dir) = setup_dir();
    let (_ark, scp) = write_pair(&dir, &[("a", 1)]);

    let reader = RandomAccessTableReader::<i32>::new(&format!("scp:{}", scp.display())).unwrap();
    assert_eq!(reader.get("a").unwrap(), 1);
    assert_eq!(reader.get("a").unwrap(), 1);
}

// =============================================================================
// Access Assertions
// =============================================================================

#[test]
fn test_called_sorted_rejects_regression() {
    let (_temp, dir) = setup_dir();
    let (_ark, scp) = write_pair(&dir, &[("a", 1), ("b", 2), ("c", 3)]);

    let reader =
        RandomAccessTableReader::<i32>::new(&format!("scp,cs:{}", scp.display())).unwrap();
    assert_eq!(reader.get("b").unwrap(), 2);
    assert!(matches!(
        reader.get("a"),
        Err(ArkError::OrderingViolation(_))
    ));
    // forward progress is still fine after a rejected request
    assert_eq!(reader.get("c").unwrap(), 3);
}

#[test]
fn test_called_sorted_allows_repeats_at_max() {
    let (_temp, dir) = setup_dir();
    let (_ark, scp) = write_pair(&dir, &[("a", 1), ("b", 2)]);

    let reader =
        RandomAccessTableReader::<i32>::new(&format!("scp,cs:{}", scp.display())).unwrap();
    assert_eq!(reader.get("b").unwrap(), 2);
    assert_eq!(reader.get("b").unwrap(), 2);
}

#[test]
fn test_once_rejects_second_access() {
    let (_temp, dir) = setup_dir();
    let (_ark, scp) = write_pair(&dir, &[("a", 1), ("b", 2)]);

    let reader =
        RandomAccessTableReader::<i32>::new(&format!("scp,o:{}", scp.display())).unwrap();
    assert_eq!(reader.get("a").unwrap(), 1);
    assert!(matches!(
        reader.get("a"),
        Err(ArkError::OrderingViolation(_))
    ));
}

#[test]
fn test_once_rejects_position_regression() {
    let (_temp, dir) = setup_dir();
    let (_ark, scp) = write_pair(&dir, &[("a", 1), ("b", 2), ("c", 3)]);

    let reader =
        RandomAccessTableReader::<i32>::new(&format!("scp,o:{}", scp.display())).unwrap();
    assert_eq!(reader.get("c").unwrap(), 3);
    assert!(matches!(
        reader.get("a"),
        Err(ArkError::OrderingViolation(_))
    ));
}

// =============================================================================
// Background Prefetch
// =============================================================================

#[test]
fn test_background_matches_foreground() {
    let (_temp, dir) = setup_dir();
    let entries: Vec<(String, i32)> = (0..32).map(|i| (format!("key{:03}", i), i * 7)).collect();
    let borrowed: Vec<(&str, i32)> = entries.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    let (_ark, scp) = write_pair(&dir, &borrowed);

    let plain = RandomAccessTableReader::<i32>::new(&format!("scp:{}", scp.display())).unwrap();
    let prefetched =
        RandomAccessTableReader::<i32>::new(&format!("scp,bg:{}", scp.display())).unwrap();

    // In-order traversal is the prefetcher's best case; results must be
    // byte-for-byte what the plain reader sees.
    for (key, expected) in &entries {
        assert_eq!(plain.get(key).unwrap(), *expected);
        assert_eq!(prefetched.get(key).unwrap(), *expected);
    }
    prefetched.close().unwrap();
}

#[test]
fn test_background_out_of_order_access() {
    let (_temp, dir) = setup_dir();
    let (_ark, scp) = write_pair(&dir, &[("a", 1), ("b", 2), ("c", 3)]);

    let reader =
        RandomAccessTableReader::<i32>::new(&format!("scp,bg:{}", scp.display())).unwrap();
    // Misses every prefetch; the direct-read fallback must cover it.
    assert_eq!(reader.get("c").unwrap(), 3);
    assert_eq!(reader.get("a").unwrap(), 1);
    assert_eq!(reader.get("b").unwrap(), 2);
}

// =============================================================================
// Iteration and Lifecycle
// =============================================================================

#[test]
fn test_iter_matches_sequential_reader() {
    let (_temp, dir) = setup_dir();
    let (ark, scp) = write_pair(&dir, &[("a", 10), ("b", 20), ("c", 30)]);

    let random = RandomAccessTableReader::<i32>::new(&format!("scp:{}", scp.display())).unwrap();
    let via_iter: Vec<(String, i32)> = random.iter().collect::<Result<_, _>>().unwrap();

    let sequential =
        SequentialTableReader::<i32>::new(&format!("ark:{}", ark.display())).unwrap();
    let via_stream: Vec<(String, i32)> =
        sequential.entries().collect::<Result<_, _>>().unwrap();

    assert_eq!(via_iter, via_stream);
}

#[test]
fn test_get_after_close_fails() {
    let (_temp, dir) = setup_dir();
    let (_ark, scp) = write_pair(&dir, &[("a", 1)]);

    let reader = RandomAccessTableReader::<i32>::new(&format!("scp:{}", scp.display())).unwrap();
    reader.close().unwrap();
    assert!(matches!(reader.get("a"), Err(ArkError::Io(_))));
}

#[test]
fn test_double_close_is_ok() {
    let (_temp, dir) = setup_dir();
    let (_ark, scp) = write_pair(&dir, &[("a", 1)]);

    let reader =
        RandomAccessTableReader::<i32>::new(&format!("scp,bg:{}", scp.display())).unwrap();
    reader.close().unwrap();
    reader.close().unwrap();
}
