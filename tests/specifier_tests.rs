//! Tests for specifier parsing
//!
//! These tests verify:
//! - Write and read specifier grammars
//! - Token validation (unknown tokens, conflicting encodings)
//! - Path segment handling
//! - Canonical display form

use std::path::Path;

use arkio::{ArkError, Encoding, Specifier, StorageMode};

// =============================================================================
// Write Specifier Tests
// =============================================================================

#[test]
fn test_write_archive_and_index() {
    let spec = Specifier::for_writing("ark,scp,t:data.ark,data.scp").unwrap();

    assert_eq!(spec.mode, StorageMode::ArchiveAndIndex);
    assert_eq!(spec.encoding, Encoding::Text);
    assert_eq!(spec.archive_path.as_deref(), Some(Path::new("data.ark")));
    assert_eq!(spec.index_path.as_deref(), Some(Path::new("data.scp")));
}

#[test]
fn test_write_archive_only_defaults_to_binary() {
    let spec = Specifier::for_writing("ark:data.ark").unwrap();

    assert_eq!(spec.mode, StorageMode::ArchiveOnly);
    assert_eq!(spec.encoding, Encoding::Binary);
    assert!(!spec.flush);
}

#[test]
fn test_write_index_only() {
    let spec = Specifier::for_writing("scp,t:data.scp").unwrap();

    assert_eq!(spec.mode, StorageMode::IndexOnly);
    assert_eq!(spec.index_path.as_deref(), Some(Path::new("data.scp")));
    assert!(spec.archive_path.is_none());
}

#[test]
fn test_write_flush_token() {
    let spec = Specifier::for_writing("ark,f:data.ark").unwrap();
    assert!(spec.flush);

    let spec = Specifier::for_writing("ark,flush:data.ark").unwrap();
    assert!(spec.flush);
}

#[test]
fn test_write_requires_storage_token() {
    let result = Specifier::for_writing("t:data.ark");
    assert!(matches!(result, Err(ArkError::InvalidSpecifier(_))));
}

#[test]
fn test_write_both_modes_need_two_paths() {
    let result = Specifier::for_writing("ark,scp:data.ark");
    assert!(matches!(result, Err(ArkError::InvalidSpecifier(_))));

    let result = Specifier::for_writing("ark,scp:a.ark,a.scp,extra");
    assert!(matches!(result, Err(ArkError::InvalidSpecifier(_))));
}

#[test]
fn test_write_rejects_read_only_tokens() {
    for spec in ["ark,s:x.ark", "ark,cs:x.ark", "ark,o:x.ark", "ark,p:x.ark", "ark,bg:x.ark"] {
        let result = Specifier::for_writing(spec);
        assert!(
            matches!(result, Err(ArkError::InvalidSpecifier(_))),
            "'{}' should be rejected",
            spec
        );
    }
}

// =============================================================================
// Read Specifier Tests
// =============================================================================

#[test]
fn test_read_index_source() {
    let spec = Specifier::for_reading("scp:data.scp").unwrap();

    assert_eq!(spec.mode, StorageMode::IndexOnly);
    assert_eq!(spec.index_path.as_deref(), Some(Path::new("data.scp")));
}

#[test]
fn test_read_archive_with_assertions() {
    let spec = Specifier::for_reading("ark,s,cs,o,p,bg:data.ark").unwrap();

    assert_eq!(spec.mode, StorageMode::ArchiveOnly);
    assert!(spec.sorted);
    assert!(spec.called_sorted);
    assert!(spec.once);
    assert!(spec.permissive);
    assert!(spec.background);
}

#[test]
fn test_read_path_may_contain_colons() {
    let spec = Specifier::for_reading("ark:dir:with:colons/data.ark").unwrap();
    assert_eq!(
        spec.archive_path.as_deref(),
        Some(Path::new("dir:with:colons/data.ark"))
    );
}

#[test]
fn test_read_rejects_both_storage_tokens() {
    let result = Specifier::for_reading("ark,scp:data.ark");
    assert!(matches!(result, Err(ArkError::InvalidSpecifier(_))));
}

#[test]
fn test_read_rejects_flush() {
    let result = Specifier::for_reading("ark,f:data.ark");
    assert!(matches!(result, Err(ArkError::InvalidSpecifier(_))));
}

// =============================================================================
// Shared Grammar Tests
// =============================================================================

#[test]
fn test_unknown_token_is_named_in_error() {
    let result = Specifier::for_reading("ark,zz:data.ark");
    match result {
        Err(ArkError::InvalidSpecifier(msg)) => assert!(msg.contains("zz"), "got '{}'", msg),
        other => panic!("expected InvalidSpecifier, got {:?}", other.map(|s| s.to_string())),
    }
}

#[test]
fn test_conflicting_encodings() {
    let result = Specifier::for_writing("ark,t,b:data.ark");
    assert!(matches!(result, Err(ArkError::InvalidSpecifier(_))));

    let result = Specifier::for_writing("ark,b,t:data.ark");
    assert!(matches!(result, Err(ArkError::InvalidSpecifier(_))));
}

#[test]
fn test_missing_separator_or_path() {
    assert!(matches!(
        Specifier::for_reading("ark"),
        Err(ArkError::InvalidSpecifier(_))
    ));
    assert!(matches!(
        Specifier::for_reading("ark:"),
        Err(ArkError::InvalidSpecifier(_))
    ));
    assert!(matches!(
        Specifier::for_reading(":data.ark"),
        Err(ArkError::InvalidSpecifier(_))
    ));
}

#[test]
fn test_display_roundtrip() {
    for text in [
        "ark:data.ark",
        "scp:data.scp",
        "ark,scp:data.ark,data.scp",
        "ark,scp,t:data.ark,data.scp",
        "ark,t,f:data.ark",
    ] {
        let spec = Specifier::for_writing(text).unwrap();
        assert_eq!(spec.to_string(), text);
        assert_eq!(Specifier::for_writing(&spec.to_string()).unwrap(), spec);
    }

    let spec = Specifier::for_reading("ark,s,cs,o,p,bg:data.ark").unwrap();
    assert_eq!(spec.to_string(), "ark,s,cs,o,p,bg:data.ark");
}
