//! Unit tests for asset.rs

use crate::asset::{AssetSource, DirectoryAssetSource, MemoryAssetSource, TEXTURE_ASSET};
use crate::error::Error;

fn temp_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("prerotation_asset_{}_{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

// ============================================================================
// DirectoryAssetSource
// ============================================================================

#[test]
fn test_directory_source_reads_file() {
    let dir = temp_dir("read");
    std::fs::write(dir.join(TEXTURE_ASSET), [1u8, 2, 3]).unwrap();

    let source = DirectoryAssetSource::new(&dir);
    assert_eq!(source.read(TEXTURE_ASSET).unwrap(), vec![1, 2, 3]);
    assert_eq!(source.root(), dir.as_path());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_directory_source_missing_file() {
    let dir = temp_dir("missing");
    let source = DirectoryAssetSource::new(&dir);

    match source.read("does_not_exist.spv") {
        Err(Error::InvalidResource(msg)) => assert!(msg.contains("does_not_exist.spv")),
        other => panic!("unexpected result: {:?}", other.map(|b| b.len())),
    }

    std::fs::remove_dir_all(&dir).ok();
}

// ============================================================================
// MemoryAssetSource
// ============================================================================

#[test]
fn test_memory_source_insert_and_read() {
    let source = MemoryAssetSource::new();
    assert!(!source.contains("a"));

    source.insert("a", vec![9, 9]);
    assert!(source.contains("a"));
    assert_eq!(source.read("a").unwrap(), vec![9, 9]);

    source.insert("a", vec![1]);
    assert_eq!(source.read("a").unwrap(), vec![1]);
}

#[test]
fn test_memory_source_unknown_path() {
    let source = MemoryAssetSource::new();
    assert!(matches!(source.read("nope"), Err(Error::InvalidResource(_))));
}

#[test]
fn test_memory_source_overlays_fallback() {
    let base = MemoryAssetSource::new();
    base.insert("texture.vert.spv", vec![0xAA]);
    base.insert("sample_tex.png", vec![0xBB]);

    let overlay = MemoryAssetSource::with_fallback(base);
    overlay.insert("texture.vert.spv", vec![0xCC]);

    assert_eq!(overlay.read("texture.vert.spv").unwrap(), vec![0xCC]);
    assert_eq!(overlay.read("sample_tex.png").unwrap(), vec![0xBB]);
    assert!(overlay.read("missing").is_err());
}
