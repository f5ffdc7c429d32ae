//! Unit tests for extensions.rs

use crate::error::{Error, ExtensionKind};
use crate::extensions::{ensure_supported, missing_extensions};

const SURFACE: &str = "VK_KHR_surface";
const ANDROID_SURFACE: &str = "VK_KHR_android_surface";
const SWAPCHAIN: &str = "VK_KHR_swapchain";

#[test]
fn test_all_supported() {
    let supported = vec![SURFACE.to_string(), ANDROID_SURFACE.to_string(), "VK_EXT_debug_utils".to_string()];
    assert!(missing_extensions(&[SURFACE, ANDROID_SURFACE], supported.as_slice()).is_empty());
}

#[test]
fn test_missing_keeps_required_order() {
    let missing = missing_extensions(&[ANDROID_SURFACE, SWAPCHAIN, SURFACE], &[SURFACE]);
    assert_eq!(missing, vec![ANDROID_SURFACE.to_string(), SWAPCHAIN.to_string()]);
}

#[test]
fn test_duplicates_reported_once() {
    let missing = missing_extensions(&[SWAPCHAIN, SWAPCHAIN], &[SURFACE]);
    assert_eq!(missing, vec![SWAPCHAIN.to_string()]);
}

#[test]
fn test_empty_required() {
    let required: [&str; 0] = [];
    assert!(missing_extensions(&required, &[SURFACE]).is_empty());
}

#[test]
fn test_ensure_supported_ok() {
    assert!(ensure_supported(ExtensionKind::Device, &[SWAPCHAIN], &[SWAPCHAIN]).is_ok());
}

#[test]
fn test_ensure_supported_reports_kind_and_names() {
    let empty: [&str; 0] = [];
    match ensure_supported(ExtensionKind::Device, &[SWAPCHAIN], &empty) {
        Err(Error::MissingExtensions { kind, missing }) => {
            assert_eq!(kind, ExtensionKind::Device);
            assert_eq!(missing, vec![SWAPCHAIN.to_string()]);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}
