//! Tests for VulkanPresentationDevice
//!
//! These tests drive the Vulkan backend through the PresentationDevice trait and the
//! PresentationEngine facade. All tests require a GPU and are marked with #[ignore].
//! They read shaders and texture from the demo asset directory, which must contain
//! compiled texture.vert.spv / texture.frag.spv.
//!
//! Run with: cargo test --test vulkan_presentation_tests -- --ignored

use prerotation_engine::prerotation::{Error, PresentationDevice, PresentationEngine};
use prerotation_engine::prerotation::asset::{DirectoryAssetSource, MemoryAssetSource};
use prerotation_engine::prerotation::config::PresenterConfig;
use prerotation_engine::prerotation::device::{PresentOutcome, SwapchainDesc};
use prerotation_engine::prerotation::present::Extent2D;
use prerotation_engine_renderer_vulkan::VulkanPresentationDevice;
use std::time::Duration;
use winit::event_loop::EventLoop;
use winit::window::Window;

const ASSET_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../prerotation_demo/assets");

/// Helper to create a test window for Vulkan
#[allow(deprecated)]
fn create_test_window() -> (Window, EventLoop<()>) {
    let event_loop = EventLoop::new().unwrap();
    let window_attrs = Window::default_attributes()
        .with_title("PreRotation Test")
        .with_inner_size(winit::dpi::LogicalSize::new(640, 480))
        .with_visible(false); // Hidden window for tests
    let window = event_loop.create_window(window_attrs).unwrap();
    (window, event_loop)
}

fn test_config() -> PresenterConfig {
    PresenterConfig {
        enable_validation: false,
        ..PresenterConfig::default()
    }
}

fn open_device(window: &Window) -> VulkanPresentationDevice {
    VulkanPresentationDevice::open(window, &DirectoryAssetSource::new(ASSET_DIR), &test_config())
        .unwrap()
}

// ============================================================================
// DEVICE LIFECYCLE
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_open_and_close() {
    let (window, _event_loop) = create_test_window();
    let mut device = open_device(&window);

    assert_eq!(device.content_extent(), Extent2D::new(64, 64));

    device.wait_idle().unwrap();
    device.release_render_resources();
    device.release_render_resources();
    device.close();
    device.close();
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_open_fails_without_assets() {
    let (window, _event_loop) = create_test_window();

    let result = VulkanPresentationDevice::open(&window, &MemoryAssetSource::new(), &test_config());

    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_probe_surface() {
    let (window, _event_loop) = create_test_window();
    let mut device = open_device(&window);

    let snapshot = device.probe_surface().unwrap();

    assert!(snapshot.extent.width > 0);
    assert!(snapshot.extent.height > 0);
}

// ============================================================================
// SWAPCHAIN AND FRAME SLOTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_swapchain_generation_objects() {
    let (window, _event_loop) = create_test_window();
    let mut device = open_device(&window);

    let snapshot = device.probe_surface().unwrap();
    let desc = SwapchainDesc {
        surface: snapshot,
        physical_extent: snapshot.physical_extent(),
        min_image_count: 3,
    };

    let created = device.create_swapchain(&desc, None).unwrap();
    assert!(!created.handle.is_null());
    assert!(!created.images.is_empty());

    let view = device.create_image_view(created.images[0]).unwrap();
    let framebuffer = device.create_framebuffer(view, desc.physical_extent).unwrap();

    // Second generation built from the first
    let next = device.create_swapchain(&desc, Some(created.handle)).unwrap();
    assert_ne!(next.handle, created.handle);

    device.destroy_framebuffer(framebuffer);
    device.destroy_image_view(view);
    device.destroy_swapchain(created.handle);
    device.destroy_swapchain(next.handle);
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_frame_slot_fence_starts_signaled() {
    let (window, _event_loop) = create_test_window();
    let mut device = open_device(&window);

    let slot = device.create_frame_slot().unwrap();

    device.wait_for_fence(slot.in_flight, Duration::from_millis(10)).unwrap();
    device.reset_fence(slot.in_flight).unwrap();
    assert!(matches!(
        device.wait_for_fence(slot.in_flight, Duration::from_millis(10)),
        Err(Error::Timeout(_))
    ));

    device.destroy_frame_slot(slot);
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_single_frame_by_hand() {
    use prerotation_engine::prerotation::device::FrameRecording;
    use prerotation_engine::prerotation::present::RotationCorrection;

    let (window, _event_loop) = create_test_window();
    let mut device = open_device(&window);

    let snapshot = device.probe_surface().unwrap();
    let desc = SwapchainDesc {
        surface: snapshot,
        physical_extent: snapshot.physical_extent(),
        min_image_count: 3,
    };
    let swapchain = device.create_swapchain(&desc, None).unwrap();
    let slot = device.create_frame_slot().unwrap();

    device.wait_for_fence(slot.in_flight, Duration::from_secs(1)).unwrap();
    device.reset_fence(slot.in_flight).unwrap();
    let index = device.acquire_next_image(swapchain.handle, slot.acquire_signal).unwrap();

    let view = device.create_image_view(swapchain.images[index as usize]).unwrap();
    let framebuffer = device.create_framebuffer(view, desc.physical_extent).unwrap();

    let correction = RotationCorrection::compute(snapshot.extent, device.content_extent(), snapshot.transform);
    device
        .record_frame(&FrameRecording {
            command_buffer: slot.command_buffer,
            framebuffer,
            physical_extent: desc.physical_extent,
            push_constants: correction.push_constants(),
            clear_color: [0.5, 0.5, 0.5, 1.0],
        })
        .unwrap();
    device.submit(&slot).unwrap();
    let outcome = device.present(swapchain.handle, index, slot.render_signal).unwrap();
    assert!(matches!(outcome, PresentOutcome::Success | PresentOutcome::Suboptimal));

    device.wait_idle().unwrap();
    device.destroy_framebuffer(framebuffer);
    device.destroy_image_view(view);
    device.destroy_frame_slot(slot);
    device.destroy_swapchain(swapchain.handle);
}

// ============================================================================
// PRESENTATION ENGINE
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_engine_frame_loop() {
    let (window, _event_loop) = create_test_window();
    let engine = PresentationEngine::<VulkanPresentationDevice>::new(test_config());

    engine.initialize(&window, &DirectoryAssetSource::new(ASSET_DIR)).unwrap();
    assert!(engine.is_ready());

    for _ in 0..10 {
        engine.draw_frame().unwrap();
    }
    assert_eq!(engine.frame_count(), 10);

    engine.terminate().unwrap();
    assert!(!engine.is_ready());
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_engine_resize_rebuilds_swapchain() {
    let (window, _event_loop) = create_test_window();
    let engine = PresentationEngine::<VulkanPresentationDevice>::new(test_config());
    engine.initialize(&window, &DirectoryAssetSource::new(ASSET_DIR)).unwrap();

    engine.draw_frame().unwrap();
    engine.notify_resized(320, 240);
    for _ in 0..5 {
        engine.draw_frame().unwrap();
    }

    assert_eq!(engine.frame_count(), 6);
    engine.terminate().unwrap();
}
