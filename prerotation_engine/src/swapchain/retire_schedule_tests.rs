//! Unit tests for retire_schedule.rs

use crate::device::mock_presentation_device::{MockPresentationDevice, MockWindow};
use crate::error::Error;
use crate::surface::{Extent2D, PreTransform, SurfaceSnapshot};
use crate::swapchain::{RetireSchedule, SwapchainGeneration};

fn setup() -> (MockWindow, MockPresentationDevice) {
    let window = MockWindow::new(Extent2D::new(1080, 1920), PreTransform::Identity);
    let device = MockPresentationDevice::new(&window);
    (window, device)
}

fn generation(device: &mut MockPresentationDevice) -> SwapchainGeneration {
    let surface = SurfaceSnapshot::new(Extent2D::new(1080, 1920), PreTransform::Identity);
    SwapchainGeneration::build(device, surface, 3, None).unwrap()
}

// ============================================================================
// Scheduling
// ============================================================================

#[test]
fn test_new_is_vacant() {
    let schedule = RetireSchedule::new();
    assert!(!schedule.is_pending());
    assert_eq!(schedule.target_frame(), None);
    assert!(schedule.ensure_vacant().is_ok());
}

#[test]
fn test_schedule_records_target() {
    let (_window, mut device) = setup();
    let old = generation(&mut device);
    let handle = old.handle();

    let mut schedule = RetireSchedule::new();
    schedule.schedule(old, 12).unwrap();

    assert!(schedule.is_pending());
    assert_eq!(schedule.target_frame(), Some(12));
    assert_eq!(schedule.generation().map(|g| g.handle()), Some(handle));
}

#[test]
fn test_second_schedule_is_invariant_violation() {
    let (_window, mut device) = setup();
    let first = generation(&mut device);
    let second = generation(&mut device);
    let second_handle = second.handle();

    let mut schedule = RetireSchedule::new();
    schedule.schedule(first, 12).unwrap();

    let (error, returned) = schedule.schedule(second, 14).unwrap_err();
    assert!(matches!(error, Error::InvariantViolation(_)));
    assert_eq!(returned.handle(), second_handle);
    assert_eq!(schedule.target_frame(), Some(12));
    assert!(schedule.ensure_vacant().is_err());
}

// ============================================================================
// Consumption
// ============================================================================

#[test]
fn test_take_due_only_at_target() {
    let (_window, mut device) = setup();
    let mut schedule = RetireSchedule::new();
    schedule.schedule(generation(&mut device), 12).unwrap();

    assert!(schedule.take_due(10).is_none());
    assert!(schedule.take_due(11).is_none());
    assert!(schedule.is_pending());

    let retired = schedule.take_due(12).unwrap();
    retired.destroy(&mut device);
    assert!(!schedule.is_pending());
    assert!(schedule.take_due(12).is_none());
}

#[test]
fn test_take_ignores_target() {
    let (window, mut device) = setup();
    let mut schedule = RetireSchedule::new();
    schedule.schedule(generation(&mut device), 100).unwrap();

    schedule.take().unwrap().destroy(&mut device);

    assert!(!schedule.is_pending());
    assert_eq!(window.live_count(), 0);
}
