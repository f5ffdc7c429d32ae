/// Mock presentation device for unit tests (no GPU required)
///
/// Records every call with the handle it targeted, hands out unique handles, and tracks
/// which handles are alive and which fences are signaled. Submitted work completes
/// instantly, so a fence becomes signaled at submit. Surface answers and present outcomes
/// are scripted through the shared [`MockWindow`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use rustc_hash::{FxHashMap, FxHashSet};
use crate::asset::{AssetSource, FRAGMENT_SHADER_ASSET, TEXTURE_ASSET, VERTEX_SHADER_ASSET};
use crate::config::PresenterConfig;
use crate::device::{
    CommandBufferHandle, CreatedSwapchain, FenceHandle, FrameRecording, FramebufferHandle,
    ImageHandle, ImageViewHandle, PresentOutcome, PresentationDevice, SemaphoreHandle,
    SwapchainDesc, SwapchainHandle,
};
use crate::error::{Error, Result};
use crate::frame::FrameSlot;
use crate::surface::{Extent2D, PreTransform, SurfaceSnapshot};

// ============================================================================
// Recorded calls
// ============================================================================

/// One device call, with the handle it operated on (0 when not applicable)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub name: &'static str,
    pub target: u64,
}

/// Shared state behind a mock window and the devices opened from it
#[derive(Debug)]
pub struct MockDeviceState {
    pub calls: Vec<MockCall>,
    pub surface: SurfaceSnapshot,
    pub content_extent: Extent2D,
    pub image_count: u32,
    /// Consumed one per present; `Success` when empty
    pub present_script: VecDeque<PresentOutcome>,
    /// Call name that must fail, after skipping the given number of matching calls
    pub fail_next: Option<(&'static str, usize)>,
    /// Use-after-destroy, double destroy and similar protocol errors
    pub violations: Vec<String>,
    /// Most recent command buffer recording
    pub last_recording: Option<FrameRecording>,
    /// Last size forwarded by the presenter; not logged in `calls`
    pub window_extent: Option<Extent2D>,
    /// Every swapchain ever created: handle -> (desc, image count)
    pub swapchains: FxHashMap<u64, (SwapchainDesc, u32)>,
    next_handle: u64,
    live: FxHashSet<u64>,
    signaled_fences: FxHashSet<u64>,
    acquire_cursor: FxHashMap<u64, u32>,
}

impl MockDeviceState {
    fn new(surface: SurfaceSnapshot) -> Self {
        Self {
            calls: Vec::new(),
            surface,
            content_extent: Extent2D::new(512, 512),
            image_count: 3,
            present_script: VecDeque::new(),
            fail_next: None,
            violations: Vec::new(),
            last_recording: None,
            window_extent: None,
            swapchains: FxHashMap::default(),
            next_handle: 1,
            live: FxHashSet::default(),
            signaled_fences: FxHashSet::default(),
            acquire_cursor: FxHashMap::default(),
        }
    }

    fn record(&mut self, name: &'static str, target: u64) -> Result<()> {
        self.calls.push(MockCall { name, target });
        if let Some((failing, skip)) = self.fail_next {
            if failing == name {
                if skip == 0 {
                    self.fail_next = None;
                    return Err(Error::DeviceLost(format!("mock failure in {}", name)));
                }
                self.fail_next = Some((failing, skip - 1));
            }
        }
        Ok(())
    }

    fn allocate(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.live.insert(handle);
        handle
    }

    fn release(&mut self, what: &str, handle: u64) {
        if !self.live.remove(&handle) {
            self.violations.push(format!("{} {} destroyed while not alive", what, handle));
        }
    }

    fn require_live(&mut self, what: &str, handle: u64) -> Result<()> {
        if self.live.contains(&handle) {
            Ok(())
        } else {
            self.violations.push(format!("{} {} used while not alive", what, handle));
            Err(Error::InvalidResource(format!("{} {} is not alive", what, handle)))
        }
    }

    pub fn is_live(&self, handle: u64) -> bool {
        self.live.contains(&handle)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn call_names(&self) -> Vec<&'static str> {
        self.calls.iter().map(|c| c.name).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls.iter().filter(|c| c.name == name).count()
    }
}

// ============================================================================
// Mock window
// ============================================================================

/// Stand-in for the native window: owns the scripted surface
#[derive(Debug, Clone)]
pub struct MockWindow {
    state: Arc<Mutex<MockDeviceState>>,
}

impl MockWindow {
    pub fn new(extent: Extent2D, transform: PreTransform) -> Self {
        Self::with_snapshot(SurfaceSnapshot::new(extent, transform))
    }

    pub fn with_snapshot(snapshot: SurfaceSnapshot) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockDeviceState::new(snapshot))),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, MockDeviceState> {
        self.state.lock().unwrap()
    }

    /// Change what the next probe reports
    pub fn set_surface(&self, extent: Extent2D, transform: PreTransform) {
        self.state().surface = SurfaceSnapshot::new(extent, transform);
    }

    /// Queue `count` presents with the given outcome
    pub fn script_presents(&self, outcome: PresentOutcome, count: usize) {
        let mut state = self.state();
        for _ in 0..count {
            state.present_script.push_back(outcome);
        }
    }

    pub fn fail_next(&self, name: &'static str) {
        self.fail_after(name, 0);
    }

    /// Let `skip` calls named `name` succeed, then fail the next one
    pub fn fail_after(&self, name: &'static str, skip: usize) {
        self.state().fail_next = Some((name, skip));
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state().calls.clone()
    }

    pub fn call_names(&self) -> Vec<&'static str> {
        self.state().call_names()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn count(&self, name: &str) -> usize {
        self.state().count(name)
    }

    pub fn violations(&self) -> Vec<String> {
        self.state().violations.clone()
    }

    pub fn live_count(&self) -> usize {
        self.state().live_count()
    }

    pub fn is_live(&self, handle: u64) -> bool {
        self.state().is_live(handle)
    }

    pub fn last_recording(&self) -> Option<FrameRecording> {
        self.state().last_recording
    }

    pub fn swapchain_desc(&self, handle: SwapchainHandle) -> Option<SwapchainDesc> {
        self.state().swapchains.get(&handle.0).map(|(desc, _)| *desc)
    }

    pub fn window_extent(&self) -> Option<Extent2D> {
        self.state().window_extent
    }
}

// ============================================================================
// Mock device
// ============================================================================

#[derive(Debug)]
pub struct MockPresentationDevice {
    state: Arc<Mutex<MockDeviceState>>,
}

impl MockPresentationDevice {
    /// Open without assets
    pub fn new(window: &MockWindow) -> Self {
        let device = Self { state: Arc::clone(&window.state) };
        device.lock().calls.push(MockCall { name: "open", target: 0 });
        device
    }

    fn lock(&self) -> MutexGuard<'_, MockDeviceState> {
        self.state.lock().unwrap()
    }
}

impl PresentationDevice for MockPresentationDevice {
    type Window = MockWindow;

    fn open(window: &MockWindow, assets: &dyn AssetSource, _config: &PresenterConfig) -> Result<Self> {
        for path in [VERTEX_SHADER_ASSET, FRAGMENT_SHADER_ASSET, TEXTURE_ASSET] {
            assets.read(path)?;
        }
        let device = Self { state: Arc::clone(&window.state) };
        device.lock().record("open", 0)?;
        Ok(device)
    }

    fn probe_surface(&mut self) -> Result<SurfaceSnapshot> {
        let mut state = self.lock();
        state.record("probe_surface", 0)?;
        Ok(state.surface)
    }

    fn content_extent(&self) -> Extent2D {
        self.lock().content_extent
    }

    fn set_window_extent(&mut self, extent: Extent2D) {
        self.lock().window_extent = Some(extent);
    }

    fn create_swapchain(
        &mut self,
        desc: &SwapchainDesc,
        old: Option<SwapchainHandle>,
    ) -> Result<CreatedSwapchain> {
        let mut state = self.lock();
        state.record("create_swapchain", old.map_or(0, |h| h.0))?;
        if let Some(old) = old {
            state.require_live("swapchain", old.0)?;
        }
        let handle = state.allocate();
        let image_count = state.image_count.max(desc.min_image_count);
        // Images belong to the swapchain and are never destroyed individually
        let images = (0..image_count)
            .map(|i| ImageHandle(handle * 1000 + u64::from(i)))
            .collect();
        state.swapchains.insert(handle, (*desc, image_count));
        Ok(CreatedSwapchain { handle: SwapchainHandle(handle), images })
    }

    fn create_image_view(&mut self, image: ImageHandle) -> Result<ImageViewHandle> {
        let mut state = self.lock();
        state.record("create_image_view", image.0)?;
        Ok(ImageViewHandle(state.allocate()))
    }

    fn create_framebuffer(
        &mut self,
        view: ImageViewHandle,
        _extent: Extent2D,
    ) -> Result<FramebufferHandle> {
        let mut state = self.lock();
        state.record("create_framebuffer", view.0)?;
        state.require_live("image view", view.0)?;
        Ok(FramebufferHandle(state.allocate()))
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        let mut state = self.lock();
        state.calls.push(MockCall { name: "destroy_framebuffer", target: framebuffer.0 });
        state.release("framebuffer", framebuffer.0);
    }

    fn destroy_image_view(&mut self, view: ImageViewHandle) {
        let mut state = self.lock();
        state.calls.push(MockCall { name: "destroy_image_view", target: view.0 });
        state.release("image view", view.0);
    }

    fn destroy_swapchain(&mut self, swapchain: SwapchainHandle) {
        let mut state = self.lock();
        state.calls.push(MockCall { name: "destroy_swapchain", target: swapchain.0 });
        state.release("swapchain", swapchain.0);
    }

    fn create_frame_slot(&mut self) -> Result<FrameSlot> {
        let mut state = self.lock();
        state.record("create_frame_slot", 0)?;
        let slot = FrameSlot {
            acquire_signal: SemaphoreHandle(state.allocate()),
            render_signal: SemaphoreHandle(state.allocate()),
            in_flight: FenceHandle(state.allocate()),
            command_buffer: CommandBufferHandle(state.allocate()),
        };
        state.signaled_fences.insert(slot.in_flight.0);
        Ok(slot)
    }

    fn destroy_frame_slot(&mut self, slot: FrameSlot) {
        let mut state = self.lock();
        state.calls.push(MockCall { name: "destroy_frame_slot", target: slot.in_flight.0 });
        state.release("semaphore", slot.acquire_signal.0);
        state.release("semaphore", slot.render_signal.0);
        state.release("fence", slot.in_flight.0);
        state.release("command buffer", slot.command_buffer.0);
        state.signaled_fences.remove(&slot.in_flight.0);
    }

    fn wait_for_fence(&mut self, fence: FenceHandle, timeout: Duration) -> Result<()> {
        let mut state = self.lock();
        state.record("wait_for_fence", fence.0)?;
        state.require_live("fence", fence.0)?;
        if state.signaled_fences.contains(&fence.0) {
            Ok(())
        } else {
            Err(Error::Timeout(format!(
                "fence {} not signaled after {:?}",
                fence.0, timeout
            )))
        }
    }

    fn reset_fence(&mut self, fence: FenceHandle) -> Result<()> {
        let mut state = self.lock();
        state.record("reset_fence", fence.0)?;
        state.require_live("fence", fence.0)?;
        if !state.signaled_fences.remove(&fence.0) {
            state.violations.push(format!("fence {} reset while unsignaled", fence.0));
        }
        Ok(())
    }

    fn acquire_next_image(
        &mut self,
        swapchain: SwapchainHandle,
        _signal: SemaphoreHandle,
    ) -> Result<u32> {
        let mut state = self.lock();
        state.record("acquire_next_image", swapchain.0)?;
        state.require_live("swapchain", swapchain.0)?;
        let image_count = state.swapchains.get(&swapchain.0).map_or(1, |(_, count)| *count);
        let cursor = state.acquire_cursor.entry(swapchain.0).or_insert(0);
        let index = *cursor % image_count;
        *cursor += 1;
        Ok(index)
    }

    fn record_frame(&mut self, recording: &FrameRecording) -> Result<()> {
        let mut state = self.lock();
        state.record("record_frame", recording.command_buffer.0)?;
        state.require_live("command buffer", recording.command_buffer.0)?;
        state.last_recording = Some(*recording);
        state.require_live("framebuffer", recording.framebuffer.0)
    }

    fn submit(&mut self, slot: &FrameSlot) -> Result<()> {
        let mut state = self.lock();
        state.record("submit", slot.in_flight.0)?;
        state.require_live("fence", slot.in_flight.0)?;
        if !state.signaled_fences.insert(slot.in_flight.0) {
            state.violations.push(format!("fence {} submitted while signaled", slot.in_flight.0));
        }
        Ok(())
    }

    fn present(
        &mut self,
        swapchain: SwapchainHandle,
        _image_index: u32,
        _wait: SemaphoreHandle,
    ) -> Result<PresentOutcome> {
        let mut state = self.lock();
        state.record("present", swapchain.0)?;
        state.require_live("swapchain", swapchain.0)?;
        Ok(state.present_script.pop_front().unwrap_or(PresentOutcome::Success))
    }

    fn wait_idle(&mut self) -> Result<()> {
        self.lock().record("wait_idle", 0)
    }

    fn release_render_resources(&mut self) {
        self.lock().calls.push(MockCall { name: "release_render_resources", target: 0 });
    }

    fn close(&mut self) {
        self.lock().calls.push(MockCall { name: "close", target: 0 });
    }
}
