//! Pre-rotation demo: draws a textured quad that stays upright while the surface rotates
//!
//! Usage: `prerotation_demo [ASSET_DIR]` (defaults to the crate's `assets` directory).

use prerotation_engine::prerotation::{Engine, PresentationEngine};
use prerotation_engine::prerotation::asset::{DirectoryAssetSource, MemoryAssetSource};
use prerotation_engine::prerotation::config::PresenterConfig;
use prerotation_engine::prerotation::log::DefaultLogger;
use prerotation_engine::{engine_error, engine_info};
use prerotation_engine_renderer_vulkan::VulkanPresentationDevice;
use std::time::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

const SOURCE: &str = "prerotation::demo";

/// Shader bytecode compiled by build.rs, preferred over files in the asset directory
fn asset_source(root: String) -> MemoryAssetSource {
    let assets = MemoryAssetSource::with_fallback(DirectoryAssetSource::new(root));

    #[cfg(feature = "compile-shaders")]
    {
        use prerotation_engine::prerotation::asset::{FRAGMENT_SHADER_ASSET, VERTEX_SHADER_ASSET};
        assets.insert(
            VERTEX_SHADER_ASSET,
            include_bytes!(concat!(env!("OUT_DIR"), "/texture.vert.spv")).to_vec(),
        );
        assets.insert(
            FRAGMENT_SHADER_ASSET,
            include_bytes!(concat!(env!("OUT_DIR"), "/texture.frag.spv")).to_vec(),
        );
    }

    assets
}

struct App {
    engine: PresentationEngine<VulkanPresentationDevice>,
    assets: MemoryAssetSource,
    window: Option<Window>,
    started: Instant,
    next_frame: Instant,
    exiting: bool,
}

impl App {
    fn new(assets: MemoryAssetSource) -> Self {
        let now = Instant::now();
        Self {
            engine: PresentationEngine::new(PresenterConfig::default()),
            assets,
            window: None,
            started: now,
            next_frame: now,
            exiting: false,
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.exiting = true;
        if let Err(e) = self.engine.terminate() {
            engine_error!(SOURCE, "Terminate failed: {}", e);
        }
        self.window = None;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop
            .create_window(Window::default_attributes().with_title("PreRotation"))
        {
            Ok(window) => window,
            Err(e) => {
                engine_error!(SOURCE, "Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        if let Err(e) = self.engine.initialize(&window, &self.assets) {
            engine_error!(SOURCE, "Engine initialization failed: {}", e);
            event_loop.exit();
            return;
        }

        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if let Some(window) = &self.window {
            if window_id != window.id() {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                engine_info!(SOURCE, "Close requested after {} frames", self.engine.frame_count());
                self.shutdown(event_loop);
            }

            WindowEvent::Resized(size) => {
                self.engine.notify_resized(size.width, size.height);
            }

            WindowEvent::RedrawRequested => {
                if self.exiting {
                    return;
                }

                if let Err(e) = self.engine.draw_frame() {
                    engine_error!(SOURCE, "Frame failed, exiting: {}", e);
                    self.shutdown(event_loop);
                    return;
                }

                let delay = self.engine.next_callback_delay(self.started.elapsed());
                self.next_frame = Instant::now() + delay;
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exiting {
            return;
        }

        if Instant::now() >= self.next_frame {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            // Placeholder deadline until RedrawRequested sets the real one
            self.next_frame = Instant::now() + Duration::from_millis(1);
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
    }
}

fn main() {
    Engine::set_logger(DefaultLogger);

    let root = std::env::args()
        .nth(1)
        .unwrap_or_else(|| concat!(env!("CARGO_MANIFEST_DIR"), "/assets").to_string());
    engine_info!(SOURCE, "Loading assets from {}", root);

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            engine_error!(SOURCE, "Failed to create event loop: {}", e);
            std::process::exit(1);
        }
    };

    let mut app = App::new(asset_source(root));
    if let Err(e) = event_loop.run_app(&mut app) {
        engine_error!(SOURCE, "Event loop error: {}", e);
        std::process::exit(1);
    }
}
