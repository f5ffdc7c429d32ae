/// Engine - global logger access and the host-facing presentation engine
///
/// `Engine` owns the process-wide logger used by the `engine_*!` macros.
/// `PresentationEngine` is the object the host drives from its lifecycle callbacks; all of
/// its state sits behind a single coarse lock so that callbacks arriving on another
/// thread (resize, terminate) never interleave with a frame.

use std::sync::{Mutex, MutexGuard, OnceLock, RwLock};
use std::time::{Duration, SystemTime};
use crate::asset::AssetSource;
use crate::config::PresenterConfig;
use crate::device::PresentationDevice;
use crate::error::{Error, Result};
use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
use crate::presenter::Presenter;

// ===== INTERNAL STATE =====

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

// ===== LOGGING API =====

/// Process-wide logging entry point
///
/// # Example
///
/// ```no_run
/// use prerotation_engine::prerotation::{Engine, log::{Logger, LogEntry}};
///
/// struct FileLogger;
/// impl Logger for FileLogger {
///     fn log(&self, entry: &LogEntry) {
///         // Write to file...
///     }
/// }
///
/// Engine::set_logger(FileLogger);
/// ```
pub struct Engine;

impl Engine {
    /// Replace the current logger
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like engine_info!, engine_warn!, etc.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Internal logging method with file:line information (for ERROR logs)
    ///
    /// # Arguments
    ///
    /// * `severity` - Log severity level (typically Error)
    /// * `source` - Source module (e.g., "prerotation::Presenter")
    /// * `message` - Log message
    /// * `file` - Source file path
    /// * `line` - Source line number
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

// ===== PRESENTATION ENGINE =====

/// Host-facing engine: lifecycle entry points around one [`Presenter`]
///
/// Ready means a presenter exists. Every entry point takes the same lock; resize
/// notifications only arm the swap trigger and are acted on by the next `draw_frame`.
///
/// # Example
///
/// ```ignore
/// use prerotation_engine::prerotation::PresentationEngine;
/// use prerotation_engine::prerotation::asset::DirectoryAssetSource;
/// use prerotation_engine::prerotation::config::PresenterConfig;
/// use prerotation_engine_renderer_vulkan::VulkanPresentationDevice;
///
/// let engine = PresentationEngine::<VulkanPresentationDevice>::new(PresenterConfig::default());
/// engine.initialize(&window, &DirectoryAssetSource::new("assets"))?;
/// engine.draw_frame()?;
/// engine.terminate()?;
/// # Ok::<(), prerotation_engine::prerotation::Error>(())
/// ```
pub struct PresentationEngine<D: PresentationDevice> {
    config: PresenterConfig,
    state: Mutex<Option<Presenter<D>>>,
}

impl<D: PresentationDevice> PresentationEngine<D> {
    pub fn new(config: PresenterConfig) -> Self {
        Self {
            config,
            state: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &PresenterConfig {
        &self.config
    }

    /// Helper to log errors before returning them (internal use)
    fn log_and_return_error(error: Error) -> Error {
        match &error {
            Error::InitializationFailed(msg) => {
                crate::engine_error!("prerotation::Engine", "Initialization failed: {}", msg);
            }
            _ => {
                crate::engine_error!("prerotation::Engine", "Engine error: {}", error);
            }
        }
        error
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Presenter<D>>>> {
        self.state.lock().map_err(|_| {
            Self::log_and_return_error(Error::BackendError(
                "Presentation engine lock poisoned".to_string(),
            ))
        })
    }

    /// Open the device on `window` and build the presenter
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The engine is already initialized
    /// - The configuration is inconsistent
    /// - Any step of device bring-up fails (the engine stays not ready)
    pub fn initialize(&self, window: &D::Window, assets: &dyn AssetSource) -> Result<()> {
        let mut state = self.lock()?;
        if state.is_some() {
            return Err(Self::log_and_return_error(Error::InitializationFailed(
                "Presentation engine already initialized. Call terminate() first.".to_string(),
            )));
        }

        self.config.validate().map_err(Self::log_and_return_error)?;
        let device = D::open(window, assets, &self.config).map_err(Self::log_and_return_error)?;
        let presenter =
            Presenter::new(device, self.config.clone()).map_err(Self::log_and_return_error)?;

        *state = Some(presenter);
        crate::engine_info!("prerotation::Engine", "Presentation engine initialized");
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.state.lock().map(|state| state.is_some()).unwrap_or(false)
    }

    /// Render and present one frame; no-op when not ready
    ///
    /// # Errors
    ///
    /// A device failure is fatal: the presenter is torn down before the error is returned
    /// and the engine is no longer ready.
    pub fn draw_frame(&self) -> Result<()> {
        let mut state = self.lock()?;
        let Some(presenter) = state.as_mut() else {
            return Ok(());
        };

        if let Err(e) = presenter.draw_frame() {
            crate::engine_error!(
                "prerotation::Engine",
                "Fatal error at frame {}: {}",
                presenter.frame_count(),
                e
            );
            if let Some(mut presenter) = state.take() {
                if let Err(shutdown_error) = presenter.shutdown() {
                    crate::engine_error!(
                        "prerotation::Engine",
                        "Teardown after fatal error failed: {}",
                        shutdown_error
                    );
                }
            }
            return Err(e);
        }
        Ok(())
    }

    /// Record a new window size; ignored when not ready
    pub fn notify_resized(&self, width: u32, height: u32) {
        if let Ok(mut state) = self.state.lock() {
            if let Some(presenter) = state.as_mut() {
                presenter.notify_resized(width, height);
            }
        }
    }

    /// Destroy every GPU resource; no-op when not ready
    pub fn terminate(&self) -> Result<()> {
        let mut state = self.lock()?;
        match state.take() {
            Some(mut presenter) => {
                let result = presenter.shutdown();
                crate::engine_info!("prerotation::Engine", "Presentation engine terminated");
                result
            }
            None => Ok(()),
        }
    }

    /// Delay before the host should schedule the next frame callback
    pub fn next_callback_delay(&self, _last_frame_timestamp: Duration) -> Duration {
        self.config.callback_delay
    }

    /// Frames presented since initialization (0 when not ready)
    pub fn frame_count(&self) -> u64 {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.as_ref().map(|p| p.frame_count()))
            .unwrap_or(0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
