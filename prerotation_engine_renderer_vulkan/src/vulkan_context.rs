/// GpuContext - instance, surface, device and allocator of the presentation backend
///
/// Created once per `open`, torn down by [`GpuContext::destroy`] in reverse order:
/// allocator, debug messenger, device, surface, instance.

use prerotation_engine::prerotation::{Error, ExtensionKind, Result};
use prerotation_engine::prerotation::config::PresenterConfig;
use prerotation_engine::prerotation::extensions::ensure_supported;
use prerotation_engine::prerotation::present::Extent2D;
use prerotation_engine::{engine_debug, engine_error, engine_info};
use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::{CStr, CString};
use std::mem::ManuallyDrop;
use std::sync::Mutex;

const SOURCE: &str = "prerotation::vulkan";

/// Everything that lives as long as the window surface
pub struct GpuContext {
    /// Vulkan entry (keeps the loader library alive)
    _entry: ash::Entry,
    pub instance: ash::Instance,
    pub surface_loader: ash::khr::surface::Instance,
    pub surface: vk::SurfaceKHR,
    pub physical_device: vk::PhysicalDevice,
    pub device: ash::Device,
    /// One queue for graphics and present
    pub queue: vk::Queue,
    pub queue_family: u32,
    pub swapchain_loader: ash::khr::swapchain::Device,

    /// GPU memory allocator
    /// Wrapped in ManuallyDrop to ensure it's dropped BEFORE the device is destroyed
    pub allocator: ManuallyDrop<Mutex<Allocator>>,

    /// Latest known window size, used when the surface leaves the extent to the window
    pub window_extent: Extent2D,

    debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,

    destroyed: bool,
}

/// Names of a `vk::ExtensionProperties` list
fn extension_names(properties: &[vk::ExtensionProperties]) -> Vec<String> {
    properties
        .iter()
        .filter_map(|p| p.extension_name_as_c_str().ok())
        .map(|name| name.to_string_lossy().into_owned())
        .collect()
}

fn c_names(names: &[String]) -> Result<Vec<CString>> {
    names
        .iter()
        .map(|name| {
            CString::new(name.as_str()).map_err(|e| {
                Error::InitializationFailed(format!("Invalid extension name {}: {}", name, e))
            })
        })
        .collect()
}

impl GpuContext {
    /// Bring up instance, surface, device and allocator for `window`
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(
        window: &W,
        window_extent: Extent2D,
        config: &PresenterConfig,
    ) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| {
                    engine_error!(SOURCE, "Failed to load Vulkan library: {:?}", e);
                    Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
                })?;

            let validation = cfg!(feature = "vulkan-validation") && config.enable_validation;

            // Required instance extensions
            let display_handle = window.display_handle()
                .map_err(|e| {
                    engine_error!(SOURCE, "Failed to get display handle: {}", e);
                    Error::InitializationFailed(format!("Failed to get display handle: {}", e))
                })?;
            let platform_extensions = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| {
                    engine_error!(SOURCE, "Failed to get required extensions: {}", e);
                    Error::InitializationFailed(format!("Failed to get required extensions: {}", e))
                })?;

            let mut required_instance = vec![ash::khr::surface::NAME.to_string_lossy().into_owned()];
            for &ptr in platform_extensions {
                let name = CStr::from_ptr(ptr).to_string_lossy().into_owned();
                if !required_instance.contains(&name) {
                    required_instance.push(name);
                }
            }
            if validation {
                required_instance.push(ash::ext::debug_utils::NAME.to_string_lossy().into_owned());
            }

            let supported_instance = entry
                .enumerate_instance_extension_properties(None)
                .map_err(|e| {
                    engine_error!(SOURCE, "Failed to enumerate instance extensions: {:?}", e);
                    Error::InitializationFailed(format!("Failed to enumerate instance extensions: {:?}", e))
                })?;
            ensure_supported(
                ExtensionKind::Instance,
                &required_instance,
                &extension_names(&supported_instance),
            )?;

            // Instance
            let app_name = CString::new(config.app_name.as_str())
                .map_err(|e| Error::InitializationFailed(format!("Invalid application name: {}", e)))?;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"PreRotation")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_1);

            let instance_extensions = c_names(&required_instance)?;
            let instance_extension_ptrs: Vec<_> = instance_extensions.iter().map(|n| n.as_ptr()).collect();
            let layer_names = if validation {
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&instance_extension_ptrs);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| {
                    engine_error!(SOURCE, "Failed to create Vulkan instance: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
                })?;

            let (debug_utils_loader, debug_messenger) = if validation {
                match Self::create_debug_messenger(&entry, &instance) {
                    Ok(messenger) => messenger,
                    Err(e) => {
                        instance.destroy_instance(None);
                        return Err(e);
                    }
                }
            } else {
                (None, None)
            };

            // Everything below unwinds in reverse on failure
            let abort = |surface: Option<(&ash::khr::surface::Instance, vk::SurfaceKHR)>| {
                if let Some((loader, surface)) = surface {
                    loader.destroy_surface(surface, None);
                }
                if let (Some(debug_utils), Some(messenger)) = (&debug_utils_loader, debug_messenger) {
                    #[cfg(feature = "vulkan-validation")]
                    crate::debug::cleanup_debug_config();
                    debug_utils.destroy_debug_utils_messenger(messenger, None);
                }
                instance.destroy_instance(None);
            };

            // Surface (kept for the whole session, probed every swap check)
            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);
            let surface = match Self::create_surface(&entry, &instance, window) {
                Ok(surface) => surface,
                Err(e) => {
                    abort(None);
                    return Err(e);
                }
            };

            let (physical_device, queue_family, device) =
                match Self::create_device(&instance, &surface_loader, surface) {
                    Ok(created) => created,
                    Err(e) => {
                        abort(Some((&surface_loader, surface)));
                        return Err(e);
                    }
                };
            let queue = device.get_device_queue(queue_family, 0);
            let swapchain_loader = ash::khr::swapchain::Device::new(&instance, &device);

            let allocator = match Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            }) {
                Ok(allocator) => allocator,
                Err(e) => {
                    engine_error!(SOURCE, "Failed to create GPU allocator: {:?}", e);
                    device.destroy_device(None);
                    abort(Some((&surface_loader, surface)));
                    return Err(Error::InitializationFailed(format!("Failed to create allocator: {:?}", e)));
                }
            };

            engine_info!(
                SOURCE,
                "Vulkan device ready (queue family {}, validation {})",
                queue_family,
                validation
            );

            Ok(Self {
                _entry: entry,
                instance,
                surface_loader,
                surface,
                physical_device,
                device,
                queue,
                queue_family,
                swapchain_loader,
                allocator: ManuallyDrop::new(Mutex::new(allocator)),
                window_extent,
                debug_utils_loader,
                debug_messenger,
                destroyed: false,
            })
        }
    }

    unsafe fn create_surface<W: HasDisplayHandle + HasWindowHandle>(
        entry: &ash::Entry,
        instance: &ash::Instance,
        window: &W,
    ) -> Result<vk::SurfaceKHR> {
        let display_handle = window.display_handle()
            .map_err(|e| {
                engine_error!(SOURCE, "Failed to get display handle: {}", e);
                Error::InitializationFailed(format!("Failed to get display handle: {}", e))
            })?;
        let window_handle = window.window_handle()
            .map_err(|e| {
                engine_error!(SOURCE, "Failed to get window handle: {}", e);
                Error::InitializationFailed(format!("Failed to get window handle: {}", e))
            })?;

        ash_window::create_surface(
            entry,
            instance,
            display_handle.as_raw(),
            window_handle.as_raw(),
            None,
        )
        .map_err(|e| {
            engine_error!(SOURCE, "Failed to create surface: {:?}", e);
            Error::InitializationFailed(format!("Failed to create surface: {:?}", e))
        })
    }

    /// First physical device, first graphics+present family, device with `VK_KHR_swapchain`
    unsafe fn create_device(
        instance: &ash::Instance,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
    ) -> Result<(vk::PhysicalDevice, u32, ash::Device)> {
        let physical_device = instance
            .enumerate_physical_devices()
            .map_err(|e| {
                engine_error!(SOURCE, "Failed to enumerate physical devices: {:?}", e);
                Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
            })?
            .into_iter()
            .next()
            .ok_or_else(|| {
                engine_error!(SOURCE, "No Vulkan-capable GPU found");
                Error::InitializationFailed("No Vulkan-capable GPU found".to_string())
            })?;

        let queue_families = instance.get_physical_device_queue_family_properties(physical_device);
        let queue_family = (0..queue_families.len() as u32)
            .find(|&i| {
                queue_families[i as usize].queue_flags.contains(vk::QueueFlags::GRAPHICS)
                    && surface_loader
                        .get_physical_device_surface_support(physical_device, i, surface)
                        .unwrap_or(false)
            })
            .ok_or_else(|| {
                engine_error!(SOURCE, "No queue family supports both graphics and present");
                Error::InitializationFailed("No graphics+present queue family found".to_string())
            })?;

        let required_device = vec![ash::khr::swapchain::NAME.to_string_lossy().into_owned()];
        let supported_device = instance
            .enumerate_device_extension_properties(physical_device)
            .map_err(|e| {
                engine_error!(SOURCE, "Failed to enumerate device extensions: {:?}", e);
                Error::InitializationFailed(format!("Failed to enumerate device extensions: {:?}", e))
            })?;
        ensure_supported(
            ExtensionKind::Device,
            &required_device,
            &extension_names(&supported_device),
        )?;

        let queue_priorities = [1.0];
        let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
            .queue_family_index(queue_family)
            .queue_priorities(&queue_priorities)];
        let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];

        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&device_extension_names);

        let device = instance
            .create_device(physical_device, &device_create_info, None)
            .map_err(|e| {
                engine_error!(SOURCE, "Failed to create logical device: {:?}", e);
                Error::InitializationFailed(format!("Failed to create device: {:?}", e))
            })?;

        Ok((physical_device, queue_family, device))
    }

    #[cfg(feature = "vulkan-validation")]
    unsafe fn create_debug_messenger(
        entry: &ash::Entry,
        instance: &ash::Instance,
    ) -> Result<(Option<ash::ext::debug_utils::Instance>, Option<vk::DebugUtilsMessengerEXT>)> {
        let debug_utils = ash::ext::debug_utils::Instance::new(entry, instance);
        crate::debug::init_debug_config();

        let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(crate::debug::messenger_severity())
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));

        let messenger = debug_utils
            .create_debug_utils_messenger(&debug_info, None)
            .map_err(|e| {
                engine_error!(SOURCE, "Failed to create debug messenger: {:?}", e);
                Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e))
            })?;

        Ok((Some(debug_utils), Some(messenger)))
    }

    #[cfg(not(feature = "vulkan-validation"))]
    unsafe fn create_debug_messenger(
        _entry: &ash::Entry,
        _instance: &ash::Instance,
    ) -> Result<(Option<ash::ext::debug_utils::Instance>, Option<vk::DebugUtilsMessengerEXT>)> {
        Ok((None, None))
    }

    /// Lock the allocator
    pub fn allocator(&self) -> Result<std::sync::MutexGuard<'_, Allocator>> {
        self.allocator
            .lock()
            .map_err(|_| Error::BackendError("GPU allocator lock poisoned".to_string()))
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Destroy allocator, device, surface and instance; later calls do nothing
    ///
    /// Every object created from the device must already be gone.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        unsafe {
            self.device.device_wait_idle().ok();

            // 1. Drop allocator: free VkDeviceMemory pages BEFORE destroying device
            ManuallyDrop::drop(&mut self.allocator);

            // 2. Stop the callback, then destroy the messenger
            #[cfg(feature = "vulkan-validation")]
            crate::debug::cleanup_debug_config();
            if let (Some(debug_utils), Some(messenger)) =
                (&self.debug_utils_loader, self.debug_messenger.take())
            {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            // 3. Device, surface, instance
            self.device.destroy_device(None);
            self.surface_loader.destroy_surface(self.surface, None);
            self.instance.destroy_instance(None);
        }

        engine_debug!(SOURCE, "Vulkan context destroyed");
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        self.destroy();
    }
}
