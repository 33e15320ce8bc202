/// VulkanContext - instance, device, queues and command pool shared by window surfaces
///
/// Surfaces, swapchains and every other handle handed out through
/// `GraphicsContext` are owned by the caller, which destroys them before the
/// context is dropped.

use ash::vk;
use std::ffi::CString;
use std::sync::atomic::{AtomicBool, Ordering};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use lumen_engine::lumen::{Config, Error, Result};
use lumen_engine::lumen::context::QueueFamilyIndices;
use lumen_engine::{engine_debug, engine_info, engine_error};

use crate::vulkan_format::error_from_vk;

pub(crate) const SOURCE: &str = "lumen::vulkan";

/// Vulkan implementation of the device/context collaborator
pub struct VulkanContext {
    /// Vulkan entry (needed for surface creation)
    pub(crate) entry: ash::Entry,
    pub(crate) instance: ash::Instance,
    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) device: ash::Device,

    pub(crate) surface_loader: ash::khr::surface::Instance,
    pub(crate) swapchain_loader: ash::khr::swapchain::Device,

    pub(crate) graphics_queue: vk::Queue,
    pub(crate) present_queue: vk::Queue,
    pub(crate) queue_families: QueueFamilyIndices,

    /// Pool of the per-image command buffers (RESET_COMMAND_BUFFER)
    pub(crate) command_pool: vk::CommandPool,

    /// Set once any call reports ERROR_DEVICE_LOST
    pub(crate) device_lost: AtomicBool,

    debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl VulkanContext {
    /// Create the instance, pick a device able to present to `window`, and
    /// create the logical device with its queues and command pool
    ///
    /// `window` only serves device selection; surfaces are created per window
    /// through `GraphicsContext::create_surface`.
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(window: &W, config: &Config) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| {
                    engine_error!(SOURCE, "Failed to load Vulkan library: {:?}", e);
                    Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
                })?;

            let app_name = CString::new(config.app_name.as_str())
                .map_err(|e| {
                    engine_error!(SOURCE, "Invalid application name: {}", e);
                    Error::InitializationFailed(format!("Invalid application name: {}", e))
                })?;
            let (major, minor, patch) = config.app_version;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, major, minor, patch))
                .engine_name(c"Lumen")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            let display_handle = window.display_handle()
                .map_err(|e| {
                    engine_error!(SOURCE, "Failed to get display handle: {}", e);
                    Error::InitializationFailed(format!("Failed to get display handle: {}", e))
                })?;
            let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| {
                    engine_error!(SOURCE, "Failed to get required extensions: {}", e);
                    Error::InitializationFailed(format!("Failed to get required extensions: {}", e))
                })?
                .to_vec();

            if config.enable_validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }

            let layer_names = if config.enable_validation {
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| {
                    engine_error!(SOURCE, "Failed to create Vulkan instance: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
                })?;

            let (debug_utils_loader, debug_messenger) = if config.enable_validation {
                let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &instance);
                crate::debug::init_debug_config(config.debug_severity);

                let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
                    .message_severity(crate::debug::severity_flags(config.debug_severity))
                    .message_type(
                        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
                    )
                    .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));

                match debug_utils.create_debug_utils_messenger(&debug_info, None) {
                    Ok(messenger) => (Some(debug_utils), Some(messenger)),
                    Err(e) => {
                        engine_error!(SOURCE, "Failed to create debug messenger: {:?}", e);
                        instance.destroy_instance(None);
                        return Err(Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e)));
                    }
                }
            } else {
                (None, None)
            };

            let device: ash::Device;
            // Everything created so far is torn down by `Partial` on early return
            let mut partial = Partial {
                instance: &instance,
                debug: debug_utils_loader.as_ref().zip(debug_messenger),
                device: None,
                armed: true,
            };

            let window_handle = window.window_handle()
                .map_err(|e| {
                    engine_error!(SOURCE, "Failed to get window handle: {}", e);
                    Error::InitializationFailed(format!("Failed to get window handle: {}", e))
                })?;

            // Temporary surface for present family selection
            let surface = ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| {
                engine_error!(SOURCE, "Failed to create surface: {:?}", e);
                Error::InitializationFailed(format!("Failed to create surface: {:?}", e))
            })?;

            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);
            let selected = Self::select_device(&instance, &surface_loader, surface);
            surface_loader.destroy_surface(surface, None);
            let (physical_device, graphics_family_index, present_family_index) = selected?;

            let queue_priorities = [1.0];
            let queue_create_infos = if graphics_family_index == present_family_index {
                vec![
                    vk::DeviceQueueCreateInfo::default()
                        .queue_family_index(graphics_family_index)
                        .queue_priorities(&queue_priorities),
                ]
            } else {
                vec![
                    vk::DeviceQueueCreateInfo::default()
                        .queue_family_index(graphics_family_index)
                        .queue_priorities(&queue_priorities),
                    vk::DeviceQueueCreateInfo::default()
                        .queue_family_index(present_family_index)
                        .queue_priorities(&queue_priorities),
                ]
            };

            let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];
            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names);

            device = instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| {
                    engine_error!(SOURCE, "Failed to create logical device: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create device: {:?}", e))
                })?;
            partial.device = Some(&device);

            let graphics_queue = device.get_device_queue(graphics_family_index, 0);
            let present_queue = device.get_device_queue(present_family_index, 0);

            let pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(graphics_family_index)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

            let command_pool = device.create_command_pool(&pool_create_info, None)
                .map_err(|e| {
                    engine_error!(SOURCE, "Failed to create command pool: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create command pool: {:?}", e))
                })?;

            partial.armed = false;
            drop(partial);

            let swapchain_loader = ash::khr::swapchain::Device::new(&instance, &device);

            engine_info!(
                SOURCE,
                "Vulkan context ready (graphics family {}, present family {}, validation {})",
                graphics_family_index,
                present_family_index,
                config.enable_validation
            );

            Ok(Self {
                entry,
                instance,
                physical_device,
                device,
                surface_loader,
                swapchain_loader,
                graphics_queue,
                present_queue,
                queue_families: QueueFamilyIndices {
                    graphics: Some(graphics_family_index),
                    present: Some(present_family_index),
                },
                command_pool,
                device_lost: AtomicBool::new(false),
                debug_utils_loader,
                debug_messenger,
            })
        }
    }

    /// First physical device with a graphics family and a family able to present to `surface`
    unsafe fn select_device(
        instance: &ash::Instance,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
    ) -> Result<(vk::PhysicalDevice, u32, u32)> {
        let physical_devices = instance
            .enumerate_physical_devices()
            .map_err(|e| {
                engine_error!(SOURCE, "Failed to enumerate physical devices: {:?}", e);
                Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
            })?;

        for physical_device in physical_devices {
            let queue_families = instance.get_physical_device_queue_family_properties(physical_device);

            let graphics = queue_families
                .iter()
                .position(|qf| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                .map(|i| i as u32);

            // Prefer a family that does both
            let present = graphics
                .filter(|&i| {
                    surface_loader
                        .get_physical_device_surface_support(physical_device, i, surface)
                        .unwrap_or(false)
                })
                .or_else(|| {
                    (0..queue_families.len() as u32).find(|&i| {
                        surface_loader
                            .get_physical_device_surface_support(physical_device, i, surface)
                            .unwrap_or(false)
                    })
                });

            if let (Some(graphics), Some(present)) = (graphics, present) {
                let properties = instance.get_physical_device_properties(physical_device);
                let name = properties
                    .device_name_as_c_str()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|_| "<unnamed>".to_string());
                engine_debug!(SOURCE, "Selected physical device '{}'", name);
                return Ok((physical_device, graphics, present));
            }
        }

        engine_error!(SOURCE, "No Vulkan device with graphics and present support found");
        Err(Error::InitializationFailed("No Vulkan device with graphics and present support found".to_string()))
    }

    /// Log a failed call, remember device loss, and map the result to an engine error
    pub(crate) fn vk_error(&self, operation: &str, result: vk::Result) -> Error {
        if result == vk::Result::ERROR_DEVICE_LOST {
            self.device_lost.store(true, Ordering::Release);
        }
        engine_error!(SOURCE, "{} failed: {:?}", operation, result);
        error_from_vk(result)
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    /// Logical device, for creating pipelines and buffers outside the engine
    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();
            self.device.destroy_command_pool(self.command_pool, None);
            self.device.destroy_device(None);

            if let (Some(loader), Some(messenger)) = (&self.debug_utils_loader, self.debug_messenger) {
                loader.destroy_debug_utils_messenger(messenger, None);
            }

            self.instance.destroy_instance(None);
        }
        engine_debug!(SOURCE, "Vulkan context destroyed");
    }
}

/// Tears down a half-built context when `new` returns early
struct Partial<'a> {
    instance: &'a ash::Instance,
    debug: Option<(&'a ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    device: Option<&'a ash::Device>,
    armed: bool,
}

impl Drop for Partial<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        unsafe {
            if let Some(device) = self.device {
                device.destroy_device(None);
            }
            if let Some((loader, messenger)) = self.debug {
                loader.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}
