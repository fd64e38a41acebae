use std::os::raw::c_void;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use ash::{ext, khr, vk};

use crate::backends::vulkan::descriptor::VkDescriptorPool;
use crate::backends::vulkan::ffi::{self, CStringArray};
use crate::backends::vulkan::logger::{VkLogFacade, VkLogger};
use crate::backends::vulkan::physical_device::{
    VkPhysicalDevice, VkPhysicalDeviceFeatures, VkQueueFamilies, ext_name,
};
use crate::backends::vulkan::pipeline::{VkComputePipeline, VkPipelineCache, VkPipelineError};
use crate::backends::vulkan::shader::VkShaderRegistry;
use crate::kernel::Kernel;
use crate::utils::env_utils::VkVecEnvVar;

const VK_LAYER_KHRONOS_VALIDATION: &str = "VK_LAYER_KHRONOS_validation";

static SHARED_CONTEXT: Mutex<Option<Arc<VkContext>>> = Mutex::new(None);

#[derive(Debug, Clone, Copy)]
pub struct VkQueue {
    pub family_index: u32,
    pub queue: vk::Queue,
}

/// Queue handles per capability class. Only `compute` is ever submitted to.
#[derive(Debug, Clone, Copy)]
pub struct VkQueues {
    pub compute: VkQueue,
    pub graphics: Option<VkQueue>,
    pub transfer: Option<VkQueue>,
}

/// Runtime knobs the dispatch path reads from the context.
#[derive(Debug, Clone)]
pub struct VkContextSettings {
    pub workgroup_size: u32,
    pub fence_timeout: Option<Duration>,
    pub max_batch_dispatches: usize,
}

struct VkDebugMessenger {
    loader: ext::debug_utils::Instance,
    messenger: vk::DebugUtilsMessengerEXT,
    // referenced by the messenger's user data pointer
    _logger: Box<Arc<dyn VkLogger>>,
}

/// https://docs.vulkan.org/refpages/latest/refpages/index.html
pub struct VkContext {
    settings: VkContextSettings,
    pipelines: VkPipelineCache,
    shaders: VkShaderRegistry,
    descriptor_pool: VkDescriptorPool,
    queue_lock: Mutex<()>,
    queues: VkQueues,
    memory_allocator: Option<vk_mem::Allocator>,
    device: Arc<ash::Device>,
    physical_device: VkPhysicalDevice,
    debug_messenger: Option<VkDebugMessenger>,
    instance: ash::Instance,
    _entry: ash::Entry,
}

impl VkContext {
    pub fn new(create_info: VkContextCreateInfo) -> Result<Self, VkContextError> {
        let entry = get_entry()?;
        let with_validation = create_info.with_validation && is_validation_available(&entry);
        let instance = create_instance(&entry, create_info.api_version, with_validation)?;
        let debug_messenger = if with_validation {
            create_debug_messenger(&entry, &instance, create_info.logger.clone())
        } else {
            None
        };

        let physical_device = get_physical_device(&instance, &create_info.required_extensions, &create_info.required_features)?;
        log::debug!(
            "Selected physical device {} ({:?})",
            physical_device.name,
            physical_device.properties.device_type
        );

        let workgroup_size = validate_workgroup_size(create_info.workgroup_size, &physical_device)?;
        let families = physical_device.queue_families();
        let device = get_logical_device(&instance, &physical_device, &families, &create_info.required_extensions, &create_info.required_features)?;
        let queues = get_queues(&device, &families)?;
        let memory_allocator = create_memory_allocator(&instance, &device, physical_device.device)?;

        let device = Arc::new(device);
        let descriptor_pool = VkDescriptorPool::new(device.clone(), create_info.descriptor_pool_capacity)
            .map_err(VkContextError::DescriptorPoolCreate)?;
        let shaders = VkShaderRegistry::new(device.clone(), create_info.shader_dir.clone());
        let pipelines = VkPipelineCache::new(device.clone(), workgroup_size);

        Ok(Self {
            settings: VkContextSettings {
                workgroup_size,
                fence_timeout: create_info.fence_timeout,
                max_batch_dispatches: batch_limit(create_info.max_batch_dispatches, descriptor_pool.capacity()),
            },
            pipelines,
            shaders,
            descriptor_pool,
            queue_lock: Mutex::new(()),
            queues,
            memory_allocator: Some(memory_allocator),
            device,
            physical_device,
            debug_messenger,
            instance,
            _entry: entry,
        })
    }

    /// Process-wide context created from `VkContextCreateInfo::from_env()`.
    pub fn shared() -> Result<Arc<Self>, VkContextError> {
        let mut shared = SHARED_CONTEXT.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(context) = shared.as_ref() {
            return Ok(context.clone());
        }
        let context = Arc::new(Self::new(VkContextCreateInfo::from_env()).inspect_err(|err| {
            log::error!("Cannot create the shared Vulkan context: {err}");
        })?);
        *shared = Some(context.clone());
        Ok(context)
    }

    /// Drops the process-wide handle; the context itself goes away with the
    /// last `Arc` still held by arrays.
    pub fn release_shared() {
        let released = SHARED_CONTEXT
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if released.is_some() {
            log::debug!("Released the shared Vulkan context");
        }
    }

    pub fn device(&self) -> Arc<ash::Device> {
        self.device.clone()
    }

    pub fn memory_allocator(&self) -> &vk_mem::Allocator {
        match self.memory_allocator.as_ref() {
            Some(allocator) => allocator,
            // only taken in Drop
            None => unreachable!("memory allocator used after context teardown"),
        }
    }

    pub fn queues(&self) -> &VkQueues {
        &self.queues
    }

    pub fn physical_device(&self) -> &VkPhysicalDevice {
        &self.physical_device
    }

    pub fn shaders(&self) -> &VkShaderRegistry {
        &self.shaders
    }

    pub fn pipelines(&self) -> &VkPipelineCache {
        &self.pipelines
    }

    pub fn descriptor_pool(&self) -> &VkDescriptorPool {
        &self.descriptor_pool
    }

    pub fn settings(&self) -> &VkContextSettings {
        &self.settings
    }

    pub fn has_validation(&self) -> bool {
        self.debug_messenger.is_some()
    }

    pub fn pipeline(
        &self,
        kernel: Kernel,
    ) -> Result<VkComputePipeline, VkPipelineError> {
        self.pipelines.get(&self.shaders, kernel)
    }

    pub fn workgroup_count(
        &self,
        invocations: usize,
    ) -> u32 {
        workgroup_count(
            invocations,
            self.settings.workgroup_size,
            self.physical_device.limits().max_compute_work_group_count[0],
        )
    }

    /// Submits to the compute queue. Submissions are serialized because
    /// `vkQueueSubmit` requires external synchronization of the queue.
    pub fn queue_submit(
        &self,
        submit_info: &vk::SubmitInfo,
        fence: vk::Fence,
    ) -> Result<(), vk::Result> {
        let _guard = self.lock_queue();
        unsafe { self.device.queue_submit(self.queues.compute.queue, std::slice::from_ref(submit_info), fence) }
    }

    pub fn wait_compute_idle(&self) -> Result<(), vk::Result> {
        let _guard = self.lock_queue();
        unsafe { self.device.queue_wait_idle(self.queues.compute.queue) }
    }

    fn lock_queue(&self) -> MutexGuard<'_, ()> {
        self.queue_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for VkContext {
    fn drop(&mut self) {
        unsafe {
            if let Err(err) = self.device.device_wait_idle() {
                log::warn!("device_wait_idle failed during teardown: {err}");
            }
            self.pipelines.clear();
            self.shaders.clear();
            self.descriptor_pool.destroy();
            self.memory_allocator = None;
            self.device.destroy_device(None);
            if let Some(messenger) = self.debug_messenger.take() {
                messenger.loader.destroy_debug_utils_messenger(messenger.messenger, None);
            }
            self.instance.destroy_instance(None);
        }
        log::debug!("Vulkan context destroyed");
    }
}

/// Every dispatch of a submission holds a descriptor set until its fence
/// signals, so a batch never exceeds the pool capacity.
fn batch_limit(
    max_batch_dispatches: usize,
    descriptor_pool_capacity: u32,
) -> usize {
    let capacity = descriptor_pool_capacity.max(1) as usize;
    if max_batch_dispatches > capacity {
        log::warn!(
            "max_batch_dispatches {max_batch_dispatches} exceeds descriptor pool capacity {capacity}, using {capacity}"
        );
    }
    max_batch_dispatches.clamp(1, capacity)
}

pub struct VkContextCreateInfo {
    pub api_version: u32,
    pub with_validation: bool,
    pub logger: Arc<dyn VkLogger>,
    pub required_extensions: Vec<&'static str>,
    pub required_features: VkPhysicalDeviceFeatures,
    /// Must be a power of two; passed to kernels as specialization constant 0.
    pub workgroup_size: u32,
    /// `None` waits without bound.
    pub fence_timeout: Option<Duration>,
    pub descriptor_pool_capacity: u32,
    pub max_batch_dispatches: usize,
    /// Directory with `<kernel>.spv` files, preferred over embedded artifacts.
    pub shader_dir: Option<PathBuf>,
}

impl VkContextCreateInfo {
    pub fn from_env() -> Self {
        let mut info = Self::default();
        if VkVecEnvVar::Validation.is_set() {
            info.with_validation = VkVecEnvVar::Validation.is_enabled();
        }
        if VkVecEnvVar::ShaderDir.is_set() {
            info.shader_dir = Some(PathBuf::from(VkVecEnvVar::ShaderDir.value()));
        }
        if let Some(ms) = VkVecEnvVar::FenceTimeoutMs.parse::<u64>() {
            info.fence_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }
        if let Some(size) = VkVecEnvVar::WorkgroupSize.parse::<u32>() {
            info.workgroup_size = size;
        }
        info
    }
}

impl Default for VkContextCreateInfo {
    fn default() -> Self {
        Self {
            api_version: vk::API_VERSION_1_2,
            with_validation: cfg!(debug_assertions),
            logger: Arc::new(VkLogFacade),
            required_extensions: vec![
                ext_name(ext::shader_atomic_float::NAME),
                ext_name(ext::descriptor_indexing::NAME),
            ],
            required_features: VkPhysicalDeviceFeatures::default(),
            workgroup_size: 256,
            fence_timeout: Some(Duration::from_millis(100)),
            descriptor_pool_capacity: 256,
            max_batch_dispatches: 32,
            shader_dir: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VkContextError {
    #[error("Vulkan device creation error: {0}")]
    DeviceCreateError(vk::Result),

    #[error("Vulkan entry loading error: {0}")]
    EntryLoadingError(ash::LoadingError),

    #[error("Vulkan instance creation error: {0}")]
    InstanceCreate(vk::Result),

    #[error("Memory allocator creation error: {0}")]
    MemoryAllocatorCreate(vk::Result),

    #[error("Descriptor pool creation error: {0}")]
    DescriptorPoolCreate(vk::Result),

    #[error("Vulkan physical devices not found: {0}")]
    PhysicalDevicesNotFound(vk::Result),

    #[error("Vulkan physical devices queue not found")]
    PhysicalDeviceQueueNotFound,

    #[error("Vulkan suitable physical devices not found")]
    PhysicalDeviceSuitableNotFound,

    #[error("Workgroup size {size} must be a power of two not above {max}")]
    InvalidWorkgroupSize { size: u32, max: u32 },
}

fn get_entry() -> Result<ash::Entry, VkContextError> {
    #[cfg(any(target_os = "macos"))]
    // default loader tries to load lib from /usr/lib/, but on macOS this folder is protected by SIP
    let entry_result = unsafe { ash::Entry::load_from("/usr/local/lib/libvulkan.dylib") };

    #[cfg(not(any(target_os = "macos")))]
    let entry_result = unsafe { ash::Entry::load() };

    entry_result.map_err(VkContextError::EntryLoadingError)
}

fn is_validation_available(entry: &ash::Entry) -> bool {
    if is_layer_supported(entry, VK_LAYER_KHRONOS_VALIDATION) {
        return true;
    }
    log::warn!("{VK_LAYER_KHRONOS_VALIDATION} requested but not installed, continuing without validation");
    false
}

fn create_instance(
    entry: &ash::Entry,
    api_version: u32,
    with_validation: bool,
) -> Result<ash::Instance, VkContextError> {
    let mut instance_extensions = CStringArray::new([]);
    let available = unsafe { entry.enumerate_instance_extension_properties(None) }.unwrap_or_default();
    let is_available = |name: &std::ffi::CStr| {
        available
            .iter()
            .any(|prop| ffi::c_char_slice_to_string(&prop.extension_name) == ext_name_of(name))
    };
    let mut flags = vk::InstanceCreateFlags::empty();
    if is_available(khr::portability_enumeration::NAME) {
        instance_extensions.push_static(khr::portability_enumeration::NAME);
        flags |= vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR;
    }
    instance_extensions.push_static(khr::get_physical_device_properties2::NAME);
    if with_validation {
        instance_extensions.push_static(ext::debug_utils::NAME);
    }

    let instance_layers = if with_validation {
        CStringArray::new([VK_LAYER_KHRONOS_VALIDATION])
    } else {
        CStringArray::new([])
    };

    let app_name = c"vkvec";
    let app_info = vk::ApplicationInfo::default()
        .application_name(app_name)
        .engine_name(app_name)
        .api_version(api_version);

    let instance_info = vk::InstanceCreateInfo::default()
        .application_info(&app_info)
        .enabled_extension_names(instance_extensions.as_ptrs())
        .enabled_layer_names(instance_layers.as_ptrs())
        .flags(flags);

    unsafe { entry.create_instance(&instance_info, None) }.map_err(VkContextError::InstanceCreate)
}

fn ext_name_of(name: &std::ffi::CStr) -> String {
    name.to_string_lossy().into_owned()
}

fn create_debug_messenger(
    entry: &ash::Entry,
    instance: &ash::Instance,
    logger: Arc<dyn VkLogger>,
) -> Option<VkDebugMessenger> {
    let logger = Box::new(logger);
    let loader = ext::debug_utils::Instance::new(entry, instance);
    let msg_create_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
        )
        .pfn_user_callback(Some(crate::backends::vulkan::logger::debug_message_callback))
        .user_data(&*logger as *const Arc<dyn VkLogger> as *mut c_void);

    match unsafe { loader.create_debug_utils_messenger(&msg_create_info, None) } {
        Ok(messenger) => Some(VkDebugMessenger {
            loader,
            messenger,
            _logger: logger,
        }),
        Err(err) => {
            log::warn!("Cannot create debug messenger: {err}");
            None
        },
    }
}

fn create_memory_allocator(
    instance: &ash::Instance,
    device: &ash::Device,
    physical_device: vk::PhysicalDevice,
) -> Result<vk_mem::Allocator, VkContextError> {
    let info = vk_mem::AllocatorCreateInfo::new(instance, device, physical_device);
    unsafe { vk_mem::Allocator::new(info) }.map_err(VkContextError::MemoryAllocatorCreate)
}

fn get_physical_device(
    instance: &ash::Instance,
    required_extensions: &[&str],
    required_features: &VkPhysicalDeviceFeatures,
) -> Result<VkPhysicalDevice, VkContextError> {
    let devices = unsafe { instance.enumerate_physical_devices() }.map_err(|result| {
        log::error!("Cannot enumerate Vulkan physical devices: {result}");
        VkContextError::PhysicalDevicesNotFound(result)
    })?;

    devices
        .into_iter()
        .map(|device| VkPhysicalDevice::new(instance, device))
        .filter(|physical_device| {
            let missing_features = physical_device.features.missing(required_features);
            let missing_extensions = required_extensions
                .iter()
                .filter(|&&ext| !physical_device.supports_extension(ext))
                .collect::<Vec<_>>();
            let has_compute = physical_device.queue_families().compute.is_some();
            let suitable = missing_features.is_empty() && missing_extensions.is_empty() && has_compute;
            if !suitable {
                log::debug!(
                    "Skipping {}: missing features {:?}, missing extensions {:?}, compute queue {}",
                    physical_device.name,
                    missing_features,
                    missing_extensions,
                    has_compute
                );
            }
            suitable
        })
        .min_by_key(VkPhysicalDevice::type_rank)
        .ok_or_else(|| {
            log::error!("No Vulkan device supports the required features and extensions");
            VkContextError::PhysicalDeviceSuitableNotFound
        })
}

fn get_logical_device(
    instance: &ash::Instance,
    physical_device: &VkPhysicalDevice,
    families: &VkQueueFamilies,
    required_extensions: &[&str],
    required_features: &VkPhysicalDeviceFeatures,
) -> Result<ash::Device, VkContextError> {
    if families.compute.is_none() {
        return Err(VkContextError::PhysicalDeviceQueueNotFound);
    }

    let queue_priorities = [1.0_f32];
    let queue_create_infos = families
        .unique()
        .into_iter()
        .map(|family_index| {
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(family_index)
                .queue_priorities(&queue_priorities)
        })
        .collect::<Vec<_>>();

    // prepare extensions
    let mut device_extensions = CStringArray::new(required_extensions.iter().copied());

    // (https://vulkan.lunarg.com/doc/view/1.4.321.0/mac/antora/spec/latest/chapters/devsandqueues.html#VUID-VkDeviceCreateInfo-pProperties-04451
    if physical_device.supports_extension(ext_name(khr::portability_subset::NAME)) {
        device_extensions.push_static(khr::portability_subset::NAME);
    }

    // prepare features
    let vk10_features = vk::PhysicalDeviceFeatures::default();
    // the promoted extension name requires its 1.2 feature bit to be enabled as well
    let descriptor_indexing_enabled = required_extensions.contains(&ext_name(ext::descriptor_indexing::NAME));
    let mut vk12_features = vk::PhysicalDeviceVulkan12Features::default()
        .runtime_descriptor_array(required_features.runtime_descriptor_array)
        .descriptor_indexing(
            required_features.descriptor_indexing
                || (descriptor_indexing_enabled && physical_device.features.descriptor_indexing),
        );
    let mut atomic_float_features = vk::PhysicalDeviceShaderAtomicFloatFeaturesEXT::default()
        .shader_buffer_float32_atomics(required_features.shader_buffer_float32_atomics)
        .shader_buffer_float32_atomic_add(required_features.shader_buffer_float32_atomic_add);
    let needs_atomic_float =
        required_features.shader_buffer_float32_atomics || required_features.shader_buffer_float32_atomic_add;

    // prepare device
    let mut device_create_info = vk::DeviceCreateInfo::default()
        .queue_create_infos(&queue_create_infos)
        .enabled_extension_names(device_extensions.as_ptrs())
        .enabled_features(&vk10_features)
        .push_next(&mut vk12_features);
    if needs_atomic_float {
        device_create_info = device_create_info.push_next(&mut atomic_float_features);
    }

    unsafe { instance.create_device(physical_device.device, &device_create_info, None) }.map_err(|result| {
        log::error!("Cannot create the logical device: {result}");
        VkContextError::DeviceCreateError(result)
    })
}

fn get_queues(
    device: &ash::Device,
    families: &VkQueueFamilies,
) -> Result<VkQueues, VkContextError> {
    let queue = |family_index: u32| VkQueue {
        family_index,
        queue: unsafe { device.get_device_queue(family_index, 0) },
    };
    let compute = families.compute.map(queue).ok_or(VkContextError::PhysicalDeviceQueueNotFound)?;
    Ok(VkQueues {
        compute,
        graphics: families.graphics.map(queue),
        transfer: families.transfer.map(queue),
    })
}

fn validate_workgroup_size(
    size: u32,
    physical_device: &VkPhysicalDevice,
) -> Result<u32, VkContextError> {
    let limits = physical_device.limits();
    let max = limits.max_compute_work_group_size[0].min(limits.max_compute_work_group_invocations);
    if size == 0 || !size.is_power_of_two() || size > max {
        log::error!("Invalid workgroup size {size} (device maximum {max})");
        return Err(VkContextError::InvalidWorkgroupSize { size, max });
    }
    Ok(size)
}

pub(crate) fn workgroup_count(
    invocations: usize,
    workgroup_size: u32,
    max_count: u32,
) -> u32 {
    let groups = invocations.div_ceil(workgroup_size.max(1) as usize).max(1);
    groups.min(max_count.max(1) as usize) as u32
}

fn is_layer_supported(
    entry: &ash::Entry,
    layer: &str,
) -> bool {
    let layer_properties = unsafe { entry.enumerate_instance_layer_properties() }.unwrap_or_default();
    layer_properties
        .iter()
        .any(|prop| ffi::c_char_slice_to_string(&prop.layer_name) == layer)
}
