use ash::vk;

use crate::backends::vulkan::ffi;

pub struct VkPhysicalDevice {
    pub device: vk::PhysicalDevice,
    pub name: String,
    pub supported_extensions: Vec<String>,
    pub properties: vk::PhysicalDeviceProperties,
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    pub features: VkPhysicalDeviceFeatures,
    pub queue_families: Vec<vk::QueueFamilyProperties>,
}

impl VkPhysicalDevice {
    pub fn new(
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
    ) -> Self {
        // extensions
        let supported_extensions = unsafe { instance.enumerate_device_extension_properties(physical_device) }
            .unwrap_or_default()
            .iter()
            .map(|ext_prop| ffi::c_char_slice_to_string(&ext_prop.extension_name))
            .collect::<Vec<_>>();

        // properties
        let properties = unsafe { instance.get_physical_device_properties(physical_device) };
        let memory_properties = unsafe { instance.get_physical_device_memory_properties(physical_device) };
        let queue_families = unsafe { instance.get_physical_device_queue_family_properties(physical_device) };

        // features, the atomic float struct is only chained when the extension exists
        let mut atomic_float_features = vk::PhysicalDeviceShaderAtomicFloatFeaturesEXT::default();
        let mut vk12_features = vk::PhysicalDeviceVulkan12Features::default();
        let has_atomic_float = supported_extensions
            .iter()
            .any(|ext| ext.as_str() == ext_name(ash::ext::shader_atomic_float::NAME));
        let features = {
            let mut features2 = vk::PhysicalDeviceFeatures2::default().push_next(&mut vk12_features);
            if has_atomic_float {
                features2 = features2.push_next(&mut atomic_float_features);
            }
            unsafe { instance.get_physical_device_features2(physical_device, &mut features2) };
            VkPhysicalDeviceFeatures {
                shader_buffer_float32_atomics: atomic_float_features.shader_buffer_float32_atomics == vk::TRUE,
                shader_buffer_float32_atomic_add: atomic_float_features.shader_buffer_float32_atomic_add == vk::TRUE,
                runtime_descriptor_array: vk12_features.runtime_descriptor_array == vk::TRUE,
                descriptor_indexing: vk12_features.descriptor_indexing == vk::TRUE,
            }
        };

        Self {
            device: physical_device,
            name: ffi::c_char_slice_to_string(&properties.device_name),
            supported_extensions,
            properties,
            memory_properties,
            features,
            queue_families,
        }
    }

    pub fn supports_extension(
        &self,
        name: &str,
    ) -> bool {
        self.supported_extensions.iter().any(|ext| ext == name)
    }

    pub fn limits(&self) -> &vk::PhysicalDeviceLimits {
        &self.properties.limits
    }

    pub fn queue_families(&self) -> VkQueueFamilies {
        VkQueueFamilies::discover(&self.queue_families)
    }

    /// Lower is better: discrete > integrated > virtual > cpu > other.
    pub fn type_rank(&self) -> u32 {
        match self.properties.device_type {
            vk::PhysicalDeviceType::DISCRETE_GPU => 0,
            vk::PhysicalDeviceType::INTEGRATED_GPU => 1,
            vk::PhysicalDeviceType::VIRTUAL_GPU => 2,
            vk::PhysicalDeviceType::CPU => 3,
            vk::PhysicalDeviceType::OTHER => 4,
            _ => 5,
        }
    }
}

pub(crate) fn ext_name(name: &'static std::ffi::CStr) -> &'static str {
    name.to_str().unwrap_or_default()
}

/// First queue family matching each capability class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VkQueueFamilies {
    pub compute: Option<u32>,
    pub graphics: Option<u32>,
    pub transfer: Option<u32>,
}

impl VkQueueFamilies {
    pub fn discover(families: &[vk::QueueFamilyProperties]) -> Self {
        let first = |flags: vk::QueueFlags| {
            families
                .iter()
                .position(|family| family.queue_count > 0 && family.queue_flags.contains(flags))
                .map(|index| index as u32)
        };
        let compute = first(vk::QueueFlags::COMPUTE);
        let graphics = first(vk::QueueFlags::GRAPHICS);
        // compute and graphics families accept transfer commands implicitly
        let transfer = first(vk::QueueFlags::TRANSFER).or(compute).or(graphics);
        Self {
            compute,
            graphics,
            transfer,
        }
    }

    /// Distinct family indices, each of which gets exactly one queue.
    pub fn unique(&self) -> Vec<u32> {
        let mut indices = [self.compute, self.graphics, self.transfer]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

/// Here is only features that required by app
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VkPhysicalDeviceFeatures {
    // VK_EXT_shader_atomic_float
    pub shader_buffer_float32_atomics: bool,
    pub shader_buffer_float32_atomic_add: bool,

    // Version 1.2 (descriptor indexing)
    pub runtime_descriptor_array: bool,
    pub descriptor_indexing: bool,
}

impl VkPhysicalDeviceFeatures {
    pub fn contains(
        &self,
        other: &Self,
    ) -> bool {
        (self.shader_buffer_float32_atomics || !other.shader_buffer_float32_atomics)
            && (self.shader_buffer_float32_atomic_add || !other.shader_buffer_float32_atomic_add)
            && (self.runtime_descriptor_array || !other.runtime_descriptor_array)
            && (self.descriptor_indexing || !other.descriptor_indexing)
    }

    pub fn missing(
        &self,
        required: &Self,
    ) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if required.shader_buffer_float32_atomics && !self.shader_buffer_float32_atomics {
            missing.push("shaderBufferFloat32Atomics");
        }
        if required.shader_buffer_float32_atomic_add && !self.shader_buffer_float32_atomic_add {
            missing.push("shaderBufferFloat32AtomicAdd");
        }
        if required.runtime_descriptor_array && !self.runtime_descriptor_array {
            missing.push("runtimeDescriptorArray");
        }
        if required.descriptor_indexing && !self.descriptor_indexing {
            missing.push("descriptorIndexing");
        }
        missing
    }
}

impl Default for VkPhysicalDeviceFeatures {
    fn default() -> Self {
        Self {
            shader_buffer_float32_atomics: true,
            shader_buffer_float32_atomic_add: true,
            runtime_descriptor_array: true,
            descriptor_indexing: false,
        }
    }
}
