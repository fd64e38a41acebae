use std::collections::HashMap;
use std::ffi::CStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use ash::vk;

use crate::backends::vulkan::shader::{VkShaderError, VkShaderRegistry};
use crate::kernel::Kernel;

const MAIN: &CStr = c"main";

pub const MAX_BINDINGS: usize = 4;
pub const PUSH_CONSTANT_BYTES: u32 = 128;

/// Handles needed to record one dispatch of a kernel.
#[derive(Debug, Clone, Copy)]
pub struct VkComputePipeline {
    pub pipeline: vk::Pipeline,
    pub pipeline_layout: vk::PipelineLayout,
    pub descriptor_set_layout: vk::DescriptorSetLayout,
}

#[derive(Clone, Copy)]
struct VkLayout {
    descriptor_set_layout: vk::DescriptorSetLayout,
    pipeline_layout: vk::PipelineLayout,
}

struct CachedPipeline {
    pipeline: vk::Pipeline,
    generation: u64,
}

#[derive(Default)]
struct CacheState {
    layouts: HashMap<usize, VkLayout>,
    pipelines: HashMap<(Kernel, usize), CachedPipeline>,
    // replaced by a newer generation, destroyed with the cache
    retired: Vec<vk::Pipeline>,
}

/// Compute pipelines keyed by kernel and binding count.
///
/// Layouts are shared by every kernel with the same number of storage
/// buffers. `invalidate` bumps the generation so stale pipelines get rebuilt
/// on their next use.
pub struct VkPipelineCache {
    device: Arc<ash::Device>,
    workgroup_size: u32,
    generation: AtomicU64,
    state: Mutex<CacheState>,
}

impl VkPipelineCache {
    pub fn new(
        device: Arc<ash::Device>,
        workgroup_size: u32,
    ) -> Self {
        Self {
            device,
            workgroup_size,
            generation: AtomicU64::new(0),
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn invalidate(&self) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        log::debug!("Pipeline cache invalidated, generation {generation}");
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(
        &self,
        shaders: &VkShaderRegistry,
        kernel: Kernel,
    ) -> Result<VkComputePipeline, VkPipelineError> {
        let bindings = kernel.bindings();
        if !(1..=MAX_BINDINGS).contains(&bindings) {
            return Err(VkPipelineError::UnsupportedBindingCount(bindings));
        }
        let generation = self.generation();

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let layout = match state.layouts.get(&bindings) {
            Some(&layout) => layout,
            None => {
                let layout = self.create_layout(bindings)?;
                state.layouts.insert(bindings, layout);
                layout
            },
        };

        if let Some(cached) = state.pipelines.get(&(kernel, bindings))
            && cached.generation == generation
        {
            return Ok(VkComputePipeline {
                pipeline: cached.pipeline,
                pipeline_layout: layout.pipeline_layout,
                descriptor_set_layout: layout.descriptor_set_layout,
            });
        }

        let shader_module = shaders.get(kernel)?;
        let pipeline = self.create_pipeline(shader_module, layout.pipeline_layout).map_err(|err| {
            log::error!("Cannot create pipeline for {kernel}: {err}");
            err
        })?;
        if let Some(stale) = state.pipelines.insert(
            (kernel, bindings),
            CachedPipeline {
                pipeline,
                generation,
            },
        ) {
            state.retired.push(stale.pipeline);
        }

        Ok(VkComputePipeline {
            pipeline,
            pipeline_layout: layout.pipeline_layout,
            descriptor_set_layout: layout.descriptor_set_layout,
        })
    }

    fn create_layout(
        &self,
        bindings: usize,
    ) -> Result<VkLayout, VkPipelineError> {
        let layout_bindings = (0..bindings as u32)
            .map(|binding| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(binding)
                    .descriptor_count(1)
                    .descriptor_type(vk::DescriptorType::STORAGE_BUFFER)
                    .stage_flags(vk::ShaderStageFlags::COMPUTE)
            })
            .collect::<Vec<_>>();

        // descriptor set
        let descriptor_set_layout = {
            let info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&layout_bindings);
            unsafe { self.device.create_descriptor_set_layout(&info, None) }.map_err(VkPipelineError::LayoutCreate)?
        };

        let push_constant_range = vk::PushConstantRange::default()
            .stage_flags(vk::ShaderStageFlags::COMPUTE)
            .offset(0)
            .size(PUSH_CONSTANT_BYTES);
        let pipeline_layout = {
            let info = vk::PipelineLayoutCreateInfo::default()
                .set_layouts(std::slice::from_ref(&descriptor_set_layout))
                .push_constant_ranges(std::slice::from_ref(&push_constant_range));
            match unsafe { self.device.create_pipeline_layout(&info, None) } {
                Ok(layout) => layout,
                Err(err) => {
                    unsafe { self.device.destroy_descriptor_set_layout(descriptor_set_layout, None) };
                    return Err(VkPipelineError::LayoutCreate(err));
                },
            }
        };

        Ok(VkLayout {
            descriptor_set_layout,
            pipeline_layout,
        })
    }

    fn create_pipeline(
        &self,
        shader_module: vk::ShaderModule,
        pipeline_layout: vk::PipelineLayout,
    ) -> Result<vk::Pipeline, VkPipelineError> {
        let workgroup_size = self.workgroup_size.to_ne_bytes();
        let map_entries = [vk::SpecializationMapEntry::default()
            .constant_id(0)
            .offset(0)
            .size(size_of::<u32>())];
        let specialization = vk::SpecializationInfo::default()
            .map_entries(&map_entries)
            .data(&workgroup_size);

        let stage_info = vk::PipelineShaderStageCreateInfo::default()
            .stage(vk::ShaderStageFlags::COMPUTE)
            .module(shader_module)
            .name(MAIN)
            .specialization_info(&specialization);
        let info = vk::ComputePipelineCreateInfo::default()
            .stage(stage_info)
            .layout(pipeline_layout);
        let pipelines = unsafe {
            self.device
                .create_compute_pipelines(vk::PipelineCache::null(), std::slice::from_ref(&info), None)
        }
        .map_err(|(_, err)| VkPipelineError::PipelineCreate(err))?;
        Ok(pipelines[0])
    }

    /// Destroys every pipeline and layout. The device must be idle.
    pub(crate) unsafe fn clear(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let CacheState {
            layouts,
            pipelines,
            retired,
        } = &mut *state;
        unsafe {
            for (_, cached) in pipelines.drain() {
                self.device.destroy_pipeline(cached.pipeline, None);
            }
            for pipeline in retired.drain(..) {
                self.device.destroy_pipeline(pipeline, None);
            }
            for (_, layout) in layouts.drain() {
                self.device.destroy_pipeline_layout(layout.pipeline_layout, None);
                self.device.destroy_descriptor_set_layout(layout.descriptor_set_layout, None);
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VkPipelineError {
    #[error("Pipeline layout creation error: {0}")]
    LayoutCreate(vk::Result),

    #[error("Compute pipeline creation error: {0}")]
    PipelineCreate(vk::Result),

    #[error("Unsupported binding count: {0}")]
    UnsupportedBindingCount(usize),

    #[error(transparent)]
    Shader(#[from] VkShaderError),
}
