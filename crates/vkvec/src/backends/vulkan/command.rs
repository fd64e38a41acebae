use std::sync::Arc;
use std::time::Duration;

use ash::vk;

use crate::backends::vulkan::context::VkContext;
use crate::backends::vulkan::descriptor::{VkDescriptorError, VkDescriptorSetLease};
use crate::backends::vulkan::dispatch::VkDispatch;
use crate::backends::vulkan::pipeline::VkPipelineError;

/// Primary command buffer with its own pool on the compute queue family.
pub struct VkCommandBuffer {
    context: Arc<VkContext>,
    command_pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
}

impl VkCommandBuffer {
    pub fn new(context: &Arc<VkContext>) -> Result<Self, VkCommandError> {
        let device = context.device();
        let command_pool = {
            let info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(context.queues().compute.family_index)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
            unsafe { device.create_command_pool(&info, None) }.map_err(VkCommandError::PoolCreate)?
        };
        let command_buffer = {
            let info = vk::CommandBufferAllocateInfo::default()
                .command_pool(command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            match unsafe { device.allocate_command_buffers(&info) } {
                Ok(buffers) => buffers[0],
                Err(err) => {
                    unsafe { device.destroy_command_pool(command_pool, None) };
                    return Err(VkCommandError::Allocate(err));
                },
            }
        };

        Ok(Self {
            context: context.clone(),
            command_pool,
            command_buffer,
        })
    }

    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    /// Records, submits and waits for `dispatches` in order. Batches longer
    /// than `max_batch_dispatches` go out as consecutive submissions.
    pub fn compute(
        &mut self,
        dispatches: &[VkDispatch<'_>],
    ) -> Result<(), VkCommandError> {
        let batch = self.context.settings().max_batch_dispatches;
        for chunk in dispatches.chunks(batch) {
            self.submit_chunk(chunk)?;
        }
        Ok(())
    }

    fn submit_chunk(
        &mut self,
        dispatches: &[VkDispatch<'_>],
    ) -> Result<(), VkCommandError> {
        let context = self.context.clone();
        let device = context.device();

        // leases must outlive the fence wait
        let mut leases: Vec<VkDescriptorSetLease<'_>> = Vec::with_capacity(dispatches.len());

        unsafe {
            device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(VkCommandError::Record)?;
            let begin_info =
                vk::CommandBufferBeginInfo::default().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(VkCommandError::Record)?;
        }

        for (index, dispatch) in dispatches.iter().enumerate() {
            let pipeline = context.pipeline(dispatch.kernel)?;
            let lease = context
                .descriptor_pool()
                .allocate(pipeline.descriptor_set_layout, &dispatch.buffers)?;
            let groups = context.workgroup_count(dispatch.invocations);

            unsafe {
                if index > 0 {
                    let barrier = vk::MemoryBarrier::default()
                        .src_access_mask(vk::AccessFlags::SHADER_WRITE)
                        .dst_access_mask(vk::AccessFlags::SHADER_READ | vk::AccessFlags::SHADER_WRITE);
                    device.cmd_pipeline_barrier(
                        self.command_buffer,
                        vk::PipelineStageFlags::COMPUTE_SHADER,
                        vk::PipelineStageFlags::COMPUTE_SHADER,
                        vk::DependencyFlags::empty(),
                        std::slice::from_ref(&barrier),
                        &[],
                        &[],
                    );
                }
                device.cmd_bind_pipeline(self.command_buffer, vk::PipelineBindPoint::COMPUTE, pipeline.pipeline);
                device.cmd_bind_descriptor_sets(
                    self.command_buffer,
                    vk::PipelineBindPoint::COMPUTE,
                    pipeline.pipeline_layout,
                    0,
                    &[lease.descriptor_set()],
                    &[],
                );
                let constants = dispatch.push_constants.as_bytes();
                if !constants.is_empty() {
                    device.cmd_push_constants(
                        self.command_buffer,
                        pipeline.pipeline_layout,
                        vk::ShaderStageFlags::COMPUTE,
                        0,
                        constants,
                    );
                }
                device.cmd_dispatch(self.command_buffer, groups, 1, 1);
            }
            leases.push(lease);
        }

        unsafe {
            let barrier = vk::MemoryBarrier::default()
                .src_access_mask(vk::AccessFlags::SHADER_WRITE)
                .dst_access_mask(vk::AccessFlags::HOST_READ);
            device.cmd_pipeline_barrier(
                self.command_buffer,
                vk::PipelineStageFlags::COMPUTE_SHADER,
                vk::PipelineStageFlags::HOST,
                vk::DependencyFlags::empty(),
                std::slice::from_ref(&barrier),
                &[],
                &[],
            );
            device.end_command_buffer(self.command_buffer).map_err(VkCommandError::Record)?;
        }

        let fence = VkFence::new(device.clone())?;
        let submit_info = vk::SubmitInfo::default().command_buffers(std::slice::from_ref(&self.command_buffer));
        context.queue_submit(&submit_info, fence.fence).map_err(|err| {
            log::error!("Queue submission failed: {err}");
            VkCommandError::Submit(err)
        })?;

        let timeout = context.settings().fence_timeout;
        let result = fence.wait(timeout);
        if let Err(VkCommandError::FenceTimeout(_)) = &result {
            log::error!("Dispatch of {} kernels timed out after {timeout:?}", dispatches.len());
            if let Err(err) = context.wait_compute_idle() {
                log::warn!("Cannot drain the compute queue: {err}");
            }
        }
        drop(leases);
        result
    }
}

impl Drop for VkCommandBuffer {
    fn drop(&mut self) {
        let device = self.context.device();
        unsafe {
            device.free_command_buffers(self.command_pool, &[self.command_buffer]);
            device.destroy_command_pool(self.command_pool, None);
        }
    }
}

struct VkFence {
    device: Arc<ash::Device>,
    fence: vk::Fence,
}

impl VkFence {
    fn new(device: Arc<ash::Device>) -> Result<Self, VkCommandError> {
        let info = vk::FenceCreateInfo::default();
        let fence = unsafe { device.create_fence(&info, None) }.map_err(VkCommandError::FenceCreate)?;
        Ok(Self {
            device,
            fence,
        })
    }

    fn wait(
        &self,
        timeout: Option<Duration>,
    ) -> Result<(), VkCommandError> {
        let nanos = timeout.map_or(u64::MAX, |timeout| u64::try_from(timeout.as_nanos()).unwrap_or(u64::MAX));
        match unsafe { self.device.wait_for_fences(&[self.fence], true, nanos) } {
            Ok(()) => Ok(()),
            Err(vk::Result::TIMEOUT) => Err(VkCommandError::FenceTimeout(timeout)),
            Err(err) => Err(VkCommandError::FenceWait(err)),
        }
    }
}

impl Drop for VkFence {
    fn drop(&mut self) {
        unsafe { self.device.destroy_fence(self.fence, None) };
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VkCommandError {
    #[error("Command pool creation error: {0}")]
    PoolCreate(vk::Result),

    #[error("Command buffer allocation error: {0}")]
    Allocate(vk::Result),

    #[error("Command buffer recording error: {0}")]
    Record(vk::Result),

    #[error("Queue submission error: {0}")]
    Submit(vk::Result),

    #[error("Fence creation error: {0}")]
    FenceCreate(vk::Result),

    #[error("Fence wait error: {0}")]
    FenceWait(vk::Result),

    #[error("Fence wait timed out after {0:?}")]
    FenceTimeout(Option<Duration>),

    #[error(transparent)]
    Pipeline(#[from] VkPipelineError),

    #[error(transparent)]
    Descriptor(#[from] VkDescriptorError),
}
