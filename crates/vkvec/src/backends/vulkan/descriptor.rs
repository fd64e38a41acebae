use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use ash::vk;

use crate::backends::vulkan::buffer::VkBuffer;
use crate::backends::vulkan::pipeline::MAX_BINDINGS;

/// Bounded pool the dispatch path leases descriptor sets from.
///
/// Owned by `VkContext`, which destroys it before the device.
pub struct VkDescriptorPool {
    device: Arc<ash::Device>,
    pool: Mutex<vk::DescriptorPool>,
    capacity: u32,
    leased: AtomicUsize,
}

impl VkDescriptorPool {
    pub fn new(
        device: Arc<ash::Device>,
        capacity: u32,
    ) -> Result<Self, vk::Result> {
        let capacity = capacity.max(1);
        let pool_sizes = [vk::DescriptorPoolSize::default()
            .ty(vk::DescriptorType::STORAGE_BUFFER)
            .descriptor_count(capacity * MAX_BINDINGS as u32)];
        let info = vk::DescriptorPoolCreateInfo::default()
            .flags(vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET)
            .max_sets(capacity)
            .pool_sizes(&pool_sizes);
        let pool = unsafe { device.create_descriptor_pool(&info, None)? };

        Ok(Self {
            device,
            pool: Mutex::new(pool),
            capacity,
            leased: AtomicUsize::new(0),
        })
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Sets currently leased and not yet returned.
    pub fn leased(&self) -> usize {
        self.leased.load(Ordering::Relaxed)
    }

    /// Binds `buffers[i]` to binding slot `i` of a fresh set.
    pub fn allocate(
        &self,
        layout: vk::DescriptorSetLayout,
        buffers: &[&VkBuffer],
    ) -> Result<VkDescriptorSetLease<'_>, VkDescriptorError> {
        if buffers.is_empty() || buffers.len() > MAX_BINDINGS {
            return Err(VkDescriptorError::BindingCount(buffers.len()));
        }

        let descriptor_set = {
            let pool = self.pool.lock().unwrap_or_else(PoisonError::into_inner);
            let info = vk::DescriptorSetAllocateInfo::default()
                .descriptor_pool(*pool)
                .set_layouts(std::slice::from_ref(&layout));
            match unsafe { self.device.allocate_descriptor_sets(&info) } {
                Ok(sets) => sets[0],
                Err(vk::Result::ERROR_OUT_OF_POOL_MEMORY | vk::Result::ERROR_FRAGMENTED_POOL) => {
                    log::error!("Descriptor pool exhausted ({} sets leased)", self.leased());
                    return Err(VkDescriptorError::PoolExhausted(self.capacity));
                },
                Err(err) => return Err(VkDescriptorError::Allocate(err)),
            }
        };
        self.leased.fetch_add(1, Ordering::Relaxed);

        // writes
        let buffer_infos = buffers
            .iter()
            .map(|buffer| {
                vk::DescriptorBufferInfo::default()
                    .buffer(buffer.buffer())
                    .offset(0)
                    .range(vk::WHOLE_SIZE)
            })
            .collect::<Vec<_>>();
        let writes = buffer_infos
            .iter()
            .enumerate()
            .map(|(binding, buffer_info)| {
                vk::WriteDescriptorSet::default()
                    .dst_set(descriptor_set)
                    .dst_binding(binding as u32)
                    .descriptor_type(vk::DescriptorType::STORAGE_BUFFER)
                    .buffer_info(std::slice::from_ref(buffer_info))
            })
            .collect::<Vec<_>>();
        unsafe {
            self.device.update_descriptor_sets(&writes, &[]);
        }

        Ok(VkDescriptorSetLease {
            pool: self,
            descriptor_set,
        })
    }

    fn free(
        &self,
        descriptor_set: vk::DescriptorSet,
    ) {
        let pool = self.pool.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = unsafe { self.device.free_descriptor_sets(*pool, &[descriptor_set]) } {
            log::warn!("Cannot free descriptor set: {err}");
        }
        self.leased.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) unsafe fn destroy(&self) {
        let mut pool = self.pool.lock().unwrap_or_else(PoisonError::into_inner);
        if *pool != vk::DescriptorPool::null() {
            unsafe { self.device.destroy_descriptor_pool(*pool, None) };
            *pool = vk::DescriptorPool::null();
        }
    }
}

/// A descriptor set returned to its pool on drop.
pub struct VkDescriptorSetLease<'a> {
    pool: &'a VkDescriptorPool,
    descriptor_set: vk::DescriptorSet,
}

impl VkDescriptorSetLease<'_> {
    pub fn descriptor_set(&self) -> vk::DescriptorSet {
        self.descriptor_set
    }
}

impl Drop for VkDescriptorSetLease<'_> {
    fn drop(&mut self) {
        self.pool.free(self.descriptor_set);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VkDescriptorError {
    #[error("Descriptor pool exhausted (capacity {0} sets)")]
    PoolExhausted(u32),

    #[error("Descriptor set allocation error: {0}")]
    Allocate(vk::Result),

    #[error("Unsupported number of bound buffers: {0}")]
    BindingCount(usize),
}
