use std::sync::{Arc, Mutex, PoisonError};

use ash::vk;
use bytemuck::Pod;
use vk_mem::Alloc;

use crate::backends::vulkan::context::VkContext;

const WORD: usize = size_of::<f32>();

/// Host-visible storage buffer of 32-bit words.
pub struct VkBuffer {
    context: Arc<VkContext>,
    allocation: Mutex<vk_mem::Allocation>,
    buffer: vk::Buffer,
    len: usize,
}

impl VkBuffer {
    /// Allocates `max(elements, 1)` words; zero-sized buffers are not valid
    /// descriptor targets.
    pub fn new_storage(
        context: Arc<VkContext>,
        elements: usize,
    ) -> Result<Self, VkBufferError> {
        let len = elements.max(1);
        let buffer_info = vk::BufferCreateInfo::default()
            .size((len * WORD) as vk::DeviceSize)
            .usage(
                vk::BufferUsageFlags::STORAGE_BUFFER
                    | vk::BufferUsageFlags::TRANSFER_SRC
                    | vk::BufferUsageFlags::TRANSFER_DST,
            )
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        let allocation_info = vk_mem::AllocationCreateInfo {
            usage: vk_mem::MemoryUsage::Auto,
            flags: vk_mem::AllocationCreateFlags::HOST_ACCESS_RANDOM,
            required_flags: vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            preferred_flags: vk::MemoryPropertyFlags::DEVICE_LOCAL,
            ..Default::default()
        };

        let (buffer, allocation) = unsafe {
            context
                .memory_allocator()
                .create_buffer(&buffer_info, &allocation_info)
        }
        .map_err(|err| {
            let err = match err {
                vk::Result::ERROR_FEATURE_NOT_PRESENT => VkBufferError::MemoryTypeIndexNotFound,
                err => VkBufferError::Allocation(err),
            };
            log::error!("Cannot allocate a storage buffer of {len} words: {err}");
            err
        })?;

        Ok(Self {
            context,
            allocation: Mutex::new(allocation),
            buffer,
            len,
        })
    }

    pub fn buffer(&self) -> vk::Buffer {
        self.buffer
    }

    /// Capacity in 32-bit words.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn size(&self) -> vk::DeviceSize {
        (self.len * WORD) as vk::DeviceSize
    }

    pub fn map_action_unmap<F, R>(
        &self,
        action: F,
    ) -> Result<R, VkBufferError>
    where
        F: FnOnce(*mut u8) -> R,
    {
        let allocator = self.context.memory_allocator();
        let mut allocation = self.allocation.lock().unwrap_or_else(PoisonError::into_inner);
        let ptr = unsafe { allocator.map_memory(&mut *allocation) }.map_err(VkBufferError::MemoryMap)?;

        let result = action(ptr);

        unsafe { allocator.unmap_memory(&mut *allocation) };
        Ok(result)
    }

    fn with_words<R>(
        &self,
        action: impl FnOnce(&mut [u32]) -> R,
    ) -> Result<R, VkBufferError> {
        let len = self.len;
        self.map_action_unmap(|ptr| {
            // allocations are at least 4-byte aligned
            let words = unsafe { std::slice::from_raw_parts_mut(ptr as *mut u32, len) };
            action(words)
        })
    }

    pub fn get(
        &self,
        index: usize,
    ) -> Result<f32, VkBufferError> {
        self.check_index(index)?;
        self.with_words(|words| f32::from_bits(words[index]))
    }

    pub fn set(
        &self,
        value: f32,
        index: usize,
    ) -> Result<(), VkBufferError> {
        self.check_index(index)?;
        self.with_words(|words| words[index] = value.to_bits())
    }

    pub fn read(&self) -> Result<Vec<f32>, VkBufferError> {
        self.read_as::<f32>()
    }

    /// Reinterprets the whole buffer as `T` values.
    pub fn read_as<T: Pod>(&self) -> Result<Vec<T>, VkBufferError> {
        self.with_words(|words| {
            let bytes: &[u8] = bytemuck::cast_slice::<u32, u8>(&*words);
            bytes
                .chunks_exact(size_of::<T>())
                .map(bytemuck::pod_read_unaligned::<T>)
                .collect()
        })
    }

    pub fn write(
        &self,
        data: &[f32],
    ) -> Result<(), VkBufferError> {
        self.write_as(data)
    }

    /// Copies `data` to the front of the buffer; the tail is left untouched.
    pub fn write_as<T: Pod>(
        &self,
        data: &[T],
    ) -> Result<(), VkBufferError> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        if bytes.len() > self.size() as usize {
            return Err(VkBufferError::IndexOutOfRange {
                index: bytes.len().div_ceil(WORD).saturating_sub(1),
                len: self.len,
            });
        }
        self.map_action_unmap(|ptr| {
            let dst = unsafe { std::slice::from_raw_parts_mut(ptr, bytes.len()) };
            dst.copy_from_slice(bytes);
        })
    }

    pub fn fill_zero(&self) -> Result<(), VkBufferError> {
        self.with_words(|words| words.fill(0))
    }

    pub fn fill_words(
        &self,
        word: u32,
    ) -> Result<(), VkBufferError> {
        self.with_words(|words| words.fill(word))
    }

    fn check_index(
        &self,
        index: usize,
    ) -> Result<(), VkBufferError> {
        if index >= self.len {
            return Err(VkBufferError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        Ok(())
    }
}

impl Drop for VkBuffer {
    fn drop(&mut self) {
        let allocation = self.allocation.get_mut().unwrap_or_else(PoisonError::into_inner);
        unsafe {
            self.context.memory_allocator().destroy_buffer(self.buffer, allocation)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VkBufferError {
    #[error("Buffer allocation error: {0:?}")]
    Allocation(vk::Result),

    #[error("Can not map memory: {0:?}")]
    MemoryMap(vk::Result),

    #[error("Memory type index not found")]
    MemoryTypeIndexNotFound,

    #[error("Index {index} out of range for a buffer of {len} words")]
    IndexOutOfRange { index: usize, len: usize },
}
