mod buffer;
mod command;
mod context;
mod descriptor;
mod dispatch;
mod ffi;
mod logger;
mod physical_device;
mod pipeline;
mod shader;

pub use buffer::{VkBuffer, VkBufferError};
pub use command::{VkCommandBuffer, VkCommandError};
pub use context::{
    VkContext, VkContextCreateInfo, VkContextError, VkContextSettings,
    VkQueue, VkQueues,
};
pub use descriptor::{VkDescriptorError, VkDescriptorPool, VkDescriptorSetLease};
pub use dispatch::{MAX_PUSH_CONSTANT_WORDS, PushConstants, VkDispatch};
pub use logger::{VkLogFacade, VkLogger};
pub use physical_device::{
    VkPhysicalDevice, VkPhysicalDeviceFeatures, VkQueueFamilies,
};
pub use pipeline::{
    MAX_BINDINGS, PUSH_CONSTANT_BYTES, VkComputePipeline, VkPipelineCache,
    VkPipelineError,
};
pub use shader::{VkShaderError, VkShaderRegistry, embedded_kernel_count};
