use crate::array::Shape;
use crate::backends::vulkan::{
    VkBufferError, VkCommandError, VkContextError, VkDescriptorError,
    VkPipelineError, VkShaderError,
};

#[derive(Debug, thiserror::Error)]
pub enum VkVecError {
    #[error(transparent)]
    Context(#[from] VkContextError),

    #[error(transparent)]
    Buffer(#[from] VkBufferError),

    #[error(transparent)]
    Descriptor(#[from] VkDescriptorError),

    #[error(transparent)]
    Shader(#[from] VkShaderError),

    #[error(transparent)]
    Pipeline(#[from] VkPipelineError),

    #[error(transparent)]
    Command(#[from] VkCommandError),

    #[error("Index ({row}, {col}, {depth}) is out of range for shape {shape}")]
    IndexOutOfRange {
        row: usize,
        col: usize,
        depth: usize,
        shape: Shape,
    },

    #[error("{operation}: incompatible shapes {left} and {right}")]
    ShapeMismatch {
        operation: &'static str,
        left: Shape,
        right: Shape,
    },

    #[error("{operation}: expected {expected} values, got {actual}")]
    LengthMismatch {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{operation} requires a vector, got shape {shape}")]
    NotAVector {
        operation: &'static str,
        shape: Shape,
    },

    #[error("{operation}: {reason}")]
    InvalidArgument {
        operation: &'static str,
        reason: String,
    },
}

impl VkVecError {
    /// Logs the error at the detection point and hands it back for `Err(..)`.
    pub(crate) fn logged(self) -> Self {
        log::error!("{self}");
        self
    }
}
