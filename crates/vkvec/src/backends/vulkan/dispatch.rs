use crate::array::Shape;
use crate::backends::vulkan::buffer::VkBuffer;
use crate::backends::vulkan::pipeline::PUSH_CONSTANT_BYTES;
use crate::kernel::Kernel;

pub const MAX_PUSH_CONSTANT_WORDS: usize = PUSH_CONSTANT_BYTES as usize / 4;

/// Push constant block packed as consecutive 32-bit words, in the order the
/// kernel declares its fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PushConstants {
    words: [u32; MAX_PUSH_CONSTANT_WORDS],
    len: usize,
}

impl Default for PushConstants {
    fn default() -> Self {
        Self::new()
    }
}

impl PushConstants {
    pub fn new() -> Self {
        Self {
            words: [0; MAX_PUSH_CONSTANT_WORDS],
            len: 0,
        }
    }

    fn push(
        mut self,
        word: u32,
    ) -> Self {
        assert!(self.len < MAX_PUSH_CONSTANT_WORDS, "push constant block exceeds {PUSH_CONSTANT_BYTES} bytes");
        self.words[self.len] = word;
        self.len += 1;
        self
    }

    /// Rows, cols, depth.
    pub fn shape(
        self,
        shape: Shape,
    ) -> Self {
        self.u32(shape.rows).u32(shape.cols).u32(shape.depth)
    }

    pub fn u32(
        self,
        value: u32,
    ) -> Self {
        self.push(value)
    }

    pub fn i32(
        self,
        value: i32,
    ) -> Self {
        self.push(value as u32)
    }

    pub fn f32(
        self,
        value: f32,
    ) -> Self {
        self.push(value.to_bits())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn words(&self) -> &[u32] {
        &self.words[..self.len]
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.words())
    }
}

/// One kernel invocation: bound buffers in binding order, push constants and
/// the number of logical threads.
pub struct VkDispatch<'a> {
    pub kernel: Kernel,
    pub buffers: Vec<&'a VkBuffer>,
    pub push_constants: PushConstants,
    pub invocations: usize,
}

impl<'a> VkDispatch<'a> {
    pub fn new(kernel: Kernel) -> Self {
        Self {
            kernel,
            buffers: Vec::with_capacity(kernel.bindings()),
            push_constants: PushConstants::new(),
            invocations: 1,
        }
    }

    pub fn buffer(
        mut self,
        buffer: &'a VkBuffer,
    ) -> Self {
        self.buffers.push(buffer);
        self
    }

    pub fn buffers(
        mut self,
        buffers: &[&'a VkBuffer],
    ) -> Self {
        self.buffers.extend_from_slice(buffers);
        self
    }

    pub fn push_constants(
        mut self,
        push_constants: PushConstants,
    ) -> Self {
        self.push_constants = push_constants;
        self
    }

    pub fn invocations(
        mut self,
        invocations: usize,
    ) -> Self {
        self.invocations = invocations;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_fields_in_declaration_order() {
        let constants = PushConstants::new()
            .shape(Shape::new(2, 3, 4))
            .f32(1.5)
            .i32(-1)
            .u32(7);
        assert_eq!(constants.words(), &[2, 3, 4, 1.5_f32.to_bits(), u32::MAX, 7]);
        assert_eq!(constants.as_bytes().len(), 6 * 4);
    }

    #[test]
    fn empty_block_has_no_bytes() {
        let constants = PushConstants::default();
        assert!(constants.is_empty());
        assert!(constants.as_bytes().is_empty());
    }

    #[test]
    #[should_panic(expected = "push constant block exceeds")]
    fn overflow_panics() {
        let mut constants = PushConstants::new();
        for i in 0..=MAX_PUSH_CONSTANT_WORDS {
            constants = constants.u32(i as u32);
        }
    }
}
