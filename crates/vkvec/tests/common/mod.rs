#![allow(dead_code)]
pub mod log_capture;

use std::sync::{Arc, OnceLock};

use vkvec::{Array, Kernel, Shape, VkContext, VkContextCreateInfo};

static CONTEXT: OnceLock<Option<Arc<VkContext>>> = OnceLock::new();

/// Shared test context, or `None` when no Vulkan device or no compiled
/// kernels are available.
pub fn create_test_context() -> Option<Arc<VkContext>> {
    CONTEXT
        .get_or_init(|| {
            log_capture::install();
            let create_info = VkContextCreateInfo {
                // debug builds with validation layers can be slow
                fence_timeout: None,
                ..VkContextCreateInfo::from_env()
            };
            let context = match VkContext::new(create_info) {
                Ok(context) => Arc::new(context),
                Err(err) => {
                    eprintln!("Skipping: no usable Vulkan device ({err})");
                    return None;
                },
            };
            let missing = Kernel::all()
                .into_iter()
                .filter(|kernel| !context.shaders().is_available(*kernel))
                .collect::<Vec<_>>();
            if !missing.is_empty() {
                eprintln!("Skipping: {} kernels have no SPIR-V artifact", missing.len());
                return None;
            }
            Some(context)
        })
        .clone()
}

/// Separate context with a descriptor pool of `capacity` sets.
pub fn create_small_pool_context(capacity: u32) -> Option<Arc<VkContext>> {
    create_test_context()?;
    let create_info = VkContextCreateInfo {
        fence_timeout: None,
        descriptor_pool_capacity: capacity,
        ..VkContextCreateInfo::from_env()
    };
    VkContext::new(create_info).ok().map(Arc::new)
}

pub fn vector(
    context: &Arc<VkContext>,
    values: &[f32],
) -> Array {
    Array::from_slice(context, Shape::vector(values.len() as u32), values).unwrap()
}

pub fn matrix(
    context: &Arc<VkContext>,
    rows: u32,
    cols: u32,
    values: &[f32],
) -> Array {
    Array::from_slice(context, Shape::matrix(rows, cols), values).unwrap()
}

pub fn assert_all_close(
    actual: &[f32],
    expected: &[f32],
    tolerance: f32,
) {
    assert_eq!(actual.len(), expected.len(), "length mismatch: {actual:?} vs {expected:?}");
    for (index, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            is_close::is_close!(*a, *e, abs_tol = tolerance),
            "element {index}: {a} != {e} (actual {actual:?})"
        );
    }
}
