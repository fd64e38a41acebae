pub mod array;
pub mod backends;
pub mod error;
pub mod kernel;
pub mod utils;

pub use array::{
    Array, Axis, CointegrationResult, CorrelationResult, Distribution,
    InverseOptions, Padding, PoolKind, PrintLayout, PrintOptions,
    RegressionResult, Shape, StationarityResult,
};
pub use backends::vulkan::{VkContext, VkContextCreateInfo};
pub use error::VkVecError;
pub use kernel::Kernel;
pub use utils::angle::AngleUnit;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
