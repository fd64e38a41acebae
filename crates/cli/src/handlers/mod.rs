mod bench;
mod demo;
mod info;

pub use bench::{BenchOp, handle_bench};
pub use demo::handle_demo;
pub use info::handle_info;
