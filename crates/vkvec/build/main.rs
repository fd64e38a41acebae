use std::{env, path::PathBuf};

use anyhow::Context;

mod common;
mod vulkan;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    println!("cargo::rerun-if-changed=build");

    build_log!("build script started");

    let out_dir = PathBuf::from(env::var("OUT_DIR").context("missing OUT_DIR")?);
    let kernels = vulkan::main(&out_dir).await?;
    vulkan::codegen::write_kernel_table(&kernels, &out_dir.join("kernel_artifacts.rs"))?;

    build_log!("build script ended with {} kernels", kernels.len());

    Ok(())
}
