use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use futures::stream::{self, StreamExt};
use walkdir::WalkDir;

use crate::build_log;
use crate::common::flags::flags;

pub mod codegen;
mod compile;
mod specialize;

pub use compile::CompiledKernel;

pub fn shader_dir() -> anyhow::Result<PathBuf> {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").context("missing CARGO_MANIFEST_DIR")?);
    Ok(manifest_dir.join("shaders"))
}

fn find_comp_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = WalkDir::new(dir)
        .into_iter()
        .filter_map(|res| res.ok())
        .filter(|entry| {
            entry.path().is_file() && entry.path().extension().and_then(|s| s.to_str()) == Some("comp")
        })
        .map(|entry| entry.into_path())
        .collect::<Vec<_>>();
    files.sort();
    files
}

pub async fn main(out_dir: &Path) -> anyhow::Result<Vec<CompiledKernel>> {
    let src_dir = shader_dir()?;
    println!("cargo::rerun-if-changed={}", src_dir.display());

    let comp_shader_paths = find_comp_files(&src_dir);
    comp_shader_paths.iter().for_each(|file_path| {
        println!("cargo::rerun-if-changed={}", file_path.display());
    });

    if flags().skip_shaders {
        println!("cargo::warning=VKVEC_SKIP_SHADERS is set, no kernels are embedded");
        return Ok(Vec::new());
    }

    let Some(compiler) = compile::SpirvCompiler::detect() else {
        println!(
            "cargo::warning=No SPIR-V compiler found (enable `compile-shaders` or install glslc); \
             kernels must be provided through VKVEC_SHADER_DIR"
        );
        return Ok(Vec::new());
    };
    build_log!("compiling {} shader files with {}", comp_shader_paths.len(), compiler.name());

    let spirv_dir = out_dir.join("spirv");
    fs::create_dir_all(&spirv_dir).with_context(|| format!("cannot create {}", spirv_dir.display()))?;

    let mut requests = Vec::new();
    for file_path in &comp_shader_paths {
        requests.extend(compile::get_compilation_requests(file_path, &spirv_dir)?);
    }

    let compiler = &compiler;
    let tasks = requests.into_iter().map(|request| async move {
        compiler
            .compile(&request)
            .with_context(|| format!("failed to compile {}", request.kernel_name))
    });

    let max_concurrency = std::thread::available_parallelism()
        .map(|x| x.get())
        .unwrap_or(4);
    let results = stream::iter(tasks)
        .buffer_unordered(max_concurrency)
        .collect::<Vec<_>>()
        .await;

    let mut kernels = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for res in results {
        match res {
            Ok(kernel) => kernels.push(kernel),
            Err(err) => errors.push(format!("{err:#}")),
        }
    }
    if !errors.is_empty() {
        bail!("Shader compilation failed:\n{}", errors.join("\n"));
    }

    kernels.sort_by(|a, b| a.name.cmp(&b.name));
    build_log!("compiled {} kernels", kernels.len());

    Ok(kernels)
}
