use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, bail};

use crate::vulkan::specialize;

#[cfg(feature = "compile-shaders")]
const ENTRY_POINT_NAME: &str = "main";
const TARGET_ENV: &str = "vulkan1.2";

pub struct CompilationRequest {
    pub kernel_name: String,
    pub source_path: PathBuf,
    pub defines: Vec<String>,
    pub out_file_path: PathBuf,
}

pub struct CompiledKernel {
    pub name: String,
    pub spirv_path: PathBuf,
}

pub enum SpirvCompiler {
    #[cfg(feature = "compile-shaders")]
    Shaderc,
    Glslc(PathBuf),
}

impl SpirvCompiler {
    pub fn detect() -> Option<Self> {
        #[cfg(feature = "compile-shaders")]
        {
            return Some(SpirvCompiler::Shaderc);
        }

        #[allow(unreachable_code)]
        {
            println!("cargo::rerun-if-env-changed=GLSLC");
            let glslc = std::env::var("GLSLC")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("glslc"));
            let available = Command::new(&glslc)
                .arg("--version")
                .output()
                .map(|output| output.status.success())
                .unwrap_or(false);
            if available { Some(SpirvCompiler::Glslc(glslc)) } else { None }
        }
    }

    pub fn name(&self) -> String {
        match self {
            #[cfg(feature = "compile-shaders")]
            SpirvCompiler::Shaderc => "shaderc".to_string(),
            SpirvCompiler::Glslc(path) => path.display().to_string(),
        }
    }

    pub fn compile(&self, request: &CompilationRequest) -> anyhow::Result<CompiledKernel> {
        match self {
            #[cfg(feature = "compile-shaders")]
            SpirvCompiler::Shaderc => compile_with_shaderc(request)?,
            SpirvCompiler::Glslc(glslc) => compile_with_glslc(glslc, request)?,
        }

        Ok(CompiledKernel {
            name: request.kernel_name.clone(),
            spirv_path: request.out_file_path.clone(),
        })
    }
}

pub fn get_compilation_requests(
    file_path: &Path,
    out_dir: &Path,
) -> anyhow::Result<Vec<CompilationRequest>> {
    let source = std::fs::read_to_string(file_path)
        .with_context(|| format!("cannot read {}", file_path.display()))?;
    let stem = file_path
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("bad shader file name {}", file_path.display()))?;

    let specializations = specialize::get_shader_specializations(&source);
    let combos = if specializations.is_empty() {
        vec![vec![]]
    } else {
        specializations.get_all_definitions()
    };

    let requests = combos
        .into_iter()
        .map(|combo| {
            let kernel_name = specialize::kernel_name(stem, &combo);
            let defines = combo
                .iter()
                .map(|(name, value)| specialize::define_name(name, value))
                .collect();
            CompilationRequest {
                out_file_path: out_dir.join(format!("{kernel_name}.spv")),
                kernel_name,
                source_path: file_path.to_path_buf(),
                defines,
            }
        })
        .collect();

    Ok(requests)
}

fn compile_with_glslc(
    glslc: &Path,
    request: &CompilationRequest,
) -> anyhow::Result<()> {
    let include_dir = request
        .source_path
        .parent()
        .context("shader without parent directory")?;

    let mut cmd = Command::new(glslc);
    cmd.arg("-fshader-stage=compute")
        .arg(format!("--target-env={TARGET_ENV}"))
        .arg("-O")
        .arg("-I")
        .arg(include_dir);
    for define in &request.defines {
        cmd.arg(format!("-D{define}=1"));
    }
    cmd.arg(&request.source_path).arg("-o").arg(&request.out_file_path);

    let output = cmd.output().context("failed to run glslc")?;
    if !output.status.success() {
        bail!(
            "glslc failed for {}: {}",
            request.kernel_name,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    Ok(())
}

#[cfg(feature = "compile-shaders")]
fn compile_with_shaderc(request: &CompilationRequest) -> anyhow::Result<()> {
    use shaderc::{CompileOptions, Compiler};

    let compiler = Compiler::new()?;
    let mut options = CompileOptions::new()?;
    options.set_target_env(shaderc::TargetEnv::Vulkan, shaderc::EnvVersion::Vulkan1_2 as u32);
    options.set_optimization_level(shaderc::OptimizationLevel::Performance);
    for define in &request.defines {
        options.add_macro_definition(define, Some("1"));
    }

    let file_dir = request
        .source_path
        .parent()
        .context("shader without parent directory")?
        .to_path_buf();
    options.set_include_callback(move |include_file_name, _include_type, _in_file_name, _depth| {
        let include_file_path_buf = file_dir.join(include_file_name);
        let include_file_path = match include_file_path_buf.file_name() {
            Some(path) => path.to_string_lossy().to_string(),
            None => return Err("Can not get file name from path".into()),
        };

        let include_file_content = match std::fs::read_to_string(&include_file_path_buf) {
            Ok(content) => content,
            Err(err) => return Err(format!("Failed to read include file: {}", err)),
        };

        Ok(shaderc::ResolvedInclude {
            resolved_name: include_file_path,
            content: include_file_content,
        })
    });

    let source = std::fs::read_to_string(&request.source_path)
        .with_context(|| format!("cannot read {}", request.source_path.display()))?;
    let artifact = compiler.compile_into_spirv(
        &source,
        shaderc::ShaderKind::Compute,
        &request.source_path.to_string_lossy(),
        ENTRY_POINT_NAME,
        Some(&options),
    )?;
    std::fs::write(&request.out_file_path, artifact.as_binary_u8())
        .with_context(|| format!("cannot write {}", request.out_file_path.display()))?;

    Ok(())
}
