use std::collections::HashMap;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use ash::vk;

use crate::kernel::Kernel;

mod artifacts {
    include!(concat!(env!("OUT_DIR"), "/kernel_artifacts.rs"));
}

enum ArtifactSource {
    File(PathBuf),
    Embedded(&'static [u8]),
}

/// Kernel modules, loaded on first use and kept until `clear`.
pub struct VkShaderRegistry {
    device: Arc<ash::Device>,
    shader_dir: Option<PathBuf>,
    modules: Mutex<HashMap<Kernel, vk::ShaderModule>>,
}

impl VkShaderRegistry {
    pub fn new(
        device: Arc<ash::Device>,
        shader_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            device,
            shader_dir,
            modules: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(
        &self,
        kernel: Kernel,
    ) -> Result<vk::ShaderModule, VkShaderError> {
        let mut modules = self.modules.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(&module) = modules.get(&kernel) {
            return Ok(module);
        }

        let code = self.load_spirv(kernel)?;
        let info = vk::ShaderModuleCreateInfo::default().code(&code);
        let module = unsafe { self.device.create_shader_module(&info, None) }.map_err(|err| {
            log::error!("Cannot create shader module {kernel}: {err}");
            VkShaderError::ModuleCreate(err)
        })?;
        log::debug!("Loaded kernel {kernel}");
        modules.insert(kernel, module);
        Ok(module)
    }

    pub fn is_available(
        &self,
        kernel: Kernel,
    ) -> bool {
        self.locate(&kernel.name()).is_some()
    }

    pub fn loaded(&self) -> usize {
        self.modules.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Destroys every cached module; pipelines already built stay valid.
    pub fn clear(&self) {
        let mut modules = self.modules.lock().unwrap_or_else(PoisonError::into_inner);
        for (_, module) in modules.drain() {
            unsafe { self.device.destroy_shader_module(module, None) };
        }
    }

    fn locate(
        &self,
        name: &str,
    ) -> Option<ArtifactSource> {
        if let Some(dir) = &self.shader_dir {
            let path = dir.join(format!("{name}.spv"));
            if path.is_file() {
                return Some(ArtifactSource::File(path));
            }
        }
        embedded_artifact(name).map(ArtifactSource::Embedded)
    }

    fn load_spirv(
        &self,
        kernel: Kernel,
    ) -> Result<Vec<u32>, VkShaderError> {
        let name = kernel.name();
        let bytes = match self.locate(&name) {
            Some(ArtifactSource::File(path)) => std::fs::read(&path).map_err(|err| VkShaderError::Io {
                path,
                source: err,
            })?,
            Some(ArtifactSource::Embedded(bytes)) => bytes.to_vec(),
            None => {
                log::error!("No SPIR-V artifact for kernel {name}");
                return Err(VkShaderError::ArtifactNotFound(name));
            },
        };
        ash::util::read_spv(&mut Cursor::new(bytes)).map_err(|err| VkShaderError::InvalidSpirv {
            name,
            reason: err.to_string(),
        })
    }
}

fn embedded_artifact(name: &str) -> Option<&'static [u8]> {
    artifacts::EMBEDDED_KERNELS
        .iter()
        .find(|(kernel_name, _)| *kernel_name == name)
        .map(|(_, bytes)| *bytes)
}

/// Number of kernels compiled into the library.
pub fn embedded_kernel_count() -> usize {
    artifacts::EMBEDDED_KERNELS.len()
}

#[derive(Debug, thiserror::Error)]
pub enum VkShaderError {
    #[error("Kernel artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("Invalid SPIR-V for kernel {name}: {reason}")]
    InvalidSpirv { name: String, reason: String },

    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Shader module creation error: {0}")]
    ModuleCreate(vk::Result),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_names_are_known_kernels() {
        let known = Kernel::all().iter().map(Kernel::name).collect::<Vec<_>>();
        for (name, bytes) in artifacts::EMBEDDED_KERNELS {
            assert!(known.iter().any(|k| k.as_str() == *name), "unexpected artifact {name}");
            assert_eq!(bytes.len() % 4, 0);
            assert!(ash::util::read_spv(&mut Cursor::new(*bytes)).is_ok());
        }
    }
}
