use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::Context;

use crate::vulkan::CompiledKernel;

/// Writes the table of SPIR-V artifacts the library embeds with `include!`.
pub fn write_kernel_table(
    kernels: &[CompiledKernel],
    out_path: &Path,
) -> anyhow::Result<()> {
    let mut f = fs::File::create(out_path)
        .with_context(|| format!("cannot create {}", out_path.display()))?;
    writeln!(f, "// AUTO-GENERATED SPIR-V kernel table")?;
    writeln!(f, "pub const EMBEDDED_KERNELS: &[(&str, &[u8])] = &[")?;
    for kernel in kernels {
        writeln!(
            f,
            "    ({:?}, include_bytes!({:?}) as &[u8]),",
            kernel.name,
            kernel.spirv_path.display().to_string()
        )?;
    }
    writeln!(f, "];")?;
    Ok(())
}
