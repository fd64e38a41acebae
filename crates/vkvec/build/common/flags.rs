use std::sync::OnceLock;

/// Environment switches of the shader build, read once per build script run.
pub struct BuildFlags {
    /// `VKVEC_BUILD_DEBUG` or the `build-debug` feature: echo progress as cargo warnings.
    pub verbose: bool,
    /// `VKVEC_SKIP_SHADERS`: leave the embedded kernel table empty.
    pub skip_shaders: bool,
}

static FLAGS: OnceLock<BuildFlags> = OnceLock::new();

fn is_set(name: &str) -> bool {
    println!("cargo::rerun-if-env-changed={name}");
    std::env::var_os(name).is_some()
}

pub fn flags() -> &'static BuildFlags {
    FLAGS.get_or_init(|| BuildFlags {
        verbose: is_set("VKVEC_BUILD_DEBUG") || cfg!(feature = "build-debug"),
        skip_shaders: is_set("VKVEC_SKIP_SHADERS"),
    })
}

#[macro_export]
macro_rules! build_log {
    ($($arg:tt)*) => {{
        if $crate::common::flags::flags().verbose {
            println!("cargo::warning=(vkvec build) {}", format_args!($($arg)*));
        }
    }};
}
