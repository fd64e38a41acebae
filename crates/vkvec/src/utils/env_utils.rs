use std::str::FromStr;

#[derive(Copy, Clone, Debug)]
pub enum VkVecEnvVar {
    Validation,
    ShaderDir,
    FenceTimeoutMs,
    WorkgroupSize,
}

impl VkVecEnvVar {
    pub fn key(&self) -> &'static str {
        match self {
            VkVecEnvVar::Validation => "VKVEC_VALIDATION",
            VkVecEnvVar::ShaderDir => "VKVEC_SHADER_DIR",
            VkVecEnvVar::FenceTimeoutMs => "VKVEC_FENCE_TIMEOUT_MS",
            VkVecEnvVar::WorkgroupSize => "VKVEC_WORKGROUP_SIZE",
        }
    }

    pub fn value(&self) -> String {
        std::env::var(self.key()).unwrap_or_default()
    }

    pub fn is_set(&self) -> bool {
        !self.value().trim().is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        parse_flag(&self.value())
    }

    /// `None` when the variable is unset or does not parse.
    pub fn parse<T: FromStr>(&self) -> Option<T> {
        let value = self.value();
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        match value.parse::<T>() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                log::warn!("Ignoring {}={value}: cannot parse", self.key());
                None
            },
        }
    }
}

fn parse_flag(value: &str) -> bool {
    let upper = value.trim().to_ascii_uppercase();
    matches!(upper.as_str(), "1" | "YES" | "TRUE" | "ON")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_values() {
        assert!(parse_flag("1"));
        assert!(parse_flag(" true "));
        assert!(parse_flag("Yes"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
        assert!(!parse_flag("enabled"));
    }

    #[test]
    fn keys_are_prefixed() {
        for var in [
            VkVecEnvVar::Validation,
            VkVecEnvVar::ShaderDir,
            VkVecEnvVar::FenceTimeoutMs,
            VkVecEnvVar::WorkgroupSize,
        ] {
            assert!(var.key().starts_with("VKVEC_"));
        }
    }
}
