use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

/// Variants requested by `// SPECIALIZE(NAME, value, value, ...)` lines.
///
/// Every combination of values becomes its own kernel: the value is
/// appended to the file stem and `NAME_VALUE` (upper case) is defined
/// while compiling it.
#[derive(Debug, Default)]
pub struct ShaderSpecializations {
    pub variants: BTreeMap<String, Vec<String>>,
}

impl ShaderSpecializations {
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn get_all_definitions(&self) -> Vec<Vec<(&str, &str)>> {
        let mut combos: Vec<Vec<(&str, &str)>> = vec![vec![]];

        for (name, values) in &self.variants {
            let mut next = Vec::with_capacity(combos.len() * values.len());
            for combo in &combos {
                for value in values {
                    let mut c = combo.clone();
                    c.push((name.as_str(), value.as_str()));
                    next.push(c);
                }
            }
            combos = next;
        }

        combos
    }
}

static SPECIALIZE_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_specialize_regex<'a>() -> &'a Regex {
    SPECIALIZE_REGEX.get_or_init(|| {
        Regex::new(r"^//SPECIALIZE\(([A-Za-z_]\w*),([A-Za-z_]\w*(?:,[A-Za-z_]\w*)*)\)$").unwrap()
    })
}

pub fn get_shader_specializations(source: &str) -> ShaderSpecializations {
    let regex = get_specialize_regex();

    let mut variants: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for line in source.lines() {
        let mut non_whitespace_line = String::from(line);
        non_whitespace_line.retain(|c| !c.is_whitespace());
        let Some(caps) = regex.captures(non_whitespace_line.as_str()) else {
            continue;
        };
        let (Some(name), Some(values)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let values = values
            .as_str()
            .split(',')
            .map(|s| s.to_string())
            .collect::<Vec<String>>();
        variants.entry(name.as_str().to_string()).or_insert(values);
    }

    ShaderSpecializations { variants }
}

pub fn kernel_name(stem: &str, combo: &[(&str, &str)]) -> String {
    let mut name = stem.to_string();
    for (_, value) in combo {
        name.push('_');
        name.push_str(value);
    }
    name
}

pub fn define_name(name: &str, value: &str) -> String {
    format!("{}_{}", name.to_ascii_uppercase(), value.to_ascii_uppercase())
}
