use std::ffi::{CStr, CString, c_char};

pub fn c_char_slice_to_string(raw_string_array: &[c_char]) -> String {
    // Vulkan fixed-size name arrays are always NUL terminated.
    unsafe { CStr::from_ptr(raw_string_array.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}

/// Owned C strings plus the pointer table Vulkan create infos expect.
/// The pointers stay valid for as long as the value is alive.
pub struct CStringArray {
    _strings: Vec<CString>,
    pointers: Vec<*const c_char>,
}

impl CStringArray {
    pub fn new<'a>(items: impl IntoIterator<Item = &'a str>) -> Self {
        let strings = items
            .into_iter()
            .filter_map(|item| CString::new(item).ok())
            .collect::<Vec<_>>();
        let pointers = strings.iter().map(|s| s.as_ptr()).collect();
        Self {
            _strings: strings,
            pointers,
        }
    }

    pub fn push_static(
        &mut self,
        name: &'static CStr,
    ) {
        self.pointers.push(name.as_ptr());
    }

    pub fn as_ptrs(&self) -> &[*const c_char] {
        &self.pointers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointers_follow_strings() {
        let mut array = CStringArray::new(["VK_EXT_a", "VK_EXT_b"]);
        array.push_static(c"VK_KHR_c");
        let names = array
            .as_ptrs()
            .iter()
            .map(|&ptr| unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, ["VK_EXT_a", "VK_EXT_b", "VK_KHR_c"]);
    }

    #[test]
    fn fixed_array_to_string() {
        let mut raw = [0 as c_char; 16];
        for (dst, src) in raw.iter_mut().zip(b"llvmpipe") {
            *dst = *src as c_char;
        }
        assert_eq!(c_char_slice_to_string(&raw), "llvmpipe");
    }
}
