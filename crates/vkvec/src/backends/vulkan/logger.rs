use std::ffi::CStr;
use std::os::raw::c_void;
use std::sync::Arc;

use ash::vk;

const TARGET: &str = "vkvec::vulkan";

/// Receives validation-layer messages.
///
/// `p_user_data` of the messenger points at a heap-pinned
/// `Arc<dyn VkLogger>` owned by the context.
pub unsafe extern "system" fn debug_message_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    p_user_data: *mut c_void,
) -> vk::Bool32 {
    if p_user_data.is_null() || p_callback_data.is_null() {
        return vk::FALSE;
    }

    let types = match message_type {
        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL => "[General]",
        vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE => "[Performance]",
        vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION => "[Validation]",
        _ => "",
    };
    let p_message = unsafe { (*p_callback_data).p_message };
    if p_message.is_null() {
        return vk::FALSE;
    }
    let message = unsafe { CStr::from_ptr(p_message) }.to_string_lossy();
    let log_message = format!("{types} {message}");

    let logger = unsafe { &*(p_user_data as *const Arc<dyn VkLogger>) };
    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE => logger.v(&log_message),
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => logger.i(&log_message),
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => logger.w(&log_message),
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => logger.e(&log_message),
        _ => logger.d(&log_message),
    }

    vk::FALSE
}

pub trait VkLogger: Send + Sync {
    fn v(&self, msg: &str);
    fn i(&self, msg: &str);
    fn d(&self, msg: &str);
    fn w(&self, msg: &str);
    fn e(&self, msg: &str);
}

/// Forwards validation messages to the `log` facade.
#[derive(Debug, Default)]
pub struct VkLogFacade;

impl VkLogger for VkLogFacade {
    fn v(&self, msg: &str) {
        log::trace!(target: TARGET, "{msg}")
    }

    fn i(&self, msg: &str) {
        log::info!(target: TARGET, "{msg}")
    }

    fn d(&self, msg: &str) {
        log::debug!(target: TARGET, "{msg}")
    }

    fn w(&self, msg: &str) {
        log::warn!(target: TARGET, "{msg}")
    }

    fn e(&self, msg: &str) {
        log::error!(target: TARGET, "{msg}")
    }
}
