use comfy_table::{
    CellAlignment, ContentArrangement, Table, modifiers::UTF8_ROUND_CORNERS,
    presets::UTF8_FULL,
};
use console::Style;
use vkvec::{Kernel, VkContext, VkContextCreateInfo, backends::vulkan::embedded_kernel_count};

pub fn handle_info() -> Result<(), Box<dyn std::error::Error>> {
    let context = VkContext::new(VkContextCreateInfo::from_env())?;
    let physical_device = context.physical_device();
    let properties = &physical_device.properties;
    let limits = &properties.limits;

    let title = Style::new().bold();
    println!("{}", title.apply_to(&physical_device.name));

    let api_version = properties.api_version;
    let kernels = Kernel::all();
    let available = kernels.iter().filter(|kernel| context.shaders().is_available(**kernel)).count();
    let settings = context.settings();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Property", "Value"])
        .add_row(vec![
            "API version".to_string(),
            format!(
                "{}.{}.{}",
                ash::vk::api_version_major(api_version),
                ash::vk::api_version_minor(api_version),
                ash::vk::api_version_patch(api_version)
            ),
        ])
        .add_row(vec!["Validation".to_string(), context.has_validation().to_string()])
        .add_row(vec!["Compute queue family".to_string(), context.queues().compute.family_index.to_string()])
        .add_row(vec![
            "Max workgroup invocations".to_string(),
            limits.max_compute_work_group_invocations.to_string(),
        ])
        .add_row(vec![
            "Max workgroup count (x)".to_string(),
            limits.max_compute_work_group_count[0].to_string(),
        ])
        .add_row(vec![
            "Max push constants, bytes".to_string(),
            limits.max_push_constants_size.to_string(),
        ])
        .add_row(vec!["Workgroup size".to_string(), settings.workgroup_size.to_string()])
        .add_row(vec!["Max batch dispatches".to_string(), settings.max_batch_dispatches.to_string()])
        .add_row(vec![
            "Fence timeout".to_string(),
            settings.fence_timeout.map_or("none".to_string(), |timeout| format!("{timeout:?}")),
        ])
        .add_row(vec!["Kernels available".to_string(), format!("{available} / {}", kernels.len())])
        .add_row(vec!["Kernels embedded".to_string(), embedded_kernel_count().to_string()]);
    if let Some(column) = table.column_mut(1) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    println!("{table}");

    let mut families = Table::new();
    families
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Family", "Queues", "Flags"]);
    for (index, family) in physical_device.queue_families.iter().enumerate() {
        families.add_row(vec![
            index.to_string(),
            family.queue_count.to_string(),
            format!("{:?}", family.queue_flags),
        ]);
    }
    println!("{families}");

    Ok(())
}
