//! Gateway identity.

use dalisync_core::{Coordinator, GatewayInfo};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

fn detail(info: &GatewayInfo, devices: usize, groups: usize) -> String {
    let mut lines = vec![
        format!("Name:    {}", info.name.as_deref().unwrap_or("-")),
        format!("Version: {}", info.version.as_deref().unwrap_or("-")),
        format!("Devices: {devices}"),
        format!("Groups:  {groups}"),
    ];
    for (key, value) in &info.extra {
        let value = value
            .as_str()
            .map_or_else(|| value.to_string(), ToOwned::to_owned);
        lines.push(format!("{key}: {value}"));
    }
    lines.join("\n")
}

pub async fn handle(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    let info = coordinator.gateway_info().await?;
    let snapshot = coordinator.snapshot();
    let out = output::render_single(
        &global.output,
        &info,
        |i| detail(i, snapshot.device_count(), snapshot.group_count()),
        |i| i.name.clone().unwrap_or_default(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
