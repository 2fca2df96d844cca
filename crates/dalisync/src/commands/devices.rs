//! Device command handlers.

use std::sync::Arc;

use tabled::Tabled;

use dalisync_core::{Coordinator, CoreError, Device};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, on_off, or_dash};

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Addr")]
    address: String,
    #[tabled(rename = "Line")]
    line: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Groups")]
    groups: String,
    #[tabled(rename = "Features")]
    features: String,
}

fn row(d: &Arc<Device>, global: &GlobalOpts) -> DeviceRow {
    DeviceRow {
        id: d.id,
        name: d.name.clone(),
        address: or_dash(d.address),
        line: or_dash(d.line),
        state: if d.features.switchable.is_some() {
            on_off(d.is_on(), global)
        } else {
            "-".into()
        },
        level: or_dash(util::brightness(&d.features)),
        groups: util::id_list(&d.groups),
        features: util::feature_list(&d.features),
    }
}

fn detail(d: &Arc<Device>, global: &GlobalOpts) -> String {
    let f = &d.features;
    let mut lines = vec![
        format!("ID:       {}", d.id),
        format!("Name:     {}", d.name),
        format!("Address:  {}", or_dash(d.address)),
        format!("Line:     {}", or_dash(d.line)),
        format!("Type:     {}", d.device_type.as_deref().unwrap_or("-")),
        format!("Groups:   {}", util::id_list(&d.groups)),
        format!("Features: {}", util::feature_list(f)),
    ];
    if f.switchable.is_some() {
        lines.push(format!("State:    {}", on_off(d.is_on(), global)));
    }
    if let Some(level) = util::brightness(f) {
        lines.push(format!("Level:    {level}/255"));
    }
    if let Some(rgb) = f.color_rgb {
        let [r, g, b] = dalisync_core::convert::rgb_to_external(rgb);
        lines.push(format!("RGB:      {r},{g},{b}"));
    }
    if let Some(kelvin) = f.color_kelvin {
        lines.push(format!("Kelvin:   {kelvin}K"));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(
    coordinator: &Coordinator,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List => {
            let snapshot = coordinator.snapshot();
            let out = output::render_list(
                &global.output,
                snapshot.devices(),
                |d| row(d, global),
                |d| d.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Get { id } => {
            let device = coordinator
                .device(id)
                .ok_or(CoreError::DeviceNotFound { id })?;
            let out = output::render_single(
                &global.output,
                &device,
                |d| detail(d, global),
                |d| d.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
