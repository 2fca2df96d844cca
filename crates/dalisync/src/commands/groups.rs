//! Group command handlers: listing plus membership changes.

use std::sync::Arc;

use tabled::Tabled;

use dalisync_core::{Command as CoreCommand, Coordinator, CoreError, Group};

use crate::cli::{GlobalOpts, GroupsArgs, GroupsCommand};
use crate::error::CliError;
use crate::output::{self, on_off, or_dash};

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "ID")]
    id: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Members")]
    members: String,
    #[tabled(rename = "Line")]
    line: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Features")]
    features: String,
}

fn any_on(g: &Group) -> bool {
    g.members.iter().any(|m| m.features.switchable == Some(true))
}

fn row(g: &Arc<Group>, global: &GlobalOpts) -> GroupRow {
    let ids: Vec<u32> = g.members.iter().map(|m| m.device_id).collect();
    GroupRow {
        id: g.id,
        name: g.name.clone(),
        members: util::id_list(&ids),
        line: or_dash(g.line),
        state: on_off(any_on(g), global),
        features: util::feature_list(&g.features),
    }
}

fn detail(g: &Arc<Group>, global: &GlobalOpts) -> String {
    let mut lines = vec![
        format!("ID:       {}", g.id),
        format!("Name:     {}", g.name),
        format!("Line:     {}", or_dash(g.line)),
        format!("State:    {}", on_off(any_on(g), global)),
        format!("Features: {}", util::feature_list(&g.features)),
        "Members:".into(),
    ];
    for m in &g.members {
        let state = m
            .features
            .switchable
            .map_or_else(|| "-".into(), |on| on_off(on, global));
        lines.push(format!("  {:>3}  {}  ({state})", m.device_id, m.name));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    coordinator: &Coordinator,
    args: GroupsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        GroupsCommand::List => {
            let groups: Vec<Arc<Group>> = coordinator.snapshot().groups().cloned().collect();
            let out = output::render_list(
                &global.output,
                &groups,
                |g| row(g, global),
                |g| g.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        GroupsCommand::Get { id } => {
            let group = coordinator
                .group(id)
                .ok_or(CoreError::GroupNotFound { id })?;
            let out = output::render_single(
                &global.output,
                &group,
                |g| detail(g, global),
                |g| g.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        GroupsCommand::Add { device, group } => {
            let result = coordinator
                .execute(CoreCommand::AddToGroup {
                    device_id: device,
                    group_id: group,
                })
                .await?;
            let msg = util::membership_message(
                &result,
                &format!("Added device {device} to group {group}"),
            );
            output::print_output(&msg, global.quiet);
            Ok(())
        }

        GroupsCommand::Remove { device, group } => {
            let result = coordinator
                .execute(CoreCommand::RemoveFromGroup {
                    device_id: device,
                    group_id: group,
                })
                .await?;
            let msg = util::membership_message(
                &result,
                &format!("Removed device {device} from group {group}"),
            );
            output::print_output(&msg, global.quiet);
            Ok(())
        }

        GroupsCommand::Set { device, groups } => {
            let summary = util::id_list(&groups);
            coordinator
                .execute(CoreCommand::SetDeviceGroups {
                    device_id: device,
                    groups,
                })
                .await?;
            output::print_output(
                &format!("Device {device} groups set to {summary}"),
                global.quiet,
            );
            Ok(())
        }
    }
}
