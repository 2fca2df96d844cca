//! Follow a running coordinator and print each refresh until Ctrl-C.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use dalisync_core::{Coordinator, Notification, RefreshOutcome, Snapshot};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output::{self, on_off};

/// One printed line per refresh attempt.
#[derive(Debug, Serialize)]
struct WatchEvent {
    seq: u64,
    refreshed_at: Option<DateTime<Utc>>,
    devices: usize,
    groups: usize,
    outcome: RefreshOutcome,
    changes: Vec<Change>,
}

/// A device whose on/off state or level moved since the previous refresh.
#[derive(Debug, PartialEq, Serialize)]
struct Change {
    device_id: u32,
    name: String,
    is_on: bool,
    level: Option<u8>,
}

type Seen = HashMap<u32, (bool, Option<u8>)>;

fn observe(snapshot: &Snapshot) -> Seen {
    snapshot
        .devices()
        .iter()
        .map(|d| (d.id, (d.is_on(), super::util::brightness(&d.features))))
        .collect()
}

fn diff(previous: &Seen, snapshot: &Snapshot) -> Vec<Change> {
    snapshot
        .devices()
        .iter()
        .filter_map(|d| {
            let now = (d.is_on(), super::util::brightness(&d.features));
            (previous.get(&d.id) != Some(&now)).then(|| Change {
                device_id: d.id,
                name: d.name.clone(),
                is_on: now.0,
                level: now.1,
            })
        })
        .collect()
}

fn render(event: &WatchEvent, global: &GlobalOpts) -> String {
    match global.output {
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_json_compact(event),
        OutputFormat::Yaml => output::render_yaml(event),
        OutputFormat::Table | OutputFormat::Plain => {
            let time = event
                .refreshed_at
                .map_or_else(|| "-".into(), |t| t.format("%H:%M:%S").to_string());
            let status = match &event.outcome {
                RefreshOutcome::Initial => "waiting".to_owned(),
                RefreshOutcome::Refreshed => "ok".to_owned(),
                RefreshOutcome::Failed {
                    message,
                    consecutive_failures,
                } => format!("failed x{consecutive_failures}: {message}"),
            };
            let mut lines = vec![format!(
                "[{time}] #{} {status} ({} devices, {} groups)",
                event.seq, event.devices, event.groups
            )];
            for c in &event.changes {
                let level = c.level.map(|l| format!(" {l}/255")).unwrap_or_default();
                lines.push(format!(
                    "  {:>3} {}: {}{level}",
                    c.device_id,
                    c.name,
                    on_off(c.is_on, global)
                ));
            }
            lines.join("\n")
        }
    }
}

fn event(n: &Notification, seen: &mut Seen) -> WatchEvent {
    let changes = match n.outcome {
        RefreshOutcome::Failed { .. } => Vec::new(),
        _ => diff(seen, &n.snapshot),
    };
    *seen = observe(&n.snapshot);
    WatchEvent {
        seq: n.seq,
        refreshed_at: n.snapshot.refreshed_at(),
        devices: n.snapshot.device_count(),
        groups: n.snapshot.group_count(),
        outcome: n.outcome.clone(),
        changes,
    }
}

pub async fn handle(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    let mut stream = coordinator.subscribe();
    let mut seen = Seen::new();

    let first = event(stream.current(), &mut seen);
    output::print_output(&render(&first, global), global.quiet);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            n = stream.changed() => {
                let Some(n) = n else { break };
                let ev = event(&n, &mut seen);
                output::print_output(&render(&ev, global), global.quiet);
            }
        }
    }
    Ok(())
}
