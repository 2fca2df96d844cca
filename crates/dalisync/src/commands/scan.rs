//! Bus scan handlers.

use dalisync_core::{Command as CoreCommand, CommandResult, Coordinator, ScanProgress};

use crate::cli::{GlobalOpts, ScanArgs};
use crate::error::CliError;
use crate::output::{self, or_dash};

fn detail(p: &ScanProgress) -> String {
    [
        format!("Status:   {}", p.status.as_deref().unwrap_or("-")),
        format!(
            "Progress: {}",
            p.progress.map_or_else(|| "-".into(), |v| format!("{v:.0}%"))
        ),
        format!("Found:    {}", or_dash(p.found)),
    ]
    .join("\n")
}

fn render(result: CommandResult, global: &GlobalOpts) {
    let progress = match result {
        CommandResult::Scan(progress) => progress,
        _ => ScanProgress::default(),
    };
    let out = output::render_single(&global.output, &progress, detail, |p| {
        p.status.clone().unwrap_or_default()
    });
    output::print_output(&out, global.quiet);
}

pub async fn handle_start(
    coordinator: &Coordinator,
    args: ScanArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let result = coordinator
        .execute(CoreCommand::StartScan {
            new_installation: args.new_installation,
        })
        .await?;
    render(result, global);
    Ok(())
}

pub async fn handle_status(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    let result = coordinator.execute(CoreCommand::ScanStatus).await?;
    render(result, global);
    Ok(())
}
