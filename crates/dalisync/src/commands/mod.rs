//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod discover;
pub mod groups;
pub mod info;
pub mod light;
pub mod scan;
pub mod util;
pub mod watch;

use dalisync_core::Coordinator;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a one-shot gateway command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    coordinator: &Coordinator,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Info => info::handle(coordinator, global).await,
        Command::Devices(args) => devices::handle(coordinator, args, global),
        Command::Groups(args) => groups::handle(coordinator, args, global).await,
        Command::Light(args) => light::handle(coordinator, args, global).await,
        Command::Fade(args) => light::handle_fade(coordinator, args, global).await,
        Command::Scan(args) => scan::handle_start(coordinator, args, global).await,
        Command::ScanStatus => scan::handle_status(coordinator, global).await,
        // Handled in main before a one-shot coordinator is built
        Command::Discover(_) | Command::Watch(_) | Command::Config(_) | Command::Completions(_) => {
            unreachable!()
        }
    }
}
