//! Gateway discovery over UDP broadcast.

use std::time::Duration;

use tabled::Tabled;

use dalisync_api::{DiscoveredController, Discovery};

use crate::cli::{DiscoverArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct ControllerRow {
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "Name")]
    name: String,
}

fn row(c: &DiscoveredController) -> ControllerRow {
    ControllerRow {
        host: c.host.clone(),
        name: c.name.clone(),
    }
}

fn render(found: &[DiscoveredController], format: &OutputFormat) -> String {
    output::render_list(format, found, row, |c| c.host.clone())
}

pub async fn handle(args: DiscoverArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let found = Discovery::default()
        .with_window(Duration::from_secs(args.window))
        .discover()
        .await?;

    if found.is_empty() && matches!(global.output, OutputFormat::Table) {
        if !global.quiet {
            eprintln!("No gateways answered within {}s", args.window);
        }
        return Ok(());
    }

    output::print_output(&render(&found, &global.output), global.quiet);
    Ok(())
}
