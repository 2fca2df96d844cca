//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

/// Insert or replace `name`, keeping any per-profile overrides it had.
/// The first profile ever added becomes the default.
fn upsert_profile(
    cfg: &mut Config,
    name: &str,
    host: &str,
    display_name: Option<String>,
    set_default: bool,
) -> Result<(), CliError> {
    config::profile_to_controller_config(&Profile::new(host), name, &cfg.defaults)?;

    let profile = cfg
        .profiles
        .entry(name.to_owned())
        .or_insert_with(|| Profile::new(host));
    profile.host = host.to_owned();
    if display_name.is_some() {
        profile.name = display_name;
    }

    if set_default || cfg.default_profile.is_none() {
        cfg.default_profile = Some(name.to_owned());
    }
    Ok(())
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init {
            host,
            name,
            display_name,
            set_default,
        } => {
            let mut cfg = config::load_config()?;
            upsert_profile(&mut cfg, &name, &host, display_name, set_default)?;
            let path = config::save_config(&cfg)?;
            output::print_output(
                &format!("Profile '{name}' saved to {}", path.display()),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let out = match global.output {
                OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(&cfg)
                    .map_err(|e| CliError::Config {
                        message: e.to_string(),
                    })?,
                _ => output::render_single(&global.output, &cfg, |_| String::new(), |_| String::new()),
            };
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}
