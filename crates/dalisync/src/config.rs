//! CLI configuration -- thin wrapper around `dalisync_config` shared types.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--host, --timeout).

use dalisync_core::ControllerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use dalisync_config::{
    Config, ConfigError, Profile, config_path, load_config, profile_to_controller_config,
    save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Translate the selected profile + global flags into a
/// `ControllerConfig`. Flags win over profile values.
///
/// With `--host` and no usable profile, the host alone is enough. Without
/// `--host`, a profile must be named or configured as default.
pub fn resolve(global: &GlobalOpts, cfg: &Config) -> Result<ControllerConfig, CliError> {
    let selected = match cfg.profile(global.profile.as_deref()) {
        Ok((name, profile)) => Some((name.to_owned(), profile.clone())),
        Err(ConfigError::NoProfile) if global.host.is_some() => None,
        Err(ConfigError::UnknownProfile { name }) => {
            return Err(CliError::ProfileNotFound {
                name,
                available: available_profiles(cfg),
            });
        }
        Err(e) => return Err(e.into()),
    };

    let (name, mut profile) = match (selected, global.host.as_deref()) {
        (Some(selected), None) => selected,
        (Some((name, profile)), Some(host)) => (
            name,
            Profile {
                host: host.to_owned(),
                ..profile
            },
        ),
        (None, Some(host)) => (host.to_owned(), Profile::new(host)),
        (None, None) => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    Ok(profile_to_controller_config(&profile, &name, &cfg.defaults)?)
}

fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}
