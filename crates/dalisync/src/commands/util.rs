//! Shared helpers for command handlers.

use dalisync_core::convert::brightness_to_external;
use dalisync_core::{CommandResult, Feature, Features};

/// Comma-separated feature names, e.g. `switchable,dimmable`.
pub fn feature_list(features: &Features) -> String {
    let names: Vec<String> = features
        .capabilities()
        .iter()
        .map(|f: Feature| f.to_string())
        .collect();
    if names.is_empty() {
        "-".into()
    } else {
        names.join(",")
    }
}

/// Comma-separated group ids, `-` when empty.
pub fn id_list(ids: &[u32]) -> String {
    if ids.is_empty() {
        "-".into()
    } else {
        ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
    }
}

/// External brightness (0-255) if the entity is dimmable.
pub fn brightness(features: &Features) -> Option<u8> {
    features.dimmable.map(brightness_to_external)
}

/// User-facing line for a membership command result.
pub fn membership_message(result: &CommandResult, changed: &str) -> String {
    match result {
        CommandResult::Unchanged => "No change".into(),
        _ => changed.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_list_uses_wire_names() {
        let features = Features {
            switchable: Some(true),
            color_rgb: Some(dalisync_core::Rgb::default()),
            ..Features::default()
        };
        assert_eq!(feature_list(&features), "switchable,colorRGB");
        assert_eq!(feature_list(&Features::default()), "-");
    }

    #[test]
    fn id_list_formats() {
        assert_eq!(id_list(&[1, 4]), "1,4");
        assert_eq!(id_list(&[]), "-");
    }
}
