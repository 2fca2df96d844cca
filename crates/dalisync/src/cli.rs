//! Clap derive structures for the `dalisync` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use dalisync_core::{EntityId, MAX_FADE_SECONDS};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// dalisync -- control DALI-2 IoT lighting gateways
#[derive(Debug, Parser)]
#[command(
    name = "dalisync",
    version,
    about = "Control DALI lighting through DALI-2 IoT gateways",
    long_about = "Query and control the devices and groups behind a DALI-2 IoT gateway.\n\n\
        Targets are device ids (12, d12, device:12) or group ids (g3, group:3).",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Gateway profile to use
    #[arg(long, short = 'p', env = "DALISYNC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Gateway host or URL (overrides profile)
    #[arg(long, short = 'H', env = "DALISYNC_HOST", global = true)]
    pub host: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "DALISYNC_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "DALISYNC_TIMEOUT", global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Find gateways on the local network
    Discover(DiscoverArgs),

    /// Show gateway identity and firmware
    Info,

    /// List and inspect devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// List groups and manage group membership
    #[command(alias = "g")]
    Groups(GroupsArgs),

    /// Switch, dim and colour a device or group
    #[command(alias = "l")]
    Light(LightArgs),

    /// Set the fade time of a device or group
    Fade(FadeArgs),

    /// Start a bus scan
    Scan(ScanArgs),

    /// Show progress of the running bus scan
    ScanStatus,

    /// Follow the gateway and print every refresh
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Discover ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DiscoverArgs {
    /// Seconds to wait for replies
    #[arg(long, short = 'w', default_value = "5", value_parser = clap::value_parser!(u64).range(1..=60))]
    pub window: u64,
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List all devices
    #[command(alias = "ls")]
    List,

    /// Show one device
    Get {
        /// Device id
        id: u32,
    },
}

// ── Groups ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GroupsArgs {
    #[command(subcommand)]
    pub command: GroupsCommand,
}

#[derive(Debug, Subcommand)]
pub enum GroupsCommand {
    /// List all groups with at least one member
    #[command(alias = "ls")]
    List,

    /// Show one group and its members
    Get {
        /// Group id
        id: u32,
    },

    /// Add a device to a group
    Add {
        /// Device id
        device: u32,
        /// Group id
        group: u32,
    },

    /// Remove a device from a group
    #[command(alias = "rm")]
    Remove {
        /// Device id
        device: u32,
        /// Group id
        group: u32,
    },

    /// Replace every group membership of a device
    Set {
        /// Device id
        device: u32,
        /// Group ids (none clears all memberships)
        groups: Vec<u32>,
    },
}

// ── Light ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LightArgs {
    #[command(subcommand)]
    pub command: LightCommand,
}

#[derive(Debug, Subcommand)]
pub enum LightCommand {
    /// Turn on, optionally setting level or colour
    On {
        /// Device or group (12, g3, group:3)
        target: EntityId,

        /// Brightness 0-255
        #[arg(long, short = 'b')]
        brightness: Option<u8>,

        /// Colour as R,G,B (0-255 each)
        #[arg(long, value_parser = parse_rgb)]
        rgb: Option<[u8; 3]>,

        /// Colour temperature in kelvin
        #[arg(long, short = 'k')]
        kelvin: Option<u16>,

        /// Fade time in seconds
        #[arg(long, short = 'f', value_parser = parse_fade)]
        fade: Option<f64>,
    },

    /// Turn off
    Off {
        /// Device or group (12, g3, group:3)
        target: EntityId,

        /// Fade time in seconds
        #[arg(long, short = 'f', value_parser = parse_fade)]
        fade: Option<f64>,
    },

    /// Show displayed state
    Status {
        /// Device or group (12, g3, group:3)
        target: EntityId,
    },
}

// ── Fade ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FadeArgs {
    /// Device or group (12, g3, group:3)
    pub target: EntityId,

    /// Fade time in seconds
    #[arg(value_parser = parse_fade)]
    pub seconds: f64,
}

// ── Scan / Watch ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Treat the bus as a new installation and re-address every device
    #[arg(long)]
    pub new_installation: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Refresh interval in seconds (overrides profile)
    #[arg(long, short = 'i', value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or update a profile
    Init {
        /// Gateway host or URL
        #[arg(long)]
        host: String,

        /// Profile name
        #[arg(long, default_value = "default")]
        name: String,

        /// Display name for the gateway
        #[arg(long)]
        display_name: Option<String>,

        /// Make this the default profile
        #[arg(long)]
        set_default: bool,
    },

    /// Print the effective configuration
    Show,

    /// Print the configuration file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}

// ── Value parsers ────────────────────────────────────────────────────

fn parse_fade(s: &str) -> Result<f64, String> {
    let seconds: f64 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if seconds.is_finite() && (0.0..=MAX_FADE_SECONDS).contains(&seconds) {
        Ok(seconds)
    } else {
        Err(format!("must be between 0 and {MAX_FADE_SECONDS} seconds"))
    }
}

fn parse_rgb(s: &str) -> Result<[u8; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [r, g, b] = parts.as_slice() else {
        return Err("expected R,G,B".into());
    };
    let channel = |c: &str| {
        c.parse::<u8>()
            .map_err(|_| format!("'{c}' is not a value between 0 and 255"))
    };
    Ok([channel(r)?, channel(g)?, channel(b)?])
}
