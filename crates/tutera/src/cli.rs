//! Clap derive structures for the `tutera` command tree.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TOP LEVEL
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// tutera: control lights, climate, locks and scenes on a home-automation processor
#[derive(Debug, Parser)]
#[command(name = "tutera", version, about, propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Profile from the config file
    #[arg(long, short = 'p', global = true, env = "TUTERA_PROFILE")]
    pub profile: Option<String>,

    /// Config file to use instead of the platform default
    #[arg(long, global = true, env = "TUTERA_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Processor address (host, host:port or URL)
    #[arg(long, short = 'P', global = true, env = "TUTERA_PROCESSOR")]
    pub processor: Option<String>,

    /// Auth token generated on the processor
    #[arg(long, global = true, env = "TUTERA_AUTH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// When to colour output
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Verify the processor's certificate against the system trust store
    #[arg(long, global = true)]
    pub verify_tls: bool,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    JsonCompact,
    Yaml,
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the processor connection and what it reports
    Status,

    /// Rooms and whole-room lighting
    #[command(alias = "room")]
    Rooms(RoomsArgs),

    /// Lights and dimmers
    #[command(alias = "light")]
    Lights(LightsArgs),

    /// Scenes
    #[command(alias = "scene")]
    Scenes(ScenesArgs),

    /// Quick actions
    #[command(name = "quick-actions", alias = "qa")]
    QuickActions(QuickActionsArgs),

    /// Door locks
    #[command(alias = "lock")]
    Locks(LocksArgs),

    /// Thermostats
    #[command(alias = "thermostats")]
    Climate(ClimateArgs),

    /// Media rooms
    Media(MediaArgs),

    /// Manage profiles and stored tokens
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ROOMS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct RoomsArgs {
    #[command(subcommand)]
    pub command: RoomsCommand,
}

#[derive(Debug, Subcommand)]
pub enum RoomsCommand {
    /// List rooms with lighting, climate and lock summaries
    #[command(alias = "ls")]
    List,

    /// Switch every light in a room on, each at its remembered level
    On {
        /// Room id or name
        room: String,
    },

    /// Switch every light in a room off
    Off {
        /// Room id or name
        room: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LIGHTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LightsArgs {
    #[command(subcommand)]
    pub command: LightsCommand,
}

#[derive(Debug, Subcommand)]
pub enum LightsCommand {
    /// List lights
    #[command(alias = "ls")]
    List {
        /// Only lights in this room (id or name)
        #[arg(long, short = 'r')]
        room: Option<String>,
    },

    /// Switch a light on
    On {
        /// Light id or name
        light: String,
    },

    /// Switch a light off
    Off {
        /// Light id or name
        light: String,
    },

    /// Toggle a light; dimmers come back at their remembered level
    Toggle {
        /// Light id or name
        light: String,
    },

    /// Set a dimmer's brightness
    Dim {
        /// Light id or name
        light: String,

        /// Brightness in percent
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        level: u8,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SCENES & QUICK ACTIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ScenesArgs {
    #[command(subcommand)]
    pub command: ScenesCommand,
}

#[derive(Debug, Subcommand)]
pub enum ScenesCommand {
    /// List scenes
    #[command(alias = "ls")]
    List,

    /// Recall a scene
    Recall {
        /// Scene id or name
        scene: String,
    },
}

#[derive(Debug, Args)]
pub struct QuickActionsArgs {
    #[command(subcommand)]
    pub command: QuickActionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum QuickActionsCommand {
    /// List quick actions
    #[command(alias = "ls")]
    List,

    /// Run a quick action
    Run {
        /// Quick action id or name
        action: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LOCKS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LocksArgs {
    #[command(subcommand)]
    pub command: LocksCommand,
}

#[derive(Debug, Subcommand)]
pub enum LocksCommand {
    /// List door locks
    #[command(alias = "ls")]
    List,

    /// Lock a door
    Lock {
        /// Lock id or name
        lock: String,
    },

    /// Unlock a door
    Unlock {
        /// Lock id or name
        lock: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CLIMATE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ClimateArgs {
    #[command(subcommand)]
    pub command: ClimateCommand,
}

#[derive(Debug, Subcommand)]
pub enum ClimateCommand {
    /// List thermostats
    #[command(alias = "ls")]
    List,

    /// Set the setpoint for the thermostat's current mode
    Setpoint {
        /// Thermostat id or name
        thermostat: String,

        /// Temperature in degrees, e.g. 21.5
        #[arg(allow_hyphen_values = true)]
        degrees: String,
    },

    /// Change the operating mode (off, heat, cool, auto)
    Mode {
        /// Thermostat id or name
        thermostat: String,

        /// Mode name
        mode: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  MEDIA
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct MediaArgs {
    #[command(subcommand)]
    pub command: MediaCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PowerState {
    On,
    Off,
}

#[derive(Debug, Subcommand)]
pub enum MediaCommand {
    /// List media rooms
    #[command(alias = "ls")]
    List,

    /// Power a media room on or off
    Power {
        /// Media room id or name
        room: String,

        #[arg(value_enum)]
        state: PowerState,
    },

    /// Set the volume in percent
    Volume {
        /// Media room id or name
        room: String,

        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        level: u8,
    },

    /// Select an input source
    Source {
        /// Media room id or name
        room: String,

        /// Source id or name
        source: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or update a profile
    Init {
        /// Profile name
        #[arg(long, default_value = "default")]
        name: String,

        /// Processor address
        #[arg(long)]
        processor: String,

        /// Store the token prompted for in the system keyring
        #[arg(long)]
        keyring: bool,
    },

    /// Display the configuration with secrets masked
    Show,

    /// Print the config file location
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Prompt for an auth token and store it in the system keyring
    SetToken {
        /// Profile name (defaults to the active profile)
        #[arg(long)]
        name: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
