//! Command-line interface definitions.
//!
//! The binary is a thin driver over the library: every subcommand maps to
//! one scanner, grouper or trash call.
//!
//! # Example
//!
//! ```bash
//! # Blurry photos, strictest first
//! photosift blur ~/Pictures/trip --threshold 80
//!
//! # Near-duplicates as JSON
//! photosift dupes ~/Pictures/trip --threshold 0.97 --output json
//!
//! # Move every dark photo to ~/Pictures/trip/Trash, then undo
//! photosift trash ~/Pictures/trip --flagged dark
//! photosift restore ~/Pictures/trip --all
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::SettingsOverrides;

/// Flag blurry, dark, low-resolution and near-duplicate photos.
#[derive(Debug, Parser)]
#[command(name = "photosift")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Settings file (default: platform config directory)
    #[arg(long, global = true, value_name = "FILE", env = "PHOTOSIFT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List blurry images (Laplacian variance below threshold)
    Blur(ThresholdArgs),
    /// List dark images (mean brightness below threshold)
    Dark(ThresholdArgs),
    /// List images smaller than the minimum resolution
    Lowres(LowresArgs),
    /// Group near-duplicate images
    Dupes(DupesArgs),
    /// Move files into the folder's trash directory
    Trash(TrashArgs),
    /// Move files from the trash directory back into the folder
    Restore(RestoreArgs),
    /// Show the effective settings
    Config(ConfigArgs),
}

/// Walk options shared by every scanning subcommand.
#[derive(Debug, Args, Clone, Default)]
pub struct WalkArgs {
    /// Gitignore-style patterns to skip (repeatable)
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Follow symbolic links
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories
    #[arg(long)]
    pub skip_hidden: bool,

    /// Worker threads (at most 8 are used)
    #[arg(short = 'j', long, value_name = "N")]
    pub workers: Option<usize>,

    /// Name of the trash directory inside the folder
    #[arg(long, value_name = "NAME")]
    pub trash_dir: Option<String>,
}

/// Arguments for `blur` and `dark`.
#[derive(Debug, Args)]
pub struct ThresholdArgs {
    /// Folder to scan
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Flag images scoring below this value
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Also list images that passed
    #[arg(long)]
    pub all: bool,

    #[command(flatten)]
    pub walk: WalkArgs,
}

/// Arguments for `lowres`.
#[derive(Debug, Args)]
pub struct LowresArgs {
    /// Folder to scan
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Minimum width in pixels
    #[arg(long)]
    pub min_width: Option<u32>,

    /// Minimum height in pixels
    #[arg(long)]
    pub min_height: Option<u32>,

    /// Also list images that passed
    #[arg(long)]
    pub all: bool,

    #[command(flatten)]
    pub walk: WalkArgs,
}

/// Arguments for `dupes`.
#[derive(Debug, Args)]
pub struct DupesArgs {
    /// Folder to scan
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Cosine similarity needed to join a group (0-1]
    #[arg(short, long)]
    pub threshold: Option<f32>,

    /// Extensions to consider instead of the image defaults (comma separated)
    #[arg(long, value_delimiter = ',', value_name = "EXT")]
    pub extensions: Vec<String>,

    #[command(flatten)]
    pub walk: WalkArgs,
}

/// Which scan's flagged files `trash --flagged` selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FlaggedBy {
    /// Blurry images
    Blur,
    /// Dark images
    Dark,
    /// Low-resolution images
    Lowres,
    /// Every non-original member of each duplicate group
    Dupes,
}

/// Arguments for `trash`.
#[derive(Debug, Args)]
pub struct TrashArgs {
    /// Folder that owns the trash directory
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Files to move
    #[arg(value_name = "FILE", required_unless_present = "flagged")]
    pub files: Vec<PathBuf>,

    /// Scan first and move everything the scan flags
    #[arg(long, value_enum, conflicts_with = "files")]
    pub flagged: Option<FlaggedBy>,

    #[command(flatten)]
    pub walk: WalkArgs,
}

/// Arguments for `restore`.
#[derive(Debug, Args)]
pub struct RestoreArgs {
    /// Folder that owns the trash directory
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// File names inside the trash directory
    #[arg(value_name = "NAME", required_unless_present = "all")]
    pub names: Vec<String>,

    /// Restore everything in the trash directory
    #[arg(long, conflicts_with = "names")]
    pub all: bool,

    /// Name of the trash directory inside the folder
    #[arg(long, value_name = "NAME")]
    pub trash_dir: Option<String>,
}

/// Arguments for `config`.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Write the effective settings to the config file
    #[arg(long)]
    pub init: bool,
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl WalkArgs {
    /// Overrides carried by walk flags. Unset flags leave lower layers alone.
    #[must_use]
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            max_workers: self.workers,
            trash_dir_name: self.trash_dir.clone(),
            skip_hidden: self.skip_hidden.then_some(true),
            follow_symlinks: self.follow_symlinks.then_some(true),
            ignore_patterns: self.ignore_patterns.clone(),
            ..SettingsOverrides::default()
        }
    }
}

impl Commands {
    /// Settings overrides from this subcommand's flags.
    #[must_use]
    pub fn overrides(&self) -> SettingsOverrides {
        match self {
            Commands::Blur(args) => SettingsOverrides {
                blur_threshold: args.threshold,
                ..args.walk.overrides()
            },
            Commands::Dark(args) => SettingsOverrides {
                brightness_threshold: args.threshold,
                ..args.walk.overrides()
            },
            Commands::Lowres(args) => SettingsOverrides {
                min_width: args.min_width,
                min_height: args.min_height,
                ..args.walk.overrides()
            },
            Commands::Dupes(args) => SettingsOverrides {
                similarity_threshold: args.threshold,
                ..args.walk.overrides()
            },
            Commands::Trash(args) => args.walk.overrides(),
            Commands::Restore(args) => SettingsOverrides {
                trash_dir_name: args.trash_dir.clone(),
                ..SettingsOverrides::default()
            },
            Commands::Config(_) => SettingsOverrides::default(),
        }
    }
}
