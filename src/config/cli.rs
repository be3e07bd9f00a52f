//! Command-line flags for the `arbor` binary.

use std::path::PathBuf;

use clap::Parser;

use super::ClipboardRouting;

#[derive(Debug, Parser)]
#[command(
    name = "arbor",
    version,
    about = "Terminal client for tree-structured community conversations"
)]
pub struct Cli {
    /// Relay address to connect to (persisted to settings).
    #[arg(long, value_name = "HOST:PORT")]
    pub address: Option<String>,

    /// Show the frame-timing overlay.
    #[arg(long)]
    pub profile: bool,

    /// Open the theme editor side panel.
    #[arg(long = "theme-editor")]
    pub theme_editor: bool,

    /// Directory holding settings and logs (default: platform data dir).
    #[arg(long = "data-dir", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Write logs here instead of `<data-dir>/arbor.log`.
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Truncate the log file once it grows past this many bytes (0 = never).
    #[arg(long = "log-max-bytes", default_value_t = 1 << 20)]
    pub log_max_bytes: u64,

    /// Which view receives clipboard contents.
    #[arg(long = "clipboard-routing", value_enum, default_value_t = ClipboardRouting::ActiveView)]
    pub clipboard_routing: ClipboardRouting,
}
