//! Arbor shell: view navigation and lifecycle for a terminal client of
//! tree-structured community conversations.
//!
//! The [`NavigationManager`] owns every registered view, the back stack and
//! the app-bar/drawer chrome. [`ShellRuntime`] drives it from terminal
//! events, and [`AppState`] wires the shared collaborators together.

pub mod app;
pub mod chrome;
pub mod config;
pub mod error;
pub mod geometry;
pub mod input;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod nav;
pub mod render;
pub mod runtime;
pub mod store;
pub mod theme;
pub mod views;
pub mod widget;
pub mod width;

pub use app::{AppState, shell_config};
pub use chrome::{ChromeCoordinator, ChromeSnapshot};
pub use config::{Cli, ClipboardRouting, Settings, SettingsHandle, ShellConfig};
pub use error::{Result, ShellError};
pub use geometry::{Dimensions, Rect, Size};
pub use input::{ActionTag, InputEvent, KeyMap};
pub use logging::{LogEvent, LogFields, LogLevel, Logger, LoggingError, LoggingResult};
pub use metrics::{MetricSnapshot, ShellMetrics};
pub use nav::{
    AppBarAction, AppBarData, EventFlow, HostRequest, Icon, ManagerHandle, NavItem,
    NavigationManager, OverflowAction, View, ViewId,
};
pub use render::{AnsiRenderer, Canvas, RenderContext};
pub use runtime::driver::cli::{CliDriver, CliDriverError, DriverResult};
pub use runtime::{
    HostWindow, MemoryHost, PlatformEvent, RedrawSignal, Routed, ShellNotice, ShellRuntime,
    TerminalHost,
};
pub use store::{ConversationStore, MemoryStore, Node, NodeId};
pub use width::display_width;
