//! UI layer for desktop GUI: app shell and map panel.

pub mod app;
pub mod map_panel;

pub use app::{DesktopGuiApp, StartupConfig};
