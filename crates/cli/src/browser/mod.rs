//! Browser executable discovery and the process-backed launcher.

pub mod discovery;
pub mod launcher;

pub use discovery::discover_browser;
pub use launcher::{BrowserHandle, Launcher, ProcessLauncher};
