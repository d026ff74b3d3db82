use std::sync::Arc;

use crate::browser::ProcessLauncher;
use crate::daemon::{Watchdog, WatchdogConfig};
use crate::error::Result;
use crate::paths::BwsrPaths;

/// Foreground watchdog. The client bootstrap spawns `bwsr watchdog` as a
/// detached process; the serving loop exits on its own when idle.
pub async fn run(paths: BwsrPaths) -> Result<()> {
	let config = WatchdogConfig::new(paths);
	let watchdog = Watchdog::start(config, Arc::new(ProcessLauncher)).await?;
	watchdog.run().await
}
