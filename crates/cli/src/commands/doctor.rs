use crate::browser::discover_browser;
use crate::daemon::Client;
use crate::error::Result;
use crate::paths::BwsrPaths;
use crate::profile::{BrowserKind, Profile, ProfileStore};

/// Environment report: config layout, profiles, discoverable browsers and
/// watchdog status. Always exits zero; findings are informational.
pub async fn run(paths: &BwsrPaths) -> Result<()> {
	paths.ensure_directories()?;
	println!("Config: {}", paths.root().display());

	let store = ProfileStore::new(paths.profiles());
	if store.get("default")?.is_none() {
		store.create("default", &Profile::stock())?;
	}
	println!("\nProfiles:");
	for name in store.list() {
		println!("  {name}");
	}

	println!("\nBrowsers:");
	for kind in [BrowserKind::Chromium, BrowserKind::Firefox, BrowserKind::Webkit] {
		match discover_browser(kind).await {
			Some(path) => println!("  {kind}: {}", path.display()),
			None => println!("  {kind}: not found (npx playwright install {kind})"),
		}
	}

	println!("\nWatchdog:");
	let client = Client::new(paths.clone());
	let instances = client.list().await?;
	if instances.is_empty() && !paths.watchdog_socket().exists() {
		println!("  not running (starts on demand)");
	} else {
		println!("  running, {} session(s)", instances.len());
		for instance in &instances {
			println!("    {} (port {})", instance.session, instance.cdp_port);
		}
	}
	Ok(())
}
