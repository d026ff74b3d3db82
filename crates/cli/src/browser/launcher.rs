use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::{BwsrError, Result};
use crate::profile::{BrowserKind, ColorScheme, Profile};

const CDP_READY_TIMEOUT: Duration = Duration::from_secs(15);
const CDP_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// One launched browser process, owned by exactly one session wrapper.
#[async_trait]
pub trait BrowserHandle: Send {
	/// The remote-debugging port the browser was launched with.
	fn debug_port(&self) -> u16;

	/// Whether the browser is still attached. A boolean proxy for a richer
	/// failure space (crashed vs hung vs slow); never fails.
	async fn is_connected(&mut self) -> bool;

	/// Best-effort close. Safe to call twice.
	async fn close(&mut self);
}

/// Launches a browser with a wired-in remote-debugging port.
///
/// The executable has already been resolved by the caller (profile override
/// or discovery); launch failures propagate verbatim.
#[async_trait]
pub trait Launcher: Send + Sync {
	async fn launch(
		&self,
		executable: &Path,
		profile: &Profile,
		data_dir: &Path,
	) -> Result<Box<dyn BrowserHandle>>;
}

/// Production launcher: spawns the browser as a child process and waits for
/// its DevTools HTTP endpoint to come up. The process starts on
/// `about:blank`, so a client connecting over the debug port immediately
/// finds a usable page.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLauncher;

#[async_trait]
impl Launcher for ProcessLauncher {
	async fn launch(
		&self,
		executable: &Path,
		profile: &Profile,
		data_dir: &Path,
	) -> Result<Box<dyn BrowserHandle>> {
		let kind = profile.browser_kind();
		if kind == BrowserKind::Webkit {
			return Err(BwsrError::Launch(
				"webkit is not supported by the process launcher; use chromium or firefox".into(),
			));
		}

		std::fs::create_dir_all(data_dir)
			.map_err(|e| BwsrError::Launch(format!("failed to create user data dir: {e}")))?;

		let debug_port = free_port().await?;
		let args = build_args(kind, profile, debug_port, data_dir);

		debug!(
			target = "bwsr.launcher",
			executable = %executable.display(),
			port = debug_port,
			browser = %kind,
			"launching browser"
		);

		let mut cmd = Command::new(executable);
		cmd.args(&args).stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
		if let Some(tz) = &profile.timezone {
			cmd.env("TZ", tz);
		}

		let mut child = cmd
			.spawn()
			.map_err(|e| BwsrError::Launch(format!("failed to spawn {}: {e}", executable.display())))?;

		if let Err(err) = wait_for_cdp_ready(debug_port, CDP_READY_TIMEOUT).await {
			let _ = child.start_kill();
			return Err(err);
		}

		Ok(Box::new(ProcessBrowser { child, debug_port }))
	}
}

struct ProcessBrowser {
	child: Child,
	debug_port: u16,
}

#[async_trait]
impl BrowserHandle for ProcessBrowser {
	fn debug_port(&self) -> u16 {
		self.debug_port
	}

	async fn is_connected(&mut self) -> bool {
		matches!(self.child.try_wait(), Ok(None))
	}

	async fn close(&mut self) {
		if let Err(err) = self.child.kill().await {
			debug!(target = "bwsr.launcher", error = %err, "browser already gone");
		}
	}
}

/// Ask the OS for any free TCP port.
pub async fn free_port() -> Result<u16> {
	let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
		.await
		.map_err(|e| BwsrError::Launch(format!("failed to allocate debug port: {e}")))?;
	let port = listener
		.local_addr()
		.map_err(|e| BwsrError::Launch(format!("failed to read debug port: {e}")))?
		.port();
	drop(listener);
	Ok(port)
}

/// Map profile fields onto engine-specific command-line switches. The
/// `offline` field has no process-level equivalent and is ignored here.
fn build_args(kind: BrowserKind, profile: &Profile, debug_port: u16, data_dir: &Path) -> Vec<String> {
	let mut args: Vec<String> = profile.args.clone().unwrap_or_default();
	let headless = profile.headless.unwrap_or(true);

	match kind {
		BrowserKind::Chromium => {
			args.push(format!("--remote-debugging-port={debug_port}"));
			args.push(format!("--user-data-dir={}", data_dir.display()));
			args.push("--no-first-run".into());
			args.push("--no-default-browser-check".into());
			if headless {
				args.push("--headless=new".into());
			}
			if let Some(viewport) = &profile.viewport {
				args.push(format!("--window-size={},{}", viewport.width, viewport.height));
			}
			if let Some(locale) = &profile.locale {
				args.push(format!("--lang={locale}"));
			}
			if let Some(agent) = &profile.user_agent {
				args.push(format!("--user-agent={agent}"));
			}
			if let Some(proxy) = &profile.proxy {
				args.push(format!("--proxy-server={proxy}"));
			}
			if profile.ignore_https_errors.unwrap_or(false) {
				args.push("--ignore-certificate-errors".into());
			}
			if profile.color_scheme == Some(ColorScheme::Dark) {
				args.push("--force-dark-mode".into());
			}
			args.push("about:blank".into());
		}
		BrowserKind::Firefox | BrowserKind::Webkit => {
			args.push("--remote-debugging-port".into());
			args.push(debug_port.to_string());
			args.push("--profile".into());
			args.push(data_dir.display().to_string());
			args.push("--no-remote".into());
			if headless {
				args.push("--headless".into());
			}
			if let Some(viewport) = &profile.viewport {
				args.push(format!("--width={}", viewport.width));
				args.push(format!("--height={}", viewport.height));
			}
			args.push("about:blank".into());
		}
	}

	args
}

/// Poll the DevTools HTTP endpoint until it answers `/json/version`.
async fn wait_for_cdp_ready(port: u16, bound: Duration) -> Result<()> {
	let url = format!("http://127.0.0.1:{port}/json/version");
	let start = std::time::Instant::now();

	loop {
		if start.elapsed() > bound {
			warn!(target = "bwsr.launcher", port, "browser never opened its debug endpoint");
			return Err(BwsrError::Launch(format!(
				"browser did not open debug port {port} within {}s",
				bound.as_secs()
			)));
		}

		if let Ok(resp) = reqwest::get(&url).await {
			if resp.json::<serde_json::Value>().await.is_ok() {
				return Ok(());
			}
		}

		tokio::time::sleep(CDP_POLL_INTERVAL).await;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::profile::Viewport;

	#[test]
	fn chromium_args_wire_in_the_debug_port() {
		let profile = Profile {
			viewport: Some(Viewport { width: 1280, height: 720 }),
			locale: Some("de-DE".into()),
			proxy: Some("socks5://127.0.0.1:1080".into()),
			ignore_https_errors: Some(true),
			args: Some(vec!["--disable-gpu".into()]),
			..Profile::stock()
		};
		let args = build_args(BrowserKind::Chromium, &profile, 9222, Path::new("/tmp/d"));

		assert!(args.contains(&"--remote-debugging-port=9222".to_string()));
		assert!(args.contains(&"--headless=new".to_string()));
		assert!(args.contains(&"--window-size=1280,720".to_string()));
		assert!(args.contains(&"--lang=de-DE".to_string()));
		assert!(args.contains(&"--proxy-server=socks5://127.0.0.1:1080".to_string()));
		assert!(args.contains(&"--ignore-certificate-errors".to_string()));
		// Profile extras come first so our flags win on conflict.
		assert_eq!(args[0], "--disable-gpu");
		assert_eq!(args.last().unwrap(), "about:blank");
	}

	#[test]
	fn headed_chromium_omits_headless() {
		let profile = Profile { headless: Some(false), ..Default::default() };
		let args = build_args(BrowserKind::Chromium, &profile, 9222, Path::new("/tmp/d"));
		assert!(!args.iter().any(|a| a.starts_with("--headless")));
	}

	#[test]
	fn firefox_args_use_split_port_flag() {
		let profile = Profile { browser: Some(BrowserKind::Firefox), ..Default::default() };
		let args = build_args(BrowserKind::Firefox, &profile, 9333, Path::new("/tmp/d"));
		let port_flag = args.iter().position(|a| a == "--remote-debugging-port").unwrap();
		assert_eq!(args[port_flag + 1], "9333");
		assert!(args.contains(&"--no-remote".to_string()));
	}

	#[tokio::test]
	async fn free_port_is_bindable() {
		let port = free_port().await.unwrap();
		assert!(port > 0);
		// The port was released, so binding it again succeeds.
		tokio::net::TcpListener::bind(("127.0.0.1", port)).await.unwrap();
	}
}
