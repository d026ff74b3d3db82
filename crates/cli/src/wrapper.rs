//! Session supervisor: owns exactly one browser instance end to end.
//!
//! A wrapper launches the browser, then serves `ping`/`shutdown` on its own
//! session-specific control socket. Wrappers execute in-process inside the
//! watchdog, not as separate OS processes.

use std::path::PathBuf;
use std::sync::Arc;

use bwsr_protocol::{HealthStatus, MessageReader, WrapperRequest, WrapperResponse, write_message};
use chrono::{DateTime, SecondsFormat, Utc};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};

use crate::browser::{BrowserHandle, Launcher, discover_browser};
use crate::error::{BwsrError, Result};
use crate::paths::BwsrPaths;
use crate::profile::Profile;

pub struct Wrapper {
	session: String,
	profile_name: String,
	debug_port: u16,
	socket_path: PathBuf,
	state: Arc<Mutex<WrapperState>>,
	shutdown_tx: watch::Sender<bool>,
}

impl std::fmt::Debug for Wrapper {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Wrapper")
			.field("session", &self.session)
			.field("profile_name", &self.profile_name)
			.field("debug_port", &self.debug_port)
			.field("socket_path", &self.socket_path)
			.finish_non_exhaustive()
	}
}

struct WrapperState {
	browser: Option<Box<dyn BrowserHandle>>,
	last_used: DateTime<Utc>,
}

impl WrapperState {
	async fn is_connected(&mut self) -> bool {
		match self.browser.as_mut() {
			Some(browser) => browser.is_connected().await,
			None => false,
		}
	}

	async fn close_browser(&mut self) {
		if let Some(mut browser) = self.browser.take() {
			browser.close().await;
		}
	}
}

impl Wrapper {
	/// Launch a browser from `profile` and open the session control socket.
	///
	/// The profile is a snapshot: nothing here re-reads it later.
	pub async fn start(
		session: &str,
		profile_name: &str,
		profile: &Profile,
		paths: &BwsrPaths,
		launcher: Arc<dyn Launcher>,
	) -> Result<Wrapper> {
		let kind = profile.browser_kind();
		let executable = match &profile.executable {
			Some(path) => path.clone(),
			None => discover_browser(kind).await.ok_or_else(|| {
				BwsrError::Launch(format!(
					"could not find {kind} browser; install via: npx playwright install {kind}"
				))
			})?,
		};

		let data_dir = paths.session_data_dir(session);
		let browser = launcher.launch(&executable, profile, &data_dir).await?;
		let debug_port = browser.debug_port();

		let socket_path = paths.session_socket(session);
		remove_stale(&socket_path);
		let listener = UnixListener::bind(&socket_path)
			.map_err(|e| BwsrError::Launch(format!("failed to bind session socket: {e}")))?;

		let state = Arc::new(Mutex::new(WrapperState { browser: Some(browser), last_used: Utc::now() }));
		let (shutdown_tx, shutdown_rx) = watch::channel(false);

		let wrapper = Wrapper {
			session: session.to_string(),
			profile_name: profile_name.to_string(),
			debug_port,
			socket_path: socket_path.clone(),
			state: Arc::clone(&state),
			shutdown_tx: shutdown_tx.clone(),
		};

		tokio::spawn(serve(listener, state, debug_port, socket_path, shutdown_tx, shutdown_rx));

		Ok(wrapper)
	}

	pub fn session(&self) -> &str {
		&self.session
	}

	pub fn profile_name(&self) -> &str {
		&self.profile_name
	}

	pub fn debug_port(&self) -> u16 {
		self.debug_port
	}

	/// Pure read of the browser's connectedness; never fails.
	pub async fn is_healthy(&self) -> bool {
		self.state.lock().await.is_connected().await
	}

	/// Close the browser, the control socket, and its file. Every step is
	/// best-effort and independent; safe to call twice.
	pub async fn stop(&self) {
		let _ = self.shutdown_tx.send(true);
		self.state.lock().await.close_browser().await;
		remove_stale(&self.socket_path);
	}
}

async fn serve(
	listener: UnixListener,
	state: Arc<Mutex<WrapperState>>,
	debug_port: u16,
	socket_path: PathBuf,
	shutdown_tx: watch::Sender<bool>,
	mut shutdown_rx: watch::Receiver<bool>,
) {
	loop {
		tokio::select! {
			_ = shutdown_rx.changed() => {
				if *shutdown_rx.borrow() {
					break;
				}
			}
			accept = listener.accept() => {
				let Ok((stream, _)) = accept else { break };
				if let Err(err) =
					handle_connection(stream, &state, debug_port, &socket_path, &shutdown_tx).await
				{
					warn!(target = "bwsr.wrapper", error = %err, "session connection error");
				}
			}
		}
	}
}

/// One request, one response, then the connection closes.
async fn handle_connection(
	stream: UnixStream,
	state: &Arc<Mutex<WrapperState>>,
	debug_port: u16,
	socket_path: &PathBuf,
	shutdown_tx: &watch::Sender<bool>,
) -> Result<()> {
	let (read_half, mut write_half) = stream.into_split();
	let mut reader = MessageReader::new(read_half);

	let Some(request) = reader.read_message::<WrapperRequest>().await? else {
		return Ok(());
	};

	match request {
		WrapperRequest::Ping => {
			let mut state = state.lock().await;
			state.last_used = Utc::now();
			let status = HealthStatus::from_connected(state.is_connected().await);
			let response = WrapperResponse::Pong {
				cdp_port: debug_port,
				status,
				last_used: state.last_used.to_rfc3339_opts(SecondsFormat::Millis, true),
			};
			drop(state);
			write_message(&mut write_half, &response).await?;
		}
		WrapperRequest::Shutdown => {
			debug!(target = "bwsr.wrapper", "shutdown requested");
			state.lock().await.close_browser().await;
			write_message(&mut write_half, &WrapperResponse::ShutdownAck).await?;
			remove_stale(socket_path);
			let _ = shutdown_tx.send(true);
		}
	}

	Ok(())
}

fn remove_stale(path: &PathBuf) {
	// Socket files are advisory: tolerate "already gone".
	let _ = std::fs::remove_file(path);
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::StubLauncher;

	async fn ping(socket_path: &PathBuf) -> WrapperResponse {
		let stream = UnixStream::connect(socket_path).await.unwrap();
		let (read_half, mut write_half) = stream.into_split();
		write_message(&mut write_half, &WrapperRequest::Ping).await.unwrap();
		let mut reader = MessageReader::new(read_half);
		reader.read_message().await.unwrap().unwrap()
	}

	fn test_profile() -> Profile {
		Profile { executable: Some("/usr/bin/true".into()), ..Profile::stock() }
	}

	#[tokio::test]
	async fn ping_reports_port_and_health() {
		let dir = tempfile::tempdir().unwrap();
		let paths = BwsrPaths::new(dir.path());
		paths.ensure_directories().unwrap();
		let launcher = Arc::new(StubLauncher::new());

		let wrapper =
			Wrapper::start("happy-fox", "default", &test_profile(), &paths, launcher.clone())
				.await
				.unwrap();

		let WrapperResponse::Pong { cdp_port, status, .. } =
			ping(&paths.session_socket("happy-fox")).await
		else {
			panic!("expected pong");
		};
		assert_eq!(cdp_port, wrapper.debug_port());
		assert_eq!(status, HealthStatus::Healthy);
		assert!(wrapper.is_healthy().await);

		wrapper.stop().await;
	}

	#[tokio::test]
	async fn ping_refreshes_last_used() {
		let dir = tempfile::tempdir().unwrap();
		let paths = BwsrPaths::new(dir.path());
		paths.ensure_directories().unwrap();

		let wrapper = Wrapper::start(
			"calm-owl",
			"default",
			&test_profile(),
			&paths,
			Arc::new(StubLauncher::new()),
		)
		.await
		.unwrap();

		let socket = paths.session_socket("calm-owl");
		let WrapperResponse::Pong { last_used: first, .. } = ping(&socket).await else {
			panic!("expected pong");
		};
		tokio::time::sleep(std::time::Duration::from_millis(5)).await;
		let WrapperResponse::Pong { last_used: second, .. } = ping(&socket).await else {
			panic!("expected pong");
		};
		assert!(second > first);

		wrapper.stop().await;
	}

	#[tokio::test]
	async fn disconnected_browser_reports_unhealthy() {
		let dir = tempfile::tempdir().unwrap();
		let paths = BwsrPaths::new(dir.path());
		paths.ensure_directories().unwrap();
		let launcher = Arc::new(StubLauncher::new());

		let wrapper =
			Wrapper::start("swift-elk", "default", &test_profile(), &paths, launcher.clone())
				.await
				.unwrap();
		launcher.sessions()[0].disconnect();

		assert!(!wrapper.is_healthy().await);
		let WrapperResponse::Pong { status, .. } = ping(&paths.session_socket("swift-elk")).await
		else {
			panic!("expected pong");
		};
		assert_eq!(status, HealthStatus::Unhealthy);

		wrapper.stop().await;
	}

	#[tokio::test]
	async fn shutdown_verb_acks_and_removes_socket() {
		let dir = tempfile::tempdir().unwrap();
		let paths = BwsrPaths::new(dir.path());
		paths.ensure_directories().unwrap();
		let launcher = Arc::new(StubLauncher::new());

		let _wrapper =
			Wrapper::start("bold-ram", "default", &test_profile(), &paths, launcher.clone())
				.await
				.unwrap();

		let socket = paths.session_socket("bold-ram");
		let stream = UnixStream::connect(&socket).await.unwrap();
		let (read_half, mut write_half) = stream.into_split();
		write_message(&mut write_half, &WrapperRequest::Shutdown).await.unwrap();
		let mut reader = MessageReader::new(read_half);
		let response: WrapperResponse = reader.read_message().await.unwrap().unwrap();
		assert_eq!(response, WrapperResponse::ShutdownAck);

		assert!(!socket.exists());
		assert!(!launcher.sessions()[0].is_connected());
	}

	#[tokio::test]
	async fn stop_is_idempotent() {
		let dir = tempfile::tempdir().unwrap();
		let paths = BwsrPaths::new(dir.path());
		paths.ensure_directories().unwrap();

		let wrapper = Wrapper::start(
			"wise-newt",
			"default",
			&test_profile(),
			&paths,
			Arc::new(StubLauncher::new()),
		)
		.await
		.unwrap();

		wrapper.stop().await;
		wrapper.stop().await;
		assert!(!paths.session_socket("wise-newt").exists());
		assert!(!wrapper.is_healthy().await);
	}

	#[tokio::test]
	async fn launch_failure_propagates() {
		let dir = tempfile::tempdir().unwrap();
		let paths = BwsrPaths::new(dir.path());
		paths.ensure_directories().unwrap();
		let launcher = Arc::new(StubLauncher::new());
		launcher.fail_next("browser exploded");

		let err = Wrapper::start("sad-yak", "default", &test_profile(), &paths, launcher)
			.await
			.unwrap_err();
		assert!(matches!(err, BwsrError::Launch(msg) if msg.contains("exploded")));
		assert!(!paths.session_socket("sad-yak").exists());
	}
}
