//! The watchdog: process-wide authority over the session table.
//!
//! Lifecycle: bootstrap (stale-socket cleanup + recovery scan), serve the
//! control socket, sweep session health on a fixed interval, and stop
//! itself after a grace period with nothing left to supervise.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use bwsr_protocol::{
	InstanceInfo, MessageReader, WatchdogRequest, WatchdogResponse, WrapperRequest, WrapperResponse,
	write_message,
};
use chrono::{SecondsFormat, Utc};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use super::round_trip;
use crate::browser::Launcher;
use crate::error::{BwsrError, Result};
use crate::names::{generate_session_name, is_valid_session_name};
use crate::paths::BwsrPaths;
use crate::profile::ProfileStore;
use crate::wrapper::Wrapper;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_IDLE_GRACE: Duration = Duration::from_secs(5);
const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct WatchdogConfig {
	pub paths: BwsrPaths,
	/// How often the health sweep runs.
	pub poll_interval: Duration,
	/// How long the table must stay empty before the watchdog exits.
	pub idle_grace: Duration,
	/// Bound on every outbound wrapper probe.
	pub ping_timeout: Duration,
}

impl WatchdogConfig {
	pub fn new(paths: BwsrPaths) -> Self {
		Self {
			paths,
			poll_interval: DEFAULT_POLL_INTERVAL,
			idle_grace: DEFAULT_IDLE_GRACE,
			ping_timeout: DEFAULT_PING_TIMEOUT,
		}
	}
}

/// One tracked session.
enum SessionEntry {
	/// Supervised by a wrapper living in this process.
	Local(Wrapper),
	/// Re-admitted after a watchdog restart. Only its socket and debug port
	/// are known; the profile name is not recoverable from a probe.
	Recovered { debug_port: u16 },
}

impl SessionEntry {
	fn profile_name(&self) -> &str {
		match self {
			SessionEntry::Local(wrapper) => wrapper.profile_name(),
			SessionEntry::Recovered { .. } => "default",
		}
	}
}

struct WatchdogState {
	sessions: HashMap<String, SessionEntry>,
	profiles: ProfileStore,
	launcher: Arc<dyn Launcher>,
}

pub struct Watchdog {
	config: WatchdogConfig,
	state: Arc<Mutex<WatchdogState>>,
	listener: UnixListener,
	shutdown_tx: watch::Sender<bool>,
	shutdown_rx: watch::Receiver<bool>,
}

impl Watchdog {
	/// Bootstrap: clean up the stale control socket, re-admit surviving
	/// sessions, and bind the control endpoint.
	pub async fn start(config: WatchdogConfig, launcher: Arc<dyn Launcher>) -> Result<Self> {
		config.paths.ensure_directories()?;

		let socket_path = config.paths.watchdog_socket();
		remove_socket_file(&socket_path);

		let mut state = WatchdogState {
			sessions: HashMap::new(),
			profiles: ProfileStore::new(config.paths.profiles()),
			launcher,
		};
		recover_sessions(&config, &mut state.sessions).await;

		let listener = UnixListener::bind(&socket_path)
			.with_context(|| format!("failed to bind watchdog socket: {}", socket_path.display()))?;
		info!(target = "bwsr.daemon", socket = %socket_path.display(), "watchdog listening");

		let (shutdown_tx, shutdown_rx) = watch::channel(false);
		Ok(Self { config, state: Arc::new(Mutex::new(state)), listener, shutdown_tx, shutdown_rx })
	}

	/// Serve until idle shutdown, SIGINT or SIGTERM.
	pub async fn run(mut self) -> Result<()> {
		use tokio::signal::unix::{SignalKind, signal};

		let mut sigterm =
			signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
		let mut sigint = signal(SignalKind::interrupt()).context("failed to install SIGINT handler")?;

		let mut sweep = tokio::time::interval_at(
			tokio::time::Instant::now() + self.config.poll_interval,
			self.config.poll_interval,
		);
		let mut idle_since: Option<Instant> = None;

		loop {
			tokio::select! {
				_ = self.shutdown_rx.changed() => {
					if *self.shutdown_rx.borrow() {
						break;
					}
				}
				_ = sigterm.recv() => {
					info!(target = "bwsr.daemon", "received SIGTERM, shutting down");
					break;
				}
				_ = sigint.recv() => {
					info!(target = "bwsr.daemon", "received SIGINT, shutting down");
					break;
				}
				_ = sweep.tick() => {
					let empty = sweep_sessions(&self.state, &self.config).await;
					if empty {
						match idle_since {
							None => {
								info!(target = "bwsr.daemon", "no sessions left, arming idle shutdown");
								idle_since = Some(Instant::now());
							}
							Some(since) if since.elapsed() >= self.config.idle_grace => {
								info!(target = "bwsr.daemon", "idle grace elapsed, exiting");
								break;
							}
							Some(_) => {}
						}
					} else {
						idle_since = None;
					}
				}
				accept = self.listener.accept() => {
					let (stream, _) = accept.context("watchdog accept failed")?;
					let state = Arc::clone(&self.state);
					let config = self.config.clone();
					tokio::spawn(async move {
						if let Err(err) = handle_connection(stream, state, config).await {
							warn!(target = "bwsr.daemon", error = %err, "watchdog connection error");
						}
					});
				}
			}
		}

		self.shutdown().await;
		Ok(())
	}

	/// Stop every session, close the control endpoint, remove its file.
	async fn shutdown(self) {
		let mut state = self.state.lock().await;
		let sessions: Vec<(String, SessionEntry)> = state.sessions.drain().collect();
		drop(state);
		for (session, entry) in sessions {
			debug!(target = "bwsr.daemon", session = %session, "stopping session");
			stop_entry(&session, entry, &self.config).await;
		}
		drop(self.listener);
		remove_socket_file(&self.config.paths.watchdog_socket());
	}

	/// Ask the serving loop to exit; used by tests.
	pub fn shutdown_handle(&self) -> watch::Sender<bool> {
		self.shutdown_tx.clone()
	}
}

/// Scan the sockets directory for per-session sockets left by a previous
/// watchdog. A socket that answers a ping is a surviving session and is
/// re-admitted; one that does not is dead and its file is removed.
async fn recover_sessions(config: &WatchdogConfig, sessions: &mut HashMap<String, SessionEntry>) {
	let Ok(entries) = std::fs::read_dir(config.paths.sockets()) else {
		return;
	};

	for entry in entries.filter_map(|e| e.ok()) {
		let Ok(file) = entry.file_name().into_string() else { continue };
		if file == "watchdog.sock" || !file.ends_with(".sock") {
			continue;
		}
		let session = file.trim_end_matches(".sock").to_string();
		let socket_path = config.paths.session_socket(&session);

		match ping_wrapper(&socket_path, config.ping_timeout).await {
			Some(WrapperResponse::Pong { cdp_port, .. }) => {
				info!(target = "bwsr.daemon", session = %session, port = cdp_port, "recovered session");
				sessions.insert(session, SessionEntry::Recovered { debug_port: cdp_port });
			}
			_ => {
				debug!(target = "bwsr.daemon", session = %session, "removing dead session socket");
				remove_socket_file(&socket_path);
			}
		}
	}
}

/// Probe every tracked session; evict the ones that fail. An evicted
/// session is assumed already gone, so nothing tells it to shut down.
/// Returns whether the table is empty afterwards.
async fn sweep_sessions(state: &Arc<Mutex<WatchdogState>>, config: &WatchdogConfig) -> bool {
	let mut state = state.lock().await;

	let mut dead = Vec::new();
	for (session, entry) in &state.sessions {
		let healthy = match entry {
			SessionEntry::Local(wrapper) => wrapper.is_healthy().await,
			SessionEntry::Recovered { .. } => matches!(
				ping_wrapper(&config.paths.session_socket(session), config.ping_timeout).await,
				Some(WrapperResponse::Pong { .. })
			),
		};
		if !healthy {
			dead.push(session.clone());
		}
	}

	for session in dead {
		warn!(target = "bwsr.daemon", session = %session, "session unhealthy, removing");
		state.sessions.remove(&session);
		remove_socket_file(&config.paths.session_socket(&session));
	}

	state.sessions.is_empty()
}

/// One request, one response, then the client closes the connection.
async fn handle_connection(
	stream: UnixStream,
	state: Arc<Mutex<WatchdogState>>,
	config: WatchdogConfig,
) -> Result<()> {
	let (read_half, mut write_half) = stream.into_split();
	let mut reader = MessageReader::new(read_half);

	let response = match reader.read_message::<WatchdogRequest>().await {
		Ok(Some(request)) => handle_request(&state, &config, request).await,
		Ok(None) => return Ok(()),
		Err(err) => WatchdogResponse::failure(err.to_string()),
	};

	write_message(&mut write_half, &response).await?;
	Ok(())
}

async fn handle_request(
	state: &Arc<Mutex<WatchdogState>>,
	config: &WatchdogConfig,
	request: WatchdogRequest,
) -> WatchdogResponse {
	match request {
		WatchdogRequest::Start { profile, session } => {
			handle_start(state, config, profile, session).await
		}
		WatchdogRequest::Stop { session } => handle_stop(state, config, session).await,
		WatchdogRequest::StopAll => handle_stop_all(state, config).await,
		WatchdogRequest::List => handle_list(state, config).await,
		WatchdogRequest::Cdp { session } => handle_cdp(state, config, session).await,
	}
}

/// The lock is held across the collision check and the insert, so two
/// concurrent starts for one name cannot both win.
async fn handle_start(
	state: &Arc<Mutex<WatchdogState>>,
	config: &WatchdogConfig,
	profile_name: String,
	session: String,
) -> WatchdogResponse {
	let mut state = state.lock().await;

	let profile = match state.profiles.get(&profile_name) {
		Ok(Some(profile)) => profile,
		Ok(None) => {
			return WatchdogResponse::failure(BwsrError::ProfileNotFound(profile_name).to_string());
		}
		Err(err) => return WatchdogResponse::failure(err.to_string()),
	};

	let session = if session.is_empty() {
		let Some(name) = (0..32).map(|_| generate_session_name()).find(|n| !state.sessions.contains_key(n))
		else {
			return WatchdogResponse::failure("could not generate a free session name");
		};
		name
	} else {
		if !is_valid_session_name(&session) {
			return WatchdogResponse::failure(BwsrError::InvalidSessionName(session).to_string());
		}
		session
	};

	if state.sessions.contains_key(&session) {
		return WatchdogResponse::failure(BwsrError::SessionExists(session).to_string());
	}

	let launcher = Arc::clone(&state.launcher);
	match Wrapper::start(&session, &profile_name, &profile, &config.paths, launcher).await {
		Ok(wrapper) => {
			let port = wrapper.debug_port();
			info!(target = "bwsr.daemon", session = %session, port, profile = %profile_name, "session started");
			state.sessions.insert(session.clone(), SessionEntry::Local(wrapper));
			WatchdogResponse::started(session, port)
		}
		Err(err) => {
			warn!(target = "bwsr.daemon", session = %session, error = %err, "session launch failed");
			WatchdogResponse::failure(err.to_string())
		}
	}
}

async fn handle_stop(
	state: &Arc<Mutex<WatchdogState>>,
	config: &WatchdogConfig,
	session: String,
) -> WatchdogResponse {
	let entry = {
		let mut state = state.lock().await;
		state.sessions.remove(&session)
	};
	match entry {
		Some(entry) => {
			stop_entry(&session, entry, config).await;
			info!(target = "bwsr.daemon", session = %session, "session stopped");
			WatchdogResponse::ok()
		}
		None => WatchdogResponse::failure(BwsrError::SessionNotFound(session).to_string()),
	}
}

/// Never fails; an empty table is a no-op success.
async fn handle_stop_all(
	state: &Arc<Mutex<WatchdogState>>,
	config: &WatchdogConfig,
) -> WatchdogResponse {
	let sessions: Vec<(String, SessionEntry)> = {
		let mut state = state.lock().await;
		state.sessions.drain().collect()
	};
	for (session, entry) in sessions {
		stop_entry(&session, entry, config).await;
		info!(target = "bwsr.daemon", session = %session, "session stopped");
	}
	WatchdogResponse::ok()
}

/// Probes every tracked session and reports the ones that answer.
/// Unresponsive sessions are silently omitted; the sweep will evict them.
async fn handle_list(
	state: &Arc<Mutex<WatchdogState>>,
	config: &WatchdogConfig,
) -> WatchdogResponse {
	let state = state.lock().await;
	let mut instances = Vec::new();

	for (session, entry) in &state.sessions {
		let Some(WrapperResponse::Pong { cdp_port, status, last_used }) =
			ping_wrapper(&config.paths.session_socket(session), config.ping_timeout).await
		else {
			continue;
		};
		instances.push(InstanceInfo {
			session: session.clone(),
			profile: entry.profile_name().to_string(),
			cdp_port,
			last_used,
			last_pulse: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
			status,
		});
	}

	instances.sort_by(|a, b| a.session.cmp(&b.session));
	WatchdogResponse::instances(instances)
}

async fn handle_cdp(
	state: &Arc<Mutex<WatchdogState>>,
	config: &WatchdogConfig,
	session: Option<String>,
) -> WatchdogResponse {
	let state = state.lock().await;
	let target = match session.or_else(|| state.sessions.keys().next().cloned()) {
		Some(target) => target,
		None => return WatchdogResponse::failure("no running sessions"),
	};

	match ping_wrapper(&config.paths.session_socket(&target), config.ping_timeout).await {
		Some(WrapperResponse::Pong { cdp_port, .. }) => WatchdogResponse::endpoint(cdp_port),
		_ => WatchdogResponse::failure(format!("session '{target}' not responding")),
	}
}

async fn stop_entry(session: &str, entry: SessionEntry, config: &WatchdogConfig) {
	match entry {
		SessionEntry::Local(wrapper) => wrapper.stop().await,
		SessionEntry::Recovered { .. } => {
			let socket_path = config.paths.session_socket(session);
			let _: Option<WrapperResponse> =
				round_trip(&socket_path, &WrapperRequest::Shutdown, config.ping_timeout).await.ok();
			remove_socket_file(&socket_path);
		}
	}
}

async fn ping_wrapper(socket_path: &Path, bound: Duration) -> Option<WrapperResponse> {
	round_trip(socket_path, &WrapperRequest::Ping, bound).await.ok()
}

fn remove_socket_file(path: &Path) {
	// Advisory files: tolerate "already gone".
	let _ = std::fs::remove_file(path);
}
