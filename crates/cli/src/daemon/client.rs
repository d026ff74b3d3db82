//! Client-side bootstrap: makes watchdog presence transparent to one
//! short-lived invocation.

use std::time::Duration;

use bwsr_protocol::{InstanceInfo, WatchdogRequest, WatchdogResponse};
use tracing::debug;

use super::round_trip;
use crate::error::{BwsrError, Result};
use crate::paths::BwsrPaths;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const READY_ATTEMPTS: usize = 50;
const READY_DELAY: Duration = Duration::from_millis(100);

pub struct Client {
	paths: BwsrPaths,
}

impl Client {
	pub fn new(paths: BwsrPaths) -> Self {
		Self { paths }
	}

	/// Launch a session, starting a watchdog first if none is reachable.
	/// Returns the session name and its debug port.
	pub async fn start(&self, profile: &str, session: &str) -> Result<(String, u16)> {
		self.ensure_watchdog().await?;
		let request =
			WatchdogRequest::Start { profile: profile.to_string(), session: session.to_string() };
		match self.send(&request).await? {
			WatchdogResponse::Started { session, cdp_port, .. } => Ok((session, cdp_port)),
			other => Err(unexpected(other)),
		}
	}

	pub async fn stop(&self, session: &str) -> Result<()> {
		match self.send(&WatchdogRequest::Stop { session: session.to_string() }).await? {
			WatchdogResponse::Ok { .. } => Ok(()),
			other => Err(unexpected(other)),
		}
	}

	pub async fn stop_all(&self) -> Result<()> {
		match self.send(&WatchdogRequest::StopAll).await? {
			WatchdogResponse::Ok { .. } => Ok(()),
			other => Err(unexpected(other)),
		}
	}

	/// List running sessions. Alone among the verbs, this degrades an
	/// unreachable watchdog into an empty result: no daemon means no
	/// sessions, not an error.
	pub async fn list(&self) -> Result<Vec<InstanceInfo>> {
		match self.send(&WatchdogRequest::List).await {
			Ok(WatchdogResponse::Instances { instances, .. }) => Ok(instances),
			Ok(other) => Err(unexpected(other)),
			Err(err) if err.is_connection() => Ok(Vec::new()),
			Err(err) => Err(err),
		}
	}

	pub async fn cdp(&self, session: Option<&str>) -> Result<u16> {
		let request = WatchdogRequest::Cdp { session: session.map(str::to_string) };
		match self.send(&request).await? {
			WatchdogResponse::Endpoint { cdp_port, .. } => Ok(cdp_port),
			other => Err(unexpected(other)),
		}
	}

	/// Verify a watchdog is reachable, spawning one when it is not.
	async fn ensure_watchdog(&self) -> Result<()> {
		if self.paths.watchdog_socket().exists() && self.probe().await.is_ok() {
			return Ok(());
		}

		self.spawn_watchdog()?;
		self.wait_until_ready(READY_ATTEMPTS, READY_DELAY).await
	}

	/// Spawn the watchdog as a detached background process. It gets its own
	/// process group so it outlives this invocation, and is never waited on.
	fn spawn_watchdog(&self) -> Result<()> {
		let exe = std::env::current_exe()
			.map_err(|e| BwsrError::Bootstrap(format!("failed to resolve executable: {e}")))?;

		let mut cmd = std::process::Command::new(exe);
		cmd.arg("watchdog")
			.env("BWSR_HOME", self.paths.root())
			.stdin(std::process::Stdio::null())
			.stdout(std::process::Stdio::null())
			.stderr(std::process::Stdio::null());
		std::os::unix::process::CommandExt::process_group(&mut cmd, 0);

		debug!(target = "bwsr.client", "spawning watchdog");
		cmd.spawn().map_err(|e| BwsrError::Bootstrap(format!("failed to spawn watchdog: {e}")))?;
		Ok(())
	}

	/// Poll the watchdog with a bounded retry budget. Exhausting it is a
	/// fatal bootstrap failure, never a silent retry-forever.
	pub async fn wait_until_ready(&self, attempts: usize, delay: Duration) -> Result<()> {
		for _ in 0..attempts {
			tokio::time::sleep(delay).await;
			if self.probe().await.is_ok() {
				return Ok(());
			}
		}
		Err(BwsrError::Bootstrap(format!(
			"watchdog did not become ready within {attempts} attempts"
		)))
	}

	async fn probe(&self) -> Result<()> {
		let _: WatchdogResponse =
			round_trip(&self.paths.watchdog_socket(), &WatchdogRequest::List, PROBE_TIMEOUT).await?;
		Ok(())
	}

	async fn send(&self, request: &WatchdogRequest) -> Result<WatchdogResponse> {
		let response: WatchdogResponse =
			round_trip(&self.paths.watchdog_socket(), request, REQUEST_TIMEOUT).await?;
		match response {
			WatchdogResponse::Failure { error, .. } => Err(BwsrError::Watchdog(error)),
			other => Ok(other),
		}
	}
}

fn unexpected(response: WatchdogResponse) -> BwsrError {
	BwsrError::Other(anyhow::anyhow!("unexpected watchdog response: {response:?}"))
}

#[cfg(test)]
mod tests {
	use super::*;
	use bwsr_protocol::{MessageReader, write_message};
	use tokio::net::UnixListener;

	fn client_on_tempdir() -> (tempfile::TempDir, Client) {
		let dir = tempfile::tempdir().unwrap();
		let paths = BwsrPaths::new(dir.path());
		paths.ensure_directories().unwrap();
		(dir, Client::new(paths))
	}

	/// Answer every connection with an empty instance list.
	fn serve_empty_list(listener: UnixListener) {
		tokio::spawn(async move {
			while let Ok((stream, _)) = listener.accept().await {
				let (read_half, mut write_half) = stream.into_split();
				let mut reader = MessageReader::new(read_half);
				let _: Option<WatchdogRequest> = reader.read_message().await.ok().flatten();
				let _ = write_message(&mut write_half, &WatchdogResponse::instances(vec![])).await;
			}
		});
	}

	#[tokio::test]
	async fn list_degrades_missing_watchdog_to_empty() {
		let (_dir, client) = client_on_tempdir();
		assert!(client.list().await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn other_verbs_surface_connection_errors() {
		let (_dir, client) = client_on_tempdir();
		let err = client.stop("happy-fox").await.unwrap_err();
		assert!(err.is_connection());
		let err = client.cdp(None).await.unwrap_err();
		assert!(err.is_connection());
	}

	#[tokio::test]
	async fn wait_until_ready_exhausts_its_budget() {
		let (_dir, client) = client_on_tempdir();
		let err = client.wait_until_ready(3, Duration::from_millis(10)).await.unwrap_err();
		assert!(matches!(err, BwsrError::Bootstrap(_)));
	}

	#[tokio::test]
	async fn wait_until_ready_succeeds_once_the_socket_answers() {
		let (_dir, client) = client_on_tempdir();
		let socket_path = client.paths.watchdog_socket();

		tokio::spawn(async move {
			tokio::time::sleep(Duration::from_millis(40)).await;
			serve_empty_list(UnixListener::bind(&socket_path).unwrap());
		});

		client.wait_until_ready(20, Duration::from_millis(10)).await.unwrap();
	}

	#[tokio::test]
	async fn list_uses_a_live_watchdog() {
		let (_dir, client) = client_on_tempdir();
		serve_empty_list(UnixListener::bind(client.paths.watchdog_socket()).unwrap());
		assert!(client.list().await.unwrap().is_empty());
	}
}
