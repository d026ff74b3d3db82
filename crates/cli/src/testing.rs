//! Test support: a launcher that fakes browser processes.
//!
//! Used by the unit tests here and the integration tests under `tests/`,
//! which is why this module is compiled unconditionally.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use async_trait::async_trait;

use crate::browser::{BrowserHandle, Launcher};
use crate::error::{BwsrError, Result};
use crate::profile::Profile;

/// Connection state of one stub browser, shared with the test so it can
/// simulate a crash by flipping the flag.
#[derive(Clone)]
pub struct StubSession {
	pub port: u16,
	connected: Arc<AtomicBool>,
}

impl StubSession {
	pub fn disconnect(&self) {
		self.connected.store(false, Ordering::SeqCst);
	}

	pub fn is_connected(&self) -> bool {
		self.connected.load(Ordering::SeqCst)
	}
}

/// A [`Launcher`] that spawns nothing. Every launch hands out the next fake
/// debug port and a handle whose health the test controls.
pub struct StubLauncher {
	next_port: AtomicU16,
	fail_next: std::sync::Mutex<Option<String>>,
	sessions: std::sync::Mutex<Vec<StubSession>>,
}

impl StubLauncher {
	pub fn new() -> Self {
		Self {
			next_port: AtomicU16::new(20000),
			fail_next: std::sync::Mutex::new(None),
			sessions: std::sync::Mutex::new(Vec::new()),
		}
	}

	/// Make the next launch fail with the given message.
	pub fn fail_next(&self, message: impl Into<String>) {
		*self.fail_next.lock().unwrap() = Some(message.into());
	}

	/// Launched sessions, in launch order.
	pub fn sessions(&self) -> Vec<StubSession> {
		self.sessions.lock().unwrap().clone()
	}
}

impl Default for StubLauncher {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Launcher for StubLauncher {
	async fn launch(
		&self,
		_executable: &Path,
		_profile: &Profile,
		_data_dir: &Path,
	) -> Result<Box<dyn BrowserHandle>> {
		if let Some(message) = self.fail_next.lock().unwrap().take() {
			return Err(BwsrError::Launch(message));
		}

		let port = self.next_port.fetch_add(1, Ordering::SeqCst);
		let connected = Arc::new(AtomicBool::new(true));
		self.sessions
			.lock()
			.unwrap()
			.push(StubSession { port, connected: Arc::clone(&connected) });

		Ok(Box::new(StubBrowser { port, connected }))
	}
}

struct StubBrowser {
	port: u16,
	connected: Arc<AtomicBool>,
}

#[async_trait]
impl BrowserHandle for StubBrowser {
	fn debug_port(&self) -> u16 {
		self.port
	}

	async fn is_connected(&mut self) -> bool {
		self.connected.load(Ordering::SeqCst)
	}

	async fn close(&mut self) {
		self.connected.store(false, Ordering::SeqCst);
	}
}
