use std::path::{Path, PathBuf};

/// Filesystem layout for all bwsr state.
///
/// Rooted at `$BWSR_HOME` when set, otherwise `~/.bwsr`. Profiles are the
/// only durable state; socket files are advisory and recreated on bind.
#[derive(Debug, Clone)]
pub struct BwsrPaths {
	root: PathBuf,
}

impl BwsrPaths {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn resolve() -> Self {
		if let Ok(home) = std::env::var("BWSR_HOME") {
			return Self::new(home);
		}
		match dirs::home_dir() {
			Some(home) => Self::new(home.join(".bwsr")),
			None => {
				let uid = unsafe { libc::getuid() };
				Self::new(format!("/tmp/bwsr-{uid}"))
			}
		}
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn profiles(&self) -> PathBuf {
		self.root.join("profiles")
	}

	pub fn sockets(&self) -> PathBuf {
		self.root.join("sockets")
	}

	pub fn sessions(&self) -> PathBuf {
		self.root.join("sessions")
	}

	pub fn watchdog_socket(&self) -> PathBuf {
		self.sockets().join("watchdog.sock")
	}

	pub fn profile(&self, name: &str) -> PathBuf {
		self.profiles().join(format!("{name}.yaml"))
	}

	pub fn session_socket(&self, session: &str) -> PathBuf {
		self.sockets().join(format!("{session}.sock"))
	}

	/// Per-session browser user-data directory.
	pub fn session_data_dir(&self, session: &str) -> PathBuf {
		self.sessions().join(session)
	}

	pub fn ensure_directories(&self) -> std::io::Result<()> {
		std::fs::create_dir_all(self.profiles())?;
		std::fs::create_dir_all(self.sockets())?;
		Ok(())
	}
}
