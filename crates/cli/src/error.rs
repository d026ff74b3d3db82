use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BwsrError>;

#[derive(Debug, Error)]
pub enum BwsrError {
	#[error("profile '{0}' not found")]
	ProfileNotFound(String),

	#[error("profile '{0}' already exists")]
	ProfileExists(String),

	#[error("session '{0}' not found")]
	SessionNotFound(String),

	#[error("session '{0}' already exists")]
	SessionExists(String),

	#[error("invalid session name '{0}': use lowercase letters, digits and single hyphens")]
	InvalidSessionName(String),

	#[error("browser launch failed: {0}")]
	Launch(String),

	#[error("request timed out after {}ms", .0.as_millis())]
	Timeout(Duration),

	#[error("watchdog unreachable: {0}")]
	Connection(#[source] std::io::Error),

	#[error("failed to start watchdog: {0}")]
	Bootstrap(String),

	/// A structured `{ok: false}` response from the watchdog.
	#[error("{0}")]
	Watchdog(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Protocol(#[from] bwsr_protocol::CodecError),

	#[error("invalid profile document: {0}")]
	Yaml(#[from] serde_yaml::Error),

	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl BwsrError {
	/// Connection-level failures, including probe timeouts. The caller
	/// cannot tell an unreachable watchdog from a dead session, and must
	/// not try to.
	pub fn is_connection(&self) -> bool {
		matches!(self, BwsrError::Connection(_) | BwsrError::Timeout(_))
	}
}
