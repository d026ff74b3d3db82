use serde::{Deserialize, Serialize};

/// Requests accepted by the watchdog control socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WatchdogRequest {
	/// Launch a new session from a named profile. An empty session name asks
	/// the watchdog to generate one.
	Start {
		profile: String,
		#[serde(default)]
		session: String,
	},
	Stop {
		session: String,
	},
	StopAll,
	List,
	/// Resolve the debug port of a session (any session when unnamed).
	Cdp {
		#[serde(default, skip_serializing_if = "Option::is_none")]
		session: Option<String>,
	},
}

/// Watchdog responses. On the wire these are distinguished by shape, not by
/// a tag: every success carries `ok: true` plus the verb-specific fields,
/// and failures are `{ok: false, error}`. Variant order matters for the
/// untagged deserializer: the most field-rich shapes come first so that a
/// sparse shape never shadows a richer one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WatchdogResponse {
	Started {
		ok: bool,
		session: String,
		#[serde(rename = "cdpPort")]
		cdp_port: u16,
	},
	Instances {
		ok: bool,
		instances: Vec<InstanceInfo>,
	},
	Endpoint {
		ok: bool,
		#[serde(rename = "cdpPort")]
		cdp_port: u16,
	},
	Failure {
		ok: bool,
		error: String,
	},
	Ok {
		ok: bool,
	},
}

impl WatchdogResponse {
	pub fn started(session: impl Into<String>, cdp_port: u16) -> Self {
		Self::Started { ok: true, session: session.into(), cdp_port }
	}

	pub fn instances(instances: Vec<InstanceInfo>) -> Self {
		Self::Instances { ok: true, instances }
	}

	pub fn endpoint(cdp_port: u16) -> Self {
		Self::Endpoint { ok: true, cdp_port }
	}

	pub fn ok() -> Self {
		Self::Ok { ok: true }
	}

	pub fn failure(error: impl Into<String>) -> Self {
		Self::Failure { ok: false, error: error.into() }
	}

	pub fn is_ok(&self) -> bool {
		!matches!(self, Self::Failure { .. })
	}
}

/// Requests accepted by a session wrapper's control socket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WrapperRequest {
	Ping,
	Shutdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WrapperResponse {
	#[serde(rename_all = "camelCase")]
	Pong {
		cdp_port: u16,
		status: HealthStatus,
		/// RFC 3339 timestamp, refreshed by the ping itself.
		last_used: String,
	},
	ShutdownAck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
	Healthy,
	Unhealthy,
}

impl HealthStatus {
	pub fn from_connected(connected: bool) -> Self {
		if connected { Self::Healthy } else { Self::Unhealthy }
	}
}

/// One tracked session as reported by `list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceInfo {
	pub session: String,
	pub profile: String,
	pub cdp_port: u16,
	pub last_used: String,
	/// When the watchdog last heard a pong from this session.
	pub last_pulse: String,
	pub status: HealthStatus,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn requests_are_tagged_by_type() {
		let json = serde_json::to_value(&WatchdogRequest::StopAll).unwrap();
		assert_eq!(json, serde_json::json!({"type": "stopAll"}));

		let json = serde_json::to_value(&WatchdogRequest::Start {
			profile: "default".into(),
			session: String::new(),
		})
		.unwrap();
		assert_eq!(json["type"], "start");
		assert_eq!(json["profile"], "default");
	}

	#[test]
	fn failure_decodes_before_bare_ok() {
		let res: WatchdogResponse = serde_json::from_str(r#"{"ok":false,"error":"boom"}"#).unwrap();
		assert_eq!(res, WatchdogResponse::failure("boom"));
		assert!(!res.is_ok());
	}

	#[test]
	fn bare_ok_decodes_as_ok() {
		let res: WatchdogResponse = serde_json::from_str(r#"{"ok":true}"#).unwrap();
		assert_eq!(res, WatchdogResponse::ok());
	}

	#[test]
	fn started_keeps_its_port_field_name() {
		let res = WatchdogResponse::started("happy-fox", 9222);
		let json = serde_json::to_value(&res).unwrap();
		assert_eq!(json["cdpPort"], 9222);
		assert_eq!(json["session"], "happy-fox");
		assert_eq!(json["ok"], true);
	}

	#[test]
	fn pong_round_trips() {
		let pong = WrapperResponse::Pong {
			cdp_port: 9333,
			status: HealthStatus::Healthy,
			last_used: "2026-08-30T00:00:00Z".into(),
		};
		let json = serde_json::to_string(&pong).unwrap();
		assert!(json.contains(r#""type":"pong""#));
		assert!(json.contains(r#""status":"healthy""#));
		let back: WrapperResponse = serde_json::from_str(&json).unwrap();
		assert_eq!(back, pong);
	}
}
