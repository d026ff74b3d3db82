//! Wire protocol shared by the bwsr control sockets.
//!
//! Two request/response pairs ride on the same encoding: the client talks
//! to the watchdog (`WatchdogRequest`/`WatchdogResponse`) and the watchdog
//! talks to each session wrapper (`WrapperRequest`/`WrapperResponse`).
//! Every message is a single JSON value terminated by a newline, and every
//! connection carries exactly one request and one response.

mod codec;
mod messages;

pub use codec::{CodecError, MessageReader, decode, encode, write_message};
pub use messages::{
	HealthStatus, InstanceInfo, WatchdogRequest, WatchdogResponse, WrapperRequest, WrapperResponse,
};
