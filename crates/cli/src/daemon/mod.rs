//! The watchdog daemon and its client side.
//!
//! Both protocols (client-to-watchdog and watchdog-to-wrapper) are single
//! round trips over a Unix-domain socket: connect, write one message, read
//! one message, close.

pub mod client;
pub mod server;

pub use client::Client;
pub use server::{Watchdog, WatchdogConfig};

use std::path::Path;
use std::time::Duration;

use bwsr_protocol::{CodecError, MessageReader, write_message};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::net::UnixStream;

use crate::error::{BwsrError, Result};

/// One request/response exchange against a control socket, bounded by
/// `bound`. A timeout reads the same as a connection failure: either way
/// the peer is gone.
pub(crate) async fn round_trip<Req, Res>(socket_path: &Path, request: &Req, bound: Duration) -> Result<Res>
where
	Req: Serialize,
	Res: DeserializeOwned,
{
	let exchange = async {
		let stream = UnixStream::connect(socket_path).await.map_err(BwsrError::Connection)?;
		let (read_half, mut write_half) = stream.into_split();
		write_message(&mut write_half, request).await.map_err(lift)?;

		let mut reader = MessageReader::new(read_half);
		reader.read_message().await.map_err(lift)?.ok_or_else(|| {
			BwsrError::Connection(std::io::Error::new(
				std::io::ErrorKind::UnexpectedEof,
				"connection closed before a response arrived",
			))
		})
	};

	tokio::time::timeout(bound, exchange).await.map_err(|_| BwsrError::Timeout(bound))?
}

/// I/O failures inside the codec are connection failures to us.
fn lift(err: CodecError) -> BwsrError {
	match err {
		CodecError::Io(io) => BwsrError::Connection(io),
		other => BwsrError::Protocol(other),
	}
}
