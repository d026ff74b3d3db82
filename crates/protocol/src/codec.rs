use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

#[derive(Debug, Error)]
pub enum CodecError {
	#[error("failed to encode message: {0}")]
	Encode(#[source] serde_json::Error),

	#[error("failed to decode message: {0}")]
	Decode(#[source] serde_json::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

/// Encode one message as a newline-terminated JSON line.
pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, CodecError> {
	let mut buf = serde_json::to_vec(msg).map_err(CodecError::Encode)?;
	buf.push(b'\n');
	Ok(buf)
}

/// Decode one line. Tolerates the trailing newline and surrounding whitespace.
pub fn decode<T: DeserializeOwned>(line: &str) -> Result<T, CodecError> {
	serde_json::from_str(line.trim()).map_err(CodecError::Decode)
}

/// Write one message to a stream and flush it.
pub async fn write_message<W, T>(writer: &mut W, msg: &T) -> Result<(), CodecError>
where
	W: AsyncWrite + Unpin,
	T: Serialize,
{
	let buf = encode(msg)?;
	writer.write_all(&buf).await?;
	writer.flush().await?;
	Ok(())
}

/// Delimiter-buffered message reader.
///
/// A single socket read is not guaranteed to carry a whole message, so this
/// accumulates bytes until a `\n` is seen and only then decodes the line.
pub struct MessageReader<R> {
	inner: BufReader<R>,
	line: String,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
	pub fn new(reader: R) -> Self {
		Self { inner: BufReader::new(reader), line: String::new() }
	}

	/// Read the next message, or `None` on a clean EOF before any bytes.
	pub async fn read_message<T: DeserializeOwned>(&mut self) -> Result<Option<T>, CodecError> {
		self.line.clear();
		let bytes = self.inner.read_line(&mut self.line).await?;
		if bytes == 0 {
			return Ok(None);
		}
		decode(&self.line).map(Some)
	}
}
