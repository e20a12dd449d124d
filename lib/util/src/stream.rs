//! Adapters that turn byte origins into chunk streams.
//!
//! Everything that consumes bytes in this workspace takes a
//! [`ByteStream`], so files, stdin, http bodies and in-memory
//! fixtures are interchangeable.

use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use std::{io, pin::Pin};
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;
use tracing::debug;
use url::Url;

/// A boxed stream of byte chunks
pub type ByteStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// Read `reader` in chunks of at most `chunk_size` bytes
pub fn stream_from_reader<R>(reader: R, chunk_size: usize) -> ByteStream
where
	R: AsyncRead + Send + 'static,
{
	Box::pin(ReaderStream::with_capacity(reader, chunk_size))
}

/// Stream the given chunks, in order
pub fn stream_from_chunks(chunks: Vec<Vec<u8>>) -> ByteStream {
	Box::pin(futures::stream::iter(
		chunks.into_iter().map(|x| Ok(Bytes::from(x))),
	))
}

/// Start a GET request and stream its body.
///
/// Nothing past the response headers is downloaded until
/// the returned stream is polled.
pub async fn stream_from_url(url: Url) -> Result<ByteStream, reqwest::Error> {
	debug!(message = "Opening remote byte stream", url = url.as_str());
	let response = reqwest::get(url).await?.error_for_status()?;

	return Ok(Box::pin(response.bytes_stream().map_err(io::Error::other)));
}
