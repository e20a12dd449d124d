//! An on-demand reader over a streamed byte origin.

use bytes::{Buf, Bytes, BytesMut};
use futures::{Stream, StreamExt};
use std::io;
use tracing::trace;

use crate::cursor::{uint_from_bytes, Endian, ReadError};

/// Sequential peek/read/skip over a byte stream that is
/// fetched lazily, one chunk at a time.
///
/// A chunk is only pulled from the stream when a request can't be
/// satisfied from what we already have. Consumed bytes are dropped,
/// so this never holds much more than the largest single request
/// plus one chunk.
///
/// Every method that may fetch is async. These are the only points
/// where a metadata decode can suspend.
pub struct LazyByteSource<S> {
	stream: S,
	buffer: BytesMut,

	/// Set once `stream` has returned `None`.
	/// We never poll the stream again after that.
	exhausted: bool,

	/// Bytes consumed (read or skipped) so far
	position: u64,
}

impl<S> LazyByteSource<S>
where
	S: Stream<Item = io::Result<Bytes>> + Unpin,
{
	/// Wrap the given stream
	pub fn new(stream: S) -> Self {
		Self {
			stream,
			buffer: BytesMut::new(),
			exhausted: false,
			position: 0,
		}
	}

	/// The number of bytes consumed so far
	pub fn position(&self) -> u64 {
		self.position
	}

	/// Pull one chunk from the stream into our buffer.
	/// Returns `false` if the stream has ended.
	async fn fetch_chunk(&mut self) -> Result<bool, ReadError> {
		if self.exhausted {
			return Ok(false);
		}

		match self.stream.next().await {
			Some(chunk) => {
				let chunk = chunk?;
				trace!(
					message = "Fetched chunk",
					len = chunk.len(),
					buffered = self.buffer.len(),
					position = self.position
				);
				self.buffer.extend_from_slice(&chunk);
				return Ok(true);
			}

			None => {
				self.exhausted = true;
				return Ok(false);
			}
		}
	}

	/// Make sure at least `n` bytes are buffered.
	async fn fill(&mut self, n: usize) -> Result<(), ReadError> {
		while self.buffer.len() < n {
			if !self.fetch_chunk().await? {
				return Err(ReadError::UnexpectedEof {
					wanted: n,
					available: self.buffer.len(),
				});
			}
		}

		return Ok(());
	}

	/// Return the next `n` bytes without advancing.
	pub async fn peek(&mut self, n: usize) -> Result<&[u8], ReadError> {
		self.fill(n).await?;
		return Ok(&self.buffer[..n]);
	}

	/// Return and consume the next `n` bytes.
	pub async fn read(&mut self, n: usize) -> Result<Bytes, ReadError> {
		self.fill(n).await?;
		self.position += n as u64;
		return Ok(self.buffer.split_to(n).freeze());
	}

	/// Advance `n` bytes.
	///
	/// Skipped bytes are discarded chunk by chunk,
	/// they are never collected into one buffer.
	pub async fn skip(&mut self, n: usize) -> Result<(), ReadError> {
		let mut left = n;

		loop {
			let take = left.min(self.buffer.len());
			self.buffer.advance(take);
			self.position += take as u64;
			left -= take;

			if left == 0 {
				return Ok(());
			}

			if !self.fetch_chunk().await? {
				return Err(ReadError::UnexpectedEof {
					wanted: n,
					available: n - left,
				});
			}
		}
	}

	/// If true, there is nothing left to read.
	/// This may fetch a chunk to find out.
	pub async fn is_end(&mut self) -> Result<bool, ReadError> {
		while self.buffer.is_empty() {
			if !self.fetch_chunk().await? {
				return Ok(true);
			}
		}

		return Ok(false);
	}

	pub async fn read_u8(&mut self) -> Result<u8, ReadError> {
		return Ok(self.read(1).await?[0]);
	}

	pub async fn read_u16(&mut self, endian: Endian) -> Result<u16, ReadError> {
		let x = uint_from_bytes(&self.read(2).await?, endian);
		return Ok(x as u16);
	}

	/// Read a 24-bit unsigned integer into the low bits of a `u32`
	pub async fn read_u24(&mut self, endian: Endian) -> Result<u32, ReadError> {
		return Ok(uint_from_bytes(&self.read(3).await?, endian));
	}

	pub async fn read_u32(&mut self, endian: Endian) -> Result<u32, ReadError> {
		return Ok(uint_from_bytes(&self.read(4).await?, endian));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::stream::stream_from_chunks;
	use rand::Rng;

	fn random_chunks(data: &[u8], max_chunk: usize) -> Vec<Vec<u8>> {
		let mut out = Vec::new();
		let mut head = 0;
		while head < data.len() {
			let size = rand::thread_rng()
				.gen_range(1..=max_chunk)
				.min(data.len() - head);
			out.push(data[head..head + size].to_vec());
			head += size;
		}
		return out;
	}

	#[tokio::test]
	async fn reads_across_chunk_boundaries() {
		let data: Vec<u8> = (0..=255u8).collect();

		for _ in 0..20 {
			let mut s = LazyByteSource::new(stream_from_chunks(random_chunks(&data, 7)));

			assert_eq!(s.peek(3).await.unwrap(), &[0, 1, 2]);
			assert_eq!(s.read_u8().await.unwrap(), 0);
			assert_eq!(s.read_u16(Endian::Big).await.unwrap(), 0x0102);
			assert_eq!(s.read_u24(Endian::Little).await.unwrap(), 0x05_0403);
			assert_eq!(s.read_u32(Endian::Big).await.unwrap(), 0x0607_0809);

			s.skip(100).await.unwrap();
			assert_eq!(s.position(), 110);
			assert_eq!(&s.read(4).await.unwrap()[..], &[110, 111, 112, 113]);

			s.skip(142).await.unwrap();
			assert!(s.is_end().await.unwrap());
		}
	}

	#[tokio::test]
	async fn empty_chunks_are_ignored() {
		let chunks = vec![vec![], vec![1u8], vec![], vec![], vec![2u8]];
		let mut s = LazyByteSource::new(stream_from_chunks(chunks));

		assert!(!s.is_end().await.unwrap());
		assert_eq!(s.read_u16(Endian::Little).await.unwrap(), 0x0201);
		assert!(s.is_end().await.unwrap());
	}

	#[tokio::test]
	async fn short_source_reports_eof() {
		let mut s = LazyByteSource::new(stream_from_chunks(vec![vec![1, 2], vec![3]]));

		match s.read(5).await {
			Err(ReadError::UnexpectedEof { wanted, available }) => {
				assert_eq!(wanted, 5);
				assert_eq!(available, 3);
			}
			_ => panic!("expected UnexpectedEof"),
		}

		// Nothing was consumed by the failed read
		assert_eq!(s.position(), 0);
		assert!(matches!(
			s.skip(4).await,
			Err(ReadError::UnexpectedEof {
				wanted: 4,
				available: 3
			})
		));
	}

	#[tokio::test]
	async fn stream_errors_are_surfaced() {
		let stream = futures::stream::iter(vec![
			Ok(Bytes::from_static(b"ab")),
			Err(io::Error::other("connection reset")),
		]);
		let mut s = LazyByteSource::new(stream);

		assert_eq!(s.read_u8().await.unwrap(), b'a');
		assert!(matches!(s.read(2).await, Err(ReadError::IoError(_))));
	}
}
