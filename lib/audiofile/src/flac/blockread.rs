//! Read flac metadata blocks from a lazily-fetched stream.

use bytes::Bytes;
use ferry_util::{cursor::ReadError, source::LazyByteSource};
use futures::Stream;
use std::io;
use tracing::trace;

use super::{
	blocks::{FlacMetablockHeader, FlacRawBlock},
	errors::FlacDecodeError,
};

/// Every flac file starts with these bytes
pub const FLAC_SIGNATURE: [u8; 4] = *b"fLaC";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
	/// We haven't checked the signature yet
	Start,

	/// We're reading metadata blocks
	Blocks,

	/// We've read the last block, hit the end of the stream,
	/// or failed. We'll never read again.
	Done,
}

/// Pulls one flac metadata block at a time from a byte stream.
///
/// Only the block being read is ever buffered.
/// Audio frames after the last metadata block are never fetched
/// (apart from whatever shares a chunk with the last block).
pub struct FlacBlockReader<S> {
	source: LazyByteSource<S>,
	state: ReaderState,
}

impl<S> FlacBlockReader<S>
where
	S: Stream<Item = io::Result<Bytes>> + Unpin,
{
	/// Make a new reader over the given stream.
	/// `stream` should start at the first byte of a flac file.
	pub fn new(stream: S) -> Self {
		Self::from_source(LazyByteSource::new(stream))
	}

	/// Make a new reader over an existing source
	pub fn from_source(source: LazyByteSource<S>) -> Self {
		Self {
			source,
			state: ReaderState::Start,
		}
	}

	/// The number of bytes we've consumed from the stream
	pub fn position(&self) -> u64 {
		self.source.position()
	}

	/// If true, this reader will not return any more blocks
	pub fn is_done(&self) -> bool {
		self.state == ReaderState::Done
	}

	/// Give back the underlying source.
	/// If we're done, it is positioned right after the last block we read.
	pub fn into_source(self) -> LazyByteSource<S> {
		self.source
	}

	/// Consume and check the four signature bytes.
	/// We never read past them if they're wrong.
	async fn check_signature(&mut self) -> Result<(), FlacDecodeError> {
		let sig = match self.source.read(FLAC_SIGNATURE.len()).await {
			Ok(x) => x,
			Err(ReadError::UnexpectedEof { .. }) => return Err(FlacDecodeError::InvalidFormat),
			Err(e) => return Err(e.into()),
		};

		if sig[..] != FLAC_SIGNATURE {
			return Err(FlacDecodeError::InvalidFormat);
		}

		return Ok(());
	}

	async fn read_block(&mut self) -> Result<Option<FlacRawBlock>, FlacDecodeError> {
		if self.state == ReaderState::Start {
			self.check_signature().await?;
			self.state = ReaderState::Blocks;
		}

		if self.state == ReaderState::Done || self.source.is_end().await? {
			self.state = ReaderState::Done;
			return Ok(None);
		}

		let header = {
			let h = self.source.read(4).await?;
			FlacMetablockHeader::decode([h[0], h[1], h[2], h[3]])
		};

		let data = self.source.read(header.length as usize).await?;

		trace!(
			message = "Read flac metablock",
			block_type = %header.block_type,
			length = header.length,
			is_last = header.is_last,
			position = self.source.position()
		);

		if header.is_last {
			self.state = ReaderState::Done;
		}

		return Ok(Some(FlacRawBlock {
			id: header.block_type.to_id(),
			is_last: header.is_last,
			data,
		}));
	}

	/// Read the next metadata block.
	///
	/// Returns `None` after the block with the last-block flag,
	/// or if the stream ends between blocks.
	/// Errors are fatal: once one is returned, this reader is done.
	pub async fn next_block(&mut self) -> Result<Option<FlacRawBlock>, FlacDecodeError> {
		let res = self.read_block().await;
		if res.is_err() {
			self.state = ReaderState::Done;
		}
		return res;
	}
}
