//! Decode a flac file's metadata into typed blocks.

use bytes::Bytes;
use ferry_util::cursor::{ByteCursor, ReadError};
use futures::Stream;
use std::io;
use tracing::debug;

use super::{
	blockread::{FlacBlockReader, FLAC_SIGNATURE},
	blocks::{FlacBlock, FlacMetablockHeader, FlacRawBlock},
	errors::FlacDecodeError,
};

/// The error we return for a file with a signature but no blocks.
/// A successful decode always has at least one block.
fn no_blocks_error() -> FlacDecodeError {
	FlacDecodeError::UnexpectedEof {
		wanted: 4,
		available: 0,
	}
}

fn log_block(index: usize, block: &FlacBlock, raw_len: usize, is_last: bool) {
	debug!(
		message = "Decoded flac block",
		index,
		block_type = %block.block_type(),
		length = raw_len,
		is_last
	);
}

/// Classifies the blocks of a [`FlacBlockReader`].
///
/// Blocks come out in file order. Unknown block types
/// are returned as [`FlacBlock::Other`], never as errors.
pub struct FlacMetadataDecoder<S> {
	reader: FlacBlockReader<S>,
	blocks_read: usize,
}

impl<S> FlacMetadataDecoder<S>
where
	S: Stream<Item = io::Result<Bytes>> + Unpin,
{
	/// Decode the flac file in `stream`
	pub fn new(stream: S) -> Self {
		Self::from_reader(FlacBlockReader::new(stream))
	}

	/// Decode the blocks of an existing reader
	pub fn from_reader(reader: FlacBlockReader<S>) -> Self {
		Self {
			reader,
			blocks_read: 0,
		}
	}

	/// Decode the next block.
	/// Returns `None` once the last block has been decoded.
	pub async fn next(&mut self) -> Result<Option<FlacBlock>, FlacDecodeError> {
		let raw = match self.reader.next_block().await? {
			Some(x) => x,
			None => {
				if self.blocks_read == 0 {
					return Err(no_blocks_error());
				}
				return Ok(None);
			}
		};

		let (len, is_last) = (raw.len(), raw.is_last);
		let block = FlacBlock::decode(raw)?;
		log_block(self.blocks_read, &block, len, is_last);
		self.blocks_read += 1;

		return Ok(Some(block));
	}

	/// Decode every metadata block, in order
	pub async fn decode_all(mut self) -> Result<Vec<FlacBlock>, FlacDecodeError> {
		let mut out = Vec::new();
		while let Some(b) = self.next().await? {
			out.push(b);
		}
		return Ok(out);
	}

	/// Give back the underlying reader
	pub fn into_reader(self) -> FlacBlockReader<S> {
		self.reader
	}
}

/// Decode the metadata of a flac file we already have in memory.
///
/// This is the same as a [`FlacMetadataDecoder`] over one chunk,
/// but never suspends.
pub fn decode_flac_bytes(data: &[u8]) -> Result<Vec<FlacBlock>, FlacDecodeError> {
	let mut d = ByteCursor::new(data);

	match d.read(FLAC_SIGNATURE.len()) {
		Ok(sig) if sig == FLAC_SIGNATURE => {}
		Ok(_) | Err(ReadError::UnexpectedEof { .. }) => {
			return Err(FlacDecodeError::InvalidFormat)
		}
		Err(e) => return Err(e.into()),
	}

	let mut out = Vec::new();
	while !d.is_end() {
		let header = {
			let h = d.read(4)?;
			FlacMetablockHeader::decode([h[0], h[1], h[2], h[3]])
		};

		let raw = FlacRawBlock {
			id: header.block_type.to_id(),
			is_last: header.is_last,
			data: Bytes::copy_from_slice(d.read(header.length as usize)?),
		};

		let block = FlacBlock::decode(raw)?;
		log_block(out.len(), &block, header.length as usize, header.is_last);
		out.push(block);

		if header.is_last {
			break;
		}
	}

	if out.is_empty() {
		return Err(no_blocks_error());
	}

	return Ok(out);
}
