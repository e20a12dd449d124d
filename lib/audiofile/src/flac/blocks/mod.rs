//! Decoders for flac metadata blocks

mod header;
pub use header::{FlacMetablockHeader, FlacMetablockType};

mod streaminfo;
pub use streaminfo::FlacStreaminfoBlock;

mod picture;
pub use picture::{DataUrlFactory, FlacPictureBlock, PictureUrlFactory};

mod comment;
pub use comment::FlacCommentBlock;

use bytes::Bytes;

use super::errors::FlacDecodeError;

/// A decode implementation for a
/// flac metadata block
pub trait FlacMetablockDecode: Sized {
	/// Try to decode this block from bytes.
	/// `data` should NOT include the metablock header.
	fn decode(data: &[u8]) -> Result<Self, FlacDecodeError>;
}

/// A metadata block, exactly as it was read
#[derive(Debug, Clone)]
pub struct FlacRawBlock {
	/// This block's 7-bit type id
	pub id: u8,

	/// If true, this was the last metadata block
	pub is_last: bool,

	/// This block's payload, without its header
	pub data: Bytes,
}

impl FlacRawBlock {
	/// The length of this block's payload
	pub fn len(&self) -> usize {
		self.data.len()
	}

	/// If true, this block has no payload
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// The type of this block
	pub fn block_type(&self) -> FlacMetablockType {
		FlacMetablockType::from_id(self.id)
	}
}

/// A classified flac metadata block
#[derive(Debug)]
#[expect(missing_docs)]
pub enum FlacBlock {
	Streaminfo(FlacStreaminfoBlock),
	Picture(FlacPictureBlock),
	Comment(FlacCommentBlock),

	/// Any block we don't decode.
	/// These are kept verbatim.
	Other(FlacRawBlock),
}

impl FlacBlock {
	/// Classify a raw block by its type id
	pub fn decode(raw: FlacRawBlock) -> Result<Self, FlacDecodeError> {
		Ok(match raw.block_type() {
			FlacMetablockType::Streaminfo => {
				FlacBlock::Streaminfo(FlacStreaminfoBlock::decode(&raw.data)?)
			}
			FlacMetablockType::Picture => FlacBlock::Picture(FlacPictureBlock::decode(&raw.data)?),
			FlacMetablockType::VorbisComment => {
				FlacBlock::Comment(FlacCommentBlock { data: raw.data })
			}
			_ => FlacBlock::Other(raw),
		})
	}

	/// The type of this block
	pub fn block_type(&self) -> FlacMetablockType {
		match self {
			Self::Streaminfo(_) => FlacMetablockType::Streaminfo,
			Self::Picture(_) => FlacMetablockType::Picture,
			Self::Comment(_) => FlacMetablockType::VorbisComment,
			Self::Other(b) => b.block_type(),
		}
	}
}
