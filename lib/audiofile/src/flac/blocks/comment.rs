use bytes::Bytes;
use std::fmt::Debug;

use super::FlacMetablockDecode;
use crate::{
	common::vorbiscomment::{VorbisComment, VorbisCommentDecodeError},
	flac::errors::FlacDecodeError,
};

/// A vorbis comment metablock in a flac file.
///
/// This only recognizes the block. The comment itself is decoded
/// on request by [`FlacCommentBlock::comment`], so a malformed
/// comment never stops a metadata decode.
#[derive(Clone)]
pub struct FlacCommentBlock {
	/// The raw vorbis comment stored inside this block
	pub data: Bytes,
}

impl Debug for FlacCommentBlock {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FlacCommentBlock")
			.field("len", &self.data.len())
			.finish()
	}
}

impl FlacCommentBlock {
	/// Decode the vorbis comment in this block
	pub fn comment(&self) -> Result<VorbisComment, VorbisCommentDecodeError> {
		VorbisComment::decode(&self.data)
	}
}

impl FlacMetablockDecode for FlacCommentBlock {
	fn decode(data: &[u8]) -> Result<Self, FlacDecodeError> {
		Ok(Self {
			data: Bytes::copy_from_slice(data),
		})
	}
}
