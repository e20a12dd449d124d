//! FLAC metablock headers

use std::fmt::Display;

/// A type of flac metadata block
#[expect(missing_docs)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FlacMetablockType {
	Streaminfo,
	Padding,
	Application,
	Seektable,
	VorbisComment,
	Cuesheet,
	Picture,

	/// A type id we don't know about (7..=127).
	/// These are kept, never rejected.
	Reserved(u8),
}

impl FlacMetablockType {
	/// Map a 7-bit block type id to a [`FlacMetablockType`]
	pub fn from_id(id: u8) -> Self {
		match id & 0b0111_1111 {
			0 => FlacMetablockType::Streaminfo,
			1 => FlacMetablockType::Padding,
			2 => FlacMetablockType::Application,
			3 => FlacMetablockType::Seektable,
			4 => FlacMetablockType::VorbisComment,
			5 => FlacMetablockType::Cuesheet,
			6 => FlacMetablockType::Picture,
			x => FlacMetablockType::Reserved(x),
		}
	}

	/// The 7-bit type id of this block type
	pub fn to_id(&self) -> u8 {
		match self {
			FlacMetablockType::Streaminfo => 0,
			FlacMetablockType::Padding => 1,
			FlacMetablockType::Application => 2,
			FlacMetablockType::Seektable => 3,
			FlacMetablockType::VorbisComment => 4,
			FlacMetablockType::Cuesheet => 5,
			FlacMetablockType::Picture => 6,
			FlacMetablockType::Reserved(x) => *x,
		}
	}
}

impl Display for FlacMetablockType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Streaminfo => write!(f, "STREAMINFO"),
			Self::Padding => write!(f, "PADDING"),
			Self::Application => write!(f, "APPLICATION"),
			Self::Seektable => write!(f, "SEEKTABLE"),
			Self::VorbisComment => write!(f, "VORBIS_COMMENT"),
			Self::Cuesheet => write!(f, "CUESHEET"),
			Self::Picture => write!(f, "PICTURE"),
			Self::Reserved(x) => write!(f, "RESERVED({x})"),
		}
	}
}

/// The header of a flac metadata block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlacMetablockHeader {
	/// The type of block this is
	pub block_type: FlacMetablockType,

	/// The length of this block, in bytes
	/// (not including this header)
	pub length: u32,

	/// If true, this is the last metadata block
	pub is_last: bool,
}

impl FlacMetablockHeader {
	/// Decode a four-byte metablock header.
	/// Every bit pattern is a valid header.
	pub fn decode(header: [u8; 4]) -> Self {
		// Last-metadata-block flag:
		// '1' if this block is the last metadata block before the audio blocks,
		// '0' otherwise.
		let is_last = header[0] & 0b1000_0000 == 0b1000_0000;

		return Self {
			block_type: FlacMetablockType::from_id(header[0] & 0b0111_1111),
			length: u32::from_be_bytes([0, header[1], header[2], header[3]]),
			is_last,
		};
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn type_mask_is_uniform() {
		// Same id whether or not the last flag is set
		for id in 0..=127u8 {
			let a = FlacMetablockHeader::decode([id, 0, 0, 0]);
			let b = FlacMetablockHeader::decode([id | 0x80, 0, 0, 0]);
			assert_eq!(a.block_type, b.block_type);
			assert_eq!(a.block_type.to_id(), id);
			assert!(!a.is_last);
			assert!(b.is_last);
		}

		let h = FlacMetablockHeader::decode([0xFF, 0x01, 0x02, 0x03]);
		assert_eq!(h.block_type, FlacMetablockType::Reserved(0x7F));
		assert_eq!(h.length, 0x01_0203);
	}
}
