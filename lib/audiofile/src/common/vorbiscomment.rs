//! Decode Vorbis comment blocks

use base64::Engine;
use ferry_util::cursor::{ByteCursor, Endian, ReadError};
use smartstring::{LazyCompact, SmartString};
use std::string::FromUtf8Error;
use thiserror::Error;

use super::tagtype::TagType;
use crate::flac::blocks::{FlacMetablockDecode, FlacPictureBlock};

#[derive(Debug, Error)]
#[expect(missing_docs)]
pub enum VorbisCommentDecodeError {
	/// The comment ended before a length-prefixed field did
	#[error("malformed comment data")]
	MalformedData(#[from] ReadError),

	/// We tried to decode a string, but got invalid data
	#[error("string decode error while reading vorbis comments")]
	FailedStringDecode(#[from] FromUtf8Error),

	/// The given comment string isn't `KEY=value`
	#[error("malformed comment string `{0}`")]
	MalformedCommentString(String),

	/// We tried to decode picture data, but it was malformed.
	#[error("malformed picture data")]
	MalformedPicture,
}

/// A decoded vorbis comment block
#[derive(Debug)]
pub struct VorbisComment {
	/// This comment's vendor string
	pub vendor: SmartString<LazyCompact>,

	/// List of (tag, value)
	/// Repeated tags are allowed!
	pub comments: Vec<(TagType, SmartString<LazyCompact>)>,

	/// Pictures stored as `METADATA_BLOCK_PICTURE` comments
	pub pictures: Vec<FlacPictureBlock>,
}

/// Read one 32-bit little-endian length and the string that follows it
fn read_string(d: &mut ByteCursor<'_>) -> Result<String, VorbisCommentDecodeError> {
	let length = d.read_u32(Endian::Little)?;
	let text = d.read(length as usize)?;
	return Ok(String::from_utf8(text.to_vec())?);
}

impl VorbisComment {
	/// Try to decode the given data as a vorbis comment block
	pub fn decode(data: &[u8]) -> Result<Self, VorbisCommentDecodeError> {
		let mut d = ByteCursor::new(data);

		let vendor = read_string(&mut d)?;
		let n_comments = d.read_u32(Endian::Little)?;

		let mut comments = Vec::new();
		let mut pictures = Vec::new();
		for _ in 0..n_comments {
			let comment = read_string(&mut d)?;
			let (var, val) = comment
				.split_once('=')
				.ok_or_else(|| VorbisCommentDecodeError::MalformedCommentString(comment.clone()))?;

			// Empty values carry no information
			if val.is_empty() {
				continue;
			}

			if var.eq_ignore_ascii_case("METADATA_BLOCK_PICTURE") {
				#[expect(clippy::map_err_ignore)]
				let raw = base64::prelude::BASE64_STANDARD
					.decode(val)
					.map_err(|_| VorbisCommentDecodeError::MalformedPicture)?;

				#[expect(clippy::map_err_ignore)]
				pictures.push(
					FlacPictureBlock::decode(&raw)
						.map_err(|_| VorbisCommentDecodeError::MalformedPicture)?,
				);
			} else {
				comments.push((TagType::from_vorbis_key(var), val.into()));
			}
		}

		Ok(Self {
			vendor: vendor.into(),
			comments,
			pictures,
		})
	}

	/// Get the first value of the given tag, if any
	pub fn get(&self, tag: &TagType) -> Option<&str> {
		self.comments
			.iter()
			.find(|(t, _)| t == tag)
			.map(|(_, v)| v.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::flac::tests::{comment_payload, picture_payload};

	#[test]
	fn decode_tags() {
		let data = comment_payload(
			"reference libFLAC 1.4.3",
			&["TITLE=Blue in Green", "artist=Miles Davis", "Date=1959", "EMPTY=", "x-custom=1"],
		);

		let c = VorbisComment::decode(&data).unwrap();
		assert_eq!(c.vendor, "reference libFLAC 1.4.3");
		assert_eq!(c.comments.len(), 4);
		assert_eq!(c.get(&TagType::TrackTitle), Some("Blue in Green"));
		assert_eq!(c.get(&TagType::TrackArtist), Some("Miles Davis"));
		assert_eq!(c.get(&TagType::ReleaseDate), Some("1959"));
		assert_eq!(c.get(&TagType::Other("x-custom".into())), Some("1"));
		assert!(c.pictures.is_empty());
	}

	#[test]
	fn values_may_contain_equals() {
		let data = comment_payload("v", &["COMMENT=a=b=c"]);
		let c = VorbisComment::decode(&data).unwrap();
		assert_eq!(c.get(&TagType::Comment), Some("a=b=c"));
	}

	#[test]
	fn embedded_picture() {
		let pic = picture_payload(3, "image/png", "cover", &[1, 2, 3, 4]);
		let field = format!(
			"METADATA_BLOCK_PICTURE={}",
			base64::prelude::BASE64_STANDARD.encode(&pic)
		);
		let data = comment_payload("v", &[&field]);

		let c = VorbisComment::decode(&data).unwrap();
		assert!(c.comments.is_empty());
		assert_eq!(c.pictures.len(), 1);
		assert_eq!(c.pictures[0].description, "cover");
		assert_eq!(c.pictures[0].img_data, vec![1, 2, 3, 4]);
	}

	#[test]
	fn missing_separator() {
		let data = comment_payload("v", &["NOVALUE"]);
		assert!(matches!(
			VorbisComment::decode(&data),
			Err(VorbisCommentDecodeError::MalformedCommentString(x)) if x == "NOVALUE"
		));
	}

	#[test]
	fn truncated_comment() {
		let mut data = comment_payload("v", &["TITLE=abc"]);
		data.truncate(data.len() - 2);
		assert!(matches!(
			VorbisComment::decode(&data),
			Err(VorbisCommentDecodeError::MalformedData(_))
		));
	}
}
