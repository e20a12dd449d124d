use base64::Engine;
use ferry_util::{
	cursor::{ByteCursor, Endian},
	MimeType,
};
use std::fmt::Debug;
use tracing::{debug, warn};

use super::FlacMetablockDecode;
use crate::{common::picturetype::PictureType, flac::errors::FlacDecodeError};

/// Something that can turn picture data into a url we can show to a user.
///
/// Urls may hold resources (a browser object url, a temporary file)
/// that are only released by [`PictureUrlFactory::revoke`].
pub trait PictureUrlFactory {
	/// Make a url that displays the given image
	fn create(&self, mime: &MimeType, data: &[u8]) -> String;

	/// Release a url made by `create`.
	/// The url must not be used afterwards.
	fn revoke(&self, url: &str);
}

/// Makes self-contained `data:` urls.
/// These hold no resources, so `revoke` does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct DataUrlFactory;

impl PictureUrlFactory for DataUrlFactory {
	fn create(&self, mime: &MimeType, data: &[u8]) -> String {
		// Linked images store their url as image data
		if *mime == MimeType::LinkedImage {
			return String::from_utf8_lossy(data).into_owned();
		}

		format!(
			"data:{mime};base64,{}",
			base64::prelude::BASE64_STANDARD.encode(data)
		)
	}

	fn revoke(&self, _url: &str) {}
}

/// A picture metablock in a flac file
pub struct FlacPictureBlock {
	/// The type of this picture
	pub picture_type: PictureType,

	/// The format of this picture
	pub mime: MimeType,

	/// The description of this picture
	pub description: String,

	/// The width of this picture, in px
	pub width: u32,

	/// The height of this picture, in px
	pub height: u32,

	/// The bit depth of this picture
	pub bit_depth: u32,

	/// The color count of this picture (if indexed)
	pub color_count: u32,

	/// The image data length this block claims to have.
	/// This is informational: `img_data` is always the rest of the block.
	pub declared_len: u32,

	/// The image data
	pub img_data: Vec<u8>,

	/// The display url we've handed out, if any
	display_url: Option<String>,
}

impl Debug for FlacPictureBlock {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FlacPicture")
			.field("type", &self.picture_type)
			.field("mime", &self.mime)
			.field("description", &self.description)
			.field("len", &self.img_data.len())
			.finish()
	}
}

impl FlacPictureBlock {
	/// Get a url that displays this picture.
	///
	/// The url is made on the first call and reused after that.
	/// It stays valid until [`FlacPictureBlock::release_url`] is called,
	/// which must be done with the same factory.
	pub fn display_url(&mut self, factory: &impl PictureUrlFactory) -> &str {
		if self.display_url.is_none() {
			debug!(
				message = "Creating picture display url",
				mime = %self.mime,
				len = self.img_data.len()
			);
		}

		return self
			.display_url
			.get_or_insert_with(|| factory.create(&self.mime, &self.img_data))
			.as_str();
	}

	/// If true, this picture holds a display url
	pub fn has_display_url(&self) -> bool {
		self.display_url.is_some()
	}

	/// Release this picture's display url.
	/// Returns `false` if there was nothing to release.
	pub fn release_url(&mut self, factory: &impl PictureUrlFactory) -> bool {
		match self.display_url.take() {
			Some(url) => {
				factory.revoke(&url);
				return true;
			}
			None => return false,
		}
	}
}

impl Drop for FlacPictureBlock {
	fn drop(&mut self) {
		if self.display_url.is_some() {
			warn!(
				message = "Picture dropped without releasing its display url",
				mime = %self.mime,
				description = self.description.as_str()
			);
		}
	}
}

impl FlacMetablockDecode for FlacPictureBlock {
	fn decode(data: &[u8]) -> Result<Self, FlacDecodeError> {
		let mut d = ByteCursor::new(data);

		let picture_type = PictureType::from_idx(d.read_u32(Endian::Big)?);

		// Image format
		let mime = {
			let mime_length = d.read_u32(Endian::Big)?;
			let mime = d.read(mime_length as usize)?;
			MimeType::from(String::from_utf8(mime.to_vec())?)
		};

		// Image description
		let description = {
			let desc_length = d.read_u32(Endian::Big)?;
			let desc = d.read(desc_length as usize)?;
			String::from_utf8(desc.to_vec())?
		};

		let width = d.read_u32(Endian::Big)?;
		let height = d.read_u32(Endian::Big)?;
		let bit_depth = d.read_u32(Endian::Big)?;

		// Color count for indexed images
		let color_count = d.read_u32(Endian::Big)?;

		let declared_len = d.read_u32(Endian::Big)?;
		let img_data = d.read_rest().to_vec();

		Ok(Self {
			picture_type,
			mime,
			description,
			width,
			height,
			bit_depth,
			color_count,
			declared_len,
			img_data,
			display_url: None,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::flac::tests::picture_payload;
	use std::cell::RefCell;

	/// Hands out numbered urls and remembers which are live
	#[derive(Default)]
	struct CountingFactory {
		made: RefCell<usize>,
		live: RefCell<Vec<String>>,
	}

	impl PictureUrlFactory for CountingFactory {
		fn create(&self, _mime: &MimeType, _data: &[u8]) -> String {
			*self.made.borrow_mut() += 1;
			let url = format!("blob:picture-{}", self.made.borrow());
			self.live.borrow_mut().push(url.clone());
			url
		}

		fn revoke(&self, url: &str) {
			self.live.borrow_mut().retain(|x| x != url);
		}
	}

	#[test]
	fn decode_picture() {
		let data = picture_payload(3, "image/jpeg", "Front", &[0xFF, 0xD8, 0xFF, 0xE0]);
		let p = FlacPictureBlock::decode(&data).unwrap();

		assert_eq!(p.picture_type, PictureType::FrontCover);
		assert_eq!(p.mime, MimeType::Jpg);
		assert_eq!(p.description, "Front");
		assert_eq!(p.width, 500);
		assert_eq!(p.height, 400);
		assert_eq!(p.bit_depth, 24);
		assert_eq!(p.color_count, 0);
		assert_eq!(p.declared_len, 4);
		assert_eq!(p.img_data, vec![0xFF, 0xD8, 0xFF, 0xE0]);
	}

	#[test]
	fn declared_length_is_not_a_bound() {
		let mut data = picture_payload(0, "image/png", "", &[1, 2, 3]);
		// Claim one byte, provide three
		let n = data.len();
		data[n - 7..n - 3].copy_from_slice(&1u32.to_be_bytes());

		let p = FlacPictureBlock::decode(&data).unwrap();
		assert_eq!(p.declared_len, 1);
		assert_eq!(p.img_data, vec![1, 2, 3]);
	}

	#[test]
	fn unknown_picture_type() {
		let data = picture_payload(77, "image/png", "", &[]);
		let p = FlacPictureBlock::decode(&data).unwrap();
		assert_eq!(p.picture_type, PictureType::Unknown(77));
	}

	#[test]
	fn truncated_description() {
		let data = picture_payload(3, "image/png", "a long description", &[]);
		assert!(matches!(
			FlacPictureBlock::decode(&data[..20]),
			Err(FlacDecodeError::UnexpectedEof { .. })
		));
	}

	#[test]
	fn bad_description() {
		let mut data = picture_payload(3, "image/png", "ab", &[]);
		// Mime is 9 bytes, description starts at 4 + 4 + 9 + 4
		data[21] = 0xFF;
		assert!(matches!(
			FlacPictureBlock::decode(&data),
			Err(FlacDecodeError::FailedStringDecode(_))
		));
	}

	#[test]
	fn url_is_reused_until_released() {
		let factory = CountingFactory::default();
		let mut p = FlacPictureBlock::decode(&picture_payload(3, "image/png", "", &[1])).unwrap();

		assert!(!p.has_display_url());
		let first = p.display_url(&factory).to_owned();
		let second = p.display_url(&factory).to_owned();
		assert_eq!(first, second);
		assert_eq!(*factory.made.borrow(), 1);
		assert_eq!(factory.live.borrow().len(), 1);

		assert!(p.release_url(&factory));
		assert!(!p.release_url(&factory));
		assert!(factory.live.borrow().is_empty());

		// A new url is made after release
		let third = p.display_url(&factory).to_owned();
		assert_ne!(first, third);
		assert!(p.release_url(&factory));
	}

	#[test]
	fn data_urls() {
		let mut p = FlacPictureBlock::decode(&picture_payload(3, "image/png", "", b"hi!")).unwrap();
		assert_eq!(p.display_url(&DataUrlFactory), "data:image/png;base64,aGkh");
		assert!(p.release_url(&DataUrlFactory));

		let mut p = FlacPictureBlock::decode(&picture_payload(
			3,
			"-->",
			"",
			b"https://example.com/cover.jpg",
		))
		.unwrap();
		assert_eq!(
			p.display_url(&DataUrlFactory),
			"https://example.com/cover.jpg"
		);
		assert!(p.release_url(&DataUrlFactory));
	}
}
