use std::{fmt::Display, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};
use tracing::debug;

/// A media type, conveniently parsed
#[derive(Debug, PartialEq, Eq, Clone, SerializeDisplay, DeserializeFromStr)]
pub enum MimeType {
	/// A mimetype we didn't recognize
	Other(String),

	/// An unstructured binary blob
	/// Use this whenever a mime type is unknown
	Blob,

	// Images
	Png,
	Jpg,
	Gif,
	Bmp,
	Webp,
	Avif,

	// Audio
	Flac,

	/// FLAC pictures may store a URL to an image instead of image data.
	/// The mime string of such a picture is `-->`.
	LinkedImage,
}

impl FromStr for MimeType {
	// Must match `display` below, but may provide other alternatives.

	type Err = std::convert::Infallible;
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(match s {
			"application/octet-stream" => Self::Blob,
			"image/png" => Self::Png,
			"image/jpg" => Self::Jpg,
			"image/jpeg" => Self::Jpg,
			"image/gif" => Self::Gif,
			"image/bmp" => Self::Bmp,
			"image/webp" => Self::Webp,
			"image/avif" => Self::Avif,
			"audio/flac" => Self::Flac,
			"-->" => Self::LinkedImage,
			_ => {
				debug!(message = "Encountered unknown mimetype", mime_string = s);
				Self::Other(s.into())
			}
		})
	}
}

impl Display for MimeType {
	/// Get a string representation of this mimetype.
	///
	/// The following always holds
	/// ```notrust
	/// // x: MimeType
	/// MimeType::from(x.to_string()) == x
	/// ```
	///
	/// The following might not hold:
	/// ```notrust
	/// // y: &str
	/// MimeType::from(y).to_string() == y
	/// ```
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Blob => write!(f, "application/octet-stream"),

			Self::Png => write!(f, "image/png"),
			Self::Jpg => write!(f, "image/jpeg"),
			Self::Gif => write!(f, "image/gif"),
			Self::Bmp => write!(f, "image/bmp"),
			Self::Webp => write!(f, "image/webp"),
			Self::Avif => write!(f, "image/avif"),

			Self::Flac => write!(f, "audio/flac"),
			Self::LinkedImage => write!(f, "-->"),
			Self::Other(x) => write!(f, "{}", x),
		}
	}
}

impl From<String> for MimeType {
	fn from(value: String) -> Self {
		match Self::from_str(&value) {
			Ok(x) => x,
			Err(never) => match never {},
		}
	}
}

impl From<&str> for MimeType {
	fn from(value: &str) -> Self {
		match Self::from_str(value) {
			Ok(x) => x,
			Err(never) => match never {},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn display_round_trips() {
		for m in [
			MimeType::Blob,
			MimeType::Png,
			MimeType::Jpg,
			MimeType::Webp,
			MimeType::Flac,
			MimeType::LinkedImage,
			MimeType::Other("image/x-custom".into()),
		] {
			assert_eq!(MimeType::from(m.to_string()), m);
		}
	}

	#[test]
	fn jpg_aliases() {
		assert_eq!(MimeType::from("image/jpg"), MimeType::Jpg);
		assert_eq!(MimeType::from("image/jpeg").to_string(), "image/jpeg");
	}

	#[test]
	fn unknown_types_are_kept() {
		assert_eq!(
			MimeType::from("application/x-tar"),
			MimeType::Other("application/x-tar".into())
		);
		assert_eq!(
			MimeType::from("application/x-tar").to_string(),
			"application/x-tar"
		);
	}
}
