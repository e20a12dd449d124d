//! FLAC errors
use ferry_util::cursor::ReadError;
use std::string::FromUtf8Error;
use thiserror::Error;

#[derive(Debug, Error)]
#[expect(missing_docs)]
pub enum FlacDecodeError {
	/// FLAC does not start with 0x66 0x4C 0x61 0x43
	#[error("flac signature is missing or malformed")]
	InvalidFormat,

	/// A block is shorter than its header (or its fixed layout) says it is
	#[error("unexpected end of flac data: wanted {wanted} bytes, only {available} available")]
	UnexpectedEof { wanted: usize, available: usize },

	/// We encountered an i/o error while fetching data
	#[error("io error while reading flac")]
	IoError(#[from] std::io::Error),

	/// We tried to decode a string, but found invalid UTF-8
	#[error("error while decoding string")]
	FailedStringDecode(#[from] FromUtf8Error),
}

impl From<ReadError> for FlacDecodeError {
	fn from(value: ReadError) -> Self {
		match value {
			ReadError::UnexpectedEof { wanted, available } => {
				Self::UnexpectedEof { wanted, available }
			}
			ReadError::IoError(e) => Self::IoError(e),
		}
	}
}
