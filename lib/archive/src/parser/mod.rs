//! The pull-based tar parser contract

use bytes::Bytes;
use std::str::Utf8Error;
use thiserror::Error;

mod ustar;
pub use ustar::UstarParser;

/// The kinds of entries a reconstruction cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
	File,
	Directory,
}

/// The header of one archive entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarHeader {
	pub kind: EntryKind,

	/// The last component of `path`
	pub name: String,

	/// This entry's full path, as stored in the archive.
	/// Directory paths end with `/`.
	pub path: String,

	/// Modification time, in seconds since the epoch
	pub mtime: u64,

	/// The number of data bytes that follow this header
	pub size: u64,
}

impl TarHeader {
	/// Make a header, deriving `name` from `path`
	pub fn new(kind: EntryKind, path: impl Into<String>, mtime: u64, size: u64) -> Self {
		let path = path.into();
		let name = path
			.trim_end_matches('/')
			.rsplit('/')
			.next()
			.unwrap_or_default()
			.to_owned();

		Self {
			kind,
			name,
			path,
			mtime,
			size,
		}
	}
}

/// The result of one [`TarParser::pull`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pull {
	/// We need more input before we can produce anything
	Further,

	/// A new entry starts here
	Header(TarHeader),

	/// A piece of the current file's data.
	/// Never empty.
	Data(Bytes),
}

/// An error we can encounter while parsing a tar stream
#[derive(Debug, Error)]
pub enum TarParseError {
	/// A header's checksum doesn't match its contents
	#[error("bad header checksum: header says {stored}, computed {computed}")]
	BadChecksum { stored: u64, computed: u64 },

	/// A numeric header field couldn't be parsed
	#[error("malformed numeric field `{field}` in tar header")]
	BadNumericField { field: &'static str },

	/// An entry path isn't valid utf-8
	#[error("entry path is not valid utf-8")]
	BadPath(#[from] Utf8Error),

	/// A long name or pax header is larger than we're willing to buffer
	#[error("extended header of {size} bytes is too large")]
	ExtendedHeaderTooLarge { size: u64 },
}

/// An incremental tar parser.
///
/// Input is fed with [`TarParser::push`] in chunks of any size;
/// output is taken with [`TarParser::pull`]. A parser never
/// reads input by itself.
pub trait TarParser {
	/// Produce the next piece of output.
	///
	/// Returns [`Pull::Further`] exactly when nothing can be
	/// produced without more input, that is, when
	/// [`TarParser::pullable`] is false.
	fn pull(&mut self) -> Result<Pull, TarParseError>;

	/// Add input to this parser
	fn push(&mut self, data: Bytes);

	/// If true, `pull` can make progress without more input
	fn pullable(&self) -> bool;

	/// If true, this parser has seen the end-of-archive marker
	/// and will ignore all further input.
	///
	/// Parsers that can't tell never finish.
	fn is_finished(&self) -> bool {
		false
	}
}
