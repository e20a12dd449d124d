//! A sequential reader over an in-memory byte buffer.
//!
//! [`ByteCursor`] never suspends. Its async twin over a streamed
//! origin is [`crate::source::LazyByteSource`]; both report short
//! reads with the same [`ReadError`].

use thiserror::Error;

/// Byte order of a multi-byte integer read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
	Big,
	Little,
}

/// An error produced while reading from a cursor or a byte source
#[derive(Debug, Error)]
pub enum ReadError {
	/// We asked for more bytes than the source could provide
	#[error("unexpected end of data: wanted {wanted} bytes, only {available} available")]
	UnexpectedEof { wanted: usize, available: usize },

	/// The underlying byte origin failed
	#[error("i/o error while fetching data")]
	IoError(#[from] std::io::Error),
}

/// Assemble an unsigned integer from at most four bytes.
pub(crate) fn uint_from_bytes(bytes: &[u8], endian: Endian) -> u32 {
	debug_assert!(bytes.len() <= 4);
	let fold = |acc: u32, b: &u8| (acc << 8) | u32::from(*b);

	match endian {
		Endian::Big => bytes.iter().fold(0, fold),
		Endian::Little => bytes.iter().rev().fold(0, fold),
	}
}

/// Sequential read/peek/skip over a fixed byte buffer.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
	data: &'a [u8],
	pos: usize,
}

impl<'a> ByteCursor<'a> {
	/// Make a new cursor positioned at the first byte of `data`
	pub fn new(data: &'a [u8]) -> Self {
		Self { data, pos: 0 }
	}

	/// The number of bytes consumed so far
	pub fn position(&self) -> usize {
		self.pos
	}

	/// The number of bytes left to read
	pub fn remaining(&self) -> usize {
		self.data.len() - self.pos
	}

	/// If true, every byte of this buffer has been consumed
	pub fn is_end(&self) -> bool {
		self.remaining() == 0
	}

	fn check(&self, n: usize) -> Result<(), ReadError> {
		if self.remaining() < n {
			return Err(ReadError::UnexpectedEof {
				wanted: n,
				available: self.remaining(),
			});
		}

		return Ok(());
	}

	/// Return the next `n` bytes without advancing.
	pub fn peek(&self, n: usize) -> Result<&'a [u8], ReadError> {
		self.check(n)?;
		return Ok(&self.data[self.pos..self.pos + n]);
	}

	/// Return and consume the next `n` bytes.
	pub fn read(&mut self, n: usize) -> Result<&'a [u8], ReadError> {
		let out = self.peek(n)?;
		self.pos += n;
		return Ok(out);
	}

	/// Return and consume everything that is left.
	pub fn read_rest(&mut self) -> &'a [u8] {
		let out = &self.data[self.pos..];
		self.pos = self.data.len();
		return out;
	}

	/// Advance `n` bytes.
	/// Fails without moving if fewer than `n` bytes are left.
	pub fn skip(&mut self, n: usize) -> Result<(), ReadError> {
		self.check(n)?;
		self.pos += n;
		return Ok(());
	}

	pub fn read_u8(&mut self) -> Result<u8, ReadError> {
		return Ok(self.read(1)?[0]);
	}

	pub fn read_u16(&mut self, endian: Endian) -> Result<u16, ReadError> {
		let x = uint_from_bytes(self.read(2)?, endian);
		// Two bytes always fit
		return Ok(x as u16);
	}

	/// Read a 24-bit unsigned integer into the low bits of a `u32`
	pub fn read_u24(&mut self, endian: Endian) -> Result<u32, ReadError> {
		return Ok(uint_from_bytes(self.read(3)?, endian));
	}

	pub fn read_u32(&mut self, endian: Endian) -> Result<u32, ReadError> {
		return Ok(uint_from_bytes(self.read(4)?, endian));
	}
}
