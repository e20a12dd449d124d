use bytes::{Buf, Bytes, BytesMut};
use std::str;
use tracing::{debug, trace};

use super::{EntryKind, Pull, TarHeader, TarParseError, TarParser};
use crate::size::round_up_512;

const BLOCK: usize = 512;

/// The largest long name or pax header we'll buffer
const MAX_EXTENDED_HEADER: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtendedKind {
	/// GNU `L`: the data is the next entry's path
	LongName,

	/// POSIX `x`: the data holds `path=` (among other records)
	Pax,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
	/// Waiting for a header block
	Header,

	/// Waiting for a whole extended header
	Extended { kind: ExtendedKind, size: u64 },

	/// Inside a file's data
	Data { remaining: u64, pad: u64 },

	/// Discarding padding or an entry we don't support
	Skip { remaining: u64 },

	/// We've seen two zero blocks
	End,
}

/// A streaming parser for ustar, GNU and pax archives.
///
/// Only headers and extended headers are ever buffered whole.
/// File data is handed out as soon as it arrives.
pub struct UstarParser {
	buf: BytesMut,
	state: State,

	/// The number of consecutive zero blocks we've seen
	zero_blocks: usize,

	/// A path from a long name or pax header,
	/// applies to the next entry.
	next_path: Option<String>,
}

impl Default for UstarParser {
	fn default() -> Self {
		Self::new()
	}
}

impl UstarParser {
	pub fn new() -> Self {
		Self {
			buf: BytesMut::new(),
			state: State::Header,
			zero_blocks: 0,
			next_path: None,
		}
	}

	/// Handle one header block.
	/// Returns a header if this block starts an entry we report.
	fn read_header(&mut self, block: &[u8]) -> Result<Option<TarHeader>, TarParseError> {
		if block.iter().all(|x| *x == 0) {
			self.zero_blocks += 1;
			if self.zero_blocks >= 2 {
				debug!(
					message = "Reached end of archive",
					discarded = self.buf.len()
				);
				self.state = State::End;
				self.buf.clear();
			}
			return Ok(None);
		}
		self.zero_blocks = 0;

		verify_checksum(block)?;
		let size = parse_numeric(&block[124..136], "size")?;
		let padded = padded_size(size)?;
		let mtime = parse_mtime(&block[136..148])?;

		match block[156] {
			x @ (b'L' | b'x') => {
				if size > MAX_EXTENDED_HEADER {
					return Err(TarParseError::ExtendedHeaderTooLarge { size });
				}

				let kind = if x == b'L' {
					ExtendedKind::LongName
				} else {
					ExtendedKind::Pax
				};
				self.state = State::Extended { kind, size };
				return Ok(None);
			}

			b'5' => {
				let mut path = match self.next_path.take() {
					Some(x) => x,
					None => header_path(block)?,
				};
				if !path.ends_with('/') {
					path.push('/');
				}

				// Directories shouldn't have data, but skip it if they do
				self.state = State::Skip { remaining: padded };
				return Ok(Some(TarHeader::new(EntryKind::Directory, path, mtime, 0)));
			}

			// Regular files. `7` is a contiguous file, which we treat as regular.
			b'0' | b'\0' | b'7' => {
				let path = match self.next_path.take() {
					Some(x) => x,
					None => header_path(block)?,
				};

				self.state = State::Data {
					remaining: size,
					pad: padded - size,
				};
				return Ok(Some(TarHeader::new(EntryKind::File, path, mtime, size)));
			}

			x => {
				debug!(
					message = "Skipping unsupported tar entry",
					typeflag = %char::from(x),
					size
				);

				// A long name before this entry belongs to it
				self.next_path = None;
				self.state = State::Skip { remaining: padded };
				return Ok(None);
			}
		}
	}
}

impl TarParser for UstarParser {
	fn pull(&mut self) -> Result<Pull, TarParseError> {
		loop {
			if !self.pullable() {
				return Ok(Pull::Further);
			}

			match self.state {
				// `pullable` is false in this state
				State::End => return Ok(Pull::Further),

				State::Header => {
					let block = self.buf.split_to(BLOCK);
					if let Some(header) = self.read_header(&block)? {
						trace!(
							message = "Parsed tar header",
							path = header.path.as_str(),
							size = header.size
						);
						return Ok(Pull::Header(header));
					}
				}

				State::Extended { kind, size } => {
					let raw = self.buf.split_to(round_up_512(size) as usize);
					let data = &raw[..size as usize];

					match kind {
						ExtendedKind::LongName => self.next_path = Some(parse_long_name(data)?),
						ExtendedKind::Pax => {
							if let Some(path) = parse_pax_path(data)? {
								self.next_path = Some(path);
							}
						}
					}

					self.state = State::Header;
				}

				State::Data { remaining, pad } => {
					if remaining == 0 {
						self.state = State::Skip { remaining: pad };
						continue;
					}

					let n = (self.buf.len() as u64).min(remaining);
					self.state = State::Data {
						remaining: remaining - n,
						pad,
					};
					return Ok(Pull::Data(self.buf.split_to(n as usize).freeze()));
				}

				State::Skip { remaining } => {
					if remaining == 0 {
						self.state = State::Header;
						continue;
					}

					let n = (self.buf.len() as u64).min(remaining);
					self.buf.advance(n as usize);
					self.state = State::Skip {
						remaining: remaining - n,
					};
				}
			}
		}
	}

	fn push(&mut self, data: Bytes) {
		if self.state == State::End {
			trace!(message = "Ignoring input after end of archive", len = data.len());
			return;
		}

		self.buf.extend_from_slice(&data);
	}

	fn pullable(&self) -> bool {
		match self.state {
			State::End => false,
			State::Header => self.buf.len() >= BLOCK,
			State::Extended { size, .. } => self.buf.len() as u64 >= round_up_512(size),
			State::Data { remaining, .. } | State::Skip { remaining } => {
				remaining == 0 || !self.buf.is_empty()
			}
		}
	}

	fn is_finished(&self) -> bool {
		self.state == State::End
	}
}

// MARK: header fields

/// Read a NUL-terminated string field
fn field_str(field: &[u8]) -> Result<&str, str::Utf8Error> {
	let end = field.iter().position(|x| *x == 0).unwrap_or(field.len());
	str::from_utf8(&field[..end])
}

/// The path stored in a header block
fn header_path(block: &[u8]) -> Result<String, TarParseError> {
	let name = field_str(&block[0..100])?;

	// Ustar headers may split long paths into a prefix and a name.
	// GNU headers use the prefix bytes for other things.
	if &block[257..263] == b"ustar\0" {
		let prefix = field_str(&block[345..500])?;
		if !prefix.is_empty() {
			return Ok(format!("{prefix}/{name}"));
		}
	}

	return Ok(name.to_owned());
}

/// Parse an octal or GNU base-256 numeric field
fn parse_numeric(field: &[u8], name: &'static str) -> Result<u64, TarParseError> {
	let bad = || TarParseError::BadNumericField { field: name };

	// Base-256: the high bit of the first byte is set,
	// the next bit is the sign.
	if field.first().is_some_and(|x| x & 0x80 != 0) {
		if field[0] & 0x40 != 0 {
			return Err(bad());
		}

		let mut v = u64::from(field[0] & 0x3F);
		for b in &field[1..] {
			v = v.checked_mul(256).ok_or_else(bad)? | u64::from(*b);
		}
		return Ok(v);
	}

	// Octal, padded with spaces or NULs on either side
	let mut v = 0u64;
	let mut seen_digit = false;
	for b in field {
		match *b {
			b'0'..=b'7' => {
				seen_digit = true;
				v = v.checked_mul(8).ok_or_else(bad)? + u64::from(*b - b'0');
			}
			b' ' | 0 if seen_digit => break,
			b' ' | 0 => continue,
			_ => return Err(bad()),
		}
	}

	return Ok(v);
}

/// The size of an entry's data, padded to whole blocks
fn padded_size(size: u64) -> Result<u64, TarParseError> {
	return size
		.checked_next_multiple_of(BLOCK as u64)
		.ok_or(TarParseError::BadNumericField { field: "size" });
}

/// Parse an mtime field.
/// GNU tar stores times before the epoch as negative base-256 numbers,
/// we clamp those to zero.
fn parse_mtime(field: &[u8]) -> Result<u64, TarParseError> {
	if field.first().is_some_and(|x| x & 0xC0 == 0xC0) {
		trace!(message = "Clamping negative mtime to zero");
		return Ok(0);
	}
	return parse_numeric(field, "mtime");
}

/// Check a header's checksum.
/// Some old archivers summed signed bytes, we accept both.
fn verify_checksum(block: &[u8]) -> Result<(), TarParseError> {
	let stored = parse_numeric(&block[148..156], "checksum")?;

	let mut unsigned = 0u64;
	let mut signed = 0i64;
	for (i, b) in block.iter().enumerate() {
		// The checksum field counts as spaces
		let b = if (148..156).contains(&i) { b' ' } else { *b };
		unsigned += u64::from(b);
		signed += i64::from(b as i8);
	}

	if stored != unsigned && i64::try_from(stored) != Ok(signed) {
		return Err(TarParseError::BadChecksum {
			stored,
			computed: unsigned,
		});
	}

	return Ok(());
}

fn parse_long_name(data: &[u8]) -> Result<String, TarParseError> {
	return Ok(field_str(data)?.to_owned());
}

/// Find the `path` record in a pax header.
/// Records look like `<len> <key>=<value>\n`, where `len` counts the whole record.
fn parse_pax_path(data: &[u8]) -> Result<Option<String>, TarParseError> {
	let bad = || TarParseError::BadNumericField {
		field: "pax record length",
	};

	let mut rest = data;
	let mut path = None;
	while !rest.is_empty() {
		let space = rest.iter().position(|x| *x == b' ').ok_or_else(bad)?;
		let len = str::from_utf8(&rest[..space])?
			.parse::<usize>()
			.ok()
			.filter(|x| *x > space && *x <= rest.len())
			.ok_or_else(bad)?;

		let record = &rest[space + 1..len];
		let record = record.strip_suffix(b"\n").unwrap_or(record);
		if let Some(eq) = record.iter().position(|x| *x == b'=') {
			if &record[..eq] == b"path" {
				path = Some(str::from_utf8(&record[eq + 1..])?.to_owned());
			}
		}

		rest = &rest[len..];
	}

	return Ok(path);
}
